/// Default namespace prefix for stored keys.
pub const DEFAULT_KEY_PREFIX: &str = "hss";

/// Maps session and principal identifiers onto store keys.
///
/// - `{prefix}:session:{session_id}` holds the encoded `SessionRecord`
/// - `{prefix}:user:{principal_id}:sessions` holds the principal's index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    prefix: String,
}

impl KeySpace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn session(&self, session_id: &str) -> String {
        format!("{}:session:{}", self.prefix, session_id)
    }

    pub fn sessions(&self, session_ids: &[String]) -> Vec<String> {
        session_ids.iter().map(|id| self.session(id)).collect()
    }

    pub fn principal_index(&self, principal_id: &str) -> String {
        format!("{}:user:{}:sessions", self.prefix, principal_id)
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}

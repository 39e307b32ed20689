/// The main error type for Tidemark
///
/// Read paths never return `NotFound` or `Malformed` to callers: an absent or
/// unreadable session is reported as `None`. Both variants exist so the
/// distinction survives in logs.
#[derive(Debug, thiserror::Error)]
pub enum TidemarkError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed session record: {0}")]
    Malformed(String),

    #[error("Session store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl TidemarkError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the error came from the backing store's transport.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    /// Whether the error means "no usable session" rather than a failure.
    ///
    /// Callers that need a yes/no authentication answer should treat these
    /// the same as an absent session.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Malformed(_))
    }
}

/// Result type alias for Tidemark operations
pub type Result<T> = std::result::Result<T, TidemarkError>;

impl From<serde_json::Error> for TidemarkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

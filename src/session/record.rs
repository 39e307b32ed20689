//! Session record data model and its stored encoding.
//!
//! Records are stored as versioned JSON:
//!
//! ```json
//! {"v":1,"principal_id":"u1","profile":{"username":"ada"},"attributes":{}}
//! ```
//!
//! Decoding is defensive. Anything that is not a well-formed payload of a
//! known version becomes `TidemarkError::Malformed`, which every read path
//! treats as an absent session.

use crate::error::{Result, TidemarkError};
use crate::session::connection::ConnectionInfo;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Current stored schema version.
pub const RECORD_VERSION: u32 = 1;

/// Denormalized display data of the principal, valid when written.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl ProfileSnapshot {
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            avatar_url: None,
            role: None,
        }
    }

    #[must_use]
    pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}

/// The authoritative state of one login.
///
/// The session id is not part of the record; it is the key the record is
/// stored under.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub principal_id: String,
    pub profile: ProfileSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionInfo>,
    /// Caller-specific claims (provider account ids, project ids, ...).
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl SessionRecord {
    #[must_use]
    pub fn new(principal_id: impl Into<String>, profile: ProfileSnapshot) -> Self {
        Self {
            principal_id: principal_id.into(),
            profile,
            connection: None,
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_connection(mut self, connection: ConnectionInfo) -> Self {
        self.connection = Some(connection);
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Apply a partial update. Fields present in the patch win.
    pub fn apply(&mut self, patch: SessionPatch) {
        if let Some(username) = patch.username {
            self.profile.username = username;
        }
        if let Some(avatar_url) = patch.avatar_url {
            self.profile.avatar_url = avatar_url;
        }
        if let Some(role) = patch.role {
            self.profile.role = role;
        }
        if let Some(connection) = patch.connection {
            self.connection = Some(connection);
        }
        self.attributes.extend(patch.attributes);
    }
}

/// Partial update of a [`SessionRecord`].
///
/// `avatar_url` and `role` are doubly optional: `Some(None)` clears the field.
/// Attributes are merged key by key.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionPatch {
    pub username: Option<String>,
    pub avatar_url: Option<Option<String>>,
    pub role: Option<Option<String>>,
    pub connection: Option<ConnectionInfo>,
    pub attributes: BTreeMap<String, Value>,
}

impl SessionPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn avatar_url(mut self, url: Option<String>) -> Self {
        self.avatar_url = Some(url);
        self
    }

    #[must_use]
    pub fn role(mut self, role: Option<String>) -> Self {
        self.role = Some(role);
        self
    }

    #[must_use]
    pub fn connection(mut self, connection: ConnectionInfo) -> Self {
        self.connection = Some(connection);
        self
    }

    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Envelope written to the store. Borrowed on encode, owned on decode.
#[derive(Serialize)]
struct EncodedRecord<'a> {
    v: u32,
    #[serde(flatten)]
    record: &'a SessionRecord,
}

#[derive(Deserialize)]
struct DecodedRecord {
    v: u32,
    #[serde(flatten)]
    record: SessionRecord,
}

/// Serialize a record for storage.
pub fn encode(record: &SessionRecord) -> Result<Vec<u8>> {
    serde_json::to_vec(&EncodedRecord {
        v: RECORD_VERSION,
        record,
    })
    .map_err(|e| TidemarkError::invalid_input(format!("Failed to serialize session: {}", e)))
}

/// Deserialize a stored record.
pub fn decode(bytes: &[u8]) -> Result<SessionRecord> {
    let decoded: DecodedRecord = serde_json::from_slice(bytes)?;
    if decoded.v != RECORD_VERSION {
        return Err(TidemarkError::malformed(format!(
            "unsupported record version {}",
            decoded.v
        )));
    }
    if decoded.record.principal_id.is_empty() {
        return Err(TidemarkError::malformed("record has an empty principal_id"));
    }
    Ok(decoded.record)
}

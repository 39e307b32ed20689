//! Test fixtures for session records
//!
//! This module provides helpers for creating session records in a consistent way.

use crate::session::{ConnectionInfo, ProfileSnapshot, SessionRecord};
use uuid::Uuid;

/// User agents covering each device class the parser recognizes.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (iPad; CPU OS 17_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
];

/// Helper functions for generating fake test data
pub mod fake {
    use super::*;

    /// Generate a fake principal id
    pub fn principal_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Generate a fake username
    pub fn username() -> String {
        format!("user_{}", &Uuid::new_v4().simple().to_string()[..8])
    }

    /// Generate a fake IPv4 address from a private range
    pub fn ip() -> String {
        format!("10.{}.{}.{}", fastrand::u8(..), fastrand::u8(..), fastrand::u8(1..255))
    }

    /// Pick one of [`USER_AGENTS`]
    pub fn user_agent() -> &'static str {
        USER_AGENTS[fastrand::usize(..USER_AGENTS.len())]
    }
}

/// A minimal record for `principal_id` with a generated username.
pub fn sample_record(principal_id: &str) -> SessionRecord {
    SessionRecord::new(principal_id, ProfileSnapshot::new(fake::username()))
}

/// Builder for session records used in tests
#[derive(Debug, Default)]
pub struct TestSession {
    principal_id: Option<String>,
    username: Option<String>,
    role: Option<String>,
    connection: bool,
}

impl TestSession {
    /// Create a new TestSession builder
    pub fn builder() -> Self {
        Self::default()
    }

    /// Set the principal id
    pub fn with_principal(mut self, principal_id: impl Into<String>) -> Self {
        self.principal_id = Some(principal_id.into());
        self
    }

    /// Set the username
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Attach connection info parsed from a fake request
    pub fn with_connection(mut self) -> Self {
        self.connection = true;
        self
    }

    /// Build the record
    pub fn build(self) -> SessionRecord {
        let mut profile = ProfileSnapshot::new(self.username.unwrap_or_else(fake::username));
        profile.role = self.role;

        let record = SessionRecord::new(self.principal_id.unwrap_or_else(fake::principal_id), profile);

        if self.connection {
            record.with_connection(ConnectionInfo::from_request(fake::ip(), Some(fake::user_agent())))
        } else {
            record
        }
    }
}

use crate::error::{Result, TidemarkError};
use crate::session::keys::DEFAULT_KEY_PREFIX;
use crate::utils::get_env_with_prefix;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default maximum concurrent sessions per principal.
pub const DEFAULT_MAX_SESSIONS: usize = 5;

/// Upper bound for the session TTL (one year).
pub const MAX_TTL_SECONDS: u64 = 60 * 60 * 24 * 365;

/// Session lifecycle configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Namespace prefix for every stored key
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Session TTL (in seconds). Reset on every successful validation.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Maximum concurrent sessions per principal. Creating one more evicts
    /// the oldest.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            ttl_seconds: default_ttl_seconds(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl SessionConfig {
    /// Load session configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(prefix) = get_env_with_prefix("SESSION_KEY_PREFIX") {
            config.key_prefix = prefix;
        }

        if let Some(ttl) = get_env_with_prefix("SESSION_TTL_SECONDS") {
            if let Ok(seconds) = ttl.parse() {
                config.ttl_seconds = seconds;
            }
        }

        if let Some(max) = get_env_with_prefix("SESSION_MAX_PER_PRINCIPAL") {
            if let Ok(max) = max.parse() {
                config.max_sessions = max;
            }
        }

        config
    }

    /// Get TTL as Duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ttl_seconds == 0 {
            return Err(TidemarkError::config("Session TTL must be greater than 0"));
        }
        if self.ttl_seconds > MAX_TTL_SECONDS {
            return Err(TidemarkError::config(format!(
                "Session TTL must be at most {} seconds",
                MAX_TTL_SECONDS
            )));
        }
        if self.max_sessions == 0 {
            return Err(TidemarkError::config(
                "Maximum sessions per principal must be greater than 0",
            ));
        }
        if self.key_prefix.is_empty() || self.key_prefix.contains(char::is_whitespace) {
            return Err(TidemarkError::config(format!(
                "Invalid session key prefix: {:?}",
                self.key_prefix
            )));
        }
        Ok(())
    }
}

/// Session cookie configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CookieConfig {
    /// Cookie name
    #[serde(default = "default_cookie_name")]
    pub name: String,

    /// Cookie domain. Set to the shared parent domain (e.g. `.example.org`)
    /// when subdomains must share sign-in state; `None` means host-only.
    #[serde(default)]
    pub domain: Option<String>,

    /// Cookie secure flag (HTTPS only). Keep enabled in production.
    #[serde(default = "default_secure")]
    pub secure: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: default_cookie_name(),
            domain: None,
            secure: default_secure(),
        }
    }
}

impl CookieConfig {
    /// Load cookie configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(name) = get_env_with_prefix("SESSION_COOKIE_NAME") {
            config.name = name;
        }

        if let Some(domain) = get_env_with_prefix("SESSION_COOKIE_DOMAIN") {
            if !domain.is_empty() {
                config.domain = Some(domain);
            }
        }

        if let Some(secure) = get_env_with_prefix("SESSION_COOKIE_SECURE") {
            config.secure = secure.parse().unwrap_or(true);
        }

        config
    }

    pub fn validate(&self) -> Result<()> {
        let valid_name = !self.name.is_empty()
            && self
                .name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.');
        if !valid_name {
            return Err(TidemarkError::config(format!(
                "Invalid session cookie name: {:?}",
                self.name
            )));
        }
        Ok(())
    }
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

fn default_ttl_seconds() -> u64 {
    60 * 60 * 24 * 7 // 7 days
}

fn default_max_sessions() -> usize {
    DEFAULT_MAX_SESSIONS
}

fn default_cookie_name() -> String {
    "hss_science_session".to_string()
}

fn default_secure() -> bool {
    true
}

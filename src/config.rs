use serde::{Deserialize, Serialize};

use crate::error::{Result, TidemarkError};
use crate::session::{CookieConfig, SessionConfig};
use crate::store::{StoreBackend, StoreConfig};
use crate::utils::get_env_with_prefix;

/// Main configuration for a tidemark deployment
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub cookie: CookieConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json")]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    false
}

/// Builder for Config with environment variable support
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.config.store = store;
        self
    }

    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.config.session = session;
        self
    }

    /// Set the session TTL in seconds
    pub fn with_session_ttl(mut self, ttl_seconds: u64) -> Self {
        self.config.session.ttl_seconds = ttl_seconds;
        self
    }

    /// Set the maximum concurrent sessions per principal
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.config.session.max_sessions = max_sessions;
        self
    }

    pub fn with_cookie(mut self, cookie: CookieConfig) -> Self {
        self.config.cookie = cookie;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    /// Load configuration from environment variables with TIDEMARK_ prefix
    pub fn from_env(mut self) -> Self {
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env_with_prefix("LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }

        self.config.store = StoreConfig::from_env();
        self.config.session = SessionConfig::from_env();
        self.config.cookie = CookieConfig::from_env();

        self
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// Returns `TidemarkError::Config` if any configuration is invalid:
    /// - Invalid log level
    /// - Zero session TTL or session limit
    /// - Invalid key prefix or cookie name
    /// - Unusable Redis connection settings
    pub fn build(self) -> Result<Config> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(TidemarkError::config(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        self.config.session.validate()?;
        self.config.cookie.validate()?;

        if self.config.store.backend != StoreBackend::InMemory {
            self.config.store.connection_url()?;
        }

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

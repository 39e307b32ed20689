use crate::error::{Result, TidemarkError};
use crate::utils::get_env_with_prefix;
use serde::{Deserialize, Serialize};

/// Session store backend type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process store (default, for dev/testing)
    #[default]
    InMemory,
    /// Redis store (requires redis feature)
    #[cfg(feature = "redis")]
    Redis,
}

/// Store connection configuration
#[derive(Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Store backend type
    #[serde(default)]
    pub backend: StoreBackend,

    /// Full Redis connection URL. Takes precedence over host/port/password/db.
    #[serde(default)]
    pub redis_url: Option<String>,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub db: u32,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("backend", &self.backend)
            .field("redis_url", &self.redis_url.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("db", &self.db)
            .finish()
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            redis_url: None,
            host: default_host(),
            port: default_port(),
            password: None,
            db: 0,
        }
    }
}

impl StoreConfig {
    /// Load store configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(backend) = get_env_with_prefix("STORE_BACKEND") {
            config.backend = match backend.to_lowercase().as_str() {
                "redis" => {
                    #[cfg(feature = "redis")]
                    {
                        StoreBackend::Redis
                    }
                    #[cfg(not(feature = "redis"))]
                    {
                        tracing::warn!("Redis store requested but redis feature not enabled, using in-memory");
                        StoreBackend::InMemory
                    }
                }
                _ => StoreBackend::InMemory,
            };
        }

        if let Some(url) = get_env_with_prefix("REDIS_URL") {
            config.redis_url = Some(url);
        }

        if let Some(host) = get_env_with_prefix("REDIS_HOST") {
            config.host = host;
        }

        if let Some(port) = get_env_with_prefix("REDIS_PORT") {
            if let Ok(port) = port.parse() {
                config.port = port;
            }
        }

        if let Some(password) = get_env_with_prefix("REDIS_PASSWORD") {
            if !password.is_empty() {
                config.password = Some(password);
            }
        }

        if let Some(db) = get_env_with_prefix("REDIS_DB") {
            if let Ok(db) = db.parse() {
                config.db = db;
            }
        }

        config
    }

    /// The Redis connection URL, built from host/port/password/db unless
    /// `redis_url` is set.
    pub fn connection_url(&self) -> Result<String> {
        if let Some(ref url) = self.redis_url {
            return Ok(url.clone());
        }

        let mut url = url::Url::parse(&format!("redis://{}:{}/{}", self.host, self.port, self.db))
            .map_err(|e| TidemarkError::config(format!("Invalid Redis address: {}", e)))?;

        if let Some(ref password) = self.password {
            url.set_password(Some(password))
                .map_err(|_| TidemarkError::config("Redis URL cannot carry a password"))?;
        }

        Ok(url.to_string())
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    6379
}

//! Tidemark - opaque server-side sessions over a shared TTL store
//!
//! Tidemark issues random session ids, stores one record per session with a
//! sliding expiration, and keeps a bounded per-principal index so a user can
//! list their sessions, sign out elsewhere, and never exceed a fixed number
//! of concurrent logins.
//!
//! # Features
//!
//! - **Sessions**: create, validate (sliding TTL), list, revoke, rotate, update
//! - **Limits**: oldest sessions are evicted past `max_sessions` per principal
//! - **Stores**: Redis (Lua-atomic append, `redis` feature) and in-memory
//! - **Cookies**: `HttpOnly` / `Secure` / `SameSite=Lax` session cookie helpers
//! - **Testing**: fixtures and an outage-simulating store wrapper
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tidemark::{ConfigBuilder, ProfileSnapshot, SessionManager, SessionRecord};
//! use tidemark::store::RedisSessionStore;
//!
//! #[tokio::main]
//! async fn main() -> tidemark::Result<()> {
//!     // Initialize logging
//!     tidemark::init_tracing();
//!
//!     let config = ConfigBuilder::new().from_env().build()?;
//!     let store = RedisSessionStore::from_config(&config.store).await?;
//!     let sessions = SessionManager::new(store, &config.session)?;
//!
//!     let created = sessions
//!         .create_session(SessionRecord::new("user-1", ProfileSnapshot::new("ada")))
//!         .await?;
//!     assert!(sessions.validate_session(&created.session_id).await.is_some());
//!     Ok(())
//! }
//! ```

#![allow(async_fn_in_trait)] // async_trait macro handles Send/Sync bounds properly

mod config;
mod error;
pub mod session;
pub mod store;
pub mod testing;
pub mod traits;
mod utils;

// Re-exports for public API
pub use config::{Config, ConfigBuilder, LoggingConfig};
pub use error::{Result, TidemarkError};
pub use session::{
    ActiveSession, ConnectionInfo, CookieConfig, CreatedSession, DeviceType, ProfileSnapshot,
    SessionConfig, SessionCookie, SessionManager, SessionPatch, SessionRecord,
};
pub use store::{InMemorySessionStore, StoreBackend, StoreConfig};
#[cfg(feature = "redis")]
pub use store::RedisSessionStore;
pub use traits::{IndexedWrite, SessionStore};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// This should be called early in your application, typically in main()
/// before creating the session manager.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "session=debug")
/// - `TIDEMARK_LOG_JSON`: Set to "true" for JSON formatted logs
///
/// # Example
///
/// ```rust,no_run
/// #[tokio::main]
/// async fn main() {
///     tidemark::init_tracing();
///     // ... rest of your app
/// }
/// ```
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("TIDEMARK_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Initialize tracing with a custom configuration
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::new(&config.logging.level);

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

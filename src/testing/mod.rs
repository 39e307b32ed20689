//! Testing utilities for code built on tidemark
//!
//! - Fixtures for session records with realistic connection metadata
//! - `FlakyStore`, a store wrapper that simulates outages
//!
//! # Example
//!
//! ```rust
//! use tidemark::session::{SessionConfig, SessionManager};
//! use tidemark::store::InMemorySessionStore;
//! use tidemark::testing::{FlakyStore, TestSession};
//!
//! # async fn run() -> tidemark::Result<()> {
//! let store = FlakyStore::new(InMemorySessionStore::new());
//! let manager = SessionManager::new(store, &SessionConfig::default())?;
//!
//! let created = manager
//!     .create_session(TestSession::builder().with_connection().build())
//!     .await?;
//!
//! manager.store().set_available(false);
//! assert!(manager.validate_session(&created.session_id).await.is_none());
//! # Ok(())
//! # }
//! ```

mod fixtures;
mod flaky;

pub use fixtures::{TestSession, USER_AGENTS, fake, sample_record};
pub use flaky::FlakyStore;

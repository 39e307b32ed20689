//! Opaque server-side sessions.
//!
//! A session is a random id handed to the client in a cookie plus a record
//! stored under that id with a sliding TTL. Each principal also has a bounded
//! index of its session ids, oldest first, used to list sessions, revoke them
//! in bulk, and evict the oldest once the per-principal limit is reached.
//!
//! [`SessionManager`] is the entry point; it works over any
//! [`SessionStore`](crate::traits::SessionStore).

mod config;
mod connection;
mod cookie;
mod id;
mod index;
mod keys;
mod manager;
pub mod record;

pub use config::{CookieConfig, DEFAULT_MAX_SESSIONS, MAX_TTL_SECONDS, SessionConfig};
pub use connection::{ConnectionInfo, DeviceType};
pub use self::cookie::SessionCookie;
pub use id::{SESSION_ID_LENGTH, generate_session_id, is_well_formed};
pub use index::SessionIndex;
pub use keys::{DEFAULT_KEY_PREFIX, KeySpace};
pub use manager::{ActiveSession, CreatedSession, SessionManager};
pub use record::{ProfileSnapshot, RECORD_VERSION, SessionPatch, SessionRecord};

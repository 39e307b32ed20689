//! Trait definitions for extensible components
//!
//! These traits allow users to swap the session store for their own
//! implementation.

pub mod session;

pub use session::{IndexedWrite, SessionStore};

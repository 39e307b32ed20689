//! Session store backends.
//!
//! Provides an in-memory store by default, with Redis support via the
//! `redis` feature.

mod config;
mod in_memory;

#[cfg(feature = "redis")]
mod redis;

pub use config::{StoreBackend, StoreConfig};
pub use in_memory::InMemorySessionStore;

#[cfg(feature = "redis")]
pub use self::redis::RedisSessionStore;

#[cfg(feature = "redis")]
use std::time::Duration;

/// Millisecond TTL for store commands. Never zero: `PX 0` is rejected by Redis.
#[cfg(feature = "redis")]
pub(crate) fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

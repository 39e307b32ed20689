//! Session storage trait
//!
//! This trait is the contract the session manager consumes from its backing
//! key/value store. Any store offering per-key TTL plus one atomic compound
//! operation (native scripting, transactions, or a single lock) can implement
//! it. `RedisSessionStore` and `InMemorySessionStore` ship with the crate.

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Record write plus bounded index append, executed as one indivisible unit.
///
/// Implementations must:
/// 1. store `payload` under `record_key` with `ttl`
/// 2. append `member` to the tail of the list at `index_key`
/// 3. set the list's TTL to `ttl`
/// 4. if the list is longer than `capacity`, remove the oldest entries from
///    the head until it is exactly `capacity` long
/// 5. return the removed members, oldest first
///
/// No other operation on `index_key` may interleave with these steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedWrite {
    pub record_key: String,
    pub payload: Vec<u8>,
    pub index_key: String,
    pub member: String,
    pub ttl: Duration,
    pub capacity: usize,
}

/// Session storage trait
///
/// Every method is a network round trip for remote stores. Transport failures
/// are reported as `TidemarkError::StoreUnavailable`; an absent key is never
/// an error.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Get the bytes stored under `key`
    ///
    /// Returns `Ok(None)` if the key doesn't exist or has expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store bytes under `key`, replacing any previous value and TTL
    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Overwrite bytes and TTL only if `key` still exists
    ///
    /// Returns `false` without writing if the key is absent, so a concurrent
    /// delete is never undone by a read-modify-write.
    async fn replace_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool>;

    /// Delete every listed key. Missing keys are ignored.
    async fn delete(&self, keys: &[String]) -> Result<()>;

    /// Reset the TTL of `key`
    ///
    /// Returns `false` if the key doesn't exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Bulk get. The result has the same length and order as `keys`.
    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>>;

    /// All members of the list at `key`, oldest first
    async fn list_members(&self, key: &str) -> Result<Vec<String>>;

    /// Remove every occurrence of `member` from the list at `key`
    ///
    /// Returns the number of entries removed.
    async fn list_remove(&self, key: &str, member: &str) -> Result<usize>;

    /// Atomic record write + bounded list append. See [`IndexedWrite`].
    async fn write_indexed(&self, write: IndexedWrite) -> Result<Vec<String>>;

    /// Check if the store is reachable
    async fn ping(&self) -> bool;
}

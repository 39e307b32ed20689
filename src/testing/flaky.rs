//! Fault injection for session store tests

use crate::error::{Result, TidemarkError};
use crate::traits::session::{IndexedWrite, SessionStore};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Wraps a store and fails calls on demand.
///
/// While unavailable, every operation returns `TidemarkError::StoreUnavailable`
/// and `ping` returns `false`, which is what a lost Redis connection looks
/// like to the session manager. Single operations can also be failed on their
/// own to reach the best-effort paths.
///
/// # Example
///
/// ```rust
/// use tidemark::store::InMemorySessionStore;
/// use tidemark::testing::FlakyStore;
///
/// let store = FlakyStore::new(InMemorySessionStore::new());
/// store.set_available(false);
/// assert!(!store.is_available());
/// ```
pub struct FlakyStore<S> {
    inner: S,
    available: AtomicBool,
    fail_indexed_writes: AtomicBool,
    fail_deletes: AtomicBool,
    fail_list_removes: AtomicBool,
    fail_expire: AtomicBool,
}

impl<S: SessionStore> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            available: AtomicBool::new(true),
            fail_indexed_writes: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            fail_list_removes: AtomicBool::new(false),
            fail_expire: AtomicBool::new(false),
        }
    }

    /// Simulate an outage (`false`) or recovery (`true`)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Fail only the atomic record + index write, leaving reads working
    pub fn fail_indexed_writes(&self, fail: bool) {
        self.fail_indexed_writes.store(fail, Ordering::SeqCst);
    }

    /// Fail `delete`
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Fail `list_remove`
    pub fn fail_list_removes(&self, fail: bool) {
        self.fail_list_removes.store(fail, Ordering::SeqCst);
    }

    /// Fail `expire`
    pub fn fail_expire(&self, fail: bool) {
        self.fail_expire.store(fail, Ordering::SeqCst);
    }

    /// The wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn check(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(TidemarkError::store_unavailable("simulated store outage"))
        }
    }

    fn check_op(&self, flag: &AtomicBool, op: &str) -> Result<()> {
        self.check()?;
        if flag.load(Ordering::SeqCst) {
            return Err(TidemarkError::store_unavailable(format!("simulated {} failure", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: SessionStore> SessionStore for FlakyStore<S> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        self.check()?;
        self.inner.set_with_ttl(key, value, ttl).await
    }

    async fn replace_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool> {
        self.check()?;
        self.inner.replace_with_ttl(key, value, ttl).await
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        self.check_op(&self.fail_deletes, "delete")?;
        self.inner.delete(keys).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.check_op(&self.fail_expire, "expire")?;
        self.inner.expire(key, ttl).await
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        self.check()?;
        self.inner.multi_get(keys).await
    }

    async fn list_members(&self, key: &str) -> Result<Vec<String>> {
        self.check()?;
        self.inner.list_members(key).await
    }

    async fn list_remove(&self, key: &str, member: &str) -> Result<usize> {
        self.check_op(&self.fail_list_removes, "list remove")?;
        self.inner.list_remove(key, member).await
    }

    async fn write_indexed(&self, write: IndexedWrite) -> Result<Vec<String>> {
        self.check_op(&self.fail_indexed_writes, "indexed write")?;
        self.inner.write_indexed(write).await
    }

    async fn ping(&self) -> bool {
        self.is_available() && self.inner.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemorySessionStore;

    #[tokio::test]
    async fn test_outage_and_recovery() {
        let store = FlakyStore::new(InMemorySessionStore::new());
        store.set_with_ttl("k", b"v".to_vec(), Duration::from_secs(10)).await.unwrap();

        store.set_available(false);
        assert!(store.get("k").await.unwrap_err().is_store_unavailable());
        assert!(!store.ping().await);

        store.set_available(true);
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert!(store.ping().await);
    }

    #[tokio::test]
    async fn test_single_operation_failures() {
        let store = FlakyStore::new(InMemorySessionStore::new());
        let ttl = Duration::from_secs(10);
        store.set_with_ttl("k", b"v".to_vec(), ttl).await.unwrap();

        store.fail_deletes(true);
        store.fail_expire(true);
        store.fail_list_removes(true);

        assert!(store.delete(&["k".to_string()]).await.is_err());
        assert!(store.expire("k", ttl).await.is_err());
        assert!(store.list_remove("idx", "m").await.is_err());

        // Everything else keeps working
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert!(store.ping().await);

        store.fail_deletes(false);
        store.delete(&["k".to_string()]).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}

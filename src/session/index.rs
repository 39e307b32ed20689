//! Per-principal session index.
//!
//! An ordered list of session ids per principal, oldest first, bounded to a
//! capacity. The index is advisory: it may still name sessions whose records
//! already expired ("ghosts"), so membership never proves validity. It must
//! never hide a live session, which is why appends go through the store's
//! atomic compound write together with the record itself.

use crate::error::Result;
use crate::session::keys::KeySpace;
use crate::traits::session::{IndexedWrite, SessionStore};
use std::time::Duration;

/// View of the session index over a store.
pub struct SessionIndex<'a, S: SessionStore + ?Sized> {
    store: &'a S,
    keys: &'a KeySpace,
}

impl<'a, S: SessionStore + ?Sized> SessionIndex<'a, S> {
    pub fn new(store: &'a S, keys: &'a KeySpace) -> Self {
        Self { store, keys }
    }

    /// Write the session record and append its id to the principal's index
    /// as one atomic unit, trimming to `capacity`.
    ///
    /// Returns the evicted ids, oldest first. Their records still exist and
    /// must be deleted by the caller.
    pub async fn append(
        &self,
        principal_id: &str,
        session_id: &str,
        payload: Vec<u8>,
        ttl: Duration,
        capacity: usize,
    ) -> Result<Vec<String>> {
        self.store
            .write_indexed(IndexedWrite {
                record_key: self.keys.session(session_id),
                payload,
                index_key: self.keys.principal_index(principal_id),
                member: session_id.to_string(),
                ttl,
                capacity,
            })
            .await
    }

    /// Current members, oldest first
    pub async fn list(&self, principal_id: &str) -> Result<Vec<String>> {
        self.store
            .list_members(&self.keys.principal_index(principal_id))
            .await
    }

    /// Remove one entry. No-op if absent.
    pub async fn remove(&self, principal_id: &str, session_id: &str) -> Result<()> {
        self.store
            .list_remove(&self.keys.principal_index(principal_id), session_id)
            .await?;
        Ok(())
    }

    /// Remove several entries, stopping at the first store failure.
    ///
    /// Returns how many entries were removed before stopping.
    pub async fn remove_many(&self, principal_id: &str, session_ids: &[String]) -> Result<usize> {
        let key = self.keys.principal_index(principal_id);
        let mut removed = 0;
        for session_id in session_ids {
            removed += self.store.list_remove(&key, session_id).await?;
        }
        Ok(removed)
    }

    /// Realign the index TTL with its most recently used member.
    pub async fn touch(&self, principal_id: &str, ttl: Duration) -> Result<bool> {
        self.store
            .expire(&self.keys.principal_index(principal_id), ttl)
            .await
    }

    /// Remove the whole index
    pub async fn drop_key(&self, principal_id: &str) -> Result<()> {
        self.store
            .delete(&[self.keys.principal_index(principal_id)])
            .await
    }
}

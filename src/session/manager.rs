//! Session lifecycle management.
//!
//! `SessionManager` keeps two kinds of keys consistent: one record per
//! session (authoritative, expires by TTL) and one bounded index per
//! principal (advisory, may hold ghosts). The only step that needs atomicity
//! is create's record write + append + trim, which the store executes as one
//! unit. Everything else tolerates last-write-wins races.
//!
//! # Tracing Events
//!
//! - `session.created` - New session created
//! - `session.evicted` - Oldest session dropped to respect the per-principal limit
//! - `session.revoked` - Session explicitly revoked
//! - `session.revoke_all` - All sessions of a principal revoked
//! - `session.rotated` - Session id replaced by rotation
//! - `session.cleanup` - Ghost entries dropped from an index
//! - `session.malformed` - Stored record could not be decoded
//! - `session.store_error` - Store failure swallowed on a best-effort path
//!
//! # Example
//!
//! ```rust,no_run
//! use tidemark::session::{ProfileSnapshot, SessionConfig, SessionManager, SessionRecord};
//! use tidemark::store::InMemorySessionStore;
//!
//! # async fn run() -> tidemark::Result<()> {
//! let manager = SessionManager::new(InMemorySessionStore::new(), &SessionConfig::default())?;
//!
//! let created = manager
//!     .create_session(SessionRecord::new("user-1", ProfileSnapshot::new("ada")))
//!     .await?;
//!
//! // On every request
//! if let Some(record) = manager.validate_session(&created.session_id).await {
//!     println!("signed in as {}", record.profile.username);
//! }
//!
//! // Sign out
//! manager.revoke_session(&created.session_id).await;
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, TidemarkError};
use crate::session::config::SessionConfig;
use crate::session::id::{generate_session_id, is_well_formed};
use crate::session::index::SessionIndex;
use crate::session::keys::KeySpace;
use crate::session::record::{self, SessionPatch, SessionRecord};
use crate::traits::session::SessionStore;
use std::sync::Arc;
use std::time::Duration;

/// Result of creating a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSession {
    /// The new session id (also the cookie value).
    pub session_id: String,
    /// Sessions of the same principal evicted to respect the limit, oldest first.
    pub evicted: Vec<String>,
}

impl CreatedSession {
    /// Check if any sessions were evicted.
    #[must_use]
    pub fn has_evictions(&self) -> bool {
        !self.evicted.is_empty()
    }
}

/// A live session of a principal.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSession {
    pub session_id: String,
    pub record: SessionRecord,
}

/// Issues, validates, and revokes sessions over a [`SessionStore`].
///
/// The manager holds no mutable state of its own; clones share the store
/// handle. Create one at startup and hand clones to request handlers.
pub struct SessionManager<S: SessionStore> {
    store: Arc<S>,
    keys: KeySpace,
    ttl: Duration,
    max_sessions: usize,
}

impl<S: SessionStore> Clone for SessionManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            keys: self.keys.clone(),
            ttl: self.ttl,
            max_sessions: self.max_sessions,
        }
    }
}

impl<S: SessionStore> SessionManager<S> {
    /// Create a session manager over `store`.
    ///
    /// # Errors
    ///
    /// Returns `TidemarkError::Config` if the configuration is invalid.
    pub fn new(store: S, config: &SessionConfig) -> Result<Self> {
        Self::from_arc(Arc::new(store), config)
    }

    /// Create a session manager over a shared store handle.
    pub fn from_arc(store: Arc<S>, config: &SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            keys: KeySpace::new(config.key_prefix.clone()),
            ttl: config.ttl(),
            max_sessions: config.max_sessions,
        })
    }

    /// Override the session TTL.
    ///
    /// Allows sub-second TTLs, which the seconds-based config cannot express.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Override the maximum concurrent sessions per principal (at least 1).
    #[must_use]
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    fn index(&self) -> SessionIndex<'_, S> {
        SessionIndex::new(self.store.as_ref(), &self.keys)
    }

    /// Create a new session for `record.principal_id`.
    ///
    /// The record write and the index append happen atomically in the store.
    /// If the principal already has `max_sessions` sessions, the oldest are
    /// evicted and their records deleted.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `principal_id` is empty
    /// - `StoreUnavailable` if the atomic write could not be committed; no
    ///   session was created
    pub async fn create_session(&self, record: SessionRecord) -> Result<CreatedSession> {
        if record.principal_id.is_empty() {
            return Err(TidemarkError::invalid_input("principal_id must not be empty"));
        }

        let session_id = generate_session_id();
        let payload = record::encode(&record)?;

        let evicted = self
            .index()
            .append(
                &record.principal_id,
                &session_id,
                payload,
                self.ttl,
                self.max_sessions,
            )
            .await
            .inspect_err(|e| {
                tracing::error!(
                    principal_id = %record.principal_id,
                    error = %e,
                    "Failed to create session"
                );
            })?;

        if !evicted.is_empty() {
            // Evicted ids are already out of the index; a failed delete only
            // leaves records that nothing points at until their TTL runs out.
            self.delete_records(&evicted, "evicted session").await;

            for evicted_id in &evicted {
                tracing::info!(
                    target: "session.evicted",
                    principal_id = %record.principal_id,
                    session_id = %evicted_id,
                    "Session evicted due to session limit"
                );
            }
        }

        tracing::info!(
            target: "session.created",
            principal_id = %record.principal_id,
            evicted_count = evicted.len(),
            "New session created"
        );

        Ok(CreatedSession {
            session_id,
            evicted,
        })
    }

    /// Validate a session id and slide its expiration.
    ///
    /// Returns `None` for unknown, expired, revoked, or unreadable sessions,
    /// and also when the store cannot be reached: a failed validation always
    /// means "not authenticated".
    ///
    /// On success the record and the principal's index get a fresh TTL. If the
    /// record carries connection info, `last_active_at` is stamped and the
    /// record rewritten in the same step.
    pub async fn validate_session(&self, session_id: &str) -> Option<SessionRecord> {
        if !is_well_formed(session_id) {
            tracing::debug!("Rejected session id with unexpected shape");
            return None;
        }

        let key = self.keys.session(session_id);
        let mut record = self.load_record(&key).await?;

        let refreshed = match record.connection.as_mut() {
            Some(connection) => {
                connection.touch();
                match record::encode(&record) {
                    Ok(payload) => self.store.replace_with_ttl(&key, payload, self.ttl).await,
                    Err(e) => Err(e),
                }
            }
            None => self.store.expire(&key, self.ttl).await,
        };

        match refreshed {
            Ok(true) => {}
            // Deleted between read and refresh: revoked or expired just now
            Ok(false) => return None,
            Err(e) => {
                tracing::warn!(
                    target: "session.store_error",
                    error = %e,
                    "Sliding refresh failed, treating session as invalid"
                );
                return None;
            }
        }

        if let Err(e) = self.index().touch(&record.principal_id, self.ttl).await {
            tracing::warn!(
                target: "session.store_error",
                principal_id = %record.principal_id,
                error = %e,
                "Failed to refresh session index TTL"
            );
        }

        Some(record)
    }

    /// All live sessions of a principal, oldest first.
    ///
    /// Index entries whose record is gone (or unreadable) are left out and
    /// removed from the index. That cleanup is best-effort and never changes
    /// the result.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the index or records cannot be read.
    pub async fn get_user_sessions(&self, principal_id: &str) -> Result<Vec<ActiveSession>> {
        let session_ids = self.index().list(principal_id).await?;
        if session_ids.is_empty() {
            return Ok(Vec::new());
        }

        let values = self.store.multi_get(&self.keys.sessions(&session_ids)).await?;

        let mut active = Vec::with_capacity(session_ids.len());
        let mut ghosts = Vec::new();
        let mut unreadable = Vec::new();

        for (session_id, value) in session_ids.into_iter().zip(values) {
            let Some(bytes) = value else {
                ghosts.push(session_id);
                continue;
            };

            match record::decode(&bytes) {
                Ok(record) if record.principal_id == principal_id => {
                    active.push(ActiveSession { session_id, record });
                }
                Ok(record) => {
                    tracing::warn!(
                        target: "session.malformed",
                        principal_id = %principal_id,
                        owner = %record.principal_id,
                        "Index entry points at another principal's session"
                    );
                    ghosts.push(session_id);
                }
                Err(e) => {
                    tracing::warn!(
                        target: "session.malformed",
                        principal_id = %principal_id,
                        error = %e,
                        "Dropping unreadable session record"
                    );
                    unreadable.push(session_id.clone());
                    ghosts.push(session_id);
                }
            }
        }

        if !ghosts.is_empty() {
            self.cleanup_ghosts(principal_id, &ghosts).await;
        }
        if !unreadable.is_empty() {
            self.delete_records(&unreadable, "unreadable session").await;
        }

        Ok(active)
    }

    /// Number of live sessions of a principal.
    pub async fn session_count(&self, principal_id: &str) -> Result<usize> {
        Ok(self.get_user_sessions(principal_id).await?.len())
    }

    /// Revoke one session. Idempotent and best-effort.
    ///
    /// Returns `true` if a live session was found and deleted. Failures are
    /// logged, never returned.
    pub async fn revoke_session(&self, session_id: &str) -> bool {
        if !is_well_formed(session_id) {
            return false;
        }

        let key = self.keys.session(session_id);
        let owner = self.load_record(&key).await.map(|record| record.principal_id);

        if let Some(ref principal_id) = owner {
            if let Err(e) = self.index().remove(principal_id, session_id).await {
                tracing::warn!(
                    target: "session.store_error",
                    principal_id = %principal_id,
                    error = %e,
                    "Failed to remove revoked session from index"
                );
            }
        }

        if let Err(e) = self.store.delete(&[key]).await {
            tracing::warn!(
                target: "session.store_error",
                error = %e,
                "Failed to delete revoked session"
            );
            return false;
        }

        if let Some(principal_id) = owner {
            tracing::info!(
                target: "session.revoked",
                principal_id = %principal_id,
                "Session revoked"
            );
            true
        } else {
            false
        }
    }

    /// Delete a session record without touching the index.
    ///
    /// The index entry becomes a ghost and is cleaned up by the next listing.
    pub async fn invalidate_session(&self, session_id: &str) {
        if let Err(e) = self.store.delete(&[self.keys.session(session_id)]).await {
            tracing::warn!(
                target: "session.store_error",
                error = %e,
                "Failed to invalidate session"
            );
        }
    }

    /// Revoke every session of a principal except `keep_session_id`.
    ///
    /// Useful for "sign out other devices". Returns the number of index
    /// entries revoked.
    pub async fn revoke_other_sessions(
        &self,
        principal_id: &str,
        keep_session_id: &str,
    ) -> Result<usize> {
        let others: Vec<String> = self
            .index()
            .list(principal_id)
            .await?
            .into_iter()
            .filter(|id| id != keep_session_id)
            .collect();

        if others.is_empty() {
            return Ok(0);
        }

        self.store.delete(&self.keys.sessions(&others)).await?;
        self.cleanup_ghosts(principal_id, &others).await;

        tracing::info!(
            target: "session.revoked",
            principal_id = %principal_id,
            count = others.len(),
            "Other sessions revoked"
        );

        Ok(others.len())
    }

    /// Revoke all sessions of a principal ("sign out everywhere").
    ///
    /// Deletes every indexed record and the index itself. Returns the number
    /// of index entries revoked.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the index cannot be read or the records
    /// cannot be deleted.
    pub async fn revoke_all_sessions(&self, principal_id: &str) -> Result<usize> {
        let index = self.index();
        let session_ids = index.list(principal_id).await?;

        if session_ids.is_empty() {
            index.drop_key(principal_id).await?;
        } else {
            self.store.delete(&self.keys.sessions(&session_ids)).await?;

            // Remove only the entries read above: a session created
            // concurrently keeps its index entry.
            if let Err(e) = index.remove_many(principal_id, &session_ids).await {
                tracing::warn!(
                    target: "session.store_error",
                    principal_id = %principal_id,
                    error = %e,
                    "Failed to clear session index after revoking all sessions"
                );
            }
        }

        tracing::warn!(
            target: "session.revoke_all",
            principal_id = %principal_id,
            count = session_ids.len(),
            "All sessions revoked"
        );

        Ok(session_ids.len())
    }

    /// Replace a session id while keeping its data (rotation).
    ///
    /// The new session is created before the old one is revoked, so a failed
    /// create leaves the caller with the old, still valid session. Returns
    /// `None` if the old session is not valid.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the new session could not be created.
    pub async fn regenerate_session(&self, old_session_id: &str) -> Result<Option<CreatedSession>> {
        let Some(record) = self.validate_session(old_session_id).await else {
            return Ok(None);
        };

        let principal_id = record.principal_id.clone();
        let created = self.create_session(record).await?;

        self.revoke_session(old_session_id).await;

        tracing::info!(
            target: "session.rotated",
            principal_id = %principal_id,
            "Session rotated"
        );

        Ok(Some(created))
    }

    /// Merge `patch` into a stored session and refresh its TTL.
    ///
    /// Returns the updated record, or `None` if the session does not exist
    /// (or is unreadable). Never creates a session.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the store cannot be reached.
    pub async fn update_session_user(
        &self,
        session_id: &str,
        patch: SessionPatch,
    ) -> Result<Option<SessionRecord>> {
        if !is_well_formed(session_id) {
            return Ok(None);
        }

        let key = self.keys.session(session_id);
        let mut record = match self.read_record(&key).await {
            Ok(record) => record,
            Err(e) if e.is_unauthenticated() => {
                if matches!(e, TidemarkError::Malformed(_)) {
                    tracing::warn!(
                        target: "session.malformed",
                        error = %e,
                        "Cannot update unreadable session record"
                    );
                }
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        record.apply(patch);
        if let Some(connection) = record.connection.as_mut() {
            connection.touch();
        }

        let payload = record::encode(&record)?;
        if !self.store.replace_with_ttl(&key, payload, self.ttl).await? {
            return Ok(None);
        }

        if let Err(e) = self.index().touch(&record.principal_id, self.ttl).await {
            tracing::warn!(
                target: "session.store_error",
                principal_id = %record.principal_id,
                error = %e,
                "Failed to refresh session index TTL"
            );
        }

        Ok(Some(record))
    }

    /// Check if the backing store is reachable.
    pub async fn is_healthy(&self) -> bool {
        self.store.ping().await
    }

    /// Session TTL applied on create and on every refresh.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Maximum concurrent sessions per principal.
    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Key layout used in the store.
    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read and decode a record. Absent, unreadable, and unreachable all
    /// come back as `None`; the latter two are logged.
    async fn load_record(&self, key: &str) -> Option<SessionRecord> {
        match self.read_record(key).await {
            Ok(record) => Some(record),
            Err(TidemarkError::NotFound(_)) => None,
            Err(e) if e.is_store_unavailable() => {
                tracing::warn!(
                    target: "session.store_error",
                    error = %e,
                    "Session lookup failed, treating as not authenticated"
                );
                None
            }
            Err(e) => {
                tracing::warn!(
                    target: "session.malformed",
                    error = %e,
                    "Ignoring unreadable session record"
                );
                None
            }
        }
    }

    /// Read and decode a record, reporting an absent key as `NotFound`.
    async fn read_record(&self, key: &str) -> Result<SessionRecord> {
        let bytes = self
            .store
            .get(key)
            .await?
            .ok_or_else(|| TidemarkError::not_found("session record"))?;
        record::decode(&bytes)
    }

    /// Best-effort record deletion. Failures are logged and dropped.
    async fn delete_records(&self, session_ids: &[String], what: &'static str) {
        if let Err(e) = self.store.delete(&self.keys.sessions(session_ids)).await {
            tracing::warn!(
                target: "session.store_error",
                count = session_ids.len(),
                error = %e,
                "Failed to delete {}", what
            );
        }
    }

    /// Best-effort index cleanup. Failures are logged and dropped.
    async fn cleanup_ghosts(&self, principal_id: &str, session_ids: &[String]) {
        match self.index().remove_many(principal_id, session_ids).await {
            Ok(removed) => {
                tracing::debug!(
                    target: "session.cleanup",
                    principal_id = %principal_id,
                    removed = removed,
                    "Removed stale entries from session index"
                );
            }
            Err(e) => {
                tracing::warn!(
                    target: "session.store_error",
                    principal_id = %principal_id,
                    error = %e,
                    "Failed to clean up session index"
                );
            }
        }
    }
}

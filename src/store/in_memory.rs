use crate::error::{Result, TidemarkError};
use crate::traits::session::{IndexedWrite, SessionStore};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const WRONG_TYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

#[derive(Debug, Clone)]
enum Value {
    Bytes(Vec<u8>),
    List(VecDeque<String>),
}

/// Deadline `ttl` from `now`. A TTL past the clock's range never expires.
fn deadline(now: Instant, ttl: Duration) -> Option<Instant> {
    now.checked_add(ttl)
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// All keys live in one map behind one lock, so compound operations are
/// atomic with respect to each other.
#[derive(Debug, Default)]
struct State {
    entries: HashMap<String, Entry>,
}

impl State {
    /// Drop `key` if its deadline has passed, then return it.
    fn live(&mut self, key: &str, now: Instant) -> Option<&mut Entry> {
        if self.entries.get(key).is_some_and(|e| e.is_expired(now)) {
            self.entries.remove(key);
        }
        self.entries.get_mut(key)
    }
}

/// In-memory session store implementation
///
/// Keeps strings and lists with per-key deadlines, the same shape of data the
/// Redis store keeps. Suitable for development and testing, but not for
/// production: data is lost on restart and not shared across instances.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    state: Arc<Mutex<State>>,
}

impl InMemorySessionStore {
    /// Create an empty in-memory session store
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every expired key
    ///
    /// Expired keys are already invisible to readers; this only reclaims memory.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        let initial_len = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired(now));
        initial_len - state.entries.len()
    }

    /// Number of live keys
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let state = self.state.lock().await;
        state.entries.values().filter(|e| !e.is_expired(now)).count()
    }

    /// Whether the store holds no live keys
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remaining time to live of `key`, if it exists and has a deadline
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        state
            .live(key, now)
            .and_then(|entry| entry.expires_at)
            .map(|at| at.saturating_duration_since(now))
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        match state.live(key, now) {
            None => Ok(None),
            Some(Entry { value: Value::Bytes(bytes), .. }) => Ok(Some(bytes.clone())),
            Some(_) => Err(TidemarkError::store_unavailable(WRONG_TYPE)),
        }
    }

    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut state = self.state.lock().await;
        state.entries.insert(
            key.to_string(),
            Entry {
                value: Value::Bytes(value),
                expires_at: deadline(Instant::now(), ttl),
            },
        );
        Ok(())
    }

    async fn replace_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        match state.live(key, now) {
            None => Ok(false),
            Some(entry) => {
                // SET XX replaces regardless of the previous type
                entry.value = Value::Bytes(value);
                entry.expires_at = deadline(now, ttl);
                Ok(true)
            }
        }
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        let mut state = self.state.lock().await;
        for key in keys {
            state.entries.remove(key);
        }
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        match state.live(key, now) {
            Some(entry) => {
                entry.expires_at = deadline(now, ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        let values = keys
            .iter()
            .map(|key| match state.live(key, now) {
                Some(Entry { value: Value::Bytes(bytes), .. }) => Some(bytes.clone()),
                // MGET answers nil for keys holding other types
                _ => None,
            })
            .collect();
        Ok(values)
    }

    async fn list_members(&self, key: &str) -> Result<Vec<String>> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        match state.live(key, now) {
            None => Ok(Vec::new()),
            Some(Entry { value: Value::List(list), .. }) => Ok(list.iter().cloned().collect()),
            Some(_) => Err(TidemarkError::store_unavailable(WRONG_TYPE)),
        }
    }

    async fn list_remove(&self, key: &str, member: &str) -> Result<usize> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        let (removed, now_empty) = match state.live(key, now) {
            None => return Ok(0),
            Some(Entry { value: Value::List(list), .. }) => {
                let before = list.len();
                list.retain(|m| m != member);
                (before - list.len(), list.is_empty())
            }
            Some(_) => return Err(TidemarkError::store_unavailable(WRONG_TYPE)),
        };
        // Empty lists cease to exist
        if now_empty {
            state.entries.remove(key);
        }
        Ok(removed)
    }

    async fn write_indexed(&self, write: IndexedWrite) -> Result<Vec<String>> {
        let now = Instant::now();
        let expires_at = deadline(now, write.ttl);
        let mut state = self.state.lock().await;

        // Validate the index type before mutating anything
        if let Some(entry) = state.live(&write.index_key, now) {
            if !matches!(entry.value, Value::List(_)) {
                return Err(TidemarkError::store_unavailable(WRONG_TYPE));
            }
        }

        state.entries.insert(
            write.record_key,
            Entry {
                value: Value::Bytes(write.payload),
                expires_at,
            },
        );

        let entry = state
            .entries
            .entry(write.index_key.clone())
            .or_insert_with(|| Entry {
                value: Value::List(VecDeque::new()),
                expires_at: None,
            });
        entry.expires_at = expires_at;

        let evicted: Vec<String> = match &mut entry.value {
            Value::List(list) => {
                list.push_back(write.member);
                let excess = list.len().saturating_sub(write.capacity);
                list.drain(..excess).collect()
            }
            Value::Bytes(_) => return Err(TidemarkError::store_unavailable(WRONG_TYPE)),
        };

        let now_empty = matches!(&entry.value, Value::List(list) if list.is_empty());
        if now_empty {
            state.entries.remove(&write.index_key);
        }

        Ok(evicted)
    }

    async fn ping(&self) -> bool {
        true // In-memory store is always reachable
    }
}

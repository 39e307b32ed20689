use crate::error::{Result, TidemarkError};
use crate::store::{StoreConfig, ttl_millis};
use crate::traits::session::{IndexedWrite, SessionStore};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;

/// Record write, tail append, TTL alignment and head trim in one script.
///
/// KEYS[1] record key, KEYS[2] index key.
/// ARGV[1] payload, ARGV[2] ttl in ms, ARGV[3] member, ARGV[4] capacity.
const APPEND_AND_TRIM: &str = r"
redis.call('SET', KEYS[1], ARGV[1], 'PX', ARGV[2])
redis.call('RPUSH', KEYS[2], ARGV[3])
redis.call('PEXPIRE', KEYS[2], ARGV[2])

local capacity = tonumber(ARGV[4])
local count = redis.call('LLEN', KEYS[2])
if count > capacity then
  local excess = count - capacity
  local removed = redis.call('LRANGE', KEYS[2], 0, excess - 1)
  redis.call('LTRIM', KEYS[2], excess, -1)
  return removed
end
return {}
";

/// Redis session store implementation
///
/// Holds one auto-reconnecting multiplexed connection, opened when the store
/// is constructed and shared by every clone. Create it once at startup and
/// pass it to the session manager.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
    append_script: redis::Script,
}

impl RedisSessionStore {
    /// Connect to Redis at `url` (e.g. `redis://:password@127.0.0.1:6379/0`)
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| TidemarkError::config(format!("Failed to create Redis client: {}", e)))?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| TidemarkError::store_unavailable(format!("Failed to connect to Redis: {}", e)))?;

        tracing::debug!("Redis session store connected");

        Ok(Self {
            conn,
            append_script: redis::Script::new(APPEND_AND_TRIM),
        })
    }

    /// Connect using a [`StoreConfig`]
    pub async fn from_config(config: &StoreConfig) -> Result<Self> {
        let url = config.connection_url()?;
        Self::connect(&url).await
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();

        let value: Option<Vec<u8>> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| TidemarkError::store_unavailable(format!("Redis GET failed: {}", e)))?;

        Ok(value)
    }

    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();

        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut conn)
            .await
            .map_err(|e| TidemarkError::store_unavailable(format!("Redis SET failed: {}", e)))?;

        Ok(())
    }

    async fn replace_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();

        // Nil reply means the key was absent and nothing was written
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_millis(ttl))
            .arg("XX")
            .query_async(&mut conn)
            .await
            .map_err(|e| TidemarkError::store_unavailable(format!("Redis SET XX failed: {}", e)))?;

        Ok(reply.is_some())
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();

        let _: () = redis::cmd("DEL")
            .arg(keys)
            .query_async(&mut conn)
            .await
            .map_err(|e| TidemarkError::store_unavailable(format!("Redis DEL failed: {}", e)))?;

        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();

        let updated: bool = redis::cmd("PEXPIRE")
            .arg(key)
            .arg(ttl_millis(ttl))
            .query_async(&mut conn)
            .await
            .map_err(|e| TidemarkError::store_unavailable(format!("Redis PEXPIRE failed: {}", e)))?;

        Ok(updated)
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();

        let values: Vec<Option<Vec<u8>>> = redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut conn)
            .await
            .map_err(|e| TidemarkError::store_unavailable(format!("Redis MGET failed: {}", e)))?;

        Ok(values)
    }

    async fn list_members(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();

        let members: Vec<String> = redis::cmd("LRANGE")
            .arg(key)
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await
            .map_err(|e| TidemarkError::store_unavailable(format!("Redis LRANGE failed: {}", e)))?;

        Ok(members)
    }

    async fn list_remove(&self, key: &str, member: &str) -> Result<usize> {
        let mut conn = self.conn.clone();

        let removed: usize = redis::cmd("LREM")
            .arg(key)
            .arg(0)
            .arg(member)
            .query_async(&mut conn)
            .await
            .map_err(|e| TidemarkError::store_unavailable(format!("Redis LREM failed: {}", e)))?;

        Ok(removed)
    }

    async fn write_indexed(&self, write: IndexedWrite) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();

        let evicted: Vec<String> = self
            .append_script
            .key(&write.record_key)
            .key(&write.index_key)
            .arg(write.payload.as_slice())
            .arg(ttl_millis(write.ttl))
            .arg(&write.member)
            .arg(write.capacity)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| TidemarkError::store_unavailable(format!("Redis session append failed: {}", e)))?;

        Ok(evicted)
    }

    async fn ping(&self) -> bool {
        let mut conn = self.conn.clone();
        let result: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(target: "session.store_error", error = %e, "Redis ping failed");
                false
            }
        }
    }
}

//! Redis session store
//!
//! - Key: `prefix + session_id` (default prefix: "sess:")
//! - Value: JSON serialized session data
//! - TTL: millisecond expiry set by Redis itself, so a read after expiry
//!   finds nothing

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;

use super::SessionStore;
use crate::error::SessionError;
use crate::session::SessionData;

/// Redis session store
///
/// # Example
///
/// ```rust,ignore
/// use salvo_signed_session::RedisStore;
///
/// let client = redis::Client::open("redis://127.0.0.1/")?;
/// let store = RedisStore::new(client).await?;
/// ```
pub struct RedisStore {
    conn: Arc<ConnectionManager>,
    prefix: String,
}

impl RedisStore {
    /// Create a new Redis store with the default "sess:" prefix
    pub async fn new(client: redis::Client) -> Result<Self, SessionError> {
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::from_connection_manager(conn))
    }

    /// Create a new Redis store from a connection string
    pub async fn from_url(url: &str) -> Result<Self, SessionError> {
        let client = redis::Client::open(url).map_err(|e| {
            SessionError::Store(format!("Failed to create Redis client: {}", e))
        })?;
        Self::new(client).await
    }

    /// Create a new Redis store from an existing connection manager
    pub fn from_connection_manager(conn: ConnectionManager) -> Self {
        Self {
            conn: Arc::new(conn),
            prefix: "sess:".to_string(),
        }
    }

    /// Build with custom key prefix
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Make a storage key from session ID
    fn make_key(&self, sid: &str) -> String {
        format!("{}{}", self.prefix, sid)
    }

    fn conn(&self) -> ConnectionManager {
        (*self.conn).clone()
    }

    async fn keys(&self) -> Result<Vec<String>, SessionError> {
        let mut conn = self.conn();
        let pattern = format!("{}*", self.prefix);
        let keys: Vec<String> = redis::cmd("KEYS")
            .arg(&pattern)
            .query_async(&mut conn)
            .await?;
        Ok(keys)
    }
}

impl Clone for RedisStore {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            prefix: self.prefix.clone(),
        }
    }
}

fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn read(&self, sid: &str) -> Result<Option<SessionData>, SessionError> {
        let key = self.make_key(sid);
        let mut conn = self.conn();

        let data: Option<String> = conn.get(&key).await?;
        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn write(
        &self,
        sid: &str,
        session: &SessionData,
        ttl: Option<Duration>,
    ) -> Result<(), SessionError> {
        let key = self.make_key(sid);
        let mut conn = self.conn();
        let json = serde_json::to_string(session)?;

        match ttl.map(ttl_millis) {
            // Redis rejects a zero expiry; the entry would be dead on arrival anyway
            Some(0) => conn.del::<_, ()>(&key).await?,
            Some(ms) => conn.pset_ex::<_, _, ()>(&key, &json, ms).await?,
            None => conn.set::<_, _, ()>(&key, &json).await?,
        }
        Ok(())
    }

    async fn touch(&self, sid: &str, ttl: Duration) -> Result<bool, SessionError> {
        let key = self.make_key(sid);
        let mut conn = self.conn();

        let ms = i64::try_from(ttl_millis(ttl)).unwrap_or(i64::MAX);
        // PEXPIRE returns false when the key doesn't exist
        let found: bool = conn.pexpire(&key, ms).await?;
        Ok(found)
    }

    async fn destroy(&self, sid: &str) -> Result<(), SessionError> {
        let key = self.make_key(sid);
        let mut conn = self.conn();

        conn.del::<_, ()>(&key).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        let keys = self.keys().await?;
        if !keys.is_empty() {
            let mut conn = self.conn();
            conn.del::<_, ()>(keys).await?;
        }
        Ok(())
    }

    async fn length(&self) -> Result<usize, SessionError> {
        Ok(self.keys().await?.len())
    }
}

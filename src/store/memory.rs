//! In-memory session store
//!
//! This is primarily for development and testing.
//! For production, use RedisStore or another persistent store.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use super::SessionStore;
use crate::error::SessionError;
use crate::session::SessionData;

type Sessions = RwLock<HashMap<String, StoredSession>>;

struct StoredSession {
    data: SessionData,
    expires_at: Option<Instant>,
}

impl StoredSession {
    fn is_live(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(exp) => exp > now,
            None => true,
        }
    }
}

/// In-memory session store
///
/// Expired entries are never returned. They are dropped by
/// [`cleanup_expired`](Self::cleanup_expired), which can be run periodically
/// with [`spawn_sweeper`](Self::spawn_sweeper).
///
/// Warning: This store is not suitable for production use because:
/// - Sessions are lost on server restart
/// - Sessions are not shared across multiple server instances
#[derive(Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<Sessions>,
}

impl MemoryStore {
    /// Create a new memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Clean up expired sessions, returning how many were removed
    pub fn cleanup_expired(&self) -> usize {
        sweep(&self.sessions)
    }

    /// Run [`cleanup_expired`](Self::cleanup_expired) every `period` on the
    /// current tokio runtime.
    ///
    /// The task ends on its own once every clone of the store is dropped.
    /// Must be called from within a tokio runtime.
    pub fn spawn_sweeper(&self, period: Duration) -> tokio::task::JoinHandle<()> {
        let sessions: Weak<Sessions> = Arc::downgrade(&self.sessions);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(live) = sessions.upgrade() else {
                    break;
                };
                let removed = sweep(&live);
                if removed > 0 {
                    tracing::debug!(removed, "swept expired sessions");
                }
            }
        })
    }
}

fn sweep(sessions: &Sessions) -> usize {
    let mut sessions = sessions.write();
    let before = sessions.len();
    let now = Instant::now();
    sessions.retain(|_, stored| stored.is_live(now));
    before - sessions.len()
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("sessions", &self.sessions.read().len())
            .finish()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn read(&self, sid: &str) -> Result<Option<SessionData>, SessionError> {
        let sessions = self.sessions.read();
        Ok(sessions
            .get(sid)
            .filter(|stored| stored.is_live(Instant::now()))
            .map(|stored| stored.data.clone()))
    }

    async fn write(
        &self,
        sid: &str,
        session: &SessionData,
        ttl: Option<Duration>,
    ) -> Result<(), SessionError> {
        let stored = StoredSession {
            data: session.clone(),
            // a TTL past what Instant can represent never expires
            expires_at: ttl.and_then(|ttl| Instant::now().checked_add(ttl)),
        };

        self.sessions.write().insert(sid.to_string(), stored);
        Ok(())
    }

    async fn touch(&self, sid: &str, ttl: Duration) -> Result<bool, SessionError> {
        let mut sessions = self.sessions.write();
        let now = Instant::now();

        match sessions.get_mut(sid) {
            Some(stored) if stored.is_live(now) => {
                stored.expires_at = now.checked_add(ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn destroy(&self, sid: &str) -> Result<(), SessionError> {
        self.sessions.write().remove(sid);
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        self.sessions.write().clear();
        Ok(())
    }

    async fn length(&self) -> Result<usize, SessionError> {
        self.cleanup_expired();
        Ok(self.sessions.read().len())
    }
}

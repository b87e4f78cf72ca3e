//! Session store trait

use async_trait::async_trait;
use std::time::Duration;

use crate::error::SessionError;
use crate::session::SessionData;

/// Trait for session storage backends
///
/// Every operation returns its outcome explicitly; backend failures are
/// reported as `Err` and never turned into "not found".
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Get a session by ID
    ///
    /// Returns None if the session doesn't exist or has expired
    async fn read(&self, sid: &str) -> Result<Option<SessionData>, SessionError>;

    /// Replace a session, creating it if absent
    ///
    /// With a TTL the entry expires that long after this call, otherwise it
    /// lives until destroyed.
    async fn write(
        &self,
        sid: &str,
        session: &SessionData,
        ttl: Option<Duration>,
    ) -> Result<(), SessionError>;

    /// Reset a session's TTL without modifying its data
    ///
    /// Returns false if there is no live session with this ID
    async fn touch(&self, sid: &str, ttl: Duration) -> Result<bool, SessionError>;

    /// Destroy/delete a session. Destroying a missing session is not an error.
    async fn destroy(&self, sid: &str) -> Result<(), SessionError>;

    /// Clear all sessions (optional)
    async fn clear(&self) -> Result<(), SessionError> {
        Err(SessionError::Store("clear not implemented".to_string()))
    }

    /// Get the count of all live sessions (optional)
    async fn length(&self) -> Result<usize, SessionError> {
        Err(SessionError::Store("length not implemented".to_string()))
    }
}

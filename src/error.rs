//! Session error types

use std::fmt;

/// Errors that can occur during session operations
#[derive(Debug)]
pub enum SessionError {
    /// Invalid middleware configuration (empty secret, bad cookie attribute).
    /// Only returned while constructing the handler.
    Configuration(String),
    /// Error from the session store
    Store(String),
    /// A store call did not complete within the configured timeout
    Timeout,
    /// Error during serialization/deserialization
    Serialization(String),
    /// The random source could not produce a session identifier
    EntropyExhausted(String),
    /// Redis error (when redis-store feature is enabled)
    #[cfg(feature = "redis-store")]
    Redis(redis::RedisError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Configuration(msg) => write!(f, "Invalid session configuration: {}", msg),
            SessionError::Store(msg) => write!(f, "Session store error: {}", msg),
            SessionError::Timeout => write!(f, "Session store operation timed out"),
            SessionError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            SessionError::EntropyExhausted(msg) => {
                write!(f, "Unable to generate session id: {}", msg)
            }
            #[cfg(feature = "redis-store")]
            SessionError::Redis(e) => write!(f, "Redis error: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

#[cfg(feature = "redis-store")]
impl From<redis::RedisError> for SessionError {
    fn from(err: redis::RedisError) -> Self {
        SessionError::Redis(err)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Serialization(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for SessionError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        SessionError::Timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            SessionError::Configuration("secret must not be empty".into()).to_string(),
            "Invalid session configuration: secret must not be empty"
        );
        assert_eq!(SessionError::Timeout.to_string(), "Session store operation timed out");
    }
}

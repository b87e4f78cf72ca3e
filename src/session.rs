//! Session data and the request-scoped session view

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::SessionError;

/// The persisted form of a session: a map of keys to JSON values.
///
/// Values are kept as [`Value`] and only deserialized into the caller's type
/// when read, so loading a session never fails on a type mismatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionData {
    data: HashMap<String, Value>,
}

impl SessionData {
    /// Create empty session data
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value from session data
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Set a value in session data
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), SessionError> {
        let value = serde_json::to_value(value)?;
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    /// Remove a value from session data
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Check if a key exists
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Clear all session data
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Check if session data is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of keys in the session
    pub fn len(&self) -> usize {
        self.data.len()
    }
}

/// What the middleware should do with the session once the handler chain is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fate {
    Keep,
    Regenerate,
    Destroy,
}

/// A request's view of its session.
///
/// Lives in the request's [`Depot`](salvo_core::Depot) for the duration of the
/// handler chain. Mutations only touch this in-memory copy; the middleware
/// persists it once, after the response has been produced.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    data: SessionData,
    is_new: bool,
    ephemeral: bool,
    dirty: bool,
    fate: Fate,
}

impl Session {
    /// Create a session view over data loaded from the store
    pub fn new(id: String, data: SessionData, is_new: bool) -> Self {
        Self {
            id,
            data,
            is_new,
            ephemeral: false,
            dirty: false,
            fate: Fate::Keep,
        }
    }

    /// A session that is never persisted, used when the store is unavailable.
    ///
    /// `id` is the identifier from the request's cookie, so a destroy can
    /// still reach the store.
    pub fn ephemeral(id: String) -> Self {
        Self {
            ephemeral: true,
            ..Self::new(id, SessionData::new(), true)
        }
    }

    /// Get the session ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Check if this session was created by the current request
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Whether this session will be discarded at the end of the request
    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    /// Check if the session has been modified
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Check if the session should be destroyed
    pub fn should_destroy(&self) -> bool {
        self.fate == Fate::Destroy
    }

    /// Check if the session should be regenerated
    pub fn should_regenerate(&self) -> bool {
        self.fate == Fate::Regenerate
    }

    /// Get a value from the session
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data.get(key)
    }

    /// Set a value in the session
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), SessionError> {
        self.data.set(key, value)?;
        self.dirty = true;
        Ok(())
    }

    /// Remove a value from the session
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let result = self.data.remove(key);
        if result.is_some() {
            self.dirty = true;
        }
        result
    }

    /// Check if a key exists in the session
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains(key)
    }

    /// Clear all session data
    pub fn clear(&mut self) {
        self.data.clear();
        self.dirty = true;
    }

    /// Mark the session for destruction.
    ///
    /// The store entry is removed and the client is told to drop its cookie.
    pub fn destroy(&mut self) {
        self.fate = Fate::Destroy;
    }

    /// Move the session data to a fresh ID when the request completes.
    pub fn regenerate(&mut self) {
        if self.fate != Fate::Destroy {
            self.fate = Fate::Regenerate;
            self.dirty = true;
        }
    }

    /// Get the session data
    pub fn data(&self) -> &SessionData {
        &self.data
    }

    /// Check if the session is empty (no user data)
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

//! Driven port for the key/value store that outlives a single process.
//!
//! The storage is synchronous, like the browser storage it stands in for.
//! Values are plain strings; consumers read them defensively.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use super::define_port_error;
use crate::domain::SessionKey;

define_port_error! {
    /// Errors raised by session storage adapters.
    pub enum SessionStorageError {
        /// Reading or writing the backing medium failed.
        Io { message: String } => "session storage i/o failed: {message}",
        /// The persisted data could not be parsed.
        Corrupt { message: String } => "session storage is corrupt: {message}",
    }
}

/// Port for persisted session values.
#[cfg_attr(test, mockall::automock)]
pub trait SessionStorage: Send + Sync {
    /// Value stored under `key`.
    fn get(&self, key: SessionKey) -> Result<Option<String>, SessionStorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: SessionKey, value: &str) -> Result<(), SessionStorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: SessionKey) -> Result<(), SessionStorageError>;

    /// Remove every session key.
    fn clear(&self) -> Result<(), SessionStorageError> {
        SessionKey::ALL.into_iter().try_for_each(|key| self.remove(key))
    }
}

/// Process-local storage used by tests and one-shot commands.
#[derive(Debug, Default)]
pub struct InMemorySessionStorage {
    values: Mutex<BTreeMap<SessionKey, String>>,
}

impl InMemorySessionStorage {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<SessionKey, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStorage for InMemorySessionStorage {
    fn get(&self, key: SessionKey) -> Result<Option<String>, SessionStorageError> {
        Ok(self.lock().get(&key).cloned())
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<(), SessionStorageError> {
        self.lock().insert(key, value.to_owned());
        Ok(())
    }

    fn remove(&self, key: SessionKey) -> Result<(), SessionStorageError> {
        self.lock().remove(&key);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStorageError> {
        self.lock().clear();
        Ok(())
    }
}

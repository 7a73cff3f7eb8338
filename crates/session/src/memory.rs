//! In-memory session store for tests/dev.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::store::{SessionStore, SessionStoreError};

/// Process-local session store.
///
/// - No IO
/// - Contents vanish with the process
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let entries = self.entries.read().map_err(|_| SessionStoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SessionStoreError> {
        let mut entries = self.entries.write().map_err(|_| SessionStoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SessionStoreError> {
        let mut entries = self.entries.write().map_err(|_| SessionStoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        let mut entries = self.entries.write().map_err(|_| SessionStoreError::Poisoned)?;
        entries.clear();
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, SessionStoreError> {
        let entries = self.entries.read().map_err(|_| SessionStoreError::Poisoned)?;
        Ok(entries.keys().cloned().collect())
    }
}

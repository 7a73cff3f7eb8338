//! Session store abstraction.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// The backing storage failed (IO, SQL, ...).
    #[error("session backend error: {0}")]
    Backend(String),

    /// Internal lock poisoning (in-memory store).
    #[error("session store lock poisoned")]
    Poisoned,

    /// A stored value is not valid JSON for the requested type.
    #[error("session value under {key:?} could not be decoded: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("session value under {key:?} could not be encoded: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Persisted key-value store backing the client session.
///
/// Implementations must be safe to share across tasks. Operations on
/// distinct keys are independent; there are no multi-key transactions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError>;

    /// Insert or overwrite `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), SessionStoreError>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), SessionStoreError>;

    /// Drop every entry.
    async fn clear(&self) -> Result<(), SessionStoreError>;

    /// All keys currently present, in ascending order.
    async fn keys(&self) -> Result<Vec<String>, SessionStoreError>;
}

/// Read and decode a JSON value.
pub async fn load_json<T>(store: &dyn SessionStore, key: &str) -> Result<Option<T>, SessionStoreError>
where
    T: DeserializeOwned,
{
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| SessionStoreError::Decode {
            key: key.to_string(),
            source,
        })
}

/// Encode and write a JSON value.
pub async fn save_json<T>(store: &dyn SessionStore, key: &str, value: &T) -> Result<(), SessionStoreError>
where
    T: Serialize + ?Sized + Sync,
{
    let raw = serde_json::to_string(value).map_err(|source| SessionStoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw).await
}

//! SQLite-backed session store (survives restarts).

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;

use crate::store::{SessionStore, SessionStoreError};

/// SQLite-backed session store.
///
/// This struct is cheap to clone and is safe to share across tasks. The
/// database is opened lazily on first use.
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    db_url: String,
    pool: Arc<Mutex<Option<SqlitePool>>>,
}

impl SqliteSessionStore {
    /// Create a store for `db_url` (e.g. `sqlite:///tmp/session.db` or
    /// `sqlite::memory:`).
    pub fn new(db_url: impl Into<String>) -> Self {
        Self {
            db_url: db_url.into(),
            pool: Arc::new(Mutex::new(None)),
        }
    }

    /// Store at `{app_data_dir}/skillhub/session.db`.
    pub fn open_default() -> anyhow::Result<Self> {
        let path = session_db_path()?;
        Ok(Self::new(format!("sqlite://{}", path.to_string_lossy())))
    }

    /// Open the pool and create the table if needed (idempotent).
    async fn pool(&self) -> anyhow::Result<SqlitePool> {
        let mut pool_guard = self.pool.lock().await;
        if let Some(pool) = pool_guard.as_ref() {
            return Ok(pool.clone());
        }

        let options = SqliteConnectOptions::from_str(&self.db_url)
            .with_context(|| format!("invalid session database url {:?}", self.db_url))?
            .create_if_missing(true);

        // A single long-lived connection: session traffic is tiny, and it keeps
        // `sqlite::memory:` databases alive for the lifetime of the store.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open session database {:?}", self.db_url))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session_entries (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create session_entries table")?;

        tracing::debug!(db_url = %self.db_url, "session database ready");

        *pool_guard = Some(pool.clone());
        Ok(pool)
    }

    async fn try_get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let pool = self.pool().await?;
        let row = sqlx::query("SELECT value FROM session_entries WHERE key = ?1")
            .bind(key)
            .fetch_optional(&pool)
            .await
            .context("failed to read session entry")?;

        match row {
            Some(row) => Ok(Some(row.try_get("value")?)),
            None => Ok(None),
        }
    }

    async fn try_set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let pool = self.pool().await?;
        sqlx::query(
            r#"
            INSERT INTO session_entries (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key)
            DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&pool)
        .await
        .context("failed to upsert session entry")?;
        Ok(())
    }

    async fn try_remove(&self, key: Option<&str>) -> anyhow::Result<()> {
        let pool = self.pool().await?;
        match key {
            Some(key) => sqlx::query("DELETE FROM session_entries WHERE key = ?1")
                .bind(key)
                .execute(&pool)
                .await
                .context("failed to delete session entry")?,
            None => sqlx::query("DELETE FROM session_entries")
                .execute(&pool)
                .await
                .context("failed to clear session entries")?,
        };
        Ok(())
    }

    async fn try_keys(&self) -> anyhow::Result<Vec<String>> {
        let pool = self.pool().await?;
        let rows = sqlx::query("SELECT key FROM session_entries ORDER BY key")
            .fetch_all(&pool)
            .await
            .context("failed to list session keys")?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("key").map_err(Into::into))
            .collect()
    }
}

fn backend(err: anyhow::Error) -> SessionStoreError {
    tracing::error!("session store failure: {err:?}");
    SessionStoreError::Backend(format!("{err:#}"))
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        self.try_get(key).await.map_err(backend)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SessionStoreError> {
        self.try_set(key, value).await.map_err(backend)
    }

    async fn remove(&self, key: &str) -> Result<(), SessionStoreError> {
        self.try_remove(Some(key)).await.map_err(backend)
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        self.try_remove(None).await.map_err(backend)
    }

    async fn keys(&self) -> Result<Vec<String>, SessionStoreError> {
        self.try_keys().await.map_err(backend)
    }
}

/// Resolve the path to the SQLite session database:
/// `{app_data_dir}/skillhub/session.db`.
fn session_db_path() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

    let mut dir = base;
    dir.push("skillhub");

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create session directory at {:?}", dir))?;

    dir.push("session.db");

    Ok(dir)
}

//! Resume position store
//!
//! Persists the last known playback offset per stream URL so a later play
//! request can resume where the listener left off. The engine only talks to
//! the [`ResumeStore`] trait; the shipped implementation is a SQLite
//! key-value table, with an in-memory variant for tests.

use crate::error::Result;
use async_trait::async_trait;
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Storage collaborator for per-stream resume offsets
#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Last stored offset for `url` in milliseconds, 0 if none.
    async fn get(&self, url: &str) -> Result<u64>;

    /// Store the current offset for `url`.
    async fn put(&self, url: &str, position_ms: u64) -> Result<()>;
}

/// SQLite-backed resume store (one row per stream URL)
pub struct SqliteResumeStore {
    pool: Pool<Sqlite>,
}

impl SqliteResumeStore {
    /// Create the store and its table if missing.
    pub async fn new(pool: Pool<Sqlite>) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS resume_positions (
                stream_url TEXT PRIMARY KEY,
                position_ms INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl ResumeStore for SqliteResumeStore {
    async fn get(&self, url: &str) -> Result<u64> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT position_ms FROM resume_positions WHERE stream_url = ?")
                .bind(url)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(ms,)| ms.max(0) as u64).unwrap_or(0))
    }

    async fn put(&self, url: &str, position_ms: u64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO resume_positions (stream_url, position_ms, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(stream_url) DO UPDATE SET
                position_ms = excluded.position_ms,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(url)
        .bind(position_ms as i64)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// In-memory resume store for tests and ephemeral deployments
#[derive(Default)]
pub struct MemoryResumeStore {
    inner: RwLock<HashMap<String, u64>>,
}

impl MemoryResumeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResumeStore for MemoryResumeStore {
    async fn get(&self, url: &str) -> Result<u64> {
        Ok(self.inner.read().await.get(url).copied().unwrap_or(0))
    }

    async fn put(&self, url: &str, position_ms: u64) -> Result<()> {
        self.inner.write().await.insert(url.to_string(), position_ms);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn sqlite_store() -> SqliteResumeStore {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteResumeStore::new(pool).await.unwrap()
    }

    #[tokio::test]
    async fn test_missing_url_defaults_to_zero() {
        let store = sqlite_store().await;
        assert_eq!(store.get("http://nowhere/stream").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = sqlite_store().await;
        store.put("http://a/stream", 42_000).await.unwrap();
        assert_eq!(store.get("http://a/stream").await.unwrap(), 42_000);

        // Overwrite replaces, not accumulates
        store.put("http://a/stream", 7_000).await.unwrap();
        assert_eq!(store.get("http://a/stream").await.unwrap(), 7_000);
    }

    #[tokio::test]
    async fn test_urls_are_independent() {
        let store = sqlite_store().await;
        store.put("http://a/stream", 10).await.unwrap();
        store.put("http://b/stream", 20).await.unwrap();
        assert_eq!(store.get("http://a/stream").await.unwrap(), 10);
        assert_eq!(store.get("http://b/stream").await.unwrap(), 20);
    }

    #[tokio::test]
    async fn test_positions_survive_reopen() {
        use sqlx::sqlite::SqliteConnectOptions;

        let dir = tempfile::tempdir().unwrap();
        let options = SqliteConnectOptions::new()
            .filename(dir.path().join("resume.db"))
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options.clone())
            .await
            .unwrap();
        let store = SqliteResumeStore::new(pool.clone()).await.unwrap();
        store.put("http://a/stream", 1_234).await.unwrap();
        pool.close().await;

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .unwrap();
        let store = SqliteResumeStore::new(pool).await.unwrap();
        assert_eq!(store.get("http://a/stream").await.unwrap(), 1_234);
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryResumeStore::new();
        assert_eq!(store.get("x").await.unwrap(), 0);
        store.put("x", 99).await.unwrap();
        assert_eq!(store.get("x").await.unwrap(), 99);
    }
}

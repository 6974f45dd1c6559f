//! Metadata store trait and SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::repos::{ContentRepo, CounterRepo, OwnershipRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: ContentRepo + OwnershipRepo + CounterRepo + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS content_records (
    content_hash        TEXT PRIMARY KEY,
    storage_object_id   TEXT NOT NULL,
    public_url          TEXT NOT NULL,
    size_bytes          INTEGER NOT NULL,
    file_type           TEXT NOT NULL,
    ref_count           INTEGER NOT NULL DEFAULT 1,
    created_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS ownership_records (
    owner               TEXT NOT NULL,
    content_hash        TEXT NOT NULL,
    filename            TEXT NOT NULL,
    created_at          TEXT NOT NULL,
    shared              INTEGER NOT NULL DEFAULT 0,
    view_count          INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (owner, content_hash, filename)
);

CREATE INDEX IF NOT EXISTS idx_ownership_records_hash
    ON ownership_records (content_hash);

CREATE TABLE IF NOT EXISTS owner_file_counts (
    owner               TEXT PRIMARY KEY,
    file_count          INTEGER NOT NULL
);
"#;

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store and run migrations.
    pub async fn new(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection
            // avoids persistent "database is locked" failures under axum
            // handler concurrency.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

mod sqlite_impl {
    use super::*;
    use crate::models::{ContentRow, OwnerCountRow, OwnershipRow};

    #[async_trait]
    impl ContentRepo for SqliteStore {
        async fn create_content(&self, content: &ContentRow) -> MetadataResult<()> {
            sqlx::query(
                r#"
                INSERT INTO content_records (
                    content_hash, storage_object_id, public_url,
                    size_bytes, file_type, ref_count, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&content.content_hash)
            .bind(&content.storage_object_id)
            .bind(&content.public_url)
            .bind(content.size_bytes)
            .bind(&content.file_type)
            .bind(content.ref_count)
            .bind(content.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                MetadataError::from_unique_violation(
                    e,
                    format!("content record for hash {}", content.content_hash),
                )
            })?;
            Ok(())
        }

        async fn get_content(&self, content_hash: &str) -> MetadataResult<Option<ContentRow>> {
            let row = sqlx::query_as::<_, ContentRow>(
                "SELECT * FROM content_records WHERE content_hash = ?",
            )
            .bind(content_hash)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn increment_ref_count(&self, content_hash: &str) -> MetadataResult<()> {
            let result = sqlx::query(
                "UPDATE content_records SET ref_count = ref_count + 1 WHERE content_hash = ?",
            )
            .bind(content_hash)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!(
                    "content record for hash {content_hash}"
                )));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl OwnershipRepo for SqliteStore {
        async fn create_ownership(&self, ownership: &OwnershipRow) -> MetadataResult<()> {
            sqlx::query(
                r#"
                INSERT INTO ownership_records (
                    owner, content_hash, filename, created_at, shared, view_count
                ) VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&ownership.owner)
            .bind(&ownership.content_hash)
            .bind(&ownership.filename)
            .bind(ownership.created_at)
            .bind(ownership.shared)
            .bind(ownership.view_count)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                MetadataError::from_unique_violation(
                    e,
                    format!(
                        "ownership ({}, {}, {})",
                        ownership.owner, ownership.content_hash, ownership.filename
                    ),
                )
            })?;
            Ok(())
        }

        async fn ownership_exists(
            &self,
            owner: &str,
            content_hash: &str,
            filename: &str,
        ) -> MetadataResult<bool> {
            let row: Option<(i32,)> = sqlx::query_as(
                "SELECT 1 FROM ownership_records WHERE owner = ? AND content_hash = ? AND filename = ?",
            )
            .bind(owner)
            .bind(content_hash)
            .bind(filename)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row.is_some())
        }
    }

    #[async_trait]
    impl CounterRepo for SqliteStore {
        async fn get_file_count(&self, owner: &str) -> MetadataResult<Option<i64>> {
            let row = sqlx::query_as::<_, OwnerCountRow>(
                "SELECT * FROM owner_file_counts WHERE owner = ?",
            )
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row.map(|r| r.file_count))
        }

        async fn insert_file_count(&self, owner: &str, file_count: i64) -> MetadataResult<()> {
            sqlx::query("INSERT INTO owner_file_counts (owner, file_count) VALUES (?, ?)")
                .bind(owner)
                .bind(file_count)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    MetadataError::from_unique_violation(e, format!("file counter for {owner}"))
                })?;
            Ok(())
        }

        async fn update_file_count(&self, owner: &str, file_count: i64) -> MetadataResult<()> {
            let result = sqlx::query("UPDATE owner_file_counts SET file_count = ? WHERE owner = ?")
                .bind(file_count)
                .bind(owner)
                .execute(&self.pool)
                .await?;

            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!("file counter for {owner}")));
            }
            Ok(())
        }
    }
}

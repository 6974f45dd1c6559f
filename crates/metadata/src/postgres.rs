//! PostgreSQL-based metadata store implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::models::{ContentRow, OwnerCountRow, OwnershipRow};
use crate::repos::{ContentRepo, CounterRepo, OwnershipRepo};
use crate::store::MetadataStore;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};
use std::str::FromStr;

/// PostgreSQL schema (embedded).
const POSTGRES_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS content_records (
    content_hash        TEXT PRIMARY KEY,
    storage_object_id   TEXT NOT NULL,
    public_url          TEXT NOT NULL,
    size_bytes          BIGINT NOT NULL,
    file_type           TEXT NOT NULL,
    ref_count           BIGINT NOT NULL DEFAULT 1,
    created_at          TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS ownership_records (
    owner               TEXT NOT NULL,
    content_hash        TEXT NOT NULL,
    filename            TEXT NOT NULL,
    created_at          TIMESTAMPTZ NOT NULL,
    shared              BOOLEAN NOT NULL DEFAULT FALSE,
    view_count          BIGINT NOT NULL DEFAULT 0,
    PRIMARY KEY (owner, content_hash, filename)
);

CREATE INDEX IF NOT EXISTS idx_ownership_records_hash
    ON ownership_records (content_hash);

CREATE TABLE IF NOT EXISTS owner_file_counts (
    owner               TEXT PRIMARY KEY,
    file_count          BIGINT NOT NULL
);
"#;

fn postgres_schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            (!trimmed.is_empty()).then_some(trimmed)
        })
        .collect()
}

/// PostgreSQL-based metadata store.
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Create a new PostgreSQL store from a connection URL.
    pub async fn from_url(url: &str, max_connections: u32) -> MetadataResult<Self> {
        let opts = PgConnectOptions::from_str(url)?;

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for PostgresStore {
    async fn migrate(&self) -> MetadataResult<()> {
        // PostgreSQL doesn't allow multiple statements in a single prepared
        // statement, so the schema is split and executed statement by statement.
        for statement in postgres_schema_statements(POSTGRES_SCHEMA) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ContentRepo for PostgresStore {
    async fn create_content(&self, content: &ContentRow) -> MetadataResult<()> {
        sqlx::query(
            r#"
            INSERT INTO content_records (
                content_hash, storage_object_id, public_url,
                size_bytes, file_type, ref_count, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
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
            "SELECT * FROM content_records WHERE content_hash = $1",
        )
        .bind(content_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn increment_ref_count(&self, content_hash: &str) -> MetadataResult<()> {
        let result = sqlx::query(
            "UPDATE content_records SET ref_count = ref_count + 1 WHERE content_hash = $1",
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
impl OwnershipRepo for PostgresStore {
    async fn create_ownership(&self, ownership: &OwnershipRow) -> MetadataResult<()> {
        sqlx::query(
            r#"
            INSERT INTO ownership_records (
                owner, content_hash, filename, created_at, shared, view_count
            ) VALUES ($1, $2, $3, $4, $5, $6)
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
            "SELECT 1 FROM ownership_records WHERE owner = $1 AND content_hash = $2 AND filename = $3",
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
impl CounterRepo for PostgresStore {
    async fn get_file_count(&self, owner: &str) -> MetadataResult<Option<i64>> {
        let row =
            sqlx::query_as::<_, OwnerCountRow>("SELECT * FROM owner_file_counts WHERE owner = $1")
                .bind(owner)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|r| r.file_count))
    }

    async fn insert_file_count(&self, owner: &str, file_count: i64) -> MetadataResult<()> {
        sqlx::query("INSERT INTO owner_file_counts (owner, file_count) VALUES ($1, $2)")
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
        let result = sqlx::query("UPDATE owner_file_counts SET file_count = $1 WHERE owner = $2")
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

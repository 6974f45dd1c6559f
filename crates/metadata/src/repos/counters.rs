//! Per-owner file counter repository.

use crate::error::MetadataResult;
use async_trait::async_trait;

/// Repository for per-owner file counters.
///
/// The read-modify-write across these three operations is deliberately left
/// to the caller; see the dedup engine for the sequencing.
#[async_trait]
pub trait CounterRepo: Send + Sync {
    /// Get an owner's file count, if a counter row exists.
    async fn get_file_count(&self, owner: &str) -> MetadataResult<Option<i64>>;

    /// Insert a counter row for an owner's first upload.
    async fn insert_file_count(&self, owner: &str, file_count: i64) -> MetadataResult<()>;

    /// Overwrite an owner's file count.
    async fn update_file_count(&self, owner: &str, file_count: i64) -> MetadataResult<()>;
}

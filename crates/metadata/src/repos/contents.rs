//! Content record repository.

use crate::error::MetadataResult;
use crate::models::ContentRow;
use async_trait::async_trait;

/// Repository for content records.
#[async_trait]
pub trait ContentRepo: Send + Sync {
    /// Insert a fresh content record.
    ///
    /// Returns `MetadataError::AlreadyExists` if a record for this hash is
    /// already present. Under concurrent first uploads of the same hash,
    /// the primary key arbitrates: exactly one insert wins.
    async fn create_content(&self, content: &ContentRow) -> MetadataResult<()>;

    /// Get a content record by hash.
    async fn get_content(&self, content_hash: &str) -> MetadataResult<Option<ContentRow>>;

    /// Increment a content record's reference count by one.
    async fn increment_ref_count(&self, content_hash: &str) -> MetadataResult<()>;
}

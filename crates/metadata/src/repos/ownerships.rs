//! Ownership record repository.

use crate::error::MetadataResult;
use crate::models::OwnershipRow;
use async_trait::async_trait;

/// Repository for ownership records.
#[async_trait]
pub trait OwnershipRepo: Send + Sync {
    /// Insert an ownership record.
    ///
    /// Returns `MetadataError::AlreadyExists` if this exact
    /// (owner, content_hash, filename) triple is already recorded.
    async fn create_ownership(&self, ownership: &OwnershipRow) -> MetadataResult<()>;

    /// Check whether an (owner, content_hash, filename) triple exists.
    async fn ownership_exists(
        &self,
        owner: &str,
        content_hash: &str,
        filename: &str,
    ) -> MetadataResult<bool>;
}

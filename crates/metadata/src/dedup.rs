//! Reference-counted dedup engine.
//!
//! Decides whether an upload can be short-circuited ("instant upload") and
//! performs the metadata write sequences for both the instant and the full
//! upload paths.
//!
//! The write sequences are intentionally not wrapped in a single
//! transaction, matching the deployed behavior this service replaces:
//! - Two concurrent first uploads of the same hash can both observe
//!   `NotFound`; the content-record primary key arbitrates, exactly one
//!   insert wins, and the loser's already-pushed object is orphaned in the
//!   distributed store.
//! - The ownership insert runs first in both paths, so a duplicate claim
//!   aborts with zero side effects before any counter is touched.

use crate::error::MetadataResult;
use crate::models::{ContentRow, OwnershipRow};
use crate::repos::{ContentRepo, CounterRepo, OwnershipRepo};
use crate::store::MetadataStore;
use depot_core::file_type;
use std::sync::Arc;
use time::OffsetDateTime;

/// Outcome of an instant-upload check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupOutcome {
    /// No content record for this hash; a full upload is required.
    NotFound,
    /// This owner already has this exact (hash, filename).
    AlreadyOwned,
    /// The content exists but belongs to other owners only; the caller may
    /// record a shared copy without a physical transfer.
    OwnedByOthers {
        /// Current reference count of the content record.
        ref_count: i64,
    },
}

/// Dedup engine over the metadata store.
#[derive(Clone)]
pub struct DedupEngine {
    store: Arc<dyn MetadataStore>,
}

impl DedupEngine {
    /// Create a new dedup engine.
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    /// Check whether an upload can be short-circuited.
    pub async fn check_instant_upload(
        &self,
        owner: &str,
        content_hash: &str,
        filename: &str,
    ) -> MetadataResult<DedupOutcome> {
        let Some(content) = self.store.get_content(content_hash).await? else {
            return Ok(DedupOutcome::NotFound);
        };

        if self
            .store
            .ownership_exists(owner, content_hash, filename)
            .await?
        {
            return Ok(DedupOutcome::AlreadyOwned);
        }

        Ok(DedupOutcome::OwnedByOthers {
            ref_count: content.ref_count,
        })
    }

    /// Record a shared copy of existing content for a new owner.
    ///
    /// Inserts the ownership record, increments the content reference
    /// count, and bumps the owner's file counter. A duplicate ownership
    /// surfaces as `MetadataError::AlreadyExists` with no side effects.
    pub async fn record_shared_copy(
        &self,
        owner: &str,
        content_hash: &str,
        filename: &str,
    ) -> MetadataResult<()> {
        self.record_ownership(owner, content_hash, filename).await?;
        self.store.increment_ref_count(content_hash).await?;
        self.bump_file_counter(owner).await?;

        tracing::info!(
            owner,
            content_hash,
            filename,
            "recorded shared copy of existing content"
        );
        Ok(())
    }

    /// Record freshly-stored content and its first ownership.
    ///
    /// Inserts a content record with `ref_count = 1` and the file type
    /// derived from the filename suffix, then the ownership record and the
    /// owner's file counter.
    pub async fn record_new_content(
        &self,
        owner: &str,
        content_hash: &str,
        filename: &str,
        storage_object_id: &str,
        public_url: &str,
        size_bytes: i64,
    ) -> MetadataResult<()> {
        let content = ContentRow {
            content_hash: content_hash.to_string(),
            storage_object_id: storage_object_id.to_string(),
            public_url: public_url.to_string(),
            size_bytes,
            file_type: file_type(filename).to_string(),
            ref_count: 1,
            created_at: OffsetDateTime::now_utc(),
        };
        self.store.create_content(&content).await?;

        self.record_ownership(owner, content_hash, filename).await?;
        self.bump_file_counter(owner).await?;

        tracing::info!(
            owner,
            content_hash,
            filename,
            storage_object_id,
            "recorded new content"
        );
        Ok(())
    }

    /// Insert the ownership record for an upload.
    async fn record_ownership(
        &self,
        owner: &str,
        content_hash: &str,
        filename: &str,
    ) -> MetadataResult<()> {
        let ownership = OwnershipRow {
            owner: owner.to_string(),
            content_hash: content_hash.to_string(),
            filename: filename.to_string(),
            created_at: OffsetDateTime::now_utc(),
            shared: false,
            view_count: 0,
        };
        self.store.create_ownership(&ownership).await
    }

    /// Read-modify-write of the owner's file counter: insert 1 on the
    /// owner's first ever upload, otherwise update to n + 1.
    async fn bump_file_counter(&self, owner: &str) -> MetadataResult<()> {
        match self.store.get_file_count(owner).await? {
            None => self.store.insert_file_count(owner, 1).await,
            Some(count) => self.store.update_file_count(owner, count + 1).await,
        }
    }
}

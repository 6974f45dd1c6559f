//! Database models mapping to the metadata schema.

use sqlx::FromRow;
use time::OffsetDateTime;

/// Content record, keyed by content hash.
///
/// Created on the first physical upload of a hash; `ref_count` grows by one
/// whenever another owner claims the same content. Records are never
/// deleted by this pipeline.
#[derive(Debug, Clone, FromRow)]
pub struct ContentRow {
    pub content_hash: String,
    /// Opaque locator returned by the distributed store's upload client.
    pub storage_object_id: String,
    pub public_url: String,
    pub size_bytes: i64,
    /// Filename suffix, or the "null" sentinel.
    pub file_type: String,
    pub ref_count: i64,
    pub created_at: OffsetDateTime,
}

/// Ownership record, keyed by (owner, content_hash, filename).
#[derive(Debug, Clone, FromRow)]
pub struct OwnershipRow {
    pub owner: String,
    pub content_hash: String,
    pub filename: String,
    pub created_at: OffsetDateTime,
    /// Whether the owner has shared this file. Defaults to false; mutated
    /// only by the sharing surface, which is outside this pipeline.
    pub shared: bool,
    /// Download counter. Defaults to zero; mutated only by the download
    /// surface, which is outside this pipeline.
    pub view_count: i64,
}

/// Per-owner file counter.
#[derive(Debug, Clone, FromRow)]
pub struct OwnerCountRow {
    pub owner: String,
    pub file_count: i64,
}

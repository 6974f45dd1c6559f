//! API error type for the request pipelines.
//!
//! Handlers translate these into the fixed reply-code vocabulary; internal
//! causes (SQL errors, subprocess output) are logged server-side and never
//! echoed to the client.

use depot_core::DecodeError;
use depot_metadata::MetadataError;
use depot_storage::StorageError;

/// Failure of an upload or dedup pipeline stage.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("storage gateway error: {0}")]
    Storage(#[from] StorageError),

    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),
}

/// Result type for pipeline stages.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

//! Core domain types and shared logic for the depot file-ingestion service.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Multipart upload decoding
//! - Content hashes and staged upload payloads
//! - The fixed reply-code vocabulary returned to clients
//! - Configuration types

pub mod config;
pub mod error;
pub mod multipart;
pub mod reply;
pub mod upload;

pub use error::{DecodeError, DecodeResult};
pub use multipart::decode_upload;
pub use reply::{Reply, ReplyCode};
pub use upload::{ContentHash, DedupCheckRequest, StagedUpload, file_type};

/// Sentinel file type recorded for filenames with no usable suffix.
pub const NULL_FILE_TYPE: &str = "null";

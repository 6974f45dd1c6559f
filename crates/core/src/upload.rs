//! Staged upload payloads and content hash handling.

use crate::error::{DecodeError, DecodeResult};
use serde::Deserialize;
use std::fmt;

/// A client-declared MD5 content hash: exactly 32 hex characters,
/// normalized to lowercase.
///
/// The hash identifies file content independent of name and owner. It is
/// computed client-side and never re-verified against the uploaded bytes,
/// matching the upstream protocol.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(String);

impl ContentHash {
    /// Parse and normalize a content hash.
    pub fn parse(s: &str) -> DecodeResult<Self> {
        let s = s.trim();
        if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(DecodeError::InvalidContentHash(s.to_string()));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Get the hash as a lowercase hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the hash, returning the owned hex string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.0[..8])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A decoded single-file upload, not yet persisted anywhere.
///
/// Lives for the duration of one request; the raw content buffer is handed
/// to the staging writer and the remaining fields to the metadata recorder.
#[derive(Debug, Clone)]
pub struct StagedUpload {
    /// Owner identity as declared in the multipart body.
    pub owner: String,
    /// Client-supplied filename, whitespace-trimmed.
    pub filename: String,
    /// Client-declared content hash (untrusted).
    pub content_hash: ContentHash,
    /// Client-declared content size in bytes.
    pub declared_size: u64,
    /// The raw file content extracted from the body.
    pub content: Vec<u8>,
}

/// Request body for the dedup-check endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DedupCheckRequest {
    pub user: String,
    pub token: String,
    pub md5: String,
    pub filename: String,
}

/// Derive the file type from a filename suffix.
///
/// Returns the substring after the last `.`; filenames with no dot or with
/// a trailing dot yield the `"null"` sentinel rather than an error.
pub fn file_type(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((_, suffix)) if !suffix.is_empty() => suffix,
        _ => crate::NULL_FILE_TYPE,
    }
}

//! Error types for the core domain.

use thiserror::Error;

/// Errors produced while decoding a raw multipart upload body.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("no multipart boundary found")]
    MissingBoundary,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("field {0} is not valid UTF-8")]
    InvalidEncoding(&'static str),

    #[error("invalid declared size: {0}")]
    InvalidSize(String),

    #[error("invalid content hash: {0}")]
    InvalidContentHash(String),

    #[error("unsafe filename: {0}")]
    UnsafeFilename(String),

    #[error("content region not terminated by closing boundary")]
    UnterminatedContent,
}

/// Result type alias for decode operations.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

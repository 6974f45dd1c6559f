//! Storage gateway error types.

use thiserror::Error;

/// Storage gateway operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{program} did not finish within {timeout_secs}s")]
    Timeout { program: String, timeout_secs: u64 },

    #[error("{program} produced more than {limit} bytes of output")]
    OutputTooLarge { program: String, limit: usize },

    #[error("{program} exited with {exit_code:?}: {stderr}")]
    CommandFailed {
        program: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("{program} produced no output")]
    EmptyOutput { program: String },

    #[error("unparseable client output: {0}")]
    UnparseableOutput(String),

    #[error("invalid staging filename: {0}")]
    InvalidStagingName(String),
}

/// Result type for storage gateway operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

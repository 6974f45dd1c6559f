//! Local staging writer.
//!
//! Decoded upload bytes are persisted to a transient local file because the
//! store's upload client operates only on file paths. A staged file lives
//! for one request: it is removed on drop regardless of how the request
//! ended, so a failed push never leaves stale staging files behind.

use crate::error::{StorageError, StorageResult};
use std::path::{Path, PathBuf};
use tokio::fs;

/// A transient local copy of uploaded bytes, named after the
/// client-supplied filename.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    removed: bool,
}

impl StagedFile {
    /// Write `content` to `<dir>/<filename>`, truncating any previous file.
    ///
    /// The filename must be a single path component; separators, parent
    /// references, and NUL bytes are refused (see DESIGN.md for the
    /// sanitization policy).
    pub async fn write(dir: &Path, filename: &str, content: &[u8]) -> StorageResult<Self> {
        validate_filename(filename)?;

        fs::create_dir_all(dir).await?;
        let path = dir.join(filename);
        fs::write(&path, content).await?;

        tracing::debug!(path = %path.display(), bytes = content.len(), "staged upload");
        Ok(Self {
            path,
            removed: false,
        })
    }

    /// Path of the staged file, for handing to the storage gateway.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the staged file now instead of waiting for drop.
    pub async fn remove(mut self) -> StorageResult<()> {
        self.removed = true;
        fs::remove_file(&self.path).await?;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.removed {
            if let Err(e) = std::fs::remove_file(&self.path) {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to remove staging file"
                );
            }
        }
    }
}

fn validate_filename(filename: &str) -> StorageResult<()> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains('\0')
        || filename == "."
        || filename == ".."
    {
        return Err(StorageError::InvalidStagingName(filename.to_string()));
    }
    Ok(())
}

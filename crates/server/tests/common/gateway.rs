//! Mock store gateway for integration tests.

use async_trait::async_trait;
use depot_storage::{StorageError, StorageResult, StoreGateway};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-process gateway recording pushes instead of spawning CLI clients.
///
/// Object ids are derived from the staged filename, and public URLs use a
/// fixed test host, so assertions can predict both.
#[derive(Default)]
pub struct MockGateway {
    pushes: Mutex<Vec<(PathBuf, Vec<u8>)>>,
    fail_with_empty_output: AtomicBool,
}

#[allow(dead_code)]
impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent push behave like an upload client that exits
    /// without printing an object id.
    pub fn fail_with_empty_output(&self) {
        self.fail_with_empty_output.store(true, Ordering::SeqCst);
    }

    /// Number of files pushed so far.
    pub fn push_count(&self) -> usize {
        self.pushes.lock().unwrap().len()
    }

    /// Paths and contents captured at push time.
    pub fn pushes(&self) -> Vec<(PathBuf, Vec<u8>)> {
        self.pushes.lock().unwrap().clone()
    }
}

#[async_trait]
impl StoreGateway for MockGateway {
    async fn push_file(&self, local_path: &Path) -> StorageResult<String> {
        if self.fail_with_empty_output.load(Ordering::SeqCst) {
            return Err(StorageError::EmptyOutput {
                program: "fdfs_upload_file".to_string(),
            });
        }

        // Capture the content at push time; the staging file is expected to
        // be gone by the time a test can look at it.
        let content = std::fs::read(local_path).map_err(StorageError::Io)?;
        self.pushes
            .lock()
            .unwrap()
            .push((local_path.to_path_buf(), content));

        let name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(format!("group1/M00/00/00/{name}"))
    }

    async fn resolve_public_url(&self, object_id: &str) -> StorageResult<String> {
        Ok(format!("http://files.example.com:8888/{object_id}"))
    }
}

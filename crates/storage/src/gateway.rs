//! Distributed object store gateway.
//!
//! Moves local staging files into the distributed store and resolves public
//! URLs for stored objects, using only the store's command-line clients:
//! one accepting `(client_conf, local_file)` and printing an object id, one
//! accepting `(client_conf, object_id)` and printing a status block that
//! contains a `source ip address: <host>` line.

use crate::error::{StorageError, StorageResult};
use crate::runner::{CommandRunner, ProcessRunner};
use async_trait::async_trait;
use depot_core::config::StorageConfig;
use std::path::Path;
use std::sync::Arc;

/// Marker line in the file-info client's output.
const SOURCE_HOST_MARKER: &str = "source ip address: ";

/// Physical location of a stored object, as reported by the store itself.
#[derive(Debug, Clone)]
pub struct ObjectLocation {
    /// Host of the storage node holding the object. For NATed deployments
    /// this is an internal address; see `public_host_override`.
    pub source_host: String,
}

/// Gateway to the distributed object store.
#[async_trait]
pub trait StoreGateway: Send + Sync {
    /// Push a local file into the store, returning its object id.
    async fn push_file(&self, local_path: &Path) -> StorageResult<String>;

    /// Resolve the dereferenceable public URL for a stored object.
    async fn resolve_public_url(&self, object_id: &str) -> StorageResult<String>;
}

/// Build a public URL from its parts.
pub fn synthesize_url(host: &str, port: u16, object_id: &str) -> String {
    format!("http://{host}:{port}/{object_id}")
}

/// Extract the source host from the file-info client's output.
///
/// Scans for the literal marker and takes the remainder of that line.
fn parse_source_host(output: &str) -> Option<&str> {
    let start = output.find(SOURCE_HOST_MARKER)? + SOURCE_HOST_MARKER.len();
    let rest = &output[start..];
    let host = match rest.find('\n') {
        Some(end) => &rest[..end],
        None => rest,
    }
    .trim();
    (!host.is_empty()).then_some(host)
}

/// Gateway implementation over the store's CLI programs.
pub struct DfsGateway {
    config: StorageConfig,
    runner: Arc<dyn CommandRunner>,
}

impl DfsGateway {
    /// Create a gateway with an explicit command runner.
    pub fn new(config: StorageConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    /// Create a gateway spawning real client processes per configuration.
    pub fn from_config(config: StorageConfig) -> Self {
        let runner = Arc::new(ProcessRunner::new(
            config.command_timeout(),
            config.max_output_bytes,
        ));
        Self::new(config, runner)
    }

    /// Query the store for an object's physical location.
    pub async fn locate_object(&self, object_id: &str) -> StorageResult<ObjectLocation> {
        let program = &self.config.file_info_bin;
        let conf = self.config.client_conf_path.to_string_lossy();

        let output = self.runner.run(program, &[conf.as_ref(), object_id]).await?;
        if !output.success() {
            tracing::error!(
                program,
                object_id,
                exit_code = ?output.exit_code,
                stderr = %output.stderr_text(),
                "file-info client failed"
            );
            return Err(StorageError::CommandFailed {
                program: program.clone(),
                exit_code: output.exit_code,
                stderr: output.stderr_text(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let source_host = parse_source_host(&text).ok_or_else(|| {
            tracing::error!(program, object_id, "no source host in file-info output");
            StorageError::UnparseableOutput(format!(
                "missing '{SOURCE_HOST_MARKER}' line for object {object_id}"
            ))
        })?;

        Ok(ObjectLocation {
            source_host: source_host.to_string(),
        })
    }
}

#[async_trait]
impl StoreGateway for DfsGateway {
    async fn push_file(&self, local_path: &Path) -> StorageResult<String> {
        let program = &self.config.upload_bin;
        let conf = self.config.client_conf_path.to_string_lossy();
        let path = local_path.to_string_lossy();

        let output = self.runner.run(program, &[conf.as_ref(), path.as_ref()]).await?;
        if !output.success() {
            tracing::error!(
                program,
                local_path = %path,
                exit_code = ?output.exit_code,
                stderr = %output.stderr_text(),
                "upload client failed"
            );
            return Err(StorageError::CommandFailed {
                program: program.clone(),
                exit_code: output.exit_code,
                stderr: output.stderr_text(),
            });
        }

        let object_id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if object_id.is_empty() {
            tracing::error!(program, local_path = %path, "upload client printed no object id");
            return Err(StorageError::EmptyOutput {
                program: program.clone(),
            });
        }

        tracing::debug!(object_id, local_path = %path, "pushed file to store");
        Ok(object_id)
    }

    async fn resolve_public_url(&self, object_id: &str) -> StorageResult<String> {
        let location = self.locate_object(object_id).await?;

        let host = match &self.config.public_host_override {
            Some(host) => {
                tracing::debug!(
                    object_id,
                    resolved_host = %location.source_host,
                    override_host = %host,
                    "substituting public host for store-internal address"
                );
                host.as_str()
            }
            None => location.source_host.as_str(),
        };

        Ok(synthesize_url(host, self.config.web_port, object_id))
    }
}

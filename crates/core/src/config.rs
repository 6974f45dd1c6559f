//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum accepted upload body size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Directory where decoded uploads are staged before the storage
    /// gateway pushes them. Staged files live for one request only.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_max_upload_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("./data/staging")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
            staging_dir: default_staging_dir(),
        }
    }
}

/// Storage gateway configuration: how to reach the distributed object
/// store's command-line clients and how to build public URLs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the store client's own configuration file, passed as the
    /// first argument to both CLI programs.
    #[serde(default = "default_client_conf_path")]
    pub client_conf_path: PathBuf,
    /// Upload client program name or path.
    #[serde(default = "default_upload_bin")]
    pub upload_bin: String,
    /// File-info client program name or path.
    #[serde(default = "default_file_info_bin")]
    pub file_info_bin: String,
    /// Port of the storage node's HTTP file server, used in public URLs.
    #[serde(default = "default_web_port")]
    pub web_port: u16,
    /// Externally-reachable host substituted for the store-internal host
    /// resolved by the file-info client. Set this when storage nodes sit
    /// behind NAT and report private addresses.
    #[serde(default)]
    pub public_host_override: Option<String>,
    /// Timeout for a single CLI invocation in seconds.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    /// Cap on a CLI child's captured stdout in bytes. Output beyond this
    /// fails the request instead of being silently truncated.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

fn default_client_conf_path() -> PathBuf {
    PathBuf::from("/etc/fdfs/client.conf")
}

fn default_upload_bin() -> String {
    "fdfs_upload_file".to_string()
}

fn default_file_info_bin() -> String {
    "fdfs_file_info".to_string()
}

fn default_web_port() -> u16 {
    8888
}

fn default_command_timeout_secs() -> u64 {
    30
}

fn default_max_output_bytes() -> usize {
    64 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            client_conf_path: default_client_conf_path(),
            upload_bin: default_upload_bin(),
            file_info_bin: default_file_info_bin(),
            web_port: default_web_port(),
            public_host_override: None,
            command_timeout_secs: default_command_timeout_secs(),
            max_output_bytes: default_max_output_bytes(),
        }
    }
}

impl StorageConfig {
    /// Get the CLI timeout as a Duration.
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Validate storage configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.command_timeout_secs == 0 {
            return Err("storage.command_timeout_secs cannot be 0".to_string());
        }
        if self.max_output_bytes == 0 {
            return Err("storage.max_output_bytes cannot be 0".to_string());
        }
        if self.upload_bin.is_empty() || self.file_info_bin.is_empty() {
            return Err("storage client program names cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Metadata store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// SQLite database (recommended for testing and small deployments).
    Sqlite {
        /// Database file path.
        path: PathBuf,
    },
    /// PostgreSQL database.
    Postgres {
        /// Connection URL.
        url: String,
        /// Maximum connections in the pool.
        #[serde(default = "default_max_connections")]
        max_connections: u32,
    },
}

fn default_max_connections() -> u32 {
    10
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/metadata.db"),
        }
    }
}

/// Session token store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SessionConfig {
    /// Redis-backed session store.
    Redis {
        /// Connection URL (e.g., "redis://127.0.0.1:6379").
        url: String,
    },
    /// In-process session store. Tokens do not survive restarts; intended
    /// for tests and local development only.
    Memory,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::Redis {
            url: "redis://127.0.0.1:6379".to_string(),
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage gateway configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Metadata store configuration.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Session token store configuration.
    #[serde(default)]
    pub session: SessionConfig,
}

impl AppConfig {
    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Uses SQLite metadata and the in-process
    /// session store.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            metadata: MetadataConfig::default(),
            session: SessionConfig::Memory,
        }
    }
}

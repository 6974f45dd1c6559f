//! Storage gateway and local staging for depot.
//!
//! The distributed object store has no linked API; the only integration
//! surface is a pair of command-line clients. This crate wraps them behind
//! the `StoreGateway` trait, provides the subprocess `CommandRunner`
//! capability it is built on, and owns the transient local staging files
//! the upload client reads from.

pub mod error;
pub mod gateway;
pub mod runner;
pub mod staging;

pub use error::{StorageError, StorageResult};
pub use gateway::{DfsGateway, ObjectLocation, StoreGateway, synthesize_url};
pub use runner::{CommandOutput, CommandRunner, ProcessRunner};
pub use staging::StagedFile;

use depot_core::config::StorageConfig;
use std::sync::Arc;

/// Create a store gateway from configuration.
pub fn from_config(config: &StorageConfig) -> Arc<dyn StoreGateway> {
    Arc::new(DfsGateway::from_config(config.clone()))
}

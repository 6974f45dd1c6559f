//! Metadata store abstraction and implementations for depot.
//!
//! This crate provides the control-plane data model:
//! - Content records with reference counts
//! - Per-owner ownership records
//! - Per-owner file counters
//! - The dedup engine driving the instant-upload decision

pub mod dedup;
pub mod error;
pub mod models;
pub mod postgres;
pub mod repos;
pub mod store;

pub use dedup::{DedupEngine, DedupOutcome};
pub use error::{MetadataError, MetadataResult};
pub use postgres::PostgresStore;
pub use repos::{ContentRepo, CounterRepo, OwnershipRepo};
pub use store::{MetadataStore, SqliteStore};

use depot_core::config::MetadataConfig;
use std::sync::Arc;

/// Create a metadata store from configuration.
pub async fn from_config(config: &MetadataConfig) -> MetadataResult<Arc<dyn MetadataStore>> {
    match config {
        MetadataConfig::Sqlite { path } => {
            let store = SqliteStore::new(path).await?;
            Ok(Arc::new(store) as Arc<dyn MetadataStore>)
        }
        MetadataConfig::Postgres {
            url,
            max_connections,
        } => {
            tracing::info!("Connecting to PostgreSQL metadata store");
            let store = PostgresStore::from_url(url, *max_connections).await?;
            Ok(Arc::new(store) as Arc<dyn MetadataStore>)
        }
    }
}

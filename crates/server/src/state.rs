//! Application state shared across handlers.

use crate::session::SessionStore;
use depot_core::config::AppConfig;
use depot_metadata::{DedupEngine, MetadataStore};
use depot_storage::StoreGateway;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Metadata store.
    pub metadata: Arc<dyn MetadataStore>,
    /// Dedup engine over the metadata store.
    pub dedup: DedupEngine,
    /// Distributed object store gateway.
    pub gateway: Arc<dyn StoreGateway>,
    /// Session token store.
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Panics
    ///
    /// Panics if the storage configuration is invalid; startup is the only
    /// caller and should fail fast.
    pub fn new(
        config: AppConfig,
        metadata: Arc<dyn MetadataStore>,
        gateway: Arc<dyn StoreGateway>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        if let Err(error) = config.storage.validate() {
            panic!("Invalid storage configuration: {error}");
        }

        let dedup = DedupEngine::new(metadata.clone());

        Self {
            config: Arc::new(config),
            metadata,
            dedup,
            gateway,
            sessions,
        }
    }
}

//! Session token validation against the key-value store.
//!
//! The ingestion pipeline consumes exactly one capability from the session
//! subsystem: "does this (owner, token) pair match the issued token?".
//! Token issuance and expiry live with the login service, which writes the
//! current token under the owner's key.

use async_trait::async_trait;
use depot_core::config::SessionConfig;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

/// Capability to validate a session token for an owner.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Whether `token` matches the token currently issued to `owner`.
    ///
    /// Store lookup failures are logged and reported as invalid (fail
    /// closed) rather than surfaced to the pipeline.
    async fn validate_token(&self, owner: &str, token: &str) -> bool;
}

/// Redis-backed session store.
///
/// Holds one multiplexed connection opened at process start and shared
/// across requests.
pub struct RedisSessionStore {
    conn: redis::aio::MultiplexedConnection,
}

impl RedisSessionStore {
    /// Connect to the session store.
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn validate_token(&self, owner: &str, token: &str) -> bool {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(owner).await {
            Ok(Some(stored)) => stored == token,
            Ok(None) => false,
            Err(e) => {
                tracing::error!(owner, error = %e, "session store lookup failed");
                false
            }
        }
    }
}

/// In-process session store for tests and local development.
#[derive(Default)]
pub struct MemorySessionStore {
    tokens: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token for an owner, replacing any previous one.
    pub fn insert(&self, owner: &str, token: &str) {
        self.tokens
            .lock()
            .unwrap()
            .insert(owner.to_string(), token.to_string());
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn validate_token(&self, owner: &str, token: &str) -> bool {
        self.tokens
            .lock()
            .unwrap()
            .get(owner)
            .is_some_and(|stored| stored == token)
    }
}

/// Create a session store from configuration.
pub async fn from_config(
    config: &SessionConfig,
) -> Result<Arc<dyn SessionStore>, redis::RedisError> {
    match config {
        SessionConfig::Redis { url } => {
            tracing::info!("Connecting to redis session store");
            let store = RedisSessionStore::connect(url).await?;
            Ok(Arc::new(store) as Arc<dyn SessionStore>)
        }
        SessionConfig::Memory => {
            tracing::warn!("Using in-process session store; tokens will not survive restarts");
            Ok(Arc::new(MemorySessionStore::new()) as Arc<dyn SessionStore>)
        }
    }
}

//! Server test utilities.

use super::gateway::MockGateway;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use depot_core::config::{AppConfig, MetadataConfig};
use depot_metadata::{MetadataStore, SqliteStore};
use depot_server::session::{MemorySessionStore, SessionStore};
use depot_server::{AppState, create_router};
use depot_storage::StoreGateway;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    pub gateway: Arc<MockGateway>,
    pub sessions: Arc<MemorySessionStore>,
    pub staging_dir: PathBuf,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server over tempdir SQLite, a mock gateway, and an
    /// in-memory session store.
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let staging_dir = temp_dir.path().join("staging");

        let db_path = temp_dir.path().join("metadata.db");
        let metadata: Arc<dyn MetadataStore> = Arc::new(
            SqliteStore::new(&db_path)
                .await
                .expect("Failed to create metadata store"),
        );

        let gateway = Arc::new(MockGateway::new());
        let sessions = Arc::new(MemorySessionStore::new());

        let mut config = AppConfig::for_testing();
        config.server.staging_dir = staging_dir.clone();
        config.metadata = MetadataConfig::Sqlite { path: db_path };

        let state = AppState::new(
            config,
            metadata,
            gateway.clone() as Arc<dyn StoreGateway>,
            sessions.clone() as Arc<dyn SessionStore>,
        );
        let router = create_router(state.clone());

        Self {
            router,
            state,
            gateway,
            sessions,
            staging_dir,
            _temp_dir: temp_dir,
        }
    }

    /// Get access to the underlying metadata store.
    pub fn metadata(&self) -> Arc<dyn MetadataStore> {
        self.state.metadata.clone()
    }

    /// Whether the staging directory holds no files.
    pub fn staging_dir_is_empty(&self) -> bool {
        match std::fs::read_dir(&self.staging_dir) {
            Ok(entries) => entries.count() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => panic!("failed to read staging dir: {e}"),
        }
    }
}

/// POST a raw multipart body to the upload endpoint.
#[allow(dead_code)]
pub async fn post_upload(router: &axum::Router, body: Vec<u8>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/upload")
        .body(Body::from(body))
        .unwrap();
    send(router, request).await
}

/// POST a JSON value to the dedup endpoint.
#[allow(dead_code)]
pub async fn post_dedup(router: &axum::Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/dedup")
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    send(router, request).await
}

async fn send(router: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

/// Extract the reply code from a response body.
#[allow(dead_code)]
pub fn reply_code(body: &Value) -> &str {
    body.get("code")
        .and_then(|v| v.as_str())
        .unwrap_or_else(|| panic!("response has no code field: {body}"))
}

//! Dedup-check (instant upload) handler.
//!
//! The client declares a content hash before transferring any bytes. If the
//! server already stores that content, ownership is recorded without a
//! physical upload; if this owner already has the exact file, nothing is
//! written at all.

use crate::session::SessionStore;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use depot_core::{ContentHash, DedupCheckRequest, Reply, ReplyCode};
use depot_metadata::{DedupOutcome, MetadataError};
use uuid::Uuid;

/// Maximum request body size for dedup-check requests (16 KiB).
const MAX_DEDUP_BODY_SIZE: usize = 16 * 1024;

/// POST /v1/dedup - Check for and perform an instant upload.
///
/// Reply codes: `005` already owned, `006` instant upload recorded,
/// `007` full upload required (or bookkeeping failed), `111` token invalid.
#[tracing::instrument(skip(state, req), fields(request_id = %Uuid::new_v4()))]
pub async fn dedup_check(
    State(state): State<AppState>,
    req: Request,
) -> (StatusCode, Json<Reply>) {
    let body: DedupCheckRequest = {
        let bytes = match axum::body::to_bytes(req.into_body(), MAX_DEDUP_BODY_SIZE).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read dedup body");
                return bad_request();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "invalid dedup request JSON");
                return bad_request();
            }
        }
    };

    if !state.sessions.validate_token(&body.user, &body.token).await {
        tracing::warn!(owner = %body.user, "token validation failed");
        return (
            StatusCode::UNAUTHORIZED,
            Json(Reply::from(ReplyCode::TokenInvalid)),
        );
    }

    let content_hash = match ContentHash::parse(&body.md5) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::warn!(owner = %body.user, error = %e, "invalid content hash in dedup request");
            return bad_request();
        }
    };

    let code = run_dedup(&state, &body.user, &content_hash, &body.filename).await;
    (StatusCode::OK, Json(Reply::from(code)))
}

fn bad_request() -> (StatusCode, Json<Reply>) {
    (
        StatusCode::BAD_REQUEST,
        Json(Reply::from(ReplyCode::UploadRequired)),
    )
}

/// Decide and, when possible, perform the instant upload.
async fn run_dedup(
    state: &AppState,
    owner: &str,
    content_hash: &ContentHash,
    filename: &str,
) -> ReplyCode {
    let outcome = match state
        .dedup
        .check_instant_upload(owner, content_hash.as_str(), filename)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(owner, %content_hash, error = %e, "dedup check failed");
            return ReplyCode::UploadRequired;
        }
    };

    match outcome {
        DedupOutcome::NotFound => {
            tracing::info!(owner, %content_hash, "content unknown, full upload required");
            ReplyCode::UploadRequired
        }
        DedupOutcome::AlreadyOwned => {
            tracing::info!(owner, %content_hash, filename, "file already owned");
            ReplyCode::AlreadyOwned
        }
        DedupOutcome::OwnedByOthers { ref_count } => {
            match state
                .dedup
                .record_shared_copy(owner, content_hash.as_str(), filename)
                .await
            {
                Ok(()) => {
                    tracing::info!(
                        owner,
                        %content_hash,
                        previous_ref_count = ref_count,
                        "instant upload recorded"
                    );
                    ReplyCode::InstantUpload
                }
                // Lost a race with an identical claim; same answer as if the
                // check had seen it.
                Err(MetadataError::AlreadyExists(_)) => ReplyCode::AlreadyOwned,
                Err(e) => {
                    tracing::error!(owner, %content_hash, error = %e, "instant upload bookkeeping failed");
                    ReplyCode::UploadRequired
                }
            }
        }
    }
}

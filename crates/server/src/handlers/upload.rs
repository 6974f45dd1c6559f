//! Full upload handler.
//!
//! Pipeline: decode the multipart body, stage the bytes to a local file,
//! push the file into the distributed store, resolve the public URL, and
//! record the metadata. Every stage fails fast; nothing is retried. The
//! staging file is removed on every path, success or failure.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use depot_core::{Reply, ReplyCode, StagedUpload, decode_upload};
use depot_storage::{StagedFile, StoreGateway};
use uuid::Uuid;

/// POST /v1/upload - Receive and store one file.
///
/// Responds with `{"code":"008"}` when the whole pipeline succeeded and
/// `{"code":"009"}` otherwise; causes are logged, never echoed.
#[tracing::instrument(skip(state, req), fields(request_id = %Uuid::new_v4()))]
pub async fn upload_file(
    State(state): State<AppState>,
    req: Request,
) -> (StatusCode, Json<Reply>) {
    let bytes =
        match axum::body::to_bytes(req.into_body(), state.config.server.max_upload_bytes).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read upload body");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(Reply::from(ReplyCode::UploadFailed)),
                );
            }
        };

    match run_upload(&state, &bytes).await {
        Ok(()) => (StatusCode::OK, Json(Reply::from(ReplyCode::UploadOk))),
        Err(e) => {
            tracing::error!(error = %e, "upload pipeline failed");
            (StatusCode::OK, Json(Reply::from(ReplyCode::UploadFailed)))
        }
    }
}

/// Run the decode-stage-push-record pipeline for one request body.
async fn run_upload(state: &AppState, body: &[u8]) -> ApiResult<()> {
    let upload = decode_upload(body)?;
    tracing::info!(
        owner = %upload.owner,
        filename = %upload.filename,
        content_hash = %upload.content_hash,
        declared_size = upload.declared_size,
        "decoded upload"
    );

    let staged = StagedFile::write(
        &state.config.server.staging_dir,
        &upload.filename,
        &upload.content,
    )
    .await?;

    // The staged file must not outlive the request whatever happens next.
    let result = store_and_record(state, &upload, &staged).await;
    if let Err(e) = staged.remove().await {
        tracing::warn!(error = %e, "failed to remove staging file");
    }
    result
}

/// Push the staged file into the store and record the metadata.
async fn store_and_record(
    state: &AppState,
    upload: &StagedUpload,
    staged: &StagedFile,
) -> ApiResult<()> {
    let object_id = state.gateway.push_file(staged.path()).await?;
    let public_url = state.gateway.resolve_public_url(&object_id).await?;

    state
        .dedup
        .record_new_content(
            &upload.owner,
            upload.content_hash.as_str(),
            &upload.filename,
            &object_id,
            &public_url,
            upload.declared_size as i64,
        )
        .await?;

    tracing::info!(
        owner = %upload.owner,
        content_hash = %upload.content_hash,
        object_id,
        public_url,
        "upload stored and recorded"
    );
    Ok(())
}

//! HTTP surface for remote reconciliation.
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use viewer_logging::viewer_error;

use crate::{RemoteSyncService, SyncError};

pub const UPDATE_TIMES_PATH: &str = "/update-times";

/// Largest accepted `/update-times` request body. Room for 5 MiB of content
/// plus its JSON escaping.
pub const MAX_UPDATE_BODY_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateTimesRequest {
    #[serde(rename = "htmlContent", default)]
    pub html_content: Option<String>,
}

impl SyncError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SyncError::MissingContent | SyncError::UnreadableBody(_) => StatusCode::BAD_REQUEST,
            SyncError::NoRecords => StatusCode::NOT_FOUND,
            SyncError::FetchFailed(_) | SyncError::UpdateFailed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for SyncError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            viewer_error!("update-times failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

async fn update_times(
    State(service): State<Arc<RemoteSyncService>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<serde_json::Value>, SyncError> {
    let body = body.map_err(|rejection| SyncError::UnreadableBody(rejection.body_text()))?;
    // A body that is not JSON, or lacks the field, is treated as missing content.
    let request = serde_json::from_slice::<UpdateTimesRequest>(&body).ok();
    let content = request.and_then(|request| request.html_content);
    service.reconcile(content.as_deref()).await?;
    Ok(Json(json!({ "success": true })))
}

/// Build the HTTP router exposing `POST /update-times`.
pub fn build_router(service: Arc<RemoteSyncService>) -> Router {
    Router::new()
        .route(UPDATE_TIMES_PATH, post(update_times))
        .layer(DefaultBodyLimit::max(MAX_UPDATE_BODY_BYTES))
        .with_state(service)
}

//! Admin surface: host diagnostics, storage inspection, shutdown
//!
//! All routes here sit behind `AdminLayer`, a Tower layer that checks the
//! `X-Admin-Id` header against the configured allowlist. An empty
//! allowlist rejects every request.

use crate::api::handlers::{error_response, ErrorResponse, StatusResponse};
use crate::api::server::AppContext;
use crate::stats::HostStats;
use crate::storage;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{info, warn};

/// Header carrying the caller's admin ID
pub const ADMIN_ID_HEADER: &str = "x-admin-id";

// ============================================================================
// Tower Layer Implementation
// ============================================================================

/// Tower layer gating requests on the admin-ID allowlist
#[derive(Clone)]
pub struct AdminLayer {
    pub admin_ids: Arc<Vec<u64>>,
}

impl<S> Layer<S> for AdminLayer {
    type Service = AdminMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AdminMiddleware {
            inner,
            admin_ids: Arc::clone(&self.admin_ids),
        }
    }
}

/// Tower service that performs the admin-ID check
#[derive(Clone)]
pub struct AdminMiddleware<S> {
    inner: S,
    admin_ids: Arc<Vec<u64>>,
}

impl<S> Service<Request> for AdminMiddleware<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let admin_ids = Arc::clone(&self.admin_ids);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let id = match request
                .headers()
                .get(ADMIN_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
            {
                Some(id) => id,
                None => {
                    return Ok(admin_error(
                        StatusCode::BAD_REQUEST,
                        "missing_admin_id",
                        "Header 'X-Admin-Id' with a numeric ID is required",
                    ));
                }
            };

            if !admin_ids.contains(&id) {
                warn!("Admin request rejected for ID {}", id);
                return Ok(admin_error(
                    StatusCode::FORBIDDEN,
                    "forbidden",
                    "You are not an admin of this bot",
                ));
            }

            inner.call(request).await
        })
    }
}

fn admin_error(status: StatusCode, error: &str, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": error, "message": message })),
    )
        .into_response()
}

// ============================================================================
// Admin Handlers
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    files: Vec<String>,
    count: usize,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    removed: usize,
}

/// GET /admin/stats - Host diagnostics snapshot
pub async fn host_stats(State(ctx): State<AppContext>) -> Json<HostStats> {
    let mut collector = ctx.stats.lock().await;
    Json(collector.collect())
}

/// GET /admin/files - List audio files in the storage folder
pub async fn list_files(
    State(ctx): State<AppContext>,
) -> Result<Json<FileListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let files = storage::list_audio_files(&ctx.config.storage_dir)
        .map_err(|e| error_response(&e))?;
    let names: Vec<String> = files
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .collect();
    let count = names.len();
    Ok(Json(FileListResponse {
        files: names,
        count,
    }))
}

/// DELETE /admin/files - Purge audio files from the storage folder
pub async fn purge_files(
    State(ctx): State<AppContext>,
) -> Result<Json<PurgeResponse>, (StatusCode, Json<ErrorResponse>)> {
    let removed = storage::purge_audio_files(&ctx.config.storage_dir)
        .map_err(|e| error_response(&e))?;
    Ok(Json(PurgeResponse { removed }))
}

/// POST /admin/shutdown - Gracefully stop the daemon
pub async fn shutdown(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    info!("Shutdown requested by admin");
    // Receiver dropped means we are already shutting down
    let _ = ctx.shutdown.send(()).await;
    Json(StatusResponse::new("shutting down"))
}

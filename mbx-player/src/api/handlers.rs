//! HTTP request handlers
//!
//! Implements the REST endpoints for queue management and playback
//! control. Every state-changing handler emits exactly one status event
//! on success.

use crate::api::server::AppContext;
use crate::error::Error;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use mbx_common::events::MbxEvent;
use mbx_common::Track;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Tracks shown per page of the queue listing
const PAGE_SIZE: usize = 10;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
    message: String,
}

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    /// Search text, watch URL, or playlist URL
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct AddResponse {
    added: usize,
    queue_length: usize,
}

#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    removed: Track,
    queue_length: usize,
}

#[derive(Debug, Deserialize)]
pub struct QueuePageQuery {
    /// 1-based page number
    pub page: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct QueueEntry {
    index: usize,
    title: String,
    author: String,
    source_url: String,
}

#[derive(Debug, Serialize)]
pub struct QueuePageResponse {
    page: usize,
    pages: usize,
    total: usize,
    cursor: i64,
    looping: bool,
    tracks: Vec<QueueEntry>,
}

#[derive(Debug, Serialize)]
pub struct LoopResponse {
    looping: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct SkipRequest {
    /// Target queue index; omitted means the next slot
    pub index: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct NowPlayingResponse {
    track: Track,
    position: usize,
    total: usize,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

impl StatusResponse {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

/// Map a player error onto an HTTP status and JSON body
pub fn error_response(e: &Error) -> HandlerError {
    let status = match e {
        Error::EmptyQueue
        | Error::IndexOutOfRange { .. }
        | Error::NotConnected
        | Error::NotPlaying
        | Error::Resolution(_) => StatusCode::BAD_REQUEST,
        Error::AlreadyBusy => StatusCode::CONFLICT,
        Error::Network(_) => StatusCode::BAD_GATEWAY,
        Error::Playback(_) | Error::Http(_) | Error::Config(_) | Error::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: e.kind().to_string(),
            message: e.to_string(),
        }),
    )
}

// ============================================================================
// Health / Keep-Alive
// ============================================================================

/// GET / - Keep-alive page for uptime monitors
pub async fn keep_alive() -> Html<&'static str> {
    Html("<html><body>MBX player is alive.</body></html>")
}

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "player".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Queue Endpoints
// ============================================================================

/// POST /queue/add - Resolve a query and append the results
pub async fn add_tracks(
    State(ctx): State<AppContext>,
    Json(req): Json<AddRequest>,
) -> Result<Json<AddResponse>, HandlerError> {
    let tracks = ctx.resolver.resolve(&req.query).await.map_err(|e| {
        warn!("Failed to resolve {:?}: {}", req.query, e);
        error_response(&e)
    })?;
    let added = tracks.len();

    let queue_length = {
        let mut queue = ctx.queue.write().await;
        queue.append(tracks);
        queue.len()
    };

    info!("Added {} track(s), queue now holds {}", added, queue_length);
    ctx.events.emit_lossy(MbxEvent::TrackAdded {
        count: added,
        timestamp: chrono::Utc::now(),
    });

    Ok(Json(AddResponse {
        added,
        queue_length,
    }))
}

/// DELETE /queue/:index - Remove a single track by index
pub async fn remove_track(
    State(ctx): State<AppContext>,
    Path(index): Path<usize>,
) -> Result<Json<RemoveResponse>, HandlerError> {
    let (removed, queue_length) = {
        let mut queue = ctx.queue.write().await;
        let removed = queue.remove_at(index).map_err(|e| error_response(&e))?;
        (removed, queue.len())
    };

    info!("Removed track {} from index {}", removed, index);
    ctx.events.emit_lossy(MbxEvent::TrackRemoved {
        index,
        track: removed.clone(),
        timestamp: chrono::Utc::now(),
    });

    Ok(Json(RemoveResponse {
        removed,
        queue_length,
    }))
}

/// GET /queue?page=N - Paginated queue listing
pub async fn get_queue(
    State(ctx): State<AppContext>,
    Query(params): Query<QueuePageQuery>,
) -> Result<Json<QueuePageResponse>, HandlerError> {
    let queue = ctx.queue.read().await;
    let total = queue.len();
    let pages = total.div_ceil(PAGE_SIZE).max(1);
    let page = params.page.unwrap_or(1);

    if page == 0 || page > pages {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "index_out_of_range".to_string(),
                message: format!("Invalid page {}: it must range from 1 to {}", page, pages),
            }),
        ));
    }

    let start = (page - 1) * PAGE_SIZE;
    let tracks = queue
        .tracks()
        .iter()
        .enumerate()
        .skip(start)
        .take(PAGE_SIZE)
        .map(|(index, track)| QueueEntry {
            index,
            title: track.title.clone(),
            author: track.author.clone(),
            source_url: track.source_url.clone(),
        })
        .collect();

    Ok(Json(QueuePageResponse {
        page,
        pages,
        total,
        cursor: queue.cursor(),
        looping: queue.is_looping(),
        tracks,
    }))
}

/// POST /queue/shuffle - Randomly permute the queue
pub async fn shuffle_queue(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    ctx.queue.write().await.shuffle();
    ctx.events.emit_lossy(MbxEvent::QueueShuffled {
        timestamp: chrono::Utc::now(),
    });
    Json(StatusResponse {
        status: "shuffled".to_string(),
    })
}

/// POST /queue/clear - Discard all queued tracks
pub async fn clear_queue(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    ctx.queue.write().await.clear();
    info!("Queue cleared");
    ctx.events.emit_lossy(MbxEvent::QueueCleared {
        timestamp: chrono::Utc::now(),
    });
    Json(StatusResponse {
        status: "cleared".to_string(),
    })
}

/// POST /queue/loop - Flip the loop flag
pub async fn toggle_loop(State(ctx): State<AppContext>) -> Json<LoopResponse> {
    let looping = ctx.queue.write().await.toggle_loop();
    info!("Loop {}", if looping { "enabled" } else { "disabled" });
    let timestamp = chrono::Utc::now();
    ctx.events.emit_lossy(if looping {
        MbxEvent::LoopEnabled { timestamp }
    } else {
        MbxEvent::LoopDisabled { timestamp }
    });
    Json(LoopResponse { looping })
}

// ============================================================================
// Playback Endpoints
// ============================================================================

/// GET /playback/now - The currently playing track
pub async fn now_playing(
    State(ctx): State<AppContext>,
) -> Result<Json<NowPlayingResponse>, HandlerError> {
    let (track, position, total) = ctx
        .controller
        .now_playing()
        .await
        .map_err(|e| error_response(&e))?;
    Ok(Json(NowPlayingResponse {
        track,
        position,
        total,
    }))
}

/// POST /playback/play - Start a playback session
pub async fn play(State(ctx): State<AppContext>) -> Result<Json<StatusResponse>, HandlerError> {
    ctx.controller
        .request_play()
        .await
        .map_err(|e| error_response(&e))?;
    Ok(Json(StatusResponse {
        status: "playing".to_string(),
    }))
}

/// POST /playback/skip - Skip the current track, optionally to an index
///
/// The body is optional; an empty body skips to the next slot.
pub async fn skip(
    State(ctx): State<AppContext>,
    body: Option<Json<SkipRequest>>,
) -> Result<Json<StatusResponse>, HandlerError> {
    let index = body.and_then(|Json(req)| req.index);
    ctx.controller
        .request_skip(index)
        .await
        .map_err(|e| error_response(&e))?;
    Ok(Json(StatusResponse {
        status: "skipped".to_string(),
    }))
}

/// POST /playback/disconnect - Tear down the voice connection and queue
pub async fn disconnect(
    State(ctx): State<AppContext>,
) -> Result<Json<StatusResponse>, HandlerError> {
    ctx.controller
        .request_disconnect()
        .await
        .map_err(|e| error_response(&e))?;
    Ok(Json(StatusResponse {
        status: "disconnected".to_string(),
    }))
}

//! HTTP server setup and routing
//!
//! Sets up the Axum HTTP server with queue and playback control routes,
//! the SSE stream, and the admin surface behind the admin-ID layer.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::playback::PlaybackController;
use crate::queue::QueueStore;
use crate::resolver::MediaResolver;
use crate::stats::StatsCollector;
use axum::{
    routing::{delete, get, post},
    Router,
};
use mbx_common::events::EventBus;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
///
/// **Note:** AppContext implements Clone, which gives us `FromRef<AppContext>`
/// for free via Axum's blanket implementation.
#[derive(Clone)]
pub struct AppContext {
    pub controller: Arc<PlaybackController>,
    pub queue: Arc<RwLock<QueueStore>>,
    pub resolver: Arc<dyn MediaResolver>,
    pub events: EventBus,
    pub config: Arc<Config>,
    pub stats: Arc<Mutex<StatsCollector>>,
    /// Signals the process to shut down (admin endpoint)
    pub shutdown: mpsc::Sender<()>,
}

/// Build the router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    // Admin surface sits behind the admin-ID layer; everything else is open
    let admin_routes = Router::new()
        .route("/stats", get(super::admin::host_stats))
        .route("/files", get(super::admin::list_files))
        .route("/files", delete(super::admin::purge_files))
        .route("/shutdown", post(super::admin::shutdown))
        .route_layer(super::admin::AdminLayer {
            admin_ids: Arc::new(ctx.config.admin_ids.clone()),
        });

    Router::new()
        // Keep-alive page for uptime monitors
        .route("/", get(super::handlers::keep_alive))
        // Health endpoint
        .route("/health", get(super::handlers::health))
        // Queue management
        .route("/queue", get(super::handlers::get_queue))
        .route("/queue/add", post(super::handlers::add_tracks))
        .route("/queue/:index", delete(super::handlers::remove_track))
        .route("/queue/shuffle", post(super::handlers::shuffle_queue))
        .route("/queue/clear", post(super::handlers::clear_queue))
        .route("/queue/loop", post(super::handlers::toggle_loop))
        // Playback control
        .route("/playback/now", get(super::handlers::now_playing))
        .route("/playback/play", post(super::handlers::play))
        .route("/playback/skip", post(super::handlers::skip))
        .route("/playback/disconnect", post(super::handlers::disconnect))
        // SSE event stream
        .route("/events", get(super::sse::event_stream))
        .nest("/admin", admin_routes)
        // Attach application context
        .with_state(ctx)
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP API server until `shutdown_rx` fires or the process is
/// interrupted
pub async fn run(ctx: AppContext, mut shutdown_rx: mpsc::Receiver<()>) -> Result<()> {
    let port = ctx.config.port;
    let app = create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = shutdown_rx.recv() => info!("Shutdown requested via admin endpoint"),
                _ = tokio::signal::ctrl_c() => info!("Interrupt received, shutting down"),
            }
        })
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}

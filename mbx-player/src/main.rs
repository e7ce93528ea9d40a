//! MBX Player daemon entry point
//!
//! Wires the queue, resolver, voice sink, and playback controller
//! together and serves the HTTP control interface.

use clap::Parser;
use mbx_common::events::EventBus;
use mbx_player::api::{self, AppContext};
use mbx_player::config::Config;
use mbx_player::playback::PlaybackController;
use mbx_player::queue::QueueStore;
use mbx_player::resolver::{MediaResolver, YtDlpResolver};
use mbx_player::sink::PlayerProcessSink;
use mbx_player::stats::StatsCollector;
use mbx_player::storage;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "mbx-player", about = "MBX music box playback daemon", version)]
struct Args {
    /// HTTP listen port
    #[arg(short, long, env = "MBX_PORT")]
    port: Option<u16>,

    /// Folder for transient downloaded audio
    #[arg(short, long)]
    storage_dir: Option<String>,

    /// ID allowed through the admin endpoints (repeatable)
    #[arg(long = "admin-id")]
    admin_ids: Vec<u64>,

    /// Local player invocation, e.g. "mpv --no-video"
    #[arg(long, env = "MBX_PLAYER_COMMAND")]
    player_command: Option<String>,

    /// Leave the cursor untouched on clear and remove
    #[arg(long)]
    permissive_queue: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mbx_player=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::resolve(
        args.port,
        args.storage_dir.as_deref(),
        &args.admin_ids,
        args.player_command.as_deref(),
        args.permissive_queue,
    )?;

    info!("MBX player starting");
    info!("Storage folder: {}", config.storage_dir.display());
    storage::ensure_storage_dir(&config.storage_dir)?;

    let events = EventBus::new(256);
    let queue = Arc::new(RwLock::new(QueueStore::new(config.queue_policy)));
    let resolver: Arc<dyn MediaResolver> = Arc::new(YtDlpResolver::new());
    let sink = Arc::new(PlayerProcessSink::new(config.player_command.clone())?);

    let controller = Arc::new(PlaybackController::new(
        Arc::clone(&queue),
        Arc::clone(&resolver),
        sink,
        events.clone(),
        config.storage_dir.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let ctx = AppContext {
        controller,
        queue,
        resolver,
        events,
        config: Arc::new(config),
        stats: Arc::new(Mutex::new(StatsCollector::new())),
        shutdown: shutdown_tx,
    };

    api::run(ctx, shutdown_rx).await?;

    info!("MBX player stopped");
    Ok(())
}

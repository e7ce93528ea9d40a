//! Playback controller
//!
//! Drives the download-play-advance session over the shared queue. At
//! most one session runs at a time: `request_play` is guarded by a
//! single-flight busy gate, and the session itself is an explicit loop
//! (never recursion) that steps the cursor until the queue is exhausted
//! or wrapped by the loop flag.
//!
//! Skip and disconnect never touch the loop directly; they act through
//! the queue cursor and the voice connection, and the in-flight session
//! observes the change at its next step.

use crate::error::{Error, Result};
use crate::queue::QueueStore;
use crate::resolver::MediaResolver;
use crate::sink::{VoiceConnection, VoiceSink};
use mbx_common::events::{EventBus, MbxEvent};
use mbx_common::Track;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Outcome of one cursor evaluation inside the session loop
enum Step {
    /// Queue emptied mid-session; wind down quietly, keep the connection
    Idle,
    /// Loop flag was set on an emptied queue; nothing to restart
    LoopDisabled,
    /// Queue ran past the end without looping
    Finished,
    /// A track is due to play
    Play {
        track: Track,
        position: usize,
        total: usize,
        /// True when the cursor just wrapped back to index 0
        looped: bool,
    },
}

/// Evaluate the cursor against the queue and decide the next step
///
/// Runs under one write lock so wrap and cursor reset are atomic with
/// the decision.
fn next_step(queue: &mut QueueStore) -> Step {
    if queue.is_empty() {
        // A loop flag on an emptied queue has nothing to restart; switch
        // it off rather than spinning
        if queue.cursor() == 0 && queue.is_looping() {
            queue.toggle_loop();
            return Step::LoopDisabled;
        }
        return Step::Idle;
    }

    let mut looped = false;
    if queue.cursor() >= queue.len() as i64 {
        queue.set_cursor(0);
        if queue.is_looping() {
            looped = true;
        } else {
            return Step::Finished;
        }
    }

    match queue.current() {
        Some(track) => Step::Play {
            track: track.clone(),
            position: queue.cursor() as usize,
            total: queue.len(),
            looped,
        },
        // Cursor below range; nothing sensible to play
        None => Step::Idle,
    }
}

/// Single-flight playback session driver
///
/// Shared via `Arc`; the HTTP layer calls the request methods and the
/// session loop runs as a spawned task.
pub struct PlaybackController {
    queue: Arc<RwLock<QueueStore>>,
    resolver: Arc<dyn MediaResolver>,
    sink: Arc<dyn VoiceSink>,
    events: EventBus,
    /// Single-flight gate: true while a session task is alive
    busy: AtomicBool,
    connection: Mutex<Option<Arc<dyn VoiceConnection>>>,
    storage_dir: PathBuf,
}

impl PlaybackController {
    pub fn new(
        queue: Arc<RwLock<QueueStore>>,
        resolver: Arc<dyn MediaResolver>,
        sink: Arc<dyn VoiceSink>,
        events: EventBus,
        storage_dir: PathBuf,
    ) -> Self {
        Self {
            queue,
            resolver,
            sink,
            events,
            busy: AtomicBool::new(false),
            connection: Mutex::new(None),
            storage_dir,
        }
    }

    /// Shared queue handle
    pub fn queue(&self) -> Arc<RwLock<QueueStore>> {
        Arc::clone(&self.queue)
    }

    /// Whether a track is audible right now
    pub async fn is_playing(&self) -> bool {
        match self.connection.lock().await.as_ref() {
            Some(conn) => conn.is_playing(),
            None => false,
        }
    }

    /// The track currently playing, with its queue position and the
    /// queue length
    pub async fn now_playing(&self) -> Result<(Track, usize, usize)> {
        let conn = self.connection.lock().await.clone();
        let conn = conn.ok_or(Error::NotConnected)?;
        if !conn.is_playing() {
            return Err(Error::NotPlaying);
        }

        let queue = self.queue.read().await;
        let track = queue.current().cloned().ok_or(Error::NotPlaying)?;
        Ok((track, queue.cursor() as usize, queue.len()))
    }

    /// Start a playback session
    ///
    /// Fails with `AlreadyBusy` when a session is in flight, and with
    /// `EmptyQueue` when there is nothing to play. On success the
    /// session loop runs as a background task; this call returns as soon
    /// as the session is started.
    pub async fn request_play(self: &Arc<Self>) -> Result<()> {
        if self.busy.load(Ordering::Acquire) || self.is_playing().await {
            return Err(Error::AlreadyBusy);
        }
        if self.queue.read().await.is_empty() {
            return Err(Error::EmptyQueue);
        }

        {
            let mut conn = self.connection.lock().await;
            if conn.is_none() {
                *conn = Some(self.sink.connect().await?);
            }
        }

        // The compare-exchange is the authoritative gate; the load above
        // only short-circuits the common case
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::AlreadyBusy);
        }

        info!("Starting playback session");
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            controller.run_session().await;
        });
        Ok(())
    }

    /// Skip the current track, optionally jumping to `index`
    ///
    /// The in-flight session advances to the next slot naturally, so a
    /// jump parks the cursor one slot before the target.
    pub async fn request_skip(&self, index: Option<usize>) -> Result<()> {
        if self.queue.read().await.is_empty() {
            return Err(Error::EmptyQueue);
        }

        let conn = self.connection.lock().await.clone();
        let conn = conn.ok_or(Error::NotConnected)?;
        if !conn.is_playing() {
            return Err(Error::NotPlaying);
        }

        // Bounds are checked only once playback state is confirmed, and
        // against the current length
        if let Some(target) = index {
            let mut queue = self.queue.write().await;
            if target >= queue.len() {
                return Err(Error::IndexOutOfRange {
                    index: target,
                    len: queue.len(),
                });
            }
            // Session increments after the stopped track; target - 1
            // (possibly -1) makes that increment land on the target
            queue.set_cursor(target as i64 - 1);
        }

        self.events.emit_lossy(MbxEvent::Skipped {
            timestamp: chrono::Utc::now(),
        });
        conn.stop().await;
        Ok(())
    }

    /// Tear down the voice connection and destroy the queue
    ///
    /// Idempotent: disconnecting without a connection still clears the
    /// queue and emits the event.
    pub async fn request_disconnect(&self) -> Result<()> {
        let conn = self.connection.lock().await.take();

        {
            let mut queue = self.queue.write().await;
            queue.clear();
            queue.set_cursor(0);
        }

        match conn {
            Some(conn) => {
                conn.stop().await;
                conn.disconnect().await;
                info!("Voice connection closed, queue destroyed");
            }
            None => debug!("Disconnect requested with no active connection"),
        }

        self.events.emit_lossy(MbxEvent::Disconnected {
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    /// The session loop: evaluate, download, play, advance, repeat
    async fn run_session(&self) {
        loop {
            // A disconnect may have torn down the connection between
            // tracks; the session just winds down
            let conn = self.connection.lock().await.clone();
            let Some(conn) = conn else {
                debug!("Session ending: connection gone");
                self.busy.store(false, Ordering::Release);
                return;
            };

            let step = {
                let mut queue = self.queue.write().await;
                next_step(&mut queue)
            };

            match step {
                Step::Idle => {
                    debug!("Session ending: queue emptied");
                    self.busy.store(false, Ordering::Release);
                    return;
                }
                Step::LoopDisabled => {
                    self.busy.store(false, Ordering::Release);
                    self.events.emit_lossy(MbxEvent::LoopDisabled {
                        timestamp: chrono::Utc::now(),
                    });
                    return;
                }
                Step::Finished => {
                    info!("Music box finished");
                    self.teardown_connection().await;
                    self.busy.store(false, Ordering::Release);
                    self.events.emit_lossy(MbxEvent::QueueFinished {
                        timestamp: chrono::Utc::now(),
                    });
                    return;
                }
                Step::Play {
                    track,
                    position,
                    total,
                    looped,
                } => {
                    if looped {
                        info!("Queue exhausted with loop set, restarting from the top");
                        self.events.emit_lossy(MbxEvent::Looping {
                            timestamp: chrono::Utc::now(),
                        });
                    }

                    let path = match self
                        .resolver
                        .fetch_audio(&track.source_url, &self.storage_dir)
                        .await
                    {
                        Ok(path) => path,
                        Err(e) => {
                            // Surface the failure and stop; never auto-skip
                            warn!("Failed to fetch audio for {}: {}", track, e);
                            self.busy.store(false, Ordering::Release);
                            self.events.emit_lossy(MbxEvent::PlaybackError {
                                kind: e.kind().to_string(),
                                message: e.to_string(),
                                timestamp: chrono::Utc::now(),
                            });
                            return;
                        }
                    };

                    info!("Now playing [{}/{}] {}", position + 1, total, track);
                    self.events.emit_lossy(MbxEvent::NowPlaying {
                        track: track.clone(),
                        position,
                        total,
                        timestamp: chrono::Utc::now(),
                    });

                    let play_result = conn.play(&path).await;

                    // Downloaded audio is transient; best-effort cleanup
                    if let Err(e) = tokio::fs::remove_file(&path).await {
                        debug!("Could not remove {}: {}", path.display(), e);
                    }

                    if let Err(e) = play_result {
                        warn!("Playback failed for {}: {}", track, e);
                        self.busy.store(false, Ordering::Release);
                        self.events.emit_lossy(MbxEvent::PlaybackError {
                            kind: e.kind().to_string(),
                            message: e.to_string(),
                            timestamp: chrono::Utc::now(),
                        });
                        return;
                    }

                    self.queue.write().await.advance_cursor();
                }
            }
        }
    }

    /// Take and close the connection without emitting a disconnect event
    async fn teardown_connection(&self) {
        if let Some(conn) = self.connection.lock().await.take() {
            conn.disconnect().await;
        }
    }
}

//! Voice sink abstraction and the local player-process implementation
//!
//! The playback controller only ever talks to these traits; the concrete
//! sink decides where the audio actually goes. The bundled implementation
//! pipes downloaded files through a local player subprocess (ffplay by
//! default), which stands in for a voice-channel connection.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::Notify;
use tracing::{debug, warn};

/// Factory for voice connections
#[async_trait]
pub trait VoiceSink: Send + Sync {
    /// Establish a connection through which audio can be played
    async fn connect(&self) -> Result<Arc<dyn VoiceConnection>>;
}

/// An active voice connection
///
/// `play` is the only suspension point the controller exposes: it must
/// return when the track finishes on its own *or* when `stop` is called,
/// and `is_playing` must read true for exactly that window.
#[async_trait]
pub trait VoiceConnection: Send + Sync {
    /// Play the audio file at `path`, suspending until playback completes
    /// or is force-stopped
    async fn play(&self, path: &Path) -> Result<()>;

    /// Force-stop the in-flight `play`, if any
    async fn stop(&self);

    /// Tear down the connection
    async fn disconnect(&self);

    /// Whether a `play` call is currently in flight
    fn is_playing(&self) -> bool;
}

/// Default player invocation: ffplay without a video window, exiting
/// when the file ends, silenced so it does not pollute the daemon logs
pub const DEFAULT_PLAYER_COMMAND: &[&str] =
    &["ffplay", "-nodisp", "-autoexit", "-loglevel", "quiet"];

/// Voice sink backed by a local player subprocess
pub struct PlayerProcessSink {
    command: Vec<String>,
}

impl PlayerProcessSink {
    /// Create a sink that plays files by running `command` with the file
    /// path appended as the final argument
    pub fn new(command: Vec<String>) -> Result<Self> {
        if command.is_empty() {
            return Err(Error::Config("player command must not be empty".to_string()));
        }
        Ok(Self { command })
    }
}

impl Default for PlayerProcessSink {
    fn default() -> Self {
        Self {
            command: DEFAULT_PLAYER_COMMAND.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl VoiceSink for PlayerProcessSink {
    async fn connect(&self) -> Result<Arc<dyn VoiceConnection>> {
        debug!("Opening player-process voice connection");
        Ok(Arc::new(PlayerProcessConnection {
            command: self.command.clone(),
            stop: Notify::new(),
            playing: AtomicBool::new(false),
        }))
    }
}

/// Connection that spawns one player process per track
struct PlayerProcessConnection {
    command: Vec<String>,
    stop: Notify,
    playing: AtomicBool,
}

#[async_trait]
impl VoiceConnection for PlayerProcessConnection {
    async fn play(&self, path: &Path) -> Result<()> {
        let mut child = Command::new(&self.command[0])
            .args(&self.command[1..])
            .arg(path)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Playback(format!("failed to spawn {}: {}", self.command[0], e)))?;

        // Register for stop before publishing the playing flag; a stop
        // arriving right after is_playing turns true must not be lost
        let stopped = self.stop.notified();
        tokio::pin!(stopped);
        stopped.as_mut().enable();

        self.playing.store(true, Ordering::Release);

        let result = tokio::select! {
            status = child.wait() => match status {
                Ok(status) if status.success() => Ok(()),
                Ok(status) => Err(Error::Playback(format!(
                    "player exited with {} for {}",
                    status,
                    path.display()
                ))),
                Err(e) => Err(Error::Playback(format!("player wait failed: {}", e))),
            },
            _ = &mut stopped => {
                debug!("Force-stopping playback of {}", path.display());
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill player process: {}", e);
                }
                Ok(())
            }
        };

        self.playing.store(false, Ordering::Release);
        result
    }

    async fn stop(&self) {
        // notify_waiters wakes an in-flight play without storing a permit,
        // so a stop with nothing playing does not cancel the next track
        self.stop.notify_waiters();
    }

    async fn disconnect(&self) {
        self.stop.notify_waiters();
        debug!("Player-process voice connection closed");
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_player_command_is_rejected() {
        assert!(matches!(
            PlayerProcessSink::new(vec![]),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_starts_idle() {
        let sink = PlayerProcessSink::default();
        let conn = sink.connect().await.unwrap();
        assert!(!conn.is_playing());
    }

    #[tokio::test]
    async fn test_stop_without_play_is_harmless() {
        let sink = PlayerProcessSink::default();
        let conn = sink.connect().await.unwrap();
        conn.stop().await;
        assert!(!conn.is_playing());
    }

    #[tokio::test]
    async fn test_stop_interrupts_inflight_play() {
        use std::time::Duration;

        // "sleep" with the path as its argument stands in for a player
        // that would hold the connection for a long time
        let sink = PlayerProcessSink::new(vec!["sleep".to_string()]).unwrap();
        let conn = sink.connect().await.unwrap();

        let playing = Arc::clone(&conn);
        let handle = tokio::spawn(async move { playing.play(Path::new("30")).await });

        // Stop as soon as the playing flag is visible; must not be lost
        for _ in 0..1000 {
            if conn.is_playing() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(conn.is_playing());
        conn.stop().await;

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("play did not return after stop")
            .expect("play task panicked");
        assert!(result.is_ok());
        assert!(!conn.is_playing());
    }

    #[tokio::test]
    async fn test_play_reports_spawn_failure() {
        let sink = PlayerProcessSink::new(vec!["mbx-no-such-player".to_string()]).unwrap();
        let conn = sink.connect().await.unwrap();

        let err = conn.play(Path::new("/tmp/none.webm")).await.unwrap_err();
        assert!(matches!(err, Error::Playback(_)));
        assert!(!conn.is_playing());
    }
}

//! Event types for the MBX event system
//!
//! Provides the shared event definitions and EventBus used by the player
//! daemon and its SSE clients.
//!
//! # Architecture
//!
//! MBX uses hybrid communication:
//! - **EventBus** (tokio::broadcast): one-to-many event broadcasting
//! - **Shared state** (Arc<RwLock<T>>): read-heavy access to the queue
//!
//! Every state transition that changes what is audible emits exactly one
//! event here; the HTTP layer forwards them to clients over SSE.

use crate::track::Track;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// MBX event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MbxEvent {
    /// Tracks appended to the music box
    ///
    /// Triggers:
    /// - SSE: update queue display
    TrackAdded {
        /// Number of tracks appended (1 for a single video, more for a playlist)
        count: usize,
        /// When tracks were added
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Track removed from the music box by index
    TrackRemoved {
        /// Index the track was removed from
        index: usize,
        /// The removed track
        track: Track,
        /// When the track was removed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// All queued tracks discarded
    QueueCleared {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Queue order randomly permuted
    QueueShuffled {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Loop flag switched on
    LoopEnabled {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Loop flag switched off
    LoopDisabled {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Queue exhausted with the loop flag set; playback restarts from index 0
    Looping {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A track started playing
    ///
    /// Triggers:
    /// - SSE: update now-playing display
    NowPlaying {
        /// The track now audible
        track: Track,
        /// Queue index of the track
        position: usize,
        /// Queue length at play start
        total: usize,
        /// When playback started
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Queue exhausted without looping; the player disconnected
    QueueFinished {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Current track force-stopped by a skip request
    Skipped {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Voice connection torn down and queue destroyed
    Disconnected {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback failed (resolution or download error)
    ///
    /// Failures are surfaced, never auto-skipped; the operator decides
    /// whether to retry or abandon.
    PlaybackError {
        /// Error category (resolution, network, ...)
        kind: String,
        /// Human-readable description
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl MbxEvent {
    /// Event type string, used as the SSE `event:` field
    pub fn kind(&self) -> &'static str {
        match self {
            MbxEvent::TrackAdded { .. } => "TrackAdded",
            MbxEvent::TrackRemoved { .. } => "TrackRemoved",
            MbxEvent::QueueCleared { .. } => "QueueCleared",
            MbxEvent::QueueShuffled { .. } => "QueueShuffled",
            MbxEvent::LoopEnabled { .. } => "LoopEnabled",
            MbxEvent::LoopDisabled { .. } => "LoopDisabled",
            MbxEvent::Looping { .. } => "Looping",
            MbxEvent::NowPlaying { .. } => "NowPlaying",
            MbxEvent::QueueFinished { .. } => "QueueFinished",
            MbxEvent::Skipped { .. } => "Skipped",
            MbxEvent::Disconnected { .. } => "Disconnected",
            MbxEvent::PlaybackError { .. } => "PlaybackError",
        }
    }
}

/// One-to-many event broadcaster backed by tokio::broadcast
///
/// Clones share the same channel; subscribers receive every event emitted
/// after they subscribe.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MbxEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    ///
    /// `capacity` is the number of events buffered before slow subscribers
    /// start dropping old events.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<MbxEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: MbxEvent) -> Result<usize, broadcast::error::SendError<MbxEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring whether anyone is listening
    ///
    /// Status events are informational; playback proceeds the same way
    /// whether or not a client is connected.
    pub fn emit_lossy(&self, event: MbxEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new(100);
        assert_eq!(bus.capacity(), 100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_eventbus_subscribe() {
        let bus = EventBus::new(100);
        let _rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_eventbus_emit_no_subscribers() {
        let bus = EventBus::new(100);
        let event = MbxEvent::QueueFinished {
            timestamp: chrono::Utc::now(),
        };

        // Should return error when no subscribers
        assert!(bus.emit(event).is_err());
    }

    #[tokio::test]
    async fn test_eventbus_emit_with_subscriber() {
        let bus = Arc::new(EventBus::new(100));
        let mut rx = bus.subscribe();

        let track = Track::new("Song", "Artist", "https://example.com/watch?v=1");
        let event = MbxEvent::NowPlaying {
            track: track.clone(),
            position: 0,
            total: 2,
            timestamp: chrono::Utc::now(),
        };

        assert!(bus.emit(event).is_ok());

        let received = rx.recv().await.unwrap();
        match received {
            MbxEvent::NowPlaying {
                track: t,
                position,
                total,
                ..
            } => {
                assert_eq!(t, track);
                assert_eq!(position, 0);
                assert_eq!(total, 2);
            }
            other => panic!("Wrong event type received: {:?}", other),
        }
    }

    #[test]
    fn test_eventbus_emit_lossy() {
        let bus = EventBus::new(100);
        let event = MbxEvent::Skipped {
            timestamp: chrono::Utc::now(),
        };

        // Should not panic even without subscribers
        bus.emit_lossy(event);
    }

    #[test]
    fn test_event_kind_matches_serde_tag() {
        let event = MbxEvent::TrackAdded {
            count: 3,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.kind());
        assert_eq!(json["count"], 3);
    }
}

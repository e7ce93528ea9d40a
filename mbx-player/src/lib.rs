//! # MBX Player Library (mbx-player)
//!
//! Shared music box playback daemon.
//!
//! **Purpose:** Maintain an ordered queue of track references, resolve and
//! download audio on demand, stream it sequentially through a voice sink,
//! and provide the HTTP/SSE control interface plus admin host diagnostics.
//!
//! **Architecture:** One process-wide queue, one playback session at a
//! time. The playback controller is a single-flight state machine driving
//! download-play-advance until the queue is exhausted or looped.

pub mod api;
pub mod config;
pub mod error;
pub mod playback;
pub mod queue;
pub mod resolver;
pub mod sink;
pub mod stats;
pub mod storage;

pub use error::{Error, Result};
pub use playback::PlaybackController;
pub use queue::{QueuePolicy, QueueStore};

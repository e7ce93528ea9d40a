//! # MBX Common Library
//!
//! Shared code for the MBX music box daemon:
//! - Track value type
//! - Event types (MbxEvent enum) and the EventBus
//! - Common error type
//! - Configuration file and storage folder resolution
//! - Human-readable uptime formatting

pub mod config;
pub mod error;
pub mod events;
pub mod human_time;
pub mod track;

pub use error::{Error, Result};
pub use track::Track;

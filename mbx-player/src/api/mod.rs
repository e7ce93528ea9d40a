//! HTTP API module
//!
//! Provides REST control endpoints, the SSE event stream, and the
//! admin surface for the player daemon.

pub mod admin;
pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, run, AppContext};

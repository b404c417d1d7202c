//! HTTP API module.
//!
//! This module provides the HTTP server, its request/response types and the
//! progress channel used by the streaming endpoint.

pub mod progress;
pub mod server;
pub mod types;

pub use progress::{NoProgress, ProgressEvent, ProgressReporter, ProgressSink, Stage, StreamFrame};
pub use server::{app, start_server, AppState};
pub use types::*;

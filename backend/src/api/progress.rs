//! Progress reporting via Server-Sent Events (SSE).
//!
//! The pipeline reports named checkpoints to a [`ProgressSink`]. The server
//! hands it the sending half of a per-request channel and streams every
//! [`StreamFrame`] to the client; the CLI passes [`NoProgress`].

use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::info;

use super::types::PreviewResponse;

/// Named pipeline checkpoint, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Init,
    Connect,
    Fetch,
    Process,
    Format,
    Complete,
}

/// A single progress update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub stage: Stage,
    /// Percentage, 0 to 100
    pub progress: u8,
    pub message: String,
}

impl ProgressEvent {
    pub fn new(stage: Stage, progress: u8, message: impl Into<String>) -> Self {
        Self {
            stage,
            progress: progress.min(100),
            message: message.into(),
        }
    }
}

/// Receives progress updates.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Collects updates in memory.
impl ProgressSink for Mutex<Vec<ProgressEvent>> {
    fn emit(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.lock() {
            events.push(event);
        }
    }
}

impl ProgressSink for mpsc::UnboundedSender<StreamFrame> {
    fn emit(&self, event: ProgressEvent) {
        // Receiver gone means the client disconnected
        let _ = self.send(StreamFrame::Progress(event));
    }
}

/// Logs each checkpoint and keeps percentages from going backwards.
pub struct ProgressReporter<'a> {
    sink: &'a dyn ProgressSink,
    last: u8,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(sink: &'a dyn ProgressSink) -> Self {
        Self { sink, last: 0 }
    }

    pub fn report(&mut self, stage: Stage, progress: u8, message: impl Into<String>) {
        let event = ProgressEvent::new(stage, progress.max(self.last), message);
        self.last = event.progress;
        info!(stage = ?event.stage, progress = event.progress, "{}", event.message);
        self.sink.emit(event);
    }
}

/// One SSE frame of a fetch-with-progress stream.
#[derive(Debug, Clone)]
pub enum StreamFrame {
    Progress(ProgressEvent),
    /// Final frame on success.
    Done(PreviewResponse),
    /// Final frame on failure.
    Failed { error: String, kind: &'static str },
}

impl StreamFrame {
    /// JSON payload of the frame.
    ///
    /// Final frames carry `"stage": "done"` or `"stage": "error"` next to the
    /// result fields.
    pub fn to_json(&self) -> Value {
        match self {
            StreamFrame::Progress(event) => json!(event),
            StreamFrame::Done(response) => {
                let mut frame = json!({ "stage": "done" });
                if let (Some(frame), Value::Object(fields)) = (frame.as_object_mut(), json!(response)) {
                    frame.extend(fields);
                }
                frame
            }
            StreamFrame::Failed { error, kind } => json!({
                "stage": "error",
                "success": false,
                "error": error,
                "kind": kind,
            }),
        }
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, StreamFrame::Progress(_))
    }
}

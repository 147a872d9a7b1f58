//! Response delivery strategies for a completed answer.
//!
//! [`Direct`] returns the answer as one `text/plain` body. [`Chunked`] replays
//! an answer that is already complete as a paced series of `text-delta`
//! server-sent events. Chunked delivery only changes how the text appears in
//! the browser; it does not reduce time to first byte, since the upstream
//! call has finished before the first event is sent.

use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;
use futures_util::stream;
use serde::Serialize;

/// Hands a finished answer back to the caller.
pub trait ResponseDelivery: Send + Sync {
    fn deliver(&self, answer: String) -> Response;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Configured delivery strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Direct,
    Chunked { interval: Duration },
}

impl DeliveryMode {
    /// Parse `direct` / `chunked` (case-insensitive).
    pub fn parse(mode: &str, interval: Duration) -> Option<Self> {
        match mode.trim().to_ascii_lowercase().as_str() {
            "direct" => Some(DeliveryMode::Direct),
            "chunked" => Some(DeliveryMode::Chunked { interval }),
            _ => None,
        }
    }

    pub fn build(self) -> Arc<dyn ResponseDelivery> {
        match self {
            DeliveryMode::Direct => Arc::new(Direct),
            DeliveryMode::Chunked { interval } => Arc::new(Chunked { interval }),
        }
    }
}

/// Whole answer in a single `text/plain` body.
#[derive(Debug, Clone, Copy, Default)]
pub struct Direct;

impl ResponseDelivery for Direct {
    fn deliver(&self, answer: String) -> Response {
        answer.into_response()
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}

/// Word-by-word `text-delta` events with a fixed pause between them.
#[derive(Debug, Clone, Copy)]
pub struct Chunked {
    pub interval: Duration,
}

#[derive(Debug, Serialize)]
struct TextDelta {
    #[serde(rename = "type")]
    kind: &'static str,
    delta: String,
}

/// Split an answer on whitespace, keeping a trailing space on every word.
pub fn text_deltas(answer: &str) -> Vec<String> {
    answer
        .split_whitespace()
        .map(|word| format!("{word} "))
        .collect()
}

impl ResponseDelivery for Chunked {
    fn deliver(&self, answer: String) -> Response {
        let interval = self.interval;
        // Pacing runs inside the body stream, so a disconnected client drops
        // the stream and the remaining sleeps never happen.
        let events = stream::iter(text_deltas(&answer).into_iter().enumerate()).then(
            move |(index, delta)| async move {
                if index > 0 {
                    tokio::time::sleep(interval).await;
                }
                Event::default().json_data(TextDelta {
                    kind: "text-delta",
                    delta,
                })
            },
        );
        Sse::new(events).into_response()
    }

    fn name(&self) -> &'static str {
        "chunked"
    }
}

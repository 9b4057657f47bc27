//! Per-shot outcome records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// The recorded outcome of one shot.
///
/// Exactly one sample is emitted per measured shot, success or failure: a
/// failed shot populates the error field instead of suppressing emission.
///
/// A sample can carry a protocol code and an error at the same time. When the
/// status line arrives but draining the body fails afterwards, both facts are
/// independently true of the same shot and both stay on the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    /// Tag of the ammo item this shot fired.
    pub tag: String,

    /// Protocol outcome code (e.g. HTTP status), when the target replied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proto_code: Option<u16>,

    /// Error description, when any phase of the shot failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Wall-clock time the shot started.
    pub started_at: DateTime<Utc>,

    /// End-to-end shot latency in milliseconds.
    pub latency_ms: f64,

    /// Response body bytes drained.
    pub bytes_read: u64,

    /// Monotonic measurement anchor; not part of the record.
    #[serde(skip)]
    begun: Option<Instant>,
}

impl Sample {
    /// Start a new sample for a shot against the tagged ammo item.
    pub fn begin(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            proto_code: None,
            error: None,
            started_at: Utc::now(),
            latency_ms: 0.0,
            bytes_read: 0,
            begun: Some(Instant::now()),
        }
    }

    /// Stamp the protocol outcome code.
    pub fn set_proto_code(&mut self, code: u16) {
        self.proto_code = Some(code);
    }

    /// Record the failure that ended (or accompanied) this shot.
    pub fn set_err(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    /// Record how many response body bytes were drained.
    pub fn set_bytes_read(&mut self, bytes: u64) {
        self.bytes_read = bytes;
    }

    /// Stamp the end-to-end latency. Safe to call once per sample.
    pub fn finish(&mut self) {
        if let Some(begun) = self.begun.take() {
            self.latency_ms = begun.elapsed().as_secs_f64() * 1000.0;
        }
    }

    /// Whether the shot failed in any phase.
    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}

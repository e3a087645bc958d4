//! One broker delivery
//!
//! `Message` is the immutable record of a single publish received from the
//! broker (or synthesized by the periodic scheduler). It is stamped with the
//! receive time so every downstream time field is derived from one instant.

use std::borrow::Cow;

use bytes::Bytes;
use chrono::{DateTime, Local};

/// Immutable record of one broker delivery
///
/// Cloning is cheap: the payload is a reference-counted [`Bytes`].
#[derive(Debug, Clone)]
pub struct Message {
    /// Concrete topic the message arrived on
    pub topic: String,

    /// Raw payload bytes
    pub payload: Bytes,

    /// QoS the broker delivered the message with (0, 1 or 2)
    pub qos: u8,

    /// Whether the broker flagged this as a retained message
    pub retained: bool,

    /// Local receive time; all `_dt*` context fields derive from this
    pub received_at: DateTime<Local>,
}

impl Message {
    /// Create a message stamped with the current local time
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>, qos: u8, retained: bool) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            qos,
            retained,
            received_at: Local::now(),
        }
    }

    /// Create a synthetic message, as produced by periodic tasks
    ///
    /// Synthetic messages are never retained and carry QoS 0.
    pub fn synthetic(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self::new(topic, payload, 0, false)
    }

    /// Payload decoded as text, lossily
    ///
    /// Trailing NUL bytes are stripped first; some firmwares pad their
    /// publishes with `\0`.
    pub fn payload_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(trim_nul(&self.payload))
    }

    /// Attempt to decode the payload as a JSON document
    ///
    /// Returns `None` when the payload is not valid JSON. Decode failure is
    /// never an error: plain-text payloads are routed just as well.
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(trim_nul(&self.payload)).ok()
    }

    /// Topic split into levels
    ///
    /// Empty levels are preserved: `"a//b"` has three levels.
    pub fn topic_levels(&self) -> impl Iterator<Item = &str> {
        self.topic.split('/')
    }
}

/// Strip trailing NUL bytes from a payload
fn trim_nul(payload: &[u8]) -> &[u8] {
    let end = payload
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |pos| pos + 1);
    &payload[..end]
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

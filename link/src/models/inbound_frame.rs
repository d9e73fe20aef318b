use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::event_kind::EventKind;
use crate::error::Result;

/// A named message pushed by the server.
///
/// Wire shape: `{"type": "<name>", "data": <anything>}`. The client only
/// classifies by name; `data` is handed to listeners untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundFrame {
    /// Frame type as sent by the server.
    #[serde(rename = "type")]
    pub name: String,

    /// Opaque payload, `null` when absent.
    #[serde(default)]
    pub data: JsonValue,
}

impl InboundFrame {
    /// Build a frame from a name and payload.
    pub fn new(name: impl Into<String>, data: JsonValue) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Parse a JSON text frame.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Classify the frame.
    pub fn kind(&self) -> EventKind {
        EventKind::from_wire(&self.name)
    }

    /// Send timestamp echoed by a `pong` frame.
    ///
    /// Accepts both `{"timestamp": n}` and a bare number as payload.
    pub fn probe_timestamp(&self) -> Option<u64> {
        match &self.data {
            JsonValue::Number(n) => n.as_u64(),
            JsonValue::Object(map) => map.get("timestamp").and_then(JsonValue::as_u64),
            _ => None,
        }
    }
}

use serde::{Deserialize, Serialize};

use super::topic::Topic;

/// Client-to-server messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Liveness probe.
    ///
    /// The server echoes `timestamp` back in a `pong` frame; the difference
    /// to the receive time is one latency sample.
    Ping {
        /// Send time, millis since Unix epoch.
        timestamp: u64,
    },

    /// Ask the server to push a topic for a subject.
    Subscribe {
        /// Channel to push.
        topic: Topic,
        /// Merchant/session identifier the topic is scoped to.
        subject_id: String,
    },
}

impl ClientMessage {
    /// Serialize to the JSON text frame sent on the wire.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ping_wire_shape() {
        let msg = ClientMessage::Ping { timestamp: 1_700_000_000_000 };
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(value, json!({ "type": "ping", "timestamp": 1_700_000_000_000u64 }));
    }

    #[test]
    fn test_subscribe_wire_shape() {
        let msg = ClientMessage::Subscribe {
            topic: Topic::Orders,
            subject_id: "m-42".to_string(),
        };
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({ "type": "subscribe", "topic": "orders", "subject_id": "m-42" })
        );
    }
}

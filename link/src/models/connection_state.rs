use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the realtime connection.
///
/// Exactly one value holds at any instant. Only the connection state
/// machine (and `disconnect()`) moves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No transport, or the transport closed cleanly.
    #[default]
    Disconnected,
    /// A transport has been opened and the handshake is in flight.
    Connecting,
    /// Handshake done; probes running, subscriptions replayed.
    Connected,
    /// The transport lost its connection and is backing off.
    Reconnecting,
    /// The last connection attempt failed. Not terminal.
    Error,
}

impl ConnectionState {
    /// `true` while a transport exists and is (or is becoming) usable, i.e.
    /// a second `connect()` must not open another one.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting | ConnectionState::Connected | ConnectionState::Reconnecting
        )
    }

    /// Label for UI badges and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

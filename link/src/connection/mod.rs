//! Realtime connection management.
//!
//! This module contains:
//! - [`transport`]: the boundary between the state machine and the socket
//! - [`websocket`]: the `tokio-tungstenite` transport with auto-reconnect
//! - `machine`: the background task that owns the connection lifecycle
//! - `session`: state shared between that task and the public facade

pub(crate) mod machine;
pub(crate) mod session;
pub mod transport;
pub mod websocket;

pub use transport::{ArcConnector, Connector, OpenRequest, TransportEvent, TransportHandle};
pub use websocket::{resolve_ws_url, WsConnector};

use std::time::{SystemTime, UNIX_EPOCH};

/// Capacity of each transport's event channel.
pub(crate) const TRANSPORT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Maximum text message size (16 MiB).
pub(crate) const MAX_WS_TEXT_MESSAGE_BYTES: usize = 16 << 20;

/// A duration far enough in the future (~100 years) to act as "never" for
/// deadline calculations without overflowing `Instant::now() + dur`.
pub(crate) const FAR_FUTURE: std::time::Duration =
    std::time::Duration::from_secs(100 * 365 * 24 * 3600);

/// Wall-clock milliseconds since the Unix epoch.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

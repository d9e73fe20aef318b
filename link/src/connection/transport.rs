//! Transport boundary.
//!
//! The state machine never touches sockets directly. It asks a
//! [`Connector`] to open a transport and then:
//!
//! - receives [`TransportEvent`]s on the channel it handed to `open`
//! - writes [`ClientMessage`]s through the returned [`TransportHandle`]
//!
//! The transport owns its reconnection loop (configured through
//! [`OpenRequest::options`]) and reports progress as
//! `ReconnectAttempt`/`Reconnect` events.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::credentials::Token;
use crate::models::{ClientMessage, ConnectionError, ConnectionOptions, DisconnectReason, InboundFrame};

/// Everything a transport needs to open a connection.
#[derive(Debug, Clone)]
pub struct OpenRequest {
    /// WebSocket URL (`ws://` or `wss://`).
    pub url: String,
    /// Bearer token presented at handshake time.
    pub token: Token,
    /// Reconnection policy.
    pub options: ConnectionOptions,
    /// Handshake timeout.
    pub connection_timeout: Duration,
}

/// Notifications from a transport to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// First successful handshake.
    Open,
    /// The connection closed (by the server, or the socket dropped).
    Close(DisconnectReason),
    /// A connect or handshake attempt failed.
    Error(ConnectionError),
    /// Backing off before reconnection attempt `attempt` (1-based).
    ReconnectAttempt { attempt: u32 },
    /// Reconnected on attempt `attempt`.
    Reconnect { attempt: u32 },
    /// The reconnection policy is exhausted; the transport is finished.
    ReconnectFailed,
    /// A frame pushed by the server.
    Message(InboundFrame),
}

/// Write side of an open transport.
pub trait TransportHandle: Send + Sync {
    /// Queue a message for the server.
    ///
    /// Returns `false` (and drops the message) while not connected.
    fn send(&self, message: &ClientMessage) -> bool;

    /// Whether the transport currently has a live connection.
    fn is_connected(&self) -> bool;

    /// Tear the transport down, cancelling any pending reconnection.
    /// Idempotent.
    fn close(&self);
}

/// Factory for transports.
pub trait Connector: Send + Sync + 'static {
    /// Start a transport. Events for it are delivered on `events` until the
    /// transport finishes or the receiver is dropped.
    fn open(
        &self,
        request: OpenRequest,
        events: mpsc::Sender<TransportEvent>,
    ) -> Box<dyn TransportHandle>;
}

/// A shared, reference-counted [`Connector`].
pub type ArcConnector = Arc<dyn Connector>;

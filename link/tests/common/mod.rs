#![allow(dead_code)]
//! Shared helpers for dashboard-link integration tests.
//!
//! [`MockConnector`] records every transport the client opens. Each
//! [`MockTransport`] lets a test play the server side: flip the connection
//! up and down, push frames, and inspect what the client wrote.

use dashboard_link::{
    listener, ArcCredentialStore, ClientMessage, ConnectionError, ConnectionOptions, Connector,
    DisconnectReason, EventKind, InboundFrame, LinkTimeouts, MemoryCredentialStore, OpenRequest,
    RealtimeClient, Topic, TransportEvent, TransportHandle,
};
use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

// ── mock transport ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockLink {
    connected: AtomicBool,
    closed: AtomicBool,
    sent: Mutex<Vec<ClientMessage>>,
}

struct LinkHandle(Arc<MockLink>);

impl TransportHandle for LinkHandle {
    fn send(&self, message: &ClientMessage) -> bool {
        if !self.0.connected.load(Ordering::SeqCst) {
            return false;
        }
        self.0.sent.lock().push(message.clone());
        true
    }

    fn is_connected(&self) -> bool {
        self.0.connected.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.0.connected.store(false, Ordering::SeqCst);
        self.0.closed.store(true, Ordering::SeqCst);
    }
}

/// Server-side view of one opened transport.
#[derive(Clone)]
pub struct MockTransport {
    pub request: OpenRequest,
    events: Arc<Mutex<Option<mpsc::Sender<TransportEvent>>>>,
    link: Arc<MockLink>,
}

impl MockTransport {
    async fn deliver(&self, event: TransportEvent) {
        let events = self.events.lock().clone();
        if let Some(events) = events {
            // the client may already have dropped this transport
            let _ = events.send(event).await;
        }
    }

    /// End the transport task: the client sees its event channel close.
    pub fn finish(&self) {
        self.link.connected.store(false, Ordering::SeqCst);
        self.events.lock().take();
    }

    /// Flip the link's connected flag without telling the client, as a
    /// socket does between a network drop and the close being noticed.
    pub fn set_link_up(&self, up: bool) {
        self.link.connected.store(up, Ordering::SeqCst);
    }

    pub async fn open(&self) {
        self.link.connected.store(true, Ordering::SeqCst);
        self.deliver(TransportEvent::Open).await;
    }

    pub async fn fail(&self, message: &str, recoverable: bool) {
        self.deliver(TransportEvent::Error(ConnectionError::new(message, recoverable)))
            .await;
    }

    pub async fn drop_connection(&self, message: &str) {
        self.link.connected.store(false, Ordering::SeqCst);
        self.deliver(TransportEvent::Close(DisconnectReason::with_code(message, 1006)))
            .await;
    }

    pub async fn reconnect_attempt(&self, attempt: u32) {
        self.deliver(TransportEvent::ReconnectAttempt { attempt }).await;
    }

    pub async fn reconnected(&self, attempt: u32) {
        self.link.connected.store(true, Ordering::SeqCst);
        self.deliver(TransportEvent::Reconnect { attempt }).await;
    }

    pub async fn give_up(&self) {
        self.link.connected.store(false, Ordering::SeqCst);
        self.deliver(TransportEvent::ReconnectFailed).await;
    }

    pub async fn push(&self, name: &str, data: JsonValue) {
        self.deliver(TransportEvent::Message(InboundFrame::new(name, data)))
            .await;
    }

    pub fn sent(&self) -> Vec<ClientMessage> {
        self.link.sent.lock().clone()
    }

    pub fn subscribed_topics(&self) -> Vec<Topic> {
        self.sent()
            .into_iter()
            .filter_map(|m| match m {
                ClientMessage::Subscribe { topic, .. } => Some(topic),
                _ => None,
            })
            .collect()
    }

    pub fn probe_timestamps(&self) -> Vec<u64> {
        self.sent()
            .into_iter()
            .filter_map(|m| match m {
                ClientMessage::Ping { timestamp } => Some(timestamp),
                _ => None,
            })
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.link.closed.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct MockConnector {
    opened: Mutex<Vec<MockTransport>>,
}

impl MockConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().len()
    }

    pub fn transport(&self, index: usize) -> Option<MockTransport> {
        self.opened.lock().get(index).cloned()
    }

    /// Wait until the client has opened transport number `index` (0-based).
    pub async fn wait_for_transport(&self, index: usize) -> MockTransport {
        tokio::time::timeout(TEST_TIMEOUT, async {
            loop {
                if let Some(transport) = self.transport(index) {
                    return transport;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("client never opened the transport")
    }
}

impl Connector for MockConnector {
    fn open(
        &self,
        request: OpenRequest,
        events: mpsc::Sender<TransportEvent>,
    ) -> Box<dyn TransportHandle> {
        let link = Arc::new(MockLink::default());
        self.opened.lock().push(MockTransport {
            request,
            events: Arc::new(Mutex::new(Some(events))),
            link: link.clone(),
        });
        Box::new(LinkHandle(link))
    }
}

// ── client helpers ──────────────────────────────────────────────────────────

pub const TEST_URL: &str = "https://dashboard.test/realtime";
pub const TEST_TOKEN: &str = "test-token";

pub fn token_store() -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::with_token(TEST_TOKEN))
}

pub fn create_client(connector: &Arc<MockConnector>, store: ArcCredentialStore) -> RealtimeClient {
    create_client_with(connector, store, ConnectionOptions::default())
}

pub fn create_client_with(
    connector: &Arc<MockConnector>,
    store: ArcCredentialStore,
    options: ConnectionOptions,
) -> RealtimeClient {
    RealtimeClient::builder()
        .url(TEST_URL)
        .credential_store(store)
        .connector(connector.clone())
        .connection_options(options)
        .timeouts(LinkTimeouts::default())
        .build()
        .expect("client should build")
}

/// Connect and complete the handshake on the mock side.
pub async fn connect_and_open(
    client: &RealtimeClient,
    connector: &MockConnector,
    index: usize,
) -> MockTransport {
    client.connect().await;
    let transport = connector.wait_for_transport(index).await;
    transport.open().await;
    settle(client).await;
    transport
}

/// Returns once the connection task has handled everything queued before
/// this call (transport events are drained ahead of commands).
pub async fn settle(client: &RealtimeClient) {
    let _ = client.subscriptions().await;
}

/// Forward every `kind` event payload into a channel.
pub fn capture(client: &RealtimeClient, kind: EventKind) -> mpsc::UnboundedReceiver<JsonValue> {
    let (tx, rx) = mpsc::unbounded_channel();
    client.on(
        kind,
        listener(move |payload| {
            let _ = tx.send(payload.clone());
        }),
    );
    rx
}

pub async fn next_payload(rx: &mut mpsc::UnboundedReceiver<JsonValue>) -> JsonValue {
    tokio::time::timeout(TEST_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time should be after UNIX_EPOCH")
        .as_millis() as u64
}

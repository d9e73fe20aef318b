//! Connection state machine.
//!
//! A single background task owns the transport handle, the subscription
//! set and the probe timer, and processes everything strictly in order:
//!
//! - commands from the public facade (connect, disconnect, subscribe, ...)
//! - events from the current transport (open, close, reconnect, frames)
//! - liveness-probe ticks
//!
//! Inbound frames and lifecycle notifications are queued to the listener
//! dispatch task; listener code never runs here.

use std::collections::VecDeque;

use serde_json::{json, Value as JsonValue};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::{
    connection::{
        now_ms,
        session::SharedSession,
        transport::{ArcConnector, OpenRequest, TransportEvent, TransportHandle},
        FAR_FUTURE, TRANSPORT_EVENT_CHANNEL_CAPACITY,
    },
    credentials::Token,
    event_bus::Dispatch,
    models::{
        ClientMessage, ConnectionError, ConnectionOptions, ConnectionState, DisconnectReason,
        EventKind, InboundFrame, SubscriptionInfo, Topic,
    },
    subscription::SubscriptionManager,
    timeouts::LinkTimeouts,
};

/// Probes awaiting a reply on the current link. Older ones are forgotten
/// once this many are outstanding.
const MAX_PENDING_PROBES: usize = 4;

// ── Commands ────────────────────────────────────────────────────────────────

/// Commands sent from the public API to the connection task.
pub(crate) enum Command {
    /// Open a transport, unless one is already up.
    ///
    /// `generation` is the session generation observed when the caller
    /// started `connect()`; a `disconnect()` in between makes it stale.
    Connect { token: Token, generation: u64 },
    /// Tear the transport down. The session was already moved to
    /// `Disconnected` by the caller.
    Disconnect,
    /// Add a topic to the subscription set.
    Subscribe { topic: Topic, subject_id: String },
    /// Snapshot of the subscription set.
    ListSubscriptions {
        result_tx: oneshot::Sender<Vec<SubscriptionInfo>>,
    },
}

// ── Per-transport state ─────────────────────────────────────────────────────

struct ActiveTransport {
    handle: Box<dyn TransportHandle>,
    events: mpsc::Receiver<TransportEvent>,
    generation: u64,
}

async fn next_event(transport: &mut Option<ActiveTransport>) -> Option<TransportEvent> {
    match transport {
        Some(active) => active.events.recv().await,
        None => std::future::pending().await,
    }
}

// ── ConnectionMachine ───────────────────────────────────────────────────────

pub(crate) struct ConnectionMachine {
    url: String,
    options: ConnectionOptions,
    timeouts: LinkTimeouts,
    connector: ArcConnector,
    session: SharedSession,
    subscriptions: SubscriptionManager,
    transport: Option<ActiveTransport>,
    probe_deadline: Option<Instant>,
    /// Send timestamps of probes not yet answered by a `pong`.
    pending_probes: VecDeque<u64>,
    dispatch_tx: mpsc::Sender<Dispatch>,
}

impl ConnectionMachine {
    pub(crate) fn new(
        url: String,
        options: ConnectionOptions,
        timeouts: LinkTimeouts,
        connector: ArcConnector,
        session: SharedSession,
        dispatch_tx: mpsc::Sender<Dispatch>,
    ) -> Self {
        Self {
            url,
            options,
            timeouts,
            connector,
            session,
            subscriptions: SubscriptionManager::new(),
            transport: None,
            probe_deadline: None,
            pending_probes: VecDeque::with_capacity(MAX_PENDING_PROBES),
            dispatch_tx,
        }
    }

    pub(crate) fn spawn(self, cmd_rx: mpsc::UnboundedReceiver<Command>) -> JoinHandle<()> {
        tokio::spawn(self.run(cmd_rx))
    }

    async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<Command>) {
        loop {
            let probing = self.probe_deadline.is_some();
            let probe_sleep = tokio::time::sleep_until(
                self.probe_deadline
                    .unwrap_or_else(|| Instant::now() + FAR_FUTURE),
            );
            tokio::pin!(probe_sleep);

            tokio::select! {
                biased;

                event = next_event(&mut self.transport) => {
                    match event {
                        Some(event) => self.on_transport_event(event).await,
                        None => self.on_transport_finished(),
                    }
                }

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.on_command(cmd).await,
                        None => {
                            log::debug!("[dashboard-link] Client dropped, stopping connection task");
                            self.drop_transport();
                            return;
                        },
                    }
                }

                _ = &mut probe_sleep, if probing => {
                    self.on_probe_tick();
                }
            }
        }
    }

    // ── commands ────────────────────────────────────────────────────────────

    async fn on_command(&mut self, cmd: Command) {
        match cmd {
            Command::Connect { token, generation } => self.open_transport(token, generation),
            Command::Disconnect => {
                let was_connected = self
                    .transport
                    .as_ref()
                    .map_or(false, |t| t.handle.is_connected());
                self.drop_transport();
                if was_connected {
                    self.emit(
                        EventKind::Disconnected,
                        DisconnectReason::new("Client disconnected").to_payload(),
                    )
                    .await;
                }
            },
            Command::Subscribe { topic, subject_id } => {
                let link = self.transport.as_ref().map(|t| t.handle.as_ref());
                let outcome = self.subscriptions.request(topic, &subject_id, link, now_ms());
                let mut session = self.session.lock();
                if outcome.newly_added {
                    session.stats.record_subscription();
                }
                if outcome.sent {
                    session.stats.record_sent();
                }
            },
            Command::ListSubscriptions { result_tx } => {
                let _ = result_tx.send(self.subscriptions.snapshot());
            },
        }
    }

    fn open_transport(&mut self, token: Token, generation: u64) {
        let epoch = {
            let mut session = self.session.lock();
            if !session.is_current(generation) {
                log::debug!(
                    "[dashboard-link] Ignoring stale connect (gen={})",
                    generation
                );
                return;
            }
            if self.transport.is_some() {
                log::debug!(
                    "[dashboard-link] connect() while {}: transport already open",
                    session.state()
                );
                return;
            }
            session.begin_epoch()
        };

        log::info!("[dashboard-link] Connecting to {}", self.url);
        let (events_tx, events_rx) = mpsc::channel(TRANSPORT_EVENT_CHANNEL_CAPACITY);
        let handle = self.connector.open(
            OpenRequest {
                url: self.url.clone(),
                token,
                options: self.options.clone(),
                connection_timeout: self.timeouts.connection_timeout,
            },
            events_tx,
        );
        self.transport = Some(ActiveTransport {
            handle,
            events: events_rx,
            generation: epoch,
        });
    }

    // ── transport events ────────────────────────────────────────────────────

    async fn on_transport_event(&mut self, event: TransportEvent) {
        let Some(epoch) = self.transport.as_ref().map(|t| t.generation) else {
            return;
        };
        if !self.session.lock().is_current(epoch) {
            log::debug!("[dashboard-link] Dropping event from stale transport (gen={})", epoch);
            self.drop_transport();
            return;
        }

        match event {
            TransportEvent::Open => self.on_connected(None).await,
            TransportEvent::Reconnect { attempt } => self.on_connected(Some(attempt)).await,
            TransportEvent::Close(reason) => {
                log::info!("[dashboard-link] Connection closed: {}", reason);
                self.probe_deadline = None;
                self.pending_probes.clear();
                {
                    let mut session = self.session.lock();
                    session.stats.freeze_uptime(Instant::now());
                    session.transition(ConnectionState::Disconnected);
                }
                self.emit(EventKind::Disconnected, reason.to_payload()).await;
            },
            TransportEvent::Error(error) => {
                log::warn!("[dashboard-link] Connection error: {}", error);
                {
                    let mut session = self.session.lock();
                    if session.state() != ConnectionState::Connected {
                        session.transition(ConnectionState::Error);
                    }
                }
                self.emit(EventKind::ConnectionError, error.to_payload()).await;
            },
            TransportEvent::ReconnectAttempt { attempt } => {
                self.probe_deadline = None;
                self.pending_probes.clear();
                {
                    let mut session = self.session.lock();
                    session.stats.freeze_uptime(Instant::now());
                    session.transition(ConnectionState::Reconnecting);
                }
                self.emit(EventKind::Reconnecting, json!({ "attempt": attempt }))
                    .await;
            },
            TransportEvent::ReconnectFailed => {
                log::warn!("[dashboard-link] Reconnection attempts exhausted; realtime updates unavailable");
                self.drop_transport();
                self.session.lock().transition(ConnectionState::Error);
                self.emit(
                    EventKind::ConnectionError,
                    ConnectionError::new("Reconnection attempts exhausted", false).to_payload(),
                )
                .await;
            },
            TransportEvent::Message(frame) => self.on_frame(frame).await,
        }
    }

    /// Transport task ended without `ReconnectFailed` (e.g. reconnection
    /// disabled). A later `connect()` may open a fresh one.
    fn on_transport_finished(&mut self) {
        if let Some(active) = self.transport.take() {
            log::debug!("[dashboard-link] Transport finished (gen={})", active.generation);
            let mut session = self.session.lock();
            if session.is_current(active.generation)
                && session.state() != ConnectionState::Error
            {
                session.stats.freeze_uptime(Instant::now());
                session.transition(ConnectionState::Disconnected);
            }
        }
        self.probe_deadline = None;
        self.pending_probes.clear();
    }

    async fn on_connected(&mut self, reconnect_attempt: Option<u32>) {
        let now = Instant::now();
        self.pending_probes.clear();
        {
            let mut session = self.session.lock();
            if reconnect_attempt.is_some() {
                session.stats.record_reconnection(now_ms());
            }
            session.stats.mark_connected(now);
            session.transition(ConnectionState::Connected);
        }
        self.schedule_probe(now);

        if let Some(active) = &self.transport {
            let sent = self.subscriptions.replay_all(active.handle.as_ref());
            self.session.lock().stats.record_sent_n(sent as u64);
        }

        match reconnect_attempt {
            Some(attempt) => {
                log::info!("[dashboard-link] Reconnected (attempt {})", attempt);
                self.emit(EventKind::Reconnected, json!({ "attempt": attempt }))
                    .await;
            },
            None => {
                log::info!("[dashboard-link] Connected to {}", self.url);
                self.emit(EventKind::Connected, JsonValue::Null).await;
            },
        }
    }

    async fn on_frame(&mut self, frame: InboundFrame) {
        let kind = frame.kind();
        self.session.lock().stats.record_received();
        if kind == EventKind::Pong {
            self.on_probe_reply(frame.probe_timestamp());
        }
        if let EventKind::Unknown(name) = &kind {
            log::debug!("[dashboard-link] Forwarding unrecognised frame type '{}'", name);
        }
        self.emit(kind, frame.data).await;
    }

    // ── liveness probe ──────────────────────────────────────────────────────

    /// Only a reply echoing a probe sent on this link counts as a sample.
    fn on_probe_reply(&mut self, echoed: Option<u64>) {
        let Some(sent_at) = echoed else {
            log::debug!("[dashboard-link] pong without timestamp");
            return;
        };
        match self.pending_probes.iter().position(|&t| t == sent_at) {
            Some(index) => {
                self.pending_probes.remove(index);
                self.session
                    .lock()
                    .latency
                    .record(now_ms().saturating_sub(sent_at));
            },
            None => log::debug!(
                "[dashboard-link] Ignoring pong for unknown probe (timestamp={})",
                sent_at
            ),
        }
    }

    fn schedule_probe(&mut self, from: Instant) {
        self.probe_deadline = if self.timeouts.probe_interval.is_zero() {
            None
        } else {
            Some(from + self.timeouts.probe_interval)
        };
    }

    fn on_probe_tick(&mut self) {
        let Some(active) = &self.transport else {
            self.probe_deadline = None;
            return;
        };
        {
            let session = self.session.lock();
            if !session.is_current(active.generation)
                || session.state() != ConnectionState::Connected
            {
                drop(session);
                self.probe_deadline = None;
                return;
            }
        }

        if active.handle.is_connected() {
            let timestamp = now_ms();
            if active.handle.send(&ClientMessage::Ping { timestamp }) {
                self.session.lock().stats.record_sent();
                if self.pending_probes.len() == MAX_PENDING_PROBES {
                    self.pending_probes.pop_front();
                }
                self.pending_probes.push_back(timestamp);
            }
        } else {
            log::debug!("[dashboard-link] Probe skipped: transport not connected");
        }
        self.schedule_probe(Instant::now());
    }

    // ── helpers ─────────────────────────────────────────────────────────────

    fn drop_transport(&mut self) {
        if let Some(active) = self.transport.take() {
            active.handle.close();
        }
        self.probe_deadline = None;
        self.pending_probes.clear();
    }

    async fn emit(&self, kind: EventKind, payload: JsonValue) {
        if self.dispatch_tx.send((kind, payload)).await.is_err() {
            log::debug!("[dashboard-link] Event dispatcher gone, dropping event");
        }
    }
}

//! Realtime dashboard client with builder pattern.
//!
//! [`RealtimeClient`] is the single entry point the rest of an application
//! uses for live dashboard updates. The realtime channel is optional: none
//! of its methods fail because the server is unreachable. Connectivity is
//! observed through [`get_state`](RealtimeClient::get_state),
//! [`state_changes`](RealtimeClient::state_changes) and the
//! `connection-error` event.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::{
    connection::{
        machine::{Command, ConnectionMachine},
        resolve_ws_url,
        session::{Session, SharedSession},
        ArcConnector, WsConnector,
    },
    credentials::ArcCredentialStore,
    error::{LinkError, Result},
    event_bus::{spawn_dispatcher, EventBus, Listener},
    invalidation::ArcInvalidationSink,
    models::{ConnectionOptions, ConnectionState, EventKind, Stats, SubscriptionInfo, Topic},
    timeouts::LinkTimeouts,
};

/// Realtime dashboard client.
///
/// Construct one per application with [`RealtimeClientBuilder`] and share it
/// by reference (or inside an `Arc`). Dropping the client tears the
/// connection down.
///
/// # Examples
///
/// ```rust,no_run
/// use dashboard_link::{listener, MemoryCredentialStore, RealtimeClient};
/// use std::sync::Arc;
///
/// # async fn example() -> dashboard_link::Result<()> {
/// let credentials = Arc::new(MemoryCredentialStore::with_token("eyJhbGc..."));
/// let client = RealtimeClient::builder()
///     .url("https://api.example.com/realtime")
///     .credential_store(credentials)
///     .build()?;
///
/// client.on("order-event", listener(|order| println!("order: {}", order)));
/// client.subscribe_to_orders("merchant-42")?;
/// client.connect().await;
/// # Ok(())
/// # }
/// ```
pub struct RealtimeClient {
    url: String,
    credentials: ArcCredentialStore,
    session: SharedSession,
    bus: EventBus,
    cmd_tx: mpsc::UnboundedSender<Command>,
    _machine: JoinHandle<()>,
    _dispatcher: JoinHandle<()>,
}

impl std::fmt::Debug for RealtimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeClient")
            .field("url", &self.url)
            .field("state", &self.get_state())
            .finish()
    }
}

impl RealtimeClient {
    /// Create a new builder for configuring the client
    pub fn builder() -> RealtimeClientBuilder {
        RealtimeClientBuilder::new()
    }

    /// Resolved WebSocket URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Open the realtime connection.
    ///
    /// Looks the token up in the credential store; this is the only await.
    /// With no token the call is a no-op and the state stays
    /// `Disconnected`. Calling it while already connecting or connected
    /// does not open a second transport.
    pub async fn connect(&self) {
        let generation = {
            let session = self.session.lock();
            if session.state().is_active() {
                log::debug!("[dashboard-link] connect() ignored while {}", session.state());
                return;
            }
            session.generation()
        };

        let token = match self.credentials.get_token().await {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => {
                log::debug!("[dashboard-link] No token available, staying disconnected");
                return;
            },
            Err(e) => {
                log::warn!("[dashboard-link] Credential lookup failed: {}", e);
                return;
            },
        };

        self.send_command(Command::Connect { token, generation });
    }

    /// Connect unless already connected.
    pub async fn ensure_connection(&self) {
        if !self.is_connected() {
            self.connect().await;
        }
    }

    /// Tear the connection down.
    ///
    /// The state is `Disconnected` as soon as this returns. Pending probe
    /// and reconnection timers never fire afterwards. The subscription set
    /// and counters are kept, so a later [`connect`](Self::connect) replays
    /// every topic requested so far.
    pub fn disconnect(&self) {
        self.session.lock().end_epoch(Instant::now());
        self.send_command(Command::Disconnect);
    }

    /// Ask for live updates on `topic` for `subject_id` (the merchant or
    /// session identifier).
    ///
    /// Sent immediately when connected, and replayed after every
    /// (re)connection. Requesting the same topic again is allowed and
    /// re-sends it.
    pub fn subscribe_to(&self, topic: Topic, subject_id: &str) -> Result<()> {
        let subject_id = subject_id.trim();
        if subject_id.is_empty() {
            return Err(LinkError::InvalidSubject(format!(
                "subject id for topic '{}' must not be empty",
                topic
            )));
        }
        self.send_command(Command::Subscribe {
            topic,
            subject_id: subject_id.to_string(),
        });
        Ok(())
    }

    /// Like [`subscribe_to`](Self::subscribe_to), with the topic given by
    /// name (`"orders"`, `"metrics"`, ...).
    pub fn subscribe_to_named(&self, topic: &str, subject_id: &str) -> Result<()> {
        self.subscribe_to(topic.parse()?, subject_id)
    }

    pub fn subscribe_to_metrics(&self, subject_id: &str) -> Result<()> {
        self.subscribe_to(Topic::Metrics, subject_id)
    }

    pub fn subscribe_to_orders(&self, subject_id: &str) -> Result<()> {
        self.subscribe_to(Topic::Orders, subject_id)
    }

    pub fn subscribe_to_cashback(&self, subject_id: &str) -> Result<()> {
        self.subscribe_to(Topic::Cashback, subject_id)
    }

    pub fn subscribe_to_products(&self, subject_id: &str) -> Result<()> {
        self.subscribe_to(Topic::Products, subject_id)
    }

    pub fn subscribe_to_notifications(&self, subject_id: &str) -> Result<()> {
        self.subscribe_to(Topic::Notifications, subject_id)
    }

    /// Topics requested so far.
    pub async fn subscriptions(&self) -> Vec<SubscriptionInfo> {
        let (result_tx, result_rx) = oneshot::channel();
        self.send_command(Command::ListSubscriptions { result_tx });
        result_rx.await.unwrap_or_default()
    }

    /// Register `listener` for `event` (an [`EventKind`] or its name).
    pub fn on(&self, event: impl Into<EventKind>, listener: Listener) {
        self.bus.on(event.into(), listener);
    }

    /// Remove the first registration of `listener` for `event`.
    pub fn off(&self, event: impl Into<EventKind>, listener: &Listener) -> bool {
        self.bus.off(&event.into(), listener)
    }

    /// The listener registry, e.g. to hand to UI components.
    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn get_state(&self) -> ConnectionState {
        self.session.lock().state()
    }

    pub fn is_connected(&self) -> bool {
        self.get_state() == ConnectionState::Connected
    }

    /// Snapshot of the connection counters.
    pub fn get_stats(&self) -> Stats {
        self.session.lock().snapshot(Instant::now())
    }

    /// Watch channel following every state transition.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.session.lock().subscribe_state()
    }

    fn send_command(&self, cmd: Command) {
        if self.cmd_tx.send(cmd).is_err() {
            log::warn!("[dashboard-link] Connection task is gone; command dropped");
        }
    }
}

/// Builder for configuring [`RealtimeClient`] instances.
pub struct RealtimeClientBuilder {
    url: Option<String>,
    credentials: Option<ArcCredentialStore>,
    connector: Option<ArcConnector>,
    connection_options: ConnectionOptions,
    timeouts: LinkTimeouts,
    invalidation_sink: Option<ArcInvalidationSink>,
}

impl RealtimeClientBuilder {
    fn new() -> Self {
        Self {
            url: None,
            credentials: None,
            connector: None,
            connection_options: ConnectionOptions::default(),
            timeouts: LinkTimeouts::default(),
            invalidation_sink: None,
        }
    }

    /// Server URL (`http(s)://` or `ws(s)://`).
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Where tokens come from on every `connect()`.
    pub fn credential_store(mut self, store: ArcCredentialStore) -> Self {
        self.credentials = Some(store);
        self
    }

    /// Replace the WebSocket transport (mainly for tests).
    pub fn connector(mut self, connector: ArcConnector) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Set the reconnection policy and event buffer size
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use dashboard_link::{ConnectionOptions, RealtimeClient};
    /// # use std::sync::Arc;
    ///
    /// # async fn example() -> dashboard_link::Result<()> {
    /// # let store = Arc::new(dashboard_link::MemoryCredentialStore::new());
    /// let client = RealtimeClient::builder()
    ///     .url("http://localhost:3000")
    ///     .credential_store(store)
    ///     .connection_options(
    ///         ConnectionOptions::new()
    ///             .with_max_reconnect_attempts(Some(5))
    ///             .with_max_reconnect_delay_ms(10_000),
    ///     )
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn connection_options(mut self, options: ConnectionOptions) -> Self {
        self.connection_options = options;
        self
    }

    pub fn timeouts(mut self, timeouts: LinkTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Notified with a cache key before listeners run for data events.
    pub fn invalidation_sink(mut self, sink: ArcInvalidationSink) -> Self {
        self.invalidation_sink = Some(sink);
        self
    }

    /// Build the client and start its background tasks.
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Result<RealtimeClient> {
        let url = self
            .url
            .ok_or_else(|| LinkError::ConfigurationError("url is required".into()))?;
        let url = resolve_ws_url(&url)?;
        let credentials = self.credentials.ok_or_else(|| {
            LinkError::ConfigurationError("credential_store is required".into())
        })?;
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(LinkError::ConfigurationError(
                "RealtimeClient must be built inside a tokio runtime".into(),
            ));
        }

        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(WsConnector::new()) as ArcConnector);
        let capacity = self.connection_options.event_buffer_capacity.max(1);

        let session = Session::shared();
        let bus = EventBus::new();
        let (dispatch_tx, dispatch_rx) = mpsc::channel(capacity);
        let dispatcher = spawn_dispatcher(bus.clone(), self.invalidation_sink, dispatch_rx);

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let machine = ConnectionMachine::new(
            url.clone(),
            self.connection_options,
            self.timeouts,
            connector,
            session.clone(),
            dispatch_tx,
        )
        .spawn(cmd_rx);

        log::debug!("[dashboard-link] Client created for {}", url);
        Ok(RealtimeClient {
            url,
            credentials,
            session,
            bus,
            cmd_tx,
            _machine: machine,
            _dispatcher: dispatcher,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentialStore;

    fn store() -> ArcCredentialStore {
        Arc::new(MemoryCredentialStore::new())
    }

    #[tokio::test]
    async fn test_builder_pattern() {
        let client = RealtimeClient::builder()
            .url("https://api.example.com/realtime")
            .credential_store(store())
            .timeouts(LinkTimeouts::fast())
            .build()
            .unwrap();

        assert_eq!(client.url(), "wss://api.example.com/realtime");
        assert_eq!(client.get_state(), ConnectionState::Disconnected);
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_builder_missing_url() {
        let result = RealtimeClient::builder().credential_store(store()).build();
        assert!(matches!(result, Err(LinkError::ConfigurationError(_))));
    }

    #[tokio::test]
    async fn test_builder_missing_credentials() {
        let result = RealtimeClient::builder().url("http://localhost:3000").build();
        assert!(matches!(result, Err(LinkError::ConfigurationError(_))));
    }

    #[test]
    fn test_builder_requires_runtime() {
        let result = RealtimeClient::builder()
            .url("http://localhost:3000")
            .credential_store(store())
            .build();
        assert!(matches!(result, Err(LinkError::ConfigurationError(_))));
    }

    #[tokio::test]
    async fn test_subscribe_rejects_programming_errors() {
        let client = RealtimeClient::builder()
            .url("http://localhost:3000")
            .credential_store(store())
            .build()
            .unwrap();

        assert!(matches!(
            client.subscribe_to_orders("   "),
            Err(LinkError::InvalidSubject(_))
        ));
        assert!(matches!(
            client.subscribe_to_named("weather", "m-1"),
            Err(LinkError::InvalidTopic(_))
        ));
        assert!(client.subscribe_to_named("Orders", "m-1").is_ok());
    }
}

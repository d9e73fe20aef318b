//! # dashboard-link
//!
//! Realtime synchronization client for merchant dashboards.
//!
//! One [`RealtimeClient`] per application keeps a WebSocket open to the
//! dashboard server, replays the requested topics after every
//! (re)connection, measures round-trip latency with periodic probes and fans
//! server-pushed events out to registered listeners.
//!
//! The realtime channel is an optional enhancement over plain request /
//! response calls, so connectivity failures never surface as errors: they
//! show up as [`ConnectionState`] transitions and `connection-error` events.
//!
//! ## Example
//!
//! ```rust,no_run
//! use dashboard_link::{listener, EventKind, MemoryCredentialStore, RealtimeClient};
//! use std::sync::Arc;
//!
//! # async fn example() -> dashboard_link::Result<()> {
//! let credentials = Arc::new(MemoryCredentialStore::with_token("eyJhbGc..."));
//! let client = RealtimeClient::builder()
//!     .url("https://api.example.com/realtime")
//!     .credential_store(credentials)
//!     .build()?;
//!
//! client.on(EventKind::MetricsUpdated, listener(|metrics| println!("{}", metrics)));
//! client.subscribe_to_metrics("merchant-42")?;
//! client.connect().await;
//!
//! let stats = client.get_stats();
//! println!("avg latency: {:.1}ms", stats.average_latency_ms);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod connection;
pub mod credentials;
pub mod error;
pub mod event_bus;
pub mod invalidation;
pub mod latency;
pub mod models;
pub mod stats;
pub mod subscription;
pub mod timeouts;

pub use client::{RealtimeClient, RealtimeClientBuilder};
pub use connection::{
    resolve_ws_url, ArcConnector, Connector, OpenRequest, TransportEvent, TransportHandle,
    WsConnector,
};
pub use credentials::{ArcCredentialStore, CredentialStore, MemoryCredentialStore, Token};
pub use error::{LinkError, Result};
pub use event_bus::{listener, EventBus, Listener};
pub use invalidation::{ArcInvalidationSink, InvalidationSink};
pub use latency::LatencyTracker;
pub use models::{
    ClientMessage, ConnectionError, ConnectionOptions, ConnectionState, DisconnectReason,
    EventKind, InboundFrame, Stats, SubscriptionInfo, Topic,
};
pub use stats::StatsAggregator;
pub use subscription::{RequestOutcome, SubscriptionManager};
pub use timeouts::{LinkTimeouts, LinkTimeoutsBuilder};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

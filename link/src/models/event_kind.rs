use std::fmt;

/// Name of an event delivered through the [`EventBus`](crate::EventBus).
///
/// Covers every inbound frame type the server is known to push, the local
/// lifecycle notifications raised by the state machine, and an
/// [`Unknown`](EventKind::Unknown) fallback so frames added server-side
/// later still reach listeners registered under their raw name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    // ── inbound frames ──────────────────────────────────────────────
    /// Full dashboard snapshot pushed right after subscribing.
    InitialState,
    MetricsUpdated,
    OverviewUpdated,
    OrderEvent,
    CashbackEvent,
    ProductEvent,
    SystemNotification,
    BulkOperationProgress,
    BulkOperationCompleted,
    /// Reply to a liveness probe.
    Pong,
    /// Server-side `error` frame.
    SocketError,

    // ── local lifecycle ─────────────────────────────────────────────
    Connected,
    Disconnected,
    Reconnecting,
    Reconnected,
    /// Transport-level connect/handshake failure.
    ConnectionError,

    /// Any frame type not listed above, keyed by its raw name.
    Unknown(String),
}

impl EventKind {
    /// Classify a frame `type` received from the server.
    ///
    /// Never fails: unrecognised names map to [`EventKind::Unknown`].
    /// A server frame named like a client-side notification (see
    /// [`EventKind::is_reserved_name`]) also lands in `Unknown` and cannot
    /// be reached by that name through [`EventKind::from`].
    pub fn from_wire(name: &str) -> Self {
        if Self::is_reserved_name(name) {
            log::debug!(
                "[dashboard-link] Server frame uses reserved event name '{}'; not routed to lifecycle listeners",
                name
            );
        }
        match name {
            "initial-state" => EventKind::InitialState,
            "metrics-updated" => EventKind::MetricsUpdated,
            "overview-updated" => EventKind::OverviewUpdated,
            "order-event" => EventKind::OrderEvent,
            "cashback-event" => EventKind::CashbackEvent,
            "product-event" => EventKind::ProductEvent,
            "system-notification" => EventKind::SystemNotification,
            "bulk-operation-progress" => EventKind::BulkOperationProgress,
            "bulk-operation-completed" => EventKind::BulkOperationCompleted,
            "pong" => EventKind::Pong,
            "error" => EventKind::SocketError,
            other => EventKind::Unknown(other.to_string()),
        }
    }

    /// Names produced by the client itself rather than by server frames.
    pub fn is_reserved_name(name: &str) -> bool {
        matches!(
            name,
            "socket-error"
                | "connected"
                | "disconnected"
                | "reconnecting"
                | "reconnected"
                | "connection-error"
        )
    }

    /// Listener-facing name of the event.
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::InitialState => "initial-state",
            EventKind::MetricsUpdated => "metrics-updated",
            EventKind::OverviewUpdated => "overview-updated",
            EventKind::OrderEvent => "order-event",
            EventKind::CashbackEvent => "cashback-event",
            EventKind::ProductEvent => "product-event",
            EventKind::SystemNotification => "system-notification",
            EventKind::BulkOperationProgress => "bulk-operation-progress",
            EventKind::BulkOperationCompleted => "bulk-operation-completed",
            EventKind::Pong => "pong",
            EventKind::SocketError => "socket-error",
            EventKind::Connected => "connected",
            EventKind::Disconnected => "disconnected",
            EventKind::Reconnecting => "reconnecting",
            EventKind::Reconnected => "reconnected",
            EventKind::ConnectionError => "connection-error",
            EventKind::Unknown(name) => name,
        }
    }

    /// Cache key the host app should invalidate when this event arrives.
    pub fn cache_key(&self) -> Option<&'static str> {
        match self {
            EventKind::InitialState | EventKind::OverviewUpdated => Some("dashboard"),
            EventKind::MetricsUpdated => Some("metrics"),
            EventKind::OrderEvent => Some("orders"),
            EventKind::CashbackEvent => Some("cashback"),
            EventKind::ProductEvent | EventKind::BulkOperationCompleted => Some("products"),
            EventKind::SystemNotification => Some("notifications"),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for EventKind {
    /// Resolve a listener-facing name (e.g. `"connection-error"`).
    ///
    /// Reserved names always resolve to the client-side notification, so a
    /// listener registered as `"connected"` never sees a server frame whose
    /// `type` is `"connected"`.
    fn from(name: &str) -> Self {
        match name {
            "socket-error" => EventKind::SocketError,
            "connected" => EventKind::Connected,
            "disconnected" => EventKind::Disconnected,
            "reconnecting" => EventKind::Reconnecting,
            "reconnected" => EventKind::Reconnected,
            "connection-error" => EventKind::ConnectionError,
            other => EventKind::from_wire(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_wire_known_names() {
        assert_eq!(EventKind::from_wire("order-event"), EventKind::OrderEvent);
        assert_eq!(EventKind::from_wire("pong"), EventKind::Pong);
        assert_eq!(EventKind::from_wire("error"), EventKind::SocketError);
        assert_eq!(
            EventKind::from_wire("bulk-operation-completed"),
            EventKind::BulkOperationCompleted
        );
    }

    #[test]
    fn test_unknown_names_are_preserved() {
        let kind = EventKind::from_wire("loyalty-event");
        assert_eq!(kind, EventKind::Unknown("loyalty-event".to_string()));
        assert_eq!(kind.as_str(), "loyalty-event");
        assert_eq!(EventKind::from("loyalty-event"), kind);
    }

    #[test]
    fn test_listener_names_resolve_both_ways() {
        for kind in [
            EventKind::InitialState,
            EventKind::CashbackEvent,
            EventKind::SocketError,
            EventKind::ConnectionError,
            EventKind::Reconnected,
        ] {
            assert_eq!(EventKind::from(kind.as_str()), kind);
        }
    }

    #[test]
    fn test_cache_keys() {
        assert_eq!(EventKind::OrderEvent.cache_key(), Some("orders"));
        assert_eq!(EventKind::OverviewUpdated.cache_key(), Some("dashboard"));
        assert_eq!(EventKind::Pong.cache_key(), None);
        assert_eq!(EventKind::Connected.cache_key(), None);
    }

    #[test]
    fn test_reserved_names_from_server_stay_unknown() {
        for name in ["connected", "disconnected", "connection-error", "socket-error"] {
            assert!(EventKind::is_reserved_name(name));
            assert_eq!(EventKind::from_wire(name), EventKind::Unknown(name.to_string()));
            assert_ne!(EventKind::from(name), EventKind::from_wire(name));
        }
        assert!(!EventKind::is_reserved_name("pong"));
        assert!(!EventKind::is_reserved_name("loyalty-event"));
    }
}

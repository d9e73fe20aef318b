use serde::{Deserialize, Serialize};

/// Point-in-time copy of the realtime client's counters.
///
/// Obtained from [`RealtimeClient::get_stats()`](crate::RealtimeClient::get_stats).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Frames written to the transport (probes and subscribe requests).
    pub messages_sent: u64,
    /// Frames received from the server.
    pub messages_received: u64,
    /// Successful reconnections since the client was built.
    pub reconnection_count: u64,
    /// Millis since Unix epoch of the last successful reconnection.
    pub last_reconnection_at_ms: Option<u64>,
    /// Time spent connected in the current cycle (live while connected,
    /// frozen otherwise, reset by each new `connect()`).
    pub connection_uptime_ms: u64,
    /// Rolling mean of the last probe round-trips, `0.0` with no samples.
    pub average_latency_ms: f64,
    /// Distinct topics requested since the client was built.
    pub subscription_count: u64,
}

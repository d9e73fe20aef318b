//! Counters behind [`RealtimeClient::get_stats()`](crate::RealtimeClient::get_stats).

use std::time::Duration;
use tokio::time::Instant;

use crate::models::Stats;

/// Aggregates traffic, reconnection and uptime counters.
///
/// Counters only grow for the lifetime of the client. Uptime is the one
/// exception: [`begin_cycle`](Self::begin_cycle) resets it on every new
/// `connect()`.
#[derive(Debug, Default, Clone)]
pub struct StatsAggregator {
    messages_sent: u64,
    messages_received: u64,
    reconnection_count: u64,
    last_reconnection_at_ms: Option<u64>,
    subscription_count: u64,
    connected_since: Option<Instant>,
    frozen_uptime: Duration,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sent(&mut self) {
        self.messages_sent += 1;
    }

    pub fn record_sent_n(&mut self, count: u64) {
        self.messages_sent += count;
    }

    pub fn record_received(&mut self) {
        self.messages_received += 1;
    }

    /// A topic entered the subscription set for the first time.
    pub fn record_subscription(&mut self) {
        self.subscription_count += 1;
    }

    /// A reconnection succeeded at `at_ms` (millis since Unix epoch).
    pub fn record_reconnection(&mut self, at_ms: u64) {
        self.reconnection_count += 1;
        self.last_reconnection_at_ms = Some(at_ms);
    }

    /// Start a new connection cycle: uptime back to zero.
    pub fn begin_cycle(&mut self) {
        self.connected_since = None;
        self.frozen_uptime = Duration::ZERO;
    }

    /// The transport is (again) connected as of `now`.
    pub fn mark_connected(&mut self, now: Instant) {
        self.connected_since = Some(now);
    }

    /// The transport went away; keep the uptime reached so far.
    pub fn freeze_uptime(&mut self, now: Instant) {
        if let Some(since) = self.connected_since.take() {
            self.frozen_uptime = now.saturating_duration_since(since);
        }
    }

    pub fn uptime(&self, now: Instant) -> Duration {
        match self.connected_since {
            Some(since) => now.saturating_duration_since(since),
            None => self.frozen_uptime,
        }
    }

    /// Value copy of every counter as of `now`.
    pub fn snapshot(&self, now: Instant, average_latency_ms: f64) -> Stats {
        Stats {
            messages_sent: self.messages_sent,
            messages_received: self.messages_received,
            reconnection_count: self.reconnection_count,
            last_reconnection_at_ms: self.last_reconnection_at_ms,
            connection_uptime_ms: self.uptime(now).as_millis() as u64,
            average_latency_ms,
            subscription_count: self.subscription_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let mut stats = StatsAggregator::new();
        stats.record_sent();
        stats.record_sent();
        stats.record_received();
        stats.record_subscription();

        let snap = stats.snapshot(Instant::now(), 12.5);
        assert_eq!(snap.messages_sent, 2);
        assert_eq!(snap.messages_received, 1);
        assert_eq!(snap.subscription_count, 1);
        assert_eq!(snap.average_latency_ms, 12.5);
        assert_eq!(snap.reconnection_count, 0);
        assert_eq!(snap.last_reconnection_at_ms, None);
    }

    #[test]
    fn test_uptime_is_live_then_frozen() {
        let mut stats = StatsAggregator::new();
        let start = Instant::now();
        stats.mark_connected(start);

        let later = start + Duration::from_millis(1500);
        assert_eq!(stats.snapshot(later, 0.0).connection_uptime_ms, 1500);

        stats.freeze_uptime(later);
        let much_later = later + Duration::from_secs(60);
        assert_eq!(stats.snapshot(much_later, 0.0).connection_uptime_ms, 1500);
    }

    #[test]
    fn test_begin_cycle_resets_only_uptime() {
        let mut stats = StatsAggregator::new();
        let start = Instant::now();
        stats.mark_connected(start);
        stats.record_sent();
        stats.record_reconnection(1_700_000_000_000);
        stats.freeze_uptime(start + Duration::from_secs(5));

        stats.begin_cycle();
        let snap = stats.snapshot(start + Duration::from_secs(10), 0.0);
        assert_eq!(snap.connection_uptime_ms, 0);
        assert_eq!(snap.messages_sent, 1);
        assert_eq!(snap.reconnection_count, 1);
        assert_eq!(snap.last_reconnection_at_ms, Some(1_700_000_000_000));
    }

    #[test]
    fn test_freeze_without_connection_keeps_previous_value() {
        let mut stats = StatsAggregator::new();
        let now = Instant::now();
        stats.freeze_uptime(now);
        assert_eq!(stats.uptime(now), Duration::ZERO);
    }
}

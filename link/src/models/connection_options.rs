use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection-level options for the realtime transport.
///
/// These options control:
/// - Automatic reconnection on connection loss
/// - Reconnection timing and retry limits
/// - Buffering between the transport and event listeners
///
/// Every field has a serde default, so a partial JSON object from the host
/// app's config is enough.
///
/// # Example
///
/// ```rust
/// use dashboard_link::ConnectionOptions;
///
/// let options = ConnectionOptions::default()
///     .with_auto_reconnect(true)
///     .with_reconnect_delay_ms(1000)
///     .with_max_reconnect_attempts(Some(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionOptions {
    /// Enable automatic reconnection on connection loss
    /// Default: true
    #[serde(default = "default_auto_reconnect")]
    pub auto_reconnect: bool,

    /// Initial delay in milliseconds before the first reconnection attempt
    /// Default: 2000ms. Doubles per attempt up to max_reconnect_delay_ms
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Maximum delay between reconnection attempts
    /// Default: 5000ms
    #[serde(default = "default_max_reconnect_delay_ms")]
    pub max_reconnect_delay_ms: u64,

    /// Maximum number of reconnection attempts before giving up
    /// Default: Some(3). None retries forever, Some(0) disables reconnection
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: Option<u32>,

    /// Capacity of the queue between the connection task and the listener
    /// dispatch task.
    /// Default: 1024
    #[serde(default = "default_event_buffer_capacity")]
    pub event_buffer_capacity: usize,
}

fn default_auto_reconnect() -> bool {
    true
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

fn default_max_reconnect_delay_ms() -> u64 {
    5000
}

fn default_max_reconnect_attempts() -> Option<u32> {
    Some(3)
}

fn default_event_buffer_capacity() -> usize {
    1024
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            auto_reconnect: default_auto_reconnect(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            max_reconnect_delay_ms: default_max_reconnect_delay_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            event_buffer_capacity: default_event_buffer_capacity(),
        }
    }
}

impl ConnectionOptions {
    /// Create new connection options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to automatically reconnect on connection loss
    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    /// Set the initial delay between reconnection attempts (in milliseconds)
    pub fn with_reconnect_delay_ms(mut self, delay_ms: u64) -> Self {
        self.reconnect_delay_ms = delay_ms;
        self
    }

    /// Set the maximum delay between reconnection attempts (in milliseconds)
    pub fn with_max_reconnect_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_reconnect_delay_ms = max_delay_ms;
        self
    }

    /// Set the maximum number of reconnection attempts
    /// Pass None for infinite retries, Some(0) to disable reconnection
    pub fn with_max_reconnect_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_reconnect_attempts = max_attempts;
        self
    }

    /// Set the listener queue capacity (minimum 1)
    pub fn with_event_buffer_capacity(mut self, capacity: usize) -> Self {
        self.event_buffer_capacity = capacity.max(1);
        self
    }

    /// Whether another reconnection attempt is allowed after `attempts_made`.
    pub fn allows_attempt(&self, attempts_made: u32) -> bool {
        self.auto_reconnect
            && self
                .max_reconnect_attempts
                .map_or(true, |max| attempts_made < max)
    }

    /// Backoff before reconnection attempt number `attempt` (1-based).
    ///
    /// Starts at `reconnect_delay_ms`, doubles per attempt, never exceeds
    /// `max_reconnect_delay_ms`.
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let delay = std::cmp::min(
            self.reconnect_delay_ms
                .saturating_mul(2u64.saturating_pow(exponent)),
            self.max_reconnect_delay_ms,
        );
        Duration::from_millis(delay)
    }
}

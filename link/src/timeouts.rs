//! Timeout configuration for the realtime client.
//!
//! Centralizes the handshake timeout and the liveness-probe period.

use std::time::Duration;

/// Timeout configuration for realtime client operations.
///
/// # Examples
///
/// ```rust
/// use dashboard_link::LinkTimeouts;
/// use std::time::Duration;
///
/// // Use defaults (30s liveness probe, 10s handshake)
/// let timeouts = LinkTimeouts::default();
///
/// // Custom timeouts
/// let timeouts = LinkTimeouts::builder()
///     .connection_timeout(Duration::from_secs(20))
///     .probe_interval_secs(15)
///     .build();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTimeouts {
    /// Timeout for establishing the transport (TCP + TLS + WebSocket upgrade).
    /// Default: 10 seconds
    pub connection_timeout: Duration,

    /// Period of the liveness probe sent while connected.
    /// Set to 0 to disable probing.
    /// Default: 30 seconds
    pub probe_interval: Duration,
}

impl Default for LinkTimeouts {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_secs(10),
            probe_interval: Duration::from_secs(30),
        }
    }
}

impl LinkTimeouts {
    /// Create a new builder for custom timeout configuration.
    pub fn builder() -> LinkTimeoutsBuilder {
        LinkTimeoutsBuilder::new()
    }

    /// Short timeouts for local development servers.
    pub fn fast() -> Self {
        Self {
            connection_timeout: Duration::from_secs(2),
            probe_interval: Duration::from_secs(10),
        }
    }

    /// Long timeouts for slow or unreliable mobile networks.
    pub fn relaxed() -> Self {
        Self {
            connection_timeout: Duration::from_secs(30),
            probe_interval: Duration::from_secs(60),
        }
    }

    /// Check if a duration represents "no timeout" (zero or very large).
    pub fn is_no_timeout(duration: Duration) -> bool {
        duration.is_zero() || duration > Duration::from_secs(86400 * 365) // > 1 year
    }
}

/// Builder for creating custom [`LinkTimeouts`] configurations.
#[derive(Debug, Clone)]
pub struct LinkTimeoutsBuilder {
    timeouts: LinkTimeouts,
}

impl LinkTimeoutsBuilder {
    fn new() -> Self {
        Self {
            timeouts: LinkTimeouts::default(),
        }
    }

    /// Set the connection timeout.
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connection_timeout = timeout;
        self
    }

    /// Set the connection timeout in seconds.
    pub fn connection_timeout_secs(self, secs: u64) -> Self {
        self.connection_timeout(Duration::from_secs(secs))
    }

    /// Set the liveness-probe period.
    /// Set to 0 to disable probing.
    pub fn probe_interval(mut self, interval: Duration) -> Self {
        self.timeouts.probe_interval = interval;
        self
    }

    /// Set the liveness-probe period in seconds.
    pub fn probe_interval_secs(self, secs: u64) -> Self {
        self.probe_interval(Duration::from_secs(secs))
    }

    /// Build the timeout configuration.
    pub fn build(self) -> LinkTimeouts {
        self.timeouts
    }
}

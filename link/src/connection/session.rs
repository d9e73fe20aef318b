//! State shared between the public facade and the connection task.
//!
//! Holds the authoritative [`ConnectionState`], the generation counter that
//! invalidates stale work, and the counters behind `get_stats()`. Every
//! access is a short critical section; no await happens under the lock.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::{
    latency::LatencyTracker,
    models::{ConnectionState, Stats},
    stats::StatsAggregator,
};

pub(crate) type SharedSession = Arc<Mutex<Session>>;

pub(crate) struct Session {
    state: ConnectionState,
    /// Bumped each time a transport is opened and on every `disconnect()`.
    /// Work captured under an older generation must not touch the session.
    generation: u64,
    pub(crate) stats: StatsAggregator,
    pub(crate) latency: LatencyTracker,
    state_tx: watch::Sender<ConnectionState>,
}

impl Session {
    pub(crate) fn new() -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            state: ConnectionState::Disconnected,
            generation: 0,
            stats: StatsAggregator::new(),
            latency: LatencyTracker::new(),
            state_tx,
        }
    }

    pub(crate) fn shared() -> SharedSession {
        Arc::new(Mutex::new(Self::new()))
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.state
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Move to `to`, notifying state watchers on change.
    pub(crate) fn transition(&mut self, to: ConnectionState) {
        if self.state == to {
            return;
        }
        log::debug!("[dashboard-link] State {} -> {}", self.state, to);
        self.state = to;
        self.state_tx.send_replace(to);
    }

    /// Start a new connection epoch and return its generation.
    pub(crate) fn begin_epoch(&mut self) -> u64 {
        self.generation += 1;
        self.stats.begin_cycle();
        self.transition(ConnectionState::Connecting);
        self.generation
    }

    /// Invalidate the current epoch and go to `Disconnected`.
    pub(crate) fn end_epoch(&mut self, now: Instant) {
        self.generation += 1;
        self.stats.freeze_uptime(now);
        self.transition(ConnectionState::Disconnected);
    }

    pub(crate) fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    pub(crate) fn snapshot(&self, now: Instant) -> Stats {
        self.stats.snapshot(now, self.latency.average())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epochs_bump_generation() {
        let mut session = Session::new();
        let first = session.begin_epoch();
        assert_eq!(session.state(), ConnectionState::Connecting);
        assert!(session.is_current(first));

        session.end_epoch(Instant::now());
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert!(!session.is_current(first));

        let second = session.begin_epoch();
        assert!(second > first);
    }

    #[test]
    fn test_transition_notifies_watchers() {
        let mut session = Session::new();
        let rx = session.subscribe_state();
        session.transition(ConnectionState::Error);
        assert_eq!(*rx.borrow(), ConnectionState::Error);
        assert!(rx.has_changed().unwrap());
    }
}

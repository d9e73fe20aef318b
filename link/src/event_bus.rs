//! In-process pub/sub between the connection and UI listeners.
//!
//! Listeners register per [`EventKind`] and receive the event payload as
//! JSON:
//!
//! - [`on`](EventBus::on): append a listener (duplicates allowed, each one
//!   is invoked)
//! - [`off`](EventBus::off): remove the first registration of that exact
//!   listener
//! - [`emit`](EventBus::emit): invoke every listener for the event, in
//!   registration order
//!
//! Inside the client, events travel from the connection task to a
//! dedicated dispatch task over a bounded channel (see [`spawn_dispatcher`]),
//! so listener code never runs on the network path.
//!
//! # Example
//!
//! ```rust
//! use dashboard_link::{listener, EventBus, EventKind};
//! use serde_json::json;
//!
//! let bus = EventBus::new();
//! let on_order = listener(|payload| println!("order: {}", payload));
//! bus.on(EventKind::OrderEvent, on_order.clone());
//! bus.emit(&EventKind::OrderEvent, &json!({ "id": "o-1" }));
//! bus.off(&EventKind::OrderEvent, &on_order);
//! ```

use parking_lot::RwLock;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::invalidation::ArcInvalidationSink;
use crate::models::EventKind;

/// Callback invoked with an event payload.
///
/// Identity is the `Arc` allocation: keep a clone to [`off`](EventBus::off)
/// it later.
pub type Listener = Arc<dyn Fn(&JsonValue) + Send + Sync>;

/// Wrap a closure as a [`Listener`].
pub fn listener(f: impl Fn(&JsonValue) + Send + Sync + 'static) -> Listener {
    Arc::new(f)
}

/// Registry of listeners keyed by event name.
///
/// Cheap to clone; clones share the registry.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<RwLock<HashMap<EventKind, Vec<Listener>>>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.read();
        let counts: HashMap<&str, usize> =
            listeners.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `listener` to the list for `kind`.
    pub fn on(&self, kind: EventKind, listener: Listener) {
        self.listeners.write().entry(kind).or_default().push(listener);
    }

    /// Remove the first registration of `listener` for `kind`.
    ///
    /// Returns `false` when it was not registered.
    pub fn off(&self, kind: &EventKind, listener: &Listener) -> bool {
        let mut listeners = self.listeners.write();
        let Some(list) = listeners.get_mut(kind) else {
            return false;
        };
        let Some(pos) = list.iter().position(|l| Arc::ptr_eq(l, listener)) else {
            return false;
        };
        list.remove(pos);
        if list.is_empty() {
            listeners.remove(kind);
        }
        true
    }

    /// Number of registrations for `kind`.
    pub fn listener_count(&self, kind: &EventKind) -> usize {
        self.listeners.read().get(kind).map_or(0, Vec::len)
    }

    /// Invoke every listener registered for `kind`, in registration order.
    ///
    /// A panicking listener is logged and skipped; the remaining listeners
    /// still run and the panic does not escape. Listeners may call
    /// `on`/`off` re-entrantly; such changes apply from the next emit.
    ///
    /// Returns the number of listeners that completed normally.
    pub fn emit(&self, kind: &EventKind, payload: &JsonValue) -> usize {
        let snapshot: Vec<Listener> = match self.listeners.read().get(kind) {
            Some(list) => list.clone(),
            None => return 0,
        };

        let mut completed = 0;
        for (index, cb) in snapshot.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| cb(payload))) {
                Ok(()) => completed += 1,
                Err(panic) => {
                    log::warn!(
                        "[dashboard-link] Listener #{} for '{}' panicked: {}",
                        index,
                        kind,
                        panic_message(&*panic)
                    );
                },
            }
        }
        completed
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic>"
    }
}

/// An event queued for listener dispatch.
pub(crate) type Dispatch = (EventKind, JsonValue);

/// Spawn the task that drains queued events into `bus`.
///
/// Events are delivered strictly in queue order. The matching cache key is
/// invalidated on `sink` before listeners for that event run. The task ends
/// when every sender is dropped.
pub(crate) fn spawn_dispatcher(
    bus: EventBus,
    sink: Option<ArcInvalidationSink>,
    mut rx: mpsc::Receiver<Dispatch>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some((kind, payload)) = rx.recv().await {
            if let (Some(sink), Some(key)) = (&sink, kind.cache_key()) {
                if catch_unwind(AssertUnwindSafe(|| sink.invalidate(key))).is_err() {
                    log::warn!("[dashboard-link] Invalidation sink panicked for key '{}'", key);
                }
            }
            bus.emit(&kind, &payload);
        }
        log::debug!("[dashboard-link] Event dispatcher stopped");
    })
}

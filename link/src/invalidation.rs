//! Cache invalidation hook.
//!
//! The host app usually keeps a REST-backed cache of dashboard data. When a
//! realtime event makes part of it stale, the client calls
//! [`InvalidationSink::invalidate`] with a key from
//! [`EventKind::cache_key`](crate::EventKind::cache_key) before any listener
//! for that event runs.

use std::sync::Arc;

/// Receiver of cache-invalidation keys.
///
/// Keys: `dashboard`, `metrics`, `orders`, `cashback`, `products`,
/// `notifications`.
pub trait InvalidationSink: Send + Sync + 'static {
    fn invalidate(&self, key: &str);
}

/// A shared, reference-counted [`InvalidationSink`].
pub type ArcInvalidationSink = Arc<dyn InvalidationSink>;

impl<F> InvalidationSink for F
where
    F: Fn(&str) + Send + Sync + 'static,
{
    fn invalidate(&self, key: &str) {
        self(key)
    }
}

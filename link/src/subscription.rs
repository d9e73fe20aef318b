//! Topic subscription bookkeeping.
//!
//! The server forgets subscriptions whenever a connection drops, so the
//! client keeps the set of requested topics and replays it after every
//! (re)connection.

mod manager;

pub use manager::{RequestOutcome, SubscriptionManager};

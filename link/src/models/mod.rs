//! Data models for dashboard-link.
//!
//! Wire messages, event names, topics and the value types returned by the
//! public API.

pub mod client_message;
pub mod connection_error;
pub mod connection_options;
pub mod connection_state;
pub mod event_kind;
pub mod inbound_frame;
pub mod stats;
pub mod subscription_info;
pub mod topic;

pub use client_message::ClientMessage;
pub use connection_error::{ConnectionError, DisconnectReason};
pub use connection_options::ConnectionOptions;
pub use connection_state::ConnectionState;
pub use event_kind::EventKind;
pub use inbound_frame::InboundFrame;
pub use stats::Stats;
pub use subscription_info::SubscriptionInfo;
pub use topic::Topic;

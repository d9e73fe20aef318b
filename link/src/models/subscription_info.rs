//! Subscription metadata exposed to callers.
//!
//! [`SubscriptionInfo`] is a read-only snapshot of one entry of the
//! subscription set, useful for debugging, tests and diagnostics screens.

use serde::{Deserialize, Serialize};

use super::topic::Topic;

/// Read-only snapshot of a requested topic.
///
/// Returned by [`RealtimeClient::subscriptions()`](crate::RealtimeClient::subscriptions).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionInfo {
    /// Requested topic.
    pub topic: Topic,
    /// Subject the topic was last requested for.
    pub subject_id: String,
    /// Timestamp (millis since Unix epoch) of the first request.
    pub requested_at_ms: u64,
    /// Number of times the topic has been sent on the wire (initial
    /// request plus replays).
    pub wire_requests: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_info_serialize_roundtrip() {
        let info = SubscriptionInfo {
            topic: Topic::Cashback,
            subject_id: "m-7".to_string(),
            requested_at_ms: 1_700_000_000_000,
            wire_requests: 3,
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"topic\":\"cashback\""));
        let deserialized: SubscriptionInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, info);
    }
}

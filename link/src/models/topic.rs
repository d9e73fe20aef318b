use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LinkError;

/// Logical server-push channel a session can subscribe to.
///
/// The set is closed: the server only knows these five channels. Each
/// subscribe request also names a subject (merchant/session id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Dashboard metrics and overview figures.
    Metrics,
    /// Order lifecycle events.
    Orders,
    /// Cashback campaign events.
    Cashback,
    /// Product catalogue events.
    Products,
    /// System notifications addressed to the merchant.
    Notifications,
}

impl Topic {
    /// Every topic, in declaration order.
    pub const ALL: [Topic; 5] = [
        Topic::Metrics,
        Topic::Orders,
        Topic::Cashback,
        Topic::Products,
        Topic::Notifications,
    ];

    /// Wire name of the topic.
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Metrics => "metrics",
            Topic::Orders => "orders",
            Topic::Cashback => "cashback",
            Topic::Products => "products",
            Topic::Notifications => "notifications",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            // "dashboard" is the screen-level name for the metrics feed
            "metrics" | "dashboard" => Ok(Topic::Metrics),
            "orders" => Ok(Topic::Orders),
            "cashback" => Ok(Topic::Cashback),
            "products" => Ok(Topic::Products),
            "notifications" => Ok(Topic::Notifications),
            other => Err(LinkError::InvalidTopic(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_topics() {
        for topic in Topic::ALL {
            assert_eq!(topic.as_str().parse::<Topic>().unwrap(), topic);
        }
        assert_eq!(" Orders ".parse::<Topic>().unwrap(), Topic::Orders);
        assert_eq!("dashboard".parse::<Topic>().unwrap(), Topic::Metrics);
    }

    #[test]
    fn test_parse_unknown_topic_is_error() {
        let err = "inventory".parse::<Topic>().unwrap_err();
        assert_eq!(err, LinkError::InvalidTopic("inventory".to_string()));
    }

    #[test]
    fn test_serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&Topic::Cashback).unwrap(), "\"cashback\"");
        let topic: Topic = serde_json::from_str("\"notifications\"").unwrap();
        assert_eq!(topic, Topic::Notifications);
    }
}

//! Error types for dashboard-link.
//!
//! Connectivity problems never reach callers as errors: they show up as
//! [`ConnectionState`](crate::ConnectionState) transitions and bus events.
//! The variants below cover configuration and programming mistakes, and
//! failures reported by a host-provided credential store.

use thiserror::Error;

/// Result type for dashboard-link operations.
pub type Result<T> = std::result::Result<T, LinkError>;

/// Errors produced by the realtime client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Invalid topic: {0}")]
    InvalidTopic(String),

    #[error("Invalid subject id: {0}")]
    InvalidSubject(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Credential store error: {0}")]
    CredentialError(String),
}

impl From<serde_json::Error> for LinkError {
    fn from(err: serde_json::Error) -> Self {
        LinkError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_category() {
        let err = LinkError::InvalidTopic("inventory".to_string());
        assert_eq!(err.to_string(), "Invalid topic: inventory");

        let err = LinkError::CredentialError("keychain locked".to_string());
        assert_eq!(err.to_string(), "Credential store error: keychain locked");
    }

    #[test]
    fn test_from_serde_json_error() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: LinkError = parse_err.into();
        assert!(matches!(err, LinkError::SerializationError(_)));
    }
}

//! Credential storage abstraction for the realtime client.
//!
//! The realtime channel only ever borrows a bearer [`Token`] for the length of
//! one connection attempt. Where the token lives (keychain, secure storage,
//! an in-memory session after login) is up to the host application, which
//! implements [`CredentialStore`].
//!
//! ```rust,no_run
//! use dashboard_link::credentials::{CredentialStore, Token};
//!
//! struct KeychainStore;
//!
//! #[async_trait::async_trait]
//! impl CredentialStore for KeychainStore {
//!     async fn get_token(&self) -> dashboard_link::Result<Option<Token>> {
//!         Ok(Some(Token::new("eyJhbGc...")))
//!     }
//! }
//! ```

use crate::error::Result;
use parking_lot::RwLock;
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

/// Opaque bearer token passed to the transport at handshake time.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Wrap a raw token string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw token value, for building the `Authorization` header.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A blank token is treated the same as no token at all.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token(<{} bytes>)", self.0.len())
    }
}

impl From<String> for Token {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for Token {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Source of credentials for the realtime connection.
///
/// Called on every `connect()`. Returning `Ok(None)` is a normal state
/// (logged-out user) and leaves the client disconnected without any error.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Return the current bearer token, if any.
    async fn get_token(&self) -> Result<Option<Token>>;
}

/// A shared, reference-counted [`CredentialStore`].
pub type ArcCredentialStore = Arc<dyn CredentialStore>;

/// In-memory credential store for tests and short-lived sessions.
///
/// Holds a token plus an opaque session blob (user/merchant profile as
/// returned by the login endpoint). Nothing is persisted.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<Token>>,
    session: RwLock<Option<JsonValue>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a token.
    pub fn with_token(token: impl Into<Token>) -> Self {
        let store = Self::new();
        store.set_token(token);
        store
    }

    /// Replace the stored token.
    pub fn set_token(&self, token: impl Into<Token>) {
        *self.token.write() = Some(token.into());
    }

    /// Remove the stored token.
    pub fn clear_token(&self) {
        *self.token.write() = None;
    }

    /// Store the session blob.
    pub fn set_session(&self, session: JsonValue) {
        *self.session.write() = Some(session);
    }

    /// Current session blob, if any.
    pub fn session(&self) -> Option<JsonValue> {
        self.session.read().clone()
    }

    /// Forget both token and session (logout).
    pub fn clear(&self) {
        self.clear_token();
        *self.session.write() = None;
    }
}

#[async_trait::async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get_token(&self) -> Result<Option<Token>> {
        Ok(self.token.read().clone())
    }
}

//! Core traits and types for Kerberos single sign-on.
//!
//! This crate defines the narrow interfaces the identity stack talks through:
//! an [`Authenticator`] that performs the actual credential-verification
//! exchange, a [`CallbackHandler`] it drives for usernames and passwords, a
//! [`SessionCache`] that persists the established [`Identity`] for a session
//! lifetime, and an [`ObjectStore`] that resolves per-user storage buckets.
//! Concrete implementations live in the `kss-identity-*` crates or are
//! supplied by the deployment.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while resolving or mapping an identity.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The external login or logout exchange failed.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The authenticator asked for a callback kind this stack cannot answer.
    #[error("Unsupported callback: {0}")]
    UnsupportedCallback(String),

    /// No principal of the identity belongs to the configured realm.
    #[error("No principal matches realm {realm}")]
    IdentityMapping { realm: String },

    /// The session cache collaborator failed.
    #[error("Session error: {0}")]
    Session(String),

    /// The object store collaborator failed.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Fixed keys under which the stack stores values in a [`SessionCache`].
///
/// Invariant: a value under [`keys::BUCKET_NAME`] implies a matching value
/// under [`keys::IDENTITY`]; logout removes both.
pub mod keys {
    /// The established [`Identity`](super::Identity), serialized as JSON.
    pub const IDENTITY: &str = "kerberos.identity";

    /// The derived per-user bucket name.
    pub const BUCKET_NAME: &str = "kerberos.bucket-name";
}

/// A realm-qualified principal name, e.g. `alice@EXAMPLE.COM`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before the `@` separator, or the whole name if unqualified.
    pub fn local(&self) -> &str {
        match self.0.split_once('@') {
            Some((local, _)) => local,
            None => &self.0,
        }
    }

    /// The realm suffix after the `@` separator, if any.
    pub fn realm(&self) -> Option<&str> {
        self.0.split_once('@').map(|(_, realm)| realm)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// An authenticated subject: one or more principals plus whatever opaque
/// credential material the authenticator returned alongside them.
///
/// Immutable once established; serializable so a session cache can hold it
/// for the lifetime of the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub principals: Vec<Principal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_credentials: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_credentials: Option<serde_json::Value>,
}

impl Identity {
    pub fn new(principals: Vec<Principal>) -> Self {
        Self {
            principals,
            public_credentials: None,
            private_credentials: None,
        }
    }

    pub fn with_public_credentials(mut self, credentials: serde_json::Value) -> Self {
        self.public_credentials = Some(credentials);
        self
    }

    pub fn with_private_credentials(mut self, credentials: serde_json::Value) -> Self {
        self.private_credentials = Some(credentials);
        self
    }

    /// The first principal whose realm suffix equals `realm` exactly.
    pub fn principal_for_realm(&self, realm: &str) -> Option<&Principal> {
        self.principals.iter().find(|p| p.realm() == Some(realm))
    }
}

/// A username/secret pair supplied by the current request.
///
/// Ephemeral: held only for the duration of one authentication attempt and
/// never persisted. `Debug` redacts the secret.
#[derive(Clone)]
pub struct Credential {
    username: String,
    secret: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// A single callback request issued by an [`Authenticator`] during login.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CallbackRequest {
    /// The authenticator needs the username.
    Username,
    /// The authenticator needs the password.
    Password,
    /// A provider-specific callback kind this stack does not answer.
    Other(String),
}

/// The answer to one [`CallbackRequest`].
#[derive(Clone, PartialEq, Eq)]
pub enum CallbackResponse {
    Username(String),
    Password(String),
}

impl fmt::Debug for CallbackResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackResponse::Username(name) => {
                f.debug_tuple("Username").field(name).finish()
            }
            CallbackResponse::Password(_) => f.debug_tuple("Password").field(&"<redacted>").finish(),
        }
    }
}

/// Answers the callback requests an [`Authenticator`] issues while logging in.
///
/// Implementations resolve the answers from the current request's
/// [`Credential`] and must fail with [`AuthError::UnsupportedCallback`] for
/// any request kind other than username and password.
pub trait CallbackHandler: Send + Sync {
    fn handle(&self, requests: &[CallbackRequest]) -> AuthResult<Vec<CallbackResponse>>;
}

/// The external component performing the credential-verification exchange.
///
/// All network I/O of the authentication protocol happens behind this trait;
/// the resolver treats `login` as a plain blocking-style awaited call with no
/// timeout of its own.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// An identity the authenticator already holds from a prior exchange,
    /// if any. Must not perform a login.
    async fn established_identity(&self) -> AuthResult<Option<Identity>>;

    /// Perform a login, driving `handler` for the username and password.
    async fn login(&self, handler: &dyn CallbackHandler) -> AuthResult<Identity>;

    /// Tear down the established security context, if any.
    async fn logout(&self) -> AuthResult<()>;
}

/// Session-scoped key/value store backed by an external session store.
///
/// The external store owns the session lifetime and is assumed to serialize
/// access per session; this stack performs no locking of its own.
#[async_trait]
pub trait SessionCache: Send + Sync {
    async fn get(&self, key: &str) -> AuthResult<Option<serde_json::Value>>;
    async fn put(&self, key: &str, value: serde_json::Value) -> AuthResult<()>;
    async fn remove(&self, key: &str) -> AuthResult<()>;
}

/// A storage bucket resolved for an authenticated user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
}

impl Bucket {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// The external object-storage collaborator. Storage failures are surfaced
/// to the caller unrecovered.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_or_create_bucket(&self, name: &str) -> AuthResult<Bucket>;
}

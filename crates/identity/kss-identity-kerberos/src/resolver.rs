//! Authentication-state resolution.

use crate::handler::CredentialCallbackHandler;
use kss_auth_core::{
    AuthError, AuthResult, Authenticator, Credential, Identity, SessionCache, keys,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Resolves the authenticated identity for one inbound request.
///
/// One resolver is scoped to exactly one request and must not be reused
/// across requests; the [`SessionCache`] is the only state that outlives it.
/// Resolution order, short-circuiting on first success:
///
/// 1. the identity cached in the session,
/// 2. an identity the authenticator already established,
/// 3. a fresh login, but only when the caller asked for one.
pub struct IdentityResolver {
    authenticator: Arc<dyn Authenticator>,
    session: Arc<dyn SessionCache>,
    credential: Option<Credential>,
}

impl IdentityResolver {
    pub fn new(authenticator: Arc<dyn Authenticator>, session: Arc<dyn SessionCache>) -> Self {
        Self {
            authenticator,
            session,
            credential: None,
        }
    }

    /// Attach the credential supplied by the current request. Required for
    /// the login path; resolution without login works without it.
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// The identity currently cached in the session, if any.
    async fn cached_identity(&self) -> AuthResult<Option<Identity>> {
        match self.session.get(keys::IDENTITY).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Steps 1 and 2: session cache first, then the authenticator's
    /// already-established context. Never triggers a login and never writes
    /// to the cache.
    async fn lookup(&self) -> AuthResult<Option<Identity>> {
        if let Some(identity) = self.cached_identity().await? {
            return Ok(Some(identity));
        }
        self.authenticator.established_identity().await
    }

    /// Resolve the current identity, logging in only when `do_login` is set
    /// and neither the cache nor the authenticator holds one already.
    pub async fn resolve(&self, do_login: bool) -> AuthResult<Option<Identity>> {
        if let Some(identity) = self.lookup().await? {
            return Ok(Some(identity));
        }
        if !do_login {
            return Ok(None);
        }
        self.login().await
    }

    /// Perform a login through the external authenticator and persist the
    /// resulting identity in the session.
    ///
    /// A failed login never touches the cache. On success the identity is
    /// re-read through [`resolve`](Self::resolve) semantics with login
    /// disabled, so the value returned is the one the cache now holds.
    pub async fn login(&self) -> AuthResult<Option<Identity>> {
        let credential = self.credential.clone().ok_or_else(|| {
            AuthError::Authentication("no credential supplied with this request".to_string())
        })?;

        let handler = CredentialCallbackHandler::new(credential);
        let identity = self.authenticator.login(&handler).await?;
        info!(principals = identity.principals.len(), "login succeeded");

        self.session
            .put(keys::IDENTITY, serde_json::to_value(&identity)?)
            .await?;

        // Repopulate from the cache so callers observe the canonical value.
        self.lookup().await
    }

    /// Log out of the external context (when one exists) and clear the
    /// session.
    ///
    /// Clearing is authoritative: both cache entries are removed even when
    /// the external logout fails, and the failure is surfaced afterwards.
    pub async fn logout(&self) -> AuthResult<Option<Identity>> {
        let external: AuthResult<()> = async {
            if self.authenticator.established_identity().await?.is_some() {
                self.authenticator.logout().await?;
            }
            Ok(())
        }
        .await;

        self.session.remove(keys::IDENTITY).await?;
        self.session.remove(keys::BUCKET_NAME).await?;
        debug!("session identity cleared");
        external?;

        self.lookup().await
    }
}

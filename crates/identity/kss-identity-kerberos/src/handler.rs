//! Callback handling for the login exchange.

use kss_auth_core::{
    AuthError, AuthResult, CallbackHandler, CallbackRequest, CallbackResponse, Credential,
};

/// Answers the authenticator's callbacks from one request's [`Credential`].
///
/// Exactly two callback kinds are supported: username and password. Anything
/// else is a configuration error and fails the login.
pub struct CredentialCallbackHandler {
    credential: Credential,
}

impl CredentialCallbackHandler {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }
}

impl CallbackHandler for CredentialCallbackHandler {
    fn handle(&self, requests: &[CallbackRequest]) -> AuthResult<Vec<CallbackResponse>> {
        requests
            .iter()
            .map(|request| match request {
                CallbackRequest::Username => Ok(CallbackResponse::Username(
                    self.credential.username().to_string(),
                )),
                CallbackRequest::Password => Ok(CallbackResponse::Password(
                    self.credential.secret().to_string(),
                )),
                other => Err(AuthError::UnsupportedCallback(format!("{:?}", other))),
            })
            .collect()
    }
}

//! Kerberos identity resolution.
//!
//! [`IdentityResolver`] decides, for one inbound request, whether a user is
//! already authenticated and whether to trigger a login through the external
//! [`Authenticator`](kss_auth_core::Authenticator). Established identities
//! are cached in the request's [`SessionCache`](kss_auth_core::SessionCache)
//! so later requests in the same session skip the external exchange entirely.

mod config;
mod handler;
mod resolver;

pub use config::KerberosConfig;
pub use handler::CredentialCallbackHandler;
pub use resolver::IdentityResolver;

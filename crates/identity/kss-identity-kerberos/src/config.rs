//! Kerberos deployment configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration handed to an `Authenticator` implementation at construction.
///
/// The resolver does not interpret any of these fields; they are forwarded
/// opaquely to whatever performs the protocol exchange. There is no ambient
/// process-wide configuration: every deployment constructs one of these
/// explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KerberosConfig {
    /// Name of the login module to use.
    pub module_name: String,
    /// Path to the auth-module (login) configuration file.
    pub login_config: Option<PathBuf>,
    /// Path to the protocol (krb5) configuration file.
    pub protocol_config: Option<PathBuf>,
    /// Realm to authenticate against, e.g. `IC.AC.UK`.
    pub realm: Option<String>,
    /// Key distribution center address.
    pub kdc: Option<String>,
}

impl KerberosConfig {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            login_config: None,
            protocol_config: None,
            realm: None,
            kdc: None,
        }
    }

    pub fn with_login_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.login_config = Some(path.into());
        self
    }

    pub fn with_protocol_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.protocol_config = Some(path.into());
        self
    }

    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }

    pub fn with_kdc(mut self, kdc: impl Into<String>) -> Self {
        self.kdc = Some(kdc.into());
        self
    }
}

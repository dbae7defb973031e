//! Deterministic bucket naming for authenticated users.

use kss_auth_core::{AuthError, AuthResult, Identity, SessionCache, keys};
use sha1::{Digest, Sha1};
use tracing::debug;

/// Derives the storage bucket name for an identity.
///
/// The name is `{prefix}-{hex(sha1(user_id))}` where `user_id` is the
/// lowercased local part of the principal belonging to the configured realm.
/// The same principal always yields the same name; distinct principals
/// collide only with hash-collision probability.
#[derive(Debug, Clone)]
pub struct BucketNamer {
    realm: String,
    prefix: String,
}

impl BucketNamer {
    pub fn new(realm: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
            prefix: prefix.into(),
        }
    }

    /// The lowercased local part of the principal matching the configured
    /// realm. Errors when no principal belongs to that realm.
    pub fn user_id(&self, identity: &Identity) -> AuthResult<String> {
        let principal = identity
            .principal_for_realm(&self.realm)
            .ok_or_else(|| AuthError::IdentityMapping {
                realm: self.realm.clone(),
            })?;
        Ok(principal.local().to_lowercase())
    }

    /// Compute the bucket name without consulting or updating any cache.
    pub fn derive(&self, identity: &Identity) -> AuthResult<String> {
        let user_id = self.user_id(identity)?;
        let digest = Sha1::digest(user_id.as_bytes());
        Ok(format!("{}-{}", self.prefix, hex::encode(digest)))
    }

    /// Resolve the bucket name for `identity`, reading and populating the
    /// session cache.
    ///
    /// `None` identities yield `None`. The computed name is cached only when
    /// the session already holds the identity, so a cached bucket name always
    /// has a cached identity next to it.
    pub async fn name_for(
        &self,
        session: &dyn SessionCache,
        identity: Option<&Identity>,
    ) -> AuthResult<Option<String>> {
        let Some(identity) = identity else {
            return Ok(None);
        };

        if let Some(value) = session.get(keys::BUCKET_NAME).await? {
            if let Some(name) = value.as_str() {
                return Ok(Some(name.to_string()));
            }
        }

        let name = self.derive(identity)?;
        if session.get(keys::IDENTITY).await?.is_some() {
            debug!(bucket = %name, "caching derived bucket name");
            session
                .put(keys::BUCKET_NAME, serde_json::Value::String(name.clone()))
                .await?;
        }
        Ok(Some(name))
    }
}

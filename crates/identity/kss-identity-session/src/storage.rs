//! Per-user storage binding.

use crate::naming::BucketNamer;
use kss_auth_core::{
    AuthResult, Authenticator, Bucket, Credential, Identity, ObjectStore, SessionCache,
};
use kss_identity_kerberos::IdentityResolver;
use std::sync::Arc;
use tracing::debug;

/// Binds the authenticated user of one request to their storage bucket.
///
/// Construct one per inbound request and drop it when the request completes;
/// the resolved bucket is memoized for the instance lifetime so repeated
/// lookups within a request hit the object store once. Cross-request state
/// lives only in the session cache.
pub struct UserStorage {
    resolver: IdentityResolver,
    namer: BucketNamer,
    session: Arc<dyn SessionCache>,
    store: Arc<dyn ObjectStore>,
    bucket: Option<Bucket>,
}

impl UserStorage {
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        session: Arc<dyn SessionCache>,
        store: Arc<dyn ObjectStore>,
        namer: BucketNamer,
        credential: Option<Credential>,
    ) -> Self {
        let mut resolver = IdentityResolver::new(authenticator, session.clone());
        if let Some(credential) = credential {
            resolver = resolver.with_credential(credential);
        }
        Self {
            resolver,
            namer,
            session,
            store,
            bucket: None,
        }
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    /// Resolve the current identity, logging in when `do_login` is set.
    pub async fn authenticate(&self, do_login: bool) -> AuthResult<Option<Identity>> {
        self.resolver.resolve(do_login).await
    }

    /// Perform a login with the request credential and persist the identity.
    pub async fn login(&self) -> AuthResult<Option<Identity>> {
        self.resolver.login().await
    }

    /// Log out and drop the memoized bucket along with the session identity.
    pub async fn logout(&mut self) -> AuthResult<Option<Identity>> {
        self.bucket = None;
        self.resolver.logout().await
    }

    /// The authenticated user's id: the lowercased local part of the
    /// realm-matching principal. `None` when unauthenticated.
    pub async fn user_id(&self) -> AuthResult<Option<String>> {
        match self.resolver.resolve(false).await? {
            Some(identity) => Ok(Some(self.namer.user_id(&identity)?)),
            None => Ok(None),
        }
    }

    /// The authenticated user's bucket name. `None` when unauthenticated.
    pub async fn bucket_name(&self) -> AuthResult<Option<String>> {
        let identity = self.resolver.resolve(false).await?;
        self.namer.name_for(self.session.as_ref(), identity.as_ref()).await
    }

    /// The user's bucket, created in the object store on first access.
    /// `None` when unauthenticated. Storage failures propagate unrecovered.
    pub async fn user_bucket(&mut self) -> AuthResult<Option<Bucket>> {
        if let Some(bucket) = &self.bucket {
            return Ok(Some(bucket.clone()));
        }
        let Some(name) = self.bucket_name().await? else {
            return Ok(None);
        };
        let bucket = self.store.get_or_create_bucket(&name).await?;
        debug!(bucket = %bucket.name, "resolved user bucket");
        self.bucket = Some(bucket.clone());
        Ok(Some(bucket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemorySessionCache;
    use async_trait::async_trait;
    use kss_auth_core::{AuthError, CallbackHandler, Principal, keys};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticAuthenticator {
        identity: Identity,
    }

    #[async_trait]
    impl Authenticator for StaticAuthenticator {
        async fn established_identity(&self) -> AuthResult<Option<Identity>> {
            Ok(None)
        }

        async fn login(&self, handler: &dyn CallbackHandler) -> AuthResult<Identity> {
            handler.handle(&[
                kss_auth_core::CallbackRequest::Username,
                kss_auth_core::CallbackRequest::Password,
            ])?;
            Ok(self.identity.clone())
        }

        async fn logout(&self) -> AuthResult<()> {
            Ok(())
        }
    }

    struct CountingStore {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl ObjectStore for CountingStore {
        async fn get_or_create_bucket(&self, name: &str) -> AuthResult<Bucket> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AuthError::Storage("bucket service unavailable".to_string()));
            }
            Ok(Bucket::new(name))
        }
    }

    fn storage_for(
        store: Arc<CountingStore>,
        session: InMemorySessionCache,
    ) -> UserStorage {
        let authenticator = Arc::new(StaticAuthenticator {
            identity: Identity::new(vec![Principal::from("bob@IC.AC.UK")]),
        });
        UserStorage::new(
            authenticator,
            Arc::new(session),
            store,
            BucketNamer::new("IC.AC.UK", "cloud"),
            Some(Credential::new("bob", "secret")),
        )
    }

    #[tokio::test]
    async fn fresh_session_login_yields_cached_identity_and_bucket_name() {
        let session = InMemorySessionCache::new();
        let storage = storage_for(Arc::new(CountingStore::new()), session.clone());

        let identity = storage.authenticate(true).await.unwrap().unwrap();
        assert_eq!(identity.principals, vec![Principal::from("bob@IC.AC.UK")]);
        assert!(session.get(keys::IDENTITY).await.unwrap().is_some());

        assert_eq!(storage.user_id().await.unwrap().as_deref(), Some("bob"));
        // sha1("bob")
        assert_eq!(
            storage.bucket_name().await.unwrap().as_deref(),
            Some("cloud-48181acd22b3edaebc8a447868a7df7ce629920a")
        );
    }

    #[tokio::test]
    async fn unauthenticated_user_has_no_id_name_or_bucket() {
        let session = InMemorySessionCache::new();
        let mut storage = storage_for(Arc::new(CountingStore::new()), session);

        assert!(storage.user_id().await.unwrap().is_none());
        assert!(storage.bucket_name().await.unwrap().is_none());
        assert!(storage.user_bucket().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn user_bucket_is_memoized_per_instance() {
        let store = Arc::new(CountingStore::new());
        let session = InMemorySessionCache::new();
        let mut storage = storage_for(store.clone(), session);

        storage.authenticate(true).await.unwrap();
        let first = storage.user_bucket().await.unwrap().unwrap();
        let second = storage.user_bucket().await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn storage_failure_propagates() {
        let mut store = CountingStore::new();
        store.fail = true;
        let session = InMemorySessionCache::new();
        let mut storage = storage_for(Arc::new(store), session);

        storage.authenticate(true).await.unwrap();
        let err = storage.user_bucket().await.unwrap_err();
        assert!(matches!(err, AuthError::Storage(_)));
    }

    #[tokio::test]
    async fn logout_clears_identity_and_memoized_bucket() {
        let store = Arc::new(CountingStore::new());
        let session = InMemorySessionCache::new();
        let mut storage = storage_for(store.clone(), session.clone());

        storage.authenticate(true).await.unwrap();
        storage.user_bucket().await.unwrap().unwrap();

        storage.logout().await.unwrap();
        assert!(session.get(keys::IDENTITY).await.unwrap().is_none());
        assert!(session.get(keys::BUCKET_NAME).await.unwrap().is_none());
        assert!(storage.user_bucket().await.unwrap().is_none());
        // The post-logout call found no identity, so the store was hit once.
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }
}

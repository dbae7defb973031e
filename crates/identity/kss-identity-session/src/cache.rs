//! In-memory session cache.

use async_trait::async_trait;
use kss_auth_core::{AuthResult, SessionCache};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A [`SessionCache`] held entirely in process memory.
///
/// Stands in for an external session store in tests and single-process
/// deployments. Cloning is cheap and clones share the same underlying map,
/// mirroring how every request in a session sees the same store.
#[derive(Clone, Default)]
pub struct InMemorySessionCache {
    values: Arc<RwLock<HashMap<String, serde_json::Value>>>,
}

impl InMemorySessionCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionCache for InMemorySessionCache {
    async fn get(&self, key: &str) -> AuthResult<Option<serde_json::Value>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: serde_json::Value) -> AuthResult<()> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> AuthResult<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

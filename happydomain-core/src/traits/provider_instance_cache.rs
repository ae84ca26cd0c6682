//! Live provider instance cache abstract Trait

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use happydomain_provider::DnsProvider;

use crate::types::Identifier;

/// Provider Instance Cache Trait
///
/// Keeps built [`DnsProvider`] instances, indexed by provider configuration
/// ID, so that HTTP clients are reused across requests. Entries are dropped
/// whenever the configuration changes or the credentials stop working.
#[async_trait]
pub trait ProviderInstanceCache: Send + Sync {
    /// Store a Provider instance
    async fn insert(&self, provider_id: Identifier, provider: Arc<dyn DnsProvider>);

    /// Forget a Provider instance
    async fn remove(&self, provider_id: &Identifier);

    /// Get Provider instance
    async fn get(&self, provider_id: &Identifier) -> Option<Arc<dyn DnsProvider>>;

    /// List all cached provider IDs
    async fn list_ids(&self) -> Vec<Identifier>;
}

/// In-memory provider instance cache
#[derive(Clone)]
pub struct InMemoryProviderInstanceCache {
    providers: Arc<RwLock<HashMap<Identifier, Arc<dyn DnsProvider>>>>,
}

impl InMemoryProviderInstanceCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryProviderInstanceCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderInstanceCache for InMemoryProviderInstanceCache {
    async fn insert(&self, provider_id: Identifier, provider: Arc<dyn DnsProvider>) {
        self.providers.write().await.insert(provider_id, provider);
    }

    async fn remove(&self, provider_id: &Identifier) {
        self.providers.write().await.remove(provider_id);
    }

    async fn get(&self, provider_id: &Identifier) -> Option<Arc<dyn DnsProvider>> {
        self.providers.read().await.get(provider_id).cloned()
    }

    async fn list_ids(&self) -> Vec<Identifier> {
        self.providers.read().await.keys().cloned().collect()
    }
}

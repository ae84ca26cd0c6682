//! Provider configuration persistence abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{Identifier, Provider};

/// Provider Warehouse Trait
///
/// Stores the user-owned provider configurations, not the live backend
/// instances (see [`ProviderInstanceCache`](super::ProviderInstanceCache)).
#[async_trait]
pub trait ProviderRepository: Send + Sync {
    async fn find_all(&self) -> CoreResult<Vec<Provider>>;

    async fn find_by_id(&self, id: &Identifier) -> CoreResult<Option<Provider>>;

    /// Providers owned by `owner`
    async fn find_by_owner(&self, owner: &Identifier) -> CoreResult<Vec<Provider>>;

    /// Save provider (new or update)
    async fn save(&self, provider: &Provider) -> CoreResult<()>;

    async fn delete(&self, id: &Identifier) -> CoreResult<()>;
}

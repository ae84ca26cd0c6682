//! Domain persistence abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{Domain, Identifier};

/// Domain Warehouse Trait
#[async_trait]
pub trait DomainRepository: Send + Sync {
    /// Get all domains (backups)
    async fn find_all(&self) -> CoreResult<Vec<Domain>>;

    /// Get domain based on ID
    async fn find_by_id(&self, id: &Identifier) -> CoreResult<Option<Domain>>;

    /// Domains owned by `owner`
    async fn find_by_owner(&self, owner: &Identifier) -> CoreResult<Vec<Domain>>;

    /// Save domain (new or update), including its zone history
    async fn save(&self, domain: &Domain) -> CoreResult<()>;

    /// Delete domain
    ///
    /// Zones and logs are not touched; callers cascade.
    async fn delete(&self, id: &Identifier) -> CoreResult<()>;
}

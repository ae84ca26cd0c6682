//! Domain log persistence abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{DomainLog, Identifier};

/// Domain Log Warehouse Trait
#[async_trait]
pub trait DomainLogRepository: Send + Sync {
    /// Get all entries of every domain (backups)
    async fn find_all(&self) -> CoreResult<Vec<DomainLog>>;

    /// Entries of a domain, newest first
    async fn find_by_domain(&self, domain_id: &Identifier) -> CoreResult<Vec<DomainLog>>;

    /// Append an entry
    async fn append(&self, log: &DomainLog) -> CoreResult<()>;

    /// Overwrite an entry, inserting it when unknown (restore)
    async fn update(&self, log: &DomainLog) -> CoreResult<()>;

    /// Delete one entry of a domain
    async fn delete(&self, domain_id: &Identifier, id: &Identifier) -> CoreResult<()>;

    /// Delete every entry of a domain
    async fn delete_by_domain(&self, domain_id: &Identifier) -> CoreResult<()>;
}

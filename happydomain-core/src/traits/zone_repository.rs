//! Zone persistence abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{Identifier, Zone};

/// Zone Warehouse Trait
#[async_trait]
pub trait ZoneRepository: Send + Sync {
    async fn find_all(&self) -> CoreResult<Vec<Zone>>;

    /// Get zone based on ID
    async fn find_by_id(&self, id: &Identifier) -> CoreResult<Option<Zone>>;

    /// Store a new zone
    ///
    /// Assigns a fresh identifier to `zone` before storing it.
    async fn create(&self, zone: &mut Zone) -> CoreResult<()>;

    /// Overwrite a zone, inserting it when unknown (restore)
    async fn update(&self, zone: &Zone) -> CoreResult<()>;

    async fn delete(&self, id: &Identifier) -> CoreResult<()>;
}

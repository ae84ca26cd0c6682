//! happyDomain Core Library
//!
//! Zone orchestration engine of happyDomain:
//! - service catalog and zone analyzer (records to services and back)
//! - zone snapshots with an append-only history per domain
//! - correction listing and publication against DNS providers
//! - dynamic DNS updates, domain journal, backups
//!
//! Storage is abstracted through the traits of [`traits`]; the platform layer
//! provides the implementations and builds a [`ServiceContext`].

pub mod analyzer;
pub mod catalog;
pub mod error;
pub mod services;
pub mod traits;
pub mod types;
pub mod validation;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use analyzer::{AnalyzedZone, analyze_zone, synthesize_records};
pub use catalog::{ServiceBody, ServiceCatalog, ServiceInfo, ServiceSpec};
pub use error::{CoreError, CoreResult, ErrorKind};
pub use services::{CoreOptions, ServiceContext};
pub use traits::{
    DomainLogRepository, DomainRepository, ProviderInstanceCache, ProviderRepository,
    Repositories, UserRepository, ZoneRepository,
};

//! Storage layer abstraction trait definition

mod domain_log_repository;
mod domain_repository;
mod provider_instance_cache;
mod provider_repository;
mod user_repository;
mod zone_repository;

use std::sync::Arc;

pub use domain_log_repository::DomainLogRepository;
pub use domain_repository::DomainRepository;
pub use provider_instance_cache::{InMemoryProviderInstanceCache, ProviderInstanceCache};
pub use provider_repository::ProviderRepository;
pub use user_repository::UserRepository;
pub use zone_repository::ZoneRepository;

/// Every repository the services need.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub providers: Arc<dyn ProviderRepository>,
    pub domains: Arc<dyn DomainRepository>,
    pub zones: Arc<dyn ZoneRepository>,
    pub domain_logs: Arc<dyn DomainLogRepository>,
}

impl Repositories {
    /// Use one store implementing every repository trait.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository
            + ProviderRepository
            + DomainRepository
            + ZoneRepository
            + DomainLogRepository
            + 'static,
    {
        Self {
            users: store.clone(),
            providers: store.clone(),
            domains: store.clone(),
            zones: store.clone(),
            domain_logs: store,
        }
    }
}

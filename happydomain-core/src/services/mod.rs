//! Business logic service layer

mod backup_service;
mod domain_log_service;
mod domain_service;
mod orchestrator;
mod provider_service;
mod user_service;
mod zone_service;

pub use backup_service::BackupService;
pub use domain_log_service::DomainLogService;
pub use domain_service::DomainService;
pub use orchestrator::Orchestrator;
pub use provider_service::ProviderService;
pub use user_service::UserService;
pub use zone_service::ZoneService;

use std::sync::Arc;

use happydomain_provider::{DnsProvider, FailureKind, ProviderError, ProviderTypeRegistry};

use crate::catalog::ServiceCatalog;
use crate::error::{CoreError, CoreResult};
use crate::traits::{ProviderInstanceCache, Repositories};
use crate::types::{Domain, DomainLog, Identifier, LogLevel, User, Zone};
use crate::validation::{ensure_domain_owner, ensure_provider_owner};

/// Switches set by the operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoreOptions {
    /// Refuse provider changes and domain creation.
    pub disable_providers: bool,
    /// Refuse new accounts.
    pub disable_registration: bool,
}

/// Service context - holds all dependencies
///
/// The platform layer builds this once at startup and injects its storage
/// implementation.
pub struct ServiceContext {
    /// Persistence ports
    pub repos: Repositories,
    /// Backend types, read-only after startup
    pub provider_types: Arc<ProviderTypeRegistry>,
    /// Service types, read-only after startup
    pub catalog: Arc<ServiceCatalog>,
    /// Live backend instances
    pub provider_instances: Arc<dyn ProviderInstanceCache>,
    pub options: CoreOptions,
}

impl ServiceContext {
    /// Create service context
    #[must_use]
    pub fn new(
        repos: Repositories,
        provider_types: Arc<ProviderTypeRegistry>,
        catalog: Arc<ServiceCatalog>,
        provider_instances: Arc<dyn ProviderInstanceCache>,
        options: CoreOptions,
    ) -> Self {
        Self {
            repos,
            provider_types,
            catalog,
            provider_instances,
            options,
        }
    }

    /// Domain `domain_id` if `user` owns it.
    pub async fn get_domain(&self, user: &User, domain_id: &Identifier) -> CoreResult<Domain> {
        let domain = self.repos.domains.find_by_id(domain_id).await?;
        ensure_domain_owner(user, domain, domain_id)
    }

    /// Zone `zone_id` from the history of `domain`.
    pub async fn get_zone(&self, domain: &Domain, zone_id: &Identifier) -> CoreResult<Zone> {
        if !domain.has_zone(zone_id) {
            return Err(CoreError::ZoneNotFound(zone_id.to_string()));
        }
        self.repos
            .zones
            .find_by_id(zone_id)
            .await?
            .ok_or_else(|| CoreError::ZoneNotFound(zone_id.to_string()))
    }

    /// Get Provider instance
    ///
    /// Instances are built from the stored configuration on first use and
    /// cached afterwards.
    pub async fn get_provider(
        &self,
        owner: &Identifier,
        provider_id: &Identifier,
    ) -> CoreResult<Arc<dyn DnsProvider>> {
        let config = self.repos.providers.find_by_id(provider_id).await?;
        let config = ensure_provider_owner(owner, config, provider_id)?;

        if let Some(provider) = self.provider_instances.get(provider_id).await {
            return Ok(provider);
        }

        let provider = self
            .provider_types
            .build(&config.provider_type, &config.payload)?;
        self.provider_instances
            .insert(provider_id.clone(), Arc::clone(&provider))
            .await;
        log::debug!(
            "Built {} provider instance {provider_id}",
            config.provider_type
        );
        Ok(provider)
    }

    /// Handle Provider errors, dropping the cached instance when the
    /// credentials stopped working
    pub async fn handle_provider_error(
        &self,
        provider_id: &Identifier,
        err: ProviderError,
    ) -> CoreError {
        if err.kind() == FailureKind::AuthFailure {
            self.provider_instances.remove(provider_id).await;
            log::warn!("Provider {provider_id} rejected its credentials: {err}");
        }
        CoreError::Provider(err)
    }

    /// Append an entry to the journal of `domain_id`, mirrored to the logger.
    pub async fn append_domain_log(&self, entry: &DomainLog) -> CoreResult<()> {
        log::log!(
            entry.level.log_level(),
            "[domain {}] {}",
            entry.domain_id,
            entry.content
        );
        self.repos.domain_logs.append(entry).await
    }

    /// Journal an event without failing the surrounding operation.
    pub(crate) async fn domain_log(
        &self,
        domain: &Domain,
        author: &Identifier,
        level: LogLevel,
        content: impl Into<String>,
    ) {
        let entry = DomainLog::new(domain.id.clone(), author.clone(), level, content);
        if let Err(e) = self.append_domain_log(&entry).await {
            log::error!("Failed to journal event for domain {}: {e}", domain.name);
        }
    }
}

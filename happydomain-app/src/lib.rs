//! Application bootstrap for happyDomain.
//!
//! Provides `AppState` (service container), `AppStateBuilder` (adapter
//! injection) and the operator configuration in [`config`].

pub mod adapters;
pub mod config;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use happydomain_core::catalog::ServiceCatalog;
use happydomain_core::error::{CoreError, CoreResult};
use happydomain_core::services::{
    BackupService, CoreOptions, DomainLogService, DomainService, Orchestrator, ProviderService,
    ServiceContext, UserService, ZoneService,
};
use happydomain_core::traits::{
    InMemoryProviderInstanceCache, ProviderInstanceCache, Repositories,
};
use happydomain_provider::ProviderTypeRegistry;

pub use config::{AppConfig, ConfigError};

/// Outcome of warming the provider instance cache at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartupSummary {
    pub success_count: usize,
    pub error_count: usize,
}

/// Application state.
///
/// Holds all services and the `ServiceContext`. Every frontend constructs
/// this once at startup via `AppStateBuilder` or [`AppState::from_config`].
pub struct AppState {
    /// Service context (holds all storage adapters)
    pub ctx: Arc<ServiceContext>,
    pub user_service: UserService,
    pub provider_service: ProviderService,
    pub domain_service: DomainService,
    pub zone_service: ZoneService,
    pub orchestrator: Orchestrator,
    pub domain_log_service: DomainLogService,
    pub backup_service: BackupService,
    /// Public URL the instance is served from
    pub base_url: String,
    /// Whether the startup sequence has completed
    pub startup_completed: AtomicBool,
}

impl AppState {
    /// Open the configured SQLite database and build the state on top of it.
    #[cfg(feature = "sqlite-store")]
    pub async fn from_config(config: &AppConfig) -> CoreResult<Self> {
        let store = Arc::new(adapters::SqliteStore::open(&config.database_url).await?);
        log::info!(
            "Opened database {} (providers {}, registration {})",
            config.database_url,
            if config.disable_providers { "disabled" } else { "enabled" },
            if config.disable_registration { "disabled" } else { "enabled" },
        );

        AppStateBuilder::new()
            .repositories(Repositories::from_store(store))
            .options(config.core_options())
            .base_url(config.base_url.clone())
            .build()
    }

    /// Run the startup sequence. Sets `startup_completed` to `true` when done.
    pub async fn run_startup(&self) -> CoreResult<StartupSummary> {
        let summary = self.warm_provider_instances().await;
        self.startup_completed.store(true, Ordering::SeqCst);
        summary
    }

    /// Build an instance for every stored provider.
    ///
    /// A provider whose configuration no longer builds is skipped; it will
    /// report its error on first use.
    pub async fn warm_provider_instances(&self) -> CoreResult<StartupSummary> {
        let mut summary = StartupSummary::default();
        for provider in self.ctx.repos.providers.find_all().await? {
            match self
                .ctx
                .provider_types
                .build(&provider.provider_type, &provider.payload)
            {
                Ok(instance) => {
                    self.ctx
                        .provider_instances
                        .insert(provider.id.clone(), instance)
                        .await;
                    summary.success_count += 1;
                }
                Err(e) => {
                    log::warn!(
                        "Failed to build {} provider {}: {e}",
                        provider.provider_type,
                        provider.id
                    );
                    summary.error_count += 1;
                }
            }
        }

        log::info!(
            "Provider instances ready: {} succeeded, {} failed",
            summary.success_count,
            summary.error_count
        );
        Ok(summary)
    }
}

/// Builder for constructing `AppState` with platform-specific adapters.
///
/// # Required adapters
/// - `repositories`: where users, providers, domains, zones and logs live
///
/// # Optional
/// - `provider_types`: defaults to every compiled-in backend
/// - `catalog`: defaults to the built-in service types
/// - `provider_instances`: defaults to `InMemoryProviderInstanceCache`
pub struct AppStateBuilder {
    repositories: Option<Repositories>,
    provider_types: Option<ProviderTypeRegistry>,
    catalog: Option<ServiceCatalog>,
    provider_instances: Option<Arc<dyn ProviderInstanceCache>>,
    options: CoreOptions,
    base_url: String,
}

impl AppStateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            repositories: None,
            provider_types: None,
            catalog: None,
            provider_instances: None,
            options: CoreOptions::default(),
            base_url: String::new(),
        }
    }

    #[must_use]
    pub fn repositories(mut self, repositories: Repositories) -> Self {
        self.repositories = Some(repositories);
        self
    }

    #[must_use]
    pub fn provider_types(mut self, registry: ProviderTypeRegistry) -> Self {
        self.provider_types = Some(registry);
        self
    }

    #[must_use]
    pub fn catalog(mut self, catalog: ServiceCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    #[must_use]
    pub fn provider_instances(mut self, cache: Arc<dyn ProviderInstanceCache>) -> Self {
        self.provider_instances = Some(cache);
        self
    }

    #[must_use]
    pub fn options(mut self, options: CoreOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the `AppState`.
    ///
    /// # Errors
    /// Returns `CoreError::ValidationError` if required adapters are missing.
    pub fn build(self) -> CoreResult<AppState> {
        let repositories = self
            .repositories
            .ok_or_else(|| CoreError::ValidationError("repositories are required".to_string()))?;
        let provider_types = self
            .provider_types
            .unwrap_or_else(ProviderTypeRegistry::with_builtin_providers);
        let catalog = self
            .catalog
            .unwrap_or_else(ServiceCatalog::with_builtin_services);
        let provider_instances = self
            .provider_instances
            .unwrap_or_else(|| Arc::new(InMemoryProviderInstanceCache::new()));

        let ctx = Arc::new(ServiceContext::new(
            repositories,
            Arc::new(provider_types),
            Arc::new(catalog),
            provider_instances,
            self.options,
        ));

        Ok(AppState {
            user_service: UserService::new(Arc::clone(&ctx)),
            provider_service: ProviderService::new(Arc::clone(&ctx)),
            domain_service: DomainService::new(Arc::clone(&ctx)),
            zone_service: ZoneService::new(Arc::clone(&ctx)),
            orchestrator: Orchestrator::new(Arc::clone(&ctx)),
            domain_log_service: DomainLogService::new(Arc::clone(&ctx)),
            backup_service: BackupService::new(Arc::clone(&ctx)),
            ctx,
            base_url: self.base_url,
            startup_completed: AtomicBool::new(false),
        })
    }
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

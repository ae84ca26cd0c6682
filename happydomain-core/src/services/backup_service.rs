//! Whole-instance backup and restore

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::CoreResult;
use crate::services::ServiceContext;
use crate::types::{Backup, RestoreResult};

/// Backup service
pub struct BackupService {
    ctx: Arc<ServiceContext>,
}

impl BackupService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Dump every store
    ///
    /// Zones referenced from a domain history but missing from the store
    /// are reported under `Errors`.
    pub async fn export(&self) -> CoreResult<Backup> {
        let repos = &self.ctx.repos;
        let users = repos.users.find_all().await?;
        let providers = repos.providers.find_all().await?;
        let domains = repos.domains.find_all().await?;
        let zones = repos.zones.find_all().await?;
        let domains_logs = repos.domain_logs.find_all().await?;

        let known: HashSet<_> = zones.iter().map(|z| z.id().clone()).collect();
        let errors = domains
            .iter()
            .flat_map(|d| {
                d.zone_history
                    .iter()
                    .filter(|id| !known.contains(*id))
                    .map(move |id| format!("{}: zone {id} is missing", d.name))
            })
            .collect();

        log::info!(
            "Exported {} users, {} providers, {} domains, {} zones",
            users.len(),
            providers.len(),
            domains.len(),
            zones.len()
        );

        Ok(Backup {
            users,
            users_auth: Vec::new(),
            providers,
            domains,
            zones,
            sessions: Vec::new(),
            domains_logs,
            errors,
        })
    }

    /// Upsert every entity of `backup`
    ///
    /// A failing entity is reported and skipped; collections owned by other
    /// subsystems (`UsersAuth`, `Sessions`) are left alone.
    pub async fn restore(&self, backup: &Backup) -> RestoreResult {
        let repos = &self.ctx.repos;
        let mut result = RestoreResult::default();

        for user in &backup.users {
            match repos.users.save(user).await {
                Ok(()) => result.users += 1,
                Err(e) => result.errors.push(format!("user {}: {e}", user.id)),
            }
        }
        for provider in &backup.providers {
            match repos.providers.save(provider).await {
                Ok(()) => {
                    self.ctx.provider_instances.remove(&provider.id).await;
                    result.providers += 1;
                }
                Err(e) => result.errors.push(format!("provider {}: {e}", provider.id)),
            }
        }
        for zone in &backup.zones {
            match repos.zones.update(zone).await {
                Ok(()) => result.zones += 1,
                Err(e) => result.errors.push(format!("zone {}: {e}", zone.id())),
            }
        }
        for domain in &backup.domains {
            match repos.domains.save(domain).await {
                Ok(()) => result.domains += 1,
                Err(e) => result.errors.push(format!("domain {}: {e}", domain.name)),
            }
        }
        for entry in &backup.domains_logs {
            match repos.domain_logs.update(entry).await {
                Ok(()) => result.domain_logs += 1,
                Err(e) => result.errors.push(format!("log {}: {e}", entry.id)),
            }
        }

        if !backup.users_auth.is_empty() || !backup.sessions.is_empty() {
            log::warn!(
                "Backup carries {} auth entries and {} sessions, not restored here",
                backup.users_auth.len(),
                backup.sessions.len()
            );
        }
        if result.errors.is_empty() {
            log::info!("Restore completed: {result:?}");
        } else {
            log::warn!("Restore completed with {} errors", result.errors.len());
        }
        result
    }
}

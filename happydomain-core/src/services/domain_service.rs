//! Domain management service

use std::sync::Arc;

use happydomain_provider::{FailureKind, normalize};

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::types::{
    CreateDomainRequest, Domain, DomainWithHistory, Identifier, LogLevel, UpdateDomainRequest,
    User,
};
use crate::validation::validate_domain_name;

/// Domain management service
pub struct DomainService {
    ctx: Arc<ServiceContext>,
}

impl DomainService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Register a domain hosted on one of the user's providers
    ///
    /// The zone must exist on the provider; backends able to create zones
    /// get it created when missing. The history stays empty until the first
    /// import.
    pub async fn create_domain(
        &self,
        user: &User,
        request: CreateDomainRequest,
    ) -> CoreResult<Domain> {
        if self.ctx.options.disable_providers {
            return Err(CoreError::Forbidden(
                "adding domains is disabled on this instance".to_string(),
            ));
        }

        // 1. Check the name and that it is not already managed
        let name = validate_domain_name(&request.name)?;
        let owned = self.ctx.repos.domains.find_by_owner(&user.id).await?;
        if owned.iter().any(|d| d.name == name) {
            return Err(CoreError::ValidationError(format!(
                "{name} is already managed"
            )));
        }

        // 2. Confirm the zone on the provider
        let provider = self
            .ctx
            .get_provider(&user.id, &request.provider_id)
            .await?;
        let confirmed = if provider.can_list_zones() {
            match provider.list_zones().await {
                Ok(zones) => zones.iter().any(|z| normalize(z) == name),
                Err(e) => {
                    return Err(self
                        .ctx
                        .handle_provider_error(&request.provider_id, e)
                        .await);
                }
            }
        } else {
            match provider.get_zone_records(&name).await {
                Ok(_) => true,
                Err(e) if e.kind() == FailureKind::NotFound => false,
                Err(e) => {
                    return Err(self
                        .ctx
                        .handle_provider_error(&request.provider_id, e)
                        .await);
                }
            }
        };

        if !confirmed {
            if !provider.can_create_domain() {
                return Err(CoreError::ValidationError(format!(
                    "{name} does not exist on this provider"
                )));
            }
            log::info!("Creating zone {name} on provider {}", request.provider_id);
            if let Err(e) = provider.create_domain(&name).await {
                return Err(self
                    .ctx
                    .handle_provider_error(&request.provider_id, e)
                    .await);
            }
        }

        // 3. Save
        let domain = Domain {
            id: Identifier::random(),
            owner: user.id.clone(),
            name,
            provider_id: request.provider_id,
            zone_history: Vec::new(),
            group: request.group.filter(|g| !g.is_empty()),
        };
        self.ctx.repos.domains.save(&domain).await?;
        self.ctx
            .domain_log(&domain, &user.id, LogLevel::Info, "Domain name added")
            .await;
        Ok(domain)
    }

    /// Domain with the metadata of every zone in its history
    pub async fn get_domain(&self, user: &User, id: &Identifier) -> CoreResult<DomainWithHistory> {
        let domain = self.ctx.get_domain(user, id).await?;

        let mut zone_meta = Vec::with_capacity(domain.zone_history.len());
        for zone_id in &domain.zone_history {
            match self.ctx.repos.zones.find_by_id(zone_id).await? {
                Some(zone) => zone_meta.push(zone.meta),
                None => log::error!("Zone {zone_id} of {} is missing", domain.name),
            }
        }

        Ok(DomainWithHistory { domain, zone_meta })
    }

    pub async fn list_domains(&self, user: &User) -> CoreResult<Vec<Domain>> {
        let mut domains = self.ctx.repos.domains.find_by_owner(&user.id).await?;
        domains.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(domains)
    }

    /// Change the group; an empty string clears it
    pub async fn update_domain(
        &self,
        user: &User,
        id: &Identifier,
        request: UpdateDomainRequest,
    ) -> CoreResult<Domain> {
        let mut domain = self.ctx.get_domain(user, id).await?;
        if let Some(group) = request.group {
            domain.group = (!group.is_empty()).then_some(group);
        }
        self.ctx.repos.domains.save(&domain).await?;
        Ok(domain)
    }

    /// Delete a domain with its zones and journal
    pub async fn delete_domain(&self, user: &User, id: &Identifier) -> CoreResult<()> {
        let domain = self.ctx.get_domain(user, id).await?;
        let repos = &self.ctx.repos;

        for zone_id in &domain.zone_history {
            repos.zones.delete(zone_id).await?;
        }
        repos.domain_logs.delete_by_domain(&domain.id).await?;
        repos.domains.delete(&domain.id).await?;

        log::info!("Deleted domain {} ({})", domain.name, domain.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;

    fn request(env: &TestEnv, name: &str) -> CreateDomainRequest {
        CreateDomainRequest {
            provider_id: env.provider.id.clone(),
            name: name.to_string(),
            group: None,
        }
    }

    #[tokio::test]
    async fn create_existing_remote_zone() {
        let env = TestEnv::new().await;
        env.dns.set_zone("example.com.", Vec::new()).await;
        let svc = DomainService::new(env.ctx.clone());

        let domain = svc
            .create_domain(&env.user, request(&env, "Example.com"))
            .await
            .unwrap();
        assert_eq!(domain.name, "example.com.");
        assert!(domain.zone_history.is_empty());

        let err = svc
            .create_domain(&env.user, request(&env, "example.com."))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[tokio::test]
    async fn missing_remote_zone_is_created() {
        let env = TestEnv::new().await;
        DomainService::new(env.ctx.clone())
            .create_domain(&env.user, request(&env, "new.example."))
            .await
            .unwrap();
        assert!(env.dns.zone("new.example.").await.is_some());
    }

    #[tokio::test]
    async fn missing_zone_without_create_capability() {
        let env = TestEnv::new().await;
        env.dns.set_can_create_domain(false);
        let err = DomainService::new(env.ctx.clone())
            .create_domain(&env.user, request(&env, "new.example."))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[tokio::test]
    async fn get_with_history_and_update_group() {
        let env = TestEnv::new().await;
        let domain = env.import_domain("example.com.").await;
        let svc = DomainService::new(env.ctx.clone());

        let full = svc.get_domain(&env.user, &domain.id).await.unwrap();
        assert_eq!(full.zone_meta.len(), 1);
        assert!(full.zone_meta[0].published.is_some());

        let updated = svc
            .update_domain(
                &env.user,
                &domain.id,
                UpdateDomainRequest {
                    group: Some("prod".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.group.as_deref(), Some("prod"));

        let cleared = svc
            .update_domain(
                &env.user,
                &domain.id,
                UpdateDomainRequest {
                    group: Some(String::new()),
                },
            )
            .await
            .unwrap();
        assert!(cleared.group.is_none());
    }

    #[tokio::test]
    async fn delete_cascades() {
        let env = TestEnv::new().await;
        let domain = env.import_domain("example.com.").await;

        DomainService::new(env.ctx.clone())
            .delete_domain(&env.user, &domain.id)
            .await
            .unwrap();

        let repos = &env.ctx.repos;
        assert!(repos.zones.find_by_id(&domain.zone_history[0]).await.unwrap().is_none());
        assert!(repos.domain_logs.find_by_domain(&domain.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn foreign_domain_is_not_found() {
        let env = TestEnv::new().await;
        let domain = env.import_domain("example.com.").await;
        let stranger = env.other_user().await;

        let err = DomainService::new(env.ctx.clone())
            .get_domain(&stranger, &domain.id)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}

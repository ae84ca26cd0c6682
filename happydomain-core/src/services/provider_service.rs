//! Provider configuration management

use std::sync::Arc;

use happydomain_provider::ProviderMetadata;

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::types::{CreateProviderRequest, Identifier, Provider, UpdateProviderRequest, User};
use crate::validation::ensure_provider_owner;

/// Provider management service
pub struct ProviderService {
    ctx: Arc<ServiceContext>,
}

impl ProviderService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Backend types available on this instance
    pub fn list_provider_types(&self) -> Vec<ProviderMetadata> {
        self.ctx.provider_types.metadata()
    }

    fn ensure_enabled(&self) -> CoreResult<()> {
        if self.ctx.options.disable_providers {
            return Err(CoreError::Forbidden(
                "provider management is disabled on this instance".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a provider
    ///
    /// The configuration is checked by building a backend instance from it,
    /// which is then kept in the instance cache.
    pub async fn create_provider(
        &self,
        user: &User,
        request: CreateProviderRequest,
    ) -> CoreResult<Provider> {
        self.ensure_enabled()?;

        // 1. Build the backend, rejecting unknown types and bad configurations
        let instance = self
            .ctx
            .provider_types
            .build(&request.provider_type, &request.payload)?;

        // 2. Save
        let provider = Provider {
            id: Identifier::random(),
            owner: user.id.clone(),
            provider_type: request.provider_type,
            comment: request.comment,
            payload: request.payload,
        };
        self.ctx.repos.providers.save(&provider).await?;

        // 3. Cache the instance
        self.ctx
            .provider_instances
            .insert(provider.id.clone(), instance)
            .await;

        log::info!(
            "Created {} provider {} for user {}",
            provider.provider_type,
            provider.id,
            user.id
        );
        Ok(provider)
    }

    pub async fn get_provider(&self, user: &User, id: &Identifier) -> CoreResult<Provider> {
        let provider = self.ctx.repos.providers.find_by_id(id).await?;
        ensure_provider_owner(&user.id, provider, id)
    }

    pub async fn list_providers(&self, user: &User) -> CoreResult<Vec<Provider>> {
        self.ctx.repos.providers.find_by_owner(&user.id).await
    }

    /// Update comment and/or configuration
    pub async fn update_provider(
        &self,
        user: &User,
        id: &Identifier,
        request: UpdateProviderRequest,
    ) -> CoreResult<Provider> {
        self.ensure_enabled()?;
        let mut provider = self.get_provider(user, id).await?;

        if let Some(comment) = request.comment {
            provider.comment = comment;
        }
        if let Some(payload) = request.payload {
            self.ctx
                .provider_types
                .build(&provider.provider_type, &payload)?;
            provider.payload = payload;
        }

        self.ctx.repos.providers.save(&provider).await?;
        self.ctx.provider_instances.remove(&provider.id).await;
        Ok(provider)
    }

    /// Delete a provider no domain relies on
    pub async fn delete_provider(&self, user: &User, id: &Identifier) -> CoreResult<()> {
        self.ensure_enabled()?;
        let provider = self.get_provider(user, id).await?;

        let users: Vec<String> = self
            .ctx
            .repos
            .domains
            .find_by_owner(&user.id)
            .await?
            .into_iter()
            .filter(|d| d.provider_id == provider.id)
            .map(|d| d.name)
            .collect();
        if !users.is_empty() {
            return Err(CoreError::ValidationError(format!(
                "provider is still used by {}",
                users.join(", ")
            )));
        }

        self.ctx.repos.providers.delete(&provider.id).await?;
        self.ctx.provider_instances.remove(&provider.id).await;
        log::info!("Deleted provider {}", provider.id);
        Ok(())
    }

    /// Zones hosted on the provider's account
    pub async fn list_remote_zones(&self, user: &User, id: &Identifier) -> CoreResult<Vec<String>> {
        let provider = self.ctx.get_provider(&user.id, id).await?;
        if !provider.can_list_zones() {
            return Err(CoreError::ValidationError(format!(
                "{} providers cannot list their zones",
                provider.id()
            )));
        }
        match provider.list_zones().await {
            Ok(zones) => Ok(zones),
            Err(e) => Err(self.ctx.handle_provider_error(id, e).await),
        }
    }
}

//! Account owners

use std::sync::Arc;

use chrono::Utc;

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::types::{Identifier, User};

/// User management service
pub struct UserService {
    ctx: Arc<ServiceContext>,
}

impl UserService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Create an account for `email`
    pub async fn register(&self, email: &str) -> CoreResult<User> {
        if self.ctx.options.disable_registration {
            return Err(CoreError::Forbidden(
                "registration is disabled on this instance".to_string(),
            ));
        }

        let email = email.trim();
        if email.len() < 3 || !email.contains('@') {
            return Err(CoreError::ValidationError(format!(
                "invalid e-mail address {email:?}"
            )));
        }
        if self.ctx.repos.users.find_by_email(email).await?.is_some() {
            return Err(CoreError::ValidationError(format!(
                "an account already exists for {email}"
            )));
        }

        let user = User::new(email);
        self.ctx.repos.users.save(&user).await?;
        log::info!("Registered user {} ({email})", user.id);
        Ok(user)
    }

    pub async fn get_user(&self, id: &Identifier) -> CoreResult<User> {
        self.ctx
            .repos
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(id.to_string()))
    }

    pub async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        self.ctx.repos.users.find_by_email(email.trim()).await
    }

    pub async fn list_users(&self) -> CoreResult<Vec<User>> {
        self.ctx.repos.users.find_all().await
    }

    /// Record activity of `user`
    pub async fn touch(&self, user: &mut User) -> CoreResult<()> {
        user.last_seen = Some(Utc::now());
        self.ctx.repos.users.save(user).await
    }

    /// Delete a user together with its domains, zones, journals and
    /// providers
    pub async fn delete_user(&self, id: &Identifier) -> CoreResult<()> {
        let user = self.get_user(id).await?;
        let repos = &self.ctx.repos;

        for domain in repos.domains.find_by_owner(&user.id).await? {
            for zone_id in &domain.zone_history {
                repos.zones.delete(zone_id).await?;
            }
            repos.domain_logs.delete_by_domain(&domain.id).await?;
            repos.domains.delete(&domain.id).await?;
        }
        for provider in repos.providers.find_by_owner(&user.id).await? {
            self.ctx.provider_instances.remove(&provider.id).await;
            repos.providers.delete(&provider.id).await?;
        }

        repos.users.delete(&user.id).await?;
        log::info!("Deleted user {}", user.id);
        Ok(())
    }
}

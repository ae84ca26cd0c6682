//! Domain journal

use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::types::{DomainLog, Identifier, LogLevel, User};

/// Domain journal service
pub struct DomainLogService {
    ctx: Arc<ServiceContext>,
}

impl DomainLogService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Append an entry to the journal of one of the user's domains
    pub async fn append(
        &self,
        user: &User,
        domain_id: &Identifier,
        level: LogLevel,
        content: &str,
    ) -> CoreResult<DomainLog> {
        let domain = self.ctx.get_domain(user, domain_id).await?;
        let entry = DomainLog::new(domain.id, user.id.clone(), level, content);
        self.ctx.append_domain_log(&entry).await?;
        Ok(entry)
    }

    /// Entries of a domain, newest first
    pub async fn list(&self, user: &User, domain_id: &Identifier) -> CoreResult<Vec<DomainLog>> {
        let domain = self.ctx.get_domain(user, domain_id).await?;
        let mut logs = self.ctx.repos.domain_logs.find_by_domain(&domain.id).await?;
        // stable: entries sharing a timestamp keep the repository order
        logs.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(logs)
    }

    pub async fn delete(
        &self,
        user: &User,
        domain_id: &Identifier,
        log_id: &Identifier,
    ) -> CoreResult<()> {
        let domain = self.ctx.get_domain(user, domain_id).await?;
        let known = self
            .ctx
            .repos
            .domain_logs
            .find_by_domain(&domain.id)
            .await?
            .iter()
            .any(|l| &l.id == log_id);
        if !known {
            return Err(CoreError::ValidationError(format!(
                "no journal entry {log_id} on {}",
                domain.name
            )));
        }
        self.ctx.repos.domain_logs.delete(&domain.id, log_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;

    #[tokio::test]
    async fn append_list_delete() {
        let env = TestEnv::new().await;
        let domain = env.import_domain("example.com.").await;
        let svc = DomainLogService::new(env.ctx.clone());

        let entry = svc
            .append(&env.user, &domain.id, LogLevel::Warn, "odd TTL")
            .await
            .unwrap();

        let logs = svc.list(&env.user, &domain.id).await.unwrap();
        assert_eq!(logs[0], entry);
        assert!(logs.windows(2).all(|w| w[0].date >= w[1].date));

        svc.delete(&env.user, &domain.id, &entry.id).await.unwrap();
        let logs = svc.list(&env.user, &domain.id).await.unwrap();
        assert!(logs.iter().all(|l| l.id != entry.id));

        assert!(svc.delete(&env.user, &domain.id, &entry.id).await.is_err());
    }

    #[tokio::test]
    async fn foreign_journal_is_hidden() {
        let env = TestEnv::new().await;
        let domain = env.import_domain("example.com.").await;
        let stranger = env.other_user().await;

        let err = DomainLogService::new(env.ctx.clone())
            .list(&stranger, &domain.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::DomainNotFound(_)));
    }
}

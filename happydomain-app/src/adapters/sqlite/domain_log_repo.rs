//! `DomainLogRepository` implementation for `SqliteStore`.

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use happydomain_core::error::{CoreError, CoreResult};
use happydomain_core::traits::DomainLogRepository;
use happydomain_core::types::{DomainLog, Identifier, LogLevel};

use super::entity::domain_log;
use super::{SqliteStore, format_time, parse_id, parse_time, storage_error};

impl domain_log::Model {
    fn into_log(self) -> CoreResult<DomainLog> {
        let level = LogLevel::from_name(&self.level).ok_or_else(|| {
            CoreError::SerializationError(format!("Invalid log level: {}", self.level))
        })?;

        Ok(DomainLog {
            id: parse_id("log id", &self.id)?,
            domain_id: parse_id("domain_id", &self.domain_id)?,
            author: parse_id("log author", &self.author)?,
            date: parse_time("date", &self.date)?,
            level,
            content: self.content,
        })
    }
}

fn log_to_active_model(log: &DomainLog) -> domain_log::ActiveModel {
    domain_log::ActiveModel {
        id: Set(log.id.to_string()),
        domain_id: Set(log.domain_id.to_string()),
        author: Set(log.author.to_string()),
        date: Set(format_time(&log.date)),
        level: Set(log.level.as_str().to_string()),
        content: Set(log.content.clone()),
    }
}

fn collect_logs(rows: Vec<domain_log::Model>) -> CoreResult<Vec<DomainLog>> {
    rows.into_iter().map(domain_log::Model::into_log).collect()
}

#[async_trait]
impl DomainLogRepository for SqliteStore {
    async fn find_all(&self) -> CoreResult<Vec<DomainLog>> {
        let rows = domain_log::Entity::find()
            .order_by_asc(domain_log::Column::DomainId)
            .order_by_desc(domain_log::Column::Date)
            .all(&self.db)
            .await
            .map_err(storage_error("query domain logs"))?;
        collect_logs(rows)
    }

    async fn find_by_domain(&self, domain_id: &Identifier) -> CoreResult<Vec<DomainLog>> {
        let rows = domain_log::Entity::find()
            .filter(domain_log::Column::DomainId.eq(domain_id.to_string()))
            .order_by_desc(domain_log::Column::Date)
            .all(&self.db)
            .await
            .map_err(storage_error("query domain logs"))?;
        collect_logs(rows)
    }

    async fn append(&self, log: &DomainLog) -> CoreResult<()> {
        domain_log::Entity::insert(log_to_active_model(log))
            .exec(&self.db)
            .await
            .map_err(storage_error("append domain log"))?;
        Ok(())
    }

    async fn update(&self, log: &DomainLog) -> CoreResult<()> {
        domain_log::Entity::insert(log_to_active_model(log))
            .on_conflict(
                OnConflict::column(domain_log::Column::Id)
                    .update_columns([
                        domain_log::Column::DomainId,
                        domain_log::Column::Author,
                        domain_log::Column::Date,
                        domain_log::Column::Level,
                        domain_log::Column::Content,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(storage_error("save domain log"))?;
        Ok(())
    }

    async fn delete(&self, domain_id: &Identifier, id: &Identifier) -> CoreResult<()> {
        domain_log::Entity::delete_many()
            .filter(domain_log::Column::DomainId.eq(domain_id.to_string()))
            .filter(domain_log::Column::Id.eq(id.to_string()))
            .exec(&self.db)
            .await
            .map_err(storage_error("delete domain log"))?;
        Ok(())
    }

    async fn delete_by_domain(&self, domain_id: &Identifier) -> CoreResult<()> {
        let result = domain_log::Entity::delete_many()
            .filter(domain_log::Column::DomainId.eq(domain_id.to_string()))
            .exec(&self.db)
            .await
            .map_err(storage_error("delete domain logs"))?;
        log::debug!(
            "Deleted {} log entries of domain {domain_id}",
            result.rows_affected
        );
        Ok(())
    }
}

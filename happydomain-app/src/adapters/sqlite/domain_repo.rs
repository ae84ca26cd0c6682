//! `DomainRepository` implementation for `SqliteStore`.

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use happydomain_core::error::CoreResult;
use happydomain_core::traits::DomainRepository;
use happydomain_core::types::{Domain, Identifier};

use super::entity::domain;
use super::{SqliteStore, from_json, parse_id, storage_error, to_json};

impl domain::Model {
    fn into_domain(self) -> CoreResult<Domain> {
        Ok(Domain {
            id: parse_id("domain id", &self.id)?,
            owner: parse_id("domain owner", &self.owner)?,
            name: self.name,
            provider_id: parse_id("provider_id", &self.provider_id)?,
            zone_history: from_json("zone_history", &self.zone_history)?,
            group: self.group_name,
        })
    }
}

fn domain_to_active_model(domain: &Domain) -> CoreResult<domain::ActiveModel> {
    Ok(domain::ActiveModel {
        id: Set(domain.id.to_string()),
        owner: Set(domain.owner.to_string()),
        name: Set(domain.name.clone()),
        provider_id: Set(domain.provider_id.to_string()),
        zone_history: Set(to_json(&domain.zone_history)?),
        group_name: Set(domain.group.clone()),
    })
}

#[async_trait]
impl DomainRepository for SqliteStore {
    async fn find_all(&self) -> CoreResult<Vec<Domain>> {
        domain::Entity::find()
            .order_by_asc(domain::Column::Name)
            .all(&self.db)
            .await
            .map_err(storage_error("query domains"))?
            .into_iter()
            .map(domain::Model::into_domain)
            .collect()
    }

    async fn find_by_id(&self, id: &Identifier) -> CoreResult<Option<Domain>> {
        domain::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(storage_error("query domain"))?
            .map(domain::Model::into_domain)
            .transpose()
    }

    async fn find_by_owner(&self, owner: &Identifier) -> CoreResult<Vec<Domain>> {
        domain::Entity::find()
            .filter(domain::Column::Owner.eq(owner.to_string()))
            .order_by_asc(domain::Column::Name)
            .all(&self.db)
            .await
            .map_err(storage_error("query domains"))?
            .into_iter()
            .map(domain::Model::into_domain)
            .collect()
    }

    async fn save(&self, domain: &Domain) -> CoreResult<()> {
        domain::Entity::insert(domain_to_active_model(domain)?)
            .on_conflict(
                OnConflict::column(domain::Column::Id)
                    .update_columns([
                        domain::Column::Owner,
                        domain::Column::Name,
                        domain::Column::ProviderId,
                        domain::Column::ZoneHistory,
                        domain::Column::GroupName,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(storage_error("save domain"))?;
        Ok(())
    }

    async fn delete(&self, id: &Identifier) -> CoreResult<()> {
        domain::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await
            .map_err(storage_error("delete domain"))?;
        Ok(())
    }
}

//! `ProviderRepository` implementation for `SqliteStore`.

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};

use happydomain_core::error::CoreResult;
use happydomain_core::traits::ProviderRepository;
use happydomain_core::types::{Identifier, Provider};

use super::entity::provider;
use super::{SqliteStore, from_json, parse_id, storage_error, to_json};

impl provider::Model {
    fn into_provider(self) -> CoreResult<Provider> {
        Ok(Provider {
            id: parse_id("provider id", &self.id)?,
            owner: parse_id("provider owner", &self.owner)?,
            provider_type: self.provider_type,
            comment: self.comment,
            payload: from_json("payload", &self.payload)?,
        })
    }
}

fn provider_to_active_model(provider: &Provider) -> CoreResult<provider::ActiveModel> {
    Ok(provider::ActiveModel {
        id: Set(provider.id.to_string()),
        owner: Set(provider.owner.to_string()),
        provider_type: Set(provider.provider_type.clone()),
        comment: Set(provider.comment.clone()),
        payload: Set(to_json(&provider.payload)?),
    })
}

#[async_trait]
impl ProviderRepository for SqliteStore {
    async fn find_all(&self) -> CoreResult<Vec<Provider>> {
        provider::Entity::find()
            .all(&self.db)
            .await
            .map_err(storage_error("query providers"))?
            .into_iter()
            .map(provider::Model::into_provider)
            .collect()
    }

    async fn find_by_id(&self, id: &Identifier) -> CoreResult<Option<Provider>> {
        provider::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(storage_error("query provider"))?
            .map(provider::Model::into_provider)
            .transpose()
    }

    async fn find_by_owner(&self, owner: &Identifier) -> CoreResult<Vec<Provider>> {
        provider::Entity::find()
            .filter(provider::Column::Owner.eq(owner.to_string()))
            .all(&self.db)
            .await
            .map_err(storage_error("query providers"))?
            .into_iter()
            .map(provider::Model::into_provider)
            .collect()
    }

    async fn save(&self, provider: &Provider) -> CoreResult<()> {
        provider::Entity::insert(provider_to_active_model(provider)?)
            .on_conflict(
                OnConflict::column(provider::Column::Id)
                    .update_columns([
                        provider::Column::Owner,
                        provider::Column::ProviderType,
                        provider::Column::Comment,
                        provider::Column::Payload,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(storage_error("save provider"))?;
        Ok(())
    }

    async fn delete(&self, id: &Identifier) -> CoreResult<()> {
        provider::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await
            .map_err(storage_error("delete provider"))?;
        Ok(())
    }
}

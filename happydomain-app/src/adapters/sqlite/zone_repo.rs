//! `ZoneRepository` implementation for `SqliteStore`.

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::Set, EntityTrait};

use happydomain_core::error::{CoreError, CoreResult};
use happydomain_core::traits::ZoneRepository;
use happydomain_core::types::{Identifier, Zone, ZoneMeta};

use super::entity::zone;
use super::{
    SqliteStore, format_time, from_json, parse_id, parse_optional_time, parse_time,
    storage_error, to_json,
};

impl zone::Model {
    fn into_zone(self) -> CoreResult<Zone> {
        let default_ttl = u32::try_from(self.default_ttl).map_err(|_| {
            CoreError::SerializationError(format!("Invalid default_ttl: {}", self.default_ttl))
        })?;

        Ok(Zone {
            meta: ZoneMeta {
                id: parse_id("zone id", &self.id)?,
                author: parse_id("zone author", &self.author)?,
                default_ttl,
                last_modified: parse_time("last_modified", &self.last_modified)?,
                commit_msg: self.commit_msg,
                commit_date: parse_optional_time("commit_date", self.commit_date.as_deref())?,
                published: parse_optional_time("published", self.published.as_deref())?,
            },
            services: from_json("services", &self.services)?,
        })
    }
}

fn zone_to_active_model(zone: &Zone) -> CoreResult<zone::ActiveModel> {
    let meta = &zone.meta;
    Ok(zone::ActiveModel {
        id: Set(meta.id.to_string()),
        author: Set(meta.author.to_string()),
        default_ttl: Set(i64::from(meta.default_ttl)),
        last_modified: Set(format_time(&meta.last_modified)),
        commit_msg: Set(meta.commit_msg.clone()),
        commit_date: Set(meta.commit_date.as_ref().map(format_time)),
        published: Set(meta.published.as_ref().map(format_time)),
        services: Set(to_json(&zone.services)?),
    })
}

#[async_trait]
impl ZoneRepository for SqliteStore {
    async fn find_all(&self) -> CoreResult<Vec<Zone>> {
        zone::Entity::find()
            .all(&self.db)
            .await
            .map_err(storage_error("query zones"))?
            .into_iter()
            .map(zone::Model::into_zone)
            .collect()
    }

    async fn find_by_id(&self, id: &Identifier) -> CoreResult<Option<Zone>> {
        zone::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(storage_error("query zone"))?
            .map(zone::Model::into_zone)
            .transpose()
    }

    async fn create(&self, zone: &mut Zone) -> CoreResult<()> {
        zone.meta.id = Identifier::random();
        zone::Entity::insert(zone_to_active_model(zone)?)
            .exec(&self.db)
            .await
            .map_err(storage_error("create zone"))?;
        Ok(())
    }

    async fn update(&self, zone: &Zone) -> CoreResult<()> {
        zone::Entity::insert(zone_to_active_model(zone)?)
            .on_conflict(
                OnConflict::column(zone::Column::Id)
                    .update_columns([
                        zone::Column::Author,
                        zone::Column::DefaultTtl,
                        zone::Column::LastModified,
                        zone::Column::CommitMsg,
                        zone::Column::CommitDate,
                        zone::Column::Published,
                        zone::Column::Services,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(storage_error("save zone"))?;
        Ok(())
    }

    async fn delete(&self, id: &Identifier) -> CoreResult<()> {
        zone::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await
            .map_err(storage_error("delete zone"))?;
        Ok(())
    }
}

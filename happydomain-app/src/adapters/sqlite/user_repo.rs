//! `UserRepository` implementation for `SqliteStore`.

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use happydomain_core::error::CoreResult;
use happydomain_core::traits::UserRepository;
use happydomain_core::types::{Identifier, User};

use super::entity::user;
use super::{
    SqliteStore, format_time, parse_id, parse_optional_time, parse_time, storage_error,
};

impl user::Model {
    fn into_user(self) -> CoreResult<User> {
        Ok(User {
            id: parse_id("user id", &self.id)?,
            email: self.email,
            created_at: parse_time("created_at", &self.created_at)?,
            last_seen: parse_optional_time("last_seen", self.last_seen.as_deref())?,
        })
    }
}

fn user_to_active_model(user: &User) -> user::ActiveModel {
    user::ActiveModel {
        id: Set(user.id.to_string()),
        email: Set(user.email.clone()),
        created_at: Set(format_time(&user.created_at)),
        last_seen: Set(user.last_seen.as_ref().map(format_time)),
    }
}

#[async_trait]
impl UserRepository for SqliteStore {
    async fn find_all(&self) -> CoreResult<Vec<User>> {
        user::Entity::find()
            .order_by_asc(user::Column::Email)
            .all(&self.db)
            .await
            .map_err(storage_error("query users"))?
            .into_iter()
            .map(user::Model::into_user)
            .collect()
    }

    async fn find_by_id(&self, id: &Identifier) -> CoreResult<Option<User>> {
        user::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(storage_error("query user"))?
            .map(user::Model::into_user)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(storage_error("query user"))?
            .map(user::Model::into_user)
            .transpose()
    }

    async fn save(&self, user: &User) -> CoreResult<()> {
        user::Entity::insert(user_to_active_model(user))
            .on_conflict(
                OnConflict::column(user::Column::Id)
                    .update_columns([
                        user::Column::Email,
                        user::Column::CreatedAt,
                        user::Column::LastSeen,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(storage_error("save user"))?;
        Ok(())
    }

    async fn delete(&self, id: &Identifier) -> CoreResult<()> {
        user::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await
            .map_err(storage_error("delete user"))?;
        Ok(())
    }
}

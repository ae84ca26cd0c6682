//! `SeaORM` entity for the `zones` table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "zones")]
/// Database row model for a zone snapshot.
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub author: String,
    pub default_ttl: i64,
    pub last_modified: String,
    pub commit_msg: Option<String>,
    pub commit_date: Option<String>,
    pub published: Option<String>,
    /// Services grouped by subdomain, JSON object.
    pub services: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

//! `SeaORM` entities, one per table.

pub mod domain;
pub mod domain_log;
pub mod provider;
pub mod user;
pub mod zone;

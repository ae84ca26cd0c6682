//! SQLite-based unified store using `SeaORM`.
//!
//! A single `SqliteStore` implements every repository trait of the core
//! (`UserRepository`, `ProviderRepository`, `DomainRepository`,
//! `ZoneRepository`, `DomainLogRepository`) against one `SQLite` database.
//! Identifiers are stored in their string form, timestamps as fixed-width
//! RFC 3339 strings, and nested values (payloads, service maps, zone
//! histories) as JSON text.

mod domain_log_repo;
mod domain_repo;
pub(crate) mod entity;
mod migration;
mod provider_repo;
mod user_repo;
mod zone_repo;

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use happydomain_core::error::{CoreError, CoreResult};
use happydomain_core::types::Identifier;
use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use migration::Migrator;

/// SQLite-based store for every persisted entity of the core.
pub struct SqliteStore {
    /// Shared `SeaORM` database connection.
    pub(crate) db: DatabaseConnection,
}

impl SqliteStore {
    /// Open (or create) the database file at `db_path`.
    ///
    /// # Errors
    /// Returns `CoreError::StorageError` if directory creation, database
    /// connection, or schema migration fails.
    pub async fn new(db_path: &Path) -> CoreResult<Self> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| CoreError::StorageError(format!("Failed to create directory: {e}")))?;
        }

        Self::connect_url(&format!("sqlite://{}?mode=rwc", db_path.display())).await
    }

    /// Open the store named by a configuration value: either a `sqlite:`
    /// URL (e.g. `sqlite::memory:`) or a plain file path.
    pub async fn open(database_url: &str) -> CoreResult<Self> {
        if database_url.starts_with("sqlite:") {
            Self::connect_url(database_url).await
        } else {
            Self::new(Path::new(database_url)).await
        }
    }

    async fn connect_url(db_url: &str) -> CoreResult<Self> {
        let db = Database::connect(db_url)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to connect to SQLite: {e}")))?;

        let store = Self { db };

        // Ensure schema is up to date before the store is used.
        Migrator::up(&store.db, None)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to run migrations: {e}")))?;

        log::debug!("SQLite store ready at {db_url}");
        Ok(store)
    }
}

fn storage_error(action: &'static str) -> impl FnOnce(DbErr) -> CoreError {
    move |e| CoreError::StorageError(format!("Failed to {action}: {e}"))
}

fn parse_id(field: &str, value: &str) -> CoreResult<Identifier> {
    value
        .parse()
        .map_err(|e| CoreError::SerializationError(format!("Invalid {field}: {e}")))
}

/// Fixed-width UTC form, so that text order is chronological order.
fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_time(field: &str, value: &str) -> CoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CoreError::SerializationError(format!("Invalid {field}: {e}")))
}

fn parse_optional_time(field: &str, value: Option<&str>) -> CoreResult<Option<DateTime<Utc>>> {
    value.map(|v| parse_time(field, v)).transpose()
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> CoreResult<String> {
    serde_json::to_string(value).map_err(|e| CoreError::SerializationError(e.to_string()))
}

fn from_json<T: DeserializeOwned>(field: &str, value: &str) -> CoreResult<T> {
    serde_json::from_str(value)
        .map_err(|e| CoreError::SerializationError(format!("Invalid {field} JSON: {e}")))
}

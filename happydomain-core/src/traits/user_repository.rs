//! User persistence abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{Identifier, User};

/// User Warehouse Trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Get all users
    async fn find_all(&self) -> CoreResult<Vec<User>>;

    /// Get user based on ID
    async fn find_by_id(&self, id: &Identifier) -> CoreResult<Option<User>>;

    /// Get user based on e-mail address (case-insensitive)
    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>>;

    /// Save user (new or update)
    async fn save(&self, user: &User) -> CoreResult<()>;

    /// Delete user
    async fn delete(&self, id: &Identifier) -> CoreResult<()>;
}

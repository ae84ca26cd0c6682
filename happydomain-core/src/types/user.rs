//! Account owner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Identifier;

/// A user owning providers and domains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Identifier,
    pub email: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

impl User {
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: Identifier::random(),
            email: email.into(),
            created_at: Utc::now(),
            last_seen: None,
        }
    }
}

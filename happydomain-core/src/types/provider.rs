//! Stored provider configurations.

use serde::{Deserialize, Serialize};

use super::Identifier;

/// A user's configured DNS provider.
///
/// `payload` is the backend configuration, decoded by the backend type
/// registered under `provider_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: Identifier,
    pub owner: Identifier,
    #[serde(rename = "type")]
    pub provider_type: String,
    #[serde(default)]
    pub comment: String,
    pub payload: serde_json::Value,
}

/// Create provider request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProviderRequest {
    #[serde(rename = "type")]
    pub provider_type: String,
    #[serde(default)]
    pub comment: String,
    pub payload: serde_json::Value,
}

/// Update provider request; absent fields are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProviderRequest {
    pub comment: Option<String>,
    pub payload: Option<serde_json::Value>,
}

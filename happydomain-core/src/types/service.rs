//! Services as stored in zones.

use serde::{Deserialize, Serialize};

use super::Identifier;

/// One semantic group of records under a subdomain.
///
/// `id`, `nb_resources` and `comment` are derived from the payload by the
/// service catalog and refreshed on every edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Identifier,
    #[serde(rename = "type")]
    pub service_type: String,
    pub subdomain: String,
    /// TTL override; 0 inherits the zone default.
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub nb_resources: usize,
    #[serde(default)]
    pub comment: String,
    pub payload: serde_json::Value,
}

/// Service body submitted when adding or updating a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInput {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub ttl: u32,
    pub payload: serde_json::Value,
}

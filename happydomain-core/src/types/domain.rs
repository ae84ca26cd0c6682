//! Managed domains.

use serde::{Deserialize, Serialize};

use super::{Identifier, ZoneMeta};

/// A domain attached to one provider, with its zone history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: Identifier,
    pub owner: Identifier,
    /// Fully qualified, lowercased.
    pub name: String,
    pub provider_id: Identifier,
    /// Zone ids, most recent first.
    #[serde(default)]
    pub zone_history: Vec<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl Domain {
    /// Most recent zone, if the domain was ever imported.
    #[must_use]
    pub fn head_zone(&self) -> Option<&Identifier> {
        self.zone_history.first()
    }

    pub fn has_zone(&self, zone_id: &Identifier) -> bool {
        self.zone_history.contains(zone_id)
    }

    /// Record a new zone as the most recent one.
    pub fn push_zone(&mut self, zone_id: Identifier) {
        self.zone_history.insert(0, zone_id);
    }
}

/// Domain with the metadata of every zone in its history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainWithHistory {
    #[serde(flatten)]
    pub domain: Domain,
    pub zone_meta: Vec<ZoneMeta>,
}

/// Create domain request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDomainRequest {
    pub provider_id: Identifier,
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
}

/// Update domain request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDomainRequest {
    /// `Some("")` clears the group.
    pub group: Option<String>,
}

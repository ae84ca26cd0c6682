//! Request and response types of zone publishing operations.

use std::net::{Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

pub use happydomain_provider::{Correction, CorrectionKind};

/// Apply corrections request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyCorrectionsRequest {
    /// Ids of the corrections to push, as returned by a listing.
    #[serde(default)]
    pub wanted_corrections: Vec<String>,
    #[serde(default)]
    pub commit_msg: Option<String>,
}

/// Dynamic DNS update request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicUpdateRequest {
    /// Host names to update, comma separated lists are accepted.
    pub hostname: String,
    #[serde(default)]
    pub ipv4: Option<Ipv4Addr>,
    #[serde(default)]
    pub ipv6: Option<Ipv6Addr>,
}

impl DynamicUpdateRequest {
    /// Individual host names.
    pub fn hostnames(&self) -> Vec<String> {
        self.hostname
            .split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(String::from)
            .collect()
    }
}

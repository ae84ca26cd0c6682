//! Whole-database backup document.

use serde::{Deserialize, Serialize};

use super::{Domain, DomainLog, Provider, User, Zone};

/// Backup of every store, one top-level key per collection.
///
/// `UsersAuth` and `Sessions` belong to the authentication layer and are
/// carried through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Backup {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub users_auth: Vec<serde_json::Value>,
    #[serde(default)]
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub domains: Vec<Domain>,
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub sessions: Vec<serde_json::Value>,
    #[serde(default)]
    pub domains_logs: Vec<DomainLog>,
    /// Problems met while exporting.
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Counts of entities written back by a restore.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreResult {
    pub users: usize,
    pub providers: usize,
    pub domains: usize,
    pub zones: usize,
    pub domain_logs: usize,
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_keys() {
        let json = serde_json::to_value(Backup::default()).unwrap();
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            [
                "Domains",
                "DomainsLogs",
                "Errors",
                "Providers",
                "Sessions",
                "Users",
                "UsersAuth",
                "Zones"
            ]
        );
    }
}

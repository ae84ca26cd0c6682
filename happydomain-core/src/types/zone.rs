//! Zone snapshots.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Identifier, Service};

/// Fallback default TTL when a zone has no record to learn it from.
pub const DEFAULT_TTL: u32 = 3600;

/// Zone metadata, listed in domain history views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneMeta {
    pub id: Identifier,
    pub author: Identifier,
    pub default_ttl: u32,
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
}

/// A zone snapshot: services grouped by subdomain (`""` is the apex).
///
/// Once `published` or `commit_date` is set the zone is archived and must
/// not change anymore; edits go to a [derived](Zone::derive) copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    #[serde(flatten)]
    pub meta: ZoneMeta,
    #[serde(default)]
    pub services: BTreeMap<String, Vec<Service>>,
}

impl Zone {
    /// Empty editable zone. The id is assigned on creation in the store.
    #[must_use]
    pub fn new(author: Identifier, default_ttl: u32) -> Self {
        Self {
            meta: ZoneMeta {
                id: Identifier::default(),
                author,
                default_ttl,
                last_modified: Utc::now(),
                commit_msg: None,
                commit_date: None,
                published: None,
            },
            services: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &Identifier {
        &self.meta.id
    }

    #[must_use]
    pub fn is_editable(&self) -> bool {
        self.meta.commit_date.is_none() && self.meta.published.is_none()
    }

    /// Editable copy of this zone, not yet stored.
    #[must_use]
    pub fn derive(&self, author: Identifier) -> Self {
        let mut zone = Self::new(author, self.meta.default_ttl);
        zone.services = self.services.clone();
        zone
    }

    /// Archive the zone as pushed to the provider.
    pub fn publish(&mut self, author: Identifier, commit_msg: Option<String>, now: DateTime<Utc>) {
        self.meta.author = author;
        self.meta.commit_msg = commit_msg;
        self.meta.commit_date = Some(now);
        self.meta.published = Some(now);
    }

    /// Find a service by id, with its subdomain.
    #[must_use]
    pub fn find_service(&self, id: &Identifier) -> Option<(&str, &Service)> {
        self.services.iter().find_map(|(sub, svcs)| {
            svcs.iter()
                .find(|s| &s.id == id)
                .map(|s| (sub.as_str(), s))
        })
    }

    pub fn service_count(&self) -> usize {
        self.services.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_zone_is_editable_until_published() {
        let mut zone = Zone::new(Identifier::random(), 300);
        assert!(zone.is_editable());
        zone.publish(Identifier::random(), Some("first".into()), Utc::now());
        assert!(!zone.is_editable());
        assert_eq!(zone.meta.commit_msg.as_deref(), Some("first"));
    }

    #[test]
    fn derive_copies_services_and_resets_triple() {
        let author = Identifier::random();
        let mut zone = Zone::new(author.clone(), 300);
        zone.meta.id = Identifier::random();
        zone.services.insert("www".into(), Vec::new());
        zone.publish(author.clone(), Some("x".into()), Utc::now());

        let next = zone.derive(author);
        assert!(next.is_editable());
        assert!(next.id().is_empty());
        assert_eq!(next.services, zone.services);
        assert_eq!(next.meta.default_ttl, 300);
    }
}

//! Service catalog.
//!
//! A service type is a payload shape plus the code turning it into records
//! (and, for most types, an analyzer recognizing those records in a zone).
//! Types are registered once at startup under a string tag; stored services
//! carry their payload as JSON and are decoded through the catalog.

mod abstract_services;
mod mail;
mod orphan;
mod svcs;

use std::collections::HashMap;

use happydomain_provider::name::absolute_name;
use happydomain_provider::{Record, RecordData};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::Service;
use crate::validation::service_id;

pub use abstract_services::{Address, Delegation, Ds, Origin, Server, Soa, Sshfp};
pub use mail::{Dmarc, DmarcTag, Mx, Mxs, Spf};
pub use orphan::Orphan;
pub use svcs::{CaaEntry, CaaPolicy, Cname, Ptr, SrvEntry, Txt, UnknownSrv};

pub const ORIGIN: &str = "abstract.Origin";
pub const DELEGATION: &str = "abstract.Delegation";
pub const SERVER: &str = "abstract.Server";
pub const CNAME: &str = "svcs.CNAME";
pub const MXS: &str = "svcs.MXs";
pub const SPF: &str = "svcs.SPF";
pub const DMARC: &str = "svcs.DMARC";
pub const CAA_POLICY: &str = "svcs.CAAPolicy";
pub const UNKNOWN_SRV: &str = "svcs.UnknownSRV";
pub const PTR: &str = "svcs.PTR";
pub const TXT: &str = "svcs.TXT";
pub const ORPHAN: &str = "svcs.Orphan";

/// JSON form of a payload, available on every [`ServiceBody`].
pub trait ErasedPayload {
    fn to_payload(&self) -> serde_json::Result<serde_json::Value>;
}

impl<T: Serialize> ErasedPayload for T {
    fn to_payload(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Behaviour shared by every service payload.
pub trait ServiceBody: ErasedPayload + Send + Sync {
    /// Records this service stands for, owned by `subdomain` under `origin`.
    ///
    /// `ttl` applies to records without a TTL of their own. The output is
    /// normalized and deterministic.
    fn records(&self, subdomain: &str, ttl: u32, origin: &str) -> Vec<Record>;

    /// Number of records [`records`](Self::records) produces.
    fn nb_resources(&self) -> usize;

    /// Short human summary.
    fn comment(&self) -> String;
}

/// Records of one subdomain not yet claimed by an analyzer.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzerInput<'a> {
    pub origin: &'a str,
    pub subdomain: &'a str,
    pub records: &'a [Record],
}

impl<'a> AnalyzerInput<'a> {
    /// Records of type `rtype`, with their position in [`records`](Self::records).
    pub fn of_type(&self, rtype: &'a str) -> impl Iterator<Item = (usize, &'a Record)> + 'a {
        self.records
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.rtype().eq_ignore_ascii_case(rtype))
    }

    pub fn is_apex(&self) -> bool {
        self.subdomain.is_empty()
    }
}

/// Records an analyzer wants to turn into one service.
pub struct Claim {
    /// Positions in [`AnalyzerInput::records`].
    pub records: Vec<usize>,
    pub body: Box<dyn ServiceBody>,
}

impl Claim {
    pub fn new(records: Vec<usize>, body: impl ServiceBody + 'static) -> Self {
        Self {
            records,
            body: Box::new(body),
        }
    }
}

pub type DecodeFn = fn(&serde_json::Value) -> serde_json::Result<Box<dyn ServiceBody>>;
pub type AnalyzeFn = fn(&AnalyzerInput<'_>) -> Vec<Claim>;

fn decode_as<T>(payload: &serde_json::Value) -> serde_json::Result<Box<dyn ServiceBody>>
where
    T: ServiceBody + DeserializeOwned + 'static,
{
    Ok(Box::new(T::deserialize(payload)?))
}

/// Public description of a service type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    #[serde(rename = "type")]
    pub tag: String,
    pub name: String,
    pub description: String,
    /// Whether the analyzer recognizes this type in imported zones.
    pub analyzed: bool,
}

/// One registered service type.
pub struct ServiceSpec {
    pub info: ServiceInfo,
    decode: DecodeFn,
    analyze: Option<AnalyzeFn>,
}

impl ServiceSpec {
    pub fn new<T>(tag: &str, name: &str, description: &str) -> Self
    where
        T: ServiceBody + DeserializeOwned + 'static,
    {
        Self {
            info: ServiceInfo {
                tag: tag.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                analyzed: false,
            },
            decode: decode_as::<T>,
            analyze: None,
        }
    }

    #[must_use]
    pub fn with_analyzer(mut self, analyze: AnalyzeFn) -> Self {
        self.info.analyzed = true;
        self.analyze = Some(analyze);
        self
    }

    pub fn tag(&self) -> &str {
        &self.info.tag
    }

    pub fn decode(&self, payload: &serde_json::Value) -> CoreResult<Box<dyn ServiceBody>> {
        (self.decode)(payload).map_err(|e| {
            CoreError::ValidationError(format!("invalid {} payload: {e}", self.info.tag))
        })
    }

    /// Run the analyzer; types without one claim nothing.
    pub fn analyze(&self, input: &AnalyzerInput<'_>) -> Vec<Claim> {
        self.analyze.map(|f| f(input)).unwrap_or_default()
    }
}

impl std::fmt::Debug for ServiceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceSpec")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Registered service types, in analyzer order.
#[derive(Debug, Default)]
pub struct ServiceCatalog {
    specs: Vec<ServiceSpec>,
    index: HashMap<String, usize>,
}

impl ServiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with every built-in type, most specific analyzer first.
    pub fn with_builtin_services() -> Self {
        let mut catalog = Self::new();
        for spec in [
            abstract_services::origin_spec(),
            abstract_services::delegation_spec(),
            abstract_services::server_spec(),
            svcs::cname_spec(),
            mail::mxs_spec(),
            mail::spf_spec(),
            mail::dmarc_spec(),
            svcs::caa_spec(),
            svcs::srv_spec(),
            svcs::ptr_spec(),
            svcs::txt_spec(),
            orphan::orphan_spec(),
        ] {
            catalog.insert(spec);
        }
        catalog
    }

    fn insert(&mut self, spec: ServiceSpec) {
        self.index.insert(spec.info.tag.clone(), self.specs.len());
        self.specs.push(spec);
    }

    /// Register a service type. Tags are unique.
    pub fn register(&mut self, spec: ServiceSpec) -> CoreResult<()> {
        if self.index.contains_key(spec.tag()) {
            return Err(CoreError::Internal(format!(
                "service type {} registered twice",
                spec.tag()
            )));
        }
        log::debug!("Registered service type {}", spec.tag());
        self.insert(spec);
        Ok(())
    }

    pub fn get(&self, tag: &str) -> CoreResult<&ServiceSpec> {
        self.index
            .get(tag)
            .and_then(|&i| self.specs.get(i))
            .ok_or_else(|| CoreError::ValidationError(format!("unknown service type {tag:?}")))
    }

    /// Types with an analyzer, in registration order.
    pub fn analyzers(&self) -> impl Iterator<Item = &ServiceSpec> {
        self.specs.iter().filter(|s| s.analyze.is_some())
    }

    pub fn infos(&self) -> Vec<ServiceInfo> {
        self.specs.iter().map(|s| s.info.clone()).collect()
    }

    /// Decode a stored service's payload.
    pub fn decode(&self, service: &Service) -> CoreResult<Box<dyn ServiceBody>> {
        self.get(&service.service_type)?.decode(&service.payload)
    }

    /// Build a service from a payload, deriving id, count and comment.
    ///
    /// Fails when the payload produces no record.
    pub fn seal(
        &self,
        tag: &str,
        subdomain: &str,
        ttl: u32,
        body: &dyn ServiceBody,
        origin: &str,
    ) -> CoreResult<Service> {
        let records = body.records(subdomain, 0, origin);
        if records.is_empty() {
            return Err(CoreError::ValidationError(format!(
                "{tag} service at {subdomain:?} would not produce any record"
            )));
        }
        Ok(Service {
            id: service_id(&records),
            service_type: tag.to_string(),
            subdomain: subdomain.to_string(),
            ttl,
            nb_resources: body.nb_resources(),
            comment: body.comment(),
            payload: body.to_payload()?,
        })
    }

    /// Decode then [`seal`](Self::seal) a submitted payload.
    pub fn build_service(
        &self,
        tag: &str,
        subdomain: &str,
        ttl: u32,
        payload: &serde_json::Value,
        origin: &str,
    ) -> CoreResult<Service> {
        let body = self.get(tag)?.decode(payload)?;
        self.seal(tag, subdomain, ttl, body.as_ref(), origin)
    }

    /// Records of a stored service, inheriting `default_ttl` when the
    /// service has no TTL override.
    pub fn service_records(
        &self,
        service: &Service,
        origin: &str,
        default_ttl: u32,
    ) -> CoreResult<Vec<Record>> {
        let ttl = if service.ttl == 0 {
            default_ttl
        } else {
            service.ttl
        };
        Ok(self
            .decode(service)?
            .records(&service.subdomain, ttl, origin))
    }
}

/// TTL of a payload record: its own unless 0.
pub(crate) fn pick_ttl(own: u32, inherited: u32) -> u32 {
    if own == 0 { inherited } else { own }
}

/// Normalized record owned by `subdomain`.
pub(crate) fn make_record(subdomain: &str, origin: &str, ttl: u32, data: RecordData) -> Record {
    Record::new(absolute_name(subdomain, origin), ttl, data).normalized(origin)
}

/// Candidates sharing the TTL of the first one.
pub(crate) fn same_ttl<'a>(
    candidates: impl Iterator<Item = (usize, &'a Record)>,
) -> Vec<(usize, &'a Record)> {
    let mut out: Vec<(usize, &Record)> = Vec::new();
    for (i, r) in candidates {
        match out.first() {
            Some((_, first)) if first.ttl != r.ttl => {}
            _ => out.push((i, r)),
        }
    }
    out
}

/// Display form of a name in comments.
pub(crate) fn short_name(name: &str) -> &str {
    happydomain_provider::name::without_trailing_dot(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_order() {
        let catalog = ServiceCatalog::with_builtin_services();
        let tags: Vec<&str> = catalog.analyzers().map(ServiceSpec::tag).collect();
        assert_eq!(
            tags,
            [
                ORIGIN,
                DELEGATION,
                SERVER,
                CNAME,
                MXS,
                SPF,
                DMARC,
                CAA_POLICY,
                UNKNOWN_SRV,
                PTR,
                TXT
            ]
        );
        assert!(catalog.get(ORPHAN).is_ok());
        assert_eq!(catalog.infos().len(), 12);
    }

    #[test]
    fn duplicate_tag_is_rejected() {
        let mut catalog = ServiceCatalog::with_builtin_services();
        let err = catalog
            .register(ServiceSpec::new::<Txt>(TXT, "TXT", "again"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Internal(_)));
    }

    #[test]
    fn unknown_type_is_a_validation_error() {
        let catalog = ServiceCatalog::with_builtin_services();
        assert!(matches!(
            catalog.get("svcs.Nope"),
            Err(CoreError::ValidationError(_))
        ));
    }

    #[test]
    fn empty_payload_cannot_be_sealed() {
        let catalog = ServiceCatalog::with_builtin_services();
        let err = catalog
            .build_service(MXS, "", 0, &serde_json::json!({ "mx": [] }), "example.com.")
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn service_ttl_overrides_zone_default() {
        let catalog = ServiceCatalog::with_builtin_services();
        let mut svc = catalog
            .build_service(
                CNAME,
                "www",
                0,
                &serde_json::json!({ "target": "example.net." }),
                "example.com.",
            )
            .unwrap();
        let records = catalog.service_records(&svc, "example.com.", 1234).unwrap();
        assert_eq!(records[0].ttl, 1234);

        svc.ttl = 60;
        let records = catalog.service_records(&svc, "example.com.", 1234).unwrap();
        assert_eq!(records[0].ttl, 60);
    }
}

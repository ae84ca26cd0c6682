//! Single-purpose record services.

use happydomain_provider::name::absolute_name;
use happydomain_provider::{Record, RecordData};
use serde::{Deserialize, Serialize};

use super::{
    AnalyzerInput, CAA_POLICY, CNAME, Claim, PTR, ServiceBody, ServiceSpec, TXT, UNKNOWN_SRV,
    make_record, pick_ttl, same_ttl, short_name,
};

const TXT_EXCERPT: usize = 40;

// ============ svcs.CNAME ============

/// Alias to another name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cname {
    pub target: String,
    #[serde(default)]
    pub ttl: u32,
}

impl ServiceBody for Cname {
    fn records(&self, subdomain: &str, ttl: u32, origin: &str) -> Vec<Record> {
        vec![make_record(
            subdomain,
            origin,
            pick_ttl(self.ttl, ttl),
            RecordData::CNAME {
                target: absolute_name(&self.target, origin),
            },
        )]
    }

    fn nb_resources(&self) -> usize {
        1
    }

    fn comment(&self) -> String {
        format!("→ {}", short_name(&self.target))
    }
}

/// The only record of its type at the owner, or nothing.
fn single<'a>(input: &AnalyzerInput<'a>, rtype: &'a str) -> Option<(usize, &'a Record)> {
    let mut found = input.of_type(rtype);
    let first = found.next()?;
    found.next().is_none().then_some(first)
}

fn analyze_cname(input: &AnalyzerInput<'_>) -> Vec<Claim> {
    match single(input, "CNAME") {
        Some((i, r)) => match &r.data {
            RecordData::CNAME { target } => vec![Claim::new(
                vec![i],
                Cname {
                    target: target.clone(),
                    ttl: r.ttl,
                },
            )],
            _ => Vec::new(),
        },
        None => Vec::new(),
    }
}

pub(super) fn cname_spec() -> ServiceSpec {
    ServiceSpec::new::<Cname>(CNAME, "Alias", "Make this subdomain an alias of another name")
        .with_analyzer(analyze_cname)
}

// ============ svcs.CAAPolicy ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaaEntry {
    #[serde(default)]
    pub flags: u8,
    pub tag: String,
    pub value: String,
}

/// Certification authorities allowed to issue for this name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaaPolicy {
    pub records: Vec<CaaEntry>,
    #[serde(default)]
    pub ttl: u32,
}

impl ServiceBody for CaaPolicy {
    fn records(&self, subdomain: &str, ttl: u32, origin: &str) -> Vec<Record> {
        self.records
            .iter()
            .map(|caa| {
                make_record(
                    subdomain,
                    origin,
                    pick_ttl(self.ttl, ttl),
                    RecordData::CAA {
                        flags: caa.flags,
                        tag: caa.tag.clone(),
                        value: caa.value.clone(),
                    },
                )
            })
            .collect()
    }

    fn nb_resources(&self) -> usize {
        self.records.len()
    }

    fn comment(&self) -> String {
        let issuers: Vec<&str> = self
            .records
            .iter()
            .filter(|c| c.tag.eq_ignore_ascii_case("issue") || c.tag.eq_ignore_ascii_case("issuewild"))
            .map(|c| if c.value.is_empty() { ";" } else { c.value.as_str() })
            .collect();
        if issuers.is_empty() {
            format!("{} CAA records", self.records.len())
        } else {
            issuers.join(", ")
        }
    }
}

fn analyze_caa(input: &AnalyzerInput<'_>) -> Vec<Claim> {
    let mut claimed = Vec::new();
    let mut policy = CaaPolicy::default();
    for (i, r) in same_ttl(input.of_type("CAA")) {
        if let RecordData::CAA { flags, tag, value } = &r.data {
            policy.ttl = r.ttl;
            policy.records.push(CaaEntry {
                flags: *flags,
                tag: tag.clone(),
                value: value.clone(),
            });
            claimed.push(i);
        }
    }
    if claimed.is_empty() {
        return Vec::new();
    }
    vec![Claim::new(claimed, policy)]
}

pub(super) fn caa_spec() -> ServiceSpec {
    ServiceSpec::new::<CaaPolicy>(
        CAA_POLICY,
        "Certification Authority Authorization",
        "Restrict which CAs may issue certificates",
    )
    .with_analyzer(analyze_caa)
}

// ============ svcs.UnknownSRV ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrvEntry {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: String,
}

/// SRV records of a `_service._proto` name without a dedicated service type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownSrv {
    pub records: Vec<SrvEntry>,
    #[serde(default)]
    pub ttl: u32,
}

impl ServiceBody for UnknownSrv {
    fn records(&self, subdomain: &str, ttl: u32, origin: &str) -> Vec<Record> {
        self.records
            .iter()
            .map(|srv| {
                make_record(
                    subdomain,
                    origin,
                    pick_ttl(self.ttl, ttl),
                    RecordData::SRV {
                        priority: srv.priority,
                        weight: srv.weight,
                        port: srv.port,
                        target: absolute_name(&srv.target, origin),
                    },
                )
            })
            .collect()
    }

    fn nb_resources(&self) -> usize {
        self.records.len()
    }

    fn comment(&self) -> String {
        self.records
            .iter()
            .map(|s| format!("{}:{}", short_name(&s.target), s.port))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// `_service._proto[.name]`
fn is_srv_owner(subdomain: &str) -> bool {
    let mut labels = subdomain.split('.');
    matches!(
        (labels.next(), labels.next()),
        (Some(service), Some(proto)) if service.len() > 1 && service.starts_with('_') && proto.len() > 1 && proto.starts_with('_')
    )
}

fn analyze_srv(input: &AnalyzerInput<'_>) -> Vec<Claim> {
    if !is_srv_owner(input.subdomain) {
        return Vec::new();
    }
    let mut claimed = Vec::new();
    let mut srv = UnknownSrv::default();
    for (i, r) in same_ttl(input.of_type("SRV")) {
        if let RecordData::SRV {
            priority,
            weight,
            port,
            target,
        } = &r.data
        {
            srv.ttl = r.ttl;
            srv.records.push(SrvEntry {
                priority: *priority,
                weight: *weight,
                port: *port,
                target: target.clone(),
            });
            claimed.push(i);
        }
    }
    if claimed.is_empty() {
        return Vec::new();
    }
    vec![Claim::new(claimed, srv)]
}

pub(super) fn srv_spec() -> ServiceSpec {
    ServiceSpec::new::<UnknownSrv>(UNKNOWN_SRV, "Service", "Generic SRV service location")
        .with_analyzer(analyze_srv)
}

// ============ svcs.PTR ============

/// Pointer to a canonical name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ptr {
    pub target: String,
    #[serde(default)]
    pub ttl: u32,
}

impl ServiceBody for Ptr {
    fn records(&self, subdomain: &str, ttl: u32, origin: &str) -> Vec<Record> {
        vec![make_record(
            subdomain,
            origin,
            pick_ttl(self.ttl, ttl),
            RecordData::PTR {
                target: absolute_name(&self.target, origin),
            },
        )]
    }

    fn nb_resources(&self) -> usize {
        1
    }

    fn comment(&self) -> String {
        short_name(&self.target).to_string()
    }
}

fn analyze_ptr(input: &AnalyzerInput<'_>) -> Vec<Claim> {
    match single(input, "PTR") {
        Some((i, r)) => match &r.data {
            RecordData::PTR { target } => vec![Claim::new(
                vec![i],
                Ptr {
                    target: target.clone(),
                    ttl: r.ttl,
                },
            )],
            _ => Vec::new(),
        },
        None => Vec::new(),
    }
}

pub(super) fn ptr_spec() -> ServiceSpec {
    ServiceSpec::new::<Ptr>(PTR, "Pointer", "Reverse mapping to a host name")
        .with_analyzer(analyze_ptr)
}

// ============ svcs.TXT ============

/// Free-form text record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Txt {
    pub text: String,
    #[serde(default)]
    pub ttl: u32,
}

impl ServiceBody for Txt {
    fn records(&self, subdomain: &str, ttl: u32, origin: &str) -> Vec<Record> {
        vec![make_record(
            subdomain,
            origin,
            pick_ttl(self.ttl, ttl),
            RecordData::txt(self.text.clone()),
        )]
    }

    fn nb_resources(&self) -> usize {
        1
    }

    fn comment(&self) -> String {
        if self.text.chars().count() > TXT_EXCERPT {
            let excerpt: String = self.text.chars().take(TXT_EXCERPT).collect();
            format!("{excerpt}…")
        } else {
            self.text.clone()
        }
    }
}

fn analyze_txt(input: &AnalyzerInput<'_>) -> Vec<Claim> {
    input
        .of_type("TXT")
        .filter_map(|(i, r)| match &r.data {
            RecordData::TXT { text, .. } => Some(Claim::new(
                vec![i],
                Txt {
                    text: text.clone(),
                    ttl: r.ttl,
                },
            )),
            _ => None,
        })
        .collect()
}

pub(super) fn txt_spec() -> ServiceSpec {
    ServiceSpec::new::<Txt>(TXT, "Text record", "Arbitrary text attached to a name")
        .with_analyzer(analyze_txt)
}

//! Mail related services.

use happydomain_provider::name::absolute_name;
use happydomain_provider::{Record, RecordData};
use serde::{Deserialize, Serialize};

use super::{
    AnalyzerInput, Claim, DMARC, MXS, SPF, ServiceBody, ServiceSpec, make_record, pick_ttl,
    same_ttl, short_name,
};

// ============ svcs.MXs ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mx {
    pub preference: u16,
    pub target: String,
}

/// Mail exchangers of a domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mxs {
    pub mx: Vec<Mx>,
    #[serde(default)]
    pub ttl: u32,
}

impl ServiceBody for Mxs {
    fn records(&self, subdomain: &str, ttl: u32, origin: &str) -> Vec<Record> {
        self.mx
            .iter()
            .map(|mx| {
                make_record(
                    subdomain,
                    origin,
                    pick_ttl(self.ttl, ttl),
                    RecordData::MX {
                        preference: mx.preference,
                        exchange: absolute_name(&mx.target, origin),
                    },
                )
            })
            .collect()
    }

    fn nb_resources(&self) -> usize {
        self.mx.len()
    }

    fn comment(&self) -> String {
        let targets: Vec<&str> = self.mx.iter().map(|mx| short_name(&mx.target)).collect();
        format!("→ {}", targets.join(", "))
    }
}

fn analyze_mxs(input: &AnalyzerInput<'_>) -> Vec<Claim> {
    let mut claimed = Vec::new();
    let mut mxs = Mxs::default();
    for (i, r) in same_ttl(input.of_type("MX")) {
        if let RecordData::MX {
            preference,
            exchange,
        } = &r.data
        {
            mxs.ttl = r.ttl;
            mxs.mx.push(Mx {
                preference: *preference,
                target: exchange.clone(),
            });
            claimed.push(i);
        }
    }
    if claimed.is_empty() {
        return Vec::new();
    }
    vec![Claim::new(claimed, mxs)]
}

pub(super) fn mxs_spec() -> ServiceSpec {
    ServiceSpec::new::<Mxs>(MXS, "E-Mail servers", "Mail exchangers receiving e-mails")
        .with_analyzer(analyze_mxs)
}

// ============ svcs.SPF ============

const SPF_PREFIX: &str = "v=spf1";

/// Sender Policy Framework record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spf {
    /// Mechanisms and modifiers, in order.
    #[serde(default)]
    pub directives: Vec<String>,
    #[serde(default)]
    pub ttl: u32,
}

impl Spf {
    /// Parse a `v=spf1 ...` text. `None` for any other TXT.
    pub fn parse(text: &str) -> Option<Self> {
        let mut words = text.split_whitespace();
        let version = words.next()?;
        if !version.eq_ignore_ascii_case(SPF_PREFIX) {
            return None;
        }
        Some(Self {
            directives: words.map(String::from).collect(),
            ttl: 0,
        })
    }

    pub fn text(&self) -> String {
        std::iter::once(SPF_PREFIX)
            .chain(self.directives.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl ServiceBody for Spf {
    fn records(&self, subdomain: &str, ttl: u32, origin: &str) -> Vec<Record> {
        vec![make_record(
            subdomain,
            origin,
            pick_ttl(self.ttl, ttl),
            RecordData::txt(self.text()),
        )]
    }

    fn nb_resources(&self) -> usize {
        1
    }

    fn comment(&self) -> String {
        format!("{} directives", self.directives.len())
    }
}

fn analyze_spf(input: &AnalyzerInput<'_>) -> Vec<Claim> {
    // One policy per owner; extra ones stay plain TXT.
    input
        .of_type("TXT")
        .find_map(|(i, r)| match &r.data {
            RecordData::TXT { text, .. } => Spf::parse(text).map(|mut spf| {
                spf.ttl = r.ttl;
                Claim::new(vec![i], spf)
            }),
            _ => None,
        })
        .into_iter()
        .collect()
}

pub(super) fn spf_spec() -> ServiceSpec {
    ServiceSpec::new::<Spf>(SPF, "SPF", "Servers allowed to send e-mails for the domain")
        .with_analyzer(analyze_spf)
}

// ============ svcs.DMARC ============

const DMARC_PREFIX: &str = "v=DMARC1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmarcTag {
    pub tag: String,
    pub value: String,
}

/// DMARC policy published at `_dmarc`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dmarc {
    /// Tags after the version, in order.
    #[serde(default)]
    pub tags: Vec<DmarcTag>,
    #[serde(default)]
    pub ttl: u32,
}

impl Dmarc {
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split(';').map(str::trim).filter(|p| !p.is_empty());
        let version = parts.next()?;
        if !version.replace(' ', "").eq_ignore_ascii_case(DMARC_PREFIX) {
            return None;
        }
        let tags = parts
            .map(|p| {
                p.split_once('=').map(|(tag, value)| DmarcTag {
                    tag: tag.trim().to_string(),
                    value: value.trim().to_string(),
                })
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self { tags, ttl: 0 })
    }

    pub fn text(&self) -> String {
        std::iter::once(DMARC_PREFIX.to_string())
            .chain(self.tags.iter().map(|t| format!("{}={}", t.tag, t.value)))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn policy(&self) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.tag.eq_ignore_ascii_case("p"))
            .map(|t| t.value.as_str())
    }
}

impl ServiceBody for Dmarc {
    fn records(&self, subdomain: &str, ttl: u32, origin: &str) -> Vec<Record> {
        vec![make_record(
            subdomain,
            origin,
            pick_ttl(self.ttl, ttl),
            RecordData::txt(self.text()),
        )]
    }

    fn nb_resources(&self) -> usize {
        1
    }

    fn comment(&self) -> String {
        match self.policy() {
            Some(p) => format!("policy: {p}"),
            None => "no policy".to_string(),
        }
    }
}

fn is_dmarc_owner(subdomain: &str) -> bool {
    let first = subdomain.split('.').next().unwrap_or_default();
    first.eq_ignore_ascii_case("_dmarc")
}

fn analyze_dmarc(input: &AnalyzerInput<'_>) -> Vec<Claim> {
    if !is_dmarc_owner(input.subdomain) {
        return Vec::new();
    }
    input
        .of_type("TXT")
        .find_map(|(i, r)| match &r.data {
            RecordData::TXT { text, .. } => Dmarc::parse(text).map(|mut dmarc| {
                dmarc.ttl = r.ttl;
                Claim::new(vec![i], dmarc)
            }),
            _ => None,
        })
        .into_iter()
        .collect()
}

pub(super) fn dmarc_spec() -> ServiceSpec {
    ServiceSpec::new::<Dmarc>(DMARC, "DMARC", "Handling of mails failing SPF/DKIM checks")
        .with_analyzer(analyze_dmarc)
}

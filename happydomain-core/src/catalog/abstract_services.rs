//! Zone infrastructure: apex, delegations and hosts.

use std::net::{Ipv4Addr, Ipv6Addr};

use happydomain_provider::name::absolute_name;
use happydomain_provider::{Record, RecordData};
use serde::{Deserialize, Serialize};

use super::{
    AnalyzerInput, Claim, DELEGATION, ORIGIN, SERVER, ServiceBody, ServiceSpec, make_record,
    pick_ttl, same_ttl, short_name,
};

// ============ abstract.Origin ============

/// Start of authority fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Soa {
    pub mname: String,
    pub rname: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
    #[serde(default)]
    pub ttl: u32,
}

/// Zone apex: SOA and authoritative name servers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Origin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soa: Option<Soa>,
    #[serde(default)]
    pub name_servers: Vec<String>,
    #[serde(default)]
    pub ns_ttl: u32,
}

impl ServiceBody for Origin {
    fn records(&self, subdomain: &str, ttl: u32, origin: &str) -> Vec<Record> {
        let mut out = Vec::with_capacity(self.nb_resources());
        if let Some(soa) = &self.soa {
            out.push(make_record(
                subdomain,
                origin,
                pick_ttl(soa.ttl, ttl),
                RecordData::SOA {
                    mname: absolute_name(&soa.mname, origin),
                    rname: absolute_name(&soa.rname, origin),
                    serial: soa.serial,
                    refresh: soa.refresh,
                    retry: soa.retry,
                    expire: soa.expire,
                    minimum: soa.minimum,
                },
            ));
        }
        out.extend(
            self.name_servers
                .iter()
                .map(|ns| ns_record(subdomain, origin, pick_ttl(self.ns_ttl, ttl), ns)),
        );
        out
    }

    fn nb_resources(&self) -> usize {
        usize::from(self.soa.is_some()) + self.name_servers.len()
    }

    fn comment(&self) -> String {
        format!("{} name servers", self.name_servers.len())
    }
}

fn ns_record(subdomain: &str, origin: &str, ttl: u32, ns: &str) -> Record {
    make_record(
        subdomain,
        origin,
        ttl,
        RecordData::NS {
            nameserver: absolute_name(ns, origin),
        },
    )
}

fn analyze_origin(input: &AnalyzerInput<'_>) -> Vec<Claim> {
    if !input.is_apex() {
        return Vec::new();
    }

    let mut claimed = Vec::new();
    let mut origin = Origin::default();

    if let Some((i, r)) = input.of_type("SOA").next()
        && let RecordData::SOA {
            mname,
            rname,
            serial,
            refresh,
            retry,
            expire,
            minimum,
        } = &r.data
    {
        origin.soa = Some(Soa {
            mname: mname.clone(),
            rname: rname.clone(),
            serial: *serial,
            refresh: *refresh,
            retry: *retry,
            expire: *expire,
            minimum: *minimum,
            ttl: r.ttl,
        });
        claimed.push(i);
    }

    for (i, r) in same_ttl(input.of_type("NS")) {
        if let RecordData::NS { nameserver } = &r.data {
            origin.ns_ttl = r.ttl;
            origin.name_servers.push(nameserver.clone());
            claimed.push(i);
        }
    }

    if claimed.is_empty() {
        return Vec::new();
    }
    vec![Claim::new(claimed, origin)]
}

pub(super) fn origin_spec() -> ServiceSpec {
    ServiceSpec::new::<Origin>(ORIGIN, "Origin", "Zone apex: SOA and name servers")
        .with_analyzer(analyze_origin)
}

// ============ abstract.Delegation ============

/// Delegation signer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ds {
    pub key_tag: u16,
    pub algorithm: u8,
    pub digest_type: u8,
    pub digest: String,
}

/// Sub-zone delegated to other name servers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delegation {
    pub name_servers: Vec<String>,
    #[serde(default)]
    pub ns_ttl: u32,
    #[serde(default)]
    pub ds: Vec<Ds>,
    #[serde(default)]
    pub ds_ttl: u32,
}

impl ServiceBody for Delegation {
    fn records(&self, subdomain: &str, ttl: u32, origin: &str) -> Vec<Record> {
        let ns = self
            .name_servers
            .iter()
            .map(|ns| ns_record(subdomain, origin, pick_ttl(self.ns_ttl, ttl), ns));
        let ds = self.ds.iter().map(|ds| {
            make_record(
                subdomain,
                origin,
                pick_ttl(self.ds_ttl, ttl),
                RecordData::DS {
                    key_tag: ds.key_tag,
                    algorithm: ds.algorithm,
                    digest_type: ds.digest_type,
                    digest: ds.digest.clone(),
                },
            )
        });
        ns.chain(ds).collect()
    }

    fn nb_resources(&self) -> usize {
        self.name_servers.len() + self.ds.len()
    }

    fn comment(&self) -> String {
        let names: Vec<&str> = self.name_servers.iter().map(|n| short_name(n)).collect();
        format!("→ {}", names.join(", "))
    }
}

fn analyze_delegation(input: &AnalyzerInput<'_>) -> Vec<Claim> {
    if input.is_apex() {
        return Vec::new();
    }

    let mut claimed = Vec::new();
    let mut delegation = Delegation::default();
    for (i, r) in same_ttl(input.of_type("NS")) {
        if let RecordData::NS { nameserver } = &r.data {
            delegation.ns_ttl = r.ttl;
            delegation.name_servers.push(nameserver.clone());
            claimed.push(i);
        }
    }
    if claimed.is_empty() {
        return Vec::new();
    }

    for (i, r) in same_ttl(input.of_type("DS")) {
        if let RecordData::DS {
            key_tag,
            algorithm,
            digest_type,
            digest,
        } = &r.data
        {
            delegation.ds_ttl = r.ttl;
            delegation.ds.push(Ds {
                key_tag: *key_tag,
                algorithm: *algorithm,
                digest_type: *digest_type,
                digest: digest.clone(),
            });
            claimed.push(i);
        }
    }

    vec![Claim::new(claimed, delegation)]
}

pub(super) fn delegation_spec() -> ServiceSpec {
    ServiceSpec::new::<Delegation>(
        DELEGATION,
        "Delegation",
        "Subdomain served by other name servers",
    )
    .with_analyzer(analyze_delegation)
}

// ============ abstract.Server ============

/// SSH host key fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sshfp {
    pub algorithm: u8,
    pub fp_type: u8,
    pub fingerprint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address<T> {
    pub address: T,
    #[serde(default)]
    pub ttl: u32,
}

/// A host with at most one IPv4 and one IPv6 address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<Address<Ipv4Addr>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aaaa: Option<Address<Ipv6Addr>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sshfp: Vec<Sshfp>,
    #[serde(default)]
    pub sshfp_ttl: u32,
}

impl ServiceBody for Server {
    fn records(&self, subdomain: &str, ttl: u32, origin: &str) -> Vec<Record> {
        let mut out = Vec::with_capacity(self.nb_resources());
        if let Some(a) = &self.a {
            out.push(make_record(
                subdomain,
                origin,
                pick_ttl(a.ttl, ttl),
                RecordData::A { address: a.address },
            ));
        }
        if let Some(aaaa) = &self.aaaa {
            out.push(make_record(
                subdomain,
                origin,
                pick_ttl(aaaa.ttl, ttl),
                RecordData::AAAA {
                    address: aaaa.address,
                },
            ));
        }
        out.extend(self.sshfp.iter().map(|fp| {
            make_record(
                subdomain,
                origin,
                pick_ttl(self.sshfp_ttl, ttl),
                RecordData::SSHFP {
                    algorithm: fp.algorithm,
                    fp_type: fp.fp_type,
                    fingerprint: fp.fingerprint.clone(),
                },
            )
        }));
        out
    }

    fn nb_resources(&self) -> usize {
        usize::from(self.a.is_some()) + usize::from(self.aaaa.is_some()) + self.sshfp.len()
    }

    fn comment(&self) -> String {
        let mut parts = Vec::new();
        if let Some(a) = &self.a {
            parts.push(a.address.to_string());
        }
        if let Some(aaaa) = &self.aaaa {
            parts.push(aaaa.address.to_string());
        }
        parts.join(", ")
    }
}

fn analyze_server(input: &AnalyzerInput<'_>) -> Vec<Claim> {
    let a: Vec<_> = input.of_type("A").collect();
    let aaaa: Vec<_> = input.of_type("AAAA").collect();
    // Several addresses of one family are left to the fallback.
    if a.len() > 1 || aaaa.len() > 1 || (a.is_empty() && aaaa.is_empty()) {
        return Vec::new();
    }

    let mut claimed = Vec::new();
    let mut server = Server::default();
    if let Some(&(i, r)) = a.first()
        && let RecordData::A { address } = r.data
    {
        server.a = Some(Address {
            address,
            ttl: r.ttl,
        });
        claimed.push(i);
    }
    if let Some(&(i, r)) = aaaa.first()
        && let RecordData::AAAA { address } = r.data
    {
        server.aaaa = Some(Address {
            address,
            ttl: r.ttl,
        });
        claimed.push(i);
    }
    for (i, r) in same_ttl(input.of_type("SSHFP")) {
        if let RecordData::SSHFP {
            algorithm,
            fp_type,
            fingerprint,
        } = &r.data
        {
            server.sshfp_ttl = r.ttl;
            server.sshfp.push(Sshfp {
                algorithm: *algorithm,
                fp_type: *fp_type,
                fingerprint: fingerprint.clone(),
            });
            claimed.push(i);
        }
    }

    vec![Claim::new(claimed, server)]
}

pub(super) fn server_spec() -> ServiceSpec {
    ServiceSpec::new::<Server>(SERVER, "Server", "Host with its addresses and SSH keys")
        .with_analyzer(analyze_server)
}

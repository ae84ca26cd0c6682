//! Zone analysis and synthesis.
//!
//! [`analyze_zone`] turns a flat record list into services grouped by
//! subdomain; [`synthesize_records`] turns a zone back into records. Every
//! analyzer claim is checked against what its payload synthesizes, so the
//! two are inverse of each other up to record order.

use std::collections::{BTreeMap, HashMap};

use happydomain_provider::name::{normalize, subdomain};
use happydomain_provider::Record;

use crate::catalog::{AnalyzerInput, ORPHAN, Orphan, ServiceCatalog};
use crate::error::{CoreError, CoreResult};
use crate::types::{DEFAULT_TTL, Service, Zone};

/// Output of [`analyze_zone`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedZone {
    pub default_ttl: u32,
    pub services: BTreeMap<String, Vec<Service>>,
}

/// Most frequent non-zero TTL; ties go to the smallest value.
pub fn default_ttl(records: &[Record]) -> u32 {
    let mut counts: HashMap<u32, usize> = HashMap::new();
    for r in records.iter().filter(|r| r.ttl != 0) {
        *counts.entry(r.ttl).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|(ttl_a, n_a), (ttl_b, n_b)| n_a.cmp(n_b).then(ttl_b.cmp(ttl_a)))
        .map_or(DEFAULT_TTL, |(ttl, _)| ttl)
}

fn same_records(claimed: &[Record], produced: &[Record]) -> bool {
    if claimed.len() != produced.len() {
        return false;
    }
    let mut a: Vec<String> = claimed.iter().map(ToString::to_string).collect();
    let mut b: Vec<String> = produced.iter().map(ToString::to_string).collect();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

/// Group `records` of zone `origin` into services.
///
/// Records outside the zone are rejected.
pub fn analyze_zone(
    catalog: &ServiceCatalog,
    origin: &str,
    records: &[Record],
) -> CoreResult<AnalyzedZone> {
    let origin = normalize(origin);

    let mut groups: BTreeMap<String, Vec<Record>> = BTreeMap::new();
    for record in records {
        let record = record.normalized(&origin);
        let sub = subdomain(&record.name, &origin).ok_or_else(|| {
            CoreError::ValidationError(format!(
                "record {} is outside of zone {origin}",
                record.name
            ))
        })?;
        groups.entry(sub).or_default().push(record);
    }

    let mut services = BTreeMap::new();
    for (sub, remaining) in groups {
        let found = analyze_subdomain(catalog, &origin, &sub, remaining)?;
        services.insert(sub, found);
    }

    Ok(AnalyzedZone {
        default_ttl: default_ttl(records),
        services,
    })
}

fn analyze_subdomain(
    catalog: &ServiceCatalog,
    origin: &str,
    sub: &str,
    mut remaining: Vec<Record>,
) -> CoreResult<Vec<Service>> {
    let mut found = Vec::new();

    for spec in catalog.analyzers() {
        if remaining.is_empty() {
            break;
        }

        let claims = spec.analyze(&AnalyzerInput {
            origin,
            subdomain: sub,
            records: &remaining,
        });

        let mut taken: Vec<usize> = Vec::new();
        for claim in claims {
            if claim.records.is_empty() || claim.records.iter().any(|i| taken.contains(i)) {
                continue;
            }
            let Some(claimed) = claim
                .records
                .iter()
                .map(|&i| remaining.get(i).cloned())
                .collect::<Option<Vec<_>>>()
            else {
                continue;
            };

            let produced = claim.body.records(sub, 0, origin);
            if !same_records(&claimed, &produced) {
                log::debug!(
                    "{} claim on {sub:?} does not reproduce its records, rolled back",
                    spec.tag()
                );
                continue;
            }

            found.push(catalog.seal(spec.tag(), sub, 0, claim.body.as_ref(), origin)?);
            taken.extend(claim.records);
        }

        taken.sort_unstable_by(|a, b| b.cmp(a));
        for i in taken {
            remaining.remove(i);
        }
    }

    for record in &remaining {
        found.push(catalog.seal(ORPHAN, sub, 0, &Orphan::from_record(record), origin)?);
    }

    Ok(found)
}

/// Records of every service in `zone`, SOA first.
pub fn synthesize_records(
    catalog: &ServiceCatalog,
    origin: &str,
    zone: &Zone,
) -> CoreResult<Vec<Record>> {
    let origin = normalize(origin);
    let mut records = Vec::new();
    for services in zone.services.values() {
        for service in services {
            records.extend(catalog.service_records(service, &origin, zone.meta.default_ttl)?);
        }
    }
    records.sort_by_key(|r| r.rtype() != "SOA");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use happydomain_provider::RecordData;
    use happydomain_provider::zone_file::parse_zone;

    use super::*;
    use crate::catalog;
    use crate::types::Identifier;
    use crate::validation::service_id;

    const ORIGIN: &str = "happydns.org.";

    fn catalog() -> ServiceCatalog {
        ServiceCatalog::with_builtin_services()
    }

    fn spf_record(ttl: u32) -> Record {
        Record::new(
            "test.happydns.org.",
            ttl,
            RecordData::txt("v=spf1 include:_spf.example.com. ~all"),
        )
    }

    fn multiset(records: &[Record]) -> Vec<String> {
        let mut v: Vec<String> = records.iter().map(ToString::to_string).collect();
        v.sort();
        v
    }

    #[test]
    fn single_spf_txt() {
        let catalog = catalog();
        let zone = analyze_zone(&catalog, ORIGIN, &[spf_record(3600)]).unwrap();

        assert_eq!(zone.services.len(), 1);
        let services = &zone.services["test"];
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].service_type, catalog::SPF);

        let body = catalog.decode(&services[0]).unwrap();
        let records = body.records("test", 1234, ORIGIN);
        assert_eq!(records, vec![spf_record(3600)]);
        assert_eq!(records[0].name, "test.happydns.org.");
    }

    #[test]
    fn zero_ttl_takes_zone_default() {
        let catalog = catalog();
        let analyzed = analyze_zone(&catalog, ORIGIN, &[spf_record(0)]).unwrap();
        let mut zone = Zone::new(Identifier::random(), 1234);
        zone.services = analyzed.services;

        let records = synthesize_records(&catalog, ORIGIN, &zone).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ttl, 1234);
    }

    #[test]
    fn dual_stack_host_then_extra_address() {
        let catalog = catalog();
        let a1 = Record::new("test.happydns.org.", 300, RecordData::A { address: Ipv4Addr::new(127, 0, 0, 1) });
        let aaaa = Record::new("test.happydns.org.", 300, RecordData::AAAA { address: Ipv6Addr::LOCALHOST });
        let a2 = Record::new("test.happydns.org.", 300, RecordData::A { address: Ipv4Addr::new(127, 0, 0, 2) });

        let zone = analyze_zone(&catalog, ORIGIN, &[a1.clone(), aaaa.clone()]).unwrap();
        let services = &zone.services["test"];
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].service_type, catalog::SERVER);
        assert_eq!(services[0].nb_resources, 2);

        let zone = analyze_zone(&catalog, ORIGIN, &[a1, aaaa, a2]).unwrap();
        let services = &zone.services["test"];
        assert_eq!(services.len(), 3);
        assert!(services.iter().all(|s| s.service_type == catalog::ORPHAN));
    }

    #[test]
    fn service_id_hashes_zero_ttl_records() {
        let catalog = catalog();
        let zone = analyze_zone(&catalog, ORIGIN, &[spf_record(3600)]).unwrap();
        for (sub, services) in &zone.services {
            for svc in services {
                let body = catalog.decode(svc).unwrap();
                assert_eq!(svc.id, service_id(&body.records(sub, 0, ORIGIN)));
                assert_eq!(svc.nb_resources, body.nb_resources());
                assert_eq!(svc.comment, body.comment());
            }
        }
    }

    #[test]
    fn default_ttl_is_mode_with_smallest_tie() {
        let r = |ttl| spf_record(ttl);
        assert_eq!(default_ttl(&[r(300), r(3600), r(3600)]), 3600);
        assert_eq!(default_ttl(&[r(300), r(3600)]), 300);
        assert_eq!(default_ttl(&[r(0)]), DEFAULT_TTL);
        assert_eq!(default_ttl(&[]), DEFAULT_TTL);
    }

    #[test]
    fn out_of_zone_record_is_rejected() {
        let err = analyze_zone(
            &catalog(),
            ORIGIN,
            &[Record::new("www.example.com.", 60, RecordData::A { address: Ipv4Addr::LOCALHOST })],
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn full_zone_round_trips() {
        let text = r#"
$ORIGIN happydns.org.
$TTL 3600
@       IN SOA ns1 hostmaster 2024061001 7200 3600 1209600 300
@       IN NS  ns1
@       IN NS  ns2.example.net.
@       IN MX  10 mx1
@       IN MX  20 mx2.example.net.
@       IN TXT "v=spf1 mx -all"
@       IN TXT "google-site-verification=abc"
@       IN CAA 0 issue "letsencrypt.org"
_dmarc  IN TXT "v=DMARC1; p=quarantine; rua=mailto:d@happydns.org"
www     IN A     192.0.2.10
www     IN AAAA  2001:db8::10
www 300 IN SSHFP 1 2 0123456789abcdef
blog    IN CNAME www
_sip._tcp IN SRV 10 5 5060 sip
sub     IN NS  ns.sub
sub     IN DS  12345 13 2 ABCDEF0123
ns.sub  IN A   192.0.2.53
lb      IN A   192.0.2.1
lb      IN A   192.0.2.2
1.2     IN PTR host.example.net.
odd     IN HINFO "PC" "Linux"
"#;
        let records = parse_zone(ORIGIN, text).unwrap();
        let catalog = catalog();
        let analyzed = analyze_zone(&catalog, ORIGIN, &records).unwrap();
        assert_eq!(analyzed.default_ttl, 3600);

        let types: Vec<(&str, &str)> = analyzed
            .services
            .iter()
            .flat_map(|(sub, svcs)| svcs.iter().map(move |s| (sub.as_str(), s.service_type.as_str())))
            .collect();
        assert!(types.contains(&("", catalog::ORIGIN)));
        assert!(types.contains(&("", catalog::MXS)));
        assert!(types.contains(&("", catalog::SPF)));
        assert!(types.contains(&("", catalog::TXT)));
        assert!(types.contains(&("", catalog::CAA_POLICY)));
        assert!(types.contains(&("_dmarc", catalog::DMARC)));
        assert!(types.contains(&("www", catalog::SERVER)));
        assert!(types.contains(&("blog", catalog::CNAME)));
        assert!(types.contains(&("_sip._tcp", catalog::UNKNOWN_SRV)));
        assert!(types.contains(&("sub", catalog::DELEGATION)));
        assert!(types.contains(&("1.2", catalog::PTR)));
        assert!(types.contains(&("odd", catalog::ORPHAN)));
        assert_eq!(
            types.iter().filter(|t| *t == &("lb", catalog::ORPHAN)).count(),
            2
        );

        // SSHFP has another TTL than the addresses but its own payload field.
        let www = &analyzed.services["www"];
        assert_eq!(www.len(), 1);
        assert_eq!(www[0].nb_resources, 3);

        let mut zone = Zone::new(Identifier::random(), analyzed.default_ttl);
        zone.services = analyzed.services;
        let synthesized = synthesize_records(&catalog, ORIGIN, &zone).unwrap();
        assert_eq!(synthesized[0].rtype(), "SOA");

        let expected: Vec<Record> = records.iter().map(|r| r.normalized(ORIGIN)).collect();
        assert_eq!(multiset(&synthesized), multiset(&expected));
    }
}

//! Cloudflare DnsProvider trait implementation

use async_trait::async_trait;
use serde::Deserialize;

use crate::diff::RecordChange;
use crate::error::{FailureKind, ProviderError, Result};
use crate::name::{fqdn, normalize, without_trailing_dot};
use crate::record::{Record, RecordData, RecordType};
use crate::traits::{DnsProvider, ErrorContext, ProviderErrorMapper};
use crate::types::{
    FieldType, ProviderCapabilities, ProviderCredentialField, ProviderMetadata,
};
use crate::zone_file::parse_rdata;

use super::types::{
    CloudflareAccountRef, CloudflareCaaData, CloudflareCreateZoneBody, CloudflareRecordBody,
    CloudflareSrvData,
};
use super::{
    AUTO_TTL, AUTO_TTL_SECS, CloudflareDnsRecord, CloudflareProvider, CloudflareZone,
    MAX_PAGE_SIZE_RECORDS, MAX_PAGE_SIZE_ZONES,
};

/// Record types the Cloudflare DNS API lets us write.
const SUPPORTED_TYPES: &[RecordType] = &[
    RecordType::A,
    RecordType::AAAA,
    RecordType::CNAME,
    RecordType::MX,
    RecordType::NS,
    RecordType::TXT,
    RecordType::SRV,
    RecordType::CAA,
    RecordType::PTR,
];

/// Convert an API record into the typed model, qualified against `zone`.
pub(crate) fn cf_record_to_record(cf: &CloudflareDnsRecord, zone: &str) -> Record {
    let ttl = if cf.ttl == AUTO_TTL { AUTO_TTL_SECS } else { cf.ttl };
    let rtype = cf.record_type.to_ascii_uppercase();

    let structured = match (rtype.as_str(), &cf.data) {
        ("SRV", Some(data)) => serde_json::from_value::<CloudflareSrvData>(data.clone())
            .ok()
            .map(|d| RecordData::SRV {
                priority: d.priority,
                weight: d.weight,
                port: d.port,
                target: fqdn(&d.target),
            }),
        ("CAA", Some(data)) => serde_json::from_value::<CloudflareCaaData>(data.clone())
            .ok()
            .map(|d| RecordData::CAA {
                flags: d.flags,
                tag: d.tag,
                value: d.value,
            }),
        _ => None,
    };

    let data = structured.unwrap_or_else(|| match rtype.as_str() {
        "MX" => RecordData::MX {
            preference: cf.priority.unwrap_or_default(),
            exchange: fqdn(&cf.content),
        },
        // Older API versions return TXT content unquoted.
        "TXT" if !cf.content.starts_with('"') => RecordData::txt(cf.content.clone()),
        // Names in API content are absolute without the trailing dot.
        _ => parse_rdata(&rtype, &cf.content, ".").unwrap_or_else(|e| {
            log::debug!("[cloudflare] keeping {rtype} {} as opaque data: {e}", cf.name);
            RecordData::Other {
                rtype: rtype.clone(),
                rdata: cf.content.clone(),
            }
        }),
    });

    Record::new(fqdn(&cf.name), ttl, data).normalized(zone)
}

/// Request body creating `record`.
pub(crate) fn record_to_body(record: &Record) -> Result<CloudflareRecordBody> {
    let name = without_trailing_dot(&record.name).to_string();
    let ttl = if record.ttl == 0 { AUTO_TTL } else { record.ttl };
    let mut body = CloudflareRecordBody {
        record_type: record.rtype().to_string(),
        name,
        content: None,
        ttl,
        priority: None,
        data: None,
    };

    let to_value = |v: serde_json::Result<serde_json::Value>| {
        v.map_err(|e| ProviderError::SerializationError {
            provider: "cloudflare".to_string(),
            detail: e.to_string(),
        })
    };

    match &record.data {
        RecordData::A { address } => body.content = Some(address.to_string()),
        RecordData::AAAA { address } => body.content = Some(address.to_string()),
        RecordData::CNAME { target } | RecordData::PTR { target } => {
            body.content = Some(without_trailing_dot(target).to_string());
        }
        RecordData::NS { nameserver } => {
            body.content = Some(without_trailing_dot(nameserver).to_string());
        }
        RecordData::MX {
            preference,
            exchange,
        } => {
            body.content = Some(without_trailing_dot(exchange).to_string());
            body.priority = Some(*preference);
        }
        RecordData::TXT { text, .. } => body.content = Some(text.clone()),
        RecordData::SRV {
            priority,
            weight,
            port,
            target,
        } => {
            body.data = Some(to_value(serde_json::to_value(CloudflareSrvData {
                priority: *priority,
                weight: *weight,
                port: *port,
                target: without_trailing_dot(target).to_string(),
            }))?);
        }
        RecordData::CAA { flags, tag, value } => {
            body.data = Some(to_value(serde_json::to_value(CloudflareCaaData {
                flags: *flags,
                tag: tag.clone(),
                value: value.clone(),
            }))?);
        }
        other => {
            return Err(ProviderError::UnsupportedRecordType {
                provider: "cloudflare".to_string(),
                record_type: other.rtype().to_string(),
            });
        }
    }

    Ok(body)
}

impl CloudflareProvider {
    fn zone_ctx(zone: &str) -> ErrorContext {
        ErrorContext {
            domain: Some(zone.to_string()),
            ..Default::default()
        }
    }

    /// Cloudflare id of the zone named `zone`.
    pub(crate) async fn zone_id(&self, zone: &str) -> Result<String> {
        let name = without_trailing_dot(zone);
        let zones: Vec<CloudflareZone> = self
            .get(
                &format!("/zones?name={}", urlencoding::encode(name)),
                Self::zone_ctx(zone),
            )
            .await?;
        zones
            .into_iter()
            .find(|z| z.name.eq_ignore_ascii_case(name))
            .map(|z| z.id)
            .ok_or_else(|| ProviderError::DomainNotFound {
                provider: self.provider_name().to_string(),
                domain: zone.to_string(),
                raw_message: None,
            })
    }

    async fn list_remote_records(
        &self,
        zone_id: &str,
        query: &str,
        zone: &str,
    ) -> Result<Vec<CloudflareDnsRecord>> {
        self.get_all(
            &format!("/zones/{zone_id}/dns_records{query}"),
            MAX_PAGE_SIZE_RECORDS,
            Self::zone_ctx(zone),
        )
        .await
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    fn id(&self) -> &'static str {
        "cloudflare"
    }

    fn metadata() -> ProviderMetadata {
        ProviderMetadata {
            id: "cloudflare".to_string(),
            name: "Cloudflare".to_string(),
            description: "Cloudflare DNS through the v4 API".to_string(),
            required_fields: vec![
                ProviderCredentialField::new("apiToken", "API Token", FieldType::Password)
                    .with_help("Token with Zone:Read and DNS:Edit permissions"),
                ProviderCredentialField::new("accountId", "Account ID", FieldType::Text)
                    .optional()
                    .with_help("Required to create new zones"),
            ],
            capabilities: ProviderCapabilities {
                list_zones: true,
                create_domain: true,
                record_types: SUPPORTED_TYPES.to_vec(),
            },
        }
    }

    fn can_list_zones(&self) -> bool {
        true
    }

    fn can_create_domain(&self) -> bool {
        self.account_id.is_some()
    }

    fn supports_record_type(&self, rtype: &str) -> bool {
        SUPPORTED_TYPES
            .iter()
            .any(|t| t.as_str().eq_ignore_ascii_case(rtype))
    }

    async fn validate_credentials(&self) -> Result<bool> {
        #[derive(Deserialize)]
        struct VerifyResponse {
            status: String,
        }

        match self
            .get::<VerifyResponse>("/user/tokens/verify", ErrorContext::default())
            .await
        {
            Ok(resp) => Ok(resp.status == "active"),
            Err(e) if e.kind() == FailureKind::AuthFailure => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn list_zones(&self) -> Result<Vec<String>> {
        let zones: Vec<CloudflareZone> = self
            .get_all("/zones", MAX_PAGE_SIZE_ZONES, ErrorContext::default())
            .await?;
        Ok(zones.into_iter().map(|z| normalize(&z.name)).collect())
    }

    async fn create_domain(&self, domain: &str) -> Result<()> {
        let Some(account_id) = &self.account_id else {
            return Err(ProviderError::UnsupportedOperation {
                provider: self.provider_name().to_string(),
                operation: "create_domain without accountId".to_string(),
            });
        };

        let body = CloudflareCreateZoneBody {
            name: without_trailing_dot(domain).to_string(),
            account: CloudflareAccountRef {
                id: account_id.clone(),
            },
        };
        let zone: CloudflareZone = self.post("/zones", &body, Self::zone_ctx(domain)).await?;
        log::info!("[cloudflare] Created zone {} ({})", zone.name, zone.id);
        Ok(())
    }

    async fn get_zone_records(&self, domain: &str) -> Result<Vec<Record>> {
        let zone = normalize(domain);
        let zone_id = self.zone_id(&zone).await?;
        let records = self.list_remote_records(&zone_id, "", &zone).await?;
        Ok(records
            .iter()
            .map(|r| cf_record_to_record(r, &zone))
            .collect())
    }

    async fn apply_change(&self, domain: &str, change: &RecordChange) -> Result<()> {
        let zone = normalize(domain);
        let zone_id = self.zone_id(&zone).await?;

        if !change.old.is_empty() {
            let query = format!(
                "?name={}&type={}",
                urlencoding::encode(without_trailing_dot(&change.owner)),
                urlencoding::encode(&change.rtype)
            );
            let mut remote: Vec<(String, Record)> = self
                .list_remote_records(&zone_id, &query, &zone)
                .await?
                .iter()
                .map(|r| (r.id.clone(), cf_record_to_record(r, &zone)))
                .collect();

            for old in &change.old {
                let old = old.normalized(&zone);
                let pos = remote
                    .iter()
                    .position(|(_, r)| r.same_data(&old))
                    .ok_or_else(|| ProviderError::RecordNotFound {
                        provider: self.provider_name().to_string(),
                        record_id: old.to_string(),
                        raw_message: None,
                    })?;
                let (record_id, _) = remote.swap_remove(pos);
                let ctx = ErrorContext {
                    record_id: Some(record_id.clone()),
                    domain: Some(zone.clone()),
                    ..Default::default()
                };
                self.delete(&format!("/zones/{zone_id}/dns_records/{record_id}"), ctx)
                    .await?;
            }
        }

        for new in &change.new {
            let body = record_to_body(new)?;
            let ctx = ErrorContext {
                record_name: Some(new.name.clone()),
                domain: Some(zone.clone()),
                ..Default::default()
            };
            let _: serde_json::Value = self
                .post(&format!("/zones/{zone_id}/dns_records"), &body, ctx)
                .await?;
        }

        Ok(())
    }
}

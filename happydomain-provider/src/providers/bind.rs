//! Zone-file directory backend.
//!
//! Each zone lives in `<directory>/<zone>.zone` as an RFC 1035 master file.
//! Writes go through a temporary file and a rename so readers never observe
//! a half-written zone.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::diff::RecordChange;
use crate::error::{ProviderError, Result};
use crate::name::{normalize, without_trailing_dot};
use crate::providers::common::required_config_str;
use crate::record::Record;
use crate::traits::DnsProvider;
use crate::types::{FieldType, ProviderCapabilities, ProviderCredentialField, ProviderMetadata};
use crate::zone_file::{parse_zone, write_zone};

const PROVIDER: &str = "bind";
const ZONE_EXTENSION: &str = "zone";
/// `$TTL` written into freshly created zones.
const NEW_ZONE_TTL: u32 = 3600;

/// Zone files in a local directory.
pub struct BindProvider {
    directory: PathBuf,
    /// Serializes read-modify-write cycles on zone files.
    write_lock: Mutex<()>,
}

fn storage_error(path: &Path, e: &std::io::Error) -> ProviderError {
    ProviderError::StorageError {
        provider: PROVIDER.to_string(),
        detail: format!("{}: {e}", path.display()),
    }
}

impl BindProvider {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Build from a stored configuration: `{"directory": "/var/lib/bind"}`.
    pub fn from_config(config: &serde_json::Value) -> Result<Self> {
        Ok(Self::new(required_config_str(PROVIDER, config, "directory")?))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn zone_path(&self, zone: &str) -> PathBuf {
        let zone = normalize(zone);
        self.directory
            .join(format!("{}.{ZONE_EXTENSION}", without_trailing_dot(&zone)))
    }

    async fn read_zone(&self, zone: &str) -> Result<Vec<Record>> {
        let path = self.zone_path(zone);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ProviderError::DomainNotFound {
                    provider: PROVIDER.to_string(),
                    domain: normalize(zone),
                    raw_message: None,
                });
            }
            Err(e) => return Err(storage_error(&path, &e)),
        };

        parse_zone(zone, &content).map_err(|e| ProviderError::ParseError {
            provider: PROVIDER.to_string(),
            detail: format!("{}: {e}", path.display()),
        })
    }

    async fn write_atomically(&self, path: &Path, content: &str) -> Result<()> {
        let tmp = path.with_extension(format!("{ZONE_EXTENSION}.tmp"));
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| storage_error(&tmp, &e))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| storage_error(path, &e))
    }
}

#[async_trait]
impl DnsProvider for BindProvider {
    fn id(&self) -> &'static str {
        PROVIDER
    }

    fn metadata() -> ProviderMetadata {
        ProviderMetadata {
            id: PROVIDER.to_string(),
            name: "Zone files".to_string(),
            description: "RFC 1035 master files in a local directory".to_string(),
            required_fields: vec![
                ProviderCredentialField::new("directory", "Zone directory", FieldType::Text)
                    .with_help("One <zone>.zone file per domain"),
            ],
            capabilities: ProviderCapabilities {
                list_zones: true,
                create_domain: true,
                record_types: Vec::new(),
            },
        }
    }

    fn can_list_zones(&self) -> bool {
        true
    }

    fn can_create_domain(&self) -> bool {
        true
    }

    fn supports_record_type(&self, _rtype: &str) -> bool {
        true
    }

    async fn validate_credentials(&self) -> Result<bool> {
        match tokio::fs::metadata(&self.directory).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(storage_error(&self.directory, &e)),
        }
    }

    async fn list_zones(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.directory)
            .await
            .map_err(|e| storage_error(&self.directory, &e))?;

        let mut zones = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| storage_error(&self.directory, &e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ZONE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                zones.push(normalize(stem));
            }
        }
        zones.sort();
        Ok(zones)
    }

    async fn create_domain(&self, domain: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.zone_path(domain);
        if tokio::fs::try_exists(&path)
            .await
            .map_err(|e| storage_error(&path, &e))?
        {
            return Err(ProviderError::InvalidParameter {
                provider: PROVIDER.to_string(),
                param: "domain".to_string(),
                detail: format!("zone {} already exists", normalize(domain)),
            });
        }

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| storage_error(&self.directory, &e))?;
        let content = format!("$ORIGIN {}\n$TTL {NEW_ZONE_TTL}\n", normalize(domain));
        self.write_atomically(&path, &content).await?;
        log::info!("[bind] Created zone file {}", path.display());
        Ok(())
    }

    async fn get_zone_records(&self, domain: &str) -> Result<Vec<Record>> {
        self.read_zone(domain).await
    }

    async fn apply_change(&self, zone: &str, change: &RecordChange) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let zone = normalize(zone);
        let mut records = self.read_zone(&zone).await?;

        for old in &change.old {
            let old = old.normalized(&zone);
            let pos = records
                .iter()
                .position(|r| *r == old)
                .ok_or_else(|| ProviderError::RecordNotFound {
                    provider: PROVIDER.to_string(),
                    record_id: old.to_string(),
                    raw_message: None,
                })?;
            records.remove(pos);
        }
        records.extend(change.new.iter().map(|r| r.normalized(&zone)));

        let path = self.zone_path(&zone);
        self.write_atomically(&path, &write_zone(&zone, &records))
            .await?;
        log::debug!(
            "[bind] {zone}: -{} +{} records",
            change.old.len(),
            change.new.len()
        );
        Ok(())
    }
}

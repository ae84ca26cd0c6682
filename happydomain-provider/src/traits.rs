use async_trait::async_trait;

use crate::diff::RecordChange;
use crate::error::{ProviderError, Result};
use crate::record::Record;
use crate::types::ProviderMetadata;

/// Raw API error (internal use).
#[derive(Debug, Clone)]
pub(crate) struct RawApiError {
    /// Error code, format differs per provider.
    pub code: Option<String>,
    /// Original error message.
    pub message: String,
}

impl RawApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

/// Extra information available when mapping an error (internal use).
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorContext {
    /// Record name, for `RecordExists`.
    pub record_name: Option<String>,
    /// Record id, for `RecordNotFound`.
    pub record_id: Option<String>,
    /// Zone name, for `DomainNotFound`.
    pub domain: Option<String>,
}

/// Maps raw API errors of one backend onto [`ProviderError`] (internal use).
pub(crate) trait ProviderErrorMapper {
    /// Provider identifier.
    fn provider_name(&self) -> &'static str;

    /// Map a raw API error.
    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError;

    /// Shortcut: parse error.
    fn parse_error(&self, detail: impl ToString) -> ProviderError {
        ProviderError::ParseError {
            provider: self.provider_name().to_string(),
            detail: detail.to_string(),
        }
    }

    /// Shortcut: unknown error (fallback).
    fn unknown_error(&self, raw: RawApiError) -> ProviderError {
        ProviderError::Unknown {
            provider: self.provider_name().to_string(),
            raw_code: raw.code,
            raw_message: raw.message,
        }
    }
}

/// A DNS hosting backend.
///
/// Zone names passed to every method are fully qualified (`example.com.`).
/// Records returned by [`get_zone_records`](Self::get_zone_records) may use
/// any spelling of owner names; callers normalize them against the zone.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Backend type tag (`"cloudflare"`, `"bind"`, ...).
    fn id(&self) -> &'static str;

    /// Static metadata, available before any instance exists.
    fn metadata() -> ProviderMetadata
    where
        Self: Sized;

    /// Whether [`list_zones`](Self::list_zones) is implemented.
    fn can_list_zones(&self) -> bool {
        false
    }

    /// Whether [`create_domain`](Self::create_domain) is implemented.
    fn can_create_domain(&self) -> bool {
        false
    }

    /// Whether changes on records of this type can be pushed.
    fn supports_record_type(&self, rtype: &str) -> bool;

    /// Check the configured credentials against the backend.
    async fn validate_credentials(&self) -> Result<bool>;

    /// Zones hosted on this account, fully qualified.
    async fn list_zones(&self) -> Result<Vec<String>> {
        Err(ProviderError::UnsupportedOperation {
            provider: self.id().to_string(),
            operation: "list_zones".to_string(),
        })
    }

    /// Create an empty zone on the backend.
    async fn create_domain(&self, fqdn: &str) -> Result<()> {
        Err(ProviderError::UnsupportedOperation {
            provider: self.id().to_string(),
            operation: format!("create_domain({fqdn})"),
        })
    }

    /// Every record currently served for `fqdn`.
    async fn get_zone_records(&self, fqdn: &str) -> Result<Vec<Record>>;

    /// Push one rrset change: remove `change.old`, then add `change.new`.
    async fn apply_change(&self, zone: &str, change: &RecordChange) -> Result<()>;
}

//! Cloudflare DNS backend

mod error;
mod http;
mod provider;
mod types;

use reqwest::Client;

use crate::error::Result;
use crate::providers::common::{
    DEFAULT_MAX_RETRIES, config_str, create_http_client, required_config_str,
};

pub(crate) use types::{CloudflareDnsRecord, CloudflareResponse, CloudflareZone};

pub(crate) const CF_API_BASE: &str = "https://api.cloudflare.com/client/v4";
/// Zones API page size limit.
pub(crate) const MAX_PAGE_SIZE_ZONES: u32 = 50;
/// DNS Records API page size limit.
pub(crate) const MAX_PAGE_SIZE_RECORDS: u32 = 100;
/// TTL reported by Cloudflare for "automatic".
pub(crate) const AUTO_TTL: u32 = 1;
/// What "automatic" means in practice.
pub(crate) const AUTO_TTL_SECS: u32 = 300;

/// Cloudflare DNS backend
pub struct CloudflareProvider {
    pub(crate) client: Client,
    pub(crate) api_token: String,
    /// Needed to create zones; listing and editing work without it.
    pub(crate) account_id: Option<String>,
    pub(crate) max_retries: u32,
}

impl CloudflareProvider {
    pub fn new(api_token: String) -> Result<Self> {
        Ok(Self {
            client: create_http_client("cloudflare")?,
            api_token,
            account_id: None,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    #[must_use]
    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Build from a stored configuration: `{"apiToken": ..., "accountId": ...}`.
    pub fn from_config(config: &serde_json::Value) -> Result<Self> {
        let provider = Self::new(required_config_str("cloudflare", config, "apiToken")?)?;
        Ok(match config_str(config, "accountId") {
            Some(account_id) => provider.with_account_id(account_id),
            None => provider,
        })
    }
}

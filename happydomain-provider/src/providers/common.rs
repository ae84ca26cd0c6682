//! Helpers shared by backend implementations.

use std::time::Duration;

use reqwest::Client;

use crate::error::{ProviderError, Result};

/// Connection timeout (seconds).
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Whole-request timeout (seconds).
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Retries for transient failures.
pub(crate) const DEFAULT_MAX_RETRIES: u32 = 2;

/// HTTP client with the default timeouts.
pub fn create_http_client(provider: &str) -> Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| ProviderError::NetworkError {
            provider: provider.to_string(),
            detail: format!("Failed to create HTTP client: {e}"),
        })
}

/// Read a string field from a backend configuration object.
///
/// Missing, non-string and blank values are all treated as absent.
pub(crate) fn config_str(config: &serde_json::Value, key: &str) -> Option<String> {
    config
        .get(key)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Like [`config_str`] but fails with `InvalidParameter` when absent.
pub(crate) fn required_config_str(
    provider: &str,
    config: &serde_json::Value,
    key: &str,
) -> Result<String> {
    config_str(config, key).ok_or_else(|| ProviderError::InvalidParameter {
        provider: provider.to_string(),
        param: key.to_string(),
        detail: format!("missing required field '{key}'"),
    })
}

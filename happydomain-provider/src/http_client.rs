//! Shared HTTP plumbing for remote backends.
//!
//! Each backend builds its own `RequestBuilder` (auth headers, body) and hands
//! it here for sending, logging, transient-failure retries and body reading.

use std::time::Duration;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::error::{FailureKind, ProviderError};
use crate::utils::log_sanitizer::truncate_for_log;

/// Longest wait honoured from a `Retry-After` header.
const MAX_RETRY_AFTER_SECS: u64 = 30;
/// Ceiling of the exponential backoff.
const MAX_BACKOFF_MS: u64 = 10_000;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP helper functions.
pub struct HttpUtils;

impl HttpUtils {
    /// Send one request.
    ///
    /// HTTP 429 becomes [`ProviderError::RateLimited`], 502 to 504 become
    /// [`ProviderError::NetworkError`]. Any other status is returned to the
    /// caller together with the body.
    pub async fn execute_request(
        request_builder: RequestBuilder,
        provider_name: &str,
        method_name: &str,
        url: &str,
    ) -> Result<HttpResponse, ProviderError> {
        log::debug!("[{provider_name}] {method_name} {url}");

        let response = request_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout {
                    provider: provider_name.to_string(),
                    detail: e.to_string(),
                }
            } else {
                ProviderError::NetworkError {
                    provider: provider_name.to_string(),
                    detail: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        log::debug!("[{provider_name}] Response status: {status}");

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        if status == 429 {
            let body = response.text().await.unwrap_or_default();
            log::warn!("[{provider_name}] Rate limited (HTTP 429), retry_after={retry_after:?}");
            return Err(ProviderError::RateLimited {
                provider: provider_name.to_string(),
                retry_after,
                raw_message: Some(truncate_for_log(&body)),
            });
        }

        if matches!(status, 502..=504) {
            let body = response.text().await.unwrap_or_default();
            log::warn!("[{provider_name}] Upstream error (HTTP {status})");
            return Err(ProviderError::NetworkError {
                provider: provider_name.to_string(),
                detail: format!("HTTP {status}: {}", truncate_for_log(&body)),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::NetworkError {
                provider: provider_name.to_string(),
                detail: format!("Failed to read response body: {e}"),
            })?;

        log::debug!("[{provider_name}] Response body: {}", truncate_for_log(&body));

        Ok(HttpResponse { status, body })
    }

    /// Send a request, retrying transient failures up to `max_retries` times.
    ///
    /// Only errors whose [`kind()`](ProviderError::kind) is
    /// [`FailureKind::Transient`] are retried. Requests whose body cannot be
    /// cloned are sent once.
    pub async fn execute_request_with_retry(
        request_builder: RequestBuilder,
        provider_name: &str,
        method_name: &str,
        url: &str,
        max_retries: u32,
    ) -> Result<HttpResponse, ProviderError> {
        let mut attempt = 0;
        loop {
            let Some(req) = request_builder.try_clone() else {
                log::warn!("[{provider_name}] Request body is not cloneable, sending once");
                return Self::execute_request(request_builder, provider_name, method_name, url)
                    .await;
            };

            match Self::execute_request(req, provider_name, method_name, url).await {
                Err(e) if attempt < max_retries && is_retryable(&e) => {
                    let delay = retry_delay(&e, attempt);
                    attempt += 1;
                    log::warn!(
                        "[{provider_name}] {method_name} failed (attempt {attempt}/{max_retries}), retrying in {:.1}s: {e}",
                        delay.as_secs_f32()
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }

    /// Decode a JSON body.
    pub fn parse_json<T>(body: &str, provider_name: &str) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(body).map_err(|e| {
            log::error!(
                "[{provider_name}] JSON parse failed: {e}; body: {}",
                truncate_for_log(body)
            );
            ProviderError::ParseError {
                provider: provider_name.to_string(),
                detail: e.to_string(),
            }
        })
    }
}

fn is_retryable(error: &ProviderError) -> bool {
    error.kind() == FailureKind::Transient
}

/// `Retry-After` when the server sent one (capped), exponential backoff otherwise.
fn retry_delay(error: &ProviderError, attempt: u32) -> Duration {
    if let ProviderError::RateLimited {
        retry_after: Some(secs),
        ..
    } = error
    {
        Duration::from_secs((*secs).min(MAX_RETRY_AFTER_SECS))
    } else {
        backoff_delay(attempt)
    }
}

/// 100ms, 200ms, 400ms, ... capped at 10s.
fn backoff_delay(attempt: u32) -> Duration {
    let shift = attempt.min(20);
    let delay_ms = 100_u64.saturating_mul(1_u64 << shift);
    Duration::from_millis(delay_ms.min(MAX_BACKOFF_MS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        let timeout = ProviderError::Timeout {
            provider: "test".into(),
            detail: "slow".into(),
        };
        let limited = ProviderError::RateLimited {
            provider: "test".into(),
            retry_after: None,
            raw_message: None,
        };
        assert!(is_retryable(&timeout));
        assert!(is_retryable(&limited));
    }

    #[test]
    fn permanent_errors_are_not_retryable() {
        let auth = ProviderError::InvalidCredentials {
            provider: "test".into(),
            raw_message: None,
        };
        let unsupported = ProviderError::UnsupportedOperation {
            provider: "test".into(),
            operation: "list_zones".into(),
        };
        assert!(!is_retryable(&auth));
        assert!(!is_retryable(&unsupported));
    }

    #[test]
    fn retry_after_is_capped() {
        let e = ProviderError::RateLimited {
            provider: "test".into(),
            retry_after: Some(120),
            raw_message: None,
        };
        assert_eq!(retry_delay(&e, 0), Duration::from_secs(30));
    }

    #[test]
    fn backoff_grows_then_caps() {
        assert_eq!(backoff_delay(0), Duration::from_millis(100));
        assert_eq!(backoff_delay(3), Duration::from_millis(800));
        assert_eq!(backoff_delay(7), Duration::from_millis(10_000));
        assert_eq!(backoff_delay(40), Duration::from_millis(10_000));
    }

    #[test]
    fn parse_json_maps_errors() {
        let ok: Result<serde_json::Value, _> = HttpUtils::parse_json(r#"{"x":1}"#, "test");
        assert!(ok.is_ok());
        let bad: Result<serde_json::Value, _> = HttpUtils::parse_json("nope", "test");
        assert!(matches!(bad, Err(ProviderError::ParseError { .. })));
    }

    #[test]
    fn success_range() {
        let r = HttpResponse {
            status: 204,
            body: String::new(),
        };
        assert!(r.is_success());
        let r = HttpResponse {
            status: 400,
            body: String::new(),
        };
        assert!(!r.is_success());
    }
}

//! Cloudflare error mapping

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::CloudflareProvider;

/// Reference: <https://developers.cloudflare.com/api/>
impl ProviderErrorMapper for CloudflareProvider {
    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        let provider = self.provider_name().to_string();
        match raw.code.as_deref() {
            // 6003/6103/6111: malformed auth headers
            // 9109: unauthorized, 10000: authentication error
            Some("6003" | "6103" | "6111" | "9109" | "10000") => {
                ProviderError::InvalidCredentials {
                    provider,
                    raw_message: Some(raw.message),
                }
            }

            // 1004: DNS validation error, 9000: bad name,
            // 9005/9006/9009: bad content, 9021: bad TTL, 9041: cannot be proxied
            Some(code @ ("1004" | "9000" | "9005" | "9006" | "9009" | "9021" | "9041")) => {
                let param = match code {
                    "9000" => "name",
                    "9005" | "9006" | "9009" => "value",
                    "9021" => "ttl",
                    "9041" => "proxied",
                    _ => "general",
                };
                ProviderError::InvalidParameter {
                    provider,
                    param: param.to_string(),
                    detail: raw.message,
                }
            }

            // 81053..81058: conflicting record already present
            Some("81053" | "81054" | "81055" | "81056" | "81057" | "81058") => {
                ProviderError::RecordExists {
                    provider,
                    record_name: context
                        .record_name
                        .unwrap_or_else(|| "<unknown>".to_string()),
                    raw_message: Some(raw.message),
                }
            }

            Some("81044") => ProviderError::RecordNotFound {
                provider,
                record_id: context.record_id.unwrap_or_else(|| "<unknown>".to_string()),
                raw_message: Some(raw.message),
            },

            Some("81045") => ProviderError::QuotaExceeded {
                provider,
                raw_message: Some(raw.message),
            },

            // 7000: no route for that URI, 7003: invalid object identifier
            Some("7000" | "7003") => ProviderError::DomainNotFound {
                provider,
                domain: context.domain.unwrap_or_else(|| "<unknown>".to_string()),
                raw_message: Some(raw.message),
            },

            _ => self.unknown_error(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    fn provider() -> CloudflareProvider {
        CloudflareProvider::new(String::new()).unwrap()
    }

    fn ctx_with_record() -> ErrorContext {
        ErrorContext {
            record_name: Some("www.example.com.".to_string()),
            record_id: Some("rec-123".to_string()),
            domain: Some("example.com.".to_string()),
        }
    }

    #[test]
    fn auth_codes_map_to_auth_failure() {
        let p = provider();
        for code in ["6003", "6103", "6111", "9109", "10000"] {
            let err = p.map_error(RawApiError::with_code(code, "denied"), ErrorContext::default());
            assert!(
                matches!(err, ProviderError::InvalidCredentials { .. }),
                "code {code} mapped to {err:?}"
            );
            assert_eq!(err.kind(), FailureKind::AuthFailure);
        }
    }

    #[test]
    fn validation_codes_name_the_parameter() {
        let p = provider();
        let cases = [
            ("1004", "general"),
            ("9000", "name"),
            ("9005", "value"),
            ("9006", "value"),
            ("9009", "value"),
            ("9021", "ttl"),
            ("9041", "proxied"),
        ];
        for (code, expected) in cases {
            let err = p.map_error(RawApiError::with_code(code, "bad"), ErrorContext::default());
            assert!(
                matches!(&err, ProviderError::InvalidParameter { param, .. } if param == expected),
                "code {code} mapped to {err:?}"
            );
        }
    }

    #[test]
    fn record_conflicts_carry_context() {
        let err = provider().map_error(
            RawApiError::with_code("81057", "record already exists"),
            ctx_with_record(),
        );
        assert!(matches!(
            err,
            ProviderError::RecordExists { record_name, .. } if record_name == "www.example.com."
        ));
    }

    #[test]
    fn missing_objects_map_to_not_found() {
        let p = provider();
        let record = p.map_error(RawApiError::with_code("81044", "gone"), ctx_with_record());
        assert!(matches!(
            &record,
            ProviderError::RecordNotFound { record_id, .. } if record_id == "rec-123"
        ));
        let zone = p.map_error(RawApiError::with_code("7003", "no route"), ctx_with_record());
        assert!(matches!(
            &zone,
            ProviderError::DomainNotFound { domain, .. } if domain == "example.com."
        ));
        assert_eq!(zone.kind(), FailureKind::NotFound);
    }

    #[test]
    fn missing_context_uses_placeholder() {
        let err = provider().map_error(
            RawApiError::with_code("7000", "no route"),
            ErrorContext::default(),
        );
        assert!(matches!(
            err,
            ProviderError::DomainNotFound { domain, .. } if domain == "<unknown>"
        ));
    }

    #[test]
    fn quota_is_permanent() {
        let err = provider().map_error(
            RawApiError::with_code("81045", "quota"),
            ErrorContext::default(),
        );
        assert!(matches!(err, ProviderError::QuotaExceeded { .. }));
        assert_eq!(err.kind(), FailureKind::Permanent);
    }

    #[test]
    fn unknown_codes_fall_back() {
        let p = provider();
        let coded = p.map_error(
            RawApiError::with_code("99999", "something unexpected"),
            ErrorContext::default(),
        );
        assert!(matches!(
            coded,
            ProviderError::Unknown { raw_code, raw_message, .. }
                if raw_code.as_deref() == Some("99999") && raw_message == "something unexpected"
        ));
        let bare = p.map_error(RawApiError::new("no code at all"), ErrorContext::default());
        assert!(matches!(bare, ProviderError::Unknown { raw_code: None, .. }));
    }
}

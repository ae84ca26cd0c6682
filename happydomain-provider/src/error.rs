use serde::{Deserialize, Serialize};

/// Unified error type for all DNS provider operations.
///
/// Each variant includes a `provider` field identifying which provider (or
/// provider type tag) produced the error, plus variant-specific context.
/// All variants are serializable for structured error reporting.
///
/// Every variant maps onto one [`FailureKind`] through [`kind()`](Self::kind).
/// Only [`FailureKind::Transient`] failures are retried, and only by the
/// HTTP client layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum ProviderError {
    /// A network-level error occurred (DNS resolution failure, connection refused, etc.).
    NetworkError {
        /// Provider that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// The provided credentials are invalid or expired.
    InvalidCredentials {
        /// Provider that produced the error.
        provider: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// A DNS record with the same name/type already exists.
    RecordExists {
        /// Provider that produced the error.
        provider: String,
        /// Name of the conflicting record.
        record_name: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// The specified DNS record was not found.
    RecordNotFound {
        /// Provider that produced the error.
        provider: String,
        /// ID or description of the record that was not found.
        record_id: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// A request or configuration parameter is invalid.
    InvalidParameter {
        /// Provider that produced the error.
        provider: String,
        /// Name of the invalid parameter.
        param: String,
        /// Description of what's wrong.
        detail: String,
    },

    /// The requested DNS record type is not supported by this provider.
    UnsupportedRecordType {
        /// Provider that produced the error.
        provider: String,
        /// The unsupported record type string.
        record_type: String,
    },

    /// The provider does not implement the requested capability
    /// (e.g. listing zones or creating a domain).
    UnsupportedOperation {
        /// Provider that produced the error.
        provider: String,
        /// Capability name.
        operation: String,
    },

    /// The account's resource quota has been exceeded.
    QuotaExceeded {
        /// Provider that produced the error.
        provider: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// The API rate limit has been exceeded (HTTP 429 or equivalent).
    RateLimited {
        /// Provider that produced the error.
        provider: String,
        /// Suggested wait time in seconds before retrying, if provided by the API.
        retry_after: Option<u64>,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// The request timed out.
    Timeout {
        /// Provider that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// The specified domain/zone was not found.
    DomainNotFound {
        /// Provider that produced the error.
        provider: String,
        /// Domain name that was not found.
        domain: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// The domain is locked or disabled and cannot be modified.
    DomainLocked {
        /// Provider that produced the error.
        provider: String,
        /// Domain name that is locked.
        domain: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// The authenticated user lacks permission for the requested operation.
    PermissionDenied {
        /// Provider that produced the error.
        provider: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// Failed to parse the provider's response or stored zone data.
    ParseError {
        /// Provider that produced the error.
        provider: String,
        /// Details about the parse failure.
        detail: String,
    },

    /// Failed to serialize a request body.
    SerializationError {
        /// Provider that produced the error.
        provider: String,
        /// Details about the serialization failure.
        detail: String,
    },

    /// Local storage used by a backend (e.g. a zone file directory) failed.
    StorageError {
        /// Provider that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// No backend is registered under this type tag.
    UnknownProviderType {
        /// The unknown type tag.
        provider: String,
    },

    /// A backend is already registered under this type tag.
    DuplicateProviderType {
        /// The duplicated type tag.
        provider: String,
    },

    /// An unrecognized error from the provider API.
    Unknown {
        /// Provider that produced the error.
        provider: String,
        /// Raw error code from the API, if available.
        raw_code: Option<String>,
        /// Raw error message from the API.
        raw_message: String,
    },
}

/// Failure classes every provider method reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Credentials rejected or insufficient.
    AuthFailure,
    /// Zone, record or backend type does not exist.
    NotFound,
    /// Operation or record type not supported by this backend.
    Unsupported,
    /// Network trouble, timeouts, rate limiting. Safe to retry.
    Transient,
    /// Anything else; retrying will not help.
    Permanent,
}

impl ProviderError {
    /// Failure class of this error.
    ///
    /// **Update this mapping when adding variants.**
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidCredentials { .. } | Self::PermissionDenied { .. } => {
                FailureKind::AuthFailure
            }
            Self::RecordNotFound { .. }
            | Self::DomainNotFound { .. }
            | Self::UnknownProviderType { .. } => FailureKind::NotFound,
            Self::UnsupportedRecordType { .. } | Self::UnsupportedOperation { .. } => {
                FailureKind::Unsupported
            }
            Self::NetworkError { .. } | Self::Timeout { .. } | Self::RateLimited { .. } => {
                FailureKind::Transient
            }
            Self::RecordExists { .. }
            | Self::InvalidParameter { .. }
            | Self::QuotaExceeded { .. }
            | Self::DomainLocked { .. }
            | Self::ParseError { .. }
            | Self::SerializationError { .. }
            | Self::StorageError { .. }
            | Self::DuplicateProviderType { .. }
            | Self::Unknown { .. } => FailureKind::Permanent,
        }
    }

    /// Whether this is expected behaviour (user input, missing resources),
    /// used to choose between `warn` and `error` log levels.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials { .. }
                | Self::RecordExists { .. }
                | Self::RecordNotFound { .. }
                | Self::InvalidParameter { .. }
                | Self::UnsupportedRecordType { .. }
                | Self::UnsupportedOperation { .. }
                | Self::QuotaExceeded { .. }
                | Self::DomainNotFound { .. }
                | Self::DomainLocked { .. }
                | Self::PermissionDenied { .. }
                | Self::UnknownProviderType { .. }
        )
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkError { provider, detail } => {
                write!(f, "[{provider}] Network error: {detail}")
            }
            Self::InvalidCredentials {
                provider,
                raw_message,
            } => match raw_message {
                Some(msg) => write!(f, "[{provider}] Invalid credentials: {msg}"),
                None => write!(f, "[{provider}] Invalid credentials"),
            },
            Self::RecordExists {
                provider,
                record_name,
                ..
            } => write!(f, "[{provider}] Record '{record_name}' already exists"),
            Self::RecordNotFound {
                provider,
                record_id,
                ..
            } => write!(f, "[{provider}] Record '{record_id}' not found"),
            Self::InvalidParameter {
                provider,
                param,
                detail,
            } => write!(f, "[{provider}] Invalid parameter '{param}': {detail}"),
            Self::UnsupportedRecordType {
                provider,
                record_type,
            } => write!(f, "[{provider}] Unsupported record type: {record_type}"),
            Self::UnsupportedOperation {
                provider,
                operation,
            } => write!(f, "[{provider}] Operation not supported: {operation}"),
            Self::QuotaExceeded { provider, .. } => write!(f, "[{provider}] Quota exceeded"),
            Self::RateLimited {
                provider,
                retry_after,
                ..
            } => match retry_after {
                Some(secs) => write!(f, "[{provider}] Rate limited (retry after {secs}s)"),
                None => write!(f, "[{provider}] Rate limited"),
            },
            Self::Timeout { provider, detail } => {
                write!(f, "[{provider}] Request timeout: {detail}")
            }
            Self::DomainNotFound {
                provider,
                domain,
                raw_message,
            } => match raw_message {
                Some(msg) => write!(f, "[{provider}] Domain '{domain}' not found: {msg}"),
                None => write!(f, "[{provider}] Domain '{domain}' not found"),
            },
            Self::DomainLocked {
                provider,
                domain,
                raw_message,
            } => match raw_message {
                Some(msg) => write!(f, "[{provider}] Domain '{domain}' is locked: {msg}"),
                None => write!(f, "[{provider}] Domain '{domain}' is locked"),
            },
            Self::PermissionDenied {
                provider,
                raw_message,
            } => match raw_message {
                Some(msg) => write!(f, "[{provider}] Permission denied: {msg}"),
                None => write!(f, "[{provider}] Permission denied"),
            },
            Self::ParseError { provider, detail } => {
                write!(f, "[{provider}] Parse error: {detail}")
            }
            Self::SerializationError { provider, detail } => {
                write!(f, "[{provider}] Serialization error: {detail}")
            }
            Self::StorageError { provider, detail } => {
                write!(f, "[{provider}] Storage error: {detail}")
            }
            Self::UnknownProviderType { provider } => {
                write!(f, "Unknown provider type: {provider}")
            }
            Self::DuplicateProviderType { provider } => {
                write!(f, "Provider type already registered: {provider}")
            }
            Self::Unknown {
                provider,
                raw_message,
                ..
            } => write!(f, "[{provider}] {raw_message}"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Convenience type alias for `Result<T, ProviderError>`.
pub type Result<T> = std::result::Result<T, ProviderError>;

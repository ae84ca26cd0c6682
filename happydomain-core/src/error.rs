//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

pub use happydomain_provider::{FailureKind, ProviderError};

/// Coarse error class, as seen by callers of the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Malformed input or corrections that could not be applied.
    Validation,
    /// Lookup failed, including ownership mismatches.
    NotFound,
    /// Operation disabled by configuration.
    Forbidden,
    /// Anything else; the detail is not shown to users.
    Internal,
}

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Invalid user input
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Some wanted corrections were not applied
    #[error("{} correction(s) not applied on zone {zone_id}", .ids.len())]
    CorrectionsNotApplied { zone_id: String, ids: Vec<String> },

    #[error("Domain not found: {0}")]
    DomainNotFound(String),

    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Operation disabled by configuration
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Provider error (converting from library)
    #[error("{0}")]
    Provider(#[from] ProviderError),
}

impl CoreError {
    /// Error class driving the HTTP status and the message shown to users.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ValidationError(_) | Self::CorrectionsNotApplied { .. } => ErrorKind::Validation,
            Self::DomainNotFound(_)
            | Self::ZoneNotFound(_)
            | Self::ServiceNotFound(_)
            | Self::ProviderNotFound(_)
            | Self::UserNotFound(_) => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::StorageError(_) | Self::SerializationError(_) | Self::Internal(_) => {
                ErrorKind::Internal
            }
            Self::Provider(e) => match e.kind() {
                FailureKind::NotFound => ErrorKind::NotFound,
                FailureKind::AuthFailure | FailureKind::Unsupported => ErrorKind::Validation,
                FailureKind::Transient | FailureKind::Permanent => {
                    if e.is_expected() {
                        ErrorKind::Validation
                    } else {
                        ErrorKind::Internal
                    }
                }
            },
        }
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Internal => 500,
        }
    }

    /// Message safe to show to end users.
    ///
    /// Internal errors never leak storage or serialization detail.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::StorageError(_) => "unable to access the database".to_string(),
            Self::SerializationError(_) => "unable to decode stored data".to_string(),
            Self::Internal(_) => "an internal error occurred".to_string(),
            Self::Provider(e) if self.kind() == ErrorKind::Internal => {
                format!("the provider returned an error: {}", provider_tag(e))
            }
            _ => self.to_string(),
        }
    }

    /// Whether it is expected behavior (user input, resource does not exist, etc.) is used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::ValidationError(_)
            | Self::CorrectionsNotApplied { .. }
            | Self::DomainNotFound(_)
            | Self::ZoneNotFound(_)
            | Self::ServiceNotFound(_)
            | Self::ProviderNotFound(_)
            | Self::UserNotFound(_)
            | Self::Forbidden(_) => true,
            Self::Provider(e) => e.is_expected(),
            Self::StorageError(_) | Self::SerializationError(_) | Self::Internal(_) => false,
        }
    }
}

fn provider_tag(e: &ProviderError) -> String {
    serde_json::to_value(e)
        .ok()
        .and_then(|v| v.get("provider").and_then(|p| p.as_str()).map(String::from))
        .unwrap_or_else(|| "unknown".to_string())
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;

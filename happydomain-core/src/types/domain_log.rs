//! Per-domain event journal entries.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Identifier;

/// Severity of a domain log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    /// Successful state transition.
    Ack,
    Warn,
    /// User-visible failure.
    Err,
    Fatal,
    /// Stored data looks corrupted.
    Crit,
}

impl LogLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Ack => "ack",
            Self::Warn => "warn",
            Self::Err => "err",
            Self::Fatal => "fatal",
            Self::Crit => "crit",
        }
    }

    /// Parse the stored lowercase name.
    #[must_use]
    pub fn from_name(s: &str) -> Option<Self> {
        Some(match s {
            "debug" => Self::Debug,
            "info" => Self::Info,
            "ack" => Self::Ack,
            "warn" => Self::Warn,
            "err" => Self::Err,
            "fatal" => Self::Fatal,
            "crit" => Self::Crit,
            _ => return None,
        })
    }

    /// Level used when mirroring to the `log` facade.
    #[must_use]
    pub fn log_level(self) -> log::Level {
        match self {
            Self::Debug => log::Level::Debug,
            Self::Info | Self::Ack => log::Level::Info,
            Self::Warn => log::Level::Warn,
            Self::Err | Self::Fatal | Self::Crit => log::Level::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainLog {
    pub id: Identifier,
    pub domain_id: Identifier,
    pub author: Identifier,
    pub date: DateTime<Utc>,
    pub level: LogLevel,
    pub content: String,
}

impl DomainLog {
    #[must_use]
    pub fn new(
        domain_id: Identifier,
        author: Identifier,
        level: LogLevel,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Identifier::random(),
            domain_id,
            author,
            date: Utc::now(),
            level,
            content: content.into(),
        }
    }
}

//! # happydomain-provider
//!
//! DNS record model, record-set differ and hosting backends used by the
//! happyDomain zone orchestrator.
//!
//! ## Supported Backends
//!
//! | Backend | Feature Flag | Configuration |
//! |---------|-------------|---------------|
//! | [Cloudflare](https://www.cloudflare.com/) | `cloudflare` | `apiToken`, optional `accountId` |
//! | Zone files | `bind` | `directory` |
//!
//! ## Feature Flags
//!
//! - **`all-providers`** *(default)*: every backend listed above.
//! - **`native-tls`** *(default)* / **`rustls`**: TLS implementation used by
//!   HTTP backends.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use happydomain_provider::{ProviderTypeRegistry, Record, RecordData, get_zone_corrections};
//!
//! # async fn example() -> happydomain_provider::Result<()> {
//! let registry = ProviderTypeRegistry::with_builtin_providers();
//! let provider = registry.build("bind", &serde_json::json!({ "directory": "/var/lib/bind" }))?;
//!
//! let desired = vec![Record::new(
//!     "www.example.com.",
//!     300,
//!     RecordData::A { address: "192.0.2.1".parse().unwrap() },
//! )];
//! for correction in get_zone_corrections(&provider, "example.com.", &desired).await? {
//!     println!("{}", correction.msg());
//!     correction.apply().await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every backend operation returns [`Result<T, ProviderError>`](ProviderError).
//! [`ProviderError::kind()`] classifies failures; only
//! [`FailureKind::Transient`] ones are retried, with exponential backoff.

pub mod correction;
pub mod diff;
mod error;
mod http_client;
pub mod name;
mod providers;
pub mod record;
mod registry;
mod traits;
mod types;
mod utils;
pub mod zone_file;

pub use correction::{
    Correction, CorrectionAction, CorrectionKind, FCorrection, correction_id,
    get_zone_corrections,
};
pub use diff::{ChangeKind, RecordChange, diff_records};
pub use error::{FailureKind, ProviderError, Result};
pub use name::{fqdn, normalize};
pub use record::{Record, RecordClass, RecordData, RecordType, TxtChunks};
pub use registry::{ProviderBuilder, ProviderFactory, ProviderTypeRegistry};
pub use traits::DnsProvider;
pub use types::{
    FieldType, ProviderCapabilities, ProviderCredentialField, ProviderMetadata,
};
pub use utils::log_sanitizer::{redact_secret, truncate_for_log};
pub use zone_file::{ZoneFileError, parse_zone, write_zone};

#[cfg(feature = "bind")]
pub use providers::BindProvider;
#[cfg(feature = "cloudflare")]
pub use providers::CloudflareProvider;

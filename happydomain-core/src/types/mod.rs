//! Type definitions

mod backup;
mod domain;
mod domain_log;
mod identifier;
mod orchestration;
mod provider;
mod service;
mod user;
mod zone;

pub use backup::{Backup, RestoreResult};
pub use domain::{CreateDomainRequest, Domain, DomainWithHistory, UpdateDomainRequest};
pub use domain_log::{DomainLog, LogLevel};
pub use identifier::Identifier;
pub use orchestration::{
    ApplyCorrectionsRequest, Correction, CorrectionKind, DynamicUpdateRequest,
};
pub use provider::{CreateProviderRequest, Provider, UpdateProviderRequest};
pub use service::{Service, ServiceInput};
pub use user::User;
pub use zone::{DEFAULT_TTL, Zone, ZoneMeta};

// Re-export provider library types used in core signatures
pub use happydomain_provider::{ProviderMetadata, Record, RecordData};

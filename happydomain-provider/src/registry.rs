//! Registry of backend types.
//!
//! Maps a type tag (`"cloudflare"`, `"bind"`, ...) to a constructor taking the
//! backend's JSON configuration. Populated once at startup, read-only after.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{ProviderError, Result};
use crate::traits::DnsProvider;
use crate::types::ProviderMetadata;

#[cfg(feature = "bind")]
use crate::providers::BindProvider;
#[cfg(feature = "cloudflare")]
use crate::providers::CloudflareProvider;

/// Builds a backend instance from its stored configuration.
pub type ProviderBuilder =
    Box<dyn Fn(&serde_json::Value) -> Result<Arc<dyn DnsProvider>> + Send + Sync>;

/// One registered backend type.
pub struct ProviderFactory {
    pub metadata: ProviderMetadata,
    build: ProviderBuilder,
}

impl ProviderFactory {
    pub fn new(metadata: ProviderMetadata, build: ProviderBuilder) -> Self {
        Self { metadata, build }
    }

    /// Instantiate the backend from a configuration payload.
    pub fn build(&self, config: &serde_json::Value) -> Result<Arc<dyn DnsProvider>> {
        (self.build)(config)
    }
}

impl std::fmt::Debug for ProviderFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderFactory")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Backend types known to this process, keyed by type tag.
#[derive(Debug, Default)]
pub struct ProviderTypeRegistry {
    factories: BTreeMap<String, ProviderFactory>,
}

impl ProviderTypeRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every backend enabled via feature flags.
    pub fn with_builtin_providers() -> Self {
        let mut registry = Self::new();
        #[cfg(feature = "cloudflare")]
        registry.insert(ProviderFactory::new(
            CloudflareProvider::metadata(),
            Box::new(|config| {
                Ok(Arc::new(CloudflareProvider::from_config(config)?) as Arc<dyn DnsProvider>)
            }),
        ));
        #[cfg(feature = "bind")]
        registry.insert(ProviderFactory::new(
            BindProvider::metadata(),
            Box::new(|config| Ok(Arc::new(BindProvider::from_config(config)?) as Arc<dyn DnsProvider>)),
        ));
        registry
    }

    fn insert(&mut self, factory: ProviderFactory) {
        self.factories.insert(factory.metadata.id.clone(), factory);
    }

    /// Register a backend type. Tags are unique.
    pub fn register(&mut self, factory: ProviderFactory) -> Result<()> {
        if self.factories.contains_key(&factory.metadata.id) {
            return Err(ProviderError::DuplicateProviderType {
                provider: factory.metadata.id,
            });
        }
        log::debug!("Registered provider type {}", factory.metadata.id);
        self.insert(factory);
        Ok(())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    pub fn get(&self, tag: &str) -> Result<&ProviderFactory> {
        self.factories
            .get(tag)
            .ok_or_else(|| ProviderError::UnknownProviderType {
                provider: tag.to_string(),
            })
    }

    /// Instantiate a backend of type `tag`.
    pub fn build(&self, tag: &str, config: &serde_json::Value) -> Result<Arc<dyn DnsProvider>> {
        self.get(tag)?.build(config)
    }

    /// Metadata of every registered type, sorted by tag.
    pub fn metadata(&self) -> Vec<ProviderMetadata> {
        self.factories.values().map(|f| f.metadata.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProviderCapabilities;

    fn dummy_metadata(id: &str) -> ProviderMetadata {
        ProviderMetadata {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            required_fields: Vec::new(),
            capabilities: ProviderCapabilities::default(),
        }
    }

    fn failing_factory(id: &str) -> ProviderFactory {
        ProviderFactory::new(
            dummy_metadata(id),
            Box::new(|_| {
                Err(ProviderError::InvalidParameter {
                    provider: "dummy".to_string(),
                    param: "config".to_string(),
                    detail: "always fails".to_string(),
                })
            }),
        )
    }

    #[test]
    fn duplicate_tags_are_rejected() {
        let mut registry = ProviderTypeRegistry::new();
        assert!(registry.register(failing_factory("dummy")).is_ok());
        let err = registry.register(failing_factory("dummy")).unwrap_err();
        assert!(matches!(err, ProviderError::DuplicateProviderType { .. }));
    }

    #[test]
    fn unknown_tag_is_not_found() {
        let registry = ProviderTypeRegistry::new();
        let err = registry
            .build("route53", &serde_json::json!({}))
            .err()
            .unwrap();
        assert!(matches!(err, ProviderError::UnknownProviderType { .. }));
        assert_eq!(err.kind(), crate::error::FailureKind::NotFound);
    }

    #[test]
    fn build_errors_propagate() {
        let mut registry = ProviderTypeRegistry::new();
        registry.register(failing_factory("dummy")).unwrap();
        assert!(registry.build("dummy", &serde_json::Value::Null).is_err());
    }

    #[cfg(all(feature = "cloudflare", feature = "bind"))]
    #[test]
    fn builtin_providers_are_listed_by_tag() {
        let registry = ProviderTypeRegistry::with_builtin_providers();
        let tags: Vec<String> = registry.metadata().into_iter().map(|m| m.id).collect();
        assert_eq!(tags, vec!["bind".to_string(), "cloudflare".to_string()]);
    }
}

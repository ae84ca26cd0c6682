use serde::{Deserialize, Serialize};

use crate::record::RecordType;

// ============ Provider Metadata Types ============

/// The input type of a configuration field (affects UI rendering).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Plain text input.
    Text,
    /// Masked/password input.
    Password,
}

/// Definition of a single configuration field required by a backend.
///
/// Used to build provider forms dynamically.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCredentialField {
    /// Machine-readable field key (e.g., `"apiToken"`).
    pub key: String,
    /// Human-readable label (e.g., `"API Token"`).
    pub label: String,
    /// Input type for UI rendering.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the backend refuses to build without this field.
    #[serde(default)]
    pub required: bool,
    /// Optional placeholder text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Optional help/description text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

impl ProviderCredentialField {
    pub fn new(key: &str, label: &str, field_type: FieldType) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            field_type,
            required: true,
            placeholder: None,
            help_text: None,
        }
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    #[must_use]
    pub fn with_help(mut self, help: &str) -> Self {
        self.help_text = Some(help.to_string());
        self
    }
}

/// What a backend can do beyond reading and patching zones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCapabilities {
    pub list_zones: bool,
    pub create_domain: bool,
    /// Record types whose changes can be pushed. Empty means every type.
    pub record_types: Vec<RecordType>,
}

impl ProviderCapabilities {
    pub fn supports(&self, rtype: &str) -> bool {
        self.record_types.is_empty()
            || self
                .record_types
                .iter()
                .any(|t| t.as_str().eq_ignore_ascii_case(rtype))
    }
}

/// Static metadata describing a backend type.
///
/// Obtain via [`DnsProvider::metadata()`](crate::DnsProvider::metadata) or
/// [`ProviderTypeRegistry::metadata()`](crate::ProviderTypeRegistry::metadata).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMetadata {
    /// Type tag, also the registry key.
    pub id: String,
    /// Human-readable provider name.
    pub name: String,
    /// Short description of the provider.
    pub description: String,
    /// Configuration fields accepted by this backend.
    pub required_fields: Vec<ProviderCredentialField>,
    pub capabilities: ProviderCapabilities,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_type_list_supports_everything() {
        let caps = ProviderCapabilities::default();
        assert!(caps.supports("A"));
        assert!(caps.supports("TYPE65534"));
    }

    #[test]
    fn record_type_list_is_case_insensitive() {
        let caps = ProviderCapabilities {
            record_types: vec![RecordType::A, RecordType::MX],
            ..Default::default()
        };
        assert!(caps.supports("mx"));
        assert!(!caps.supports("SSHFP"));
    }

    #[test]
    fn credential_field_serializes_type_key() {
        let field = ProviderCredentialField::new("apiToken", "API Token", FieldType::Password);
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "password");
        assert_eq!(json["required"], true);
        assert!(json.get("placeholder").is_none());
    }
}

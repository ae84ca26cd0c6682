//! Input validation, content-addressed ids and ownership checks.

use happydomain_provider::name::{is_subdomain_of, normalize, subdomain};
use happydomain_provider::Record;
use sha1::{Digest, Sha1};

use crate::error::{CoreError, CoreResult};
use crate::types::{Domain, Identifier, Provider, User};

const MAX_NAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// SHA-1 of the concatenated presentation of `records`.
pub fn service_id(records: &[Record]) -> Identifier {
    let mut hasher = Sha1::new();
    for r in records {
        hasher.update(r.to_string().as_bytes());
    }
    Identifier::from_bytes(hasher.finalize().to_vec())
}

/// Check a domain name and return its canonical form.
pub fn validate_domain_name(name: &str) -> CoreResult<String> {
    let name = normalize(name.trim());
    if name == "." {
        return Err(CoreError::ValidationError("domain name is empty".into()));
    }
    if name.len() > MAX_NAME_LEN + 1 {
        return Err(CoreError::ValidationError(format!(
            "domain name {name} is too long"
        )));
    }
    for label in name.trim_end_matches('.').split('.') {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return Err(CoreError::ValidationError(format!(
                "invalid label {label:?} in {name}"
            )));
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(CoreError::ValidationError(format!(
                "invalid character in label {label:?}"
            )));
        }
    }
    Ok(name)
}

/// Canonical subdomain for a zone: `""` for the apex, lowercase labels
/// relative to `origin` otherwise. Absolute names must lie in the zone.
pub fn normalize_subdomain(input: &str, origin: &str) -> CoreResult<String> {
    let input = input.trim();
    if input.is_empty() || input == "@" {
        return Ok(String::new());
    }

    let relative = if input.ends_with('.') {
        subdomain(input, origin).ok_or_else(|| {
            CoreError::ValidationError(format!("{input} is not part of zone {origin}"))
        })?
    } else {
        input.to_string()
    };

    let relative = relative.to_ascii_lowercase();
    // a wildcard is only valid as the leftmost label
    let rest = match relative.strip_prefix('*') {
        Some("") => "",
        Some(rest) => rest.strip_prefix('.').ok_or_else(|| {
            CoreError::ValidationError(format!("invalid character in label {relative:?}"))
        })?,
        None => relative.as_str(),
    };
    if !rest.is_empty() {
        validate_domain_name(rest)?;
    }
    Ok(relative)
}

/// Whether `hostname` falls under `domain` on label boundaries.
pub fn host_in_domain(hostname: &str, domain: &str) -> bool {
    is_subdomain_of(&normalize(hostname), &normalize(domain))
}

/// Domain owned by `user`; foreign domains look absent.
pub fn ensure_domain_owner(user: &User, domain: Option<Domain>, id: &Identifier) -> CoreResult<Domain> {
    match domain {
        Some(d) if d.owner == user.id => Ok(d),
        _ => Err(CoreError::DomainNotFound(id.to_string())),
    }
}

/// Provider owned by `owner`; foreign providers look absent.
pub fn ensure_provider_owner(
    owner: &Identifier,
    provider: Option<Provider>,
    id: &Identifier,
) -> CoreResult<Provider> {
    match provider {
        Some(p) if &p.owner == owner => Ok(p),
        _ => Err(CoreError::ProviderNotFound(id.to_string())),
    }
}

//! Domain name helpers.
//!
//! Names handled by this crate are fully qualified (trailing dot) once they
//! enter a zone. Relative names only appear at the edges: zone files and
//! provider APIs that want labels relative to the zone apex.

/// Append a trailing dot if `name` is not already fully qualified.
///
/// The root name (`""` or `"."`) is returned as `"."`.
pub fn fqdn(name: &str) -> String {
    if name.is_empty() || name == "." {
        ".".to_string()
    } else if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

/// Lowercased fully qualified form, used as the canonical storage form.
pub fn normalize(name: &str) -> String {
    fqdn(&name.to_ascii_lowercase())
}

/// Qualify `name` against `origin`.
///
/// - `""` and `"@"` denote the origin itself
/// - a name ending with a dot is already absolute and returned as-is
/// - anything else is `name + "." + origin`
pub fn absolute_name(name: &str, origin: &str) -> String {
    if name.is_empty() || name == "@" {
        return fqdn(origin);
    }
    if name.ends_with('.') {
        return name.to_string();
    }

    let origin = fqdn(origin);
    if origin == "." {
        format!("{name}.")
    } else {
        format!("{name}.{origin}")
    }
}

/// Express `name` relative to `origin`.
///
/// The apex becomes `"@"`. Names outside the origin are returned unchanged.
pub fn relative_name(name: &str, origin: &str) -> String {
    let sub = subdomain(name, origin);
    match sub {
        Some(s) if s.is_empty() => "@".to_string(),
        Some(s) => s,
        None => name.to_string(),
    }
}

/// Label sequence between `name` and `origin`.
///
/// Returns `Some("")` for the apex and `None` when `name` is not inside the
/// origin. Comparison is case-insensitive; the returned labels keep the
/// case of `name`.
pub fn subdomain(name: &str, origin: &str) -> Option<String> {
    let name_fq = fqdn(name);
    let origin_fq = fqdn(origin);

    if name_fq.eq_ignore_ascii_case(&origin_fq) {
        return Some(String::new());
    }
    if origin_fq == "." {
        return Some(name_fq.trim_end_matches('.').to_string());
    }

    let suffix_len = origin_fq.len() + 1;
    if name_fq.len() <= suffix_len {
        return None;
    }
    let split = name_fq.len() - suffix_len;
    let (Some(head), Some(tail)) = (name_fq.get(..split), name_fq.get(split..)) else {
        return None;
    };
    match tail.strip_prefix('.') {
        Some(rest) if rest.eq_ignore_ascii_case(&origin_fq) => Some(head.to_string()),
        _ => None,
    }
}

/// Whether `name` equals `parent` or lies beneath it, on label boundaries.
pub fn is_subdomain_of(name: &str, parent: &str) -> bool {
    subdomain(name, parent).is_some()
}

/// Number of labels in a name, ignoring the root.
pub fn label_count(name: &str) -> usize {
    name.trim_end_matches('.')
        .split('.')
        .filter(|l| !l.is_empty())
        .count()
}

/// Strip the trailing dot, for APIs that do not use it.
pub fn without_trailing_dot(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

//! Keeps record contents and credentials out of logs.

/// Maximum number of bytes of a payload written to the log.
const TRUNCATE_LIMIT: usize = 256;

/// Characters of a secret left visible by [`redact_secret`].
const VISIBLE_SECRET_CHARS: usize = 4;

/// MSRV-compatible replacement for `str::floor_char_boundary`.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Cut long payloads (DKIM keys, full zone dumps) before logging them.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        s.to_string()
    } else {
        format!(
            "{}... [truncated, total {} bytes]",
            &s[..floor_char_boundary(s, TRUNCATE_LIMIT)],
            s.len()
        )
    }
}

/// Show only the first few characters of a credential.
pub fn redact_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(VISIBLE_SECRET_CHARS).collect();
    if secret.chars().count() <= VISIBLE_SECRET_CHARS * 2 {
        "****".to_string()
    } else {
        format!("{prefix}****")
    }
}

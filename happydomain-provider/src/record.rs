//! Typed DNS resource records.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

use crate::name::{absolute_name, normalize, relative_name};
use crate::zone_file::{self, ZoneFileError};

/// Longest character-string a TXT record can carry in one chunk.
const MAX_CHARACTER_STRING: usize = 255;

// ============ Record types ============

/// Record types the typed model understands.
///
/// Anything else is carried as [`RecordData::Other`].
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    A,
    AAAA,
    CNAME,
    MX,
    NS,
    TXT,
    SOA,
    SRV,
    CAA,
    TLSA,
    SSHFP,
    DS,
    NAPTR,
    PTR,
    OPENPGPKEY,
}

impl RecordType {
    /// Every typed record type, in presentation order.
    pub const ALL: &'static [RecordType] = &[
        Self::A,
        Self::AAAA,
        Self::CNAME,
        Self::MX,
        Self::NS,
        Self::TXT,
        Self::SOA,
        Self::SRV,
        Self::CAA,
        Self::TLSA,
        Self::SSHFP,
        Self::DS,
        Self::NAPTR,
        Self::PTR,
        Self::OPENPGPKEY,
    ];

    /// Mnemonic as used in zone files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::AAAA => "AAAA",
            Self::CNAME => "CNAME",
            Self::MX => "MX",
            Self::NS => "NS",
            Self::TXT => "TXT",
            Self::SOA => "SOA",
            Self::SRV => "SRV",
            Self::CAA => "CAA",
            Self::TLSA => "TLSA",
            Self::SSHFP => "SSHFP",
            Self::DS => "DS",
            Self::NAPTR => "NAPTR",
            Self::PTR => "PTR",
            Self::OPENPGPKEY => "OPENPGPKEY",
        }
    }

    /// Case-insensitive lookup of a mnemonic.
    pub fn from_mnemonic(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// DNS class. Only `IN` matters in practice.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordClass {
    #[default]
    IN,
    CH,
    HS,
}

impl RecordClass {
    pub fn from_mnemonic(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "IN" => Some(Self::IN),
            "CH" => Some(Self::CH),
            "HS" => Some(Self::HS),
            _ => None,
        }
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::IN => "IN",
            Self::CH => "CH",
            Self::HS => "HS",
        };
        f.write_str(s)
    }
}

// ============ TXT chunking ============

/// Byte lengths of the character-strings a TXT record was read with.
///
/// Only steers presentation, so that a rewritten zone file keeps
/// `"a" "b"` apart. Records differing in layout alone compare equal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxtChunks(Vec<usize>);

impl TxtChunks {
    /// Layout worth keeping: more than one character-string.
    pub fn from_lengths(lengths: impl IntoIterator<Item = usize>) -> Self {
        let lengths: Vec<usize> = lengths.into_iter().collect();
        if lengths.len() > 1 {
            Self(lengths)
        } else {
            Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `text` quoted along this layout, if it still fits it.
    fn render(&self, text: &str) -> Option<String> {
        if self.0.is_empty() || self.0.iter().sum::<usize>() != text.len() {
            return None;
        }

        let mut chunks = Vec::with_capacity(self.0.len());
        let mut rest = text;
        for &len in &self.0 {
            if len > MAX_CHARACTER_STRING || !rest.is_char_boundary(len) {
                return None;
            }
            let (chunk, tail) = rest.split_at(len);
            chunks.push(quote(chunk));
            rest = tail;
        }
        Some(chunks.join(" "))
    }
}

impl PartialEq for TxtChunks {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for TxtChunks {}

impl std::hash::Hash for TxtChunks {
    fn hash<H: std::hash::Hasher>(&self, _state: &mut H) {}
}

// ============ RDATA ============

/// Type-specific record data.
///
/// Domain names inside RDATA are stored fully qualified once the record has
/// been [normalized](Record::normalized).
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "content")]
pub enum RecordData {
    A {
        address: Ipv4Addr,
    },
    AAAA {
        address: Ipv6Addr,
    },
    CNAME {
        target: String,
    },
    MX {
        preference: u16,
        exchange: String,
    },
    NS {
        nameserver: String,
    },
    /// TXT data, with all character-strings concatenated.
    TXT {
        text: String,
        #[serde(default, skip_serializing_if = "TxtChunks::is_empty")]
        chunks: TxtChunks,
    },
    SOA {
        mname: String,
        rname: String,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    },
    SRV {
        priority: u16,
        weight: u16,
        port: u16,
        target: String,
    },
    CAA {
        flags: u8,
        tag: String,
        value: String,
    },
    TLSA {
        usage: u8,
        selector: u8,
        matching_type: u8,
        /// Hex-encoded association data.
        certificate: String,
    },
    SSHFP {
        algorithm: u8,
        fp_type: u8,
        /// Hex-encoded fingerprint.
        fingerprint: String,
    },
    DS {
        key_tag: u16,
        algorithm: u8,
        digest_type: u8,
        /// Hex-encoded digest.
        digest: String,
    },
    NAPTR {
        order: u16,
        preference: u16,
        flags: String,
        service: String,
        regexp: String,
        replacement: String,
    },
    PTR {
        target: String,
    },
    OPENPGPKEY {
        /// Base64-encoded key material.
        public_key: String,
    },
    /// Any other type, kept in presentation format.
    Other {
        rtype: String,
        rdata: String,
    },
}

impl RecordData {
    /// TXT data with the default 255-byte chunking.
    pub fn txt(text: impl Into<String>) -> Self {
        Self::TXT {
            text: text.into(),
            chunks: TxtChunks::default(),
        }
    }

    /// Type mnemonic of this data.
    pub fn rtype(&self) -> &str {
        match self {
            Self::A { .. } => "A",
            Self::AAAA { .. } => "AAAA",
            Self::CNAME { .. } => "CNAME",
            Self::MX { .. } => "MX",
            Self::NS { .. } => "NS",
            Self::TXT { .. } => "TXT",
            Self::SOA { .. } => "SOA",
            Self::SRV { .. } => "SRV",
            Self::CAA { .. } => "CAA",
            Self::TLSA { .. } => "TLSA",
            Self::SSHFP { .. } => "SSHFP",
            Self::DS { .. } => "DS",
            Self::NAPTR { .. } => "NAPTR",
            Self::PTR { .. } => "PTR",
            Self::OPENPGPKEY { .. } => "OPENPGPKEY",
            Self::Other { rtype, .. } => rtype,
        }
    }

    /// Typed record type, `None` for [`RecordData::Other`].
    pub fn record_type(&self) -> Option<RecordType> {
        RecordType::from_mnemonic(self.rtype()).filter(|_| !matches!(self, Self::Other { .. }))
    }

    /// Parse presentation-format RDATA for `rtype`, qualifying relative names
    /// against `origin`.
    pub fn from_presentation(
        rtype: &str,
        rdata: &str,
        origin: &str,
    ) -> Result<Self, ZoneFileError> {
        zone_file::parse_rdata(rtype, rdata, origin)
    }

    /// RDATA in zone-file presentation format.
    pub fn to_presentation(&self) -> String {
        match self {
            Self::A { address } => address.to_string(),
            Self::AAAA { address } => address.to_string(),
            Self::CNAME { target } | Self::PTR { target } => target.clone(),
            Self::NS { nameserver } => nameserver.clone(),
            Self::MX {
                preference,
                exchange,
            } => format!("{preference} {exchange}"),
            Self::TXT { text, chunks } => chunks
                .render(text)
                .unwrap_or_else(|| quote_character_strings(text)),
            Self::SOA {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => format!("{mname} {rname} {serial} {refresh} {retry} {expire} {minimum}"),
            Self::SRV {
                priority,
                weight,
                port,
                target,
            } => format!("{priority} {weight} {port} {target}"),
            Self::CAA { flags, tag, value } => format!("{flags} {tag} {}", quote(value)),
            Self::TLSA {
                usage,
                selector,
                matching_type,
                certificate,
            } => format!("{usage} {selector} {matching_type} {certificate}"),
            Self::SSHFP {
                algorithm,
                fp_type,
                fingerprint,
            } => format!("{algorithm} {fp_type} {fingerprint}"),
            Self::DS {
                key_tag,
                algorithm,
                digest_type,
                digest,
            } => format!("{key_tag} {algorithm} {digest_type} {digest}"),
            Self::NAPTR {
                order,
                preference,
                flags,
                service,
                regexp,
                replacement,
            } => format!(
                "{order} {preference} {} {} {} {replacement}",
                quote(flags),
                quote(service),
                quote(regexp)
            ),
            Self::OPENPGPKEY { public_key } => public_key.clone(),
            Self::Other { rdata, .. } => rdata.clone(),
        }
    }

    /// Canonical form: names qualified against `origin` and lowercased,
    /// hex strings lowercased, whitespace removed from binary encodings.
    pub fn normalized(&self, origin: &str) -> Self {
        let n = |name: &str| normalize(&absolute_name(name, origin));
        let hex = |s: &str| {
            s.chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_lowercase()
        };

        match self {
            Self::CNAME { target } => Self::CNAME { target: n(target) },
            Self::PTR { target } => Self::PTR { target: n(target) },
            Self::NS { nameserver } => Self::NS {
                nameserver: n(nameserver),
            },
            Self::MX {
                preference,
                exchange,
            } => Self::MX {
                preference: *preference,
                exchange: n(exchange),
            },
            Self::SOA {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => Self::SOA {
                mname: n(mname),
                rname: n(rname),
                serial: *serial,
                refresh: *refresh,
                retry: *retry,
                expire: *expire,
                minimum: *minimum,
            },
            Self::SRV {
                priority,
                weight,
                port,
                target,
            } => Self::SRV {
                priority: *priority,
                weight: *weight,
                port: *port,
                target: n(target),
            },
            Self::CAA { flags, tag, value } => Self::CAA {
                flags: *flags,
                tag: tag.to_ascii_lowercase(),
                value: value.clone(),
            },
            Self::TLSA {
                usage,
                selector,
                matching_type,
                certificate,
            } => Self::TLSA {
                usage: *usage,
                selector: *selector,
                matching_type: *matching_type,
                certificate: hex(certificate),
            },
            Self::SSHFP {
                algorithm,
                fp_type,
                fingerprint,
            } => Self::SSHFP {
                algorithm: *algorithm,
                fp_type: *fp_type,
                fingerprint: hex(fingerprint),
            },
            Self::DS {
                key_tag,
                algorithm,
                digest_type,
                digest,
            } => Self::DS {
                key_tag: *key_tag,
                algorithm: *algorithm,
                digest_type: *digest_type,
                digest: hex(digest),
            },
            Self::NAPTR {
                order,
                preference,
                flags,
                service,
                regexp,
                replacement,
            } => Self::NAPTR {
                order: *order,
                preference: *preference,
                flags: flags.clone(),
                service: service.clone(),
                regexp: regexp.clone(),
                replacement: if replacement == "." {
                    ".".to_string()
                } else {
                    n(replacement)
                },
            },
            Self::OPENPGPKEY { public_key } => Self::OPENPGPKEY {
                public_key: public_key.chars().filter(|c| !c.is_whitespace()).collect(),
            },
            Self::Other { rtype, rdata } => Self::Other {
                rtype: rtype.to_ascii_uppercase(),
                rdata: rdata.split_whitespace().collect::<Vec<_>>().join(" "),
            },
            Self::A { .. } | Self::AAAA { .. } | Self::TXT { .. } => self.clone(),
        }
    }
}

// ============ Record ============

/// A resource record: owner, class, TTL and data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// Owner name, fully qualified once normalized.
    pub name: String,
    #[serde(default)]
    pub class: RecordClass,
    pub ttl: u32,
    pub data: RecordData,
}

impl Record {
    /// Build an `IN` record.
    pub fn new(name: impl Into<String>, ttl: u32, data: RecordData) -> Self {
        Self {
            name: name.into(),
            class: RecordClass::IN,
            ttl,
            data,
        }
    }

    /// Type mnemonic.
    pub fn rtype(&self) -> &str {
        self.data.rtype()
    }

    /// Owner and RDATA qualified against `origin` and lowercased.
    pub fn normalized(&self, origin: &str) -> Self {
        Self {
            name: normalize(&absolute_name(&self.name, origin)),
            class: self.class,
            ttl: self.ttl,
            data: self.data.normalized(origin),
        }
    }

    /// Zone-file line with the owner relative to `origin`.
    pub fn to_relative_line(&self, origin: &str) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}",
            relative_name(&self.name, origin),
            self.ttl,
            self.class,
            self.rtype(),
            self.data.to_presentation()
        )
    }

    /// Whether both records carry the same owner, class and data, ignoring TTL.
    pub fn same_data(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
            && self.class == other.class
            && self.data == other.data
    }
}

impl fmt::Display for Record {
    /// Absolute zone-file line: `owner TTL CLASS TYPE RDATA`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.name,
            self.ttl,
            self.class,
            self.rtype(),
            self.data.to_presentation()
        )
    }
}

// ============ Presentation helpers ============

/// Quote a single character-string, escaping `"` and `\`.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Split `text` into quoted character-strings of at most 255 bytes each.
pub fn quote_character_strings(text: &str) -> String {
    if text.is_empty() {
        return "\"\"".to_string();
    }

    let mut chunks = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let mut end = rest.len().min(MAX_CHARACTER_STRING);
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (chunk, tail) = rest.split_at(end);
        chunks.push(quote(chunk));
        rest = tail;
    }
    chunks.join(" ")
}

//! RFC 1035 master file reader and writer.
//!
//! Supports `$ORIGIN`, `$TTL`, `@`, owner inheritance through leading
//! whitespace, parenthesised multi-line records, `;` comments and quoted
//! character-strings with `\X` and `\DDD` escapes. `$INCLUDE` is rejected.

use std::iter::Peekable;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::{Chars, FromStr};

use thiserror::Error;

use crate::name::{absolute_name, normalize};
use crate::record::{Record, RecordClass, RecordData, RecordType, TxtChunks, quote};

/// Errors raised while reading zone files or presentation RDATA.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoneFileError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("invalid {rtype} rdata: {message}")]
    InvalidRdata { rtype: String, message: String },
}

impl ZoneFileError {
    fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }

    fn rdata(rtype: &str, message: impl Into<String>) -> Self {
        Self::InvalidRdata {
            rtype: rtype.to_ascii_uppercase(),
            message: message.into(),
        }
    }
}

// ============ Tokenizer ============

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    text: String,
    quoted: bool,
}

/// One logical entry: a physical line, or several joined by parentheses.
#[derive(Debug)]
struct Entry {
    line: usize,
    leading_blank: bool,
    tokens: Vec<Token>,
}

struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
        }
    }

    fn entries(mut self) -> Result<Vec<Entry>, ZoneFileError> {
        let mut entries = Vec::new();
        let mut depth = 0usize;
        let mut current = Entry {
            line: 1,
            leading_blank: false,
            tokens: Vec::new(),
        };
        let mut line_start = true;

        while let Some(&c) = self.chars.peek() {
            if line_start && depth == 0 {
                current.line = self.line;
                current.leading_blank = c == ' ' || c == '\t';
                line_start = false;
            }

            match c {
                '\n' => {
                    self.chars.next();
                    self.line += 1;
                    if depth == 0 {
                        Self::flush(&mut entries, &mut current);
                        line_start = true;
                    }
                }
                ';' => {
                    while self.chars.peek().is_some_and(|&c| c != '\n') {
                        self.chars.next();
                    }
                }
                '(' => {
                    self.chars.next();
                    depth += 1;
                }
                ')' => {
                    self.chars.next();
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| ZoneFileError::syntax(self.line, "unbalanced ')'"))?;
                }
                '"' => {
                    self.chars.next();
                    let text = self.quoted()?;
                    current.tokens.push(Token { text, quoted: true });
                }
                c if c.is_whitespace() => {
                    self.chars.next();
                }
                _ => {
                    let text = self.word();
                    current.tokens.push(Token {
                        text,
                        quoted: false,
                    });
                }
            }
        }

        if depth > 0 {
            return Err(ZoneFileError::syntax(self.line, "unterminated '('"));
        }
        Self::flush(&mut entries, &mut current);
        Ok(entries)
    }

    fn flush(entries: &mut Vec<Entry>, current: &mut Entry) {
        if !current.tokens.is_empty() {
            entries.push(Entry {
                line: current.line,
                leading_blank: current.leading_blank,
                tokens: std::mem::take(&mut current.tokens),
            });
        }
    }

    /// Unquoted word; backslash escapes are kept verbatim.
    fn word(&mut self) -> String {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || matches!(c, '(' | ')' | ';' | '"') {
                break;
            }
            self.chars.next();
            out.push(c);
            if c == '\\'
                && let Some(escaped) = self.chars.next()
            {
                out.push(escaped);
            }
        }
        out
    }

    /// Body of a quoted string, opening quote already consumed.
    fn quoted(&mut self) -> Result<String, ZoneFileError> {
        let mut bytes = Vec::new();
        loop {
            let Some(c) = self.chars.next() else {
                return Err(ZoneFileError::syntax(self.line, "unterminated quoted string"));
            };
            match c {
                '"' => break,
                '\n' => {
                    return Err(ZoneFileError::syntax(self.line, "newline in quoted string"));
                }
                '\\' => {
                    let Some(next) = self.chars.next() else {
                        return Err(ZoneFileError::syntax(self.line, "dangling escape"));
                    };
                    if next.is_ascii_digit() {
                        let mut digits = String::from(next);
                        for _ in 0..2 {
                            match self.chars.next() {
                                Some(d) if d.is_ascii_digit() => digits.push(d),
                                _ => {
                                    return Err(ZoneFileError::syntax(
                                        self.line,
                                        "\\DDD escape needs three digits",
                                    ));
                                }
                            }
                        }
                        let value = digits.parse::<u8>().map_err(|_| {
                            ZoneFileError::syntax(self.line, "\\DDD escape out of range")
                        })?;
                        bytes.push(value);
                    } else {
                        push_char(&mut bytes, next);
                    }
                }
                other => push_char(&mut bytes, other),
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn push_char(bytes: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

// ============ TTL ============

/// Parse a TTL, accepting plain seconds or BIND units (`1h30m`, `2d`, `1w`).
pub fn parse_ttl(s: &str) -> Option<u32> {
    if !s.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    if let Ok(secs) = s.parse::<u32>() {
        return Some(secs);
    }

    let mut total: u32 = 0;
    let mut number: Option<u32> = None;
    for c in s.chars() {
        if let Some(d) = c.to_digit(10) {
            number = Some(number.unwrap_or(0).checked_mul(10)?.checked_add(d)?);
            continue;
        }
        let factor = match c.to_ascii_lowercase() {
            's' => 1,
            'm' => 60,
            'h' => 3_600,
            'd' => 86_400,
            'w' => 604_800,
            _ => return None,
        };
        total = total.checked_add(number.take()?.checked_mul(factor)?)?;
    }
    // A trailing bare number counts as seconds.
    match number {
        Some(n) => total.checked_add(n),
        None => Some(total),
    }
}

// ============ Parser ============

/// Read a master file whose initial origin is `origin`.
///
/// Returned records are normalized: owners and embedded names are fully
/// qualified and lowercased.
pub fn parse_zone(origin: &str, input: &str) -> Result<Vec<Record>, ZoneFileError> {
    let mut origin = normalize(origin);
    let mut default_ttl: Option<u32> = None;
    let mut last_ttl: Option<u32> = None;
    let mut last_owner: Option<String> = None;
    let mut records = Vec::new();

    for entry in Tokenizer::new(input).entries()? {
        let line = entry.line;
        let tokens = &entry.tokens;

        if !entry.leading_blank && !tokens[0].quoted && tokens[0].text.starts_with('$') {
            let arg = tokens
                .get(1)
                .ok_or_else(|| ZoneFileError::syntax(line, "directive without argument"))?;
            match tokens[0].text.to_ascii_uppercase().as_str() {
                "$ORIGIN" => origin = normalize(&absolute_name(&arg.text, &origin)),
                "$TTL" => {
                    default_ttl = Some(
                        parse_ttl(&arg.text)
                            .ok_or_else(|| ZoneFileError::syntax(line, "invalid $TTL"))?,
                    );
                }
                other => {
                    return Err(ZoneFileError::syntax(
                        line,
                        format!("unsupported directive {other}"),
                    ));
                }
            }
            continue;
        }

        let (owner, mut idx) = if entry.leading_blank {
            let owner = last_owner
                .clone()
                .ok_or_else(|| ZoneFileError::syntax(line, "no previous owner to inherit"))?;
            (owner, 0)
        } else {
            (normalize(&absolute_name(&tokens[0].text, &origin)), 1)
        };

        let mut ttl: Option<u32> = None;
        let mut class: Option<RecordClass> = None;
        while let Some(tok) = tokens.get(idx) {
            if ttl.is_none()
                && let Some(t) = parse_ttl(&tok.text)
            {
                ttl = Some(t);
            } else if class.is_none()
                && let Some(c) = RecordClass::from_mnemonic(&tok.text)
            {
                class = Some(c);
            } else {
                break;
            }
            idx += 1;
        }

        let rtype = tokens
            .get(idx)
            .ok_or_else(|| ZoneFileError::syntax(line, "missing record type"))?;

        let ttl = match ttl {
            Some(t) => {
                last_ttl = Some(t);
                t
            }
            None => default_ttl
                .or(last_ttl)
                .ok_or_else(|| ZoneFileError::syntax(line, "no TTL and no $TTL in effect"))?,
        };

        let data = parse_rdata_tokens(&rtype.text, &tokens[idx + 1..], &origin).map_err(|e| {
            ZoneFileError::syntax(line, e.to_string())
        })?;

        records.push(Record {
            name: owner.clone(),
            class: class.unwrap_or_default(),
            ttl,
            data,
        });
        last_owner = Some(owner);
    }

    Ok(records)
}

/// Parse presentation RDATA for a single record.
pub fn parse_rdata(rtype: &str, rdata: &str, origin: &str) -> Result<RecordData, ZoneFileError> {
    let tokens: Vec<Token> = Tokenizer::new(rdata)
        .entries()
        .map_err(|e| ZoneFileError::rdata(rtype, e.to_string()))?
        .into_iter()
        .flat_map(|e| e.tokens)
        .collect();
    parse_rdata_tokens(rtype, &tokens, origin)
}

fn parse_rdata_tokens(
    rtype: &str,
    tokens: &[Token],
    origin: &str,
) -> Result<RecordData, ZoneFileError> {
    let Some(typed) = RecordType::from_mnemonic(rtype) else {
        let rdata = tokens
            .iter()
            .map(|t| if t.quoted { quote(&t.text) } else { t.text.clone() })
            .collect::<Vec<_>>()
            .join(" ");
        return Ok(RecordData::Other {
            rtype: rtype.to_ascii_uppercase(),
            rdata,
        });
    };

    let f = Fields {
        rtype,
        tokens,
        origin,
    };

    let data = match typed {
        RecordType::A => {
            f.exact(1)?;
            RecordData::A {
                address: f.parse::<Ipv4Addr>(0)?,
            }
        }
        RecordType::AAAA => {
            f.exact(1)?;
            RecordData::AAAA {
                address: f.parse::<Ipv6Addr>(0)?,
            }
        }
        RecordType::CNAME => {
            f.exact(1)?;
            RecordData::CNAME { target: f.name(0)? }
        }
        RecordType::PTR => {
            f.exact(1)?;
            RecordData::PTR { target: f.name(0)? }
        }
        RecordType::NS => {
            f.exact(1)?;
            RecordData::NS {
                nameserver: f.name(0)?,
            }
        }
        RecordType::MX => {
            f.exact(2)?;
            RecordData::MX {
                preference: f.parse(0)?,
                exchange: f.name(1)?,
            }
        }
        RecordType::TXT => {
            f.at_least(1)?;
            RecordData::TXT {
                text: tokens.iter().map(|t| t.text.as_str()).collect(),
                chunks: TxtChunks::from_lengths(tokens.iter().map(|t| t.text.len())),
            }
        }
        RecordType::SOA => {
            f.exact(7)?;
            RecordData::SOA {
                mname: f.name(0)?,
                rname: f.name(1)?,
                serial: f.parse(2)?,
                refresh: f.ttl(3)?,
                retry: f.ttl(4)?,
                expire: f.ttl(5)?,
                minimum: f.ttl(6)?,
            }
        }
        RecordType::SRV => {
            f.exact(4)?;
            RecordData::SRV {
                priority: f.parse(0)?,
                weight: f.parse(1)?,
                port: f.parse(2)?,
                target: f.name(3)?,
            }
        }
        RecordType::CAA => {
            f.at_least(3)?;
            RecordData::CAA {
                flags: f.parse(0)?,
                tag: f.text(1)?,
                value: f.rest(2, " "),
            }
        }
        RecordType::TLSA => {
            f.at_least(4)?;
            RecordData::TLSA {
                usage: f.parse(0)?,
                selector: f.parse(1)?,
                matching_type: f.parse(2)?,
                certificate: f.rest(3, ""),
            }
        }
        RecordType::SSHFP => {
            f.at_least(3)?;
            RecordData::SSHFP {
                algorithm: f.parse(0)?,
                fp_type: f.parse(1)?,
                fingerprint: f.rest(2, ""),
            }
        }
        RecordType::DS => {
            f.at_least(4)?;
            RecordData::DS {
                key_tag: f.parse(0)?,
                algorithm: f.parse(1)?,
                digest_type: f.parse(2)?,
                digest: f.rest(3, ""),
            }
        }
        RecordType::NAPTR => {
            f.exact(6)?;
            RecordData::NAPTR {
                order: f.parse(0)?,
                preference: f.parse(1)?,
                flags: f.text(2)?,
                service: f.text(3)?,
                regexp: f.text(4)?,
                replacement: f.name(5)?,
            }
        }
        RecordType::OPENPGPKEY => {
            f.at_least(1)?;
            RecordData::OPENPGPKEY {
                public_key: f.rest(0, ""),
            }
        }
    };

    Ok(data.normalized(origin))
}

/// Positional access to RDATA tokens with typed errors.
struct Fields<'a> {
    rtype: &'a str,
    tokens: &'a [Token],
    origin: &'a str,
}

impl Fields<'_> {
    fn exact(&self, n: usize) -> Result<(), ZoneFileError> {
        if self.tokens.len() == n {
            Ok(())
        } else {
            Err(ZoneFileError::rdata(
                self.rtype,
                format!("expected {n} fields, found {}", self.tokens.len()),
            ))
        }
    }

    fn at_least(&self, n: usize) -> Result<(), ZoneFileError> {
        if self.tokens.len() >= n {
            Ok(())
        } else {
            Err(ZoneFileError::rdata(
                self.rtype,
                format!("expected at least {n} fields, found {}", self.tokens.len()),
            ))
        }
    }

    fn text(&self, i: usize) -> Result<String, ZoneFileError> {
        self.tokens
            .get(i)
            .map(|t| t.text.clone())
            .ok_or_else(|| ZoneFileError::rdata(self.rtype, format!("missing field {i}")))
    }

    fn parse<T: FromStr>(&self, i: usize) -> Result<T, ZoneFileError> {
        let text = self.text(i)?;
        text.parse::<T>()
            .map_err(|_| ZoneFileError::rdata(self.rtype, format!("invalid value '{text}'")))
    }

    fn ttl(&self, i: usize) -> Result<u32, ZoneFileError> {
        let text = self.text(i)?;
        parse_ttl(&text)
            .ok_or_else(|| ZoneFileError::rdata(self.rtype, format!("invalid interval '{text}'")))
    }

    fn name(&self, i: usize) -> Result<String, ZoneFileError> {
        Ok(absolute_name(&self.text(i)?, self.origin))
    }

    fn rest(&self, from: usize, sep: &str) -> String {
        self.tokens
            .get(from..)
            .unwrap_or_default()
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(sep)
    }
}

// ============ Writer ============

/// Render `records` as a master file rooted at `origin`.
///
/// SOA records come first; the rest keep their relative order.
pub fn write_zone(origin: &str, records: &[Record]) -> String {
    let origin = normalize(origin);
    let mut out = format!("$ORIGIN {origin}\n");

    let (soa, rest): (Vec<&Record>, Vec<&Record>) = records
        .iter()
        .partition(|r| matches!(r.data, RecordData::SOA { .. }));

    for record in soa.into_iter().chain(rest) {
        out.push_str(&record.to_relative_line(&origin));
        out.push('\n');
    }
    out
}

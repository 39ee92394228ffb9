//! Parser for `.properties` style bodies.
//!
//! Supports the line-oriented syntax used by remote property servers:
//!
//! - blank lines and lines starting with `#` or `!` are skipped
//! - keys end at the first unescaped `=`, `:` or whitespace
//! - a line ending in an odd number of backslashes continues on the next line
//! - escapes `\t`, `\n`, `\r`, `\f` and `\uXXXX`; any other escaped
//!   character stands for itself
//!
//! Every value is returned as a string [`config::Value`] whose origin is the
//! source name, so typed reads are coerced lazily.

use super::RawProperties;
use crate::error::{ConfigError, Result};
use std::collections::HashMap;

/// Parse a `.properties` body into raw properties.
///
/// `origin` names the source and is used both as the value origin and in
/// error messages.
///
/// # Errors
///
/// Returns [`ConfigError::Malformed`] with the 1-based line number of the
/// entry if an escape sequence is invalid.
///
/// # Examples
///
/// ```rust
/// use polling_config::sources::properties;
///
/// let props = properties::parse("inline", "a=A\n# comment\nb : B\n").unwrap();
/// assert_eq!(props.len(), 2);
/// assert_eq!(props["b"].clone().into_string().unwrap(), "B");
/// ```
pub fn parse(origin: &str, body: &str) -> Result<RawProperties> {
    let origin_name = origin.to_string();
    let mut properties = HashMap::new();
    let mut lines = body.lines().enumerate();

    while let Some((index, line)) = lines.next() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let line_number = index + 1;
        let mut logical = trimmed.to_string();
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (raw_key, raw_value) = split_entry(&logical);
        let key = unescape(raw_key).map_err(|reason| malformed(origin, line_number, reason))?;
        let value = unescape(raw_value).map_err(|reason| malformed(origin, line_number, reason))?;

        properties.insert(
            key,
            config::Value::new(Some(&origin_name), config::ValueKind::String(value)),
        );
    }

    Ok(properties)
}

/// Parse a raw `.properties` body that must be valid UTF-8.
///
/// # Errors
///
/// Returns [`ConfigError::Malformed`] pointing at the first line holding
/// invalid UTF-8, or any error [`parse`] reports.
pub fn parse_bytes(origin: &str, body: &[u8]) -> Result<RawProperties> {
    match std::str::from_utf8(body) {
        Ok(text) => parse(origin, text),
        Err(e) => {
            let valid = &body[..e.valid_up_to()];
            let line = valid.iter().filter(|b| **b == b'\n').count() + 1;
            Err(malformed(origin, line, format!("invalid UTF-8: {}", e)))
        }
    }
}

fn malformed(origin: &str, line: usize, reason: String) -> ConfigError {
    ConfigError::Malformed {
        endpoint: origin.to_string(),
        line,
        reason,
    }
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Split a logical line into its raw (still escaped) key and value.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (&line[..i], line[i + 1..].trim_start()),
            c if c.is_whitespace() => {
                let rest = line[i..].trim_start();
                let rest = rest
                    .strip_prefix(|c: char| c == '=' || c == ':')
                    .map(str::trim_start)
                    .unwrap_or(rest);
                return (&line[..i], rest);
            }
            _ => {}
        }
    }
    (line, "")
}

fn unescape(raw: &str) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                if hex.chars().count() != 4 {
                    return Err(format!("truncated unicode escape '\\u{}'", hex));
                }
                let code = u32::from_str_radix(&hex, 16)
                    .map_err(|_| format!("invalid unicode escape '\\u{}'", hex))?;
                let decoded = char::from_u32(code)
                    .ok_or_else(|| format!("unicode escape '\\u{}' is not a character", hex))?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

//! Language (INI) file parsing

use crate::error::{Error, Result};
use regex::Regex;

lazy_static::lazy_static! {
    static ref KEY_VALUE: Regex = Regex::new(r"^([A-Za-z0-9_.\-]+)\s*=\s*(.*)$").unwrap();
    static ref SECTION: Regex = Regex::new(r"^\[[^\]]*\]$").unwrap();
}

/// One `KEY="value"` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniEntry {
    pub key: String,
    pub value: String,
    /// 1-based line number in the file
    pub line: usize,
}

/// Parse a language file. Blank lines, `;` comments and `[section]`
/// headers yield nothing; anything else must be a key/value pair.
pub fn parse_ini(content: &str, file: &str) -> Result<Vec<IniEntry>> {
    let mut entries = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = raw.trim_start_matches('\u{feff}').trim();
        if line.is_empty() || line.starts_with(';') || SECTION.is_match(line) {
            continue;
        }

        let syntax = |message: &str| Error::Syntax {
            file: file.to_string(),
            line: line_number,
            message: message.to_string(),
        };

        let caps = KEY_VALUE
            .captures(line)
            .ok_or_else(|| syntax("expected KEY=\"value\""))?;
        let key = caps[1].to_string();
        let value = parse_value(&caps[2]).ok_or_else(|| syntax("unterminated or stray quote in value"))?;

        entries.push(IniEntry {
            key,
            value,
            line: line_number,
        });
    }

    Ok(entries)
}

fn parse_value(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Some(inner) = raw.strip_prefix('"') {
        let inner = strip_trailing_comment(inner).strip_suffix('"')?;
        let stray = inner.replace("\"_QQ_\"", "").replace("\\\"", "");
        if stray.contains('"') {
            return None;
        }
        Some(inner.replace("\"_QQ_\"", "\"").replace("\\\"", "\""))
    } else if raw.contains('"') {
        None
    } else {
        Some(raw.to_string())
    }
}

/// `value" ; note` becomes `value"`. Only a `;` after the last quote counts.
fn strip_trailing_comment(quoted: &str) -> &str {
    match quoted.rfind('"') {
        Some(end) if quoted[end + 1..].trim_start().starts_with(';') => &quoted[..=end],
        _ => quoted,
    }
}

/// Declared keys in file order
pub fn declared_keys(entries: &[IniEntry]) -> Vec<String> {
    entries.iter().map(|e| e.key.clone()).collect()
}

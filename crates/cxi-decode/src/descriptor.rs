use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::DecodeResult;

/// Contents of the export descriptor, a Java properties file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportDescriptor {
    entries: BTreeMap<String, String>,
}

impl ExportDescriptor {
    pub fn load(path: &Path) -> DecodeResult<Self> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    /// Parse properties text. Malformed escapes are kept literally.
    pub fn parse(text: &str) -> Self {
        let mut entries = BTreeMap::new();
        for line in logical_lines(text) {
            let (key, value) = split_entry(&line);
            entries.insert(unescape(key), unescape(value));
        }
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `space` or `all`.
    pub fn export_type(&self) -> Option<&str> {
        self.get("exportType")
    }

    pub fn space_key(&self) -> Option<&str> {
        self.get("spaceKey")
    }

    pub fn build_number(&self) -> Option<u64> {
        self.get("buildNumber")?.trim().parse().ok()
    }

    pub fn created_by_build_number(&self) -> Option<u64> {
        self.get("createdByBuildNumber")?.trim().parse().ok()
    }

    pub fn backup_attachments(&self) -> bool {
        self.get("backupAttachments")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }
}

/// Join continuation lines and drop blanks and comments. Leading
/// whitespace is stripped from every physical line.
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Option<String> = None;
    for raw in text.lines() {
        let line = raw.trim_start();
        let joined = match current.take() {
            Some(mut pending) => {
                pending.push_str(line);
                pending
            }
            None => {
                if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                    continue;
                }
                line.to_string()
            }
        };
        if ends_with_continuation(&joined) {
            let mut pending = joined;
            pending.pop();
            current = Some(pending);
        } else {
            lines.push(joined);
        }
    }
    lines.extend(current);
    lines
}

fn ends_with_continuation(line: &str) -> bool {
    line.bytes().rev().take_while(|b| *b == b'\\').count() % 2 == 1
}

/// Split at the first unescaped `=`, `:` or whitespace.
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
                    .strip_prefix(['=', ':'])
                    .map_or(rest, str::trim_start);
                return (&line[..i], rest);
            }
            _ => {}
        }
    }
    (line, "")
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
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
                let hex: String = chars.clone().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => {
                        out.push(decoded);
                        chars.nth(3);
                    }
                    _ => out.push_str("\\u"),
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

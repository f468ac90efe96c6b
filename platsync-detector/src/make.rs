//! Parser for ini-style build manifests (`project.make`).
//!
//! ```text
//! core = 7.x
//! ; comment
//! projects[acme][type] = profile
//! projects[acme][download][type] = git
//! projects[acme][download][url] = "git@example.com:acme.git"
//! libraries[] = ckeditor
//! ```
//!
//! Bracketed key segments nest; an empty segment (`[]`) appends the next
//! numeric key. Entries keep file order, which matters to callers that take
//! the first match.

use std::fmt;

/// A parsed value: a scalar string or a nested, ordered table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MakeValue {
    Scalar(String),
    Table(MakeTable),
}

impl MakeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MakeValue::Scalar(s) => Some(s),
            MakeValue::Table(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&MakeTable> {
        match self {
            MakeValue::Table(t) => Some(t),
            MakeValue::Scalar(_) => None,
        }
    }
}

/// Ordered key → value mapping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MakeTable {
    entries: Vec<(String, MakeValue)>,
}

impl MakeTable {
    pub fn get(&self, key: &str) -> Option<&MakeValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Follow a key path and return the scalar at its end, if any.
    pub fn get_str(&self, path: &[&str]) -> Option<&str> {
        let (last, parents) = path.split_last()?;
        let mut table = self;
        for key in parents {
            table = table.get(key)?.as_table()?;
        }
        table.get(last)?.as_str()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MakeValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn next_index(&self) -> String {
        self.entries
            .iter()
            .filter_map(|(k, _)| k.parse::<usize>().ok())
            .max()
            .map_or(0, |n| n + 1)
            .to_string()
    }

    fn insert(&mut self, path: &[String], value: String) -> Result<(), String> {
        let Some((head, rest)) = path.split_first() else {
            return Err("empty key".to_string());
        };
        let key = if head.is_empty() { self.next_index() } else { head.clone() };

        if rest.is_empty() {
            return match self.entries.iter_mut().find(|(k, _)| *k == key) {
                Some((_, MakeValue::Table(_))) => {
                    Err(format!("'{key}' is a section and cannot hold a value"))
                }
                Some((_, slot)) => {
                    *slot = MakeValue::Scalar(value);
                    Ok(())
                }
                None => {
                    self.entries.push((key, MakeValue::Scalar(value)));
                    Ok(())
                }
            };
        }

        let pos = match self.entries.iter().position(|(k, _)| *k == key) {
            Some(pos) => pos,
            None => {
                self.entries.push((key.clone(), MakeValue::Table(MakeTable::default())));
                self.entries.len() - 1
            }
        };
        match &mut self.entries[pos].1 {
            MakeValue::Table(child) => child.insert(rest, value),
            MakeValue::Scalar(_) => Err(format!("'{key}' is a value and cannot hold keys")),
        }
    }
}

/// A syntax error with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakeParseError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for MakeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for MakeParseError {}

/// Parse manifest text into an ordered table.
///
/// Blank lines, `;`/`#` comments and `[section]` headers are skipped. Any
/// other line must be `key = value`.
pub fn parse(raw: &str) -> Result<MakeTable, MakeParseError> {
    let mut root = MakeTable::default();
    for (idx, line) in raw.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty()
            || trimmed.starts_with(';')
            || trimmed.starts_with('#')
            || (trimmed.starts_with('[') && trimmed.ends_with(']'))
        {
            continue;
        }
        let err = |message: String| MakeParseError { line: line_no, message };

        let Some((raw_key, raw_value)) = trimmed.split_once('=') else {
            return Err(err(format!("expected 'key = value', found '{trimmed}'")));
        };
        let path = parse_key(raw_key.trim()).map_err(err)?;
        let value = parse_value(raw_value.trim()).map_err(err)?;
        root.insert(&path, value).map_err(err)?;
    }
    Ok(root)
}

fn parse_key(key: &str) -> Result<Vec<String>, String> {
    let (base, mut rest) = match key.find('[') {
        Some(i) => (&key[..i], &key[i..]),
        None => (key, ""),
    };
    let base = base.trim();
    if base.is_empty() {
        return Err(format!("missing key name in '{key}'"));
    }
    let mut path = vec![base.to_string()];
    while !rest.is_empty() {
        let Some(inner) = rest.strip_prefix('[') else {
            return Err(format!("unexpected '{rest}' in key '{key}'"));
        };
        let Some(end) = inner.find(']') else {
            return Err(format!("unclosed '[' in key '{key}'"));
        };
        let segment = &inner[..end];
        if segment.contains('[') {
            return Err(format!("nested '[' in key '{key}'"));
        }
        path.push(segment.trim().to_string());
        rest = &inner[end + 1..];
    }
    Ok(path)
}

fn parse_value(value: &str) -> Result<String, String> {
    for quote in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(quote) {
            return match inner.strip_suffix(quote) {
                Some(body) if quote == '"' => Ok(body.replace("\\\"", "\"")),
                Some(body) => Ok(body.to_string()),
                None => Err(format!("unterminated {quote} quote")),
            };
        }
    }
    Ok(value.to_string())
}

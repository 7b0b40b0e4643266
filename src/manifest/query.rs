//! Slash-separated field queries such as `/stemcells/0/version`.
//!
//! The syntax follows the `--path` flag of BOSH's `int` command:
//!
//! - `/name` looks up a mapping key
//! - `/0` indexes into a sequence
//! - `/alias=default` picks the first sequence element whose `alias` is `default`
//!
//! `~1` and `~0` escape `/` and `~` inside a segment.

use crate::error::{Result, UpdateError};
use serde_yaml::Value;
use std::fmt;
use std::str::FromStr;

/// Query used when none is given on the command line.
pub const DEFAULT_QUERY: &str = "/stemcells/0/version";

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
    Select { key: String, value: String },
}

/// A parsed field query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    /// The `/stemcells/0/version` query.
    pub fn stemcell_version() -> Self {
        Self {
            raw: DEFAULT_QUERY.to_string(),
            segments: vec![
                Segment::Key("stemcells".to_string()),
                Segment::Index(0),
                Segment::Key("version".to_string()),
            ],
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Rewrites `key=value` selectors into plain indices against `root`.
    ///
    /// The layout scanner only understands keys and indices, so selectors
    /// must be pinned to a concrete element first.
    pub fn resolve_selectors(&self, root: &Value) -> Result<Vec<Segment>> {
        let mut resolved = Vec::with_capacity(self.segments.len());
        let mut node = Some(root);

        for segment in &self.segments {
            let current = match node {
                Some(current) => current,
                None => {
                    resolved.push(segment.clone());
                    continue;
                }
            };

            match segment {
                Segment::Key(key) => {
                    node = current.as_mapping().and_then(|m| m.get(key.as_str()));
                    resolved.push(segment.clone());
                }
                Segment::Index(idx) => {
                    node = current.as_sequence().and_then(|s| s.get(*idx));
                    resolved.push(segment.clone());
                }
                Segment::Select { key, value } => {
                    let items = current.as_sequence().ok_or_else(|| {
                        UpdateError::schema(self, format!("'{}' is not applied to a sequence", segment))
                    })?;
                    let idx = items
                        .iter()
                        .position(|item| {
                            item.get(key.as_str())
                                .and_then(scalar_text)
                                .is_some_and(|v| v == *value)
                        })
                        .ok_or_else(|| {
                            UpdateError::schema(self, format!("no element matches '{}'", segment))
                        })?;
                    log::debug!("Selector '{}' resolved to index {}", segment, idx);
                    node = items.get(idx);
                    resolved.push(Segment::Index(idx));
                }
            }
        }

        Ok(resolved)
    }
}

/// Renders a scalar the way `bosh int --path` prints it.
///
/// Returns `None` for mappings and sequences.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

impl FromStr for FieldPath {
    type Err = UpdateError;

    fn from_str(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| UpdateError::InvalidQuery(raw.to_string(), reason.to_string());

        let body = raw
            .strip_prefix('/')
            .ok_or_else(|| invalid("must start with '/'"))?;
        if body.is_empty() {
            return Err(invalid("must name at least one field"));
        }

        let mut segments = Vec::new();
        for part in body.split('/') {
            if part.is_empty() {
                return Err(invalid("contains an empty segment"));
            }
            let part = unescape(part).map_err(|reason| invalid(reason))?;

            let segment = if part.bytes().all(|b| b.is_ascii_digit()) {
                let idx = part
                    .parse::<usize>()
                    .map_err(|_| invalid("index is out of range"))?;
                Segment::Index(idx)
            } else if let Some((key, value)) = part.split_once('=') {
                if key.is_empty() {
                    return Err(invalid("selector has no key"));
                }
                Segment::Select {
                    key: key.to_string(),
                    value: value.to_string(),
                }
            } else {
                Segment::Key(part)
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }
}

fn unescape(part: &str) -> std::result::Result<String, &'static str> {
    let mut out = String::with_capacity(part.len());
    let mut chars = part.chars();
    while let Some(ch) = chars.next() {
        if ch == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return Err("'~' must be followed by 0 or 1"),
            }
        } else {
            out.push(ch);
        }
    }
    Ok(out)
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "{}", key),
            Segment::Index(idx) => write!(f, "{}", idx),
            Segment::Select { key, value } => write!(f, "{}={}", key, value),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

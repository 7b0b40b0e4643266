//! A manifest held both as text and as a parsed YAML value.
//!
//! Reads go through the parsed value. Writes go through the text: the
//! target scalar is located by [`layout`](super::layout) and only its bytes
//! are replaced, so every other line survives untouched.

use super::layout::{self, ScalarStyle};
use super::query::{FieldPath, Segment, scalar_text};
use crate::diff;
use crate::error::{Result, UpdateError};
use serde_yaml::Value;

#[derive(Debug, Clone)]
pub struct ManifestDocument {
    source: String,
    root: Value,
}

impl ManifestDocument {
    /// Parses `source`, failing if it is not well-formed YAML.
    pub fn parse(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let root: Value = serde_yaml::from_str(&source)?;
        Ok(Self { source, root })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn into_string(self) -> String {
        self.source
    }

    /// Returns the value addressed by `query`.
    pub fn get(&self, query: &FieldPath) -> Result<&Value> {
        lookup(&self.root, query.segments(), query)
    }

    /// Returns the scalar addressed by `query` as printed by `bosh int`.
    pub fn get_scalar(&self, query: &FieldPath) -> Result<String> {
        scalar_text(self.get(query)?)
            .ok_or_else(|| UpdateError::schema(query, "value is not a scalar"))
    }

    /// Replaces the scalar addressed by `query` with `value`.
    ///
    /// Returns `false` when the field already holds `value`; the text is then
    /// left exactly as it was.
    pub fn set(&mut self, query: &FieldPath, value: &str) -> Result<bool> {
        let current = self.get_scalar(query)?;
        if current == value {
            log::debug!("'{}' already holds '{}'", query, value);
            return Ok(false);
        }

        let segments = query.resolve_selectors(&self.root)?;
        let span = layout::locate(&self.source, &segments, query)?;
        let rendered = render_scalar(value, span.style);
        log::debug!(
            "Replacing '{}' with '{}' on line {}",
            &self.source[span.start..span.end],
            rendered,
            span.line + 1
        );

        let mut updated = String::with_capacity(self.source.len() + rendered.len());
        updated.push_str(&self.source[..span.start]);
        updated.push_str(&rendered);
        updated.push_str(&self.source[span.end..]);

        let touched = diff::changed_line_count(&diff::line_changes(&self.source, &updated));
        if touched != 2 {
            return Err(UpdateError::unsupported(
                query,
                format!("edit would change {} lines instead of one", touched / 2),
            ));
        }

        let root: Value = serde_yaml::from_str(&updated)?;
        let readback = lookup(&root, &segments, query)?;
        if scalar_text(readback).as_deref() != Some(value) {
            return Err(UpdateError::unsupported(
                query,
                format!("'{}' would not read back unchanged", value),
            ));
        }

        self.source = updated;
        self.root = root;
        Ok(true)
    }
}

fn lookup<'a>(root: &'a Value, segments: &[Segment], query: &FieldPath) -> Result<&'a Value> {
    let mut node = root;

    for segment in segments {
        node = untag(node);
        node = match (segment, node) {
            (Segment::Key(key), Value::Mapping(map)) => map
                .get(key.as_str())
                .ok_or_else(|| UpdateError::schema(query, format!("missing key '{}'", key)))?,
            (Segment::Index(idx), Value::Sequence(items)) => {
                items.get(*idx).ok_or_else(|| {
                    let reason = if items.is_empty() {
                        "sequence is empty".to_string()
                    } else {
                        format!(
                            "index {} out of range (sequence has {} elements)",
                            idx,
                            items.len()
                        )
                    };
                    UpdateError::schema(query, reason)
                })?
            }
            (Segment::Select { key, value }, Value::Sequence(items)) => items
                .iter()
                .find(|item| {
                    item.get(key.as_str())
                        .and_then(scalar_text)
                        .is_some_and(|v| v == *value)
                })
                .ok_or_else(|| {
                    UpdateError::schema(query, format!("no element matches '{}'", segment))
                })?,
            (segment, other) => {
                return Err(UpdateError::schema(
                    query,
                    format!("expected a {} at '{}', found {}", container_for(segment), segment, kind(other)),
                ));
            }
        };
    }

    Ok(untag(node))
}

fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

fn container_for(segment: &Segment) -> &'static str {
    match segment {
        Segment::Key(_) => "mapping",
        Segment::Index(_) | Segment::Select { .. } => "sequence",
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Writes `value` in the quoting style of the scalar it replaces.
fn render_scalar(value: &str, style: ScalarStyle) -> String {
    match style {
        ScalarStyle::DoubleQuoted => double_quoted(value),
        ScalarStyle::SingleQuoted => single_quoted(value),
        ScalarStyle::Plain if reads_back_plain(value) => value.to_string(),
        ScalarStyle::Plain => single_quoted(value),
        ScalarStyle::Empty if reads_back_plain(value) => format!(" {}", value),
        ScalarStyle::Empty => format!(" {}", single_quoted(value)),
    }
}

fn single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// True if `value` written without quotes parses back to the same text.
fn reads_back_plain(value: &str) -> bool {
    let Some(first) = value.chars().next() else {
        return false;
    };
    if value.trim() != value || value.contains(": ") || value.contains(" #") || value.ends_with(':') {
        return false;
    }
    if ",[]{}#&*!|>'\"%@`".contains(first) {
        return false;
    }
    if "-?:".contains(first) && value.chars().nth(1).is_none_or(char::is_whitespace) {
        return false;
    }
    if resolves_differently_in_yaml11(value) {
        return false;
    }

    match serde_yaml::from_str::<Value>(value) {
        Ok(Value::String(parsed)) => parsed == value,
        Ok(Value::Number(parsed)) => parsed.to_string() == value,
        _ => false,
    }
}

/// BOSH reads manifests with YAML 1.1 rules, which turn more plain words
/// into booleans, nulls and numbers than serde_yaml does.
fn resolves_differently_in_yaml11(value: &str) -> bool {
    const WORDS: [&str; 12] = [
        "y", "n", "yes", "no", "on", "off", "true", "false", "null", "~", "=", "<<",
    ];
    if WORDS.iter().any(|word| value.eq_ignore_ascii_case(word)) {
        return true;
    }

    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    if let Some(binary) = digits.strip_prefix("0b") {
        return !binary.is_empty() && binary.chars().all(|c| matches!(c, '0' | '1' | '_'));
    }
    // Leading-zero octals such as 0755
    if digits.len() > 1 && digits.starts_with('0') && digits.bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }
    // Digit separators and base 60 (1_000, 1:30)
    if digits.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && digits.contains(['_', ':'])
        && digits.chars().all(|c| c.is_ascii_digit() || matches!(c, '_' | ':' | '.'))
    {
        return true;
    }
    false
}

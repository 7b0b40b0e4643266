//! Line scanner for block-style YAML.
//!
//! Finds the exact byte span a scalar occupies in the source text so the
//! value can be swapped without re-serializing the document. Only the
//! block layout BOSH manifests use is understood: mappings written one key
//! per line and sequences written one `- ` item per line. Anything else on
//! the way to the target is reported as [`UpdateError::UnsupportedLayout`].

use super::query::{FieldPath, Segment};
use crate::error::{Result, UpdateError};

/// How the located scalar is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    /// Key or dash with nothing after it.
    Empty,
}

/// Byte range of a scalar inside the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarSpan {
    /// Zero-based line number.
    pub line: usize,
    pub start: usize,
    pub end: usize,
    pub style: ScalarStyle,
}

/// A significant line, or the part of one that follows a `- ` indicator.
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    number: usize,
    /// Byte offset of `text` in the source.
    offset: usize,
    /// Column of the first character of `text`.
    indent: usize,
    /// Content without indentation or line terminator.
    text: &'a str,
}

enum Node<'a> {
    /// Value written on the same line as its key or dash.
    Inline { line: Line<'a>, continued: bool },
    /// Nothing after the key or dash, and nothing nested below it.
    Empty { line: usize, at: usize },
    /// Nested lines forming a mapping or a sequence.
    Block(Vec<Line<'a>>),
}

/// Locates the scalar addressed by `segments`.
///
/// `segments` must already be free of selectors (see
/// [`FieldPath::resolve_selectors`]); `query` is only used in errors.
pub fn locate(source: &str, segments: &[Segment], query: &FieldPath) -> Result<ScalarSpan> {
    let lines = significant_lines(source);
    if lines.is_empty() {
        return Err(UpdateError::schema(query, "document is empty"));
    }

    let mut node = Node::Block(lines);
    for segment in segments {
        node = match node {
            Node::Block(lines) => match segment {
                Segment::Key(key) => mapping_entry(&lines, key, query)?,
                Segment::Index(idx) => sequence_item(&lines, *idx, query)?,
                Segment::Select { .. } => {
                    return Err(UpdateError::unsupported(
                        query,
                        format!("selector '{}' was not resolved", segment),
                    ));
                }
            },
            Node::Inline { line, .. } => return Err(inline_dead_end(line, segment, query)),
            Node::Empty { .. } => {
                return Err(UpdateError::schema(
                    query,
                    format!("value before '{}' is empty", segment),
                ));
            }
        };
    }

    match node {
        Node::Inline { line, continued } => scalar_span(line, continued, query),
        Node::Empty { line, at } => Ok(ScalarSpan {
            line,
            start: at,
            end: at,
            style: ScalarStyle::Empty,
        }),
        Node::Block(_) => Err(UpdateError::schema(query, "value is not a scalar")),
    }
}

fn significant_lines(source: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut offset = 0;

    for (number, raw) in source.split_inclusive('\n').enumerate() {
        let start = offset;
        offset += raw.len();

        let content = raw.strip_suffix('\n').unwrap_or(raw);
        let content = content.strip_suffix('\r').unwrap_or(content);
        let (bom, content) = match content.strip_prefix('\u{feff}') {
            Some(rest) if number == 0 => ('\u{feff}'.len_utf8(), rest),
            _ => (0, content),
        };
        let indent = content.len() - content.trim_start_matches(' ').len();
        let text = &content[indent..];

        if text.trim().is_empty() || text.starts_with('#') {
            continue;
        }
        if indent == 0 && (is_document_marker(text) || text.starts_with('%')) {
            continue;
        }

        lines.push(Line {
            number,
            offset: start + bom + indent,
            indent,
            text,
        });
    }

    lines
}

fn is_document_marker(text: &str) -> bool {
    ["---", "..."].iter().any(|marker| {
        text == *marker || text.strip_prefix(marker).is_some_and(|rest| rest.starts_with(' '))
    })
}

fn is_item(text: &str) -> bool {
    text == "-" || text.starts_with("- ") || text.starts_with("-\t")
}

fn is_blank_value(rest: &str) -> bool {
    rest.trim().is_empty() || rest.starts_with('#')
}

/// Finds `key` among the entries at the indentation of `lines[0]`.
fn mapping_entry<'a>(lines: &[Line<'a>], key: &str, query: &FieldPath) -> Result<Node<'a>> {
    let first = lines[0];
    if is_item(first.text) {
        return Err(UpdateError::schema(
            query,
            format!("expected a mapping containing '{}', found a sequence", key),
        ));
    }
    if split_entry(first.text).is_none() {
        return Err(UpdateError::unsupported(
            query,
            format!("line {} is not a block mapping entry", first.number + 1),
        ));
    }

    let indent = first.indent;
    for (idx, line) in lines.iter().enumerate() {
        if line.indent != indent {
            continue;
        }
        let Some(entry) = split_entry(line.text) else {
            continue;
        };
        if entry.key != key {
            continue;
        }

        // Compact sequences may sit at the key's own indentation.
        let children: Vec<Line<'a>> = lines[idx + 1..]
            .iter()
            .take_while(|l| l.indent > indent || (l.indent == indent && is_item(l.text)))
            .copied()
            .collect();

        let rest = &line.text[entry.value..];
        log::debug!("Found key '{}' on line {}", key, line.number + 1);

        return Ok(if is_blank_value(rest) {
            if children.is_empty() {
                Node::Empty {
                    line: line.number,
                    at: line.offset + entry.colon + 1,
                }
            } else {
                Node::Block(children)
            }
        } else {
            Node::Inline {
                line: Line {
                    number: line.number,
                    offset: line.offset + entry.value,
                    indent: line.indent + entry.value,
                    text: rest,
                },
                continued: !children.is_empty(),
            }
        });
    }

    Err(UpdateError::schema(query, format!("missing key '{}'", key)))
}

/// Picks the `idx`-th `- ` item among the lines at the indentation of `lines[0]`.
fn sequence_item<'a>(lines: &[Line<'a>], idx: usize, query: &FieldPath) -> Result<Node<'a>> {
    let first = lines[0];
    if !is_item(first.text) {
        return Err(UpdateError::schema(
            query,
            format!("expected a sequence for index {}, found a mapping", idx),
        ));
    }

    let indent = first.indent;
    let starts: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.indent == indent && is_item(l.text))
        .map(|(i, _)| i)
        .collect();

    let Some(&start) = starts.get(idx) else {
        return Err(UpdateError::schema(
            query,
            format!(
                "index {} out of range (sequence has {} elements)",
                idx,
                starts.len()
            ),
        ));
    };
    let end = starts.get(idx + 1).copied().unwrap_or(lines.len());

    let item = lines[start];
    let after_dash = &item.text[1..];
    let gap = after_dash.len() - after_dash.trim_start_matches([' ', '\t']).len();
    let content = &after_dash[gap..];
    let children = &lines[start + 1..end];

    if is_blank_value(content) {
        return Ok(if children.is_empty() {
            Node::Empty {
                line: item.number,
                at: item.offset + 1,
            }
        } else {
            Node::Block(children.to_vec())
        });
    }

    let inline = Line {
        number: item.number,
        offset: item.offset + 1 + gap,
        indent: item.indent + 1 + gap,
        text: content,
    };

    if split_entry(content).is_some() || is_item(content) {
        let mut block = Vec::with_capacity(children.len() + 1);
        block.push(inline);
        block.extend_from_slice(children);
        Ok(Node::Block(block))
    } else {
        Ok(Node::Inline {
            line: inline,
            continued: !children.is_empty(),
        })
    }
}

fn inline_dead_end(line: Line<'_>, segment: &Segment, query: &FieldPath) -> UpdateError {
    match line.text.chars().next() {
        Some('[' | '{') => UpdateError::unsupported(
            query,
            format!("flow collection on line {}", line.number + 1),
        ),
        Some('&' | '*' | '!') => UpdateError::unsupported(
            query,
            format!("anchor, alias or tag on line {}", line.number + 1),
        ),
        _ => UpdateError::schema(
            query,
            format!("found a scalar where '{}' was expected", segment),
        ),
    }
}

fn scalar_span(line: Line<'_>, continued: bool, query: &FieldPath) -> Result<ScalarSpan> {
    let text = line.text;
    let unsupported = |what: &str| {
        UpdateError::unsupported(query, format!("{} on line {}", what, line.number + 1))
    };

    if continued {
        return Err(unsupported("multi-line scalar"));
    }

    let (len, style) = match text.as_bytes()[0] {
        b'"' => {
            let close = closing_double_quote(text).ok_or_else(|| unsupported("multi-line quoted scalar"))?;
            (close + 1, ScalarStyle::DoubleQuoted)
        }
        b'\'' => {
            let close = closing_single_quote(text).ok_or_else(|| unsupported("multi-line quoted scalar"))?;
            (close + 1, ScalarStyle::SingleQuoted)
        }
        b'|' | b'>' => return Err(unsupported("block scalar")),
        b'[' | b'{' => return Err(unsupported("flow collection")),
        b'&' | b'*' | b'!' => return Err(unsupported("anchor, alias or tag")),
        _ => (plain_scalar_len(text), ScalarStyle::Plain),
    };

    if !is_blank_value(text[len..].trim_start()) {
        return Err(unsupported("trailing content after quoted scalar"));
    }

    Ok(ScalarSpan {
        line: line.number,
        start: line.offset,
        end: line.offset + len,
        style,
    })
}

/// Length of a plain scalar, excluding any trailing comment and whitespace.
fn plain_scalar_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut end = text.len();
    for i in 1..bytes.len() {
        if bytes[i] == b'#' && matches!(bytes[i - 1], b' ' | b'\t') {
            end = i;
            break;
        }
    }
    text[..end].trim_end().len()
}

fn closing_double_quote(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn closing_single_quote(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }
    None
}

struct Entry {
    key: String,
    /// Byte index of the `:` indicator.
    colon: usize,
    /// Byte index where the value (or comment) starts.
    value: usize,
}

/// Splits `key: value` into its parts. Returns `None` for anything that is
/// not a block mapping entry.
fn split_entry(text: &str) -> Option<Entry> {
    let bytes = text.as_bytes();

    let (key, after_key) = match bytes.first()? {
        b'"' => {
            let close = closing_double_quote(text)?;
            let key: String = serde_yaml::from_str(&text[..=close]).ok()?;
            (key, close + 1)
        }
        b'\'' => {
            let close = closing_single_quote(text)?;
            (text[1..close].replace("''", "'"), close + 1)
        }
        b'-' if is_item(text) => return None,
        b'#' | b'[' | b'{' | b'?' | b'|' | b'>' | b'&' | b'*' | b'!' => return None,
        _ => {
            let colon = (0..bytes.len()).find(|&i| {
                bytes[i] == b':' && matches!(bytes.get(i + 1), None | Some(b' ' | b'\t'))
            })?;
            let comment = (1..colon)
                .any(|i| bytes[i] == b'#' && matches!(bytes[i - 1], b' ' | b'\t'));
            if comment {
                return None;
            }
            let key = text[..colon].trim_end();
            if key.is_empty() {
                return None;
            }
            (key.to_string(), colon)
        }
    };

    let spaces = text[after_key..].len() - text[after_key..].trim_start_matches([' ', '\t']).len();
    let colon = after_key + spaces;
    if bytes.get(colon) != Some(&b':') || !matches!(bytes.get(colon + 1), None | Some(b' ' | b'\t')) {
        return None;
    }

    let rest = &text[colon + 1..];
    let value = colon + 1 + (rest.len() - rest.trim_start_matches([' ', '\t']).len());

    Some(Entry { key, colon, value })
}

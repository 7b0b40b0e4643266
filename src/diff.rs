//! Zero-context line diffs.
//!
//! Used to prove an edit touched a single line and to preview edits in
//! `--dry-run` mode. Output mirrors `diff -U 0`.

/// Above this many LCS cells the changed region is reported as one hunk.
const MAX_TABLE_CELLS: usize = 4_000_000;

/// A run of removed and/or added lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// 1-based line in the old text where the hunk starts.
    pub old_start: usize,
    pub removed: Vec<String>,
    /// 1-based line in the new text where the hunk starts.
    pub new_start: usize,
    pub added: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Equal,
    Delete,
    Insert,
}

/// Computes the hunks that turn `before` into `after`.
///
/// Lines are compared including their terminators, so a switch from `\n` to
/// `\r\n` counts as a change.
pub fn line_changes(before: &str, after: &str) -> Vec<Hunk> {
    let old: Vec<&str> = before.split_inclusive('\n').collect();
    let new: Vec<&str> = after.split_inclusive('\n').collect();

    let prefix = old.iter().zip(&new).take_while(|(a, b)| a == b).count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let old_mid = &old[prefix..old.len() - suffix];
    let new_mid = &new[prefix..new.len() - suffix];
    if old_mid.is_empty() && new_mid.is_empty() {
        return Vec::new();
    }

    let ops = if old_mid.len().saturating_mul(new_mid.len()) > MAX_TABLE_CELLS {
        log::debug!(
            "Diff region too large ({}x{} lines), reporting a single hunk",
            old_mid.len(),
            new_mid.len()
        );
        let mut ops = vec![Op::Delete; old_mid.len()];
        ops.extend(std::iter::repeat_n(Op::Insert, new_mid.len()));
        ops
    } else {
        lcs_ops(old_mid, new_mid)
    };

    collect_hunks(&ops, old_mid, new_mid, prefix)
}

/// Number of removed plus added lines.
pub fn changed_line_count(hunks: &[Hunk]) -> usize {
    hunks.iter().map(|h| h.removed.len() + h.added.len()).sum()
}

/// Renders hunks in `diff -U 0` format.
pub fn render(hunks: &[Hunk], old_label: &str, new_label: &str) -> String {
    let mut out = String::new();
    if hunks.is_empty() {
        return out;
    }

    out.push_str(&format!("--- {}\n+++ {}\n", old_label, new_label));
    for hunk in hunks {
        out.push_str(&format!(
            "@@ -{} +{} @@\n",
            range(hunk.old_start, hunk.removed.len()),
            range(hunk.new_start, hunk.added.len())
        ));
        for line in &hunk.removed {
            out.push_str(&format!("-{}\n", line));
        }
        for line in &hunk.added {
            out.push_str(&format!("+{}\n", line));
        }
    }
    out
}

fn range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{},0", start.saturating_sub(1)),
        1 => start.to_string(),
        _ => format!("{},{}", start, len),
    }
}

fn lcs_ops(old: &[&str], new: &[&str]) -> Vec<Op> {
    let (n, m) = (old.len(), new.len());
    let width = m + 1;

    // table[i * width + j]: LCS length of old[i..] and new[j..]
    let mut table = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i * width + j] = if old[i] == new[j] {
                table[(i + 1) * width + j + 1] + 1
            } else {
                table[(i + 1) * width + j].max(table[i * width + j + 1])
            };
        }
    }

    let mut ops = Vec::with_capacity(n + m);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            ops.push(Op::Equal);
            i += 1;
            j += 1;
        } else if table[(i + 1) * width + j] >= table[i * width + j + 1] {
            ops.push(Op::Delete);
            i += 1;
        } else {
            ops.push(Op::Insert);
            j += 1;
        }
    }
    ops.extend(std::iter::repeat_n(Op::Delete, n - i));
    ops.extend(std::iter::repeat_n(Op::Insert, m - j));
    ops
}

fn collect_hunks(ops: &[Op], old: &[&str], new: &[&str], offset: usize) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    let mut current: Option<Hunk> = None;
    let (mut oi, mut ni) = (0, 0);

    for op in ops {
        match op {
            Op::Equal => {
                hunks.extend(current.take());
                oi += 1;
                ni += 1;
            }
            Op::Delete | Op::Insert => {
                let hunk = current.get_or_insert_with(|| Hunk {
                    old_start: offset + oi + 1,
                    removed: Vec::new(),
                    new_start: offset + ni + 1,
                    added: Vec::new(),
                });
                if *op == Op::Delete {
                    hunk.removed.push(strip_terminator(old[oi]).to_string());
                    oi += 1;
                } else {
                    hunk.added.push(strip_terminator(new[ni]).to_string());
                    ni += 1;
                }
            }
        }
    }
    hunks.extend(current);
    hunks
}

fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_texts_have_no_hunks() {
        assert!(line_changes("a\nb\n", "a\nb\n").is_empty());
    }

    #[test]
    fn test_single_line_change() {
        let hunks = line_changes("a\nversion: 1\nc\n", "a\nversion: 2\nc\n");
        assert_eq!(
            hunks,
            vec![Hunk {
                old_start: 2,
                removed: vec!["version: 1".into()],
                new_start: 2,
                added: vec!["version: 2".into()],
            }]
        );
        assert_eq!(changed_line_count(&hunks), 2);
    }

    #[test]
    fn test_separate_hunks() {
        let hunks = line_changes("a\nb\nc\nd\n", "A\nb\nc\nD\n");
        assert_eq!(hunks.len(), 2);
        assert_eq!(changed_line_count(&hunks), 4);
    }

    #[test]
    fn test_insertion_and_deletion() {
        let hunks = line_changes("a\nc\n", "a\nb\nc\n");
        assert_eq!(hunks.len(), 1);
        assert!(hunks[0].removed.is_empty());
        assert_eq!(hunks[0].added, vec!["b".to_string()]);

        let hunks = line_changes("a\nb\nc\n", "a\nc\n");
        assert_eq!(hunks[0].removed, vec!["b".to_string()]);
    }

    #[test]
    fn test_line_ending_change_counts() {
        let hunks = line_changes("a\nb\n", "a\r\nb\n");
        assert_eq!(changed_line_count(&hunks), 2);
    }

    #[test]
    fn test_missing_trailing_newline_counts() {
        let hunks = line_changes("a\nb\n", "a\nb");
        assert_eq!(changed_line_count(&hunks), 2);
    }

    #[test]
    fn test_render_matches_unified_zero() {
        let hunks = line_changes("a\nversion: 1\nc\n", "a\nversion: 2\nc\n");
        assert_eq!(
            render(&hunks, "before", "after"),
            "--- before\n+++ after\n@@ -2 +2 @@\n-version: 1\n+version: 2\n"
        );
    }

    #[test]
    fn test_render_insertion_range() {
        let hunks = line_changes("a\nc\n", "a\nb\nc\n");
        assert!(render(&hunks, "x", "y").contains("@@ -1,0 +2 @@"));
    }
}

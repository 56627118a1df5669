//! Line diff between the buffer snapshot and the formatter output

use similar::{ChangeTag, DiffTag, TextDiff};
use std::fmt::Write;

pub const ORIGINAL_LABEL: &str = "Original";
pub const FIXED_LABEL: &str = "Fixed";

const CONTEXT_RADIUS: usize = 3;

pub struct DiffEngine;

impl DiffEngine {
    /// Unified diff of `original` against `fixed`, or `None` when the line
    /// sequences are identical. `None` is the authoritative no-op signal.
    pub fn diff(original: &str, fixed: &str) -> Option<String> {
        let old_lines = split_lines(original);
        let new_lines = split_lines(fixed);
        let diff = TextDiff::from_slices(&old_lines[..], &new_lines[..]);

        if diff.ops().iter().all(|op| op.tag() == DiffTag::Equal) {
            return None;
        }

        let mut out = String::new();
        let _ = writeln!(out, "--- {ORIGINAL_LABEL}");
        let _ = write!(out, "+++ {FIXED_LABEL}");
        for hunk in diff.unified_diff().context_radius(CONTEXT_RADIUS).iter_hunks() {
            let _ = write!(out, "\n{}", hunk.header());
            for change in hunk.iter_changes() {
                let sign = match change.tag() {
                    ChangeTag::Delete => '-',
                    ChangeTag::Insert => '+',
                    ChangeTag::Equal => ' ',
                };
                let _ = write!(out, "\n{sign}{}", change.value());
            }
        }
        Some(out)
    }
}

/// Split on universal newline boundaries, dropping the terminators.
///
/// A trailing terminator does not produce an empty last line, so texts that
/// differ only in a final newline compare equal.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        let is_break = matches!(
            ch,
            '\n' | '\r'
                | '\u{0b}'
                | '\u{0c}'
                | '\u{1c}'
                | '\u{1d}'
                | '\u{1e}'
                | '\u{85}'
                | '\u{2028}'
                | '\u{2029}'
        );
        if !is_break {
            continue;
        }
        lines.push(&text[start..idx]);
        let mut end = idx + ch.len_utf8();
        if ch == '\r' {
            if let Some(&(next_idx, '\n')) = chars.peek() {
                chars.next();
                end = next_idx + 1;
            }
        }
        start = end;
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

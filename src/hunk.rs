//! Line-level hunk calculation between two whole-document snapshots.
//!
//! A line diff is walked and contiguous non-equal runs are buffered into a
//! hunk, flushed on the next `Equal` line. The line arrays are aligned via
//! this crate's own [`crate::lcs::lcs_pairs`] so the same tie-break
//! contract applies uniformly across every diff in the crate.

use serde::{Deserialize, Serialize};

use crate::lcs::lcs_pairs;
use crate::token::split_lines;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HunkType {
    Add,
    Delete,
    Modify,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    #[serde(rename = "type")]
    pub hunk_type: HunkType,
    pub base_start_line: usize,
    pub base_end_line: usize,
    pub modified_start_line: usize,
    pub modified_end_line: usize,
    pub base_lines: Vec<String>,
    pub modified_lines: Vec<String>,
}

enum LineOp {
    Equal,
    Delete(String),
    Add(String),
}

/// Walk the line-level LCS alignment of `base` and `modified`, producing
/// one [`LineOp`] per base line and per unmatched modified line, in
/// document order.
fn line_ops(base_lines: &[String], modified_lines: &[String]) -> Vec<LineOp> {
    let pairs = lcs_pairs(base_lines, modified_lines);
    let mut ops = Vec::new();
    let (mut bi, mut mi) = (0usize, 0usize);

    for (pb, pm) in pairs {
        while bi < pb {
            ops.push(LineOp::Delete(base_lines[bi].clone()));
            bi += 1;
        }
        while mi < pm {
            ops.push(LineOp::Add(modified_lines[mi].clone()));
            mi += 1;
        }
        ops.push(LineOp::Equal);
        bi += 1;
        mi += 1;
    }
    while bi < base_lines.len() {
        ops.push(LineOp::Delete(base_lines[bi].clone()));
        bi += 1;
    }
    while mi < modified_lines.len() {
        ops.push(LineOp::Add(modified_lines[mi].clone()));
        mi += 1;
    }

    ops
}

/// Compute the contiguous line-level hunks between `base_text` and
/// `modified_text`.
///
/// Identical inputs yield the empty list. A single changed line yields
/// exactly one hunk. Non-adjacent changes yield separate hunks; runs of
/// consecutive modified lines merge into one hunk.
pub fn calculate_hunks(base_text: &str, modified_text: &str) -> Vec<Hunk> {
    let base_lines = split_lines(base_text);
    let modified_lines = split_lines(modified_text);
    let ops = line_ops(&base_lines, &modified_lines);

    let mut hunks = Vec::new();
    let mut base_idx = 0usize;
    let mut modified_idx = 0usize;

    let mut pending_base: Vec<String> = Vec::new();
    let mut pending_modified: Vec<String> = Vec::new();
    let mut hunk_base_start = 0usize;
    let mut hunk_modified_start = 0usize;
    let mut in_hunk = false;

    macro_rules! flush {
        () => {
            if in_hunk {
                hunks.push(finalize_hunk(
                    std::mem::take(&mut pending_base),
                    std::mem::take(&mut pending_modified),
                    hunk_base_start,
                    base_idx,
                    hunk_modified_start,
                    modified_idx,
                ));
                in_hunk = false;
            }
        };
    }

    for op in ops {
        match op {
            LineOp::Equal => {
                flush!();
                base_idx += 1;
                modified_idx += 1;
            }
            LineOp::Delete(line) => {
                if !in_hunk {
                    in_hunk = true;
                    hunk_base_start = base_idx;
                    hunk_modified_start = modified_idx;
                }
                pending_base.push(line);
                base_idx += 1;
            }
            LineOp::Add(line) => {
                if !in_hunk {
                    in_hunk = true;
                    hunk_base_start = base_idx;
                    hunk_modified_start = modified_idx;
                }
                pending_modified.push(line);
                modified_idx += 1;
            }
        }
    }
    flush!();

    hunks
}

fn finalize_hunk(
    base_lines: Vec<String>,
    modified_lines: Vec<String>,
    base_start: usize,
    base_end: usize,
    modified_start: usize,
    modified_end: usize,
) -> Hunk {
    let hunk_type = match (base_lines.is_empty(), modified_lines.is_empty()) {
        (false, false) => HunkType::Modify,
        (false, true) => HunkType::Delete,
        (true, false) => HunkType::Add,
        (true, true) => unreachable!("a flushed hunk always has at least one side non-empty"),
    };

    Hunk {
        hunk_type,
        base_start_line: base_start,
        base_end_line: base_end,
        modified_start_line: modified_start,
        modified_end_line: modified_end,
        base_lines,
        modified_lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs_yield_no_hunks() {
        let text = "line 1\nline 2\nline 3";
        assert!(calculate_hunks(text, text).is_empty());
    }

    #[test]
    fn single_changed_line_yields_one_hunk() {
        let base = "line 1\nline 2\nline 3";
        let modified = "line 1\nCHANGED\nline 3";
        let hunks = calculate_hunks(base, modified);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].hunk_type, HunkType::Modify);
        assert_eq!(hunks[0].base_start_line, 1);
        assert_eq!(hunks[0].base_end_line, 2);
    }

    #[test]
    fn non_adjacent_changes_yield_separate_hunks() {
        let base = "line 1\nline 2\nline 3\nline 4\nline 5";
        let modified = "changed 1\nline 2\nline 3\nline 4\nchanged 5";
        let hunks = calculate_hunks(base, modified);
        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[0].hunk_type, HunkType::Modify);
        assert_eq!(hunks[0].base_start_line, 0);
        assert_eq!(hunks[1].hunk_type, HunkType::Modify);
        assert_eq!(hunks[1].base_start_line, 4);
    }

    #[test]
    fn consecutive_modified_lines_merge_into_one_hunk() {
        let base = "A\nB changed\nC changed\nD";
        let modified = "A\nB fixed\nC fixed\nD";
        let hunks = calculate_hunks(base, modified);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].base_lines, vec!["B changed", "C changed"]);
        assert_eq!(hunks[0].modified_lines, vec!["B fixed", "C fixed"]);
    }

    #[test]
    fn pure_addition_has_no_base_lines() {
        let base = "A\nB";
        let modified = "A\nINSERTED\nB";
        let hunks = calculate_hunks(base, modified);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].hunk_type, HunkType::Add);
        assert!(hunks[0].base_lines.is_empty());
        assert_eq!(hunks[0].modified_lines, vec!["INSERTED"]);
    }

    #[test]
    fn pure_deletion_has_no_modified_lines() {
        let base = "A\nREMOVED\nB";
        let modified = "A\nB";
        let hunks = calculate_hunks(base, modified);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].hunk_type, HunkType::Delete);
        assert!(hunks[0].modified_lines.is_empty());
        assert_eq!(hunks[0].base_lines, vec!["REMOVED"]);
    }
}

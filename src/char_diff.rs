//! Word-level character diff: add/delete/equal op sequences used for
//! inline previews and patch rendering.

use serde::{Deserialize, Serialize};

use crate::lcs::lcs_pairs;
use crate::token::tokenize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Equal,
    Add,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOp {
    pub kind: DiffKind,
    pub text: String,
}

/// A half-open `[from, to)` range into the new-side text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionRange {
    pub from: usize,
    pub to: usize,
}

/// A deletion anchored at `pos`, the insertion point in the new-side text
/// where the deleted text used to sit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionMark {
    pub text: String,
    pub pos: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffRanges {
    pub additions: Vec<AdditionRange>,
    pub deletions: Vec<DeletionMark>,
}

/// Compute a word-level diff between `old` and `new`.
///
/// Fast paths handle identical text and either side being empty; otherwise
/// both sides are tokenized (see [`crate::token::tokenize`]), aligned via
/// [`lcs_pairs`], and walked in parallel to produce add/delete/equal ops.
/// Adjacent ops of the same kind are always merged, so the returned
/// sequence never has two consecutive ops of the same kind.
pub fn calculate_char_diff(old: &str, new: &str) -> Vec<DiffOp> {
    if old == new {
        if old.is_empty() {
            return Vec::new();
        }
        return vec![DiffOp {
            kind: DiffKind::Equal,
            text: old.to_string(),
        }];
    }
    if old.is_empty() {
        return vec![DiffOp {
            kind: DiffKind::Add,
            text: new.to_string(),
        }];
    }
    if new.is_empty() {
        return vec![DiffOp {
            kind: DiffKind::Delete,
            text: old.to_string(),
        }];
    }

    let old_tokens = tokenize(old);
    let new_tokens = tokenize(new);
    let pairs = lcs_pairs(&old_tokens, &new_tokens);

    let mut raw_ops = Vec::new();
    let (mut oi, mut ni) = (0usize, 0usize);

    for (pi, pj) in pairs {
        while oi < pi {
            raw_ops.push(DiffOp {
                kind: DiffKind::Delete,
                text: old_tokens[oi].text.clone(),
            });
            oi += 1;
        }
        while ni < pj {
            raw_ops.push(DiffOp {
                kind: DiffKind::Add,
                text: new_tokens[ni].text.clone(),
            });
            ni += 1;
        }
        raw_ops.push(DiffOp {
            kind: DiffKind::Equal,
            text: old_tokens[oi].text.clone(),
        });
        oi += 1;
        ni += 1;
    }
    while oi < old_tokens.len() {
        raw_ops.push(DiffOp {
            kind: DiffKind::Delete,
            text: old_tokens[oi].text.clone(),
        });
        oi += 1;
    }
    while ni < new_tokens.len() {
        raw_ops.push(DiffOp {
            kind: DiffKind::Add,
            text: new_tokens[ni].text.clone(),
        });
        ni += 1;
    }

    merge_adjacent_ops(raw_ops)
}

fn merge_adjacent_ops(ops: Vec<DiffOp>) -> Vec<DiffOp> {
    let mut merged: Vec<DiffOp> = Vec::with_capacity(ops.len());
    for op in ops {
        if let Some(last) = merged.last_mut() {
            if last.kind == op.kind {
                last.text.push_str(&op.text);
                continue;
            }
        }
        merged.push(op);
    }
    merged
}

/// Convert a diff op sequence into additions/deletions suitable for
/// rendering over the new-side text.
///
/// Maintains a new-side cursor: `Equal` and `Add` advance it; each `Add`
/// records `{from: cursor_before, to: cursor_after}`; each `Delete`
/// records `{text, pos: cursor}` where `pos` is the insertion point in the
/// new side the deleted text used to occupy.
pub fn diff_to_ranges(diff: &[DiffOp]) -> DiffRanges {
    let mut ranges = DiffRanges::default();
    let mut cursor = 0usize;

    for op in diff {
        match op.kind {
            DiffKind::Equal => {
                cursor += op.text.encode_utf16().count();
            }
            DiffKind::Add => {
                let from = cursor;
                cursor += op.text.encode_utf16().count();
                ranges.additions.push(AdditionRange { from, to: cursor });
            }
            DiffKind::Delete => {
                ranges.deletions.push(DeletionMark {
                    text: op.text.clone(),
                    pos: cursor,
                });
            }
        }
    }

    ranges
}

/// Concatenate every op's text in order. Diagnostic only — not
/// authoritative for reconstructing either side.
pub fn build_inline_diff_text(diff: &[DiffOp]) -> String {
    diff.iter().map(|op| op.text.as_str()).collect()
}

//! Three-way merge: a silent token-level merge ([`merge_text`]) and a
//! conflict-marking line-level merge ([`merge_with_conflicts`]) plus the
//! conflict-marker parsing/resolution helpers that operate on its output.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::MergeError;
use crate::hunk::{calculate_hunks, Hunk};
use crate::lcs::lcs_pairs;
use crate::token::{split_lines, tokenize};

/// Six-box-drawing-character run used in every conflict marker line. This
/// exact run, preceded by `╔`/`╠`/`╚`, is the canonical delimiter and must
/// not appear as the literal first characters of user content.
const MARKER_DASHES: &str = "══════";

fn marker_open(label: &str) -> String {
    format!("╔{MARKER_DASHES} {label}")
}

fn marker_mid() -> String {
    format!("╠{MARKER_DASHES}")
}

fn marker_close(label: &str) -> String {
    format!("╚{MARKER_DASHES} {label}")
}

fn match_open(line: &str) -> Option<&str> {
    line.strip_prefix(&format!("╔{MARKER_DASHES} "))
}

fn is_mid(line: &str) -> bool {
    line == format!("╠{MARKER_DASHES}")
}

fn match_close(line: &str) -> Option<&str> {
    line.strip_prefix(&format!("╚{MARKER_DASHES} "))
}

fn is_open_prefix(line: &str) -> bool {
    line.starts_with(&format!("╔{MARKER_DASHES}"))
}

/// Three-way silent token merge: accepts the non-overlapping edits of both
/// `local` and `canonical` against `base`, never emitting conflict
/// markers. On overlap, both insertions are included and base tokens
/// removed by either side are dropped.
///
/// Canonical insertions are always emitted before local insertions at the
/// same position — a deterministic tie-break, not an accident.
pub fn merge_text(base: &str, local: &str, canonical: &str) -> String {
    if local == base && canonical == base {
        return base.to_string();
    }
    if local == base {
        return canonical.to_string();
    }
    if canonical == base {
        return local.to_string();
    }
    if local == canonical {
        return local.to_string();
    }

    let base_tokens = tokenize(base);
    let local_tokens = tokenize(local);
    let canon_tokens = tokenize(canonical);

    let local_pairs = lcs_pairs(&base_tokens, &local_tokens);
    let canon_pairs = lcs_pairs(&base_tokens, &canon_tokens);

    let base_to_local: HashMap<usize, usize> = local_pairs.into_iter().collect();
    let base_to_canon: HashMap<usize, usize> = canon_pairs.into_iter().collect();

    let mut out = String::new();
    let mut canon_cursor = 0usize;
    let mut local_cursor = 0usize;

    for base_idx in 0..base_tokens.len() {
        let canon_match = base_to_canon.get(&base_idx).copied();
        let local_match = base_to_local.get(&base_idx).copied();

        if let Some(ci) = canon_match {
            while canon_cursor < ci {
                out.push_str(&canon_tokens[canon_cursor].text);
                canon_cursor += 1;
            }
        }
        if let Some(li) = local_match {
            while local_cursor < li {
                out.push_str(&local_tokens[local_cursor].text);
                local_cursor += 1;
            }
        }

        match (local_match, canon_match) {
            (Some(li), Some(ci)) => {
                out.push_str(&base_tokens[base_idx].text);
                local_cursor = li + 1;
                canon_cursor = ci + 1;
            }
            (Some(li), None) => {
                // Canonical removed this base token: drop it.
                local_cursor = li + 1;
            }
            (None, Some(ci)) => {
                // Local removed this base token: drop it.
                canon_cursor = ci + 1;
            }
            (None, None) => {
                // Both removed it.
            }
        }
    }

    while canon_cursor < canon_tokens.len() {
        out.push_str(&canon_tokens[canon_cursor].text);
        canon_cursor += 1;
    }
    while local_cursor < local_tokens.len() {
        out.push_str(&local_tokens[local_cursor].text);
        local_cursor += 1;
    }

    out
}

/// Result of a conflict-marking three-way line merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictMergeResult {
    pub merged: String,
    pub has_conflicts: bool,
    pub conflict_count: usize,
}

/// A connected group of hunks from either side touching the same base
/// line range. Groups with hunks from only one side apply cleanly; groups
/// with hunks from both sides either coincide (same resulting content) or
/// become a conflict block.
struct HunkGroup<'a> {
    start: usize,
    end: usize,
    a_hunks: Vec<&'a Hunk>,
    b_hunks: Vec<&'a Hunk>,
}

/// Whether a hunk spanning `[a_start, a_end)` shares base-line territory
/// with one spanning `[b_start, b_end)`. Zero-width ranges (pure insert
/// points) only overlap another range when they sit exactly at the same
/// gap or strictly inside it — a plain interval-overlap test would treat
/// two merely-adjacent, non-overlapping edits as conflicting, which would
/// manufacture conflicts for edits to neighboring-but-distinct lines.
fn ranges_overlap(a_start: usize, a_end: usize, b_start: usize, b_end: usize) -> bool {
    match (a_start == a_end, b_start == b_end) {
        (true, true) => a_start == b_start,
        (true, false) => a_start > b_start && a_start < b_end,
        (false, true) => b_start > a_start && b_start < a_end,
        (false, false) => a_start < b_end && b_start < a_end,
    }
}

fn group_hunks<'a>(a_hunks: &'a [Hunk], b_hunks: &'a [Hunk]) -> Vec<HunkGroup<'a>> {
    let mut tagged: Vec<(bool, &Hunk)> = a_hunks
        .iter()
        .map(|h| (true, h))
        .chain(b_hunks.iter().map(|h| (false, h)))
        .collect();
    tagged.sort_by_key(|(_, h)| (h.base_start_line, h.base_end_line));

    let mut groups: Vec<HunkGroup> = Vec::new();
    for (is_a, hunk) in tagged {
        if let Some(last) = groups.last_mut() {
            if ranges_overlap(last.start, last.end, hunk.base_start_line, hunk.base_end_line) {
                last.end = last.end.max(hunk.base_end_line);
                if is_a {
                    last.a_hunks.push(hunk);
                } else {
                    last.b_hunks.push(hunk);
                }
                continue;
            }
        }
        let mut group = HunkGroup {
            start: hunk.base_start_line,
            end: hunk.base_end_line,
            a_hunks: Vec::new(),
            b_hunks: Vec::new(),
        };
        if is_a {
            group.a_hunks.push(hunk);
        } else {
            group.b_hunks.push(hunk);
        }
        groups.push(group);
    }

    groups
}

/// Replay `hunks` (all contained within `range`, sorted by start) over
/// `base_lines[range]`, producing the lines that side would actually
/// produce for that sub-range.
fn apply_hunks_to_range(base_lines: &[String], hunks: &[&Hunk], range: (usize, usize)) -> Vec<String> {
    let (range_start, range_end) = range;
    let mut out = Vec::new();
    let mut cursor = range_start;

    let mut sorted: Vec<&&Hunk> = hunks.iter().collect();
    sorted.sort_by_key(|h| h.base_start_line);

    for hunk in sorted {
        out.extend(base_lines[cursor..hunk.base_start_line].iter().cloned());
        out.extend(hunk.modified_lines.iter().cloned());
        cursor = hunk.base_end_line;
    }
    out.extend(base_lines[cursor..range_end].iter().cloned());
    out
}

/// spec.md §4.6's named primitive: what a patch's content looks like in
/// place of a base line it no longer carries verbatim.
///
/// Finds the largest base index strictly before `base_idx` that is
/// matched in `pairs`, and the smallest strictly after; returns the
/// patch-side lines strictly between those two matches' patch-side
/// indices (exclusive on both ends), joined with `\n`, or `None` if that
/// span is empty — i.e. the patch deleted the base line outright with
/// nothing in its place.
///
/// [`merge_with_conflicts`] does not call this directly — it reaches the
/// same content by replaying whole hunk groups via [`apply_hunks_to_range`]
/// rather than a base-index-by-base-index walk, which stays correct when
/// a conflicting region spans multiple base lines or multiple hunks from
/// the same side. The two are equivalent for a single base line flanked
/// by matched anchors on both sides, which is what this function is for;
/// see the `find_replacement_matches_conflict_group_content` test.
fn find_replacement(base_idx: usize, patch_lines: &[String], pairs: &[(usize, usize)]) -> Option<String> {
    let prev = pairs.iter().filter(|(b, _)| *b < base_idx).map(|(_, p)| *p).max();
    let next = pairs.iter().filter(|(b, _)| *b > base_idx).map(|(_, p)| *p).min();

    let start = prev.map(|p| p + 1).unwrap_or(0);
    let end = next.unwrap_or(patch_lines.len());

    if start >= end {
        return None;
    }
    Some(patch_lines[start..end].join("\n"))
}

/// Three-way conflict-marking line merge.
///
/// Fast paths mirror [`merge_text`]. Otherwise both `patch_a` and
/// `patch_b` are diffed against `base` via [`calculate_hunks`]; hunks that
/// touch the same base-line range are grouped, and each group either
/// applies cleanly (one side only, or both sides produce identical
/// content) or becomes a conflict block delimited by the markers above,
/// with `label_a` above A's content and `label_b` below B's.
pub fn merge_with_conflicts(
    base: &str,
    patch_a: &str,
    patch_b: &str,
    label_a: &str,
    label_b: &str,
) -> ConflictMergeResult {
    if patch_a == base && patch_b == base {
        return ConflictMergeResult {
            merged: base.to_string(),
            has_conflicts: false,
            conflict_count: 0,
        };
    }
    if patch_a == base {
        return ConflictMergeResult {
            merged: patch_b.to_string(),
            has_conflicts: false,
            conflict_count: 0,
        };
    }
    if patch_b == base {
        return ConflictMergeResult {
            merged: patch_a.to_string(),
            has_conflicts: false,
            conflict_count: 0,
        };
    }
    if patch_a == patch_b {
        return ConflictMergeResult {
            merged: patch_a.to_string(),
            has_conflicts: false,
            conflict_count: 0,
        };
    }

    let base_lines = split_lines(base);
    let hunks_a = calculate_hunks(base, patch_a);
    let hunks_b = calculate_hunks(base, patch_b);
    let groups = group_hunks(&hunks_a, &hunks_b);

    let mut result_lines: Vec<String> = Vec::new();
    let mut cursor = 0usize;
    let mut conflict_count = 0usize;

    for group in &groups {
        result_lines.extend(base_lines[cursor..group.start].iter().cloned());

        let has_a = !group.a_hunks.is_empty();
        let has_b = !group.b_hunks.is_empty();

        if has_a && has_b {
            let a_content = apply_hunks_to_range(&base_lines, &group.a_hunks, (group.start, group.end));
            let b_content = apply_hunks_to_range(&base_lines, &group.b_hunks, (group.start, group.end));
            if a_content == b_content {
                result_lines.extend(a_content);
            } else {
                conflict_count += 1;
                result_lines.push(marker_open(label_a));
                result_lines.extend(a_content);
                result_lines.push(marker_mid());
                result_lines.extend(b_content);
                result_lines.push(marker_close(label_b));
            }
        } else if has_a {
            result_lines.extend(apply_hunks_to_range(&base_lines, &group.a_hunks, (group.start, group.end)));
        } else {
            result_lines.extend(apply_hunks_to_range(&base_lines, &group.b_hunks, (group.start, group.end)));
        }

        cursor = group.end;
    }
    result_lines.extend(base_lines[cursor..].iter().cloned());

    ConflictMergeResult {
        merged: result_lines.join("\n"),
        has_conflicts: conflict_count > 0,
        conflict_count,
    }
}

/// Convenience wrapper: would merging `a` and `b` against `base` produce
/// at least one conflict block?
pub fn has_conflicts(base: &str, a: &str, b: &str) -> bool {
    merge_with_conflicts(base, a, b, "A", "B").has_conflicts
}

/// One parsed conflict-marker block from merged text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictBlock {
    pub start_line: usize,
    pub label_a: String,
    pub content_a: String,
    pub label_b: String,
    pub content_b: String,
    pub end_line: usize,
}

/// Parse every well-formed conflict block out of `text`.
///
/// An unclosed `╔══════` block (no matching `╠══════`/`╚══════` before
/// EOF) is skipped silently — this is a documented policy, not an
/// omission.
pub fn parse_conflicts(text: &str) -> Vec<ConflictBlock> {
    let lines = split_lines(text);
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if let Some(label_a) = match_open(&lines[i]) {
            let label_a = label_a.to_string();
            if let Some(mid_idx) = ((i + 1)..lines.len()).find(|&k| is_mid(&lines[k])) {
                let close = ((mid_idx + 1)..lines.len()).find_map(|k| match_close(&lines[k]).map(|l| (l.to_string(), k)));
                if let Some((label_b, close_idx)) = close {
                    blocks.push(ConflictBlock {
                        start_line: i,
                        label_a,
                        content_a: lines[i + 1..mid_idx].join("\n"),
                        label_b,
                        content_b: lines[mid_idx + 1..close_idx].join("\n"),
                        end_line: close_idx,
                    });
                    i = close_idx + 1;
                    continue;
                }
            }
        }
        i += 1;
    }

    blocks
}

/// Replace the `index`-th conflict block in `text` with a resolution.
///
/// `resolution` is one of `"A"` (keep A's content), `"B"` (keep B's),
/// `"both"` (A then B), or an arbitrary string taken verbatim and split
/// on newlines. An out-of-range `index` is a no-op returning `text`
/// unchanged.
pub fn resolve_conflict(text: &str, index: usize, resolution: &str) -> String {
    let blocks = parse_conflicts(text);
    let Some(block) = blocks.get(index) else {
        return text.to_string();
    };

    let replacement: Vec<String> = match resolution {
        "A" => split_lines(&block.content_a),
        "B" => split_lines(&block.content_b),
        "both" => {
            let mut lines = split_lines(&block.content_a);
            lines.extend(split_lines(&block.content_b));
            lines
        }
        other => split_lines(other),
    };

    let lines = split_lines(text);
    let mut out: Vec<String> = Vec::new();
    out.extend(lines[..block.start_line].iter().cloned());
    out.extend(replacement);
    out.extend(lines[block.end_line + 1..].iter().cloned());
    out.join("\n")
}

/// Strict counterpart to [`resolve_conflict`]: the same replacement
/// logic, but an out-of-range `index` surfaces as [`MergeError`] instead
/// of silently returning `text` unchanged.
pub fn resolve_conflict_checked(text: &str, index: usize, resolution: &str) -> Result<String, MergeError> {
    let blocks = parse_conflicts(text);
    if index >= blocks.len() {
        return Err(MergeError::ConflictIndexOutOfRange {
            index,
            available: blocks.len(),
        });
    }
    Ok(resolve_conflict(text, index, resolution))
}

/// Whether `text` contains any `╔══════` marker line. A hint, not a
/// guarantee — malformed/unclosed blocks still count.
pub fn has_unresolved_conflicts(text: &str) -> bool {
    split_lines(text).iter().any(|l| is_open_prefix(l))
}

/// Count `╔══════` marker lines in `text`. May overcount malformed
/// blocks — intentional.
pub fn count_conflicts(text: &str) -> usize {
    split_lines(text).iter().filter(|l| is_open_prefix(l)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_text_fast_path_all_equal() {
        assert_eq!(merge_text("base", "base", "base"), "base");
    }

    #[test]
    fn merge_text_fast_path_local_unchanged() {
        assert_eq!(merge_text("base", "base", "canon"), "canon");
    }

    #[test]
    fn merge_text_fast_path_canonical_unchanged() {
        assert_eq!(merge_text("base", "local", "base"), "local");
    }

    #[test]
    fn merge_text_fast_path_both_same_change() {
        assert_eq!(merge_text("base", "x", "x"), "x");
    }

    #[test]
    fn merge_text_empty_sides() {
        assert_eq!(merge_text("", "", ""), "");
        assert_eq!(merge_text("base", "", "canon"), "canon");
        assert_eq!(merge_text("base", "local", ""), "local");
    }

    #[test]
    fn merge_text_idempotence() {
        assert_eq!(merge_text("base", "change", "change"), "change");
    }

    #[test]
    fn merge_text_non_overlapping_edits() {
        let merged = merge_text("hello world", "hello beautiful world", "hello world today");
        assert!(merged.contains("hello"));
        assert!(merged.contains("beautiful"));
        assert!(merged.contains("today"));
    }

    #[test]
    fn merge_text_both_delete_distinct() {
        let merged = merge_text("one two three four", "one three four", "one two three");
        assert_eq!(merged, "one three");
    }

    #[test]
    fn merge_with_conflicts_conflict_block_round_trip() {
        let base = "A\nB\nC";
        let patch_a = "A\nX\nC";
        let patch_b = "A\nY\nC";
        let result = merge_with_conflicts(base, patch_a, patch_b, "Alice", "Bob");
        assert_eq!(
            result.merged,
            "A\n╔══════ Alice\nX\n╠══════\nY\n╚══════ Bob\nC"
        );
        assert_eq!(result.conflict_count, 1);
        assert!(result.has_conflicts);

        let resolved = resolve_conflict(&result.merged, 0, "A");
        assert_eq!(resolved, "A\nX\nC");
    }

    #[test]
    fn merge_with_conflicts_no_conflict_when_disjoint() {
        let base = "one\ntwo\nthree\nfour\nfive";
        let patch_a = "ONE\ntwo\nthree\nfour\nfive";
        let patch_b = "one\ntwo\nthree\nfour\nFIVE";
        let result = merge_with_conflicts(base, patch_a, patch_b, "A", "B");
        assert!(!result.has_conflicts);
        assert_eq!(result.conflict_count, 0);
        assert!(!result.merged.contains('╔'));
        assert_eq!(result.merged, "ONE\ntwo\nthree\nfour\nFIVE");
    }

    #[test]
    fn adjacent_non_overlapping_edits_do_not_conflict() {
        let base = "one\ntwo\nthree\nfour";
        let a = "ONE\ntwo\nthree\nfour";
        let b = "one\nTWO\nthree\nfour";
        let result = merge_with_conflicts(base, a, b, "A", "B");
        assert!(!result.has_conflicts);
        assert_eq!(result.merged, "ONE\nTWO\nthree\nfour");
    }

    #[test]
    fn conflict_free_merge_soundness() {
        let base = "alpha\nbeta\ngamma";
        let a = "alpha changed\nbeta\ngamma";
        let b = "alpha\nbeta\ngamma changed";
        assert!(!has_conflicts(base, a, b));
        let result = merge_with_conflicts(base, a, b, "A", "B");
        assert_eq!(result.conflict_count, 0);
        assert!(!result.merged.lines().any(|l| l.starts_with("╔══════")));
    }

    #[test]
    fn resolve_all_a_clears_every_conflict() {
        let base = "one\ntwo\nthree";
        let a = "one\nALPHA\nthree";
        let b = "one\nBETA\nthree";
        let result = merge_with_conflicts(base, a, b, "A", "B");
        assert!(result.has_conflicts);

        let mut text = result.merged;
        while has_unresolved_conflicts(&text) {
            text = resolve_conflict(&text, 0, "A");
        }
        assert_eq!(count_conflicts(&text), 0);
        assert_eq!(text, "one\nALPHA\nthree");
    }

    #[test]
    fn unclosed_conflict_block_is_skipped_silently() {
        let text = "before\n╔══════ Alice\ndangling\nafter";
        assert!(parse_conflicts(text).is_empty());
        // hasUnresolvedConflicts is a hint, so it still reports true.
        assert!(has_unresolved_conflicts(text));
        assert_eq!(count_conflicts(text), 1);
    }

    #[test]
    fn resolve_conflict_out_of_range_is_a_no_op() {
        let text = "A\n╔══════ Alice\nX\n╠══════\nY\n╚══════ Bob\nC";
        assert_eq!(resolve_conflict(text, 5, "A"), text);
    }

    #[test]
    fn resolve_conflict_checked_reports_out_of_range() {
        let text = "A\n╔══════ Alice\nX\n╠══════\nY\n╚══════ Bob\nC";
        let err = resolve_conflict_checked(text, 5, "A").unwrap_err();
        assert_eq!(
            err,
            MergeError::ConflictIndexOutOfRange {
                index: 5,
                available: 1
            }
        );
        assert!(resolve_conflict_checked(text, 0, "A").is_ok());
    }

    #[test]
    fn merge_with_conflicts_both_variant_concatenates() {
        let base = "one\ntwo\nthree";
        let a = "one\nALPHA\nthree";
        let b = "one\nBETA\nthree";
        let result = merge_with_conflicts(base, a, b, "A", "B");
        let resolved = resolve_conflict(&result.merged, 0, "both");
        assert_eq!(resolved, "one\nALPHA\nBETA\nthree");
    }

    #[test]
    fn find_replacement_locates_content_strictly_between_its_anchors() {
        let base_lines: Vec<String> = vec!["alpha", "beta", "gamma", "delta"]
            .into_iter()
            .map(String::from)
            .collect();
        let patch_lines: Vec<String> = vec!["B1", "B2", "B3", "gamma", "delta"]
            .into_iter()
            .map(String::from)
            .collect();
        let pairs = lcs_pairs(&base_lines, &patch_lines);

        // No anchor before base index 1 ("alpha"/"beta" are both
        // replaced); "gamma" at base index 2 is the next anchor, matched
        // to patch index 3.
        assert_eq!(
            find_replacement(1, &patch_lines, &pairs),
            Some("B1\nB2\nB3".to_string())
        );
        // A base line deleted outright, with the patch's surrounding
        // anchors immediately adjacent (nothing inserted in its place),
        // returns None: base = ["X", "DELETED", "Y"], patch = ["X", "Y"].
        let tight_pairs = vec![(0, 0), (2, 1)];
        let tight_patch = vec!["X".to_string(), "Y".to_string()];
        assert_eq!(find_replacement(1, &tight_patch, &tight_pairs), None);
    }

    #[test]
    fn find_replacement_matches_conflict_group_content() {
        // A keeps base line 1 ("beta") unchanged while editing base line
        // 0; B replaces the whole [0, 2) span with three new lines — the
        // asymmetric case spec.md §4.6 step 5 describes (A kept, B
        // replaced a multi-line span spanning the kept index). What
        // find_replacement computes for patch B at base index 1, given
        // only B's own alignment against base, should equal what
        // merge_with_conflicts's hunk-group replay independently produces
        // as B's side of the conflict block.
        let base = "alpha\nbeta\ngamma\ndelta";
        let patch_a = "ALPHA\nbeta\ngamma\ndelta";
        let patch_b = "B1\nB2\nB3\ngamma\ndelta";

        let base_lines = split_lines(base);
        let patch_b_lines = split_lines(patch_b);
        let pairs_b = lcs_pairs(&base_lines, &patch_b_lines);
        let via_find_replacement = find_replacement(1, &patch_b_lines, &pairs_b).unwrap();

        let result = merge_with_conflicts(base, patch_a, patch_b, "A", "B");
        assert_eq!(result.conflict_count, 1);
        let blocks = parse_conflicts(&result.merged);
        assert_eq!(blocks[0].content_b, via_find_replacement);
        assert_eq!(via_find_replacement, "B1\nB2\nB3");
    }
}

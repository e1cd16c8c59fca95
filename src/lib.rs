//! Collaborative Markdown document merge core.
//!
//! A tokenizer, a longest-common-subsequence engine, word- and line-level
//! diffing built on it, a three-way merge (silent and conflict-marking
//! variants), and conflict-zone detection across an arbitrary number of
//! concurrent patches against a shared base document.
//!
//! Every operation here is a pure function of its arguments: no process-
//! global state, no caching between calls. The same inputs always produce
//! the same output, so callers can run these functions from any number of
//! threads without coordination.

pub mod char_diff;
pub mod error;
pub mod hunk;
pub mod lcs;
pub mod merge;
pub mod token;
pub mod zone;

pub use char_diff::{calculate_char_diff, diff_to_ranges, AdditionRange, DeletionMark, DiffKind, DiffOp, DiffRanges};
pub use error::MergeError;
pub use hunk::{calculate_hunks, Hunk, HunkType};
pub use lcs::lcs_pairs;
pub use merge::{
    has_conflicts, merge_text, merge_with_conflicts, parse_conflicts, resolve_conflict,
    resolve_conflict_checked, ConflictBlock, ConflictMergeResult,
};
pub use token::{split_lines, tokenize, Token};
pub use zone::{
    assemble_final_document, detect_conflict_zones, extract_zone_content, get_zone_context,
    initial_zone_merge, replace_zone_content, replace_zone_content_checked, PatchInput, Zone,
    ZoneContext, ZonePatch,
};

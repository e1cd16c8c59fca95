//! Crate error type.
//!
//! The public merge/diff/zone operations never fail outright — a bad
//! index or an out-of-range line is a clamp or a no-op, not an error (see
//! the `resolve_conflict`/`replace_zone_content` doc comments). This type
//! exists for the stricter `_checked` variants that want to surface that
//! same condition as a typed error instead of silently swallowing it,
//! offering both a permissive and a strict entry point for the same
//! operation.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("conflict index {index} out of range (text has {available} conflict blocks)")]
    ConflictIndexOutOfRange { index: usize, available: usize },

    #[error("zone range [{start}, {end}] out of bounds for a document with {line_count} lines")]
    ZoneRangeOutOfBounds {
        start: usize,
        end: usize,
        line_count: usize,
    },
}

// tests/merge_integration_test.rs
use korppi_merge::{
    has_conflicts, merge_text, merge_with_conflicts, parse_conflicts, resolve_conflict,
};

#[test]
fn test_three_way_token_merge_combines_non_overlapping_edits() {
    let base = "The quick fox jumps over the lazy dog.";
    let local = "The quick brown fox jumps over the lazy dog.";
    let canonical = "The quick fox jumps over the very lazy dog.";

    let merged = merge_text(base, local, canonical);
    assert!(merged.contains("brown"));
    assert!(merged.contains("very"));
}

#[test]
fn test_conflict_markers_round_trip_through_parse_and_resolve() {
    let base = "# Title\n\nBody text.\n";
    let alice = "# Title\n\nBody text, revised by Alice.\n";
    let bob = "# Title\n\nBody text, revised by Bob.\n";

    let result = merge_with_conflicts(base, alice, bob, "Alice", "Bob");
    assert!(result.has_conflicts);
    assert_eq!(result.conflict_count, 1);

    let blocks = parse_conflicts(&result.merged);
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].label_a, "Alice");
    assert_eq!(blocks[0].label_b, "Bob");

    let resolved = resolve_conflict(&result.merged, 0, "both");
    assert!(resolved.contains("revised by Alice"));
    assert!(resolved.contains("revised by Bob"));
    assert!(!resolved.contains('╔'));
}

#[test]
fn test_has_conflicts_is_false_for_edits_to_disjoint_lines() {
    let base = "line one\nline two\nline three";
    let a = "LINE ONE\nline two\nline three";
    let b = "line one\nline two\nLINE THREE";
    assert!(!has_conflicts(base, a, b));
}

#[test]
fn test_identical_patches_never_conflict() {
    let base = "shared base text";
    let patch = "shared base text, extended";
    let result = merge_with_conflicts(base, patch, patch, "A", "B");
    assert!(!result.has_conflicts);
    assert_eq!(result.merged, patch);
}

//! Merge scenarios: clean merges, the conflict table, and merge laws.
//!
//! Trees are written in the Lisp-like notation of `common` (first character
//! of the label, lowercased, is the id; the label is the content). Every
//! successful merge in these tests also replays its emitted edit script on
//! a copy of the base and checks the result, so the script contract is
//! exercised throughout.

mod common;

use common::{assert_conflicts, assert_merges, fmt, tree, try_merge};
use treeway::error::{Conflict, MergeError, StructuralConflict};

// ==========================================================================
// Clean merges
// ==========================================================================

#[test]
fn concurrent_inserts() {
    assert_merges("a (b c)", "a (b c j)", "a (i b c)", "a (i b c j)");
}

#[test]
fn concurrent_inserts_in_subtrees() {
    assert_merges(
        "r (a (b) c)",
        "r (a (b) c j)",
        "r (a (i b) c)",
        "r (a (i b) c j)",
    );
}

#[test]
fn concurrent_deletes() {
    assert_merges("r (a (b) c)", "r (a c)", "r (a (b))", "r (a)");
}

#[test]
fn concurrent_updates_on_disjoint_nodes() {
    assert_merges("r (a (b) c)", "R (a (b) c)", "r (a (b) C)", "R (a (b) C)");
}

#[test]
fn concurrent_moves() {
    assert_merges("r (a (b d) c)", "r (a (d b) c)", "r (c a (b d))", "r (c a (d b))");
}

#[test]
fn all_operations_combined() {
    assert_merges(
        "r (a (b d) c)",
        "r (i a (b d))",
        "r (a (D b) c)",
        "r (i a (D b))",
    );
}

#[test]
fn delayed_delete_rescues_moved_node() {
    // One branch pulls d out of the doomed subtree before the other's
    // delete of b lands; the merge keeps d only.
    assert_merges("a (b (k (l (m n) d)))", "a (d)", "a (b (k (l (m n) d)))", "a (d)");
}

#[test]
fn same_insert_in_both_branches() {
    assert_merges("a (b)", "a (i b)", "a (i b)", "a (i b)");
}

#[test]
fn same_subtree_inserted_in_both_branches() {
    assert_merges("a (b)", "a (i (x y) b)", "a (i (x y) b)", "a (i (x y) b)");
}

#[test]
fn same_delete_and_same_update_in_both_branches() {
    assert_merges("r (a b)", "r (A b)", "r (A b)", "r (A b)");
}

// ==========================================================================
// Merge laws
// ==========================================================================

#[test]
fn merge_identity() {
    for doc in ["a", "a (b c)", "r (a (b d) c (e))"] {
        let merged = try_merge(doc, doc, doc).unwrap();
        assert_eq!(fmt(&merged), doc);
    }
}

#[test]
fn first_side_identity() {
    // If one branch equals the base, the merge is the other branch.
    let base = "r (a (b d) c)";
    for edited in ["r (a (d b) c)", "r (c a (b d))", "r (i a (b d))", "R (a (b D) c)"] {
        let merged = try_merge(base, edited, base).unwrap();
        assert_eq!(fmt(&merged), edited);
        let merged = try_merge(base, base, edited).unwrap();
        assert_eq!(fmt(&merged), edited);
    }
}

#[test]
fn merged_tree_is_independent_of_inputs() {
    use treeway::tree::{MutableTree, TraversableTree};
    let tb = tree("a (b c)");
    let t1 = tree("a (b c j)");
    let t2 = tree("a (i b c)");
    let merged = treeway::merge::merge_default(&tb, &t1, &t2).unwrap();
    // Mutating the merged tree has nothing to do with the inputs.
    let mut merged = merged;
    merged.update("B2".to_owned(), &"b".to_owned()).unwrap();
    assert_eq!(t1.content(&"b".to_owned()), Some(&"b".to_owned()));
    assert_eq!(merged.children(&"a".to_owned()).len(), 4);
}

// ==========================================================================
// Update conflicts
// ==========================================================================

#[test]
fn update_conflicts() {
    assert_conflicts("root (a (b) c)", "root2 (a (b) c)", "root3 (a (b) c)");
    assert_conflicts("r (a (bee) c)", "r (a (bee2) c)", "r (a (bee3) c)");
    assert_conflicts("r (a (b) cee)", "r (a (b) cee2)", "r (a (b) cee3)");
}

#[test]
fn update_delete_conflicts() {
    assert_conflicts("r (a (b) c)", "r (c)", "r (A (b) c)");
    assert_conflicts("r (a (b) c)", "r (c)", "r (a (B) c)");
    assert_conflicts("r (a b c (d e) f g)", "r (a b g)", "r (a b C (d e) f g)");
    assert_conflicts("r (a b c (d e) f g)", "r (a b g)", "r (a b c (d e) F g)");
    assert_conflicts("r (a b c (d e) f g)", "r (a b g)", "r (a b c (D e) f g)");
    assert_conflicts("r (a b c (d e) f g)", "r (a b g)", "r (a b c (d E) f g)");
}

// ==========================================================================
// Insert conflicts
// ==========================================================================

#[test]
fn colliding_insert_conflicts() {
    assert_conflicts("r (a (b) c)", "r (a i (b) c)", "r (a j (b) c)");
    assert_conflicts("r (a (b) c)", "r (i a (b) c)", "r (j a (b) c)");
    assert_conflicts("r (a (b) c)", "r (a (b) c i)", "r (a (b) c j)");
}

#[test]
fn insert_into_deleted_subtree_conflicts() {
    assert_conflicts("r (a b c (d e) f g)", "r (a b g)", "r (a b c i (d e) f g)");
    assert_conflicts("r (a b c (d e) f g)", "r (a b g)", "r (a b c (d e) f j g)");
    assert_conflicts("r (a b c (d e) f g)", "r (a b g)", "r (a b c (i d e) f g)");
    assert_conflicts("r (a b c (d e) f g)", "r (a b g)", "r (a b c (d e j) f g)");
}

// ==========================================================================
// Move conflicts
// ==========================================================================

#[test]
fn move_conflicts() {
    assert_conflicts("r (a (b c d e f g) h)", "r (a (b g) h)", "r (a (b c e d f g) h)");
    assert_conflicts("r (a (b c d e f g) h)", "r (h)", "r (a (b c e d f g) h)");
    assert_conflicts("r (a (b c d e f g) h)", "r (h)", "r (a (c b d e f g) h)");
    assert_conflicts("r (a (b c d e f g) h)", "r (h)", "r (a (b c d e g f) h)");
}

#[test]
fn saved_by_move_conflicts() {
    // A deleted node d is "saved" by being moved out of the deleted area.
    assert_conflicts("r (a (b c d e f g) h)", "r (a (b g) h)", "r (a (b c e f g) h d)");
    assert_conflicts("r (a (b c d e f g) h)", "r (h)", "r (a (b c e f g) h d)");
}

#[test]
fn end_of_list_conflicts() {
    // Ambiguity around the last node of a child list.
    assert_conflicts("r (a b)", "r (a)", "r (a i)");
    assert_conflicts("r (a b c)", "r (b (a))", "r (b a)");
    assert_conflicts("r (a b c)", "r (a b)", "r (a b)");
}

// ==========================================================================
// Cycle detection
// ==========================================================================

#[test]
fn pathological_cross_moves_conflict_instead_of_looping() {
    // Both branches swap ancestor relationships so that the "correct"
    // merge would be an infinite tree.
    assert_conflicts("R (a (b (c (d))))", "R (a (c (b (d))))", "R (d (b (c (a))))");
}

// ==========================================================================
// Error surface
// ==========================================================================

#[test]
fn conflict_kind_is_reported() {
    let err = try_merge("r (a (b) c)", "r (c)", "r (A (b) c)").unwrap_err();
    match err {
        MergeError::Conflict(Conflict::Structural(StructuralConflict::DeleteChange { id })) => {
            assert_eq!(id, "a");
        }
        other => panic!("expected DeleteChange conflict, got {other:?}"),
    }
}

#[test]
fn cyclic_merge_is_reported_as_such() {
    let err = try_merge("R (a (b (c (d))))", "R (a (c (b (d))))", "R (d (b (c (a))))")
        .unwrap_err();
    assert!(matches!(
        err,
        MergeError::Conflict(Conflict::Structural(
            StructuralConflict::CyclicMerge { .. } | StructuralConflict::ConflictingPosition { .. }
        ))
    ));
}

#[test]
fn empty_input_is_rejected() {
    let empty = common::TestTree::new();
    let full = tree("a (b)");
    let err = treeway::merge::merge_default(&empty, &full, &full).unwrap_err();
    assert!(matches!(err, MergeError::EmptyInput));
}

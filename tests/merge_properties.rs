//! Property tests for the merge laws.
//!
//! Branch trees are derived from a generated base by replaying random edit
//! operations (update / insert / delete / move); operations that would be
//! illegal on the current tree are skipped, which keeps every generated
//! branch a valid successor of the base. Properties checked:
//!
//! - identity: `merge(b, b, b) == b`
//! - one-sided identity: `merge(b, t, b) == t` and `merge(b, b, t) == t`
//! - symmetry: `merge(b, t1, t2)` and `merge(b, t2, t1)` agree on outcome,
//!   and on the tree when they succeed
//! - faithfulness: replaying the emitted edit script on a copy of the base
//!   reproduces the merged tree

use proptest::prelude::*;

use treeway::edit::ApplyEditHandler;
use treeway::merge::{merge, merge_default, NullConflictHandler, NullNodeMerger};
use treeway::tree::{MutableTree, SimpleTree, TraversableTree};

type Tree = SimpleTree<String, String>;

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// One random edit against whatever the tree looks like at that point.
/// Node and position choices are indices reduced modulo the live state, so
/// any byte pattern is a valid script.
#[derive(Clone, Debug)]
enum Edit {
    Update { node: u8, value: u8 },
    Insert { parent: u8, pos: u8, value: u8 },
    Delete { node: u8 },
    Move { node: u8, parent: u8, pos: u8 },
}

fn arb_edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (any::<u8>(), any::<u8>()).prop_map(|(node, value)| Edit::Update { node, value }),
        (any::<u8>(), any::<u8>(), any::<u8>())
            .prop_map(|(parent, pos, value)| Edit::Insert { parent, pos, value }),
        any::<u8>().prop_map(|node| Edit::Delete { node }),
        (any::<u8>(), any::<u8>(), any::<u8>())
            .prop_map(|(node, parent, pos)| Edit::Move { node, parent, pos }),
    ]
}

/// Build a base tree: node `n{i}` goes under a parent picked from the nodes
/// inserted so far.
fn build_base(shape: &[u8]) -> Tree {
    let mut tree = Tree::new();
    tree.insert("c0".to_owned(), "n0".to_owned(), None, None)
        .unwrap();
    let mut ids = vec!["n0".to_owned()];
    for (i, pick) in shape.iter().enumerate() {
        let id = format!("n{}", i + 1);
        let parent = ids[*pick as usize % ids.len()].clone();
        tree.insert(format!("c{}", i + 1), id.clone(), Some(&parent), None)
            .unwrap();
        ids.push(id);
    }
    tree
}

/// Ids of a tree in sorted order, for deterministic picking.
fn sorted_ids(tree: &Tree) -> Vec<String> {
    let mut ids = Vec::new();
    let mut queue: Vec<String> = tree.root_id().cloned().into_iter().collect();
    while let Some(id) = queue.pop() {
        queue.extend(tree.children(&id).to_vec());
        ids.push(id);
    }
    ids.sort();
    ids
}

/// Apply a branch's edit script, skipping edits the tree rejects.
fn apply_edits(tree: &mut Tree, edits: &[Edit], branch: &str) {
    for (step, edit) in edits.iter().enumerate() {
        let ids = sorted_ids(tree);
        if ids.is_empty() {
            return;
        }
        let pick = |n: &u8| ids[*n as usize % ids.len()].clone();
        match edit {
            Edit::Update { node, value } => {
                let id = pick(node);
                let _ = tree.update(format!("{branch}u{value}"), &id);
            }
            Edit::Insert { parent, pos, value } => {
                let parent = pick(parent);
                let slot = *pos as usize % (tree.children(&parent).len() + 1);
                let _ = tree.insert(
                    format!("{branch}v{value}"),
                    format!("{branch}-new{step}"),
                    Some(&parent),
                    Some(slot),
                );
            }
            Edit::Delete { node } => {
                let id = pick(node);
                if tree.root_id() != Some(&id) {
                    let _ = tree.delete(&id);
                }
            }
            Edit::Move { node, parent, pos } => {
                let id = pick(node);
                let parent = pick(parent);
                let child_count = tree.children(&parent).len();
                let slot = *pos as usize % (child_count + 1);
                let _ = tree.move_node(&id, &parent, Some(slot.min(child_count)));
            }
        }
    }
}

fn arb_inputs() -> impl Strategy<Value = (Tree, Tree, Tree)> {
    (
        prop::collection::vec(any::<u8>(), 1..8),
        prop::collection::vec(arb_edit(), 0..6),
        prop::collection::vec(arb_edit(), 0..6),
    )
        .prop_map(|(shape, edits1, edits2)| {
            let base = build_base(&shape);
            let mut first = base.clone();
            apply_edits(&mut first, &edits1, "a");
            let mut second = base.clone();
            apply_edits(&mut second, &edits2, "b");
            (base, first, second)
        })
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_identity(shape in prop::collection::vec(any::<u8>(), 1..10)) {
        let base = build_base(&shape);
        let merged = merge_default(&base, &base, &base).unwrap();
        prop_assert_eq!(merged, base);
    }

    #[test]
    fn prop_one_sided_identity(
        shape in prop::collection::vec(any::<u8>(), 1..8),
        edits in prop::collection::vec(arb_edit(), 0..6),
    ) {
        let base = build_base(&shape);
        let mut branch = base.clone();
        apply_edits(&mut branch, &edits, "a");

        let merged = merge_default(&base, &branch, &base)
            .expect("one-sided merge cannot conflict");
        prop_assert_eq!(&merged, &branch, "merge(b, t, b) must be t");

        let merged = merge_default(&base, &base, &branch)
            .expect("one-sided merge cannot conflict");
        prop_assert_eq!(&merged, &branch, "merge(b, b, t) must be t");
    }

    #[test]
    fn prop_symmetry_and_conflict_stability((base, first, second) in arb_inputs()) {
        let forward = merge_default(&base, &first, &second);
        let mirrored = merge_default(&base, &second, &first);
        match (forward, mirrored) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b, "merge is not symmetric"),
            (Err(_), Err(_)) => {}
            (a, b) => prop_assert!(
                false,
                "conflict not stable under argument swap: {:?} vs {:?}",
                a,
                b
            ),
        }
    }

    #[test]
    fn prop_edit_script_faithfulness((base, first, second) in arb_inputs()) {
        let mut replay = ApplyEditHandler::new(base.clone());
        let result = merge(
            &base,
            &first,
            &second,
            &NullNodeMerger::new(),
            &mut NullConflictHandler::new(),
            &mut replay,
        );
        if let Ok(merged) = result {
            let (replayed, err) = replay.finish();
            prop_assert_eq!(err, None, "edit script failed to apply");
            prop_assert_eq!(replayed, merged, "edit script replay diverged");
        }
    }
}

//! Whole-child-list validations run after each merged child list.
//!
//! The cursor walk reconciles positions but cannot see everything that
//! happened to nodes it skipped over. Two scans close the gap:
//!
//! - [`check_deleted_nodes`] — every base child deleted by one branch must
//!   sit untouched (same predecessor and successor) in the branch that kept
//!   it, and its whole subtree must be unchanged there; otherwise the
//!   delete races with a move, update, or insert.
//! - [`check_missing_inserts`] — every node a branch inserted must have
//!   made it into the merged child list.

use std::collections::{HashMap, HashSet};

use crate::error::{MergeError, StructuralConflict};
use crate::merge::content::NodeMerger;
use crate::merge::cursor::Slot;
use crate::tree::{AddressableTree, NodeId};

/// Slot for position `i` of a child list: the child, or [`Slot::Eos`] past
/// the end.
fn slot_at<K: NodeId>(children: &[K], i: usize) -> Slot<K> {
    children
        .get(i)
        .map_or(Slot::Eos, |id| Slot::Node(id.clone()))
}

// ---------------------------------------------------------------------------
// Deleted-node check
// ---------------------------------------------------------------------------

/// Verify every base child deleted in `deleting` against the child list the
/// `keeping` branch still has.
///
/// `base_children` are the children of the scope's base parent,
/// `keeping_children` the children of the same parent in the keeping
/// branch.
pub(crate) fn check_deleted_nodes<C, K, T, M>(
    tb: &T,
    keeping: &T,
    deleting: &T,
    merger: &M,
    base_children: &[K],
    keeping_children: &[K],
) -> Result<(), MergeError<K>>
where
    K: NodeId,
    T: AddressableTree<C, K>,
    M: NodeMerger<C, K>,
{
    // Adjacency of the keeping branch's child list, built lazily: most
    // child lists contain no deletes at all.
    let mut adjacency: Option<HashMap<&K, (Slot<K>, Slot<K>)>> = None;
    for (i, node) in base_children.iter().enumerate() {
        if deleting.contains(node) {
            continue;
        }
        let map = adjacency.get_or_insert_with(|| build_adjacency(keeping_children));
        let expected_pred = if i == 0 {
            Slot::Sos
        } else {
            Slot::Node(base_children[i - 1].clone())
        };
        let expected_succ = slot_at(base_children, i + 1);
        match map.get(node) {
            Some((pred, succ)) if *pred == expected_pred && *succ == expected_succ => {}
            // Repositioned in the keeping branch, or moved to another
            // parent entirely, while the other branch deleted it.
            _ => {
                return Err(StructuralConflict::DeleteMove { id: node.clone() }.into());
            }
        }
        check_deleted_subtree(node, tb, keeping, deleting, merger)?;
    }
    Ok(())
}

fn build_adjacency<K: NodeId>(children: &[K]) -> HashMap<&K, (Slot<K>, Slot<K>)> {
    let mut map = HashMap::new();
    for (i, child) in children.iter().enumerate() {
        let pred = if i == 0 {
            Slot::Sos
        } else {
            Slot::Node(children[i - 1].clone())
        };
        let succ = slot_at(children, i + 1);
        map.insert(child, (pred, succ));
    }
    map
}

/// Descend into a subtree that `deleting` removed and `keeping` kept,
/// verifying the keeping branch left it untouched.
fn check_deleted_subtree<C, K, T, M>(
    del_base: &K,
    tb: &T,
    keeping: &T,
    deleting: &T,
    merger: &M,
) -> Result<(), MergeError<K>>
where
    K: NodeId,
    T: AddressableTree<C, K>,
    M: NodeMerger<C, K>,
{
    let base_content = tb
        .content(del_base)
        .ok_or_else(|| MergeError::internal("deleted node missing from base tree"))?;
    let keeping_content = keeping
        .content(del_base)
        .ok_or_else(|| MergeError::internal("deleted node missing from keeping branch"))?;
    if !merger.node_equals(base_content, keeping_content) {
        return Err(StructuralConflict::DeleteChange {
            id: del_base.clone(),
        }
        .into());
    }

    // Lockstep walk of the base and keeping child lists; EOS slots catch
    // changes at the end of either list.
    let base_children = tb.children(del_base);
    let keep_children = keeping.children(del_base);
    let mut i = 0;
    loop {
        let base_slot = slot_at(base_children, i);
        let keep_slot = slot_at(keep_children, i);
        if !base_slot.same_id(&keep_slot) {
            return Err(match keep_slot.node_id() {
                Some(id) if tb.contains(id) => StructuralConflict::MovedOutOfDeletedSubtree {
                    id: id.clone(),
                }
                .into(),
                Some(id) => StructuralConflict::InsertedIntoDeletedSubtree { id: id.clone() }
                    .into(),
                // Keeping branch list ended early: it changed the subtree
                // the other branch deleted.
                None => StructuralConflict::DeleteChange {
                    id: del_base.clone(),
                }
                .into(),
            });
        }
        if let Some(id) = base_slot.node_id() {
            if !deleting.contains(id) {
                check_deleted_subtree(id, tb, keeping, deleting, merger)?;
            }
        }
        if i >= base_children.len() || i >= keep_children.len() {
            break;
        }
        i += 1;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Missing-insert check
// ---------------------------------------------------------------------------

/// Every branch child absent from the base tree (an insert) must appear in
/// the merged child list.
pub(crate) fn check_missing_inserts<'k, C, K, T>(
    tb: &T,
    merged_ids: &HashSet<K>,
    branch_children: impl Iterator<Item = &'k K>,
) -> Result<(), MergeError<K>>
where
    K: NodeId + 'k,
    T: AddressableTree<C, K>,
{
    for node in branch_children {
        if !tb.contains(node) && !merged_ids.contains(node) {
            return Err(StructuralConflict::InsertedThenDeleted { id: node.clone() }.into());
        }
    }
    Ok(())
}

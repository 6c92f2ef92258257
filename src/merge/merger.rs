//! The three-way tree merge algorithm.
//!
//! A synchronized traversal of three child lists at a time, one recursion
//! frame per merged parent. At every step the three cursors are reconciled
//! to the node that differs from the base (that node is an observed edit),
//! the node triple is merged, and the merged child is queued for recursion.
//! Edits for a child list are emitted *before* recursing into it, so an
//! inserted parent exists before inserts into it are applied.
//!
//! The recursion frame:
//!
//! 1. walk the three child lists in sync, producing the merged child list;
//! 2. validate deletes and inserts against the whole lists;
//! 3. emit the edit-script contributions for this list;
//! 4. append the merged children to the output tree;
//! 5. recurse on each merged child.
//!
//! Cycle detection: a set of every id emitted anywhere in the merged tree.
//! Cross-moves that swap ancestor relationships in the two branches would
//! otherwise unfold forever.

use std::collections::HashSet;

use tracing::{trace, trace_span};

use crate::edit::{EditHandler, EditScriptGenerator, Origin};
use crate::error::{MergeError, StructuralConflict};
use crate::merge::checks;
use crate::merge::content::NodeMerger;
use crate::merge::cursor::{ChildCursor, Slot};
use crate::merge::handler::ConflictHandler;
use crate::tree::{AddressableTree, MutableTree, NodeId, SimpleTree};

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Three-way merge of `first` and `second` against their common ancestor
/// `base`.
///
/// The merged tree is built fresh; the inputs are only read. Edit
/// operations that transform `base` into the result are emitted to `edits`
/// in replay order. On conflict the partial output is discarded.
///
/// # Errors
/// [`MergeError::Conflict`] for irreconcilable edits,
/// [`MergeError::EmptyInput`] if any input tree is empty, and
/// [`MergeError::Internal`] if an algorithm invariant breaks.
pub fn merge<C, K, T, M, H, E>(
    base: &T,
    first: &T,
    second: &T,
    content: &M,
    conflicts: &mut H,
    edits: &mut E,
) -> Result<SimpleTree<C, K>, MergeError<K>>
where
    C: Clone,
    K: NodeId,
    T: AddressableTree<C, K>,
    M: NodeMerger<C, K>,
    H: ConflictHandler<C, K, T>,
    E: EditHandler<C, K>,
{
    let root_b = base.root_id().ok_or(MergeError::EmptyInput)?.clone();
    let root_1 = first.root_id().ok_or(MergeError::EmptyInput)?.clone();
    let root_2 = second.root_id().ok_or(MergeError::EmptyInput)?.clone();

    let mut run = MergeRun {
        tb: base,
        t1: first,
        t2: second,
        content,
        conflicts,
        esg: EditScriptGenerator::new(edits, base, first, second),
        emitted: HashSet::new(),
        out: SimpleTree::new(),
    };

    let slot_b = Slot::Node(root_b.clone());
    let slot_1 = Slot::Node(root_1);
    let slot_2 = Slot::Node(root_2);
    let (merged_id, merged_content) = run.merge_node(&slot_b, &slot_1, &slot_2)?;
    run.esg.emit_edits(
        None,
        std::slice::from_ref(&root_b),
        &[(merged_id.clone(), merged_content.clone())],
    );
    run.out.insert(merged_content, merged_id.clone(), None, None)?;
    run.merge_scope(&merged_id, slot_b, slot_1, slot_2)?;
    run.esg.finish();
    Ok(run.out)
}

/// [`merge`] with the default collaborators: plain-equality content merge,
/// fail on any conflict, edits discarded.
///
/// # Errors
/// As for [`merge`].
pub fn merge_default<C, K, T>(
    base: &T,
    first: &T,
    second: &T,
) -> Result<SimpleTree<C, K>, MergeError<K>>
where
    C: Clone + PartialEq,
    K: NodeId,
    T: AddressableTree<C, K>,
{
    merge(
        base,
        first,
        second,
        &crate::merge::NullNodeMerger::new(),
        &mut crate::merge::NullConflictHandler::new(),
        &mut crate::edit::NullEditHandler,
    )
}

// ---------------------------------------------------------------------------
// MergeRun
// ---------------------------------------------------------------------------

struct MergeRun<'r, C, K: NodeId, T, M, H, E> {
    tb: &'r T,
    t1: &'r T,
    t2: &'r T,
    content: &'r M,
    conflicts: &'r mut H,
    esg: EditScriptGenerator<'r, C, K, T, E>,
    /// Every id emitted into the merged tree; the cycle guard.
    emitted: HashSet<K>,
    out: SimpleTree<C, K>,
}

impl<'r, C, K, T, M, H, E> MergeRun<'r, C, K, T, M, H, E>
where
    C: Clone,
    K: NodeId,
    T: AddressableTree<C, K>,
    M: NodeMerger<C, K>,
    H: ConflictHandler<C, K, T>,
    E: EditHandler<C, K>,
{
    /// Merge the child lists of one parent triple and recurse.
    fn merge_scope(
        &mut self,
        parent: &K,
        pnb: Slot<K>,
        pn1: Slot<K>,
        pn2: Slot<K>,
    ) -> Result<(), MergeError<K>> {
        // Legal parent deletion states: all present; insert-from-first
        // (Y,-,Y); insert-from-second (Y,Y,-); insert-from-both (Y,-,-).
        // A parent deleted in a branch that still has children here, or
        // deleted everywhere, is an algorithm bug.
        let b_del = matches!(pnb, Slot::Deletia);
        let d1 = matches!(pn1, Slot::Deletia);
        let d2 = matches!(pn2, Slot::Deletia);
        let legal = (!b_del && !d1 && !d2) || (b_del && !(d1 && d2));
        if !legal {
            return Err(MergeError::internal(format!(
                "illegal deletion state on scope entry: ({b_del},{d1},{d2})"
            )));
        }
        // The span guard is the merge trace depth counter: it decrements on
        // every exit path, conflict included.
        let _span = trace_span!("merge_scope", parent = ?parent).entered();

        let mut cb = ChildCursor::new(self.tb, &pnb);
        let mut c1 = ChildCursor::new(self.t1, &pn1);
        let mut c2 = ChildCursor::new(self.t2, &pn2);
        let mut n0 = cb.next();
        let mut n1 = c1.next();
        let mut n2 = c2.next();

        let mut merged_children: Vec<(K, C)> = Vec::new();
        let mut recurse_args: Vec<(Slot<K>, Slot<K>, Slot<K>)> = Vec::new();

        loop {
            trace!(?n0, ?n1, ?n2, "pre-merge position");
            let at_end;
            if n1.same_id(&n2) {
                // Both branches agree: either no edit, or the same edit on
                // both sides.
                at_end = !c1.has_next();
                if !at_end && !n1.same_id(&n0) {
                    self.esg.set_reorder_origin(real_id(&n1)?, Origin::Both);
                    n0 = cb.seek(&n1);
                }
            } else if !n1.same_id(&n0) && !n2.same_id(&n0) {
                // Both branches differ from the base at this position.
                if !self.has_node(self.tb, &n1)
                    && !self.has_node(self.tb, &n2)
                    && !n1.is_sentinel()
                    && !n2.is_sentinel()
                {
                    // Two different new nodes at the same position.
                    self.conflicts
                        .colliding_node(&mut n1, &mut n2, &mut c1, &mut c2)?;
                    n0 = Slot::Deletia;
                } else {
                    // Move/move conflict, possibly against a list boundary
                    // (one branch ran out of children where the other
                    // edited).
                    self.conflicts.conflicting_position(
                        &mut n0, &mut n1, &mut n2, &mut cb, &mut c1, &mut c2,
                    )?;
                }
                at_end = !cb.has_next() || !c1.has_next() || !c2.has_next();
            } else if !n1.same_id(&n0) {
                // Edit observed in the first branch (the second agrees with
                // the base, or that would have been the case above).
                n0 = cb.seek(&n1);
                n2 = c2.seek(&n1);
                at_end = !c1.has_next();
                if !at_end {
                    self.esg.set_reorder_origin(real_id(&n1)?, Origin::First);
                }
            } else {
                // Edit observed in the second branch.
                n0 = cb.seek(&n2);
                n1 = c1.seek(&n2);
                at_end = !c2.has_next();
                if !at_end {
                    self.esg.set_reorder_origin(real_id(&n2)?, Origin::Second);
                }
            }
            trace!(?n0, ?n1, ?n2, "reconciled position");
            if at_end {
                break;
            }

            let (child_id, child_content) = self.merge_node(&n0, &n1, &n2)?;
            trace!(id = ?child_id, "merged child");
            if !self.emitted.insert(child_id.clone()) {
                return Err(StructuralConflict::CyclicMerge { id: child_id }.into());
            }
            merged_children.push((child_id, child_content));
            recurse_args.push((n0.clone(), n1.clone(), n2.clone()));

            n0 = cb.next();
            n1 = c1.next();
            n2 = c2.next();
        }

        let base_children = slot_children(self.tb, &pnb);
        let first_children = slot_children(self.t1, &pn1);
        let second_children = slot_children(self.t2, &pn2);

        checks::check_deleted_nodes(
            self.tb,
            self.t1,
            self.t2,
            self.content,
            base_children,
            first_children,
        )?;
        checks::check_deleted_nodes(
            self.tb,
            self.t2,
            self.t1,
            self.content,
            base_children,
            second_children,
        )?;
        let merged_ids: HashSet<K> = merged_children.iter().map(|(id, _)| id.clone()).collect();
        checks::check_missing_inserts(
            self.tb,
            &merged_ids,
            first_children.iter().chain(second_children.iter()),
        )?;

        self.esg
            .emit_edits(Some(parent), base_children, &merged_children);

        // Append the merged children, then recurse: a child list is
        // complete in the output before anything below it exists.
        for (id, content) in &merged_children {
            self.out
                .insert(content.clone(), id.clone(), Some(parent), None)?;
        }
        for ((id, _), (a0, a1, a2)) in merged_children.iter().zip(recurse_args) {
            self.merge_scope(id, a0, a1, a2)?;
        }
        Ok(())
    }

    /// Merge one node triple into a merged `(id, content)` pair.
    fn merge_node(
        &mut self,
        n0: &Slot<K>,
        n1: &Slot<K>,
        n2: &Slot<K>,
    ) -> Result<(K, C), MergeError<K>> {
        // EOS never reaches here: when one cursor ends, the others are
        // either seeked to the shared position or the loop terminates.
        if matches!(n0, Slot::Eos) || matches!(n1, Slot::Eos) || matches!(n2, Slot::Eos) {
            return Err(MergeError::internal("end-of-sequence in node merge"));
        }
        let d0 = matches!(n0, Slot::Deletia);
        let d1 = matches!(n1, Slot::Deletia);
        let d2 = matches!(n2, Slot::Deletia);
        trace!(?n0, ?n1, ?n2, "merging node triple");
        match (d0, d1, d2) {
            // All present: ordinary three-way content merge.
            (false, false, false) => {
                let id = real_id(n0)?;
                let c0 = self.content_of(self.tb, n0)?;
                let c1 = self.content_of(self.t1, n1)?;
                let c2 = self.content_of(self.t2, n2)?;
                let merged = match self.content.merge_content(c0, c1, c2) {
                    Ok(c) => c,
                    Err(_) => self.conflicts.conflicting_content(c0, c1, c2, id)?,
                };
                if !self.content.node_equals(&merged, c0) {
                    let in_first = !self.content.node_equals(c1, c0);
                    let in_second = !self.content.node_equals(c2, c0);
                    let origin = match (in_first, in_second) {
                        (true, false) => Origin::First,
                        (false, true) => Origin::Second,
                        // Both changed, or a handler invented new content.
                        _ => Origin::Both,
                    };
                    let id = id.clone();
                    self.esg.set_update_origin(&id, origin);
                    return Ok((id, merged));
                }
                Ok((id.clone(), merged))
            }
            // Insert from the first branch.
            (true, false, true) => {
                let id = real_id(n1)?.clone();
                let content = self.content_of(self.t1, n1)?.clone();
                self.esg.set_insert_origin(&id, Origin::First);
                Ok((id, content))
            }
            // Insert from the second branch.
            (true, true, false) => {
                let id = real_id(n2)?.clone();
                let content = self.content_of(self.t2, n2)?.clone();
                self.esg.set_insert_origin(&id, Origin::Second);
                Ok((id, content))
            }
            // Insert from both branches (same id, or a resolved node
            // collision).
            (true, false, false) => {
                let id = real_id(n1)?.clone();
                let c1 = self.content_of(self.t1, n1)?;
                let c2 = self.content_of(self.t2, n2)?;
                let content = if self.content.node_equals(c1, c2) {
                    c1.clone()
                } else {
                    let (c1, c2) = (c1.clone(), c2.clone());
                    self.conflicts.colliding_content(&c1, &c2, &id)?
                };
                self.esg.set_insert_origin(&id, Origin::Both);
                Ok((id, content))
            }
            // Deleted in one branch, repositioned by the other: keeping it
            // would break "a node absent from either branch is deleted".
            (false, true, false) | (false, false, true) => {
                Err(StructuralConflict::DeleteMove {
                    id: real_id(n0)?.clone(),
                }
                .into())
            }
            (false, true, true) | (true, true, true) => Err(MergeError::internal(format!(
                "illegal deletion state in node merge: ({d0},{d1},{d2})"
            ))),
        }
    }

    fn has_node(&self, tree: &T, slot: &Slot<K>) -> bool {
        slot.node_id().is_some_and(|id| tree.contains(id))
    }

    fn content_of(&self, tree: &'r T, slot: &Slot<K>) -> Result<&'r C, MergeError<K>> {
        let id = real_id(slot)?;
        tree.content(id)
            .ok_or_else(|| MergeError::internal("cursor node missing from its tree"))
    }
}

/// Id of a real node; a sentinel here is an algorithm bug.
fn real_id<K: NodeId>(slot: &Slot<K>) -> Result<&K, MergeError<K>> {
    slot.node_id()
        .ok_or_else(|| MergeError::internal("sentinel where a real node was required"))
}

/// Children of a slot's node; sentinels have none.
fn slot_children<'t, C, K: NodeId, T: AddressableTree<C, K>>(
    tree: &'t T,
    slot: &Slot<K>,
) -> &'t [K] {
    match slot.node_id() {
        Some(id) => tree.children(id),
        None => &[],
    }
}

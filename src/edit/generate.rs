//! Edit-script derivation.
//!
//! The merger annotates merged nodes with origins (who inserted, reordered,
//! or updated what) and hands the generator one `(base child list, merged
//! child list)` pair per parent scope, parents before children. From those
//! the generator derives update / delete / insert / move operations and
//! feeds them to the [`EditHandler`](crate::edit::EditHandler).
//!
//! # Live positions
//!
//! The generator owns a simulation tree — a [`SimpleTree`] copy of the base
//! — and applies every operation it emits to it. Emitted positions are
//! therefore always positions in the tree a replaying handler actually has
//! at that moment, which makes replay faithfulness hold by construction:
//! not-yet-deleted subtrees and not-yet-moved-away siblings are still in
//! the simulated child lists and shift positions exactly as they do in the
//! handler's tree.
//!
//! # Delayed deletes
//!
//! A deleted base subtree may contain nodes that survive the merge because
//! a branch moved them out. The delete is queued with that survivor set and
//! flushed only once every survivor's move has been emitted, so a replay
//! never destroys a node before its rescue move runs.

use std::collections::{HashMap, HashSet};

use crate::edit::{EditHandler, EditNode, Origin};
use crate::tree::{AddressableTree, MutableTree, NodeId, SimpleTree, TraversableTree};

// ---------------------------------------------------------------------------
// EditScriptGenerator
// ---------------------------------------------------------------------------

pub(crate) struct EditScriptGenerator<'r, C, K: NodeId, T, E> {
    handler: &'r mut E,
    base: &'r T,
    first: &'r T,
    second: &'r T,
    /// Replay simulation; starts as a copy of the base tree.
    sim: SimpleTree<C, K>,
    insert_origin: HashMap<K, Origin>,
    reorder_origin: HashMap<K, Origin>,
    update_origin: HashMap<K, Origin>,
    pending_deletes: Vec<PendingDelete<K>>,
}

struct PendingDelete<K> {
    id: K,
    origin: Origin,
    /// Nodes that must be moved out before the delete may run.
    survivors: HashSet<K>,
}

impl<'r, C, K, T, E> EditScriptGenerator<'r, C, K, T, E>
where
    C: Clone,
    K: NodeId,
    T: AddressableTree<C, K>,
    E: EditHandler<C, K>,
{
    pub(crate) fn new(handler: &'r mut E, base: &'r T, first: &'r T, second: &'r T) -> Self {
        Self {
            handler,
            base,
            first,
            second,
            sim: SimpleTree::from_tree(base),
            insert_origin: HashMap::new(),
            reorder_origin: HashMap::new(),
            update_origin: HashMap::new(),
            pending_deletes: Vec::new(),
        }
    }

    // -- origin annotations ------------------------------------------------

    pub(crate) fn set_insert_origin(&mut self, id: &K, origin: Origin) {
        self.insert_origin.insert(id.clone(), origin);
    }

    pub(crate) fn set_reorder_origin(&mut self, id: &K, origin: Origin) {
        self.reorder_origin.insert(id.clone(), origin);
    }

    pub(crate) fn set_update_origin(&mut self, id: &K, origin: Origin) {
        self.update_origin.insert(id.clone(), origin);
    }

    // -- emission ----------------------------------------------------------

    /// Emit the edits for one merged child list.
    ///
    /// `parent` is the merged parent id, or `None` for the root scope
    /// (where only an update is possible). `merged` pairs each merged child
    /// id with its merged content.
    pub(crate) fn emit_edits(&mut self, parent: Option<&K>, base_children: &[K], merged: &[(K, C)]) {
        // Updates are position-independent; emit them first.
        for (id, content) in merged {
            if let Some(origin) = self.update_origin.get(id).copied() {
                self.handler.update(content, id, origin);
                let updated = self.sim.update(content.clone(), id);
                debug_assert!(updated.is_ok(), "update target missing from simulation");
            }
        }
        let parent = match parent {
            Some(p) => p,
            None => return,
        };

        let merged_ids: HashSet<&K> = merged.iter().map(|(id, _)| id).collect();

        // Deletes: base children absent from the merged list and deleted in
        // at least one branch. Present-in-both children were moved away and
        // are handled by the scope they land in.
        for b in base_children {
            if merged_ids.contains(b) {
                continue;
            }
            let in_first = self.first.contains(b);
            let in_second = self.second.contains(b);
            let origin = match (in_first, in_second) {
                (true, true) => continue,
                (false, true) => Origin::First,
                (true, false) => Origin::Second,
                (false, false) => Origin::Both,
            };
            let survivors = self.surviving_descendants(b);
            if survivors.is_empty() {
                self.emit_delete(b, origin);
            } else {
                self.pending_deletes.push(PendingDelete {
                    id: b.clone(),
                    origin,
                    survivors,
                });
            }
        }

        // Walk the merged list left to right, enforcing the merged prefix
        // on the simulation.
        for (i, (id, content)) in merged.iter().enumerate() {
            if !self.base.contains(id) {
                // Truly new node: emitted as a single-node subtree, its
                // children follow in their own scopes.
                let origin = self.insert_origin.get(id).copied().unwrap_or(Origin::None);
                let pos = self.target_position(parent, merged, i, None);
                self.handler
                    .insert(&EditNode::leaf(id.clone(), content.clone()), parent, pos, origin);
                let inserted =
                    self.sim
                        .insert(content.clone(), id.clone(), Some(parent), Some(pos));
                debug_assert!(inserted.is_ok(), "insert collided in simulation");
                continue;
            }
            if self.placed_correctly(parent, &merged_ids, i, id) {
                continue;
            }
            let sim_children = self.sim.children(parent);
            let current_index = sim_children.iter().position(|c| c == id);
            let pos = self.target_position(parent, merged, i, current_index);
            let origin = self.move_origin(id);
            self.handler.move_node(id, parent, pos, origin);
            let moved = self.sim.move_node(id, parent, Some(pos));
            debug_assert!(moved.is_ok(), "move failed in simulation");
            self.resolve_move_dependency(id);
        }
    }

    /// Flush any deletes still queued. Survivor sets are normally drained
    /// by the time the merge finishes; flushing is a no-op guard against a
    /// handler-resolved merge that skipped a move.
    pub(crate) fn finish(&mut self) {
        let pending = std::mem::take(&mut self.pending_deletes);
        for delete in pending {
            self.emit_delete(&delete.id, delete.origin);
        }
    }

    // -- helpers -----------------------------------------------------------

    /// `true` if the `index`-th merged-list member among the simulated
    /// children of `parent` is already `id`.
    fn placed_correctly(
        &self,
        parent: &K,
        merged_ids: &HashSet<&K>,
        index: usize,
        id: &K,
    ) -> bool {
        let mut seen = 0;
        for child in self.sim.children(parent) {
            if merged_ids.contains(child) {
                if seen == index {
                    return child == id;
                }
                seen += 1;
            }
        }
        false
    }

    /// Live insertion position for the merged child at `index`: directly
    /// after the previously placed sibling, adjusted for detach-then-attach
    /// when the node is already in this child list.
    fn target_position(
        &self,
        parent: &K,
        merged: &[(K, C)],
        index: usize,
        current_index: Option<usize>,
    ) -> usize {
        if index == 0 {
            return 0;
        }
        let prev = &merged[index - 1].0;
        let sim_children = self.sim.children(parent);
        let prev_index = match sim_children.iter().position(|c| c == prev) {
            Some(p) => p,
            None => {
                debug_assert!(false, "previously placed sibling missing from simulation");
                return sim_children.len();
            }
        };
        match current_index {
            Some(cur) if cur <= prev_index => prev_index,
            _ => prev_index + 1,
        }
    }

    /// Descendants of `id` in the base tree that are present in both
    /// branches, i.e. nodes a replayed delete of `id` would destroy before
    /// their rescue move.
    fn surviving_descendants(&self, id: &K) -> HashSet<K> {
        let mut survivors = HashSet::new();
        let mut queue: Vec<K> = self.base.children(id).to_vec();
        while let Some(next) = queue.pop() {
            if self.first.contains(&next) && self.second.contains(&next) {
                survivors.insert(next.clone());
            }
            queue.extend(self.base.children(&next).to_vec());
        }
        survivors
    }

    fn emit_delete(&mut self, id: &K, origin: Origin) {
        self.handler.delete(id, origin);
        let deleted = self.sim.delete(id);
        debug_assert!(deleted.is_ok(), "delete target missing from simulation");
    }

    /// Drop `id` from every pending delete's survivor set and flush the
    /// deletes that no longer wait on anything.
    fn resolve_move_dependency(&mut self, id: &K) {
        let mut ready = Vec::new();
        self.pending_deletes.retain_mut(|pending| {
            pending.survivors.remove(id);
            if pending.survivors.is_empty() {
                ready.push((pending.id.clone(), pending.origin));
                false
            } else {
                true
            }
        });
        for (delete_id, origin) in ready {
            self.emit_delete(&delete_id, origin);
        }
    }

    fn move_origin(&self, id: &K) -> Origin {
        if let Some(origin) = self.reorder_origin.get(id).copied() {
            return origin;
        }
        // Fall back to comparing parents across the three trees.
        let base_parent = self.base.parent_id(id).ok().flatten();
        let moved_first = self.first.parent_id(id).ok().flatten() != base_parent;
        let moved_second = self.second.parent_id(id).ok().flatten() != base_parent;
        match (moved_first, moved_second) {
            (true, true) => Origin::Both,
            (true, false) => Origin::First,
            (false, true) => Origin::Second,
            (false, false) => Origin::None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

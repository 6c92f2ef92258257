//! Edit operations and the handlers that receive them.
//!
//! While merging, the engine derives the sequence of insert / delete / move
//! / update operations that transforms the base tree into the merged tree
//! and feeds it, in replay order, to an [`EditHandler`]. Operation
//! parameters line up with the [`MutableTree`](crate::tree::MutableTree)
//! interface so a handler can apply them directly.
//!
//! Provided handlers:
//!
//! - [`NullEditHandler`] — discards everything (the default);
//! - [`RecordingEditHandler`] — collects serializable [`EditOp`]s;
//! - [`ApplyEditHandler`] — replays operations onto a mutable tree,
//!   remembering the first failure.

use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::tree::{MutableTree, NodeId};

mod generate;

pub(crate) use generate::EditScriptGenerator;

// ---------------------------------------------------------------------------
// Origin
// ---------------------------------------------------------------------------

/// Which side(s) of the merge caused an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Not attributable to a branch.
    None,
    /// The first branch.
    First,
    /// The second branch.
    Second,
    /// Both branches.
    Both,
}

// ---------------------------------------------------------------------------
// EditNode
// ---------------------------------------------------------------------------

/// A detached subtree passed to [`EditHandler::insert`].
///
/// The engine emits one insert per tree level (parents before children), so
/// the subtrees it passes are single nodes; the `children` field lets
/// handlers that build their own scripts carry deeper subtrees, and
/// replaying handlers are expected to recurse through it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditNode<C, K> {
    /// Id of the subtree root.
    pub id: K,
    /// Content of the subtree root.
    pub content: C,
    /// Subtrees below the root, in child-list order.
    pub children: Vec<EditNode<C, K>>,
}

impl<C, K> EditNode<C, K> {
    /// A single-node subtree.
    pub fn leaf(id: K, content: C) -> Self {
        Self {
            id,
            content,
            children: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// EditHandler
// ---------------------------------------------------------------------------

/// Receiver for the edit operations emitted during a merge.
///
/// Operations arrive in replay order: edits for a parent's child list
/// before edits inside inserted children, and the delete of a subtree after
/// any moves that extract nodes from it.
pub trait EditHandler<C, K: NodeId> {
    /// A subtree was inserted under `parent` at `pos`.
    fn insert(&mut self, subtree: &EditNode<C, K>, parent: &K, pos: usize, origin: Origin);

    /// The subtree rooted at `id` was deleted.
    fn delete(&mut self, id: &K, origin: Origin);

    /// Node `id` was moved under `parent` at `pos`.
    fn move_node(&mut self, id: &K, parent: &K, pos: usize, origin: Origin);

    /// The content of `id` was replaced.
    fn update(&mut self, content: &C, id: &K, origin: Origin);
}

// ---------------------------------------------------------------------------
// NullEditHandler
// ---------------------------------------------------------------------------

/// Edit handler that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullEditHandler;

impl<C, K: NodeId> EditHandler<C, K> for NullEditHandler {
    fn insert(&mut self, _subtree: &EditNode<C, K>, _parent: &K, _pos: usize, _origin: Origin) {}

    fn delete(&mut self, _id: &K, _origin: Origin) {}

    fn move_node(&mut self, _id: &K, _parent: &K, _pos: usize, _origin: Origin) {}

    fn update(&mut self, _content: &C, _id: &K, _origin: Origin) {}
}

// ---------------------------------------------------------------------------
// EditOp / RecordingEditHandler
// ---------------------------------------------------------------------------

/// One recorded edit operation, tagged for JSON output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp<C, K> {
    /// Subtree insertion.
    Insert {
        /// The inserted subtree.
        subtree: EditNode<C, K>,
        /// Parent the subtree goes under.
        parent: K,
        /// Position in the parent's child list.
        pos: usize,
        /// Originating side.
        origin: Origin,
    },
    /// Subtree deletion.
    Delete {
        /// Root of the deleted subtree.
        id: K,
        /// Originating side.
        origin: Origin,
    },
    /// Node move.
    Move {
        /// The moved node.
        id: K,
        /// New parent.
        parent: K,
        /// Position in the new parent's child list.
        pos: usize,
        /// Originating side.
        origin: Origin,
    },
    /// Content update.
    Update {
        /// New content.
        content: C,
        /// The updated node.
        id: K,
        /// Originating side.
        origin: Origin,
    },
}

/// Edit handler that records every operation in order.
#[derive(Clone, Debug, Default)]
pub struct RecordingEditHandler<C, K> {
    /// The operations received so far, in emission order.
    pub ops: Vec<EditOp<C, K>>,
}

impl<C, K> RecordingEditHandler<C, K> {
    /// An empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }
}

impl<C: Clone, K: NodeId> EditHandler<C, K> for RecordingEditHandler<C, K> {
    fn insert(&mut self, subtree: &EditNode<C, K>, parent: &K, pos: usize, origin: Origin) {
        self.ops.push(EditOp::Insert {
            subtree: subtree.clone(),
            parent: parent.clone(),
            pos,
            origin,
        });
    }

    fn delete(&mut self, id: &K, origin: Origin) {
        self.ops.push(EditOp::Delete {
            id: id.clone(),
            origin,
        });
    }

    fn move_node(&mut self, id: &K, parent: &K, pos: usize, origin: Origin) {
        self.ops.push(EditOp::Move {
            id: id.clone(),
            parent: parent.clone(),
            pos,
            origin,
        });
    }

    fn update(&mut self, content: &C, id: &K, origin: Origin) {
        self.ops.push(EditOp::Update {
            content: content.clone(),
            id: id.clone(),
            origin,
        });
    }
}

// ---------------------------------------------------------------------------
// ApplyEditHandler
// ---------------------------------------------------------------------------

/// Edit handler that replays operations onto a mutable tree.
///
/// The first failing operation is remembered and every later operation is
/// ignored, so a broken script cannot cascade.
#[derive(Clone, Debug)]
pub struct ApplyEditHandler<T, K: NodeId> {
    tree: T,
    error: Option<TreeError<K>>,
}

impl<T, K: NodeId> ApplyEditHandler<T, K> {
    /// Replay onto `tree` (typically a copy of the merge base).
    pub fn new(tree: T) -> Self {
        Self { tree, error: None }
    }

    /// The replay target and the first error, if any occurred.
    pub fn finish(self) -> (T, Option<TreeError<K>>) {
        (self.tree, self.error)
    }

    /// The first error, if any occurred so far.
    pub fn error(&self) -> Option<&TreeError<K>> {
        self.error.as_ref()
    }
}

/// Recursively insert a subtree, recording the first failure.
fn insert_subtree<C: Clone, K: NodeId, T: MutableTree<C, K>>(
    tree: &mut T,
    error: &mut Option<TreeError<K>>,
    subtree: &EditNode<C, K>,
    parent: &K,
    pos: Option<usize>,
) {
    if error.is_some() {
        return;
    }
    if let Err(err) = tree.insert(subtree.content.clone(), subtree.id.clone(), Some(parent), pos) {
        *error = Some(err);
        return;
    }
    for child in &subtree.children {
        insert_subtree(tree, error, child, &subtree.id, None);
    }
}

impl<C: Clone, K: NodeId, T: MutableTree<C, K>> EditHandler<C, K> for ApplyEditHandler<T, K> {
    fn insert(&mut self, subtree: &EditNode<C, K>, parent: &K, pos: usize, _origin: Origin) {
        insert_subtree(&mut self.tree, &mut self.error, subtree, parent, Some(pos));
    }

    fn delete(&mut self, id: &K, _origin: Origin) {
        if self.error.is_none() {
            if let Err(err) = self.tree.delete(id) {
                self.error = Some(err);
            }
        }
    }

    fn move_node(&mut self, id: &K, parent: &K, pos: usize, _origin: Origin) {
        if self.error.is_none() {
            if let Err(err) = self.tree.move_node(id, parent, Some(pos)) {
                self.error = Some(err);
            }
        }
    }

    fn update(&mut self, content: &C, id: &K, _origin: Origin) {
        if self.error.is_none() {
            if let Err(err) = self.tree.update(content.clone(), id) {
                self.error = Some(err);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

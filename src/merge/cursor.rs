//! Child-list cursors and the sentinel slots used by the merge algorithm.
//!
//! A [`ChildCursor`] walks the child list of one parent node in one of the
//! three input trees. The walk has two properties the algorithm depends on:
//!
//! - after the last real child the cursor yields [`Slot::Eos`] exactly once;
//! - a cursor positioned on "no node" (a deleted parent, or a seek to an id
//!   the tree does not contain) yields [`Slot::Deletia`] indefinitely.
//!
//! [`ChildCursor::seek`] repositions the cursor so the child *following* the
//! target is the next yield, realigning to wherever the target lives in the
//! tree. Seeking the node that was just yielded is a no-op.
//!
//! Slots are confined to the merge internals; they never appear in input or
//! output trees.

use crate::tree::{AddressableTree, NodeId};

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

/// A position in a child-list walk: a real node or one of the sentinels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Slot<K> {
    /// A real node, identified by id.
    Node(K),
    /// No node here (deleted in this tree).
    Deletia,
    /// Start of a child list. Used only by the conflict-detection scans.
    Sos,
    /// End of a child list.
    Eos,
}

impl<K: NodeId> Slot<K> {
    /// Id-level equality: real nodes compare by id, sentinels by variant.
    #[must_use]
    pub fn same_id(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Node(a), Self::Node(b)) => a == b,
            (Self::Deletia, Self::Deletia) | (Self::Sos, Self::Sos) | (Self::Eos, Self::Eos) => {
                true
            }
            _ => false,
        }
    }

    /// The node id, if this is a real node.
    #[must_use]
    pub fn node_id(&self) -> Option<&K> {
        match self {
            Self::Node(id) => Some(id),
            _ => None,
        }
    }

    /// `true` for any of the sentinel variants.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Self::Node(_))
    }
}

// ---------------------------------------------------------------------------
// ChildCursor
// ---------------------------------------------------------------------------

/// Cursor over the child list of one parent in one tree.
#[derive(Debug)]
pub struct ChildCursor<'t, C, K: NodeId, T: AddressableTree<C, K>> {
    tree: &'t T,
    mode: Mode<K>,
    exhausted: bool,
    previous: Option<Slot<K>>,
    _content: std::marker::PhantomData<C>,
}

#[derive(Debug)]
enum Mode<K> {
    /// Yield [`Slot::Deletia`] forever.
    Deletia,
    /// Walk `children(parent)` from `next`.
    List { parent: K, next: usize },
}

impl<'t, C, K: NodeId, T: AddressableTree<C, K>> ChildCursor<'t, C, K, T> {
    /// Cursor over the children of `parent`. A [`Slot::Deletia`] parent
    /// produces a deletia cursor; [`Slot::Eos`] / [`Slot::Sos`] parents are
    /// not meaningful here.
    pub fn new(tree: &'t T, parent: &Slot<K>) -> Self {
        let mode = match parent {
            Slot::Node(id) => Mode::List {
                parent: id.clone(),
                next: 0,
            },
            _ => Mode::Deletia,
        };
        Self {
            tree,
            mode,
            exhausted: false,
            previous: None,
            _content: std::marker::PhantomData,
        }
    }

    /// `false` once [`Slot::Eos`] has been yielded. Deletia cursors never
    /// exhaust.
    #[must_use]
    pub fn has_next(&self) -> bool {
        !self.exhausted
    }

    /// Advance and return the slot at the old position.
    pub fn next(&mut self) -> Slot<K> {
        let slot = match &mut self.mode {
            Mode::Deletia => Slot::Deletia,
            Mode::List { parent, next } => {
                let children = self.tree.children(parent);
                if *next < children.len() {
                    let id = children[*next].clone();
                    *next += 1;
                    Slot::Node(id)
                } else if !self.exhausted {
                    self.exhausted = true;
                    Slot::Eos
                } else {
                    // EOS must never be consumed twice.
                    debug_assert!(false, "child cursor advanced past end of sequence");
                    Slot::Eos
                }
            }
        };
        self.previous = Some(slot.clone());
        slot
    }

    /// Reposition so the child following `target` is the next yield, and
    /// return the slot for `target` itself.
    ///
    /// - Seeking the slot that was just yielded is a no-op.
    /// - Seeking a node the tree does not contain (or an explicit
    ///   [`Slot::Deletia`] / [`Slot::Eos`]) turns this into a deletia
    ///   cursor and returns [`Slot::Deletia`].
    pub fn seek(&mut self, target: &Slot<K>) -> Slot<K> {
        if let Some(prev) = &self.previous {
            if prev.same_id(target) {
                return prev.clone();
            }
        }
        let id = match target {
            Slot::Node(id) => id,
            _ => return self.become_deletia(),
        };
        if !self.tree.contains(id) {
            return self.become_deletia();
        }
        // Realign to the target's position in its own parent's child list.
        match self.tree.parent_id(id) {
            Ok(Some(parent)) => {
                let pos = self
                    .tree
                    .children(parent)
                    .iter()
                    .position(|c| c == id)
                    .unwrap_or(0);
                self.mode = Mode::List {
                    parent: parent.clone(),
                    next: pos + 1,
                };
                self.exhausted = false;
                let slot = Slot::Node(id.clone());
                self.previous = Some(slot.clone());
                slot
            }
            // The root (or a lookup race) has no child-list position to
            // align to; the algorithm never seeks to the root.
            _ => {
                debug_assert!(false, "seek target has no parent");
                self.become_deletia()
            }
        }
    }

    fn become_deletia(&mut self) -> Slot<K> {
        self.mode = Mode::Deletia;
        self.exhausted = false;
        self.previous = Some(Slot::Deletia);
        Slot::Deletia
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

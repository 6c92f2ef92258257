//! Ordered, labeled trees with by-id addressing.
//!
//! Capability is layered in three traits, each adding to the previous:
//!
//! | Trait | Adds |
//! |-------|------|
//! | [`TraversableTree`] | root, ordered children, content |
//! | [`AddressableTree`] | membership test, parent lookup by id |
//! | [`MutableTree`] | insert / delete / update / move |
//!
//! The merge algorithm reads its three inputs through [`AddressableTree`]
//! only; [`SimpleTree`] is the reference implementation of the full stack
//! and the type of merged output trees.

use std::fmt;
use std::hash::Hash;

use crate::error::TreeError;

mod simple;

pub use simple::SimpleTree;

/// Bound alias for tree identifiers. Ids are opaque to the engine: they only
/// need equality, hashing, cloning, and debug formatting (for errors).
pub trait NodeId: Clone + Eq + Hash + fmt::Debug {}

impl<K: Clone + Eq + Hash + fmt::Debug> NodeId for K {}

// ---------------------------------------------------------------------------
// TraversableTree
// ---------------------------------------------------------------------------

/// A tree that supports traversal by following child relationships.
pub trait TraversableTree<C, K: NodeId> {
    /// Id of the root node, or `None` for an empty tree.
    fn root_id(&self) -> Option<&K>;

    /// Ordered children of a node. Unknown ids yield an empty slice.
    fn children(&self, id: &K) -> &[K];

    /// Content of a node, or `None` if the id is unknown.
    fn content(&self, id: &K) -> Option<&C>;
}

// ---------------------------------------------------------------------------
// AddressableTree
// ---------------------------------------------------------------------------

/// A tree that supports random-access lookup of nodes by id.
pub trait AddressableTree<C, K: NodeId>: TraversableTree<C, K> {
    /// `true` if a node with this id is attached to the tree.
    fn contains(&self, id: &K) -> bool;

    /// Parent id of a node. `Ok(None)` for the root.
    ///
    /// # Errors
    /// [`TreeError::NodeNotFound`] if the id is unknown.
    fn parent_id(&self, id: &K) -> Result<Option<&K>, TreeError<K>>;
}

// ---------------------------------------------------------------------------
// MutableTree
// ---------------------------------------------------------------------------

/// A tree that can be changed with insert, delete, update, and move.
///
/// Positions are `Option<usize>`; `None` appends to the child list. All
/// operations are atomic: on error the tree is unchanged.
pub trait MutableTree<C, K: NodeId>: AddressableTree<C, K> {
    /// Insert a new node under `parent` at `pos` (`None` = append).
    ///
    /// A `None` parent creates the root and is allowed only on an empty
    /// tree.
    ///
    /// # Errors
    /// [`TreeError::NodeNotFound`] if the parent id is unknown,
    /// [`TreeError::DuplicateId`] if the id is already present,
    /// [`TreeError::RootExists`] for a root insert into a non-empty tree,
    /// [`TreeError::InvalidPosition`] if `pos` exceeds the child count.
    fn insert(
        &mut self,
        content: C,
        id: K,
        parent: Option<&K>,
        pos: Option<usize>,
    ) -> Result<(), TreeError<K>>;

    /// Delete the subtree rooted at `id`, purging every descendant from the
    /// index. Deleting the root empties the tree.
    ///
    /// # Errors
    /// [`TreeError::NodeNotFound`] if the id is unknown.
    fn delete(&mut self, id: &K) -> Result<(), TreeError<K>>;

    /// Replace the content of a node.
    ///
    /// # Errors
    /// [`TreeError::NodeNotFound`] if the id is unknown.
    fn update(&mut self, content: C, id: &K) -> Result<(), TreeError<K>>;

    /// Move a node (with its subtree) under `parent` at `pos`.
    ///
    /// Detach-then-attach semantics: when moving within the same child
    /// list the node is removed first, so the largest allowed `pos` is one
    /// less than for a cross-parent move.
    ///
    /// # Errors
    /// [`TreeError::NodeNotFound`] if either id is unknown,
    /// [`TreeError::InvalidMove`] for a root move or a move that would make
    /// the node an ancestor of itself,
    /// [`TreeError::InvalidPosition`] if `pos` is out of range.
    fn move_node(&mut self, id: &K, parent: &K, pos: Option<usize>) -> Result<(), TreeError<K>>;
}

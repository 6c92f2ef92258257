//! Error and conflict types for tree mutation and merging.
//!
//! Two families live here:
//!
//! - [`TreeError`] — failures of the mutable-tree operations (missing node,
//!   duplicate id, illegal move or position). These are caller errors and
//!   carry the offending id so callers can match on them without parsing
//!   messages.
//! - [`Conflict`] / [`StructuralConflict`] — irreconcilable edits detected
//!   during a merge. Conflicts are ordinary values: cloneable, comparable,
//!   and serialized as tagged JSON so a driving tool can present them.
//!
//! [`MergeError`] is the umbrella type returned by the merge entry points.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// TreeError
// ---------------------------------------------------------------------------

/// Failure of a tree lookup or mutation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TreeError<K: fmt::Debug> {
    /// No node with the requested id exists in the tree.
    #[error("no node with id {id:?}")]
    NodeNotFound {
        /// The id that was looked up.
        id: K,
    },

    /// An insert would introduce a second node with an existing id.
    #[error("tree already contains a node with id {id:?}")]
    DuplicateId {
        /// The id that is already present.
        id: K,
    },

    /// A root insert (`parent = None`) was attempted on a non-empty tree.
    #[error("tree already has a root ({root:?})")]
    RootExists {
        /// Id of the existing root.
        root: K,
    },

    /// A move would detach the root or make a node an ancestor of itself.
    #[error("cannot move {id:?}: {reason}")]
    InvalidMove {
        /// The node that was to be moved.
        id: K,
        /// Why the move is illegal.
        reason: MoveViolation,
    },

    /// A child-list position outside the allowed range.
    #[error("position {pos} out of range (max {max})")]
    InvalidPosition {
        /// The requested position.
        pos: usize,
        /// The largest position allowed for this operation.
        max: usize,
    },
}

/// The specific structural rule an illegal move would break.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveViolation {
    /// The node to move is the root.
    RootMove,
    /// The node to move is the target parent or one of its ancestors.
    Cycle,
}

impl fmt::Display for MoveViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootMove => write!(f, "the root cannot be moved"),
            Self::Cycle => write!(f, "node would become an ancestor of itself"),
        }
    }
}

// ---------------------------------------------------------------------------
// Conflict
// ---------------------------------------------------------------------------

/// An irreconcilable pair of edits found during a three-way merge.
///
/// A conflict aborts the merge unless a
/// [`ConflictHandler`](crate::merge::ConflictHandler) resolves it first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Conflict<K> {
    /// The node merger could not reconcile divergent content.
    Content {
        /// Id of the node whose content diverged, when known.
        id: Option<K>,
        /// Merger-supplied description of the divergence.
        detail: String,
    },
    /// The merger detected an irreconcilable structural state.
    Structural(StructuralConflict<K>),
}

impl<K> Conflict<K> {
    /// Content conflict with no node attribution.
    pub fn content(detail: impl Into<String>) -> Self {
        Self::Content {
            id: None,
            detail: detail.into(),
        }
    }

    /// Content conflict attributed to a node.
    pub fn content_at(id: K, detail: impl Into<String>) -> Self {
        Self::Content {
            id: Some(id),
            detail: detail.into(),
        }
    }
}

impl<K: fmt::Debug> fmt::Display for Conflict<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content {
                id: Some(id),
                detail,
            } => {
                write!(f, "content conflict at {id:?}: {detail}")
            }
            Self::Content { id: None, detail } => write!(f, "content conflict: {detail}"),
            Self::Structural(s) => write!(f, "{s}"),
        }
    }
}

impl<K: fmt::Debug> std::error::Error for Conflict<K> {}

impl<K> From<StructuralConflict<K>> for Conflict<K> {
    fn from(c: StructuralConflict<K>) -> Self {
        Self::Structural(c)
    }
}

// ---------------------------------------------------------------------------
// StructuralConflict
// ---------------------------------------------------------------------------

/// The structural conflict taxonomy.
///
/// Each variant names the nodes involved so the conflict can be localized in
/// the inputs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "conflict", rename_all = "snake_case")]
pub enum StructuralConflict<K> {
    /// Both branches inserted different new nodes at the same position.
    CollidingInsert {
        /// Id inserted by the first branch.
        first: K,
        /// Id inserted by the second branch.
        second: K,
    },
    /// A node was placed in mutually incompatible positions by the two
    /// branches. A `None` entry means the corresponding cursor was at a
    /// child-list boundary rather than a real node.
    ConflictingPosition {
        /// Node at the base cursor.
        base: Option<K>,
        /// Node at the first branch cursor.
        first: Option<K>,
        /// Node at the second branch cursor.
        second: Option<K>,
    },
    /// One branch deleted a node the other branch moved or repositioned.
    DeleteMove {
        /// The deleted-and-moved node.
        id: K,
    },
    /// One branch deleted a node the other branch updated.
    DeleteChange {
        /// The deleted-and-changed node.
        id: K,
    },
    /// A node was moved out of a subtree the other branch deleted.
    MovedOutOfDeletedSubtree {
        /// The rescued node.
        id: K,
    },
    /// A node was inserted inside a subtree the other branch deleted.
    InsertedIntoDeletedSubtree {
        /// The inserted node.
        id: K,
    },
    /// A node inserted by one branch is missing from the merged child list.
    InsertedThenDeleted {
        /// The dropped insert.
        id: K,
    },
    /// Emitting the merged node would create a cycle (cross-moves whose
    /// "correct" merge is an infinite tree).
    CyclicMerge {
        /// Id at which the cycle was detected.
        id: K,
    },
}

impl<K: fmt::Debug> fmt::Display for StructuralConflict<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CollidingInsert { first, second } => {
                write!(f, "colliding insert of {first:?} and {second:?}")
            }
            Self::ConflictingPosition {
                base,
                first,
                second,
            } => write!(
                f,
                "conflicting positions (base {base:?}, first {first:?}, second {second:?})"
            ),
            Self::DeleteMove { id } => write!(f, "delete/move conflict for {id:?}"),
            Self::DeleteChange { id } => write!(f, "delete/change conflict for {id:?}"),
            Self::MovedOutOfDeletedSubtree { id } => {
                write!(f, "node {id:?} moved out of a deleted subtree")
            }
            Self::InsertedIntoDeletedSubtree { id } => {
                write!(f, "node {id:?} inserted into a deleted subtree")
            }
            Self::InsertedThenDeleted { id } => {
                write!(f, "inserted node {id:?} was deleted")
            }
            Self::CyclicMerge { id } => {
                write!(f, "cyclic merged tree, cycle starts at {id:?}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// MergeError
// ---------------------------------------------------------------------------

/// Failure of a whole merge run.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MergeError<K: fmt::Debug> {
    /// The merge found an irreconcilable edit and no handler resolved it.
    #[error("merge conflict: {0}")]
    Conflict(Conflict<K>),

    /// A tree operation failed while building the merged tree.
    #[error(transparent)]
    Tree(#[from] TreeError<K>),

    /// One of the three input trees was empty.
    #[error("cannot merge an empty input tree")]
    EmptyInput,

    /// An algorithm invariant was violated. This indicates a bug in the
    /// merger (or a conflict handler that left the cursors in an illegal
    /// state), not bad user input.
    #[error("internal merge error: {detail}")]
    Internal {
        /// What invariant was violated.
        detail: String,
    },
}

impl<K: fmt::Debug> MergeError<K> {
    pub(crate) fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            detail: detail.into(),
        }
    }

    /// Returns the conflict if this error is a conflict.
    #[must_use]
    pub fn as_conflict(&self) -> Option<&Conflict<K>> {
        match self {
            Self::Conflict(c) => Some(c),
            _ => None,
        }
    }
}

impl<K: fmt::Debug> From<Conflict<K>> for MergeError<K> {
    fn from(c: Conflict<K>) -> Self {
        Self::Conflict(c)
    }
}

impl<K: fmt::Debug> From<StructuralConflict<K>> for MergeError<K> {
    fn from(c: StructuralConflict<K>) -> Self {
        Self::Conflict(Conflict::Structural(c))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

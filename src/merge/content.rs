//! Three-way merging of node content.
//!
//! The tree merger is generic over what a node *contains*; a [`NodeMerger`]
//! supplies the two judgements it needs: three-way content merge and
//! change-detection equality.

use crate::error::Conflict;
use crate::tree::NodeId;

// ---------------------------------------------------------------------------
// NodeMerger
// ---------------------------------------------------------------------------

/// Three-way merger for node content.
///
/// `merge_content` may be called when no real merge is needed (all three
/// equal, or only one side changed); implementations should handle those
/// cases cheaply.
pub trait NodeMerger<C, K: NodeId> {
    /// Merge `first` and `second` against their common ancestor `base`.
    ///
    /// # Errors
    /// A [`Conflict`] when both sides diverge from the base and cannot be
    /// reconciled.
    fn merge_content(&self, base: &C, first: &C, second: &C) -> Result<C, Conflict<K>>;

    /// Equality in the sense of "no change between these two contents".
    /// Typically looser than `==` (for instance, attribute order may be
    /// irrelevant).
    fn node_equals(&self, a: &C, b: &C) -> bool;
}

// ---------------------------------------------------------------------------
// NullNodeMerger
// ---------------------------------------------------------------------------

/// Default content merger over plainly comparable content.
///
/// The scalar three-way rule: if both branches equal the base the result is
/// the base; if exactly one side differs, that side wins; if both differ but
/// agree, either; if both differ and disagree, a content conflict.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullNodeMerger;

impl NullNodeMerger {
    /// Create a null merger.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl<C: Clone + PartialEq, K: NodeId> NodeMerger<C, K> for NullNodeMerger {
    fn merge_content(&self, base: &C, first: &C, second: &C) -> Result<C, Conflict<K>> {
        let changed_first = first != base;
        let changed_second = second != base;
        match (changed_first, changed_second) {
            (false, false) => Ok(base.clone()),
            (true, false) => Ok(first.clone()),
            (false, true) => Ok(second.clone()),
            (true, true) if first == second => Ok(first.clone()),
            (true, true) => Err(Conflict::content("content changed in both branches")),
        }
    }

    fn node_equals(&self, a: &C, b: &C) -> bool {
        a == b
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

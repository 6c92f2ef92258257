//! Conflict resolution hooks.
//!
//! When the merger detects a conflict that has a resolution hook, it calls
//! the [`ConflictHandler`] before giving up. A handler either re-raises
//! (the default), or repairs the situation — for the content hooks by
//! returning reconciled content, for the structural hooks by rewriting the
//! node slots and/or repositioning the cursors it is handed — after which
//! the merge resumes from the repaired state.

use crate::error::{Conflict, StructuralConflict};
use crate::merge::cursor::{ChildCursor, Slot};
use crate::tree::{AddressableTree, NodeId};

// ---------------------------------------------------------------------------
// ConflictHandler
// ---------------------------------------------------------------------------

/// Handler for the four resolvable conflict situations.
pub trait ConflictHandler<C, K: NodeId, T: AddressableTree<C, K>> {
    /// Both branches inserted a node with the same id but different
    /// content. Return the reconciled content.
    ///
    /// # Errors
    /// A [`Conflict`] if the collision cannot be resolved.
    fn colliding_content(&mut self, c1: &C, c2: &C, id: &K) -> Result<C, Conflict<K>>;

    /// Both branches updated an existing node to different content. Return
    /// the reconciled content.
    ///
    /// # Errors
    /// A [`Conflict`] if the divergence cannot be resolved.
    fn conflicting_content(&mut self, cb: &C, c1: &C, c2: &C, id: &K) -> Result<C, Conflict<K>>;

    /// Different new nodes were inserted at the same position. `n1` / `n2`
    /// hold the colliding nodes; a resolving handler may rewrite them
    /// and/or advance the cursors.
    ///
    /// # Errors
    /// A [`Conflict`] if the collision cannot be resolved.
    fn colliding_node(
        &mut self,
        n1: &mut Slot<K>,
        n2: &mut Slot<K>,
        c1: &mut ChildCursor<'_, C, K, T>,
        c2: &mut ChildCursor<'_, C, K, T>,
    ) -> Result<(), Conflict<K>>;

    /// A node appears in mutually incompatible positions in the two
    /// branches. `nb` / `n1` / `n2` hold the current cursor slots; a
    /// resolving handler may rewrite them and/or reposition the cursors.
    ///
    /// # Errors
    /// A [`Conflict`] if the positions cannot be reconciled.
    #[allow(clippy::too_many_arguments)]
    fn conflicting_position(
        &mut self,
        nb: &mut Slot<K>,
        n1: &mut Slot<K>,
        n2: &mut Slot<K>,
        cb: &mut ChildCursor<'_, C, K, T>,
        c1: &mut ChildCursor<'_, C, K, T>,
        c2: &mut ChildCursor<'_, C, K, T>,
    ) -> Result<(), Conflict<K>>;
}

// ---------------------------------------------------------------------------
// NullConflictHandler
// ---------------------------------------------------------------------------

/// Default handler: every conflict terminates the merge.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullConflictHandler;

impl NullConflictHandler {
    /// Create a fail-on-any-conflict handler.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl<C, K: NodeId, T: AddressableTree<C, K>> ConflictHandler<C, K, T> for NullConflictHandler {
    fn colliding_content(&mut self, _c1: &C, _c2: &C, id: &K) -> Result<C, Conflict<K>> {
        Err(Conflict::content_at(
            id.clone(),
            "colliding insert with divergent content",
        ))
    }

    fn conflicting_content(
        &mut self,
        _cb: &C,
        _c1: &C,
        _c2: &C,
        id: &K,
    ) -> Result<C, Conflict<K>> {
        Err(Conflict::content_at(id.clone(), "conflicting updates"))
    }

    fn colliding_node(
        &mut self,
        n1: &mut Slot<K>,
        n2: &mut Slot<K>,
        _c1: &mut ChildCursor<'_, C, K, T>,
        _c2: &mut ChildCursor<'_, C, K, T>,
    ) -> Result<(), Conflict<K>> {
        match (n1.node_id(), n2.node_id()) {
            (Some(first), Some(second)) => Err(StructuralConflict::CollidingInsert {
                first: first.clone(),
                second: second.clone(),
            }
            .into()),
            // The merger only raises this hook for real nodes.
            _ => Err(Conflict::content("colliding insert of sentinel nodes")),
        }
    }

    fn conflicting_position(
        &mut self,
        nb: &mut Slot<K>,
        n1: &mut Slot<K>,
        n2: &mut Slot<K>,
        _cb: &mut ChildCursor<'_, C, K, T>,
        _c1: &mut ChildCursor<'_, C, K, T>,
        _c2: &mut ChildCursor<'_, C, K, T>,
    ) -> Result<(), Conflict<K>> {
        Err(StructuralConflict::ConflictingPosition {
            base: nb.node_id().cloned(),
            first: n1.node_id().cloned(),
            second: n2.node_id().cloned(),
        }
        .into())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{MutableTree, SimpleTree};

    type Tree = SimpleTree<String, String>;

    fn handler_on_tree() -> (Tree, NullConflictHandler) {
        let mut t = Tree::new();
        t.insert("A".into(), "a".into(), None, None).unwrap();
        (t, NullConflictHandler::new())
    }

    #[test]
    fn null_handler_reraises_content_hooks() {
        let (_, mut h) = handler_on_tree();
        let r: Result<String, _> = ConflictHandler::<String, String, Tree>::colliding_content(
            &mut h,
            &"x".into(),
            &"y".into(),
            &"i".into(),
        );
        assert!(r.is_err());
        let r: Result<String, _> = ConflictHandler::<String, String, Tree>::conflicting_content(
            &mut h,
            &"b".into(),
            &"x".into(),
            &"y".into(),
            &"i".into(),
        );
        assert!(r.is_err());
    }

    #[test]
    fn null_handler_reraises_structural_hooks() {
        let (t, mut h) = handler_on_tree();
        let root = Slot::Node("a".to_owned());
        let mut c1 = ChildCursor::new(&t, &root);
        let mut c2 = ChildCursor::new(&t, &root);
        let mut n1 = Slot::Node("i".to_owned());
        let mut n2 = Slot::Node("j".to_owned());
        let err = h
            .colliding_node(&mut n1, &mut n2, &mut c1, &mut c2)
            .unwrap_err();
        assert!(matches!(
            err,
            Conflict::Structural(StructuralConflict::CollidingInsert { .. })
        ));

        let mut cb = ChildCursor::new(&t, &root);
        let mut c1 = ChildCursor::new(&t, &root);
        let mut c2 = ChildCursor::new(&t, &root);
        let mut nb = Slot::Node("x".to_owned());
        let mut n1 = Slot::Eos;
        let mut n2 = Slot::Node("y".to_owned());
        let err = h
            .conflicting_position(&mut nb, &mut n1, &mut n2, &mut cb, &mut c1, &mut c2)
            .unwrap_err();
        match err {
            Conflict::Structural(StructuralConflict::ConflictingPosition {
                base,
                first,
                second,
            }) => {
                assert_eq!(base.as_deref(), Some("x"));
                assert_eq!(first, None);
                assert_eq!(second.as_deref(), Some("y"));
            }
            other => panic!("expected ConflictingPosition, got {other:?}"),
        }
    }
}

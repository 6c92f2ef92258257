//! [`SimpleTree`] — the reference mutable tree.
//!
//! Nodes live in an id-indexed map; each entry records its content, parent,
//! and ordered child ids. Lookups are O(1), mutations O(children). Every
//! mutation validates its preconditions before touching state, so a failed
//! operation leaves the tree exactly as it was.

use std::collections::HashMap;

use crate::error::{MoveViolation, TreeError};
use crate::tree::{AddressableTree, MutableTree, NodeId, TraversableTree};

// ---------------------------------------------------------------------------
// SimpleTree
// ---------------------------------------------------------------------------

/// Id-indexed ordered tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimpleTree<C, K: NodeId> {
    root: Option<K>,
    nodes: HashMap<K, NodeEntry<C, K>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct NodeEntry<C, K> {
    content: C,
    parent: Option<K>,
    children: Vec<K>,
}

impl<C, K: NodeId> Default for SimpleTree<C, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, K: NodeId> SimpleTree<C, K> {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: None,
            nodes: HashMap::new(),
        }
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` if the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Deep copy of any traversable tree into a `SimpleTree`.
    pub fn from_tree<T: TraversableTree<C, K>>(tree: &T) -> Self
    where
        C: Clone,
    {
        let mut out = Self::new();
        if let Some(root) = tree.root_id() {
            out.copy_subtree(tree, root, None);
        }
        out
    }

    fn copy_subtree<T: TraversableTree<C, K>>(&mut self, tree: &T, id: &K, parent: Option<&K>)
    where
        C: Clone,
    {
        let content = match tree.content(id) {
            Some(c) => c.clone(),
            None => return,
        };
        // Ids come from a live tree, so these inserts cannot fail.
        let _ = self.insert(content, id.clone(), parent, None);
        for child in tree.children(id).to_vec() {
            self.copy_subtree(tree, &child, Some(id));
        }
    }

    fn entry(&self, id: &K) -> Result<&NodeEntry<C, K>, TreeError<K>> {
        self.nodes.get(id).ok_or_else(|| TreeError::NodeNotFound {
            id: id.clone(),
        })
    }

    /// `true` if `ancestor` is `node` or one of its ancestors.
    fn is_ancestor_or_self(&self, ancestor: &K, node: &K) -> bool {
        let mut cursor = Some(node.clone());
        while let Some(id) = cursor {
            if id == *ancestor {
                return true;
            }
            cursor = self.nodes.get(&id).and_then(|e| e.parent.clone());
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Trait implementations
// ---------------------------------------------------------------------------

impl<C, K: NodeId> TraversableTree<C, K> for SimpleTree<C, K> {
    fn root_id(&self) -> Option<&K> {
        self.root.as_ref()
    }

    fn children(&self, id: &K) -> &[K] {
        self.nodes.get(id).map_or(&[], |e| e.children.as_slice())
    }

    fn content(&self, id: &K) -> Option<&C> {
        self.nodes.get(id).map(|e| &e.content)
    }
}

impl<C, K: NodeId> AddressableTree<C, K> for SimpleTree<C, K> {
    fn contains(&self, id: &K) -> bool {
        self.nodes.contains_key(id)
    }

    fn parent_id(&self, id: &K) -> Result<Option<&K>, TreeError<K>> {
        Ok(self.entry(id)?.parent.as_ref())
    }
}

impl<C, K: NodeId> MutableTree<C, K> for SimpleTree<C, K> {
    fn insert(
        &mut self,
        content: C,
        id: K,
        parent: Option<&K>,
        pos: Option<usize>,
    ) -> Result<(), TreeError<K>> {
        if self.nodes.contains_key(&id) {
            return Err(TreeError::DuplicateId { id });
        }
        match parent {
            None => {
                if let Some(root) = &self.root {
                    return Err(TreeError::RootExists { root: root.clone() });
                }
                self.root = Some(id.clone());
                self.nodes.insert(
                    id,
                    NodeEntry {
                        content,
                        parent: None,
                        children: Vec::new(),
                    },
                );
            }
            Some(pid) => {
                let child_count = self.entry(pid)?.children.len();
                let at = match pos {
                    None => child_count,
                    Some(p) if p <= child_count => p,
                    Some(p) => {
                        return Err(TreeError::InvalidPosition {
                            pos: p,
                            max: child_count,
                        })
                    }
                };
                self.nodes.insert(
                    id.clone(),
                    NodeEntry {
                        content,
                        parent: Some(pid.clone()),
                        children: Vec::new(),
                    },
                );
                // entry() above proved the parent exists.
                self.nodes
                    .get_mut(pid)
                    .expect("parent checked above")
                    .children
                    .insert(at, id);
            }
        }
        Ok(())
    }

    fn delete(&mut self, id: &K) -> Result<(), TreeError<K>> {
        let parent = self.entry(id)?.parent.clone();
        match parent {
            None => self.root = None,
            Some(pid) => {
                if let Some(p) = self.nodes.get_mut(&pid) {
                    p.children.retain(|c| c != id);
                }
            }
        }
        // Purge the whole subtree from the index.
        let mut queue = vec![id.clone()];
        while let Some(next) = queue.pop() {
            if let Some(entry) = self.nodes.remove(&next) {
                queue.extend(entry.children);
            }
        }
        Ok(())
    }

    fn update(&mut self, content: C, id: &K) -> Result<(), TreeError<K>> {
        match self.nodes.get_mut(id) {
            Some(entry) => {
                entry.content = content;
                Ok(())
            }
            None => Err(TreeError::NodeNotFound { id: id.clone() }),
        }
    }

    fn move_node(&mut self, id: &K, parent: &K, pos: Option<usize>) -> Result<(), TreeError<K>> {
        let old_parent = match self.entry(id)?.parent.clone() {
            Some(p) => p,
            None => {
                return Err(TreeError::InvalidMove {
                    id: id.clone(),
                    reason: MoveViolation::RootMove,
                })
            }
        };
        let target_count = self.entry(parent)?.children.len();
        if self.is_ancestor_or_self(id, parent) {
            return Err(TreeError::InvalidMove {
                id: id.clone(),
                reason: MoveViolation::Cycle,
            });
        }
        // Detach-then-attach: a same-parent move has one slot less to aim at.
        let max = if old_parent == *parent {
            target_count.saturating_sub(1)
        } else {
            target_count
        };
        let at = match pos {
            None => max,
            Some(p) if p <= max => p,
            Some(p) => return Err(TreeError::InvalidPosition { pos: p, max }),
        };

        if let Some(entry) = self.nodes.get_mut(&old_parent) {
            entry.children.retain(|c| c != id);
        }
        self.nodes
            .get_mut(parent)
            .expect("target parent checked above")
            .children
            .insert(at, id.clone());
        self.nodes
            .get_mut(id)
            .expect("mover checked above")
            .parent = Some(parent.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

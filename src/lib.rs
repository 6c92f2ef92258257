//! treeway — three-way merge for ordered, labeled trees.
//!
//! Given a common ancestor tree and two independently edited successors,
//! [`merge`](merge::merge) produces a merged tree incorporating the
//! non-conflicting edits of both sides, or reports the first
//! irreconcilable edit as a [`Conflict`](error::Conflict). Along the way
//! it emits an edit script — insert / delete / move / update operations
//! that transform the ancestor into the merged tree — to an
//! [`EditHandler`](edit::EditHandler).
//!
//! Nodes carry opaque content and a per-document unique id; what content
//! *means* (and how it merges) is supplied by a
//! [`NodeMerger`](merge::NodeMerger). The [`html`] module provides the
//! merger for HTML-shaped documents; [`NullNodeMerger`](merge::NullNodeMerger)
//! covers plainly comparable content.
//!
//! ```
//! use treeway::merge::merge_default;
//! use treeway::tree::{MutableTree, SimpleTree, TraversableTree};
//!
//! let mut base: SimpleTree<&str, &str> = SimpleTree::new();
//! base.insert("doc", "r", None, None).unwrap();
//! base.insert("intro", "a", Some(&"r"), None).unwrap();
//!
//! // One side appends a section, the other edits the intro.
//! let mut first = base.clone();
//! first.insert("details", "b", Some(&"r"), None).unwrap();
//! let mut second = base.clone();
//! second.update("introduction", &"a").unwrap();
//!
//! let merged = merge_default(&base, &first, &second).unwrap();
//! assert_eq!(merged.children(&"r"), ["a", "b"]);
//! assert_eq!(merged.content(&"a"), Some(&"introduction"));
//! ```

pub mod edit;
pub mod error;
pub mod html;
pub mod merge;
pub mod tree;

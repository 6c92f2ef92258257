//! Synthesized element ids and the id well-formedness check.
//!
//! Identification rides on the `id` attribute of elements. A tree is
//! well-formed when every element carries a non-empty id that is unique
//! within the tree. Trees that fail the check are expected to be aligned
//! by an external matcher before merging; a *duplicate* id, however, is a
//! hard input error, never a merge conflict.
//!
//! Synthesized ids start with a reserved zero-width-space prefix, so they
//! cannot collide with anything an author would type and serializers can
//! strip them on output.

use std::collections::HashSet;

use crate::error::TreeError;
use crate::html::HtmlContent;
use crate::tree::{MutableTree, SimpleTree, TraversableTree};

/// Prefix shared by all generated ids. The zero-width space does not
/// render, and authored documents have no reason to contain it.
pub const GENERATED_ID_PREFIX: &str = "\u{200b}";

/// `true` if `id` was synthesized by [`generate`].
#[must_use]
pub fn is_generated(id: &str) -> bool {
    id.starts_with(GENERATED_ID_PREFIX)
}

/// Synthesize an id not present in `existing`.
#[must_use]
pub fn generate(existing: &HashSet<String>) -> String {
    loop {
        let id = format!("{GENERATED_ID_PREFIX}{:08x}", rand::random::<u32>());
        if !existing.contains(&id) {
            return id;
        }
    }
}

/// Check id well-formedness of an HTML tree.
///
/// Returns `Ok(true)` when every element below the root carries a
/// non-empty, unique id attribute, `Ok(false)` when some element lacks one
/// (the caller should run the external matcher). The root itself is exempt
/// from carrying an id, matching the document-body convention.
///
/// # Errors
/// [`TreeError::DuplicateId`] if two elements share an id.
pub fn check_well_formed(tree: &SimpleTree<HtmlContent, String>) -> Result<bool, TreeError<String>> {
    let root = match tree.root_id() {
        Some(r) => r,
        None => return Ok(true),
    };
    let mut seen = HashSet::new();
    let mut well_formed = true;
    let mut queue = vec![root.clone()];
    while let Some(node) = queue.pop() {
        if let Some(HtmlContent::Element { .. }) = tree.content(&node) {
            let attr_id = tree.content(&node).and_then(|c| c.attr("id"));
            match attr_id {
                Some(id) if !id.is_empty() => {
                    if !seen.insert(id.to_owned()) {
                        return Err(TreeError::DuplicateId { id: id.to_owned() });
                    }
                }
                _ if node == *root => {}
                _ => well_formed = false,
            }
        }
        queue.extend(tree.children(&node).to_vec());
    }
    Ok(well_formed)
}

/// Assign a generated id to every element that lacks a non-empty one.
pub fn ensure_ids(tree: &mut SimpleTree<HtmlContent, String>) {
    let root = match tree.root_id() {
        Some(r) => r.clone(),
        None => return,
    };
    // Collect ids already in use so fresh ones cannot collide.
    let mut used = HashSet::new();
    let mut queue = vec![root.clone()];
    let mut missing = Vec::new();
    while let Some(node) = queue.pop() {
        if let Some(content @ HtmlContent::Element { .. }) = tree.content(&node) {
            match content.attr("id") {
                Some(id) if !id.is_empty() => {
                    used.insert(id.to_owned());
                }
                _ => missing.push(node.clone()),
            }
        }
        queue.extend(tree.children(&node).to_vec());
    }
    for node in missing {
        let Some(HtmlContent::Element { tag, attrs }) = tree.content(&node).cloned() else {
            continue;
        };
        let id = generate(&used);
        used.insert(id.clone());
        let mut attrs: Vec<(String, String)> =
            attrs.into_iter().filter(|(k, _)| k != "id").collect();
        attrs.push(("id".to_owned(), id));
        let updated = tree.update(HtmlContent::Element { tag, attrs }, &node);
        debug_assert!(updated.is_ok());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn el(tag: &str, id: &str) -> HtmlContent {
        if id.is_empty() {
            HtmlContent::element(tag, Vec::<(String, String)>::new())
        } else {
            HtmlContent::element(tag, [("id", id)])
        }
    }

    fn body() -> SimpleTree<HtmlContent, String> {
        let mut t = SimpleTree::new();
        t.insert(el("body", ""), "root".into(), None, None).unwrap();
        t
    }

    #[test]
    fn generated_ids_carry_the_prefix_and_avoid_collisions() {
        let mut existing = HashSet::new();
        for _ in 0..100 {
            let id = generate(&existing);
            assert!(is_generated(&id));
            assert!(existing.insert(id));
        }
        assert!(!is_generated("user-id"));
    }

    #[test]
    fn well_formed_tree_passes() {
        let mut t = body();
        t.insert(el("p", "p1"), "p1".into(), Some(&"root".into()), None)
            .unwrap();
        t.insert(el("em", "e1"), "e1".into(), Some(&"p1".into()), None)
            .unwrap();
        assert!(check_well_formed(&t).unwrap());
    }

    #[test]
    fn missing_id_reports_not_well_formed() {
        let mut t = body();
        t.insert(el("p", ""), "p1".into(), Some(&"root".into()), None)
            .unwrap();
        assert!(!check_well_formed(&t).unwrap());
    }

    #[test]
    fn text_nodes_do_not_need_ids() {
        let mut t = body();
        t.insert(
            HtmlContent::text("hello"),
            "t1".into(),
            Some(&"root".into()),
            None,
        )
        .unwrap();
        assert!(check_well_formed(&t).unwrap());
    }

    #[test]
    fn duplicate_id_is_a_hard_error() {
        let mut t = body();
        t.insert(el("p", "dup"), "p1".into(), Some(&"root".into()), None)
            .unwrap();
        t.insert(el("p", "dup"), "p2".into(), Some(&"root".into()), None)
            .unwrap();
        let err = check_well_formed(&t).unwrap_err();
        assert!(matches!(err, TreeError::DuplicateId { id } if id == "dup"));
    }

    #[test]
    fn ensure_ids_fills_gaps_only() {
        let mut t = body();
        t.insert(el("p", "keep"), "p1".into(), Some(&"root".into()), None)
            .unwrap();
        t.insert(el("em", ""), "e1".into(), Some(&"p1".into()), None)
            .unwrap();
        ensure_ids(&mut t);
        assert_eq!(t.content(&"p1".into()).unwrap().attr("id"), Some("keep"));
        let filled = t.content(&"e1".into()).unwrap().attr("id").unwrap();
        assert!(is_generated(filled));
        assert!(check_well_formed(&t).unwrap());
    }
}

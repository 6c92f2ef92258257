//! HTML node content and its three-way merger.
//!
//! The engine itself is content-agnostic; this module supplies the content
//! domain for merging HTML-shaped documents — elements with ordered
//! attribute lists, text, and comments — together with [`HtmlNodeMerger`],
//! the reference [`NodeMerger`] over it. Parsing and serialization are the
//! caller's business: this type is the already-parsed shape.
//!
//! Merge rules, per node kind:
//!
//! - **Elements** — tag name and attributes merge independently, each by
//!   the scalar three-way rule. The merged attribute list keeps the union
//!   of names in base → first → second insertion order; merging to absence
//!   deletes the attribute; a repeated attribute name anywhere is a
//!   content conflict.
//! - **Text** — character-level three-way region merge; overlapping edits
//!   are a content conflict.
//! - **Comments** — compared by value; divergent changes conflict.
//! - **Mixed kinds** — always a content conflict.

use merge3::{Merge3, MergeGroup};
use serde::{Deserialize, Serialize};

use crate::error::Conflict;
use crate::merge::NodeMerger;
use crate::tree::NodeId;

pub mod ids;

// ---------------------------------------------------------------------------
// HtmlContent
// ---------------------------------------------------------------------------

/// Content of one HTML node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HtmlContent {
    /// An element: tag name plus attributes in document order.
    Element {
        /// Tag name, case-sensitive.
        tag: String,
        /// `(name, value)` pairs in document order.
        attrs: Vec<(String, String)>,
    },
    /// A text node.
    Text(String),
    /// A comment.
    Comment(String),
}

impl HtmlContent {
    /// An element with attributes.
    pub fn element<I, S, V>(tag: impl Into<String>, attrs: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<String>,
    {
        Self::Element {
            tag: tag.into(),
            attrs: attrs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// A text node.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// A comment node.
    pub fn comment(value: impl Into<String>) -> Self {
        Self::Comment(value.into())
    }

    /// First value of the named attribute, for elements.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            Self::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// HtmlNodeMerger
// ---------------------------------------------------------------------------

/// Three-way merger for [`HtmlContent`].
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlNodeMerger;

impl HtmlNodeMerger {
    /// Create an HTML content merger.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn merge_element<K: NodeId>(
        tag0: &str,
        attrs0: &[(String, String)],
        tag1: &str,
        attrs1: &[(String, String)],
        tag2: &str,
        attrs2: &[(String, String)],
    ) -> Result<HtmlContent, Conflict<K>> {
        let tag = merge_scalar(Some(tag0), Some(tag1), Some(tag2))?
            .ok_or_else(|| Conflict::content("element merged to no tag name"))?;

        reject_repeated_names(attrs0)?;
        reject_repeated_names(attrs1)?;
        reject_repeated_names(attrs2)?;

        // Union of attribute names in base, then first, then second
        // insertion order.
        let mut names: Vec<&str> = Vec::new();
        for (name, _) in attrs0.iter().chain(attrs1).chain(attrs2) {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }

        let mut attrs = Vec::with_capacity(attrs0.len());
        for name in names {
            let merged = merge_scalar(
                lookup(attrs0, name),
                lookup(attrs1, name),
                lookup(attrs2, name),
            )?;
            // A merged absence deletes the attribute.
            if let Some(value) = merged {
                attrs.push((name.to_owned(), value));
            }
        }
        Ok(HtmlContent::Element { tag, attrs })
    }

    fn merge_text<K: NodeId>(t0: &str, t1: &str, t2: &str) -> Result<HtmlContent, Conflict<K>> {
        let base: Vec<char> = t0.chars().collect();
        let ours: Vec<char> = t1.chars().collect();
        let theirs: Vec<char> = t2.chars().collect();
        let base_refs: Vec<&char> = base.iter().collect();
        let ours_refs: Vec<&char> = ours.iter().collect();
        let theirs_refs: Vec<&char> = theirs.iter().collect();
        let m3 = Merge3::new(&base_refs, &ours_refs, &theirs_refs);
        let mut merged = String::new();
        for group in m3.merge_groups() {
            match group {
                MergeGroup::Unchanged(chunk)
                | MergeGroup::Same(chunk)
                | MergeGroup::A(chunk)
                | MergeGroup::B(chunk) => merged.extend(chunk.iter().copied()),
                MergeGroup::Conflict(..) => {
                    return Err(Conflict::content("overlapping edits to text node"));
                }
            }
        }
        Ok(HtmlContent::Text(merged))
    }
}

impl<K: NodeId> NodeMerger<HtmlContent, K> for HtmlNodeMerger {
    fn merge_content(
        &self,
        base: &HtmlContent,
        first: &HtmlContent,
        second: &HtmlContent,
    ) -> Result<HtmlContent, Conflict<K>> {
        let changed_first = !NodeMerger::<HtmlContent, K>::node_equals(self, base, first);
        let changed_second = !NodeMerger::<HtmlContent, K>::node_equals(self, base, second);
        if !changed_first && !changed_second {
            return Ok(base.clone());
        }
        if !changed_first {
            return Ok(second.clone());
        }
        if !changed_second {
            return Ok(first.clone());
        }
        if NodeMerger::<HtmlContent, K>::node_equals(self, first, second) {
            // Identical changes in both branches.
            return Ok(first.clone());
        }
        match (base, first, second) {
            (
                HtmlContent::Element {
                    tag: tag0,
                    attrs: attrs0,
                },
                HtmlContent::Element {
                    tag: tag1,
                    attrs: attrs1,
                },
                HtmlContent::Element {
                    tag: tag2,
                    attrs: attrs2,
                },
            ) => Self::merge_element(tag0, attrs0, tag1, attrs1, tag2, attrs2),
            (HtmlContent::Text(t0), HtmlContent::Text(t1), HtmlContent::Text(t2)) => {
                Self::merge_text(t0, t1, t2)
            }
            (HtmlContent::Comment(_), HtmlContent::Comment(_), HtmlContent::Comment(_)) => {
                Err(Conflict::content("divergent edits to comment"))
            }
            _ => Err(Conflict::content("cannot merge mixed node kinds")),
        }
    }

    /// Change-detection equality: tag plus order-insensitive attributes for
    /// elements, exact string for text and comments.
    fn node_equals(&self, a: &HtmlContent, b: &HtmlContent) -> bool {
        match (a, b) {
            (
                HtmlContent::Element {
                    tag: tag_a,
                    attrs: attrs_a,
                },
                HtmlContent::Element {
                    tag: tag_b,
                    attrs: attrs_b,
                },
            ) => tag_a == tag_b && attrs_equal(attrs_a, attrs_b),
            (HtmlContent::Text(a), HtmlContent::Text(b))
            | (HtmlContent::Comment(a), HtmlContent::Comment(b)) => a == b,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn lookup<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

fn reject_repeated_names<K: NodeId>(attrs: &[(String, String)]) -> Result<(), Conflict<K>> {
    for (i, (name, _)) in attrs.iter().enumerate() {
        if attrs[..i].iter().any(|(k, _)| k == name) {
            return Err(Conflict::content(format!(
                "cannot merge element with repeated attribute {name:?}"
            )));
        }
    }
    Ok(())
}

/// Order-insensitive attribute equality (same name → value mapping).
fn attrs_equal(a: &[(String, String)], b: &[(String, String)]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a_sorted: Vec<_> = a.iter().collect();
    let mut b_sorted: Vec<_> = b.iter().collect();
    a_sorted.sort();
    b_sorted.sort();
    a_sorted == b_sorted
}

/// The scalar three-way rule over optional values; `None` means absent.
fn merge_scalar<K: NodeId>(
    v0: Option<&str>,
    v1: Option<&str>,
    v2: Option<&str>,
) -> Result<Option<String>, Conflict<K>> {
    if v1 == v2 {
        // Same update in both branches (or no change anywhere).
        return Ok(v1.map(ToOwned::to_owned));
    }
    match v0 {
        None => match (v1, v2) {
            (None, other) | (other, None) => Ok(other.map(ToOwned::to_owned)),
            (Some(_), Some(_)) => Err(Conflict::content(
                "diverging content inserted at the same location",
            )),
        },
        Some(base) => {
            if v1 == Some(base) {
                Ok(v2.map(ToOwned::to_owned))
            } else if v2 == Some(base) {
                Ok(v1.map(ToOwned::to_owned))
            } else {
                Err(Conflict::content("conflicting updates to existing content"))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

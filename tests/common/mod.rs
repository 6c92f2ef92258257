//! Shared helpers for the merge integration tests.
//!
//! Test trees are written in a Lisp-like notation: each subtree is
//! `label (child child ...)`. The lowercased first character of the label
//! becomes the node id and the label itself becomes the content, so
//! `a (b C)` is a root `a` with children id `b` (content "b") and id `c`
//! (content "C" — an updated `c`).

#![allow(dead_code)]

use treeway::edit::ApplyEditHandler;
use treeway::error::MergeError;
use treeway::merge::{merge, NullConflictHandler, NullNodeMerger};
use treeway::tree::{MutableTree, SimpleTree, TraversableTree};

pub type TestTree = SimpleTree<String, String>;

/// Build a tree from the Lisp-like notation.
pub fn tree(expr: &str) -> TestTree {
    let canon = expr.replace('(', " ( ").replace(')', " ) ");
    let tokens: Vec<&str> = canon.split_whitespace().collect();
    let mut t = TestTree::new();
    let mut pos = 0;
    build(&tokens, &mut pos, None, &mut t);
    assert_eq!(pos, tokens.len(), "trailing tokens in tree expression {expr:?}");
    t
}

fn build(tokens: &[&str], pos: &mut usize, parent: Option<&String>, t: &mut TestTree) {
    let mut last_id: Option<String> = None;
    while *pos < tokens.len() {
        match tokens[*pos] {
            "(" => {
                *pos += 1;
                let pid = last_id.clone().expect("child list without a parent label");
                build(tokens, pos, Some(&pid), t);
            }
            ")" => {
                *pos += 1;
                return;
            }
            label => {
                let id = label
                    .chars()
                    .next()
                    .expect("empty label")
                    .to_lowercase()
                    .to_string();
                t.insert(label.to_owned(), id.clone(), parent, None)
                    .expect("malformed test tree");
                last_id = Some(id);
                *pos += 1;
            }
        }
    }
}

/// Render a tree back into the notation.
pub fn fmt(t: &TestTree) -> String {
    let mut out = String::new();
    if let Some(root) = t.root_id() {
        fmt_node(t, root, &mut out);
    }
    out
}

fn fmt_node(t: &TestTree, id: &String, out: &mut String) {
    out.push_str(t.content(id).expect("node without content"));
    let children = t.children(id);
    for (i, child) in children.iter().enumerate() {
        out.push_str(if i == 0 { " (" } else { " " });
        fmt_node(t, child, out);
    }
    if !children.is_empty() {
        out.push(')');
    }
}

/// Merge three notation trees with the default merger and handler, with the
/// emitted edit script replayed onto a copy of the base. A successful merge
/// whose script does not reproduce the merged tree panics.
pub fn try_merge(base: &str, first: &str, second: &str) -> Result<TestTree, MergeError<String>> {
    let tb = tree(base);
    let t1 = tree(first);
    let t2 = tree(second);
    let mut replay = ApplyEditHandler::new(tb.clone());
    let merged = merge(
        &tb,
        &t1,
        &t2,
        &NullNodeMerger::new(),
        &mut NullConflictHandler::new(),
        &mut replay,
    )?;
    let (replayed, err) = replay.finish();
    assert_eq!(err, None, "edit script failed to replay");
    assert_eq!(
        replayed, merged,
        "replaying the edit script did not reproduce the merged tree"
    );
    Ok(merged)
}

/// Assert a merge succeeds both ways around and produces `expected`.
pub fn assert_merges(base: &str, first: &str, second: &str, expected: &str) {
    let forward = try_merge(base, first, second)
        .unwrap_or_else(|e| panic!("unexpected conflict merging {first:?} + {second:?}: {e}"));
    let mirrored = try_merge(base, second, first)
        .unwrap_or_else(|e| panic!("unexpected conflict in mirrored merge: {e}"));
    assert_eq!(fmt(&forward), fmt(&mirrored), "merge failed symmetry");
    assert_eq!(fmt(&forward), expected, "merge incorrect");
}

/// Assert a merge conflicts both ways around.
pub fn assert_conflicts(base: &str, first: &str, second: &str) {
    let forward = try_merge(base, first, second);
    assert!(
        matches!(forward, Err(MergeError::Conflict(_))),
        "expected conflict, got {forward:?}"
    );
    let mirrored = try_merge(base, second, first);
    assert!(
        matches!(mirrored, Err(MergeError::Conflict(_))),
        "expected conflict in mirrored merge, got {mirrored:?}"
    );
}

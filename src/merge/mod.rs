//! Three-way tree merging.
//!
//! The pipeline per recursion frame: cursor-reconcile the three child
//! lists → merge each aligned node triple → validate deletes and inserts
//! against the whole lists → emit edit-script contributions → append to
//! the output tree → recurse. [`merge`] drives it; [`NodeMerger`] and
//! [`ConflictHandler`] are the pluggable policy seams.
//!
//! The same inputs always produce the same merged tree: the walk order is
//! the child-list order of the inputs, and nothing here consults a clock,
//! hash order, or randomness.

mod checks;
mod content;
mod cursor;
mod handler;
mod merger;

pub use content::{NodeMerger, NullNodeMerger};
pub use cursor::{ChildCursor, Slot};
pub use handler::{ConflictHandler, NullConflictHandler};
pub use merger::{merge, merge_default};

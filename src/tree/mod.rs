//! Node Tree Traversal
//!
//! Read-only walks over any `NodeStore`: digest members of a node, ancestor
//! paths, and whole-subtree orders used for bulk hashing and inspection.

pub mod walker;

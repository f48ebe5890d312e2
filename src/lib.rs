//! treehash: Incrementally Maintained Structural Digests
//!
//! A versioned store of XML-like node trees in which every node carries a
//! digest of the subtree it roots. Digests are kept consistent on every
//! mutation by touching only the mutated node and its ancestor path, using
//! one of two strategies fixed per resource: an order-insensitive rolling sum
//! or an order-sensitive postorder fold.

pub mod access;
pub mod cli;
pub mod config;
pub mod error;
pub mod hash;
pub mod logging;
pub mod store;
pub mod tree;
pub mod types;

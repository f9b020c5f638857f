//! Internal utilities shared across the crate.
//!
//! - [`BitSet`] - Growable bit vector
//! - [`escape_dot`] - Escaping for Graphviz labels
//! - [`graph`] - Graph traits and traversal algorithms

mod bitset;
mod dot;
pub mod graph;

pub use bitset::{BitSet, BitSetIter};
pub use dot::escape_dot;

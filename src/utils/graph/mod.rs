//! Graph abstractions shared by graph algorithms.
//!
//! Algorithms in [`algorithms`] are written against the small traits defined here
//! rather than against a concrete graph type, so that the control flow graph can use
//! them directly on its own block storage.
//!
//! # Key Components
//!
//! - [`GraphIndex`] - Dense, index-like node identifiers
//! - [`GraphBase`] - Node count of a graph
//! - [`Successors`] - Forward edge traversal
//! - [`algorithms`] - Breadth-first search, postorder and reverse postorder

pub mod algorithms;

/// A node identifier that maps to a dense index.
///
/// Algorithms use the index to keep per-node state in vectors instead of hash maps.
pub trait GraphIndex: Copy + Eq {
    /// The dense 0-based index of this node.
    fn index(self) -> usize;
}

/// Core properties of a graph.
pub trait GraphBase {
    /// The node identifier type.
    type Node: GraphIndex;

    /// Upper bound (exclusive) on the indices of the graph's nodes.
    fn node_count(&self) -> usize;
}

/// Trait for graphs that support forward edge traversal.
pub trait Successors: GraphBase {
    /// Returns an iterator over the successor nodes of the given node.
    ///
    /// # Arguments
    ///
    /// * `node` - The node whose successors to iterate
    fn successors(&self, node: Self::Node) -> impl Iterator<Item = Self::Node>;
}

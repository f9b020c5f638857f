//! Graph algorithms for control flow analysis.
//!
//! # Available Algorithms
//!
//! ## Traversal
//!
//! - [`bfs`] - Breadth-first search traversal
//! - [`reverse_postorder`] - Reverse postorder traversal (useful for data flow)
//! - [`postorder`] - Postorder traversal
//!
//! | Algorithm | Time Complexity | Use Case |
//! |-----------|-----------------|----------|
//! | BFS | O(V + E) | Reachability, stable block listing |
//! | Postorder / RPO | O(V + E) | Depth-first block ordering |

mod traversal;

pub use traversal::{bfs, postorder, reverse_postorder};

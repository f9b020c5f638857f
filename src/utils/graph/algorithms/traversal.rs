//! Graph traversal algorithms.
//!
//! This module provides breadth-first and depth-first traversal algorithms
//! for directed graphs.
//!
//! # Algorithms
//!
//! - [`bfs`] - Breadth-first search
//! - [`postorder`] - Depth-first search with post-order visitation
//! - [`reverse_postorder`] - Reverse post-order (useful for forward data flow)
//!
//! # Iteration vs Collection
//!
//! The [`bfs`] function returns an iterator for lazy evaluation, avoiding unnecessary
//! allocations when only partial traversal is needed. The [`postorder`] and
//! [`reverse_postorder`] functions return collected vectors since the order requires
//! full traversal anyway.

use std::collections::VecDeque;

use crate::utils::graph::{GraphIndex, Successors};

/// Breadth-first search iterator over graph nodes.
///
/// This iterator performs a breadth-first traversal starting from a given node.
/// It visits each reachable node exactly once, exploring all nodes at distance d
/// before visiting any node at distance d+1.
///
/// # Type Parameters
///
/// * `'g` - Lifetime of the graph reference
/// * `G` - Graph type implementing [`Successors`]
pub struct BfsIterator<'g, G: Successors> {
    graph: &'g G,
    queue: VecDeque<G::Node>,
    visited: Vec<bool>,
}

impl<'g, G: Successors> BfsIterator<'g, G> {
    fn new(graph: &'g G, start: G::Node) -> Self {
        let node_count = graph.node_count();
        if start.index() >= node_count {
            return BfsIterator {
                graph,
                queue: VecDeque::new(),
                visited: Vec::new(),
            };
        }

        let mut visited = vec![false; node_count];
        visited[start.index()] = true;

        let mut queue = VecDeque::new();
        queue.push_back(start);

        BfsIterator {
            graph,
            queue,
            visited,
        }
    }
}

impl<G: Successors> Iterator for BfsIterator<'_, G> {
    type Item = G::Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.queue.pop_front()?;
        if self.visited.is_empty() {
            return None;
        }

        // Enqueue unvisited successors
        for succ in self.graph.successors(node) {
            if succ.index() < self.visited.len() && !self.visited[succ.index()] {
                self.visited[succ.index()] = true;
                self.queue.push_back(succ);
            }
        }

        Some(node)
    }
}

/// Returns a breadth-first search iterator starting from the given node.
///
/// The iterator visits each reachable node exactly once, exploring nodes
/// in order of increasing distance from the start.
///
/// # Arguments
///
/// * `graph` - The graph to traverse
/// * `start` - The starting node for traversal
///
/// # Complexity
///
/// - Time: O(V + E) where V is the number of vertices and E is the number of edges
/// - Space: O(V) for the visited set and queue
pub fn bfs<G: Successors>(graph: &G, start: G::Node) -> BfsIterator<'_, G> {
    BfsIterator::new(graph, start)
}

/// Computes the postorder traversal of nodes reachable from the start.
///
/// In postorder, a node is visited after all its descendants have been visited.
///
/// # Arguments
///
/// * `graph` - The graph to traverse
/// * `start` - The starting node for traversal
///
/// # Returns
///
/// A vector of nodes in postorder.
#[allow(clippy::items_after_statements)]
pub fn postorder<G: Successors>(graph: &G, start: G::Node) -> Vec<G::Node> {
    let node_count = graph.node_count();

    // Validate start node - return empty vec if invalid
    if start.index() >= node_count {
        return Vec::new();
    }

    let mut visited = vec![false; node_count];
    let mut result = Vec::with_capacity(node_count);

    // Iterative postorder using explicit stack with state
    #[derive(Clone, Copy)]
    enum State {
        Enter,
        Exit,
    }

    let mut stack = vec![(start, State::Enter)];

    while let Some((node, state)) = stack.pop() {
        match state {
            State::Enter => {
                if visited[node.index()] {
                    continue;
                }
                visited[node.index()] = true;

                // Push exit state for this node (will be processed after children)
                stack.push((node, State::Exit));

                // Push children in reverse order so they're processed in order
                let successors: Vec<G::Node> = graph.successors(node).collect();
                for &succ in successors.iter().rev() {
                    if succ.index() < node_count && !visited[succ.index()] {
                        stack.push((succ, State::Enter));
                    }
                }
            }
            State::Exit => {
                result.push(node);
            }
        }
    }

    result
}

/// Computes the reverse postorder traversal of nodes reachable from the start.
///
/// Reverse postorder (RPO) is the reverse of postorder: nodes are visited
/// such that a node comes before any of its successors (in a DAG). This is
/// the preferred iteration order for forward data flow analysis.
///
/// # Arguments
///
/// * `graph` - The graph to traverse
/// * `start` - The starting node for traversal
pub fn reverse_postorder<G: Successors>(graph: &G, start: G::Node) -> Vec<G::Node> {
    let mut result = postorder(graph, start);
    result.reverse();
    result
}

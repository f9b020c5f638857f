//! Control Flow Graph implementation.
//!
//! This module provides the main [`ControlFlowGraph`] structure: the blocks of one body,
//! the operation nodes they hold, and the lookup tables that relate input trees to the
//! operations generated for them.

use std::fmt::{self, Write};

use rustc_hash::FxHashMap;

use crate::{
    analysis::cfg::{
        builder::phase_three, Block, BlockId, BlockKind, CfgEdge, CfgEdgeKind, Node, NodeArena,
        NodeId,
    },
    ast::{ClassDecl, LambdaExpr, TreeId, UnderlyingAst},
    utils::{
        escape_dot,
        graph::{algorithms, GraphBase, Successors},
        BitSet,
    },
    Error::GraphError,
    Result,
};

/// Maps from input trees to the operation nodes generated for them.
#[derive(Debug, Clone, Default)]
pub(crate) struct TreeLookups {
    /// Nodes generated for a tree, before implicit conversions.
    pub(crate) unconverted: FxHashMap<TreeId, Vec<NodeId>>,
    /// Conversion nodes applied to the value of a tree.
    pub(crate) converted: FxHashMap<TreeId, Vec<NodeId>>,
    /// The assignment generated for an increment or decrement.
    pub(crate) unary_assign: FxHashMap<TreeId, NodeId>,
}

/// A control flow graph over the body selected by an [`UnderlyingAst`].
///
/// The graph is created by [`crate::CfgBuilder`]. It has exactly one entry block and two
/// exit blocks (regular and exceptional), all of them [`BlockKind::Special`]. Blocks are
/// addressed by [`BlockId`]; blocks removed during simplification keep their id but are no
/// longer returned by [`ControlFlowGraph::block`].
///
/// # Lifetime
///
/// The graph borrows the declarations it reports through
/// [`ControlFlowGraph::declared_classes`], [`ControlFlowGraph::declared_lambdas`] and
/// [`ControlFlowGraph::underlying`] from the input tree.
///
/// # Examples
///
/// ```rust,ignore
/// use flowscope::prelude::*;
///
/// let cfg = CfgBuilder::new(&hierarchy).build(UnderlyingAst::method(&method, &class))?;
///
/// for block_id in cfg.depth_first_ordered_blocks() {
///     for node_id in cfg.block(block_id).unwrap().nodes() {
///         println!("{}", cfg.nodes().describe(*node_id));
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ControlFlowGraph<'ast> {
    pub(crate) blocks: Vec<Block>,
    pub(crate) removed: BitSet,
    pub(crate) entry: BlockId,
    pub(crate) exit: BlockId,
    pub(crate) exceptional_exit: BlockId,
    pub(crate) nodes: NodeArena,
    pub(crate) node_blocks: Vec<Option<BlockId>>,
    pub(crate) lookups: TreeLookups,
    pub(crate) return_nodes: Vec<NodeId>,
    pub(crate) declared_classes: Vec<&'ast ClassDecl>,
    pub(crate) declared_lambdas: Vec<&'ast LambdaExpr>,
    pub(crate) underlying: UnderlyingAst<'ast>,
}

impl<'ast> ControlFlowGraph<'ast> {
    /// Returns the entry block.
    #[must_use]
    pub const fn entry(&self) -> BlockId {
        self.entry
    }

    /// Returns the regular exit block.
    #[must_use]
    pub const fn exit(&self) -> BlockId {
        self.exit
    }

    /// Returns the exceptional exit block.
    #[must_use]
    pub const fn exceptional_exit(&self) -> BlockId {
        self.exceptional_exit
    }

    /// Returns the block with the given id, or `None` if it does not exist or was removed.
    #[must_use]
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        if self.removed.contains(id.index()) {
            return None;
        }
        self.blocks.get(id.index())
    }

    pub(crate) fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        if self.removed.contains(id.index()) {
            return None;
        }
        self.blocks.get_mut(id.index())
    }

    /// Number of blocks that have not been removed, including unreachable ones.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len() - self.removed.count()
    }

    /// All blocks reachable from the entry, in breadth-first order.
    #[must_use]
    pub fn blocks(&self) -> Vec<BlockId> {
        algorithms::bfs(self, self.entry).collect()
    }

    /// All blocks reachable from the entry, in reverse postorder of a depth-first search.
    #[must_use]
    pub fn depth_first_ordered_blocks(&self) -> Vec<BlockId> {
        algorithms::reverse_postorder(self, self.entry)
    }

    /// Distinct successors of a block.
    #[must_use]
    pub fn successors(&self, id: BlockId) -> Vec<BlockId> {
        self.block(id).map(Block::successors).unwrap_or_default()
    }

    /// Predecessors of a block.
    pub fn predecessors(&self, id: BlockId) -> impl Iterator<Item = BlockId> + '_ {
        self.block(id)
            .into_iter()
            .flat_map(|block| block.predecessors().iter().copied())
    }

    /// Outgoing edges of a block, with their kinds.
    #[must_use]
    pub fn outgoing_edges(&self, id: BlockId) -> Vec<CfgEdge> {
        self.block(id).map(Block::outgoing_edges).unwrap_or_default()
    }

    /// The arena holding all operation nodes.
    #[must_use]
    pub const fn nodes(&self) -> &NodeArena {
        &self.nodes
    }

    /// Returns the operation node with the given id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// The block containing a node, or `None` if the node is unreachable.
    #[must_use]
    pub fn block_of(&self, node: NodeId) -> Option<BlockId> {
        self.node_blocks.get(node.index()).copied().flatten()
    }

    /// The nodes representing the value of a tree, after implicit conversions.
    ///
    /// If the value of the tree was converted (e.g. unboxed), the conversion nodes are
    /// returned; otherwise the nodes generated for the tree itself. A tree translated more
    /// than once, as happens for finally blocks, maps to several nodes.
    #[must_use]
    pub fn nodes_for_tree(&self, tree: TreeId) -> Option<&[NodeId]> {
        self.lookups
            .converted
            .get(&tree)
            .or_else(|| self.lookups.unconverted.get(&tree))
            .map(Vec::as_slice)
    }

    /// The nodes generated for a tree itself, ignoring conversions.
    #[must_use]
    pub fn unconverted_nodes_for_tree(&self, tree: TreeId) -> Option<&[NodeId]> {
        self.lookups.unconverted.get(&tree).map(Vec::as_slice)
    }

    /// The assignment node synthesized for an increment or decrement tree.
    #[must_use]
    pub fn unary_assign_node(&self, tree: TreeId) -> Option<NodeId> {
        self.lookups.unary_assign.get(&tree).copied()
    }

    /// All `return` nodes, in the order they were generated.
    #[must_use]
    pub fn return_nodes(&self) -> &[NodeId] {
        &self.return_nodes
    }

    /// Local and anonymous classes declared in the body.
    #[must_use]
    pub fn declared_classes(&self) -> &[&'ast ClassDecl] {
        &self.declared_classes
    }

    /// Lambdas declared in the body.
    #[must_use]
    pub fn declared_lambdas(&self) -> &[&'ast LambdaExpr] {
        &self.declared_lambdas
    }

    /// The body this graph was built for.
    #[must_use]
    pub const fn underlying(&self) -> &UnderlyingAst<'ast> {
        &self.underlying
    }

    /// Removes empty blocks and merges straight-line chains of regular blocks.
    ///
    /// [`crate::CfgBuilder::build`] already does this unless simplification was disabled.
    /// Simplifying an already simplified graph changes nothing.
    pub fn simplify(&mut self) {
        phase_three::simplify(self);
    }

    /// Verifies the structural invariants of the graph.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::GraphError`] if
    /// - the entry is not a special entry block with exactly one successor,
    /// - an exit block has a successor,
    /// - an edge targets a removed block, or is missing from the target's predecessors,
    /// - a predecessor entry has no matching edge,
    /// - a reachable regular or conditional block lacks an outgoing edge,
    /// - the node-to-block map disagrees with the blocks' contents.
    pub fn check_invariants(&self) -> Result<()> {
        let entry = self
            .block(self.entry)
            .ok_or_else(|| GraphError("entry block is missing".to_string()))?;
        if !matches!(entry.kind(), BlockKind::Special { .. }) || entry.successors().len() != 1 {
            return Err(GraphError(format!(
                "entry block {} must be special with exactly one successor",
                self.entry
            )));
        }

        for exit in [self.exit, self.exceptional_exit] {
            let block = self
                .block(exit)
                .ok_or_else(|| GraphError(format!("exit block {exit} is missing")))?;
            if !block.outgoing_edges().is_empty() {
                return Err(GraphError(format!("exit block {exit} has successors")));
            }
        }

        for (index, block) in self.blocks.iter().enumerate() {
            if self.removed.contains(index) {
                continue;
            }
            let id = BlockId::from_index(index)
                .ok_or_else(|| GraphError(format!("block index {index} exceeds the id range")))?;

            for succ in block.successors() {
                let target = self.block(succ).ok_or_else(|| {
                    GraphError(format!("{id} has an edge to removed block {succ}"))
                })?;
                if !target.predecessors().contains(&id) {
                    return Err(GraphError(format!(
                        "{succ} does not list its predecessor {id}"
                    )));
                }
            }

            for &pred in block.predecessors() {
                let source = self
                    .block(pred)
                    .ok_or_else(|| GraphError(format!("{id} lists removed predecessor {pred}")))?;
                if !source.has_successor(id) {
                    return Err(GraphError(format!(
                        "{id} lists {pred} as predecessor without an edge"
                    )));
                }
            }

            for &node in block.nodes() {
                if self.block_of(node) != Some(id) {
                    return Err(GraphError(format!(
                        "{node} is held by {id} but mapped to {:?}",
                        self.block_of(node)
                    )));
                }
            }
        }

        for id in self.blocks() {
            let Some(block) = self.block(id) else {
                continue;
            };
            let complete = match block.kind() {
                BlockKind::Regular { successor, .. } => successor.is_some(),
                BlockKind::Conditional { then, else_ } => then.is_some() && else_.is_some(),
                BlockKind::Exception {
                    successor,
                    exceptional,
                    ..
                } => successor.is_some() || !exceptional.is_empty(),
                BlockKind::Special { .. } => true,
            };
            if !complete {
                return Err(GraphError(format!("reachable block {id} lacks an outgoing edge")));
            }
        }

        for (index, mapped) in self.node_blocks.iter().enumerate() {
            if let Some(block) = mapped {
                let holds = self
                    .block(*block)
                    .is_some_and(|b| b.nodes().iter().any(|n| n.index() == index));
                if !holds {
                    return Err(GraphError(format!(
                        "n{index} is mapped to {block} which does not hold it"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Generates a DOT representation of the CFG for visualization.
    ///
    /// The output can be rendered using Graphviz tools like `dot`:
    /// ```bash
    /// dot -Tpng cfg.dot -o cfg.png
    /// ```
    ///
    /// # Arguments
    ///
    /// * `title` - Optional title for the graph
    ///
    /// # Returns
    ///
    /// A string containing the DOT representation of the reachable part of the graph.
    #[must_use]
    pub fn to_dot(&self, title: Option<&str>) -> String {
        let mut dot = String::new();

        dot.push_str("digraph CFG {\n");
        if let Some(name) = title {
            let _ = writeln!(dot, "    label=\"CFG: {}\";", escape_dot(name));
        }
        dot.push_str("    labelloc=t;\n");
        dot.push_str("    node [shape=box, fontname=\"Courier\", fontsize=10];\n");
        dot.push_str("    edge [fontname=\"Courier\", fontsize=9];\n\n");

        let reachable = self.depth_first_ordered_blocks();

        // Generate nodes
        for &id in &reachable {
            let Some(block) = self.block(id) else {
                continue;
            };

            let mut label = format!("{id} ({})", block.kind_name());
            label.push_str("\\l"); // Left-align with newline
            for &node in block.nodes() {
                label.push_str(&escape_dot(&self.nodes.describe(node)));
                label.push_str("\\l");
            }

            let style = if id == self.entry {
                ", style=filled, fillcolor=lightgreen"
            } else if id == self.exit || id == self.exceptional_exit {
                ", style=filled, fillcolor=lightcoral"
            } else if matches!(block.kind(), BlockKind::Conditional { .. }) {
                ", shape=diamond"
            } else {
                ""
            };

            let _ = writeln!(dot, "    {id} [label=\"{label}\"{style}];");
        }

        dot.push('\n');

        // Generate edges
        for &id in &reachable {
            for edge in self.outgoing_edges(id) {
                let (edge_label, color) = match edge.kind() {
                    CfgEdgeKind::Regular => (String::new(), "black"),
                    CfgEdgeKind::Then => ("true".to_string(), "green"),
                    CfgEdgeKind::Else => ("false".to_string(), "red"),
                    CfgEdgeKind::Exceptional { cause } => (cause.to_string(), "purple"),
                };

                let _ = writeln!(
                    dot,
                    "    {id} -> {} [label=\"{}\", color={color}];",
                    edge.target(),
                    escape_dot(&edge_label)
                );
            }
        }

        dot.push_str("}\n");
        dot
    }
}

impl GraphBase for ControlFlowGraph<'_> {
    type Node = BlockId;

    fn node_count(&self) -> usize {
        self.blocks.len()
    }
}

impl Successors for ControlFlowGraph<'_> {
    fn successors(&self, node: BlockId) -> impl Iterator<Item = BlockId> {
        ControlFlowGraph::successors(self, node).into_iter()
    }
}

impl fmt::Display for ControlFlowGraph<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CFG for {}", self.underlying.describe())?;
        for id in self.depth_first_ordered_blocks() {
            let Some(block) = self.block(id) else {
                continue;
            };

            let preds: Vec<String> = block.predecessors().iter().map(ToString::to_string).collect();
            writeln!(f, "{id} {} preds=[{}]", block.kind_name(), preds.join(", "))?;
            for &node in block.nodes() {
                writeln!(f, "    {}", self.nodes.describe(node))?;
            }
            for edge in block.outgoing_edges() {
                match edge.kind() {
                    CfgEdgeKind::Regular => writeln!(f, "    -> {}", edge.target())?,
                    CfgEdgeKind::Then => writeln!(f, "    then -> {}", edge.target())?,
                    CfgEdgeKind::Else => writeln!(f, "    else -> {}", edge.target())?,
                    CfgEdgeKind::Exceptional { cause } => {
                        writeln!(f, "    {cause} -> {}", edge.target())?;
                    }
                }
            }
        }
        Ok(())
    }
}

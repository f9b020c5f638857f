//! Basic blocks.
//!
//! A graph is made of four kinds of blocks:
//!
//! - **Regular** blocks hold a straight-line run of operations and have at most one
//!   successor.
//! - **Conditional** blocks hold no operation. They branch on the boolean value computed
//!   by the last operation of their (single) predecessor.
//! - **Exception** blocks hold exactly one operation that may throw. They have a normal
//!   successor, unless the operation never completes normally, and one set of handler
//!   targets per exception type.
//! - **Special** blocks are the sentinels: the entry, the regular exit and the
//!   exceptional exit. Only the entry has a successor.
//!
//! Every block records its predecessors. After each construction phase the predecessor
//! sets are the exact inverse of the successor edges.

use std::{collections::BTreeSet, fmt};

use strum::{Display, IntoStaticStr};

use crate::{
    analysis::cfg::{CfgEdge, CfgEdgeKind, NodeId},
    types::Type,
    utils::graph::GraphIndex,
};

/// Identifier of a [`Block`] within its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub(crate) u32);

impl BlockId {
    /// The dense index of this block in its graph.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The id of the block stored at `index`, or `None` past the id range.
    pub(crate) fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(BlockId)
    }
}

impl GraphIndex for BlockId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// The three sentinel blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum SpecialBlockKind {
    /// The unique entry of the body.
    Entry,
    /// Reached when the body completes normally.
    Exit,
    /// Reached when the body completes by throwing.
    ExceptionalExit,
}

/// The shape of a block and its outgoing edges.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    /// A straight-line run of operations.
    Regular {
        /// Operations in execution order.
        nodes: Vec<NodeId>,
        /// The single successor.
        successor: Option<BlockId>,
    },
    /// A two-way branch on the preceding operation's boolean value.
    Conditional {
        /// Target if the value is `true`.
        then: Option<BlockId>,
        /// Target if the value is `false`.
        else_: Option<BlockId>,
    },
    /// A single operation that may throw.
    Exception {
        /// The operation.
        node: NodeId,
        /// Target on normal completion; `None` if the operation never completes normally.
        successor: Option<BlockId>,
        /// Handler targets per exception type, in the order the causes were recorded.
        exceptional: Vec<(Type, Vec<BlockId>)>,
    },
    /// A sentinel block.
    Special {
        /// Which sentinel.
        kind: SpecialBlockKind,
        /// Successor of the entry block; always `None` for the exits.
        successor: Option<BlockId>,
    },
}

/// A basic block together with its predecessor set.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    kind: BlockKind,
    predecessors: BTreeSet<BlockId>,
}

impl Block {
    pub(crate) fn regular() -> Self {
        Self::with_kind(BlockKind::Regular {
            nodes: Vec::new(),
            successor: None,
        })
    }

    pub(crate) fn conditional() -> Self {
        Self::with_kind(BlockKind::Conditional {
            then: None,
            else_: None,
        })
    }

    pub(crate) fn exception(node: NodeId) -> Self {
        Self::with_kind(BlockKind::Exception {
            node,
            successor: None,
            exceptional: Vec::new(),
        })
    }

    pub(crate) fn special(kind: SpecialBlockKind) -> Self {
        Self::with_kind(BlockKind::Special {
            kind,
            successor: None,
        })
    }

    fn with_kind(kind: BlockKind) -> Self {
        Block {
            kind,
            predecessors: BTreeSet::new(),
        }
    }

    /// The shape of this block.
    #[must_use]
    pub const fn kind(&self) -> &BlockKind {
        &self.kind
    }

    /// Short name of the block kind.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match &self.kind {
            BlockKind::Regular { .. } => "Regular",
            BlockKind::Conditional { .. } => "Conditional",
            BlockKind::Exception { .. } => "Exception",
            BlockKind::Special { kind, .. } => match kind {
                SpecialBlockKind::Entry => "Entry",
                SpecialBlockKind::Exit => "Exit",
                SpecialBlockKind::ExceptionalExit => "ExceptionalExit",
            },
        }
    }

    /// The operations held by this block: all of them for a regular block, the single one
    /// for an exception block, none otherwise.
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        match &self.kind {
            BlockKind::Regular { nodes, .. } => nodes,
            BlockKind::Exception { node, .. } => std::slice::from_ref(node),
            _ => &[],
        }
    }

    /// The blocks with an edge into this block.
    #[must_use]
    pub const fn predecessors(&self) -> &BTreeSet<BlockId> {
        &self.predecessors
    }

    /// Returns `true` for regular blocks.
    #[must_use]
    pub const fn is_regular(&self) -> bool {
        matches!(self.kind, BlockKind::Regular { .. })
    }

    /// Returns `true` for regular blocks without operations.
    #[must_use]
    pub fn is_empty_regular(&self) -> bool {
        matches!(&self.kind, BlockKind::Regular { nodes, .. } if nodes.is_empty())
    }

    /// Returns `true` for sentinel blocks.
    #[must_use]
    pub const fn is_special(&self) -> bool {
        matches!(self.kind, BlockKind::Special { .. })
    }

    /// The kind of sentinel, if this is one.
    #[must_use]
    pub const fn special_kind(&self) -> Option<SpecialBlockKind> {
        match self.kind {
            BlockKind::Special { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// The unconditional successor of a regular, exception or entry block.
    #[must_use]
    pub const fn successor(&self) -> Option<BlockId> {
        match self.kind {
            BlockKind::Regular { successor, .. }
            | BlockKind::Exception { successor, .. }
            | BlockKind::Special { successor, .. } => successor,
            BlockKind::Conditional { .. } => None,
        }
    }

    /// All outgoing edges, normal ones first.
    #[must_use]
    pub fn outgoing_edges(&self) -> Vec<CfgEdge> {
        let mut edges = Vec::new();
        match &self.kind {
            BlockKind::Regular { successor, .. } | BlockKind::Special { successor, .. } => {
                edges.extend(successor.map(CfgEdge::regular));
            }
            BlockKind::Conditional { then, else_ } => {
                edges.extend(then.map(CfgEdge::then));
                edges.extend(else_.map(CfgEdge::else_));
            }
            BlockKind::Exception {
                successor,
                exceptional,
                ..
            } => {
                edges.extend(successor.map(CfgEdge::regular));
                for (cause, targets) in exceptional {
                    for target in targets {
                        edges.push(CfgEdge::exceptional(*target, cause.clone()));
                    }
                }
            }
        }
        edges
    }

    /// Distinct successor blocks in edge order.
    #[must_use]
    pub fn successors(&self) -> Vec<BlockId> {
        let mut seen = Vec::new();
        for edge in self.outgoing_edges() {
            if !seen.contains(&edge.target()) {
                seen.push(edge.target());
            }
        }
        seen
    }

    /// Points the edge slot `slot` at `target`.
    ///
    /// For an exceptional slot the target is added to the cause's handler set. Returns
    /// `false` if this block has no such slot.
    pub(crate) fn set_edge(&mut self, slot: &CfgEdgeKind, target: BlockId) -> bool {
        match (&mut self.kind, slot) {
            (
                BlockKind::Regular { successor, .. }
                | BlockKind::Exception { successor, .. }
                | BlockKind::Special { successor, .. },
                CfgEdgeKind::Regular,
            ) => {
                *successor = Some(target);
                true
            }
            (BlockKind::Conditional { then, .. }, CfgEdgeKind::Then) => {
                *then = Some(target);
                true
            }
            (BlockKind::Conditional { else_, .. }, CfgEdgeKind::Else) => {
                *else_ = Some(target);
                true
            }
            (BlockKind::Exception { exceptional, .. }, CfgEdgeKind::Exceptional { cause }) => {
                match exceptional.iter_mut().find(|(c, _)| c == cause) {
                    Some((_, targets)) => {
                        if !targets.contains(&target) {
                            targets.push(target);
                        }
                    }
                    None => exceptional.push((cause.clone(), vec![target])),
                }
                true
            }
            _ => false,
        }
    }

    /// Replaces `old` by `new` in the edge slot `slot`.
    ///
    /// Returns `false` if the slot did not point at `old`.
    pub(crate) fn redirect_edge(&mut self, slot: &CfgEdgeKind, old: BlockId, new: BlockId) -> bool {
        match (&mut self.kind, slot) {
            (
                BlockKind::Regular { successor, .. }
                | BlockKind::Exception { successor, .. }
                | BlockKind::Special { successor, .. },
                CfgEdgeKind::Regular,
            )
            | (BlockKind::Conditional { then: successor, .. }, CfgEdgeKind::Then)
            | (BlockKind::Conditional { else_: successor, .. }, CfgEdgeKind::Else) => {
                if *successor == Some(old) {
                    *successor = Some(new);
                    true
                } else {
                    false
                }
            }
            (BlockKind::Exception { exceptional, .. }, CfgEdgeKind::Exceptional { cause }) => {
                let Some((_, targets)) = exceptional.iter_mut().find(|(c, _)| c == cause) else {
                    return false;
                };
                let Some(pos) = targets.iter().position(|t| *t == old) else {
                    return false;
                };
                if targets.contains(&new) {
                    targets.remove(pos);
                } else {
                    targets[pos] = new;
                }
                true
            }
            _ => false,
        }
    }

    /// Returns `true` if any outgoing edge of this block targets `target`.
    #[must_use]
    pub fn has_successor(&self, target: BlockId) -> bool {
        self.outgoing_edges().iter().any(|e| e.target() == target)
    }

    pub(crate) fn push_node(&mut self, node: NodeId) -> bool {
        match &mut self.kind {
            BlockKind::Regular { nodes, .. } => {
                nodes.push(node);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn take_nodes(&mut self) -> Vec<NodeId> {
        match &mut self.kind {
            BlockKind::Regular { nodes, .. } => std::mem::take(nodes),
            _ => Vec::new(),
        }
    }

    pub(crate) fn add_predecessor(&mut self, pred: BlockId) {
        self.predecessors.insert(pred);
    }

    pub(crate) fn remove_predecessor(&mut self, pred: BlockId) {
        self.predecessors.remove(&pred);
    }

    pub(crate) fn clear_predecessors(&mut self) {
        self.predecessors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_id_from_index() {
        assert_eq!(BlockId::from_index(7), Some(BlockId(7)));
        assert_eq!(BlockId::from_index(u32::MAX as usize), Some(BlockId(u32::MAX)));
        #[cfg(target_pointer_width = "64")]
        assert_eq!(BlockId::from_index(u32::MAX as usize + 1), None);
        assert_eq!(NodeId::from_index(3), Some(NodeId(3)));
    }

    #[test]
    fn test_regular_block_edges() {
        let mut block = Block::regular();
        assert!(block.is_empty_regular());
        assert!(block.outgoing_edges().is_empty());

        assert!(block.set_edge(&CfgEdgeKind::Regular, BlockId(3)));
        assert!(!block.set_edge(&CfgEdgeKind::Then, BlockId(3)));
        assert_eq!(block.successor(), Some(BlockId(3)));

        assert!(block.push_node(NodeId(0)));
        assert!(!block.is_empty_regular());
        assert_eq!(block.nodes(), &[NodeId(0)]);
    }

    #[test]
    fn test_conditional_redirect() {
        let mut block = Block::conditional();
        block.set_edge(&CfgEdgeKind::Then, BlockId(1));
        block.set_edge(&CfgEdgeKind::Else, BlockId(1));

        assert!(block.redirect_edge(&CfgEdgeKind::Else, BlockId(1), BlockId(2)));
        assert!(!block.redirect_edge(&CfgEdgeKind::Else, BlockId(1), BlockId(2)));
        assert_eq!(
            block.kind(),
            &BlockKind::Conditional {
                then: Some(BlockId(1)),
                else_: Some(BlockId(2)),
            }
        );
        assert_eq!(block.successors(), vec![BlockId(1), BlockId(2)]);
    }

    #[test]
    fn test_exceptional_redirect_replaces_target() {
        let npe = Type::class("java.lang.NullPointerException");
        let slot = CfgEdgeKind::Exceptional { cause: npe.clone() };

        let mut block = Block::exception(NodeId(7));
        block.set_edge(&CfgEdgeKind::Regular, BlockId(1));
        block.set_edge(&slot, BlockId(2));
        block.set_edge(&slot, BlockId(3));
        block.set_edge(&slot, BlockId(3));

        assert_eq!(block.nodes(), &[NodeId(7)]);
        assert_eq!(block.outgoing_edges().len(), 3);

        assert!(block.redirect_edge(&slot, BlockId(2), BlockId(5)));
        // Redirecting onto an existing target merges both edges.
        assert!(block.redirect_edge(&slot, BlockId(5), BlockId(3)));
        assert_eq!(
            block.kind(),
            &BlockKind::Exception {
                node: NodeId(7),
                successor: Some(BlockId(1)),
                exceptional: vec![(npe, vec![BlockId(3)])],
            }
        );
    }

    #[test]
    fn test_special_block() {
        let exit = Block::special(SpecialBlockKind::Exit);
        assert!(exit.is_special());
        assert_eq!(exit.special_kind(), Some(SpecialBlockKind::Exit));
        assert_eq!(exit.kind_name(), "Exit");
        assert!(exit.nodes().is_empty());
    }
}

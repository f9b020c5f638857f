//! Block assembly.
//!
//! Walks the extended node sequence once and partitions it into basic blocks. Edges whose
//! target is not known yet (a label, or the block of a later position) are collected as
//! missing edges and resolved after the walk, when every position has its block.

use log::debug;

use crate::{
    analysis::cfg::{
        builder::{ExtendedKind, Label, PhaseOneResult},
        Block, BlockId, CfgEdgeKind, ControlFlowGraph, SpecialBlockKind,
    },
    utils::BitSet,
    Error, Result,
};

/// Where a missing edge points.
#[derive(Debug)]
enum Target {
    /// The block holding the element at this sequence position.
    Index(usize),
    /// The block holding the element a label is bound to.
    Label(Label),
}

/// An edge recorded during the walk and wired once all blocks exist.
#[derive(Debug)]
struct MissingEdge {
    source: BlockId,
    slot: CfgEdgeKind,
    target: Target,
}

#[derive(Debug, Default)]
struct Assembler {
    blocks: Vec<Block>,
    missing: Vec<MissingEdge>,
    /// The regular block still accepting nodes.
    current: Option<BlockId>,
}

impl Assembler {
    fn add(&mut self, block: Block) -> BlockId {
        let id = BlockId::from_index(self.blocks.len()).unwrap_or(BlockId(u32::MAX));
        self.blocks.push(block);
        id
    }

    fn current_or_new(&mut self) -> BlockId {
        if let Some(current) = self.current {
            return current;
        }
        let id = self.add(Block::regular());
        self.current = Some(id);
        id
    }

    fn missing(&mut self, source: BlockId, slot: CfgEdgeKind, target: Target) {
        self.missing.push(MissingEdge {
            source,
            slot,
            target,
        });
    }

    fn connect(&mut self, source: BlockId, slot: &CfgEdgeKind, target: BlockId) -> Result<()> {
        let wired = self
            .blocks
            .get_mut(source.index())
            .is_some_and(|block| block.set_edge(slot, target));
        if !wired {
            return Err(internal_error!("{source} has no {slot:?} edge slot"));
        }
        self.blocks
            .get_mut(target.index())
            .ok_or_else(|| internal_error!("edge from {source} to unknown block {target}"))?
            .add_predecessor(source);
        Ok(())
    }
}

/// Partitions the linearized body into blocks and resolves every jump into an edge.
pub(super) fn assemble(linear: PhaseOneResult<'_>) -> Result<ControlFlowGraph<'_>> {
    let PhaseOneResult {
        underlying,
        mut sequence,
        bindings,
        leaders,
        regular_exit,
        exceptional_exit,
        nodes,
        lookups,
        return_nodes,
        declared_classes,
        declared_lambdas,
    } = linear;

    let mut asm = Assembler::default();
    let entry = asm.add(Block::special(SpecialBlockKind::Entry));
    let exit = asm.add(Block::special(SpecialBlockKind::Exit));
    let exceptional = asm.add(Block::special(SpecialBlockKind::ExceptionalExit));
    asm.missing(entry, CfgEdgeKind::Regular, Target::Index(0));

    let mut node_blocks = vec![None; nodes.len()];

    for (index, element) in sequence.iter_mut().enumerate() {
        if leaders.contains(index) {
            if let Some(current) = asm.current.take() {
                asm.missing(current, CfgEdgeKind::Regular, Target::Index(index));
            }
        }

        match &element.kind {
            ExtendedKind::Node(node) => {
                let block = asm.current_or_new();
                asm.blocks[block.index()].push_node(*node);
                node_blocks[node.index()] = Some(block);
                element.block = Some(block);

                if element.terminates {
                    asm.connect(block, &CfgEdgeKind::Regular, exceptional)?;
                    asm.current = None;
                }
            }
            ExtendedKind::Jump(label) => {
                let block = asm.current_or_new();
                element.block = Some(block);
                asm.missing(block, CfgEdgeKind::Regular, Target::Label(label.clone()));
                asm.current = None;
            }
            ExtendedKind::ConditionalJump { then, else_, .. } => {
                let block = asm.current_or_new();
                element.block = Some(block);
                let conditional = asm.add(Block::conditional());
                asm.connect(block, &CfgEdgeKind::Regular, conditional)?;
                asm.missing(conditional, CfgEdgeKind::Then, Target::Label(then.clone()));
                asm.missing(conditional, CfgEdgeKind::Else, Target::Label(else_.clone()));
                asm.current = None;
            }
            ExtendedKind::Exception { node, causes } => {
                let block = asm.add(Block::exception(*node));
                node_blocks[node.index()] = Some(block);
                element.block = Some(block);

                if let Some(current) = asm.current.take() {
                    asm.connect(current, &CfgEdgeKind::Regular, block)?;
                }
                if !element.terminates {
                    asm.missing(block, CfgEdgeKind::Regular, Target::Index(index + 1));
                }
                for (cause, labels) in causes {
                    for label in labels {
                        asm.missing(
                            block,
                            CfgEdgeKind::Exceptional {
                                cause: cause.clone(),
                            },
                            Target::Label(label.clone()),
                        );
                    }
                }
            }
        }
    }
    if let Some(current) = asm.current.take() {
        asm.connect(current, &CfgEdgeKind::Regular, exit)?;
    }

    let block_at = |index: usize| -> Result<BlockId> {
        sequence
            .get(index)
            .and_then(|element| element.block)
            .ok_or_else(|| internal_error!("no block holds sequence position {index}"))
    };

    let missing = std::mem::take(&mut asm.missing);
    let resolved = missing.len();
    for edge in missing {
        let target = match &edge.target {
            Target::Index(index) => block_at(*index)?,
            Target::Label(label) if *label == regular_exit => exit,
            Target::Label(label) if *label == exceptional_exit => exceptional,
            Target::Label(label) => {
                let index = bindings
                    .get(label)
                    .copied()
                    .ok_or_else(|| Error::UnboundLabel(label.name().to_string()))?;
                block_at(index)?
            }
        };
        asm.connect(edge.source, &edge.slot, target)?;
    }

    debug!(
        "assembled {}: {} blocks, {} deferred edges",
        underlying.describe(),
        asm.blocks.len(),
        resolved
    );

    let removed = BitSet::new(asm.blocks.len());
    Ok(ControlFlowGraph {
        blocks: asm.blocks,
        removed,
        entry,
        exit,
        exceptional_exit: exceptional,
        nodes,
        node_blocks,
        lookups,
        return_nodes,
        declared_classes,
        declared_lambdas,
        underlying,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::cfg::{builder::ExtendedNode, BlockKind},
        ast::{AstBuilder, BinaryOp},
        test::linearize_block,
        types::Type,
    };

    #[test]
    fn test_if_else_blocks() {
        let ast = AstBuilder::new();
        let cond = ast.binary(BinaryOp::Gt, ast.local("x", Type::int()), ast.int(0));
        let body = ast.block(vec![ast.if_stmt(
            cond,
            ast.expr_stmt(ast.local("a", Type::int())),
            Some(ast.expr_stmt(ast.local("b", Type::int()))),
        )]);
        let cfg = assemble(linearize_block(&body)).unwrap();
        cfg.check_invariants().unwrap();

        let conditionals = cfg
            .blocks()
            .into_iter()
            .filter(|id| matches!(cfg.block(*id).unwrap().kind(), BlockKind::Conditional { .. }))
            .count();
        assert_eq!(conditionals, 1);
        assert!(cfg.blocks().contains(&cfg.exit()));
    }

    #[test]
    fn test_every_node_has_a_block() {
        let ast = AstBuilder::new();
        let body = ast.block(vec![
            ast.local_var("x", Type::int(), Some(ast.int(1))),
            ast.while_stmt(
                ast.binary(BinaryOp::Lt, ast.local("x", Type::int()), ast.int(3)),
                ast.expr_stmt(ast.local("x", Type::int())),
            ),
        ]);
        let linear = linearize_block(&body);
        let count = linear.nodes().len();
        let cfg = assemble(linear).unwrap();

        for index in 0..count {
            let node = crate::analysis::cfg::NodeId::from_index(index).unwrap();
            assert!(cfg.block_of(node).is_some(), "{node} has no block");
        }
        cfg.check_invariants().unwrap();
    }

    #[test]
    fn test_unbound_label_is_reported() {
        let ast = AstBuilder::new();
        let body = ast.block(vec![]);
        let mut linear = linearize_block(&body);
        let dangling = Label::named("nowhere");
        linear.sequence.insert(0, ExtendedNode::jump(dangling));

        match assemble(linear) {
            Err(Error::UnboundLabel(name)) => assert_eq!(name, "nowhere"),
            other => panic!("expected an unbound label error, got {other:?}"),
        }
    }

    #[test]
    fn test_throwing_node_gets_own_block() {
        let ast = AstBuilder::new();
        let division = ast.binary(BinaryOp::Div, ast.local("a", Type::int()), ast.local("b", Type::int()));
        let body = ast.block(vec![ast.expr_stmt(division)]);
        let cfg = assemble(linearize_block(&body)).unwrap();
        cfg.check_invariants().unwrap();

        let exception_blocks: Vec<BlockId> = cfg
            .blocks()
            .into_iter()
            .filter(|id| matches!(cfg.block(*id).unwrap().kind(), BlockKind::Exception { .. }))
            .collect();
        assert_eq!(exception_blocks.len(), 1);
        let edges = cfg.outgoing_edges(exception_blocks[0]);
        assert!(edges.iter().any(|edge| edge.kind().is_exceptional()
            && edge.target() == cfg.exceptional_exit()));
        assert!(edges.iter().any(|edge| *edge.kind() == CfgEdgeKind::Regular));
    }
}

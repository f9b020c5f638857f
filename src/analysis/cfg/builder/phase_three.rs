//! Graph simplification.
//!
//! Three rewrites run in order:
//!
//! 1. Blocks unreachable from the entry are dropped. The sentinel blocks always stay.
//! 2. Empty regular blocks are eliminated. Every maximal group of connected empty blocks
//!    (a neighborhood) is removed at once and the edges into it are redirected to the block
//!    the group leads to. A group that only leads back into itself is an endless loop
//!    without operations and collapses onto one block with a self-loop.
//! 3. Chains of regular blocks are merged: a regular block whose successor is a regular
//!    block with no other predecessor absorbs that successor.
//!
//! Running the simplification on an already simplified graph changes nothing.

use std::collections::BTreeSet;

use log::{debug, trace};

use crate::{
    analysis::cfg::{Block, BlockId, CfgEdgeKind, ControlFlowGraph},
    utils::BitSet,
};

/// Simplifies `cfg` in place.
pub(crate) fn simplify(cfg: &mut ControlFlowGraph<'_>) {
    let unreachable = remove_unreachable(cfg);

    let mut empty = 0;
    for start in (0..cfg.blocks.len()).map_while(BlockId::from_index) {
        if is_removable_empty(cfg, start) {
            empty += Neighborhood::collect(cfg, start).eliminate(cfg);
        }
    }

    let mut merged = 0;
    for head in (0..cfg.blocks.len()).map_while(BlockId::from_index) {
        while let Some(next) = mergeable_successor(cfg, head) {
            merge(cfg, head, next);
            merged += 1;
        }
    }

    debug!(
        "simplified {}: {} unreachable, {} empty and {} merged blocks removed",
        cfg.underlying.describe(),
        unreachable,
        empty,
        merged
    );
}

fn remove_unreachable(cfg: &mut ControlFlowGraph<'_>) -> usize {
    let mut reachable = BitSet::new(cfg.blocks.len());
    for id in cfg.blocks() {
        reachable.insert(id.index());
    }

    let mut count = 0;
    for index in 0..cfg.blocks.len() {
        if reachable.contains(index) || cfg.removed.contains(index) || cfg.blocks[index].is_special()
        {
            continue;
        }
        let Some(id) = BlockId::from_index(index) else {
            break;
        };

        for node in cfg.blocks[index].nodes().to_vec() {
            cfg.node_blocks[node.index()] = None;
        }
        for succ in cfg.blocks[index].successors() {
            cfg.blocks[succ.index()].remove_predecessor(id);
        }
        cfg.blocks[index].clear_predecessors();
        cfg.removed.insert(index);
        count += 1;
        trace!("dropped unreachable {id}");
    }
    count
}

/// An empty regular block that does not already loop onto itself.
fn is_removable_empty(cfg: &ControlFlowGraph<'_>, id: BlockId) -> bool {
    cfg.block(id).is_some_and(|block| {
        block.is_empty_regular() && block.successor().is_some_and(|succ| succ != id)
    })
}

/// A group of connected empty regular blocks and the edges leading into it.
#[derive(Debug)]
struct Neighborhood {
    members: BTreeSet<BlockId>,
    /// Edges from outside the group into it, as (source, slot, member).
    holders: Vec<(BlockId, CfgEdgeKind, BlockId)>,
    /// The block that replaces the group.
    survivor: BlockId,
}

impl Neighborhood {
    fn collect(cfg: &ControlFlowGraph<'_>, start: BlockId) -> Self {
        let mut members = BTreeSet::from([start]);

        // Forward along empty successors until a block with content is found.
        let mut current = start;
        let survivor = loop {
            let Some(next) = cfg.block(current).and_then(Block::successor) else {
                break start;
            };
            if members.contains(&next) {
                break start;
            }
            match cfg.block(next) {
                Some(block) if block.is_empty_regular() && block.successor().is_some() => {
                    members.insert(next);
                    current = next;
                }
                _ => break next,
            }
        };

        // Backward through empty predecessors, which can only lead into the group.
        let mut worklist: Vec<BlockId> = members.iter().copied().collect();
        while let Some(member) = worklist.pop() {
            let Some(block) = cfg.block(member) else {
                continue;
            };
            for &pred in block.predecessors() {
                if members.contains(&pred) {
                    continue;
                }
                if cfg.block(pred).is_some_and(Block::is_empty_regular) {
                    members.insert(pred);
                    worklist.push(pred);
                }
            }
        }

        let mut holders = Vec::new();
        for &member in &members {
            let Some(block) = cfg.block(member) else {
                continue;
            };
            for &pred in block.predecessors() {
                if members.contains(&pred) {
                    continue;
                }
                let Some(source) = cfg.block(pred) else {
                    continue;
                };
                for edge in source.outgoing_edges() {
                    if edge.target() == member {
                        holders.push((pred, edge.kind().clone(), member));
                    }
                }
            }
        }

        Neighborhood {
            members,
            holders,
            survivor,
        }
    }

    /// Removes the group and returns the number of removed blocks.
    fn eliminate(self, cfg: &mut ControlFlowGraph<'_>) -> usize {
        let survivor = self.survivor;
        let mut removed = 0;

        for &member in &self.members {
            if member == survivor {
                continue;
            }
            for succ in cfg.blocks[member.index()].successors() {
                cfg.blocks[succ.index()].remove_predecessor(member);
            }
            cfg.blocks[member.index()].clear_predecessors();
            cfg.removed.insert(member.index());
            removed += 1;
        }

        if self.members.contains(&survivor) {
            let block = &mut cfg.blocks[survivor.index()];
            block.set_edge(&CfgEdgeKind::Regular, survivor);
            block.clear_predecessors();
            block.add_predecessor(survivor);
            trace!("collapsed empty cycle onto {survivor}");
        }

        for (pred, slot, member) in &self.holders {
            cfg.blocks[pred.index()].redirect_edge(slot, *member, survivor);
            cfg.blocks[survivor.index()].add_predecessor(*pred);
        }

        trace!(
            "eliminated {removed} empty blocks, {} edges now lead to {survivor}",
            self.holders.len()
        );
        removed
    }
}

/// The successor `head` can absorb, if any.
fn mergeable_successor(cfg: &ControlFlowGraph<'_>, head: BlockId) -> Option<BlockId> {
    let block = cfg.block(head)?;
    if !block.is_regular() {
        return None;
    }
    let next = block.successor()?;
    if next == head {
        return None;
    }
    let next_block = cfg.block(next)?;
    let absorbable = next_block.is_regular()
        && next_block.predecessors().len() == 1
        && next_block.successor().is_some();
    absorbable.then_some(next)
}

fn merge(cfg: &mut ControlFlowGraph<'_>, head: BlockId, next: BlockId) {
    let nodes = cfg.blocks[next.index()].take_nodes();
    for &node in &nodes {
        cfg.node_blocks[node.index()] = Some(head);
    }
    for node in nodes {
        cfg.blocks[head.index()].push_node(node);
    }

    if let Some(after) = cfg.blocks[next.index()].successor() {
        cfg.blocks[after.index()].remove_predecessor(next);
        cfg.blocks[after.index()].add_predecessor(head);
        cfg.blocks[head.index()].set_edge(&CfgEdgeKind::Regular, after);
    }
    cfg.blocks[next.index()].clear_predecessors();
    cfg.removed.insert(next.index());
    trace!("merged {next} into {head}");
}

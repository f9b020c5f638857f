//! Shared helpers for the integration tests.

#![allow(dead_code)]

pub mod skeleton;

use std::{collections::HashSet, sync::Arc};

use flowscope::{
    analysis::{BlockId, ControlFlowGraph, NodeId, NodeKind},
    ast::{AstBuilder, ClassDecl, MethodSig},
    types::Type,
    utils::graph::algorithms,
};

/// The class every test body is placed in.
pub fn test_class() -> ClassDecl {
    AstBuilder::new().class("Test", vec![])
}

/// A static `void` method of the test class without thrown types.
pub fn action(name: &str) -> Arc<MethodSig> {
    Arc::new(MethodSig::new(Type::class("Test"), name, vec![], Type::Void).with_static())
}

/// The method access nodes for calls to `name` that are still in the graph.
pub fn reachable_calls(cfg: &ControlFlowGraph<'_>, name: &str) -> Vec<NodeId> {
    cfg.nodes()
        .iter()
        .filter(|(id, node)| {
            cfg.block_of(*id).is_some()
                && matches!(&node.kind, NodeKind::MethodAccess { method, .. } if &*method.name == name)
        })
        .map(|(id, _)| id)
        .collect()
}

/// The blocks holding nodes of the kind named `kind_name`, in node order.
pub fn blocks_of_kind(cfg: &ControlFlowGraph<'_>, kind_name: &str) -> Vec<BlockId> {
    cfg.nodes()
        .iter()
        .filter(|(_, node)| node.kind.name() == kind_name)
        .filter_map(|(id, _)| cfg.block_of(id))
        .collect()
}

/// Returns `true` if `to` is reachable from `from`.
pub fn reaches(cfg: &ControlFlowGraph<'_>, from: BlockId, to: BlockId) -> bool {
    algorithms::bfs(cfg, from).any(|block| block == to)
}

/// Returns `true` if every reachable block has a path to the regular or exceptional exit.
pub fn every_block_reaches_an_exit(cfg: &ControlFlowGraph<'_>) -> bool {
    let mut seen: HashSet<BlockId> = HashSet::new();
    let mut worklist = vec![cfg.exit(), cfg.exceptional_exit()];
    while let Some(block) = worklist.pop() {
        if seen.insert(block) {
            worklist.extend(cfg.predecessors(block));
        }
    }
    cfg.blocks().iter().all(|block| seen.contains(block))
}

/// The block structure of `cfg` without generated variable names, which differ between builds.
pub fn shape(cfg: &ControlFlowGraph<'_>) -> String {
    let mut shape = String::new();
    for id in cfg.depth_first_ordered_blocks() {
        let Some(block) = cfg.block(id) else {
            continue;
        };
        let kinds: Vec<&str> = block
            .nodes()
            .iter()
            .filter_map(|node| cfg.node(*node))
            .map(|node| node.kind.name())
            .collect();
        let successors: Vec<String> = cfg.successors(id).iter().map(ToString::to_string).collect();
        shape.push_str(&format!(
            "{id} {} [{}] -> [{}]\n",
            block.kind_name(),
            kinds.join(" "),
            successors.join(" ")
        ));
    }
    shape
}

/// Deterministic pseudo-random bytes.
pub fn bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 24) as u8
        })
        .collect()
}

//! Control Flow Graph (CFG) construction.
//!
//! This module lowers a resolved procedure body into a graph of basic blocks that
//! flow-sensitive analyses can iterate over.
//!
//! # Architecture
//!
//! Construction runs in three phases, all driven by [`CfgBuilder`]:
//!
//! 1. **Linearization** walks the tree once and emits a flat sequence of *extended nodes*:
//!    operations, operations that may throw, unconditional jumps and conditional jumps.
//!    Jumps refer to symbolic labels that are bound to sequence positions.
//! 2. **Block assembly** partitions that sequence into basic blocks at every position
//!    that is a jump target and resolves the labels into edges.
//! 3. **Simplification** removes empty blocks and merges straight-line chains.
//!
//! The traversal algorithms in [`crate::utils::graph`] operate directly on
//! [`ControlFlowGraph`] through its [`crate::utils::graph::Successors`] implementation.
//!
//! # Key Components
//!
//! - [`ControlFlowGraph`] - The finished graph and its tree lookups
//! - [`Block`] / [`BlockKind`] - Basic blocks
//! - [`Node`] / [`NodeKind`] - Operations stored in blocks
//! - [`CfgEdge`] / [`CfgEdgeKind`] - Outgoing edges of a block
//! - [`CfgBuilder`] / [`BuilderOptions`] - Construction entry point and its configuration
//!
//! # Edge Types
//!
//! - **Regular**: fall-through, jumps and normal completion of throwing operations
//! - **Then / Else**: the two branches of a conditional block
//! - **Exceptional**: handler edges of an exception block, one set per exception type
//!
//! # Examples
//!
//! ```rust,ignore
//! use flowscope::analysis::{CfgBuilder, CfgEdgeKind};
//!
//! let cfg = CfgBuilder::new(&hierarchy).build(underlying)?;
//!
//! for block_id in cfg.blocks() {
//!     for edge in cfg.outgoing_edges(block_id) {
//!         if let CfgEdgeKind::Exceptional { cause } = edge.kind() {
//!             println!("{block_id} may throw {cause} into {}", edge.target());
//!         }
//!     }
//! }
//! ```
//!
//! # Thread Safety
//!
//! [`ControlFlowGraph`] is [`Send`] and [`Sync`]. Building only shares the atomic
//! counter that makes label names unique, so independent bodies can be built in parallel
//! with [`CfgBuilder::build_all`].

mod block;
mod edge;
mod graph;
mod node;

pub mod builder;

pub use block::{Block, BlockId, BlockKind, SpecialBlockKind};
pub use builder::{AssertionMode, BuilderOptions, CfgBuilder, MAX_NESTING_DEPTH};
pub use edge::{CfgEdge, CfgEdgeKind};
pub use graph::ControlFlowGraph;
pub use node::{Node, NodeArena, NodeFlags, NodeId, NodeKind};

pub(crate) use graph::TreeLookups;

//! Program analysis infrastructure.
//!
//! This module turns resolved procedure bodies into structures that analyses can work
//! on. It builds upon the generic graph infrastructure in [`crate::utils::graph`].
//!
//! # Architecture
//!
//! - [`cfg`] - Control Flow Graph construction
//!
//! # Usage
//!
//! ```rust,ignore
//! use flowscope::analysis::{CfgBuilder, ControlFlowGraph};
//! use flowscope::ast::UnderlyingAst;
//!
//! let cfg: ControlFlowGraph = CfgBuilder::new(&hierarchy)
//!     .build(UnderlyingAst::method(&method, &class))?;
//!
//! println!("{}", cfg.to_dot(Some("example")));
//! ```

pub mod cfg;

// Re-export primary types at module level
pub use cfg::{
    AssertionMode, Block, BlockId, BlockKind, BuilderOptions, CfgBuilder, CfgEdge, CfgEdgeKind,
    ControlFlowGraph, Node, NodeArena, NodeFlags, NodeId, NodeKind, SpecialBlockKind,
    MAX_NESTING_DEPTH,
};

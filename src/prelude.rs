//! # flowscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the flowscope library. Import this module to get quick access to everything needed
//! to assemble a tree, build its graph and walk the result.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all flowscope operations
pub use crate::Error;

/// The result type used throughout flowscope
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Graph construction and its configuration
pub use crate::analysis::{AssertionMode, BuilderOptions, CfgBuilder};

/// Intermediate result of the first construction phase
pub use crate::analysis::cfg::builder::{ExtendedKind, ExtendedNode, Label, PhaseOneResult};

// ================================================================================================
// Graph
// ================================================================================================

/// The graph, its blocks and edges
pub use crate::analysis::{
    Block, BlockId, BlockKind, CfgEdge, CfgEdgeKind, ControlFlowGraph, SpecialBlockKind,
};

/// Operation nodes
pub use crate::analysis::{Node, NodeArena, NodeFlags, NodeId, NodeKind};

// ================================================================================================
// Input Tree
// ================================================================================================

/// Trees, declarations and the builder that assembles them
pub use crate::ast::{
    AstBuilder, BinaryOp, Block as AstBlock, Case, CaseBody, Catch, ClassDecl, Expr, ExprKind,
    LambdaBody, LambdaExpr, Literal, Member, MethodDecl, MethodSig, Resource, ResourceKind, Stmt,
    StmtKind, Switch, Try, TreeId, UnaryOp, UnderlyingAst, VarDecl,
};

// ================================================================================================
// Type System
// ================================================================================================

/// Types and the hierarchy queried during construction
pub use crate::types::{ClassHierarchy, PrimitiveKind, Type, TypeHierarchy, WellKnownType};

// ================================================================================================
// Graph Algorithms
// ================================================================================================

/// Traits and traversals usable on [`ControlFlowGraph`]
pub use crate::utils::graph::{algorithms, GraphBase, Successors};

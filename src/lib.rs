// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]
#![allow(clippy::too_many_arguments)]

//! # flowscope
//!
//! Control flow graphs for resolved Java-like syntax trees.
//!
//! `flowscope` takes the body of a method, lambda, initializer block or field initializer,
//! whose names and types have already been resolved, and builds an intraprocedural control
//! flow graph over *operation nodes*: one node per evaluation step, in evaluation order,
//! with every implicit conversion made explicit. Flow-sensitive analyses (definite
//! assignment or nullness, for example) run over these graphs instead of over
//! the tree.
//!
//! ## Features
//!
//! - **Explicit evaluation order** - every subexpression, conversion, temporary and
//!   synthetic check becomes its own node
//! - **Exceptional flow** - each operation that may throw gets its own block with one edge
//!   per possible cause, routed to the handlers that may catch it
//! - **Structured desugaring** - loops, switches, enhanced `for`, `assert`,
//!   try-with-resources and `finally` copies are lowered to plain jumps
//! - **Tree lookups** - map any input tree back to the nodes generated for it
//! - **Parallel batches** - [`CfgBuilder::build_all`] builds many bodies on a thread pool
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use flowscope::prelude::*;
//!
//! let ast = AstBuilder::new();
//! let body = ast.block(vec![ast.while_stmt(
//!     ast.binary(BinaryOp::Lt, ast.local("i", Type::int()), ast.int(10)),
//!     ast.expr_stmt(ast.unary(UnaryOp::PostIncrement, ast.local("i", Type::int()))),
//! )]);
//! let class = ast.class("Example", vec![]);
//!
//! let hierarchy = ClassHierarchy::with_java_lang();
//! let cfg = CfgBuilder::new(&hierarchy).build(UnderlyingAst::arbitrary(&body, &class))?;
//! println!("{cfg}");
//! # Ok::<(), flowscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`ast`] - the resolved input tree and a builder for it
//! - [`types`] - the type model and the [`types::TypeHierarchy`] the builder queries
//! - [`analysis`] - the graph, its nodes and blocks, and the three-phase builder
//! - [`utils`] - bit sets, graph traversal and DOT helpers
//!
//! Construction runs in three phases. Linearization turns the tree into a flat sequence of
//! nodes and label-based jumps. Assembly cuts that sequence into basic blocks and turns
//! labels into edges. Simplification drops unreachable and empty blocks and merges
//! straight-line chains.
//!
//! ## Logging
//!
//! The builder logs through the [`log`] facade: one `debug` line per phase and body, and
//! `trace` lines for individual rewrites. Install any logger implementation to see them.
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, Error>`](Result):
//!
//! ```rust,ignore
//! use flowscope::{CfgBuilder, Error};
//!
//! match CfgBuilder::new(&hierarchy).build(body) {
//!     Ok(cfg) => println!("{} blocks", cfg.blocks().len()),
//!     Err(Error::RecursionLimit(depth)) => println!("nested deeper than {depth}"),
//!     Err(e) => println!("Error: {e}"),
//! }
//! ```
//!
//! ## Development and Testing
//!
//! ```bash
//! cargo test
//! cargo bench --bench builder
//! cargo +nightly fuzz run skeleton --release
//! ```

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust,ignore
/// use flowscope::prelude::*;
///
/// let hierarchy = ClassHierarchy::with_java_lang();
/// let builder = CfgBuilder::new(&hierarchy).with_options(BuilderOptions::unsimplified());
/// ```
pub mod prelude;

/// The resolved syntax tree a graph is built from.
///
/// Every expression carries its static type, and member accesses carry their resolved
/// owner and signature. [`ast::AstBuilder`] hands out fresh [`ast::TreeId`]s and infers the
/// types of operators, which is what tests and embedders use to assemble trees.
pub mod ast;

/// Control flow graphs and their construction.
///
/// # Key Types
///
/// - [`analysis::CfgBuilder`] - runs the construction phases
/// - [`analysis::ControlFlowGraph`] - the result, with tree lookups
/// - [`analysis::Node`] / [`analysis::NodeKind`] - operation nodes
/// - [`analysis::Block`] / [`analysis::BlockKind`] - basic blocks
pub mod analysis;

/// Types of the input language.
///
/// [`types::Type`] models primitive, class, array and null types. The builder answers
/// subtyping questions through the [`types::TypeHierarchy`] trait; [`types::ClassHierarchy`]
/// is a table-based implementation that knows the `java.lang` exception types.
pub mod types;

/// Utilities used by the graph and the builder.
pub mod utils;

/// `flowscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `flowscope` Error type
///
/// Distinguishes malformed input trees, trees nested too deeply, and internal
/// inconsistencies of the translation.
pub use error::Error;

/// The builder and the graph it produces.
pub use analysis::{AssertionMode, BuilderOptions, CfgBuilder, ControlFlowGraph};

//! Control flow graph construction.
//!
//! [`CfgBuilder`] drives the three construction phases:
//!
//! 1. Linearization turns the body into a [`PhaseOneResult`]: a flat sequence of
//!    [`ExtendedNode`]s whose jumps refer to [`Label`]s, together with the positions the
//!    labels are bound to.
//! 2. Block assembly partitions that sequence into basic blocks and resolves every label
//!    into an edge.
//! 3. Simplification removes empty blocks and merges straight-line chains.
//!
//! # Configuration
//!
//! [`BuilderOptions`] controls how assertions are translated, how deeply nested a body may
//! be, and whether the third phase runs.
//!
//! # Examples
//!
//! ```rust,ignore
//! use flowscope::prelude::*;
//!
//! let hierarchy = ClassHierarchy::with_java_lang();
//! let builder = CfgBuilder::new(&hierarchy).with_options(BuilderOptions::assertions_enabled());
//!
//! let cfg = builder.build(UnderlyingAst::method(&method, &class))?;
//! cfg.check_invariants()?;
//! ```

mod extended;
mod label;
mod phase_one;
mod phase_two;
mod try_stack;

pub(crate) mod phase_three;

pub use extended::{ExtendedKind, ExtendedNode};
pub use label::{Label, LabelCell, ScopeMap};
pub use phase_one::PhaseOneResult;
pub use try_stack::{TryFrame, TryStack};

use log::debug;
use rayon::prelude::*;

use crate::{
    analysis::cfg::ControlFlowGraph, ast::UnderlyingAst, types::TypeHierarchy, Result,
};

/// Default limit on the nesting depth of statements and expressions.
///
/// Each level costs several frames of the recursive translation. At this depth a body
/// still fits on a 2 MiB thread stack in unoptimized builds.
pub const MAX_NESTING_DEPTH: usize = 100;

/// How `assert` statements are translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display)]
pub enum AssertionMode {
    /// Assertions are known to be enabled: the check is always executed.
    Enabled,
    /// Assertions are known to be disabled: `assert` statements produce no nodes.
    Disabled,
    /// The check is guarded by a branch on a synthetic `assertionsEnabled` variable, so
    /// both possibilities are represented.
    #[default]
    Unknown,
}

/// Configuration for [`CfgBuilder`].
///
/// # Examples
///
/// ```rust,ignore
/// use flowscope::analysis::{AssertionMode, BuilderOptions};
///
/// let options = BuilderOptions {
///     max_depth: 64,
///     ..BuilderOptions::assertions_disabled()
/// };
/// assert_eq!(options.assertions, AssertionMode::Disabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderOptions {
    /// Translation of `assert` statements.
    pub assertions: AssertionMode,
    /// Maximum nesting depth of statements and expressions. Deeper bodies are rejected
    /// with [`crate::Error::RecursionLimit`] instead of overflowing the stack.
    pub max_depth: usize,
    /// Whether to simplify the assembled graph. Without simplification the graph keeps one
    /// block per label, including empty ones.
    pub simplify: bool,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        BuilderOptions {
            assertions: AssertionMode::Unknown,
            max_depth: MAX_NESTING_DEPTH,
            simplify: true,
        }
    }
}

impl BuilderOptions {
    /// Options for code that runs with assertions enabled.
    #[must_use]
    pub fn assertions_enabled() -> Self {
        BuilderOptions {
            assertions: AssertionMode::Enabled,
            ..Self::default()
        }
    }

    /// Options for code that runs with assertions disabled.
    #[must_use]
    pub fn assertions_disabled() -> Self {
        BuilderOptions {
            assertions: AssertionMode::Disabled,
            ..Self::default()
        }
    }

    /// Options that skip simplification, exposing the blocks exactly as assembled.
    #[must_use]
    pub fn unsimplified() -> Self {
        BuilderOptions {
            simplify: false,
            ..Self::default()
        }
    }
}

/// Builds control flow graphs for bodies of one program.
///
/// A builder only borrows the type hierarchy; it is cheap to create and may be shared
/// between threads.
pub struct CfgBuilder<'h> {
    hierarchy: &'h dyn TypeHierarchy,
    options: BuilderOptions,
}

impl<'h> CfgBuilder<'h> {
    /// Creates a builder with default options.
    ///
    /// # Arguments
    ///
    /// * `hierarchy` - Answers the subtype and well-known type queries of the translation
    #[must_use]
    pub fn new(hierarchy: &'h dyn TypeHierarchy) -> Self {
        CfgBuilder {
            hierarchy,
            options: BuilderOptions::default(),
        }
    }

    /// Replaces the options.
    #[must_use]
    pub fn with_options(mut self, options: BuilderOptions) -> Self {
        self.options = options;
        self
    }

    /// The options in effect.
    #[must_use]
    pub const fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Builds the control flow graph of `underlying`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree violates an assumption of the translation, such as a
    /// `break` without a target, or if it is nested deeper than
    /// [`BuilderOptions::max_depth`].
    pub fn build<'ast>(&self, underlying: UnderlyingAst<'ast>) -> Result<ControlFlowGraph<'ast>> {
        let linear = self.linearize(underlying)?;
        let mut cfg = Self::assemble(linear)?;
        if self.options.simplify {
            cfg.simplify();
        }

        debug!(
            "built {}: {} blocks, {} nodes",
            underlying.describe(),
            cfg.blocks().len(),
            cfg.nodes().len()
        );
        Ok(cfg)
    }

    /// Runs only the first phase, returning the linearized body.
    ///
    /// # Errors
    ///
    /// See [`CfgBuilder::build`].
    pub fn linearize<'ast>(&self, underlying: UnderlyingAst<'ast>) -> Result<PhaseOneResult<'ast>> {
        phase_one::linearize(underlying, self.hierarchy, &self.options)
    }

    /// Runs only the second phase on a linearized body, returning the unsimplified graph.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnboundLabel`] if a jump targets a label that was never
    /// bound.
    pub fn assemble(linear: PhaseOneResult<'_>) -> Result<ControlFlowGraph<'_>> {
        phase_two::assemble(linear)
    }

    /// Builds the graphs of many bodies in parallel.
    ///
    /// The results are returned in the order of `bodies`.
    pub fn build_all<'ast>(
        &self,
        bodies: &[UnderlyingAst<'ast>],
    ) -> Vec<Result<ControlFlowGraph<'ast>>> {
        bodies.par_iter().map(|body| self.build(*body)).collect()
    }
}

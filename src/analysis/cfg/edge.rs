//! Control flow edge types for the CFG.
//!
//! This module defines the edge representations used in the control flow graph,
//! providing semantic information about how control flows between basic blocks.
//!
//! The edge kind doubles as the name of an *edge slot*: the outgoing edge of a block that
//! simplification rewrites when the block it points at is removed. A regular block, an
//! exception block and the entry block have one [`CfgEdgeKind::Regular`] slot, a
//! conditional block has a [`CfgEdgeKind::Then`] and an [`CfgEdgeKind::Else`] slot, and an
//! exception block has one [`CfgEdgeKind::Exceptional`] slot per exception cause.

use crate::{analysis::cfg::BlockId, types::Type};

/// The kind of control flow represented by an edge.
///
/// # Examples
///
/// ```rust
/// use flowscope::analysis::CfgEdgeKind;
///
/// let edge_kind = CfgEdgeKind::Then;
/// assert!(edge_kind.is_conditional());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CfgEdgeKind {
    /// Unconditional control flow: fall-through, jump, or the normal completion of an
    /// operation that may throw.
    Regular,

    /// Taken when the condition of a conditional block evaluates to `true`.
    Then,

    /// Taken when the condition of a conditional block evaluates to `false`.
    Else,

    /// Taken when the operation of an exception block throws.
    Exceptional {
        /// The type of the thrown exception.
        cause: Type,
    },
}

impl CfgEdgeKind {
    /// Returns `true` if this is a conditional branch edge.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flowscope::analysis::CfgEdgeKind;
    ///
    /// assert!(CfgEdgeKind::Then.is_conditional());
    /// assert!(CfgEdgeKind::Else.is_conditional());
    /// assert!(!CfgEdgeKind::Regular.is_conditional());
    /// ```
    #[must_use]
    pub const fn is_conditional(&self) -> bool {
        matches!(self, Self::Then | Self::Else)
    }

    /// Returns `true` if this is an exceptional edge.
    #[must_use]
    pub const fn is_exceptional(&self) -> bool {
        matches!(self, Self::Exceptional { .. })
    }

    /// Returns the exception type carried by an exceptional edge.
    #[must_use]
    pub const fn cause(&self) -> Option<&Type> {
        match self {
            Self::Exceptional { cause } => Some(cause),
            _ => None,
        }
    }
}

/// An edge in the control flow graph.
///
/// Each edge connects a source block to a target block and carries semantic
/// information about the type of control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfgEdge {
    /// The target block of this edge.
    target: BlockId,
    /// The kind of control flow this edge represents.
    kind: CfgEdgeKind,
}

impl CfgEdge {
    /// Creates a new CFG edge.
    ///
    /// # Arguments
    ///
    /// * `target` - The target block
    /// * `kind` - The kind of control flow
    #[must_use]
    pub const fn new(target: BlockId, kind: CfgEdgeKind) -> Self {
        Self { target, kind }
    }

    /// Returns the target block of this edge.
    #[must_use]
    pub const fn target(&self) -> BlockId {
        self.target
    }

    /// Returns the kind of control flow this edge represents.
    #[must_use]
    pub const fn kind(&self) -> &CfgEdgeKind {
        &self.kind
    }

    /// Creates an unconditional edge to the target block.
    #[must_use]
    pub const fn regular(target: BlockId) -> Self {
        Self::new(target, CfgEdgeKind::Regular)
    }

    /// Creates the `true` edge of a conditional block.
    #[must_use]
    pub const fn then(target: BlockId) -> Self {
        Self::new(target, CfgEdgeKind::Then)
    }

    /// Creates the `false` edge of a conditional block.
    #[must_use]
    pub const fn else_(target: BlockId) -> Self {
        Self::new(target, CfgEdgeKind::Else)
    }

    /// Creates an exceptional edge for exceptions of type `cause`.
    #[must_use]
    pub const fn exceptional(target: BlockId, cause: Type) -> Self {
        Self::new(target, CfgEdgeKind::Exceptional { cause })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_kind_predicates() {
        assert!(CfgEdgeKind::Then.is_conditional());
        assert!(CfgEdgeKind::Else.is_conditional());
        assert!(!CfgEdgeKind::Regular.is_conditional());
        assert!(!CfgEdgeKind::Regular.is_exceptional());

        let exceptional = CfgEdgeKind::Exceptional {
            cause: Type::class("java.lang.NullPointerException"),
        };
        assert!(exceptional.is_exceptional());
        assert!(!exceptional.is_conditional());
        assert_eq!(
            exceptional.cause(),
            Some(&Type::class("java.lang.NullPointerException"))
        );
        assert_eq!(CfgEdgeKind::Then.cause(), None);
    }

    #[test]
    fn test_edge_factories() {
        let target = BlockId(4);
        assert_eq!(CfgEdge::regular(target).kind(), &CfgEdgeKind::Regular);
        assert_eq!(CfgEdge::then(target).kind(), &CfgEdgeKind::Then);
        assert_eq!(CfgEdge::else_(target).kind(), &CfgEdgeKind::Else);

        let edge = CfgEdge::exceptional(target, Type::class("java.lang.Error"));
        assert_eq!(edge.target(), target);
        assert!(edge.kind().is_exceptional());
    }

    #[test]
    fn test_slot_equality_distinguishes_causes() {
        let a = CfgEdgeKind::Exceptional {
            cause: Type::class("java.lang.Error"),
        };
        let b = CfgEdgeKind::Exceptional {
            cause: Type::class("java.lang.RuntimeException"),
        };
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
    }
}

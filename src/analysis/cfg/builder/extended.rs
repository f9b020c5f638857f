//! The extended node sequence produced by linearization.

use std::fmt;

use crate::{
    analysis::cfg::{builder::label::Label, BlockId, NodeArena, NodeId},
    types::Type,
};

/// What an [`ExtendedNode`] does.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtendedKind {
    /// An operation that cannot throw.
    Node(NodeId),
    /// An operation that may throw, with the labels each exception type may reach.
    Exception {
        /// The operation.
        node: NodeId,
        /// Handler labels per exception type, in the order the causes were recorded.
        causes: Vec<(Type, Vec<Label>)>,
    },
    /// An unconditional jump.
    Jump(Label),
    /// A jump on the boolean value of `condition`, which is the preceding operation.
    ConditionalJump {
        /// The boolean operation whose value decides the branch.
        condition: NodeId,
        /// Target if the value is `true`.
        then: Label,
        /// Target if the value is `false`.
        else_: Label,
    },
}

/// One element of the linearized body.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedNode {
    /// What the element does.
    pub kind: ExtendedKind,
    /// Control never continues to the next element after this one.
    pub terminates: bool,
    /// The block holding this element, filled in by block assembly.
    pub block: Option<BlockId>,
}

impl ExtendedNode {
    fn with_kind(kind: ExtendedKind) -> Self {
        ExtendedNode {
            kind,
            terminates: false,
            block: None,
        }
    }

    pub(crate) fn node(node: NodeId) -> Self {
        Self::with_kind(ExtendedKind::Node(node))
    }

    pub(crate) fn exception(node: NodeId, causes: Vec<(Type, Vec<Label>)>) -> Self {
        Self::with_kind(ExtendedKind::Exception { node, causes })
    }

    pub(crate) fn jump(target: Label) -> Self {
        Self::with_kind(ExtendedKind::Jump(target))
    }

    pub(crate) fn conditional_jump(condition: NodeId, then: Label, else_: Label) -> Self {
        Self::with_kind(ExtendedKind::ConditionalJump {
            condition,
            then,
            else_,
        })
    }

    pub(crate) fn terminating(mut self) -> Self {
        self.terminates = true;
        self
    }

    /// The operation carried by this element, if it is not a jump.
    #[must_use]
    pub fn node_id(&self) -> Option<NodeId> {
        match &self.kind {
            ExtendedKind::Node(node) | ExtendedKind::Exception { node, .. } => Some(*node),
            ExtendedKind::Jump(_) | ExtendedKind::ConditionalJump { .. } => None,
        }
    }

    /// Every label this element may transfer control to.
    #[must_use]
    pub fn targets(&self) -> Vec<&Label> {
        match &self.kind {
            ExtendedKind::Node(_) => Vec::new(),
            ExtendedKind::Exception { causes, .. } => {
                causes.iter().flat_map(|(_, labels)| labels).collect()
            }
            ExtendedKind::Jump(target) => vec![target],
            ExtendedKind::ConditionalJump { then, else_, .. } => vec![then, else_],
        }
    }

    /// Returns `true` if this is an exception element listing `label` as a handler.
    #[must_use]
    pub fn throws_to(&self, label: &Label) -> bool {
        match &self.kind {
            ExtendedKind::Exception { causes, .. } => {
                causes.iter().any(|(_, labels)| labels.contains(label))
            }
            _ => false,
        }
    }

    /// Renders the element on one line, using `nodes` to describe operations.
    #[must_use]
    pub fn describe(&self, nodes: &NodeArena) -> String {
        let mut out = match &self.kind {
            ExtendedKind::Node(node) => nodes.describe(*node),
            ExtendedKind::Exception { node, causes } => {
                let handlers: Vec<String> = causes
                    .iter()
                    .map(|(cause, labels)| {
                        let names: Vec<&str> = labels.iter().map(Label::name).collect();
                        format!("{cause} -> {}", names.join("|"))
                    })
                    .collect();
                format!("{} throws {{{}}}", nodes.describe(*node), handlers.join(", "))
            }
            ExtendedKind::Jump(target) => format!("goto {target}"),
            ExtendedKind::ConditionalJump {
                condition,
                then,
                else_,
            } => format!("if {condition} goto {then} else {else_}"),
        };
        if self.terminates {
            out.push_str(" (terminates)");
        }
        out
    }
}

impl fmt::Display for ExtendedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtendedKind::Node(node) => write!(f, "{node}"),
            ExtendedKind::Exception { node, causes } => {
                write!(f, "{node} with {} exception type(s)", causes.len())
            }
            ExtendedKind::Jump(target) => write!(f, "goto {target}"),
            ExtendedKind::ConditionalJump { then, else_, .. } => {
                write!(f, "cond goto {then} / {else_}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets() {
        let then = Label::new();
        let else_ = Label::new();
        let node = ExtendedNode::conditional_jump(NodeId(0), then.clone(), else_.clone());
        assert_eq!(node.targets(), vec![&then, &else_]);
        assert_eq!(node.node_id(), None);

        let handler = Label::new();
        let exception = ExtendedNode::exception(
            NodeId(1),
            vec![(Type::class("java.lang.Error"), vec![handler.clone()])],
        )
        .terminating();
        assert!(exception.terminates);
        assert!(exception.throws_to(&handler));
        assert!(!exception.throws_to(&then));
        assert_eq!(exception.node_id(), Some(NodeId(1)));
    }
}

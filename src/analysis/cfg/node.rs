//! Operation nodes stored in basic blocks.
//!
//! Every evaluation step of a body becomes one [`Node`]: reading a variable, accessing a
//! field, invoking a method, converting a value, assigning. Nodes refer to their operands
//! by [`NodeId`], so a node is only meaningful together with the [`NodeArena`] of the graph
//! that owns it. Nodes never change after they are created; simplification only moves
//! their ids between blocks.

use std::{fmt, sync::Arc};

use bitflags::bitflags;

use crate::{
    ast::{BinaryOp, Literal, MethodSig, TreeId, UnaryOp},
    types::Type,
};

/// Identifier of a [`Node`] within its [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The dense index of this node in its arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The id of the node stored at `index`, or `None` past the id range.
    pub(crate) fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(NodeId)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

bitflags! {
    /// Properties of a node that are orthogonal to its kind.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// The node corresponds to code written in the source. Cleared on nodes
        /// synthesized for implicit conversions and desugared constructs.
        const IN_SOURCE = 0b0000_0001;
        /// The node is the target of an assignment rather than a read.
        const LVALUE    = 0b0000_0010;
    }
}

/// The operation a node performs.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A literal value.
    Literal(Literal),
    /// A read of (or, with [`NodeFlags::LVALUE`], a write to) a local variable.
    LocalVariable(Arc<str>),
    /// Declaration of a local variable.
    VariableDeclaration(Arc<str>),
    /// The implicit receiver of an unqualified instance member access.
    ImplicitThis,
    /// `this`
    ExplicitThis,
    /// `super`
    Super,
    /// Evaluation of a type name; the named type is the node's type.
    ClassName,
    /// A field access on `receiver`.
    FieldAccess {
        /// The receiver object or class name.
        receiver: NodeId,
        /// Simple field name.
        field: Arc<str>,
        /// Whether the field is static.
        is_static: bool,
    },
    /// `array[index]`
    ArrayAccess {
        /// The array operand.
        array: NodeId,
        /// The index operand.
        index: NodeId,
    },
    /// Selection of a method on a receiver, evaluated before the arguments.
    MethodAccess {
        /// The receiver object or class name.
        receiver: NodeId,
        /// The selected method.
        method: Arc<MethodSig>,
    },
    /// Invocation of a previously accessed method.
    MethodInvocation {
        /// The [`NodeKind::MethodAccess`] node.
        target: NodeId,
        /// Converted arguments.
        args: Vec<NodeId>,
    },
    /// `new T(args)`
    ObjectCreation {
        /// The invoked constructor.
        ctor: Arc<MethodSig>,
        /// Converted arguments.
        args: Vec<NodeId>,
        /// The [`NodeKind::ClassDeclaration`] node of an anonymous class body.
        class_body: Option<NodeId>,
    },
    /// Array creation with dimensions or an initializer list.
    ArrayCreation {
        /// Promoted dimension values.
        dims: Vec<NodeId>,
        /// Converted initializer elements.
        init: Vec<NodeId>,
    },
    /// A unary numeric or logical operation.
    Unary {
        /// The operator; never an increment or decrement.
        op: UnaryOp,
        /// The promoted operand.
        operand: NodeId,
    },
    /// A binary numeric, relational, equality, bitwise, shift or conditional operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand after conversion.
        lhs: NodeId,
        /// Right operand after conversion.
        rhs: NodeId,
    },
    /// String concatenation.
    StringConcat {
        /// Left operand after string conversion.
        lhs: NodeId,
        /// Right operand after string conversion.
        rhs: NodeId,
    },
    /// `target += value` on a string variable.
    StringConcatAssign {
        /// The assigned variable.
        target: NodeId,
        /// The string-converted right-hand side.
        value: NodeId,
    },
    /// `cond ? then : else_`, evaluated at the merge point of both branches.
    Ternary {
        /// The unboxed condition.
        cond: NodeId,
        /// Promoted value of the first branch.
        then: NodeId,
        /// Promoted value of the second branch.
        else_: NodeId,
    },
    /// `operand instanceof target`
    InstanceOf {
        /// The tested value.
        operand: NodeId,
        /// The tested type.
        target: Type,
    },
    /// A checked cast to the node's type.
    TypeCast(NodeId),
    /// `target = value`
    Assignment {
        /// The assigned location, flagged [`NodeFlags::LVALUE`]. In compound assignments
        /// and increments the same node also supplies the old value.
        target: NodeId,
        /// The converted value.
        value: NodeId,
    },
    /// Widening primitive conversion to the node's type.
    WideningConversion(NodeId),
    /// Narrowing primitive conversion to the node's type.
    NarrowingConversion(NodeId),
    /// Conversion of a value to `String`.
    StringConversion(NodeId),
    /// `return` with an optional converted value.
    Return(Option<NodeId>),
    /// `throw value`
    Throw(NodeId),
    /// Construction of the error thrown by a failed assertion.
    AssertionError {
        /// The asserted condition.
        condition: NodeId,
        /// The detail message.
        detail: Option<NodeId>,
    },
    /// Entering (`start`) or leaving a synchronized block.
    Synchronized {
        /// The monitor.
        lock: NodeId,
        /// `true` at entry, `false` at exit.
        start: bool,
    },
    /// Test whether a switch selector matches any of the labels of one case.
    Case {
        /// The assignment of the selector to its temporary.
        selector: NodeId,
        /// The case label values.
        labels: Vec<NodeId>,
    },
    /// The value of an expression-bodied lambda.
    LambdaResult(NodeId),
    /// A lambda or method reference; its tree is listed in the graph's declared lambdas
    /// when it is a lambda.
    FunctionalInterface,
    /// A local or anonymous class declaration.
    ClassDeclaration,
    /// A textual marker that delimits a source construct, such as the start of a try block.
    Marker(Arc<str>),
}

impl NodeKind {
    /// Short name of the kind, as used in dumps and graph visualizations.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            NodeKind::Literal(_) => "Literal",
            NodeKind::LocalVariable(_) => "LocalVariable",
            NodeKind::VariableDeclaration(_) => "VariableDeclaration",
            NodeKind::ImplicitThis => "ImplicitThis",
            NodeKind::ExplicitThis => "ExplicitThis",
            NodeKind::Super => "Super",
            NodeKind::ClassName => "ClassName",
            NodeKind::FieldAccess { .. } => "FieldAccess",
            NodeKind::ArrayAccess { .. } => "ArrayAccess",
            NodeKind::MethodAccess { .. } => "MethodAccess",
            NodeKind::MethodInvocation { .. } => "MethodInvocation",
            NodeKind::ObjectCreation { .. } => "ObjectCreation",
            NodeKind::ArrayCreation { .. } => "ArrayCreation",
            NodeKind::Unary { .. } => "Unary",
            NodeKind::Binary { .. } => "Binary",
            NodeKind::StringConcat { .. } => "StringConcat",
            NodeKind::StringConcatAssign { .. } => "StringConcatAssign",
            NodeKind::Ternary { .. } => "Ternary",
            NodeKind::InstanceOf { .. } => "InstanceOf",
            NodeKind::TypeCast(_) => "TypeCast",
            NodeKind::Assignment { .. } => "Assignment",
            NodeKind::WideningConversion(_) => "WideningConversion",
            NodeKind::NarrowingConversion(_) => "NarrowingConversion",
            NodeKind::StringConversion(_) => "StringConversion",
            NodeKind::Return(_) => "Return",
            NodeKind::Throw(_) => "Throw",
            NodeKind::AssertionError { .. } => "AssertionError",
            NodeKind::Synchronized { .. } => "Synchronized",
            NodeKind::Case { .. } => "Case",
            NodeKind::LambdaResult(_) => "LambdaResult",
            NodeKind::FunctionalInterface => "FunctionalInterface",
            NodeKind::ClassDeclaration => "ClassDeclaration",
            NodeKind::Marker(_) => "Marker",
        }
    }

    /// The operand nodes this operation reads, in evaluation order.
    #[must_use]
    pub fn operands(&self) -> Vec<NodeId> {
        match self {
            NodeKind::FieldAccess { receiver, .. } | NodeKind::MethodAccess { receiver, .. } => {
                vec![*receiver]
            }
            NodeKind::ArrayAccess { array, index } => vec![*array, *index],
            NodeKind::MethodInvocation { target, args } => {
                std::iter::once(*target).chain(args.iter().copied()).collect()
            }
            NodeKind::ObjectCreation {
                args, class_body, ..
            } => args.iter().copied().chain(*class_body).collect(),
            NodeKind::ArrayCreation { dims, init } => {
                dims.iter().chain(init.iter()).copied().collect()
            }
            NodeKind::Unary { operand, .. }
            | NodeKind::InstanceOf { operand, .. }
            | NodeKind::TypeCast(operand)
            | NodeKind::WideningConversion(operand)
            | NodeKind::NarrowingConversion(operand)
            | NodeKind::StringConversion(operand)
            | NodeKind::Throw(operand)
            | NodeKind::LambdaResult(operand) => vec![*operand],
            NodeKind::Binary { lhs, rhs, .. } | NodeKind::StringConcat { lhs, rhs } => {
                vec![*lhs, *rhs]
            }
            NodeKind::StringConcatAssign { target, value }
            | NodeKind::Assignment { target, value } => vec![*target, *value],
            NodeKind::Ternary { cond, then, else_ } => vec![*cond, *then, *else_],
            NodeKind::Return(value) => value.iter().copied().collect(),
            NodeKind::AssertionError { condition, detail } => {
                std::iter::once(*condition).chain(*detail).collect()
            }
            NodeKind::Synchronized { lock, .. } => vec![*lock],
            NodeKind::Case { selector, labels } => {
                std::iter::once(*selector).chain(labels.iter().copied()).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// One operation of a control flow graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// What the node does.
    pub kind: NodeKind,
    /// The static type of the value the node produces.
    pub ty: Type,
    /// The input tree the node was generated for. Synthetic nodes that stand for no tree
    /// of their own have none.
    pub tree: Option<TreeId>,
    /// Additional properties.
    pub flags: NodeFlags,
}

impl Node {
    /// Creates a node that corresponds to source code.
    #[must_use]
    pub fn new(kind: NodeKind, ty: Type, tree: Option<TreeId>) -> Self {
        Node {
            kind,
            ty,
            tree,
            flags: NodeFlags::IN_SOURCE,
        }
    }

    /// Creates a node synthesized by the builder.
    #[must_use]
    pub fn synthetic(kind: NodeKind, ty: Type, tree: Option<TreeId>) -> Self {
        Node {
            kind,
            ty,
            tree,
            flags: NodeFlags::empty(),
        }
    }

    /// Returns `true` unless the node was synthesized.
    #[must_use]
    pub const fn is_in_source(&self) -> bool {
        self.flags.contains(NodeFlags::IN_SOURCE)
    }

    /// Returns `true` if the node is the target of an assignment.
    #[must_use]
    pub const fn is_lvalue(&self) -> bool {
        self.flags.contains(NodeFlags::LVALUE)
    }
}

/// Owning storage for all nodes of one graph.
#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a node and returns its id.
    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId::from_index(self.nodes.len()).unwrap_or(NodeId(u32::MAX));
        self.nodes.push(node);
        id
    }

    /// Returns the node with the given id.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the arena holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over all nodes with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map_while(|(i, node)| Some((NodeId::from_index(i)?, node)))
    }

    /// One-line human readable description of a node, e.g.
    /// `n4 = Binary(>) [n2, n3] : boolean`.
    #[must_use]
    pub fn describe(&self, id: NodeId) -> String {
        let Some(node) = self.get(id) else {
            return format!("{id} = <missing>");
        };

        let detail = match &node.kind {
            NodeKind::Literal(value) => format!("({value})"),
            NodeKind::LocalVariable(name) | NodeKind::VariableDeclaration(name) => {
                format!("({name})")
            }
            NodeKind::ClassName => format!("({})", node.ty),
            NodeKind::FieldAccess { field, .. } => format!("(.{field})"),
            NodeKind::MethodAccess { method, .. } => format!("(.{})", method.name),
            NodeKind::ObjectCreation { ctor, .. } => format!("({})", ctor.owner),
            NodeKind::Unary { op, .. } => format!("({op})"),
            NodeKind::Binary { op, .. } => format!("({op})"),
            NodeKind::InstanceOf { target, .. } => format!("({target})"),
            NodeKind::Synchronized { start, .. } => {
                format!("({})", if *start { "start" } else { "end" })
            }
            NodeKind::Marker(text) => format!("({text})"),
            _ => String::new(),
        };

        let operands = node.kind.operands();
        let mut out = format!("{id} = {}{detail}", node.kind.name());
        if !operands.is_empty() {
            let list: Vec<String> = operands.iter().map(ToString::to_string).collect();
            out.push_str(&format!(" [{}]", list.join(", ")));
        }
        out.push_str(&format!(" : {}", node.ty));
        if node.is_lvalue() {
            out.push_str(" (lvalue)");
        }
        if !node.is_in_source() {
            out.push_str(" (synthetic)");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_flags() {
        let source = Node::new(NodeKind::ImplicitThis, Type::object(), None);
        assert!(source.is_in_source());
        assert!(!source.is_lvalue());

        let mut synthetic = Node::synthetic(NodeKind::LocalVariable("t".into()), Type::int(), None);
        synthetic.flags.insert(NodeFlags::LVALUE);
        assert!(!synthetic.is_in_source());
        assert!(synthetic.is_lvalue());
    }

    #[test]
    fn test_arena_describe() {
        let mut arena = NodeArena::new();
        let x = arena.push(Node::new(
            NodeKind::LocalVariable("x".into()),
            Type::int(),
            Some(TreeId(0)),
        ));
        let zero = arena.push(Node::new(
            NodeKind::Literal(Literal::Int(0)),
            Type::int(),
            Some(TreeId(1)),
        ));
        let cmp = arena.push(Node::new(
            NodeKind::Binary {
                op: BinaryOp::Gt,
                lhs: x,
                rhs: zero,
            },
            Type::boolean(),
            Some(TreeId(2)),
        ));

        assert_eq!(arena.len(), 3);
        assert_eq!(arena.describe(cmp), "n2 = Binary(>) [n0, n1] : boolean");
        assert_eq!(arena.describe(x), "n0 = LocalVariable(x) : int");
    }

    #[test]
    fn test_operands_order() {
        let kind = NodeKind::MethodInvocation {
            target: NodeId(3),
            args: vec![NodeId(1), NodeId(2)],
        };
        assert_eq!(kind.operands(), vec![NodeId(3), NodeId(1), NodeId(2)]);
        assert!(NodeKind::ClassDeclaration.operands().is_empty());
    }
}

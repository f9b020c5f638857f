//! Linearization of a body into extended nodes.
//!
//! The translation walks the tree once, depth first and left to right, and appends one
//! [`ExtendedNode`] per evaluation step. Control transfers are expressed with [`Label`]s
//! that are bound to sequence positions as the walk proceeds; every bound position is a
//! *leader*, i.e. it starts a new basic block during assembly.
//!
//! Implicit conversions (boxing, unboxing, numeric promotion, ...) are decided only after
//! the operand has been emitted. They are inserted directly behind the operand, moving
//! later label bindings and leaders up by one.
//!
//! The implementation is split by construct:
//!
//! - `convert` - implicit conversions and call argument conversion
//! - `expr` - expressions
//! - `stmt` - statements, loops and assertions
//! - `switch` - switch statements and switch expressions
//! - `try_stmt` - try statements, finally copies and resources

mod convert;
mod expr;
mod stmt;
mod switch;
mod try_stmt;

use std::{fmt, sync::Arc};

use log::{debug, trace};
use rustc_hash::FxHashMap;

use crate::{
    analysis::cfg::{
        builder::{
            extended::ExtendedNode,
            label::{Label, LabelCell, ScopeMap},
            try_stack::TryStack,
            BuilderOptions,
        },
        Node, NodeArena, NodeFlags, NodeId, NodeKind, TreeLookups,
    },
    ast::{Block, ClassDecl, LambdaBody, LambdaExpr, TreeId, UnderlyingAst},
    types::{Type, TypeHierarchy, WellKnownType},
    utils::BitSet,
    Error, Result,
};

use self::switch::SwitchResult;

/// Causes of implicit edges out of a class name evaluation.
const CLASS_LOADING: &[WellKnownType] = &[
    WellKnownType::ClassCircularityError,
    WellKnownType::ClassFormatError,
    WellKnownType::NoClassDefFoundError,
    WellKnownType::OutOfMemoryError,
];

/// The linearized form of one body.
///
/// Produced by [`crate::CfgBuilder::linearize`] and consumed by
/// [`crate::CfgBuilder::assemble`]. Its [`fmt::Display`] output lists the sequence with the
/// labels bound to each position, which is the most useful view when debugging the
/// translation of a construct.
#[derive(Debug, Clone)]
pub struct PhaseOneResult<'ast> {
    pub(crate) underlying: UnderlyingAst<'ast>,
    pub(crate) sequence: Vec<ExtendedNode>,
    pub(crate) bindings: FxHashMap<Label, usize>,
    pub(crate) leaders: BitSet,
    pub(crate) regular_exit: Label,
    pub(crate) exceptional_exit: Label,
    pub(crate) nodes: NodeArena,
    pub(crate) lookups: TreeLookups,
    pub(crate) return_nodes: Vec<NodeId>,
    pub(crate) declared_classes: Vec<&'ast ClassDecl>,
    pub(crate) declared_lambdas: Vec<&'ast LambdaExpr>,
}

impl<'ast> PhaseOneResult<'ast> {
    /// The extended nodes in execution order.
    #[must_use]
    pub fn sequence(&self) -> &[ExtendedNode] {
        &self.sequence
    }

    /// The position `label` is bound to.
    ///
    /// The two exit labels are never bound; they denote the exit blocks.
    #[must_use]
    pub fn binding(&self, label: &Label) -> Option<usize> {
        self.bindings.get(label).copied()
    }

    /// Returns `true` if a label is bound to position `index`.
    #[must_use]
    pub fn is_leader(&self, index: usize) -> bool {
        self.leaders.contains(index)
    }

    /// All leader positions in ascending order.
    pub fn leaders(&self) -> impl Iterator<Item = usize> + '_ {
        self.leaders.iter()
    }

    /// The label denoting normal completion of the body.
    #[must_use]
    pub const fn regular_exit(&self) -> &Label {
        &self.regular_exit
    }

    /// The label denoting completion by an uncaught exception.
    #[must_use]
    pub const fn exceptional_exit(&self) -> &Label {
        &self.exceptional_exit
    }

    /// The operation nodes referenced by the sequence.
    #[must_use]
    pub const fn nodes(&self) -> &NodeArena {
        &self.nodes
    }

    /// The `return` nodes in the order they were emitted.
    #[must_use]
    pub fn return_nodes(&self) -> &[NodeId] {
        &self.return_nodes
    }

    /// The body that was linearized.
    #[must_use]
    pub const fn underlying(&self) -> &UnderlyingAst<'ast> {
        &self.underlying
    }

    /// Labels that some element jumps to but that are bound nowhere, excluding the exit
    /// labels. Empty for every successful translation.
    #[must_use]
    pub fn unbound_labels(&self) -> Vec<&Label> {
        let mut unbound: Vec<&Label> = Vec::new();
        for element in &self.sequence {
            for target in element.targets() {
                let is_exit = *target == self.regular_exit || *target == self.exceptional_exit;
                if !is_exit && !self.bindings.contains_key(target) && !unbound.contains(&target) {
                    unbound.push(target);
                }
            }
        }
        unbound
    }
}

impl fmt::Display for PhaseOneResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bound_at: FxHashMap<usize, Vec<&Label>> = FxHashMap::default();
        for (label, index) in &self.bindings {
            bound_at.entry(*index).or_default().push(label);
        }

        writeln!(f, "linearized {}", self.underlying.describe())?;
        for (index, element) in self.sequence.iter().enumerate() {
            if let Some(labels) = bound_at.get_mut(&index) {
                labels.sort_by(|a, b| a.name().cmp(b.name()));
                for label in labels.iter() {
                    writeln!(f, "{label}:")?;
                }
            }
            let leader = if self.leaders.contains(index) { '*' } else { ' ' };
            writeln!(f, "{index:>5}{leader} {}", element.describe(&self.nodes))?;
        }
        Ok(())
    }
}

/// Jump targets of the statement being translated.
///
/// A new scope is installed with [`std::mem::replace`] when a construct changes a target
/// and the previous one is put back when the construct ends.
#[derive(Debug, Clone)]
pub(super) struct Scope {
    /// Target of an unlabeled `break`, if any construct accepts one.
    pub(super) break_target: Option<LabelCell>,
    /// Target of an unlabeled `continue`, if inside a loop.
    pub(super) continue_target: Option<LabelCell>,
    /// Target of `return`.
    pub(super) return_target: LabelCell,
    /// Targets of `break name`.
    pub(super) break_labels: ScopeMap,
    /// Targets of `continue name`.
    pub(super) continue_labels: ScopeMap,
}

impl Scope {
    fn new(regular_exit: Label) -> Self {
        Scope {
            break_target: None,
            continue_target: None,
            return_target: LabelCell::with(regular_exit),
            break_labels: ScopeMap::new(),
            continue_labels: ScopeMap::new(),
        }
    }

    /// The scope of the protected region of a try statement with a finally block.
    ///
    /// Every target is replaced by a vacant cell, so a jump out of the region lands on a
    /// fresh label where a copy of the finally block is emitted later.
    pub(super) fn finally_region(&self) -> Self {
        Scope {
            break_target: self.break_target.as_ref().map(|_| LabelCell::vacant()),
            continue_target: self.continue_target.as_ref().map(|_| LabelCell::vacant()),
            return_target: LabelCell::vacant(),
            break_labels: ScopeMap::finally_region(),
            continue_labels: ScopeMap::finally_region(),
        }
    }
}

/// Runs the linearization of `underlying`.
pub(super) fn linearize<'ast>(
    underlying: UnderlyingAst<'ast>,
    hierarchy: &dyn TypeHierarchy,
    options: &BuilderOptions,
) -> Result<PhaseOneResult<'ast>> {
    let mut phase = PhaseOne::new(underlying, hierarchy, options);
    phase.process()?;

    debug!(
        "linearized {}: {} elements, {} nodes, {} labels, {} leaders",
        underlying.describe(),
        phase.sequence.len(),
        phase.nodes.len(),
        phase.bindings.len(),
        phase.leaders.count()
    );
    Ok(phase.finish())
}

/// State of one linearization.
pub(super) struct PhaseOne<'a, 'ast> {
    hierarchy: &'a dyn TypeHierarchy,
    options: &'a BuilderOptions,
    underlying: UnderlyingAst<'ast>,

    sequence: Vec<ExtendedNode>,
    bindings: FxHashMap<Label, usize>,
    leaders: BitSet,
    nodes: NodeArena,
    lookups: TreeLookups,
    /// Maps the tree inside parentheses to the parenthesized tree.
    parens: FxHashMap<TreeId, TreeId>,

    return_nodes: Vec<NodeId>,
    declared_classes: Vec<&'ast ClassDecl>,
    declared_lambdas: Vec<&'ast LambdaExpr>,

    scope: Scope,
    try_stack: TryStack,
    regular_exit: Label,
    exceptional_exit: Label,
    /// Result variables of the enclosing switch expressions, innermost last.
    switch_results: Vec<SwitchResult>,
    /// Name of the synthetic variable standing for "assertions are enabled".
    assertions_flag: Option<Arc<str>>,
    depth: usize,
}

impl<'a, 'ast> PhaseOne<'a, 'ast> {
    fn new(
        underlying: UnderlyingAst<'ast>,
        hierarchy: &'a dyn TypeHierarchy,
        options: &'a BuilderOptions,
    ) -> Self {
        let regular_exit = Label::named("regularExit");
        let exceptional_exit = Label::named("exceptionalExit");

        PhaseOne {
            hierarchy,
            options,
            underlying,
            sequence: Vec::new(),
            bindings: FxHashMap::default(),
            leaders: BitSet::new(64),
            nodes: NodeArena::new(),
            lookups: TreeLookups::default(),
            parens: FxHashMap::default(),
            return_nodes: Vec::new(),
            declared_classes: Vec::new(),
            declared_lambdas: Vec::new(),
            scope: Scope::new(regular_exit.clone()),
            try_stack: TryStack::new(exceptional_exit.clone()),
            regular_exit,
            exceptional_exit,
            switch_results: Vec::new(),
            assertions_flag: None,
            depth: 0,
        }
    }

    fn finish(self) -> PhaseOneResult<'ast> {
        PhaseOneResult {
            underlying: self.underlying,
            sequence: self.sequence,
            bindings: self.bindings,
            leaders: self.leaders,
            regular_exit: self.regular_exit,
            exceptional_exit: self.exceptional_exit,
            nodes: self.nodes,
            lookups: self.lookups,
            return_nodes: self.return_nodes,
            declared_classes: self.declared_classes,
            declared_lambdas: self.declared_lambdas,
        }
    }

    fn process(&mut self) -> Result<()> {
        let underlying = self.underlying;
        match underlying {
            UnderlyingAst::Method { method, .. } => self.block(&method.body)?,
            UnderlyingAst::Lambda { lambda, .. } => match &lambda.body {
                LambdaBody::Expr(body) => {
                    let value = self.expr(body)?;
                    let ty = self.ty_of(value);
                    self.extend(Node::new(NodeKind::LambdaResult(value), ty, None));
                }
                LambdaBody::Block(body) => self.block(body)?,
            },
            UnderlyingAst::Arbitrary { code, .. } => self.block(code)?,
            UnderlyingAst::FieldInitializer {
                field,
                is_static,
                class,
            } => {
                let init = field.init.as_ref().ok_or_else(|| {
                    Error::UnexpectedTree(format!("field {} has no initializer", field.name))
                })?;

                let owner = Type::class(&class.name);
                let receiver = self.implicit_receiver(&owner, is_static);
                let value = self.expr(init)?;
                let value = self.assign_convert(value, &field.ty);
                let target = self.extend(lvalue(Node::new(
                    NodeKind::FieldAccess {
                        receiver,
                        field: field.name.clone(),
                        is_static,
                    },
                    field.ty.clone(),
                    None,
                )));
                self.extend(Node::new(
                    NodeKind::Assignment { target, value },
                    field.ty.clone(),
                    Some(field.id),
                ));
            }
        }

        let exit = self.regular_exit.clone();
        self.jump(exit);
        Ok(())
    }

    /// Translates the statements of `block` in order.
    fn block(&mut self, block: &'ast Block) -> Result<()> {
        for stmt in &block.stmts {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    /// Enters one level of nesting.
    fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(Error::RecursionLimit(self.options.max_depth));
        }
        Ok(())
    }

    // Node queries

    fn ty_of(&self, id: NodeId) -> Type {
        self.nodes.get(id).map_or(Type::Void, |node| node.ty.clone())
    }

    fn tree_of(&self, id: NodeId) -> Option<TreeId> {
        self.nodes.get(id).and_then(|node| node.tree)
    }

    /// Returns `true` if the node is `this`, `super` or the implicit receiver, none of
    /// which can be null.
    fn is_this(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|node| {
            matches!(
                node.kind,
                NodeKind::ImplicitThis | NodeKind::ExplicitThis | NodeKind::Super
            )
        })
    }

    // Well-known types

    /// The well-known types of `list` that the hierarchy knows about.
    fn known_causes(&self, list: &[WellKnownType]) -> Vec<Type> {
        list.iter()
            .filter_map(|known| self.hierarchy.well_known(*known))
            .collect()
    }

    /// The causes of every method invocation: the declared ones plus the unchecked roots.
    fn invocation_causes(&self, declared: &[Type]) -> Vec<Type> {
        let mut causes = declared.to_vec();
        for unchecked in
            self.known_causes(&[WellKnownType::RuntimeException, WellKnownType::Error])
        {
            if !causes.contains(&unchecked) {
                causes.push(unchecked);
            }
        }
        causes
    }

    /// A well-known type that the translation cannot do without, such as the type of an
    /// explicitly thrown value.
    fn required(&self, known: WellKnownType) -> Type {
        self.hierarchy
            .well_known(known)
            .unwrap_or_else(|| Type::class(known.class_name()))
    }

    // Emission

    fn record(map: &mut FxHashMap<TreeId, Vec<NodeId>>, tree: TreeId, id: NodeId) {
        let nodes = map.entry(tree).or_default();
        if !nodes.contains(&id) {
            nodes.push(id);
        }
    }

    /// Stores `node` in the arena and in the unconverted lookup of its tree and of every
    /// parenthesized tree around it.
    fn add(&mut self, node: Node) -> NodeId {
        let tree = node.tree;
        let id = self.nodes.push(node);

        let mut current = tree;
        while let Some(tree) = current {
            Self::record(&mut self.lookups.unconverted, tree, id);
            current = self.parens.get(&tree).copied();
        }
        id
    }

    /// Appends an operation that cannot throw.
    fn extend(&mut self, node: Node) -> NodeId {
        let id = self.add(node);
        self.sequence.push(ExtendedNode::node(id));
        id
    }

    /// Appends an operation that may throw any of `causes`.
    fn extend_throwing(&mut self, node: Node, causes: Vec<Type>) -> NodeId {
        let id = self.add(node);
        let element = self.exception_element(id, causes);
        self.sequence.push(element);
        id
    }

    /// Appends an operation that always throws one of `causes`.
    ///
    /// With no known cause the operation is taken to throw an `Error`, since its block
    /// needs some way out.
    fn extend_terminating(&mut self, node: Node, mut causes: Vec<Type>) -> NodeId {
        if causes.is_empty() {
            causes.push(self.required(WellKnownType::Error));
        }
        let id = self.add(node);
        let element = self.exception_element(id, causes).terminating();
        self.sequence.push(element);
        id
    }

    fn exception_element(&self, id: NodeId, causes: Vec<Type>) -> ExtendedNode {
        let causes = causes
            .into_iter()
            .map(|cause| {
                let (labels, _) = self.try_stack.possible_labels(&cause, self.hierarchy);
                (cause, labels)
            })
            .collect();
        ExtendedNode::exception(id, causes)
    }

    /// Inserts `element` directly behind the element carrying `after`.
    ///
    /// Bindings and leaders at or behind the insertion point move up by one, so labels
    /// bound after the operand keep pointing at what followed it.
    fn insert_after(&mut self, after: NodeId, element: ExtendedNode) {
        let Some(position) = self
            .sequence
            .iter()
            .rposition(|existing| existing.node_id() == Some(after))
        else {
            self.sequence.push(element);
            return;
        };

        let index = position + 1;
        self.sequence.insert(index, element);
        for bound in self.bindings.values_mut() {
            if *bound >= index {
                *bound += 1;
            }
        }
        self.leaders.shift_up_from(index);
        trace!("inserted element at {index} behind {after}");
    }

    /// Inserts a conversion node behind `after` and records it in the converted lookup.
    fn insert_node_after(&mut self, after: NodeId, node: Node) -> NodeId {
        let tree = node.tree;
        let id = self.nodes.push(node);
        if let Some(tree) = tree {
            Self::record(&mut self.lookups.converted, tree, id);
        }
        self.insert_after(after, ExtendedNode::node(id));
        id
    }

    /// Like [`PhaseOne::insert_node_after`] for a conversion step that may throw.
    fn insert_throwing_after(&mut self, after: NodeId, node: Node, causes: Vec<Type>) -> NodeId {
        let tree = node.tree;
        let id = self.nodes.push(node);
        if let Some(tree) = tree {
            Self::record(&mut self.lookups.converted, tree, id);
        }
        let element = self.exception_element(id, causes);
        self.insert_after(after, element);
        id
    }

    /// Appends an unconditional jump.
    fn jump(&mut self, target: Label) {
        self.sequence.push(ExtendedNode::jump(target));
    }

    /// Appends a conditional jump on the boolean value of `condition`.
    fn branch(&mut self, condition: NodeId, then: Label, else_: Label) -> Result<()> {
        let ty = self.ty_of(condition);
        if ty != Type::boolean() {
            return Err(internal_error!(
                "conditional jump on {condition} of type {ty}, expected boolean"
            ));
        }
        self.sequence
            .push(ExtendedNode::conditional_jump(condition, then, else_));
        Ok(())
    }

    /// Binds `label` to the position of the next element.
    fn bind(&mut self, label: &Label) -> Result<()> {
        let index = self.sequence.len();
        if self.bindings.contains_key(label) {
            return Err(Error::LabelRebound(label.name().to_string()));
        }
        self.bindings.insert(label.clone(), index);
        self.leaders.insert(index);
        Ok(())
    }

    /// Appends a marker node.
    fn marker(&mut self, text: String, tree: TreeId) -> NodeId {
        self.extend(Node::new(
            NodeKind::Marker(Arc::from(text)),
            Type::Void,
            Some(tree),
        ))
    }

    /// Appends the evaluation of a type name.
    fn class_name(&mut self, ty: Type, tree: Option<TreeId>) -> NodeId {
        let causes = self.known_causes(CLASS_LOADING);
        self.extend_throwing(Node::new(NodeKind::ClassName, ty, tree), causes)
    }

    /// Appends the receiver of an unqualified member access.
    fn implicit_receiver(&mut self, owner: &Type, is_static: bool) -> NodeId {
        if is_static {
            self.class_name(owner.clone(), None)
        } else {
            self.extend(Node::new(NodeKind::ImplicitThis, owner.clone(), None))
        }
    }

    /// Appends a synthetic local variable declaration.
    fn declare_temp(&mut self, name: &Arc<str>, ty: Type) -> NodeId {
        self.extend(Node::synthetic(
            NodeKind::VariableDeclaration(name.clone()),
            ty,
            None,
        ))
    }

    /// Appends a synthetic read of a local variable.
    fn read_temp(&mut self, name: &Arc<str>, ty: Type) -> NodeId {
        self.extend(Node::synthetic(
            NodeKind::LocalVariable(name.clone()),
            ty,
            None,
        ))
    }

    /// Flags an already translated node as the target of an assignment.
    fn mark_lvalue(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.flags.insert(NodeFlags::LVALUE);
        }
    }

    /// Appends a synthetic assignment of `value` to the local variable `name`.
    fn assign_temp(&mut self, name: &Arc<str>, ty: Type, value: NodeId) -> NodeId {
        let target = self.extend(lvalue(Node::synthetic(
            NodeKind::LocalVariable(name.clone()),
            ty.clone(),
            None,
        )));
        self.extend(Node::synthetic(
            NodeKind::Assignment { target, value },
            ty,
            None,
        ))
    }
}

/// Flags `node` as the target of an assignment.
fn lvalue(mut node: Node) -> Node {
    node.flags.insert(NodeFlags::LVALUE);
    node
}

//! Statement trees.

use std::sync::Arc;

use crate::{
    ast::{ClassDecl, Expr, MethodSig, TreeId},
    types::Type,
};

/// A statement.
#[derive(Debug, Clone)]
pub struct Stmt {
    /// Identity of this tree.
    pub id: TreeId,
    /// What kind of statement this is.
    pub kind: StmtKind,
}

/// A braced sequence of statements.
#[derive(Debug, Clone)]
pub struct Block {
    /// Identity of this tree.
    pub id: TreeId,
    /// Statements in source order.
    pub stmts: Vec<Stmt>,
}

/// A local variable, parameter, catch parameter or field declaration.
#[derive(Debug, Clone)]
pub struct VarDecl {
    /// Identity of this tree.
    pub id: TreeId,
    /// Declared name.
    pub name: Arc<str>,
    /// Declared type.
    pub ty: Type,
    /// Initializer expression.
    pub init: Option<Expr>,
}

/// The different kinds of statements.
#[derive(Debug, Clone)]
pub enum StmtKind {
    /// `{ ... }`
    Block(Block),
    /// An expression evaluated for its side effects.
    Expr(Expr),
    /// A local variable declaration.
    Local(VarDecl),
    /// `if (cond) then else otherwise`
    If {
        /// The condition.
        cond: Expr,
        /// Statement executed if the condition holds.
        then: Box<Stmt>,
        /// Optional else branch.
        otherwise: Option<Box<Stmt>>,
    },
    /// `while (cond) body`
    While {
        /// The loop condition.
        cond: Expr,
        /// The loop body.
        body: Box<Stmt>,
    },
    /// `do body while (cond);`
    DoWhile {
        /// The loop body.
        body: Box<Stmt>,
        /// The loop condition.
        cond: Expr,
    },
    /// `for (init; cond; update) body`
    For {
        /// Initializer statements.
        init: Vec<Stmt>,
        /// Optional loop condition; absent means `true`.
        cond: Option<Expr>,
        /// Update expressions.
        update: Vec<Expr>,
        /// The loop body.
        body: Box<Stmt>,
    },
    /// `for (var : iterable) body`
    ForEach {
        /// The loop variable.
        var: VarDecl,
        /// An array or an `Iterable`.
        iterable: Expr,
        /// The loop body.
        body: Box<Stmt>,
    },
    /// `label: body`
    Labeled {
        /// The statement label.
        label: Arc<str>,
        /// The labeled statement.
        body: Box<Stmt>,
    },
    /// `break` or `break label`
    Break(Option<Arc<str>>),
    /// `continue` or `continue label`
    Continue(Option<Arc<str>>),
    /// `return` or `return value`
    Return(Option<Expr>),
    /// `throw value`
    Throw(Expr),
    /// `yield value` inside a switch expression.
    Yield(Expr),
    /// A switch statement.
    Switch(Switch),
    /// A try statement, with or without resources.
    Try(Try),
    /// `assert cond : detail`
    Assert {
        /// The asserted condition.
        cond: Expr,
        /// Optional detail message.
        detail: Option<Expr>,
    },
    /// `synchronized (lock) body`
    Synchronized {
        /// The monitor expression.
        lock: Expr,
        /// The guarded block.
        body: Block,
    },
    /// A local class declaration.
    Class(ClassDecl),
    /// `;`
    Empty,
}

/// A switch statement or switch expression.
#[derive(Debug, Clone)]
pub struct Switch {
    /// Identity of the switch tree.
    pub id: TreeId,
    /// The selector expression.
    pub selector: Expr,
    /// Cases in source order.
    pub cases: Vec<Case>,
    /// Whether the cases cover every possible selector value (e.g. all enum constants).
    pub exhaustive: bool,
}

/// One case of a switch.
#[derive(Debug, Clone)]
pub struct Case {
    /// Identity of this tree.
    pub id: TreeId,
    /// Case labels; empty for `default`.
    pub labels: Vec<Expr>,
    /// Whether this is the `default` case (possibly combined with labels).
    pub is_default: bool,
    /// The case body.
    pub body: CaseBody,
}

/// The body of a switch case.
#[derive(Debug, Clone)]
pub enum CaseBody {
    /// `case X:` followed by statements; control falls through to the next case.
    Statements(Vec<Stmt>),
    /// `case X -> expr;`
    Expr(Expr),
    /// `case X -> { ... }` or `case X -> throw ...;`
    Stmt(Box<Stmt>),
}

impl CaseBody {
    /// Returns `true` for the arrow forms, which never fall through.
    #[must_use]
    pub const fn is_arrow(&self) -> bool {
        !matches!(self, CaseBody::Statements(_))
    }
}

/// A try statement.
#[derive(Debug, Clone)]
pub struct Try {
    /// Resources in declaration order.
    pub resources: Vec<Resource>,
    /// The protected block.
    pub block: Block,
    /// Catch clauses in source order.
    pub catches: Vec<Catch>,
    /// Optional finally block.
    pub finally: Option<Block>,
}

/// A try-with-resources resource.
#[derive(Debug, Clone)]
pub struct Resource {
    /// Identity of this tree.
    pub id: TreeId,
    /// How the resource is introduced.
    pub kind: ResourceKind,
    /// The `close()` method invoked on the resource.
    pub close: Arc<MethodSig>,
}

/// How a resource is introduced.
#[derive(Debug, Clone)]
pub enum ResourceKind {
    /// `try (T r = init)`
    Decl(VarDecl),
    /// `try (r)` with an effectively final variable or field.
    Expr(Expr),
}

/// A catch clause.
#[derive(Debug, Clone)]
pub struct Catch {
    /// Identity of this tree.
    pub id: TreeId,
    /// The exception parameter; its type is a [`Type::Union`] for multi-catch.
    pub param: VarDecl,
    /// The handler body.
    pub body: Block,
}

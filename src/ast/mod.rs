//! The resolved input tree.
//!
//! The builder consumes the body of one procedure as a fully resolved, type-checked tree:
//! every expression carries its static [`Type`], every call site its target
//! [`MethodSig`], and every name has already been classified as a local variable, a field or
//! a type. Producing such trees (parsing, name resolution, type attribution) is the job of
//! a front end and outside the scope of this crate.
//!
//! # Key Components
//!
//! - [`Expr`] / [`ExprKind`] - Expressions with their static types
//! - [`Stmt`] / [`StmtKind`] - Statements, including switch and try statements
//! - [`MethodDecl`], [`ClassDecl`], [`LambdaExpr`] - Declarations that own bodies
//! - [`UnderlyingAst`] - Selects the body a control flow graph is built for
//! - [`AstBuilder`] - Convenience factory that assigns tree ids and infers types
//!
//! # Tree Identity
//!
//! Every tree node carries a [`TreeId`]. The control flow graph maps tree ids back to the
//! operation nodes generated for them. Ids must be unique within one body; the
//! [`AstBuilder`] guarantees this by numbering trees sequentially.

mod builder;
mod decl;
mod expr;
mod stmt;

pub use builder::AstBuilder;
pub use decl::{ClassDecl, LambdaBody, LambdaExpr, Member, MethodDecl, MethodSig};
pub use expr::{BinaryOp, Expr, ExprKind, Literal, UnaryOp};
pub use stmt::{Block, Case, CaseBody, Catch, Resource, ResourceKind, Stmt, StmtKind, Switch, Try, VarDecl};

use crate::types::Type;

/// Identity of a node in the input tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TreeId(pub u32);

impl std::fmt::Display for TreeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// The body a control flow graph is built for, together with its enclosing class.
///
/// A graph borrows from the tree it was built from, so the tree must outlive the graph.
#[derive(Debug, Clone, Copy)]
pub enum UnderlyingAst<'ast> {
    /// The body of a method or constructor.
    Method {
        /// The method declaration.
        method: &'ast MethodDecl,
        /// The declaring class.
        class: &'ast ClassDecl,
    },
    /// The body of a lambda expression.
    Lambda {
        /// The lambda expression.
        lambda: &'ast LambdaExpr,
        /// The class whose code contains the lambda.
        class: &'ast ClassDecl,
    },
    /// An arbitrary block of code, such as an instance or static initializer.
    Arbitrary {
        /// The block.
        code: &'ast Block,
        /// The class containing the block.
        class: &'ast ClassDecl,
    },
    /// The initializer expression of a field.
    FieldInitializer {
        /// The field declaration; its initializer is translated.
        field: &'ast VarDecl,
        /// Whether the field is static.
        is_static: bool,
        /// The declaring class.
        class: &'ast ClassDecl,
    },
}

impl<'ast> UnderlyingAst<'ast> {
    /// Selects the body of `method`.
    #[must_use]
    pub const fn method(method: &'ast MethodDecl, class: &'ast ClassDecl) -> Self {
        UnderlyingAst::Method { method, class }
    }

    /// Selects the body of `lambda`.
    #[must_use]
    pub const fn lambda(lambda: &'ast LambdaExpr, class: &'ast ClassDecl) -> Self {
        UnderlyingAst::Lambda { lambda, class }
    }

    /// Selects an arbitrary block.
    #[must_use]
    pub const fn arbitrary(code: &'ast Block, class: &'ast ClassDecl) -> Self {
        UnderlyingAst::Arbitrary { code, class }
    }

    /// Selects the initializer of a field.
    #[must_use]
    pub const fn field_initializer(
        field: &'ast VarDecl,
        is_static: bool,
        class: &'ast ClassDecl,
    ) -> Self {
        UnderlyingAst::FieldInitializer {
            field,
            is_static,
            class,
        }
    }

    /// The enclosing class.
    #[must_use]
    pub const fn class(&self) -> &'ast ClassDecl {
        match self {
            UnderlyingAst::Method { class, .. }
            | UnderlyingAst::Lambda { class, .. }
            | UnderlyingAst::Arbitrary { class, .. }
            | UnderlyingAst::FieldInitializer { class, .. } => class,
        }
    }

    /// The type `return` statements convert their value to, if the body can return a value.
    #[must_use]
    pub fn return_type(&self) -> Option<&'ast Type> {
        match self {
            UnderlyingAst::Method { method, .. } => Some(&method.return_type),
            UnderlyingAst::Lambda { lambda, .. } => Some(&lambda.return_type),
            UnderlyingAst::Arbitrary { .. } | UnderlyingAst::FieldInitializer { .. } => None,
        }
    }

    /// Short name of the selected body, used in logs and graph titles.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            UnderlyingAst::Method { method, class } => format!("{}.{}", class.name, method.name),
            UnderlyingAst::Lambda { lambda, class } => {
                format!("{}.lambda${}", class.name, lambda.id.0)
            }
            UnderlyingAst::Arbitrary { code, class } => {
                format!("{}.<block {}>", class.name, code.id.0)
            }
            UnderlyingAst::FieldInitializer { field, class, .. } => {
                format!("{}.{} = ...", class.name, field.name)
            }
        }
    }
}

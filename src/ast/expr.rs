//! Expression trees.

use std::sync::Arc;

use strum::{Display, IntoStaticStr};

use crate::{
    ast::{ClassDecl, LambdaExpr, MethodSig, Switch, TreeId},
    types::Type,
};

/// A resolved expression together with its static type.
#[derive(Debug, Clone)]
pub struct Expr {
    /// Identity of this tree.
    pub id: TreeId,
    /// Static type assigned by the front end.
    pub ty: Type,
    /// What kind of expression this is.
    pub kind: ExprKind,
}

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `true` or `false`
    Bool(bool),
    /// An integral literal; the expression type tells `int` and `long` apart.
    Int(i64),
    /// A character literal.
    Char(char),
    /// A floating point literal; the expression type tells `float` and `double` apart.
    Float(f64),
    /// A string literal.
    Str(Arc<str>),
    /// `null`
    Null,
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Bool(value) => write!(f, "{value}"),
            Literal::Int(value) => write!(f, "{value}"),
            Literal::Char(value) => write!(f, "'{}'", value.escape_default()),
            Literal::Float(value) => write!(f, "{value}"),
            Literal::Str(value) => write!(f, "\"{}\"", value.escape_default()),
            Literal::Null => write!(f, "null"),
        }
    }
}

/// Unary operators, including the four increment and decrement forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum UnaryOp {
    /// `+x`
    #[strum(serialize = "+")]
    Plus,
    /// `-x`
    #[strum(serialize = "-")]
    Minus,
    /// `~x`
    #[strum(serialize = "~")]
    BitNot,
    /// `!x`
    #[strum(serialize = "!")]
    Not,
    /// `++x`
    #[strum(serialize = "++x")]
    PreIncrement,
    /// `--x`
    #[strum(serialize = "--x")]
    PreDecrement,
    /// `x++`
    #[strum(serialize = "x++")]
    PostIncrement,
    /// `x--`
    #[strum(serialize = "x--")]
    PostDecrement,
}

impl UnaryOp {
    /// Returns `true` for the increment and decrement operators.
    #[must_use]
    pub const fn is_step(self) -> bool {
        matches!(
            self,
            UnaryOp::PreIncrement
                | UnaryOp::PreDecrement
                | UnaryOp::PostIncrement
                | UnaryOp::PostDecrement
        )
    }
}

/// Binary operators.
///
/// The same operators are used for compound assignments (`a += b` is a
/// [`ExprKind::CompoundAssign`] with [`BinaryOp::Add`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum BinaryOp {
    /// `+`, numeric addition or string concatenation
    #[strum(serialize = "+")]
    Add,
    /// `-`
    #[strum(serialize = "-")]
    Sub,
    /// `*`
    #[strum(serialize = "*")]
    Mul,
    /// `/`
    #[strum(serialize = "/")]
    Div,
    /// `%`
    #[strum(serialize = "%")]
    Rem,
    /// `<<`
    #[strum(serialize = "<<")]
    Shl,
    /// `>>`
    #[strum(serialize = ">>")]
    Shr,
    /// `>>>`
    #[strum(serialize = ">>>")]
    UShr,
    /// `<`
    #[strum(serialize = "<")]
    Lt,
    /// `<=`
    #[strum(serialize = "<=")]
    Le,
    /// `>`
    #[strum(serialize = ">")]
    Gt,
    /// `>=`
    #[strum(serialize = ">=")]
    Ge,
    /// `==`
    #[strum(serialize = "==")]
    Eq,
    /// `!=`
    #[strum(serialize = "!=")]
    Ne,
    /// `&`, bitwise or non-short-circuit logical
    #[strum(serialize = "&")]
    BitAnd,
    /// `|`, bitwise or non-short-circuit logical
    #[strum(serialize = "|")]
    BitOr,
    /// `^`
    #[strum(serialize = "^")]
    BitXor,
    /// `&&`
    #[strum(serialize = "&&")]
    And,
    /// `||`
    #[strum(serialize = "||")]
    Or,
}

impl BinaryOp {
    /// Returns `true` for `<`, `<=`, `>` and `>=`.
    #[must_use]
    pub const fn is_relational(self) -> bool {
        matches!(self, BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge)
    }

    /// Returns `true` for `==` and `!=`.
    #[must_use]
    pub const fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Ne)
    }

    /// Returns `true` for `<<`, `>>` and `>>>`.
    #[must_use]
    pub const fn is_shift(self) -> bool {
        matches!(self, BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr)
    }

    /// Returns `true` for `&`, `|` and `^`.
    #[must_use]
    pub const fn is_bitwise(self) -> bool {
        matches!(self, BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor)
    }

    /// Returns `true` for the short-circuit operators `&&` and `||`.
    #[must_use]
    pub const fn is_short_circuit(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    /// Returns `true` for operators that have a compound assignment form.
    #[must_use]
    pub const fn has_compound_form(self) -> bool {
        !(self.is_relational() || self.is_equality() || self.is_short_circuit())
    }
}

/// The different kinds of expressions.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// A literal value.
    Literal(Literal),
    /// A read of a local variable or parameter.
    Local(Arc<str>),
    /// The `this` keyword.
    This,
    /// The `super` keyword used as a receiver.
    Super,
    /// A field read.
    ///
    /// Without a receiver the field is accessed through the implicit `this`, or through
    /// the owner class if static. A class literal `T.class` is a static field named
    /// `class` whose receiver is a [`ExprKind::TypeName`].
    Field {
        /// Explicit receiver expression.
        receiver: Option<Box<Expr>>,
        /// Simple name of the field.
        name: Arc<str>,
        /// Declaring class.
        owner: Type,
        /// Whether the field is static.
        is_static: bool,
    },
    /// `array[index]`
    ArrayAccess {
        /// The array operand.
        array: Box<Expr>,
        /// The index operand.
        index: Box<Expr>,
    },
    /// A method call.
    Call {
        /// Explicit receiver expression.
        receiver: Option<Box<Expr>>,
        /// The resolved target method.
        method: Arc<MethodSig>,
        /// Actual arguments in source order.
        args: Vec<Expr>,
    },
    /// `new T(args)`, optionally with an anonymous class body.
    NewClass {
        /// Enclosing instance for inner class creation (`outer.new Inner()`).
        enclosing: Option<Box<Expr>>,
        /// The resolved constructor.
        ctor: Arc<MethodSig>,
        /// Actual arguments in source order.
        args: Vec<Expr>,
        /// Body of an anonymous class.
        body: Option<Box<ClassDecl>>,
    },
    /// `new T[d1][d2]...` or `new T[] { ... }`.
    NewArray {
        /// Dimension expressions.
        dims: Vec<Expr>,
        /// Initializer elements.
        init: Option<Vec<Expr>>,
    },
    /// A unary operation, including increments and decrements.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// `target = value`
    Assign {
        /// A local, field or array access.
        target: Box<Expr>,
        /// The assigned value.
        value: Box<Expr>,
    },
    /// `target op= value`
    CompoundAssign {
        /// The operator.
        op: BinaryOp,
        /// A local, field or array access.
        target: Box<Expr>,
        /// The right-hand side.
        value: Box<Expr>,
    },
    /// `cond ? then : else_`
    Conditional {
        /// The condition.
        cond: Box<Expr>,
        /// Value if the condition holds.
        then: Box<Expr>,
        /// Value otherwise.
        else_: Box<Expr>,
    },
    /// `expr instanceof target`
    InstanceOf {
        /// The tested value.
        expr: Box<Expr>,
        /// The tested type.
        target: Type,
    },
    /// `(T) expr`, where `T` is the type of the cast expression itself.
    Cast {
        /// The converted operand.
        expr: Box<Expr>,
    },
    /// `(expr)`
    Parens(Box<Expr>),
    /// A lambda expression.
    Lambda(Box<LambdaExpr>),
    /// `qualifier::name`
    MethodRef {
        /// Expression left of `::`, absent for constructor references on a type.
        qualifier: Option<Box<Expr>>,
        /// Referenced method name.
        name: Arc<str>,
    },
    /// A type name used as an expression, e.g. the receiver of a static call.
    /// The named type is the expression's type.
    TypeName,
    /// A switch expression.
    Switch(Box<Switch>),
}

impl Expr {
    /// Strips any number of enclosing parentheses.
    #[must_use]
    pub fn skip_parens(&self) -> &Expr {
        let mut current = self;
        while let ExprKind::Parens(inner) = &current.kind {
            current = inner;
        }
        current
    }

    /// Returns `true` if this is the boolean literal `true`, ignoring parentheses.
    #[must_use]
    pub fn is_true_literal(&self) -> bool {
        matches!(self.skip_parens().kind, ExprKind::Literal(Literal::Bool(true)))
    }

    /// Returns `true` for literals and negated numeric literals.
    ///
    /// These are the operands for which assignment conversion allows an implicit
    /// narrowing primitive conversion.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        match &self.skip_parens().kind {
            ExprKind::Literal(Literal::Null) => false,
            ExprKind::Literal(_) => true,
            ExprKind::Unary {
                op: UnaryOp::Minus | UnaryOp::Plus,
                operand,
            } => operand.is_constant(),
            _ => false,
        }
    }
}

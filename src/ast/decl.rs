//! Declarations: methods, classes, lambdas and resolved method signatures.

use std::sync::Arc;

use crate::{
    ast::{Block, Expr, TreeId, VarDecl},
    types::Type,
};

/// The resolved signature of a method or constructor.
///
/// Call sites refer to the signature of their target through an [`Arc`] so that many
/// calls to the same method share one description.
///
/// # Examples
///
/// ```rust,ignore
/// use flowscope::ast::MethodSig;
/// use flowscope::types::Type;
///
/// let read = MethodSig::new(Type::class("java.io.Reader"), "read", vec![], Type::int())
///     .throws(Type::class("java.io.IOException"));
/// assert_eq!(read.thrown.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSig {
    /// Simple name; `<init>` for constructors.
    pub name: Arc<str>,
    /// Declaring class.
    pub owner: Type,
    /// Formal parameter types. The last one is an array type for varargs methods.
    pub params: Vec<Type>,
    /// Return type, [`Type::Void`] for constructors.
    pub return_type: Type,
    /// Types listed in the `throws` clause.
    pub thrown: Vec<Type>,
    /// Whether the method is static.
    pub is_static: bool,
    /// Whether the last parameter is a variable arity parameter.
    pub is_varargs: bool,
    /// Whether a call never returns normally (e.g. `System.exit`).
    pub terminates_execution: bool,
}

impl MethodSig {
    /// Creates an instance method signature without thrown types.
    #[must_use]
    pub fn new(owner: Type, name: &str, params: Vec<Type>, return_type: Type) -> Self {
        MethodSig {
            name: Arc::from(name),
            owner,
            params,
            return_type,
            thrown: Vec::new(),
            is_static: false,
            is_varargs: false,
            terminates_execution: false,
        }
    }

    /// Creates a constructor signature for `owner`.
    #[must_use]
    pub fn constructor(owner: Type, params: Vec<Type>) -> Self {
        Self::new(owner, "<init>", params, Type::Void)
    }

    /// Adds a type to the `throws` clause.
    #[must_use]
    pub fn throws(mut self, ty: Type) -> Self {
        self.thrown.push(ty);
        self
    }

    /// Marks the method as static.
    #[must_use]
    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Marks the last parameter as variable arity.
    #[must_use]
    pub fn with_varargs(mut self) -> Self {
        self.is_varargs = true;
        self
    }

    /// Marks calls to the method as never returning normally.
    #[must_use]
    pub fn terminating(mut self) -> Self {
        self.terminates_execution = true;
        self
    }
}

/// A method or constructor declaration.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    /// Identity of this tree.
    pub id: TreeId,
    /// Simple name.
    pub name: Arc<str>,
    /// Formal parameters.
    pub params: Vec<VarDecl>,
    /// Declared return type.
    pub return_type: Type,
    /// The method body.
    pub body: Block,
    /// Whether the method is static.
    pub is_static: bool,
}

/// A class declaration, named or anonymous.
#[derive(Debug, Clone)]
pub struct ClassDecl {
    /// Identity of this tree.
    pub id: TreeId,
    /// Fully qualified or binary name; anonymous classes use a synthetic name.
    pub name: Arc<str>,
    /// Members in declaration order.
    pub members: Vec<Member>,
}

/// A class member.
#[derive(Debug, Clone)]
pub enum Member {
    /// A method or constructor.
    Method(MethodDecl),
    /// A field, optionally with an initializer.
    Field {
        /// The field declaration.
        decl: VarDecl,
        /// Whether the field is static.
        is_static: bool,
    },
    /// An instance or static initializer block.
    Initializer {
        /// Identity of this tree.
        id: TreeId,
        /// Whether this is a `static { ... }` block.
        is_static: bool,
        /// The initializer body.
        body: Block,
    },
}

/// A lambda expression.
#[derive(Debug, Clone)]
pub struct LambdaExpr {
    /// Identity of this tree.
    pub id: TreeId,
    /// Formal parameters.
    pub params: Vec<VarDecl>,
    /// The lambda body.
    pub body: LambdaBody,
    /// Return type of the implemented functional interface method.
    pub return_type: Type,
}

/// The body of a lambda expression.
#[derive(Debug, Clone)]
pub enum LambdaBody {
    /// `x -> expr`
    Expr(Expr),
    /// `x -> { ... }`
    Block(Block),
}

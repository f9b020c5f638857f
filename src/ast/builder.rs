//! Factory for resolved trees.
//!
//! Front ends that already own a resolved tree convert it into [`crate::ast`] nodes
//! directly. [`AstBuilder`] exists for everyone else: tests, benchmarks, fuzzers and small
//! tools that want to construct bodies by hand without numbering trees or computing
//! expression types themselves.

use std::{cell::Cell, sync::Arc};

use crate::{
    ast::{
        BinaryOp, Block, Case, CaseBody, Catch, ClassDecl, Expr, ExprKind, LambdaBody,
        LambdaExpr, Literal, Member, MethodDecl, MethodSig, Resource, ResourceKind, Stmt,
        StmtKind, Switch, TreeId, Try, UnaryOp, VarDecl,
    },
    types::{PrimitiveKind, Type},
};

/// Creates tree nodes with unique [`TreeId`]s and inferred expression types.
///
/// Types are inferred with the usual source-language rules for operators (numeric
/// promotion, string concatenation, boolean results of comparisons). Where inference is
/// not possible from the operands alone, such as method calls, the type is taken from
/// the resolved signature. [`Expr::with_type`] overrides an inferred type.
///
/// # Examples
///
/// ```rust,ignore
/// use flowscope::ast::{AstBuilder, BinaryOp};
/// use flowscope::types::Type;
///
/// let ast = AstBuilder::new();
/// let x = ast.local("x", Type::int());
/// let cond = ast.binary(BinaryOp::Gt, x, ast.int(0));
/// let stmt = ast.if_stmt(cond, ast.expr_stmt(ast.assign(ast.local("y", Type::int()), ast.int(1))), None);
/// ```
#[derive(Debug, Default)]
pub struct AstBuilder {
    next_id: Cell<u32>,
}

impl AstBuilder {
    /// Creates a builder whose first tree gets id 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh tree id.
    pub fn next_id(&self) -> TreeId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        TreeId(id)
    }

    /// Number of ids handed out so far.
    #[must_use]
    pub fn tree_count(&self) -> u32 {
        self.next_id.get()
    }

    fn expr(&self, ty: Type, kind: ExprKind) -> Expr {
        Expr {
            id: self.next_id(),
            ty,
            kind,
        }
    }

    fn stmt(&self, kind: StmtKind) -> Stmt {
        Stmt {
            id: self.next_id(),
            kind,
        }
    }

    // ---------------------------------------------------------------------------------
    // Literals and names
    // ---------------------------------------------------------------------------------

    /// An `int` literal.
    pub fn int(&self, value: i64) -> Expr {
        self.expr(Type::int(), ExprKind::Literal(Literal::Int(value)))
    }

    /// A `long` literal.
    pub fn long(&self, value: i64) -> Expr {
        self.expr(Type::long(), ExprKind::Literal(Literal::Int(value)))
    }

    /// A `double` literal.
    pub fn double(&self, value: f64) -> Expr {
        self.expr(Type::double(), ExprKind::Literal(Literal::Float(value)))
    }

    /// A `char` literal.
    pub fn char(&self, value: char) -> Expr {
        self.expr(Type::char(), ExprKind::Literal(Literal::Char(value)))
    }

    /// A boolean literal.
    pub fn bool(&self, value: bool) -> Expr {
        self.expr(Type::boolean(), ExprKind::Literal(Literal::Bool(value)))
    }

    /// A string literal.
    pub fn string(&self, value: &str) -> Expr {
        self.expr(Type::string(), ExprKind::Literal(Literal::Str(Arc::from(value))))
    }

    /// The `null` literal.
    pub fn null(&self) -> Expr {
        self.expr(Type::Null, ExprKind::Literal(Literal::Null))
    }

    /// A read of a local variable or parameter.
    pub fn local(&self, name: &str, ty: Type) -> Expr {
        self.expr(ty, ExprKind::Local(Arc::from(name)))
    }

    /// `this` of the given class type.
    pub fn this(&self, ty: Type) -> Expr {
        self.expr(ty, ExprKind::This)
    }

    /// `super` of the given class type.
    pub fn super_(&self, ty: Type) -> Expr {
        self.expr(ty, ExprKind::Super)
    }

    /// A type name used as an expression.
    pub fn type_name(&self, ty: Type) -> Expr {
        self.expr(ty, ExprKind::TypeName)
    }

    /// An instance field read; without receiver the implicit `this` is used.
    pub fn field(&self, receiver: Option<Expr>, owner: Type, name: &str, ty: Type) -> Expr {
        self.expr(
            ty,
            ExprKind::Field {
                receiver: receiver.map(Box::new),
                name: Arc::from(name),
                owner,
                is_static: false,
            },
        )
    }

    /// A static field read through the owner's type name.
    pub fn static_field(&self, owner: Type, name: &str, ty: Type) -> Expr {
        let receiver = self.type_name(owner.clone());
        self.expr(
            ty,
            ExprKind::Field {
                receiver: Some(Box::new(receiver)),
                name: Arc::from(name),
                owner,
                is_static: true,
            },
        )
    }

    /// A class literal `T.class`.
    pub fn class_literal(&self, ty: Type) -> Expr {
        let receiver = self.type_name(ty.clone());
        self.expr(
            Type::class("java.lang.Class"),
            ExprKind::Field {
                receiver: Some(Box::new(receiver)),
                name: Arc::from("class"),
                owner: ty,
                is_static: true,
            },
        )
    }

    // ---------------------------------------------------------------------------------
    // Compound expressions
    // ---------------------------------------------------------------------------------

    /// `array[index]`
    pub fn index(&self, array: Expr, index: Expr) -> Expr {
        let ty = array.ty.component().cloned().unwrap_or_else(Type::object);
        self.expr(
            ty,
            ExprKind::ArrayAccess {
                array: Box::new(array),
                index: Box::new(index),
            },
        )
    }

    /// A call; static calls pass `None` as receiver.
    pub fn call(&self, receiver: Option<Expr>, method: &Arc<MethodSig>, args: Vec<Expr>) -> Expr {
        self.expr(
            method.return_type.clone(),
            ExprKind::Call {
                receiver: receiver.map(Box::new),
                method: Arc::clone(method),
                args,
            },
        )
    }

    /// `new T(args)`
    pub fn new_object(&self, ctor: &Arc<MethodSig>, args: Vec<Expr>) -> Expr {
        self.expr(
            ctor.owner.clone(),
            ExprKind::NewClass {
                enclosing: None,
                ctor: Arc::clone(ctor),
                args,
                body: None,
            },
        )
    }

    /// `new T(args) { body }`
    pub fn new_anonymous(&self, ctor: &Arc<MethodSig>, args: Vec<Expr>, body: ClassDecl) -> Expr {
        self.expr(
            ctor.owner.clone(),
            ExprKind::NewClass {
                enclosing: None,
                ctor: Arc::clone(ctor),
                args,
                body: Some(Box::new(body)),
            },
        )
    }

    /// `new element[d1][d2]...`
    pub fn new_array(&self, element: Type, dims: Vec<Expr>) -> Expr {
        let ty = dims.iter().fold(element, |ty, _| Type::array_of(ty));
        self.expr(ty, ExprKind::NewArray { dims, init: None })
    }

    /// `new T[] { init... }` where `array_ty` is `T[]`.
    pub fn array_literal(&self, array_ty: Type, init: Vec<Expr>) -> Expr {
        self.expr(
            array_ty,
            ExprKind::NewArray {
                dims: Vec::new(),
                init: Some(init),
            },
        )
    }

    /// A unary operation, including increments and decrements.
    pub fn unary(&self, op: UnaryOp, operand: Expr) -> Expr {
        let ty = match op {
            UnaryOp::Not => Type::boolean(),
            UnaryOp::Plus | UnaryOp::Minus | UnaryOp::BitNot => operand
                .ty
                .primitive_or_unboxed()
                .map_or_else(|| operand.ty.clone(), |kind| Type::Primitive(kind.unary_promotion())),
            _ => operand.ty.clone(),
        };
        self.expr(
            ty,
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
        )
    }

    /// A binary operation.
    pub fn binary(&self, op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        let ty = Self::binary_type(op, &lhs.ty, &rhs.ty);
        self.expr(
            ty,
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        )
    }

    fn binary_type(op: BinaryOp, lhs: &Type, rhs: &Type) -> Type {
        if op == BinaryOp::Add && (lhs.is_string() || rhs.is_string()) {
            return Type::string();
        }
        if op.is_relational() || op.is_equality() || op.is_short_circuit() {
            return Type::boolean();
        }
        if op.is_bitwise() && lhs.is_boolean() && rhs.is_boolean() {
            return Type::boolean();
        }

        let left = lhs.primitive_or_unboxed();
        if op.is_shift() {
            return left.map_or_else(|| lhs.clone(), |kind| Type::Primitive(kind.unary_promotion()));
        }
        match (left, rhs.primitive_or_unboxed()) {
            (Some(l), Some(r)) => l
                .binary_promotion(r)
                .map_or_else(|| lhs.clone(), Type::Primitive),
            _ => lhs.clone(),
        }
    }

    /// `target = value`
    pub fn assign(&self, target: Expr, value: Expr) -> Expr {
        self.expr(
            target.ty.clone(),
            ExprKind::Assign {
                target: Box::new(target),
                value: Box::new(value),
            },
        )
    }

    /// `target op= value`
    pub fn compound_assign(&self, op: BinaryOp, target: Expr, value: Expr) -> Expr {
        self.expr(
            target.ty.clone(),
            ExprKind::CompoundAssign {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
        )
    }

    /// `cond ? then : else_`
    pub fn conditional(&self, cond: Expr, then: Expr, else_: Expr) -> Expr {
        let ty = Self::conditional_type(&then.ty, &else_.ty);
        self.expr(
            ty,
            ExprKind::Conditional {
                cond: Box::new(cond),
                then: Box::new(then),
                else_: Box::new(else_),
            },
        )
    }

    fn conditional_type(then: &Type, else_: &Type) -> Type {
        if then == else_ {
            return then.clone();
        }
        match (then.primitive_or_unboxed(), else_.primitive_or_unboxed()) {
            (Some(PrimitiveKind::Boolean), Some(PrimitiveKind::Boolean)) => Type::boolean(),
            (Some(l), Some(r)) => l
                .binary_promotion(r)
                .map_or_else(Type::object, Type::Primitive),
            _ => match (then, else_) {
                (Type::Null, other) | (other, Type::Null) => match other.as_primitive() {
                    Some(kind) => Type::boxed(kind),
                    None => other.clone(),
                },
                _ => Type::object(),
            },
        }
    }

    /// `expr instanceof target`
    pub fn instance_of(&self, expr: Expr, target: Type) -> Expr {
        self.expr(
            Type::boolean(),
            ExprKind::InstanceOf {
                expr: Box::new(expr),
                target,
            },
        )
    }

    /// `(ty) expr`
    pub fn cast(&self, ty: Type, expr: Expr) -> Expr {
        self.expr(ty, ExprKind::Cast { expr: Box::new(expr) })
    }

    /// `(expr)`
    pub fn parens(&self, expr: Expr) -> Expr {
        self.expr(expr.ty.clone(), ExprKind::Parens(Box::new(expr)))
    }

    /// A lambda implementing `interface`.
    pub fn lambda(
        &self,
        interface: Type,
        params: Vec<VarDecl>,
        body: LambdaBody,
        return_type: Type,
    ) -> Expr {
        let lambda = LambdaExpr {
            id: self.next_id(),
            params,
            body,
            return_type,
        };
        self.expr(interface, ExprKind::Lambda(Box::new(lambda)))
    }

    /// A method reference implementing `interface`.
    pub fn method_ref(&self, interface: Type, qualifier: Option<Expr>, name: &str) -> Expr {
        self.expr(
            interface,
            ExprKind::MethodRef {
                qualifier: qualifier.map(Box::new),
                name: Arc::from(name),
            },
        )
    }

    /// A switch expression of type `ty`.
    pub fn switch_expr(&self, ty: Type, selector: Expr, cases: Vec<Case>, exhaustive: bool) -> Expr {
        let switch = Switch {
            id: self.next_id(),
            selector,
            cases,
            exhaustive,
        };
        self.expr(ty, ExprKind::Switch(Box::new(switch)))
    }

    // ---------------------------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------------------------

    /// A variable declaration, usable as local, parameter, catch parameter or field.
    pub fn var(&self, name: &str, ty: Type, init: Option<Expr>) -> VarDecl {
        VarDecl {
            id: self.next_id(),
            name: Arc::from(name),
            ty,
            init,
        }
    }

    /// A braced block.
    pub fn block(&self, stmts: Vec<Stmt>) -> Block {
        Block {
            id: self.next_id(),
            stmts,
        }
    }

    /// A braced block as a statement.
    pub fn block_stmt(&self, stmts: Vec<Stmt>) -> Stmt {
        let block = self.block(stmts);
        self.stmt(StmtKind::Block(block))
    }

    /// An expression statement.
    pub fn expr_stmt(&self, expr: Expr) -> Stmt {
        self.stmt(StmtKind::Expr(expr))
    }

    /// A local variable declaration statement.
    pub fn local_var(&self, name: &str, ty: Type, init: Option<Expr>) -> Stmt {
        let decl = self.var(name, ty, init);
        self.stmt(StmtKind::Local(decl))
    }

    /// `if (cond) then else otherwise`
    pub fn if_stmt(&self, cond: Expr, then: Stmt, otherwise: Option<Stmt>) -> Stmt {
        self.stmt(StmtKind::If {
            cond,
            then: Box::new(then),
            otherwise: otherwise.map(Box::new),
        })
    }

    /// `while (cond) body`
    pub fn while_stmt(&self, cond: Expr, body: Stmt) -> Stmt {
        self.stmt(StmtKind::While {
            cond,
            body: Box::new(body),
        })
    }

    /// `do body while (cond);`
    pub fn do_while(&self, body: Stmt, cond: Expr) -> Stmt {
        self.stmt(StmtKind::DoWhile {
            body: Box::new(body),
            cond,
        })
    }

    /// `for (init; cond; update) body`
    pub fn for_stmt(&self, init: Vec<Stmt>, cond: Option<Expr>, update: Vec<Expr>, body: Stmt) -> Stmt {
        self.stmt(StmtKind::For {
            init,
            cond,
            update,
            body: Box::new(body),
        })
    }

    /// `for (var : iterable) body`
    pub fn for_each(&self, var: VarDecl, iterable: Expr, body: Stmt) -> Stmt {
        self.stmt(StmtKind::ForEach {
            var,
            iterable,
            body: Box::new(body),
        })
    }

    /// `label: body`
    pub fn labeled(&self, label: &str, body: Stmt) -> Stmt {
        self.stmt(StmtKind::Labeled {
            label: Arc::from(label),
            body: Box::new(body),
        })
    }

    /// `break` or `break label`
    pub fn break_stmt(&self, label: Option<&str>) -> Stmt {
        self.stmt(StmtKind::Break(label.map(Arc::from)))
    }

    /// `continue` or `continue label`
    pub fn continue_stmt(&self, label: Option<&str>) -> Stmt {
        self.stmt(StmtKind::Continue(label.map(Arc::from)))
    }

    /// `return` or `return value`
    pub fn return_stmt(&self, value: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Return(value))
    }

    /// `throw value`
    pub fn throw(&self, value: Expr) -> Stmt {
        self.stmt(StmtKind::Throw(value))
    }

    /// `yield value`
    pub fn yield_stmt(&self, value: Expr) -> Stmt {
        self.stmt(StmtKind::Yield(value))
    }

    /// A switch statement.
    pub fn switch_stmt(&self, selector: Expr, cases: Vec<Case>) -> Stmt {
        let switch = Switch {
            id: self.next_id(),
            selector,
            cases,
            exhaustive: false,
        };
        self.stmt(StmtKind::Switch(switch))
    }

    /// `case labels...` with the given body.
    pub fn case(&self, labels: Vec<Expr>, body: CaseBody) -> Case {
        Case {
            id: self.next_id(),
            labels,
            is_default: false,
            body,
        }
    }

    /// `default` with the given body.
    pub fn default_case(&self, body: CaseBody) -> Case {
        Case {
            id: self.next_id(),
            labels: Vec::new(),
            is_default: true,
            body,
        }
    }

    /// `try block catches finally`
    pub fn try_stmt(&self, block: Block, catches: Vec<Catch>, finally: Option<Block>) -> Stmt {
        self.try_with_resources(Vec::new(), block, catches, finally)
    }

    /// `try (resources) block catches finally`
    pub fn try_with_resources(
        &self,
        resources: Vec<Resource>,
        block: Block,
        catches: Vec<Catch>,
        finally: Option<Block>,
    ) -> Stmt {
        self.stmt(StmtKind::Try(Try {
            resources,
            block,
            catches,
            finally,
        }))
    }

    /// A resource declared in the resource specification.
    pub fn resource(&self, decl: VarDecl, close: &Arc<MethodSig>) -> Resource {
        Resource {
            id: self.next_id(),
            kind: ResourceKind::Decl(decl),
            close: Arc::clone(close),
        }
    }

    /// An existing variable used as a resource.
    pub fn resource_expr(&self, expr: Expr, close: &Arc<MethodSig>) -> Resource {
        Resource {
            id: self.next_id(),
            kind: ResourceKind::Expr(expr),
            close: Arc::clone(close),
        }
    }

    /// `catch (param) body`
    pub fn catch(&self, param: VarDecl, body: Block) -> Catch {
        Catch {
            id: self.next_id(),
            param,
            body,
        }
    }

    /// `assert cond : detail`
    pub fn assert_stmt(&self, cond: Expr, detail: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Assert { cond, detail })
    }

    /// `synchronized (lock) body`
    pub fn synchronized(&self, lock: Expr, body: Block) -> Stmt {
        self.stmt(StmtKind::Synchronized { lock, body })
    }

    /// A local class declaration statement.
    pub fn class_stmt(&self, decl: ClassDecl) -> Stmt {
        self.stmt(StmtKind::Class(decl))
    }

    /// `;`
    pub fn empty(&self) -> Stmt {
        self.stmt(StmtKind::Empty)
    }

    // ---------------------------------------------------------------------------------
    // Declarations
    // ---------------------------------------------------------------------------------

    /// An instance method declaration.
    pub fn method(&self, name: &str, params: Vec<VarDecl>, return_type: Type, body: Block) -> MethodDecl {
        MethodDecl {
            id: self.next_id(),
            name: Arc::from(name),
            params,
            return_type,
            body,
            is_static: false,
        }
    }

    /// A class declaration.
    pub fn class(&self, name: &str, members: Vec<Member>) -> ClassDecl {
        ClassDecl {
            id: self.next_id(),
            name: Arc::from(name),
            members,
        }
    }

    /// An initializer block member.
    pub fn initializer(&self, is_static: bool, body: Block) -> Member {
        Member::Initializer {
            id: self.next_id(),
            is_static,
            body,
        }
    }
}

impl Expr {
    /// Replaces the inferred type of this expression.
    #[must_use]
    pub fn with_type(mut self, ty: Type) -> Self {
        self.ty = ty;
        self
    }
}

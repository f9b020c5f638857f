//! Translation of expressions.

use std::{ptr, sync::Arc};

use crate::{
    analysis::cfg::{
        builder::label::{unique_name, Label},
        Node, NodeId, NodeKind,
    },
    ast::{BinaryOp, ClassDecl, Expr, ExprKind, Literal, MethodSig, TreeId, UnaryOp},
    types::{PrimitiveKind, Type, WellKnownType},
    Error, Result,
};

use super::{lvalue, PhaseOne};

impl<'ast> PhaseOne<'_, 'ast> {
    /// Translates `expr` and returns the node holding its value.
    pub(super) fn expr(&mut self, expr: &'ast Expr) -> Result<NodeId> {
        self.descend()?;
        let result = self.translate_expr(expr);
        self.depth -= 1;
        result
    }

    fn translate_expr(&mut self, expr: &'ast Expr) -> Result<NodeId> {
        let tree = Some(expr.id);
        let ty = expr.ty.clone();

        match &expr.kind {
            ExprKind::Literal(value) => {
                Ok(self.extend(Node::new(NodeKind::Literal(value.clone()), ty, tree)))
            }
            ExprKind::Local(name) => {
                Ok(self.extend(Node::new(NodeKind::LocalVariable(name.clone()), ty, tree)))
            }
            ExprKind::This => Ok(self.extend(Node::new(NodeKind::ExplicitThis, ty, tree))),
            ExprKind::Super => Ok(self.extend(Node::new(NodeKind::Super, ty, tree))),
            ExprKind::TypeName => Ok(self.class_name(ty, tree)),
            ExprKind::Field {
                receiver,
                name,
                owner,
                is_static,
            } => {
                let receiver = self.receiver(receiver.as_deref(), owner, *is_static)?;
                let node = Node::new(
                    NodeKind::FieldAccess {
                        receiver,
                        field: name.clone(),
                        is_static: *is_static,
                    },
                    ty,
                    tree,
                );
                Ok(self.member_access(node, receiver, *is_static))
            }
            ExprKind::ArrayAccess { array, index } => {
                let array = self.expr(array)?;
                let index = self.expr(index)?;
                let index = self.unary_promotion(index);
                let causes = self.known_causes(&[
                    WellKnownType::ArrayIndexOutOfBoundsException,
                    WellKnownType::NullPointerException,
                ]);
                Ok(self.extend_throwing(
                    Node::new(NodeKind::ArrayAccess { array, index }, ty, tree),
                    causes,
                ))
            }
            ExprKind::Call {
                receiver,
                method,
                args,
            } => self.call(expr, receiver.as_deref(), method, args),
            ExprKind::NewClass {
                enclosing,
                ctor,
                args,
                body,
            } => self.new_class(expr, enclosing.as_deref(), ctor, args, body.as_deref()),
            ExprKind::NewArray { dims, init } => {
                let element = ty.component().cloned().ok_or_else(|| {
                    Error::UnexpectedTree(format!("array creation of non-array type {ty}"))
                })?;

                let mut dim_nodes = Vec::with_capacity(dims.len());
                for dim in dims {
                    let value = self.expr(dim)?;
                    dim_nodes.push(self.unary_promotion(value));
                }
                let mut init_nodes = Vec::new();
                for item in init.iter().flatten() {
                    let value = self.expr(item)?;
                    init_nodes.push(self.assign_convert(value, &element));
                }

                let causes = self.known_causes(&[
                    WellKnownType::NegativeArraySizeException,
                    WellKnownType::OutOfMemoryError,
                ]);
                Ok(self.extend_throwing(
                    Node::new(
                        NodeKind::ArrayCreation {
                            dims: dim_nodes,
                            init: init_nodes,
                        },
                        ty,
                        tree,
                    ),
                    causes,
                ))
            }
            ExprKind::Unary { op, operand } if op.is_step() => self.step(expr, *op, operand),
            ExprKind::Unary { op, operand } => {
                let value = self.expr(operand)?;
                let value = if *op == UnaryOp::Not {
                    self.unbox(value)
                } else {
                    self.unary_promotion(value)
                };
                Ok(self.extend(Node::new(
                    NodeKind::Unary {
                        op: *op,
                        operand: value,
                    },
                    ty,
                    tree,
                )))
            }
            ExprKind::Binary { op, lhs, rhs } => self.binary(expr, *op, lhs, rhs),
            ExprKind::Assign { target, value } => self.assignment(expr.id, target, value),
            ExprKind::CompoundAssign { op, target, value } => {
                self.compound_assignment(expr, *op, target, value)
            }
            ExprKind::Conditional { cond, then, else_ } => {
                let condition = self.expr(cond)?;
                let condition = self.unbox(condition);
                let then_label = Label::new();
                let else_label = Label::new();
                let merge = Label::new();
                self.branch(condition, then_label.clone(), else_label.clone())?;

                self.bind(&then_label)?;
                let then_value = self.expr(then)?;
                let then_value = self.conditional_promotion(then_value, &ty);
                self.jump(merge.clone());

                self.bind(&else_label)?;
                let else_value = self.expr(else_)?;
                let else_value = self.conditional_promotion(else_value, &ty);
                self.jump(merge.clone());

                self.bind(&merge)?;
                Ok(self.extend(Node::new(
                    NodeKind::Ternary {
                        cond: condition,
                        then: then_value,
                        else_: else_value,
                    },
                    ty,
                    tree,
                )))
            }
            ExprKind::InstanceOf {
                expr: operand,
                target,
            } => {
                let operand = self.expr(operand)?;
                Ok(self.extend(Node::new(
                    NodeKind::InstanceOf {
                        operand,
                        target: target.clone(),
                    },
                    ty,
                    tree,
                )))
            }
            ExprKind::Cast { expr: operand } => {
                let operand = self.expr(operand)?;
                let node = Node::new(NodeKind::TypeCast(operand), ty.clone(), tree);
                if ty.is_reference() {
                    let causes = self.known_causes(&[WellKnownType::ClassCastException]);
                    Ok(self.extend_throwing(node, causes))
                } else {
                    Ok(self.extend(node))
                }
            }
            ExprKind::Parens(inner) => {
                self.parens.insert(inner.id, expr.id);
                self.expr(inner)
            }
            ExprKind::Lambda(lambda) => {
                if !self
                    .declared_lambdas
                    .iter()
                    .any(|declared| ptr::eq(*declared, &**lambda))
                {
                    self.declared_lambdas.push(lambda);
                }
                Ok(self.extend(Node::new(NodeKind::FunctionalInterface, ty, tree)))
            }
            ExprKind::MethodRef { qualifier, .. } => {
                if let Some(qualifier) = qualifier {
                    self.expr(qualifier)?;
                }
                Ok(self.extend(Node::new(NodeKind::FunctionalInterface, ty, tree)))
            }
            ExprKind::Switch(switch) => self.switch_expr(expr, switch),
        }
    }

    /// Translates an explicit receiver, or emits the implicit one.
    fn receiver(
        &mut self,
        receiver: Option<&'ast Expr>,
        owner: &Type,
        is_static: bool,
    ) -> Result<NodeId> {
        match receiver {
            Some(receiver) => self.expr(receiver),
            None => Ok(self.implicit_receiver(owner, is_static)),
        }
    }

    /// Appends a field or method access, which throws if the receiver may be null.
    fn member_access(&mut self, node: Node, receiver: NodeId, is_static: bool) -> NodeId {
        if is_static || self.is_this(receiver) {
            self.extend(node)
        } else {
            let causes = self.known_causes(&[WellKnownType::NullPointerException]);
            self.extend_throwing(node, causes)
        }
    }

    fn call(
        &mut self,
        expr: &'ast Expr,
        receiver: Option<&'ast Expr>,
        method: &Arc<MethodSig>,
        args: &'ast [Expr],
    ) -> Result<NodeId> {
        let receiver = self.receiver(receiver, &method.owner, method.is_static)?;
        let access = self.member_access(
            Node::new(
                NodeKind::MethodAccess {
                    receiver,
                    method: method.clone(),
                },
                method.return_type.clone(),
                None,
            ),
            receiver,
            method.is_static,
        );

        let args = self.call_arguments(method, args)?;
        let causes = self.invocation_causes(&method.thrown);
        let node = Node::new(
            NodeKind::MethodInvocation {
                target: access,
                args,
            },
            expr.ty.clone(),
            Some(expr.id),
        );
        if method.terminates_execution {
            Ok(self.extend_terminating(node, causes))
        } else {
            Ok(self.extend_throwing(node, causes))
        }
    }

    fn new_class(
        &mut self,
        expr: &'ast Expr,
        enclosing: Option<&'ast Expr>,
        ctor: &Arc<MethodSig>,
        args: &'ast [Expr],
        body: Option<&'ast ClassDecl>,
    ) -> Result<NodeId> {
        if let Some(enclosing) = enclosing {
            self.expr(enclosing)?;
        }
        let args = self.call_arguments(ctor, args)?;
        self.class_name(expr.ty.clone(), None);
        let class_body = body.map(|body| self.class_declaration(body));

        let causes = self.invocation_causes(&ctor.thrown);
        Ok(self.extend_throwing(
            Node::new(
                NodeKind::ObjectCreation {
                    ctor: ctor.clone(),
                    args,
                    class_body,
                },
                expr.ty.clone(),
                Some(expr.id),
            ),
            causes,
        ))
    }

    /// Records a local or anonymous class and appends its declaration node.
    ///
    /// A class inside a finally block is translated once per copy but recorded once.
    pub(super) fn class_declaration(&mut self, class: &'ast ClassDecl) -> NodeId {
        if !self
            .declared_classes
            .iter()
            .any(|declared| ptr::eq(*declared, class))
        {
            self.declared_classes.push(class);
        }
        self.extend(Node::new(
            NodeKind::ClassDeclaration,
            Type::class(&class.name),
            Some(class.id),
        ))
    }

    fn binary(
        &mut self,
        expr: &'ast Expr,
        op: BinaryOp,
        lhs: &'ast Expr,
        rhs: &'ast Expr,
    ) -> Result<NodeId> {
        let tree = Some(expr.id);
        let ty = expr.ty.clone();

        if op.is_short_circuit() {
            return self.short_circuit(expr, op, lhs, rhs);
        }

        if op == BinaryOp::Add && (lhs.ty.is_string() || rhs.ty.is_string()) {
            let left = self.expr(lhs)?;
            let left = self.string_conversion(left);
            let right = self.expr(rhs)?;
            let right = self.string_conversion(right);
            return Ok(self.extend(Node::new(
                NodeKind::StringConcat {
                    lhs: left,
                    rhs: right,
                },
                ty,
                tree,
            )));
        }

        let mut divides_integers = false;
        let (left, right) = if op.is_shift() {
            let left = self.expr(lhs)?;
            let left = self.unary_promotion(left);
            let right = self.expr(rhs)?;
            (left, self.unary_promotion(right))
        } else if op.is_equality() || op.is_bitwise() {
            let numeric = lhs.ty.is_numeric_or_boxed() && rhs.ty.is_numeric_or_boxed();
            let boolean = lhs.ty.is_boolean() && rhs.ty.is_boolean();
            let both_boxed = lhs.ty.is_boxed() && rhs.ty.is_boxed();

            if op.is_equality() && both_boxed {
                // Reference comparison of two wrapper objects.
                let left = self.expr(lhs)?;
                (left, self.expr(rhs)?)
            } else if numeric {
                self.promoted_operands(lhs, rhs)?
            } else if boolean || op.is_bitwise() {
                let left = self.expr(lhs)?;
                let left = self.unbox(left);
                let right = self.expr(rhs)?;
                (left, self.unbox(right))
            } else {
                let left = self.expr(lhs)?;
                (left, self.expr(rhs)?)
            }
        } else {
            let promoted = Self::binary_promoted_type(&lhs.ty, &rhs.ty)?;
            divides_integers =
                matches!(op, BinaryOp::Div | BinaryOp::Rem) && promoted.is_integral();
            self.promoted_operands(lhs, rhs)?
        };

        let node = Node::new(
            NodeKind::Binary {
                op,
                lhs: left,
                rhs: right,
            },
            ty,
            tree,
        );
        if divides_integers {
            let causes = self.known_causes(&[WellKnownType::ArithmeticException]);
            Ok(self.extend_throwing(node, causes))
        } else {
            Ok(self.extend(node))
        }
    }

    /// Translates both operands with binary numeric promotion.
    fn promoted_operands(
        &mut self,
        lhs: &'ast Expr,
        rhs: &'ast Expr,
    ) -> Result<(NodeId, NodeId)> {
        let promoted = Self::binary_promoted_type(&lhs.ty, &rhs.ty)?;
        let left = self.expr(lhs)?;
        let left = self.binary_promotion(left, promoted);
        let right = self.expr(rhs)?;
        let right = self.binary_promotion(right, promoted);
        Ok((left, right))
    }

    /// `&&` and `||`: the right operand is only evaluated if the left one does not decide
    /// the result.
    fn short_circuit(
        &mut self,
        expr: &'ast Expr,
        op: BinaryOp,
        lhs: &'ast Expr,
        rhs: &'ast Expr,
    ) -> Result<NodeId> {
        let left = self.expr(lhs)?;
        let left = self.unbox(left);

        let right_start = Label::new();
        let short_circuit = Label::new();
        if op == BinaryOp::And {
            self.branch(left, right_start.clone(), short_circuit.clone())?;
        } else {
            self.branch(left, short_circuit.clone(), right_start.clone())?;
        }

        self.bind(&right_start)?;
        let right = self.expr(rhs)?;
        let right = self.unbox(right);

        self.bind(&short_circuit)?;
        Ok(self.extend(Node::new(
            NodeKind::Binary {
                op,
                lhs: left,
                rhs: right,
            },
            expr.ty.clone(),
            Some(expr.id),
        )))
    }

    /// `target = value`, also used for initialized declarations.
    pub(super) fn assignment(
        &mut self,
        tree: TreeId,
        target: &'ast Expr,
        value: &'ast Expr,
    ) -> Result<NodeId> {
        let target_ty = target.ty.clone();

        let field = target.skip_parens();
        if let ExprKind::Field {
            receiver,
            name,
            owner,
            is_static,
        } = &field.kind
        {
            let receiver = self.receiver(receiver.as_deref(), owner, *is_static)?;
            let value = self.expr(value)?;
            let value = self.assign_convert(value, &target_ty);
            let node = lvalue(Node::new(
                NodeKind::FieldAccess {
                    receiver,
                    field: name.clone(),
                    is_static: *is_static,
                },
                target_ty.clone(),
                Some(field.id),
            ));
            let target = self.member_access(node, receiver, *is_static);
            return Ok(self.extend(Node::new(
                NodeKind::Assignment { target, value },
                target_ty,
                Some(tree),
            )));
        }

        let target = self.expr(target)?;
        self.mark_lvalue(target);
        let value = self.expr(value)?;
        let value = self.assign_convert(value, &target_ty);
        Ok(self.extend(Node::new(
            NodeKind::Assignment { target, value },
            target_ty,
            Some(tree),
        )))
    }

    /// `target op= value`: the target is read once and then assigned the result, cast back
    /// to the target type.
    fn compound_assignment(
        &mut self,
        expr: &'ast Expr,
        op: BinaryOp,
        target: &'ast Expr,
        value: &'ast Expr,
    ) -> Result<NodeId> {
        let tree = Some(expr.id);
        let target_ty = target.ty.clone();
        let current = self.expr(target)?;

        if op == BinaryOp::Add && (target_ty.is_string() || value.ty.is_string()) {
            let value = self.expr(value)?;
            let value = self.string_conversion(value);
            self.mark_lvalue(current);
            return Ok(self.extend(Node::new(
                NodeKind::StringConcatAssign {
                    target: current,
                    value,
                },
                target_ty,
                tree,
            )));
        }
        if !op.has_compound_form() {
            return Err(Error::UnexpectedTree(format!(
                "{op} has no compound assignment form"
            )));
        }

        let mut divides_integers = false;
        let (left, right, result_ty) = if op.is_shift() {
            let left = self.unary_promotion(current);
            let right = self.expr(value)?;
            let right = self.unary_promotion(right);
            (left, right, self.ty_of(left))
        } else if op.is_bitwise() && target_ty.is_boolean() && value.ty.is_boolean() {
            let left = self.unbox(current);
            let right = self.expr(value)?;
            (left, self.unbox(right), Type::boolean())
        } else {
            let promoted = Self::binary_promoted_type(&target_ty, &value.ty)?;
            divides_integers =
                matches!(op, BinaryOp::Div | BinaryOp::Rem) && promoted.is_integral();
            let left = self.binary_promotion(current, promoted);
            let right = self.expr(value)?;
            let right = self.binary_promotion(right, promoted);
            (left, right, Type::Primitive(promoted))
        };

        let operation = Node::synthetic(
            NodeKind::Binary {
                op,
                lhs: left,
                rhs: right,
            },
            result_ty,
            None,
        );
        let operation = if divides_integers {
            let causes = self.known_causes(&[WellKnownType::ArithmeticException]);
            self.extend_throwing(operation, causes)
        } else {
            self.extend(operation)
        };

        let cast = self.extend(Node::synthetic(
            NodeKind::TypeCast(operation),
            target_ty.clone(),
            None,
        ));
        self.mark_lvalue(current);
        Ok(self.extend(Node::new(
            NodeKind::Assignment {
                target: current,
                value: cast,
            },
            target_ty,
            tree,
        )))
    }

    /// Increments and decrements.
    ///
    /// The variable is read, promoted, stepped by one and assigned back. A postfix form
    /// saves the old value in a temporary whose read is the value of the expression.
    fn step(&mut self, expr: &'ast Expr, op: UnaryOp, operand: &'ast Expr) -> Result<NodeId> {
        let ty = operand.ty.clone();
        let promoted = ty
            .primitive_or_unboxed()
            .and_then(|kind| kind.binary_promotion(PrimitiveKind::Int))
            .ok_or_else(|| Error::UnexpectedTree(format!("{op} applied to {ty}")))?;
        let is_prefix = matches!(op, UnaryOp::PreIncrement | UnaryOp::PreDecrement);

        let current = self.expr(operand)?;
        let saved = if is_prefix {
            None
        } else {
            let temp = unique_name("tempPostfix");
            self.declare_temp(&temp, ty.clone());
            self.assign_temp(&temp, ty.clone(), current);
            Some(temp)
        };

        let value = self.binary_promotion(current, promoted);
        let one = self.extend(Node::synthetic(
            NodeKind::Literal(Literal::Int(1)),
            Type::int(),
            None,
        ));
        let one = self.binary_promotion(one, promoted);
        let arithmetic = match op {
            UnaryOp::PreIncrement | UnaryOp::PostIncrement => BinaryOp::Add,
            _ => BinaryOp::Sub,
        };
        let stepped = self.extend(Node::synthetic(
            NodeKind::Binary {
                op: arithmetic,
                lhs: value,
                rhs: one,
            },
            promoted.into(),
            None,
        ));
        let stepped = self.narrow_and_box(stepped, &ty);

        self.mark_lvalue(current);
        let assignment = self.extend(Node::synthetic(
            NodeKind::Assignment {
                target: current,
                value: stepped,
            },
            ty.clone(),
            is_prefix.then_some(expr.id),
        ));
        self.lookups.unary_assign.insert(expr.id, assignment);

        match saved {
            None => Ok(assignment),
            Some(temp) => Ok(self.extend(Node::synthetic(
                NodeKind::LocalVariable(temp),
                ty,
                Some(expr.id),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        analysis::cfg::{builder::ExtendedKind, NodeKind},
        ast::{AstBuilder, BinaryOp, UnaryOp},
        test::{kinds_of, linearize_block},
        types::{PrimitiveKind, Type},
    };

    #[test]
    fn test_integer_division_throws_once() {
        let ast = AstBuilder::new();
        let body = ast.block(vec![ast.local_var(
            "q",
            Type::int(),
            Some(ast.binary(BinaryOp::Div, ast.local("a", Type::int()), ast.local("b", Type::int()))),
        )]);
        let linear = linearize_block(&body);

        let divisions: Vec<_> = linear
            .sequence()
            .iter()
            .filter(|element| matches!(element.kind, ExtendedKind::Exception { .. }))
            .collect();
        assert_eq!(divisions.len(), 1);
        assert_eq!(kinds_of(&linear).iter().filter(|k| **k == "Binary").count(), 1);
    }

    #[test]
    fn test_floating_division_does_not_throw() {
        let ast = AstBuilder::new();
        let body = ast.block(vec![ast.local_var(
            "q",
            Type::double(),
            Some(ast.binary(BinaryOp::Div, ast.local("a", Type::double()), ast.int(2))),
        )]);
        let linear = linearize_block(&body);

        assert!(linear
            .sequence()
            .iter()
            .all(|element| !matches!(element.kind, ExtendedKind::Exception { .. })));
        assert!(kinds_of(&linear).contains(&"WideningConversion"));
    }

    #[test]
    fn test_short_circuit_and() {
        let ast = AstBuilder::new();
        let cond = ast.binary(
            BinaryOp::And,
            ast.local("a", Type::boolean()),
            ast.local("b", Type::boolean()),
        );
        let body = ast.block(vec![ast.local_var("c", Type::boolean(), Some(cond))]);
        let linear = linearize_block(&body);

        let jump = linear
            .sequence()
            .iter()
            .find_map(|element| match &element.kind {
                ExtendedKind::ConditionalJump { then, else_, .. } => {
                    Some((then.clone(), else_.clone()))
                }
                _ => None,
            })
            .unwrap();
        let right_start = linear.binding(&jump.0).unwrap();
        let short = linear.binding(&jump.1).unwrap();
        assert!(right_start < short);

        let combined = linear.sequence()[short].node_id().unwrap();
        assert!(matches!(
            linear.nodes().get(combined).unwrap().kind,
            NodeKind::Binary { op: BinaryOp::And, .. }
        ));
    }

    #[test]
    fn test_string_concatenation_converts_operands() {
        let ast = AstBuilder::new();
        let concat = ast.binary(BinaryOp::Add, ast.string("n="), ast.local("n", Type::int()));
        let body = ast.block(vec![ast.local_var("s", Type::string(), Some(concat))]);
        let linear = linearize_block(&body);

        let kinds = kinds_of(&linear);
        assert!(kinds.contains(&"StringConversion"));
        assert!(kinds.contains(&"StringConcat"));
        assert_eq!(kinds.iter().filter(|k| **k == "StringConversion").count(), 1);
    }

    #[test]
    fn test_postfix_increment_saves_old_value() {
        let ast = AstBuilder::new();
        let step = ast.unary(UnaryOp::PostIncrement, ast.local("i", Type::int()));
        let step_id = step.id;
        let body = ast.block(vec![ast.local_var("j", Type::int(), Some(step))]);
        let linear = linearize_block(&body);

        let assignment = linear.lookups.unary_assign[&step_id];
        assert!(matches!(
            linear.nodes().get(assignment).unwrap().kind,
            NodeKind::Assignment { .. }
        ));

        let result = linear.lookups.unconverted[&step_id][0];
        match &linear.nodes().get(result).unwrap().kind {
            NodeKind::LocalVariable(name) => assert!(name.starts_with("tempPostfix#num")),
            other => panic!("unexpected result node {other:?}"),
        }
    }

    #[test]
    fn test_prefix_increment_of_byte_narrows() {
        let ast = AstBuilder::new();
        let byte = Type::Primitive(PrimitiveKind::Byte);
        let step = ast.unary(UnaryOp::PreIncrement, ast.local("b", byte));
        let body = ast.block(vec![ast.expr_stmt(step)]);
        let linear = linearize_block(&body);

        let kinds = kinds_of(&linear);
        assert!(kinds.contains(&"WideningConversion"));
        assert!(kinds.contains(&"NarrowingConversion"));
        assert!(!kinds.contains(&"VariableDeclaration"));
    }

    #[test]
    fn test_compound_assignment_casts_back() {
        let ast = AstBuilder::new();
        let short = Type::Primitive(PrimitiveKind::Short);
        let compound = ast.compound_assign(BinaryOp::Mul, ast.local("s", short), ast.int(2));
        let body = ast.block(vec![ast.expr_stmt(compound)]);
        let linear = linearize_block(&body);

        let kinds = kinds_of(&linear);
        let cast = kinds.iter().position(|k| *k == "TypeCast").unwrap();
        assert_eq!(kinds[cast - 1], "Binary");
        assert_eq!(kinds[cast + 1], "Assignment");
    }

    #[test]
    fn test_every_assignment_target_is_an_lvalue() {
        let ast = AstBuilder::new();
        let int = Type::int;
        let body = ast.block(vec![
            ast.expr_stmt(ast.assign(ast.local("a", int()), ast.int(1))),
            ast.expr_stmt(ast.compound_assign(BinaryOp::Add, ast.local("b", int()), ast.int(2))),
            ast.expr_stmt(ast.compound_assign(
                BinaryOp::Add,
                ast.local("s", Type::string()),
                ast.int(3),
            )),
            ast.expr_stmt(ast.unary(UnaryOp::PostIncrement, ast.local("c", int()))),
        ]);
        let linear = linearize_block(&body);

        let targets: Vec<_> = linear
            .nodes()
            .iter()
            .filter_map(|(_, node)| match node.kind {
                NodeKind::Assignment { target, .. }
                | NodeKind::StringConcatAssign { target, .. } => linear.nodes().get(target),
                _ => None,
            })
            .collect();
        // a, b, s, c and the postfix temporary
        assert_eq!(targets.len(), 5);
        assert!(targets.iter().all(|node| node.is_lvalue()));
    }

    #[test]
    fn test_instance_field_access_may_throw() {
        let ast = AstBuilder::new();
        let point = Type::class("Point");
        let read = ast.field(Some(ast.local("p", point.clone())), point.clone(), "x", Type::int());
        let own = ast.field(None, point, "y", Type::int());
        let body = ast.block(vec![ast.expr_stmt(read), ast.expr_stmt(own)]);
        let linear = linearize_block(&body);

        let throwing: Vec<_> = linear
            .sequence()
            .iter()
            .filter(|element| matches!(element.kind, ExtendedKind::Exception { .. }))
            .collect();
        assert_eq!(throwing.len(), 1);
    }
}

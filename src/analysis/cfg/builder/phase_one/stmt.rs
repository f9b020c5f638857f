//! Translation of statements.

use std::sync::Arc;

use crate::{
    analysis::cfg::{
        builder::{
            label::{unique_name, Label, LabelCell},
            AssertionMode,
        },
        Node, NodeId, NodeKind,
    },
    ast::{BinaryOp, Expr, Literal, MethodSig, Stmt, StmtKind, TreeId, VarDecl},
    types::{Type, WellKnownType},
    Result,
};

use super::{lvalue, PhaseOne};

/// Break and continue targets replaced by a loop.
type SavedTargets = (Option<LabelCell>, Option<LabelCell>);

impl<'ast> PhaseOne<'_, 'ast> {
    /// Translates one statement.
    pub(super) fn stmt(&mut self, stmt: &'ast Stmt) -> Result<()> {
        self.stmt_with_label(stmt, None)
    }

    /// Translates one statement. A loop uses `continue_label` as its continue target, so
    /// that `continue name` of an enclosing labeled statement reaches it.
    fn stmt_with_label(&mut self, stmt: &'ast Stmt, continue_label: Option<Label>) -> Result<()> {
        self.descend()?;
        let result = self.translate_stmt(stmt, continue_label);
        self.depth -= 1;
        result
    }

    fn translate_stmt(&mut self, stmt: &'ast Stmt, continue_label: Option<Label>) -> Result<()> {
        match &stmt.kind {
            StmtKind::Block(block) => self.block(block),
            StmtKind::Expr(expr) => {
                self.expr(expr)?;
                Ok(())
            }
            StmtKind::Local(decl) => {
                self.local_declaration(decl)?;
                Ok(())
            }
            StmtKind::If {
                cond,
                then,
                otherwise,
            } => {
                let condition = self.expr(cond)?;
                let condition = self.unbox(condition);
                let then_label = Label::new();
                let else_label = Label::new();
                let end = Label::new();
                self.branch(condition, then_label.clone(), else_label.clone())?;

                self.bind(&then_label)?;
                self.stmt(then)?;
                self.jump(end.clone());

                self.bind(&else_label)?;
                if let Some(otherwise) = otherwise {
                    self.stmt(otherwise)?;
                }
                self.bind(&end)
            }
            StmtKind::While { cond, body } => self.while_loop(cond, body, continue_label),
            StmtKind::DoWhile { body, cond } => self.do_while_loop(body, cond, continue_label),
            StmtKind::For {
                init,
                cond,
                update,
                body,
            } => self.for_loop(init, cond.as_ref(), update, body, continue_label),
            StmtKind::ForEach {
                var,
                iterable,
                body,
            } => {
                if iterable.ty.is_array() {
                    self.for_each_array(var, iterable, body, continue_label)
                } else {
                    self.for_each_iterable(var, iterable, body, continue_label)
                }
            }
            StmtKind::Labeled { label, body } => self.labeled(label, body),
            StmtKind::Break(label) => {
                let target = match label {
                    None => self
                        .scope
                        .break_target
                        .as_mut()
                        .ok_or_else(|| internal_error!("break outside of a loop or switch"))?
                        .access(),
                    Some(name) => self
                        .scope
                        .break_labels
                        .resolve(name)
                        .ok_or_else(|| internal_error!("break to unknown label {name}"))?,
                };
                self.jump(target);
                Ok(())
            }
            StmtKind::Continue(label) => {
                let target = match label {
                    None => self
                        .scope
                        .continue_target
                        .as_mut()
                        .ok_or_else(|| internal_error!("continue outside of a loop"))?
                        .access(),
                    Some(name) => self
                        .scope
                        .continue_labels
                        .resolve(name)
                        .ok_or_else(|| internal_error!("continue to unknown label {name}"))?,
                };
                self.jump(target);
                Ok(())
            }
            StmtKind::Return(value) => self.return_statement(stmt.id, value.as_ref()),
            StmtKind::Throw(value) => {
                let thrown = self.expr(value)?;
                self.extend_terminating(
                    Node::new(NodeKind::Throw(thrown), Type::Void, Some(stmt.id)),
                    vec![value.ty.clone()],
                );
                Ok(())
            }
            StmtKind::Yield(value) => {
                let result = self
                    .switch_results
                    .last()
                    .cloned()
                    .ok_or_else(|| internal_error!("yield outside of a switch expression"))?;
                let value = self.expr(value)?;
                let value = self.assign_convert(value, &result.ty);
                self.assign_temp(&result.var, result.ty, value);

                let target = self
                    .scope
                    .break_labels
                    .resolve(&result.exit)
                    .ok_or_else(|| internal_error!("yield target {} is not in scope", result.exit))?;
                self.jump(target);
                Ok(())
            }
            StmtKind::Switch(switch) => self.switch_stmt(switch),
            StmtKind::Try(statement) => self.try_statement(stmt.id, statement),
            StmtKind::Assert { cond, detail } => match self.options.assertions {
                AssertionMode::Disabled => Ok(()),
                AssertionMode::Enabled => self.assertion_check(stmt.id, cond, detail.as_ref()),
                AssertionMode::Unknown => {
                    let flag = self
                        .assertions_flag
                        .get_or_insert_with(|| unique_name("assertionsEnabled"))
                        .clone();
                    let enabled = self.read_temp(&flag, Type::boolean());
                    let check = Label::new();
                    let skip = Label::new();
                    self.branch(enabled, check.clone(), skip.clone())?;

                    self.bind(&check)?;
                    self.assertion_check(stmt.id, cond, detail.as_ref())?;
                    self.bind(&skip)
                }
            },
            StmtKind::Synchronized { lock, body } => {
                let lock = self.expr(lock)?;
                self.extend(Node::new(
                    NodeKind::Synchronized { lock, start: true },
                    Type::Void,
                    Some(stmt.id),
                ));
                self.block(body)?;
                self.extend(Node::new(
                    NodeKind::Synchronized { lock, start: false },
                    Type::Void,
                    Some(stmt.id),
                ));
                Ok(())
            }
            StmtKind::Class(decl) => {
                self.class_declaration(decl);
                Ok(())
            }
            StmtKind::Empty => Ok(()),
        }
    }

    /// Declares a local variable and assigns its initializer, if any.
    pub(super) fn local_declaration(&mut self, decl: &'ast VarDecl) -> Result<NodeId> {
        let declaration = self.extend(Node::new(
            NodeKind::VariableDeclaration(decl.name.clone()),
            decl.ty.clone(),
            Some(decl.id),
        ));
        if let Some(init) = &decl.init {
            let value = self.expr(init)?;
            self.initialize(decl, value);
        }
        Ok(declaration)
    }

    /// Assigns `value` to the declared variable after assignment conversion.
    fn initialize(&mut self, decl: &'ast VarDecl, value: NodeId) -> NodeId {
        let value = self.assign_convert(value, &decl.ty);
        let target = self.extend(lvalue(Node::new(
            NodeKind::LocalVariable(decl.name.clone()),
            decl.ty.clone(),
            None,
        )));
        self.extend(Node::new(
            NodeKind::Assignment { target, value },
            decl.ty.clone(),
            Some(decl.id),
        ))
    }

    fn return_statement(&mut self, tree: TreeId, value: Option<&'ast Expr>) -> Result<()> {
        let value = match value {
            None => None,
            Some(value) => {
                let value = self.expr(value)?;
                match self.underlying.return_type() {
                    Some(ty) if *ty != Type::Void => Some(self.assign_convert(value, ty)),
                    _ => Some(value),
                }
            }
        };

        let node = self.extend(Node::new(NodeKind::Return(value), Type::Void, Some(tree)));
        self.return_nodes.push(node);
        let target = self.scope.return_target.access();
        self.jump(target);
        Ok(())
    }

    /// Installs the break and continue targets of a loop.
    fn enter_loop(&mut self, exit: &Label, continue_label: &Label) -> SavedTargets {
        let outer_break = self
            .scope
            .break_target
            .replace(LabelCell::with(exit.clone()));
        let outer_continue = self
            .scope
            .continue_target
            .replace(LabelCell::with(continue_label.clone()));
        (outer_break, outer_continue)
    }

    fn leave_loop(&mut self, (outer_break, outer_continue): SavedTargets) {
        self.scope.break_target = outer_break;
        self.scope.continue_target = outer_continue;
    }

    fn while_loop(
        &mut self,
        cond: &'ast Expr,
        body: &'ast Stmt,
        continue_label: Option<Label>,
    ) -> Result<()> {
        let cond_start = continue_label.unwrap_or_default();
        let entry = Label::new();
        let exit = Label::new();
        let saved = self.enter_loop(&exit, &cond_start);

        self.bind(&cond_start)?;
        let condition = self.expr(cond)?;
        let condition = self.unbox(condition);
        let endless = cond.is_true_literal();
        if !endless {
            self.branch(condition, entry.clone(), exit.clone())?;
        }

        self.bind(&entry)?;
        self.stmt(body)?;
        if endless {
            self.jump(entry);
        } else {
            self.jump(cond_start);
        }

        self.bind(&exit)?;
        self.leave_loop(saved);
        Ok(())
    }

    fn do_while_loop(
        &mut self,
        body: &'ast Stmt,
        cond: &'ast Expr,
        continue_label: Option<Label>,
    ) -> Result<()> {
        let entry = Label::new();
        let cond_start = continue_label.unwrap_or_default();
        let exit = Label::new();
        let saved = self.enter_loop(&exit, &cond_start);

        self.bind(&entry)?;
        self.stmt(body)?;

        self.bind(&cond_start)?;
        let condition = self.expr(cond)?;
        let condition = self.unbox(condition);
        self.branch(condition, entry, exit.clone())?;

        self.bind(&exit)?;
        self.leave_loop(saved);
        Ok(())
    }

    fn for_loop(
        &mut self,
        init: &'ast [Stmt],
        cond: Option<&'ast Expr>,
        update: &'ast [Expr],
        body: &'ast Stmt,
        continue_label: Option<Label>,
    ) -> Result<()> {
        for stmt in init {
            self.stmt(stmt)?;
        }

        let cond_start = Label::new();
        let entry = Label::new();
        let update_start = continue_label.unwrap_or_default();
        let exit = Label::new();
        let saved = self.enter_loop(&exit, &update_start);

        self.bind(&cond_start)?;
        if let Some(cond) = cond {
            let condition = self.expr(cond)?;
            let condition = self.unbox(condition);
            self.branch(condition, entry.clone(), exit.clone())?;
        }

        self.bind(&entry)?;
        self.stmt(body)?;

        self.bind(&update_start)?;
        for expr in update {
            self.expr(expr)?;
        }
        self.jump(cond_start);

        self.bind(&exit)?;
        self.leave_loop(saved);
        Ok(())
    }

    /// `for (T x : iterable)`, desugared to an explicit iterator loop.
    fn for_each_iterable(
        &mut self,
        var: &'ast VarDecl,
        iterable: &'ast Expr,
        body: &'ast Stmt,
        continue_label: Option<Label>,
    ) -> Result<()> {
        let iterator_ty = self.required(WellKnownType::Iterator);
        let iterator = unique_name("iter");
        self.declare_temp(&iterator, iterator_ty.clone());

        let collection = self.expr(iterable)?;
        let created = self.synthetic_call(collection, &iterable.ty, "iterator", iterator_ty.clone());
        self.assign_temp(&iterator, iterator_ty.clone(), created);

        let cond_start = Label::new();
        let entry = Label::new();
        let update_start = continue_label.unwrap_or_default();
        let exit = Label::new();
        let saved = self.enter_loop(&exit, &update_start);

        self.bind(&cond_start)?;
        let current = self.read_temp(&iterator, iterator_ty.clone());
        let has_next = self.synthetic_call(current, &iterator_ty, "hasNext", Type::boolean());
        self.branch(has_next, entry.clone(), exit.clone())?;

        self.bind(&entry)?;
        self.extend(Node::new(
            NodeKind::VariableDeclaration(var.name.clone()),
            var.ty.clone(),
            Some(var.id),
        ));
        let element_ty = match var.ty.as_primitive() {
            Some(kind) => Type::boxed(kind),
            None => var.ty.clone(),
        };
        let current = self.read_temp(&iterator, iterator_ty.clone());
        let next = self.synthetic_call(current, &iterator_ty, "next", element_ty);
        self.initialize(var, next);
        self.stmt(body)?;

        self.bind(&update_start)?;
        self.jump(cond_start);

        self.bind(&exit)?;
        self.leave_loop(saved);
        Ok(())
    }

    /// Appends a synthetic argument-less call of `name` on `receiver`.
    fn synthetic_call(
        &mut self,
        receiver: NodeId,
        owner: &Type,
        name: &str,
        result: Type,
    ) -> NodeId {
        let method = Arc::new(MethodSig::new(owner.clone(), name, Vec::new(), result.clone()));
        let access = self.extend(Node::synthetic(
            NodeKind::MethodAccess { receiver, method },
            result.clone(),
            None,
        ));
        self.extend(Node::synthetic(
            NodeKind::MethodInvocation {
                target: access,
                args: Vec::new(),
            },
            result,
            None,
        ))
    }

    /// `for (T x : array)`, desugared to an index loop.
    fn for_each_array(
        &mut self,
        var: &'ast VarDecl,
        iterable: &'ast Expr,
        body: &'ast Stmt,
        continue_label: Option<Label>,
    ) -> Result<()> {
        let array_ty = iterable.ty.clone();
        let element_ty = array_ty
            .component()
            .cloned()
            .ok_or_else(|| internal_error!("enhanced for over non-array {array_ty}"))?;

        let array = unique_name("array");
        self.declare_temp(&array, array_ty.clone());
        let value = self.expr(iterable)?;
        self.assign_temp(&array, array_ty.clone(), value);

        let index = unique_name("index");
        self.declare_temp(&index, Type::int());
        let zero = self.extend(Node::synthetic(
            NodeKind::Literal(Literal::Int(0)),
            Type::int(),
            None,
        ));
        self.assign_temp(&index, Type::int(), zero);

        let cond_start = Label::new();
        let entry = Label::new();
        let update_start = continue_label.unwrap_or_default();
        let exit = Label::new();
        let saved = self.enter_loop(&exit, &update_start);

        self.bind(&cond_start)?;
        let position = self.read_temp(&index, Type::int());
        let current = self.read_temp(&array, array_ty.clone());
        let length = self.extend(Node::synthetic(
            NodeKind::FieldAccess {
                receiver: current,
                field: Arc::from("length"),
                is_static: false,
            },
            Type::int(),
            None,
        ));
        let in_bounds = self.extend(Node::synthetic(
            NodeKind::Binary {
                op: BinaryOp::Lt,
                lhs: position,
                rhs: length,
            },
            Type::boolean(),
            None,
        ));
        self.branch(in_bounds, entry.clone(), exit.clone())?;

        self.bind(&entry)?;
        self.extend(Node::new(
            NodeKind::VariableDeclaration(var.name.clone()),
            var.ty.clone(),
            Some(var.id),
        ));
        let current = self.read_temp(&array, array_ty);
        let position = self.read_temp(&index, Type::int());
        let causes = self.known_causes(&[WellKnownType::NullPointerException]);
        let element = self.extend_throwing(
            Node::synthetic(
                NodeKind::ArrayAccess {
                    array: current,
                    index: position,
                },
                element_ty,
                None,
            ),
            causes,
        );
        self.initialize(var, element);
        self.stmt(body)?;

        self.bind(&update_start)?;
        let position = self.read_temp(&index, Type::int());
        let one = self.extend(Node::synthetic(
            NodeKind::Literal(Literal::Int(1)),
            Type::int(),
            None,
        ));
        let next = self.extend(Node::synthetic(
            NodeKind::Binary {
                op: BinaryOp::Add,
                lhs: position,
                rhs: one,
            },
            Type::int(),
            None,
        ));
        self.assign_temp(&index, Type::int(), next);
        self.jump(cond_start);

        self.bind(&exit)?;
        self.leave_loop(saved);
        Ok(())
    }

    fn labeled(&mut self, name: &Arc<str>, body: &'ast Stmt) -> Result<()> {
        let break_label = Label::named(&format!("{name}_break"));
        let continue_label = Label::named(&format!("{name}_continue"));
        self.scope.break_labels.define(name.clone(), break_label.clone());
        self.scope
            .continue_labels
            .define(name.clone(), continue_label.clone());

        self.stmt_with_label(body, Some(continue_label))?;
        self.bind(&break_label)?;

        self.scope.break_labels.undefine(name);
        self.scope.continue_labels.undefine(name);
        Ok(())
    }

    /// The check of an `assert` statement: evaluate the condition and, if it is false,
    /// evaluate the detail and throw.
    fn assertion_check(
        &mut self,
        tree: TreeId,
        cond: &'ast Expr,
        detail: Option<&'ast Expr>,
    ) -> Result<()> {
        let condition = self.expr(cond)?;
        let condition = self.unbox(condition);
        let end = Label::new();
        let fail = Label::new();
        self.branch(condition, end.clone(), fail.clone())?;

        self.bind(&fail)?;
        let detail = detail.map(|detail| self.expr(detail)).transpose()?;
        let error_ty = self.required(WellKnownType::AssertionError);
        let error = self.extend(Node::new(
            NodeKind::AssertionError { condition, detail },
            error_ty.clone(),
            Some(tree),
        ));
        self.extend_terminating(
            Node::synthetic(NodeKind::Throw(error), Type::Void, None),
            vec![error_ty],
        );

        self.bind(&end)
    }
}

//! Translation of try statements.
//!
//! A finally block is copied once for every way control can leave the protected region:
//! normal completion, an exception, `return`, `break` and `continue`, and each statement
//! label a jump escapes to. While the region is translated the jump targets are replaced
//! by vacant cells and finally-region maps, so after the region it is known which of the
//! copies are needed and where each of them has to continue.
//!
//! A try-with-resources statement becomes one nested try/finally per resource whose
//! finally block closes the resource if it is not null.

use std::{mem, sync::Arc};

use crate::{
    analysis::cfg::{
        builder::{
            label::{unique_name, Label},
            try_stack::TryFrame,
        },
        Node, NodeKind,
    },
    ast::{BinaryOp, Block, Catch, Literal, MethodSig, Resource, ResourceKind, TreeId, Try},
    types::{Type, WellKnownType},
    Result,
};

use super::{PhaseOne, Scope};

/// What the protected region of a try consists of.
#[derive(Clone, Copy)]
enum TryBody<'ast> {
    Block(&'ast Block),
    /// Remaining resources, which enclose the block.
    Resources(&'ast [Resource], &'ast Block),
}

/// What is emitted for each copy of a finally block.
enum FinallyBody<'ast> {
    Block(&'ast Block),
    /// `if (name != null) name.close();`
    Close {
        name: Arc<str>,
        ty: Type,
        close: &'ast Arc<MethodSig>,
    },
}

impl<'ast> PhaseOne<'_, 'ast> {
    pub(super) fn try_statement(&mut self, tree: TreeId, statement: &'ast Try) -> Result<()> {
        let finally = statement.finally.as_ref().map(FinallyBody::Block);

        if statement.resources.is_empty() {
            self.translate_try(tree, TryBody::Block(&statement.block), &statement.catches, finally)
        } else if statement.catches.is_empty() && finally.is_none() {
            self.resources(tree, &statement.resources, &statement.block)
        } else {
            self.translate_try(
                tree,
                TryBody::Resources(&statement.resources, &statement.block),
                &statement.catches,
                finally,
            )
        }
    }

    /// Declares the first resource and wraps the rest in a try whose finally closes it.
    /// Once every resource is declared, `block` is the protected block of the try `tree`.
    fn resources(
        &mut self,
        tree: TreeId,
        resources: &'ast [Resource],
        block: &'ast Block,
    ) -> Result<()> {
        let Some((first, rest)) = resources.split_first() else {
            return self.try_block(tree, block);
        };

        let (name, ty) = match &first.kind {
            ResourceKind::Decl(decl) => {
                self.local_declaration(decl)?;
                (decl.name.clone(), decl.ty.clone())
            }
            ResourceKind::Expr(expr) => {
                let name = unique_name("resource");
                self.declare_temp(&name, expr.ty.clone());
                let value = self.expr(expr)?;
                self.assign_temp(&name, expr.ty.clone(), value);
                (name, expr.ty.clone())
            }
        };

        self.translate_try(
            first.id,
            TryBody::Resources(rest, block),
            &[],
            Some(FinallyBody::Close {
                name,
                ty,
                close: &first.close,
            }),
        )
    }

    fn try_block(&mut self, tree: TreeId, block: &'ast Block) -> Result<()> {
        self.marker(format!("start of try block #{}", tree.0), tree);
        self.block(block)?;
        self.marker(format!("end of try block #{}", tree.0), tree);
        Ok(())
    }

    fn translate_try(
        &mut self,
        tree: TreeId,
        body: TryBody<'ast>,
        catches: &'ast [Catch],
        finally: Option<FinallyBody<'ast>>,
    ) -> Result<()> {
        self.marker(format!("start of try statement #{}", tree.0), tree);

        let handlers: Vec<(Type, Label)> = catches
            .iter()
            .map(|catch| (catch.param.ty.clone(), Label::new()))
            .collect();
        let done = Label::new();

        let region = match finally {
            Some(_) => {
                let normal = Label::new();
                let exceptional = Label::new();
                self.try_stack.push(TryFrame::Finally(exceptional.clone()));
                let region_scope = self.scope.finally_region();
                let outer = mem::replace(&mut self.scope, region_scope);
                Some((normal, exceptional, outer))
            }
            None => None,
        };
        let after_body = region
            .as_ref()
            .map_or_else(|| done.clone(), |(normal, ..)| normal.clone());

        self.try_stack.push(TryFrame::Catch(handlers.clone()));
        match body {
            TryBody::Block(block) => self.try_block(tree, block)?,
            TryBody::Resources(resources, block) => self.resources(tree, resources, block)?,
        }
        self.jump(after_body.clone());
        self.try_stack.pop();

        for (catch, (ty, label)) in catches.iter().zip(&handlers) {
            self.bind(label)?;
            self.marker(
                format!("start of catch block for {ty} #{}", tree.0),
                catch.id,
            );
            self.extend(Node::new(
                NodeKind::VariableDeclaration(catch.param.name.clone()),
                catch.param.ty.clone(),
                Some(catch.param.id),
            ));
            self.block(&catch.body)?;
            self.marker(format!("end of catch block for {ty} #{}", tree.0), catch.id);
            self.jump(after_body.clone());
        }

        if let (Some(finally), Some((normal, exceptional, outer))) = (finally, region) {
            self.try_stack.pop();
            let region_scope = mem::replace(&mut self.scope, outer);
            self.finally_copies(tree, &finally, normal, exceptional, region_scope, &done)?;
        }

        self.bind(&done)
    }

    /// Emits every finally copy the protected region needs.
    fn finally_copies(
        &mut self,
        tree: TreeId,
        finally: &FinallyBody<'ast>,
        normal: Label,
        exceptional: Label,
        region: Scope,
        done: &Label,
    ) -> Result<()> {
        self.bind(&normal)?;
        self.finally_copy(tree, finally)?;
        self.end_of_finally(tree);
        self.jump(done.clone());

        if self
            .sequence
            .iter()
            .any(|element| element.throws_to(&exceptional))
        {
            self.bind(&exceptional)?;
            self.finally_copy(tree, finally)?;
            let rethrown = self.required(WellKnownType::Throwable);
            self.extend_terminating(
                Node::synthetic(
                    NodeKind::Marker(Arc::from(format!(
                        "end of finally block (exceptional) #{}",
                        tree.0
                    ))),
                    Type::Void,
                    Some(tree),
                ),
                vec![rethrown],
            );
        }

        if region.return_target.was_accessed() {
            let label = region.return_target.peek()?;
            self.bind(&label)?;
            self.finally_copy(tree, finally)?;
            self.end_of_finally(tree);
            let target = self.scope.return_target.access();
            self.jump(target);
        }

        if let Some(cell) = region.break_target.as_ref().filter(|cell| cell.was_accessed()) {
            let label = cell.peek()?;
            self.bind(&label)?;
            self.finally_copy(tree, finally)?;
            self.end_of_finally(tree);
            let target = self
                .scope
                .break_target
                .as_mut()
                .ok_or_else(|| internal_error!("break out of a finally region without target"))?
                .access();
            self.jump(target);
        }

        for (name, label) in region.break_labels.escapes().to_vec() {
            self.bind(&label)?;
            self.finally_copy(tree, finally)?;
            self.end_of_finally(tree);
            let target = self
                .scope
                .break_labels
                .resolve(&name)
                .ok_or_else(|| internal_error!("break to unknown label {name}"))?;
            self.jump(target);
        }

        if let Some(cell) = region
            .continue_target
            .as_ref()
            .filter(|cell| cell.was_accessed())
        {
            let label = cell.peek()?;
            self.bind(&label)?;
            self.finally_copy(tree, finally)?;
            self.end_of_finally(tree);
            let target = self
                .scope
                .continue_target
                .as_mut()
                .ok_or_else(|| {
                    internal_error!("continue out of a finally region without target")
                })?
                .access();
            self.jump(target);
        }

        for (name, label) in region.continue_labels.escapes().to_vec() {
            self.bind(&label)?;
            self.finally_copy(tree, finally)?;
            self.end_of_finally(tree);
            let target = self
                .scope
                .continue_labels
                .resolve(&name)
                .ok_or_else(|| internal_error!("continue to unknown label {name}"))?;
            self.jump(target);
        }

        Ok(())
    }

    /// One copy of the finally block, preceded by its start marker.
    fn finally_copy(&mut self, tree: TreeId, finally: &FinallyBody<'ast>) -> Result<()> {
        self.marker(format!("start of finally block #{}", tree.0), tree);
        match finally {
            FinallyBody::Block(block) => self.block(block),
            FinallyBody::Close { name, ty, close } => {
                let resource = self.read_temp(name, ty.clone());
                let null = self.extend(Node::synthetic(
                    NodeKind::Literal(Literal::Null),
                    Type::Null,
                    None,
                ));
                let present = self.extend(Node::synthetic(
                    NodeKind::Binary {
                        op: BinaryOp::Ne,
                        lhs: resource,
                        rhs: null,
                    },
                    Type::boolean(),
                    None,
                ));
                let close_label = Label::new();
                let end = Label::new();
                self.branch(present, close_label.clone(), end.clone())?;

                self.bind(&close_label)?;
                let resource = self.read_temp(name, ty.clone());
                let access = self.extend(Node::synthetic(
                    NodeKind::MethodAccess {
                        receiver: resource,
                        method: Arc::clone(close),
                    },
                    close.return_type.clone(),
                    None,
                ));
                let causes = self.invocation_causes(&close.thrown);
                self.extend_throwing(
                    Node::synthetic(
                        NodeKind::MethodInvocation {
                            target: access,
                            args: Vec::new(),
                        },
                        close.return_type.clone(),
                        None,
                    ),
                    causes,
                );
                self.bind(&end)
            }
        }
    }

    fn end_of_finally(&mut self, tree: TreeId) {
        self.marker(format!("end of finally block #{}", tree.0), tree);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        analysis::cfg::{builder::ExtendedKind, NodeKind},
        ast::{AstBuilder, MethodSig},
        test::linearize_block,
        types::Type,
    };

    fn calls_to(linear: &crate::analysis::cfg::builder::PhaseOneResult<'_>, name: &str) -> usize {
        linear
            .nodes()
            .iter()
            .filter(|(_, node)| {
                matches!(&node.kind, NodeKind::MethodAccess { method, .. } if &*method.name == name)
            })
            .count()
    }

    fn action(name: &str) -> Arc<MethodSig> {
        Arc::new(MethodSig::new(Type::class("Test"), name, vec![], Type::Void).with_static())
    }

    #[test]
    fn test_finally_copied_for_normal_and_exceptional_paths() {
        let ast = AstBuilder::new();
        let work = action("work");
        let cleanup = action("cleanup");
        let body = ast.block(vec![ast.try_stmt(
            ast.block(vec![ast.expr_stmt(ast.call(None, &work, vec![]))]),
            vec![],
            Some(ast.block(vec![ast.expr_stmt(ast.call(None, &cleanup, vec![]))])),
        )]);
        let linear = linearize_block(&body);

        assert_eq!(calls_to(&linear, "cleanup"), 2);
        assert!(linear.unbound_labels().is_empty());

        let terminating = linear
            .sequence()
            .iter()
            .filter(|element| element.terminates)
            .count();
        assert_eq!(terminating, 1);
    }

    #[test]
    fn test_finally_copied_for_break_and_return() {
        let ast = AstBuilder::new();
        let cleanup = action("cleanup");
        let protected = ast.block(vec![
            ast.if_stmt(ast.local("a", Type::boolean()), ast.break_stmt(None), None),
            ast.return_stmt(None),
        ]);
        let try_stmt = ast.try_stmt(
            protected,
            vec![],
            Some(ast.block(vec![ast.expr_stmt(ast.call(None, &cleanup, vec![]))])),
        );
        let body = ast.block(vec![ast.while_stmt(
            ast.local("b", Type::boolean()),
            ast.block_stmt(vec![try_stmt]),
        )]);
        let linear = linearize_block(&body);

        // Nothing in the region throws: normal, return and break copies only.
        assert_eq!(calls_to(&linear, "cleanup"), 3);
        assert!(linear.unbound_labels().is_empty());
    }

    #[test]
    fn test_catch_receives_exceptions_of_body() {
        let ast = AstBuilder::new();
        let io = Type::class("java.io.IOException");
        let read = Arc::new(
            MethodSig::new(Type::class("Test"), "read", vec![], Type::int())
                .with_static()
                .throws(io.clone()),
        );
        let body = ast.block(vec![ast.try_stmt(
            ast.block(vec![ast.expr_stmt(ast.call(None, &read, vec![]))]),
            vec![ast.catch(ast.var("e", io.clone(), None), ast.block(vec![]))],
            None,
        )]);
        let linear = linearize_block(&body);

        let handler_reached = linear.sequence().iter().any(|element| match &element.kind {
            ExtendedKind::Exception { causes, .. } => causes
                .iter()
                .any(|(cause, labels)| *cause == io && labels.len() == 1 && labels[0] != *linear.exceptional_exit()),
            _ => false,
        });
        assert!(handler_reached);
    }

    #[test]
    fn test_resource_is_closed() {
        let ast = AstBuilder::new();
        let reader = Type::class("java.io.Reader");
        let open = Arc::new(MethodSig::new(Type::class("Test"), "open", vec![], reader.clone()).with_static());
        let close = Arc::new(
            MethodSig::new(reader.clone(), "close", vec![], Type::Void)
                .throws(Type::class("java.io.IOException")),
        );
        let resource = ast.resource(ast.var("r", reader, Some(ast.call(None, &open, vec![]))), &close);
        let body = ast.block(vec![ast.try_with_resources(vec![resource], ast.block(vec![]), vec![], None)]);
        let linear = linearize_block(&body);

        // The declaration precedes the start of the synthetic try.
        let first_marker = linear
            .nodes()
            .iter()
            .position(|(_, node)| matches!(node.kind, NodeKind::Marker(_)))
            .unwrap();
        let declaration = linear
            .nodes()
            .iter()
            .position(|(_, node)| matches!(node.kind, NodeKind::VariableDeclaration(_)))
            .unwrap();
        assert!(declaration < first_marker);

        assert!(calls_to(&linear, "close") >= 1);
        assert!(linear.unbound_labels().is_empty());
    }

    #[test]
    fn test_resource_body_is_marked_as_try_block() {
        let ast = AstBuilder::new();
        let reader = Type::class("java.io.Reader");
        let open = Arc::new(MethodSig::new(Type::class("Test"), "open", vec![], reader.clone()).with_static());
        let close = Arc::new(MethodSig::new(reader.clone(), "close", vec![], Type::Void));
        let consume = action("consume");
        let first = ast.resource(ast.var("a", reader.clone(), Some(ast.call(None, &open, vec![]))), &close);
        let second = ast.resource(ast.var("b", reader, Some(ast.call(None, &open, vec![]))), &close);
        let second_id = second.id;
        let body = ast.block(vec![ast.try_with_resources(
            vec![first, second],
            ast.block(vec![ast.expr_stmt(ast.call(None, &consume, vec![]))]),
            vec![],
            None,
        )]);
        let linear = linearize_block(&body);

        let position = |wanted: &dyn Fn(&NodeKind) -> bool| {
            linear
                .sequence()
                .iter()
                .position(|element| {
                    element
                        .node_id()
                        .and_then(|id| linear.nodes().get(id))
                        .is_some_and(|node| wanted(&node.kind))
                })
                .unwrap()
        };
        let start_text = format!("start of try block #{}", second_id.0);
        let end_text = format!("end of try block #{}", second_id.0);
        let start = position(&|kind| matches!(kind, NodeKind::Marker(text) if **text == *start_text));
        let end = position(&|kind| matches!(kind, NodeKind::Marker(text) if **text == *end_text));
        let call = position(
            &|kind| matches!(kind, NodeKind::MethodAccess { method, .. } if &*method.name == "consume"),
        );
        assert!(start < call && call < end);
    }
}

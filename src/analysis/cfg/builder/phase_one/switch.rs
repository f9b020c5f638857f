//! Translation of switch statements and switch expressions.
//!
//! The selector is evaluated once into a temporary. Each case then tests the temporary
//! against its labels and branches either to its body or to the test of the next case.
//! Bodies are laid out in the order their tests are emitted and chained with jumps, so
//! a colon-style body falls through to the body of the next case in source order even
//! when the default case was moved to the end.

use std::{iter, sync::Arc};

use crate::{
    analysis::cfg::{
        builder::label::{unique_name, Label, LabelCell},
        Node, NodeId, NodeKind,
    },
    ast::{Case, CaseBody, Expr, Switch},
    types::Type,
    Result,
};

use super::{lvalue, PhaseOne};

/// The result variable of a switch expression being translated.
#[derive(Debug, Clone)]
pub(super) struct SwitchResult {
    /// Synthetic variable every result is assigned to.
    pub(super) var: Arc<str>,
    /// Type of the switch expression.
    pub(super) ty: Type,
    /// Synthetic statement label of the end of the expression, the target of `yield`.
    pub(super) exit: Arc<str>,
}

impl<'ast> PhaseOne<'_, 'ast> {
    pub(super) fn switch_stmt(&mut self, switch: &'ast Switch) -> Result<()> {
        self.switch(switch, None)?;
        Ok(())
    }

    /// Translates a switch expression and returns the read of its result.
    pub(super) fn switch_expr(&mut self, expr: &'ast Expr, switch: &'ast Switch) -> Result<NodeId> {
        self.switch(switch, Some(expr))?
            .ok_or_else(|| internal_error!("switch expression {} produced no value", expr.id))
    }

    fn switch(&mut self, switch: &'ast Switch, expr: Option<&'ast Expr>) -> Result<Option<NodeId>> {
        let break_label = Label::new();
        let outer_break = self
            .scope
            .break_target
            .replace(LabelCell::with(break_label.clone()));

        let result = match expr {
            Some(expr) => {
                let result = SwitchResult {
                    var: unique_name("switchResult"),
                    ty: expr.ty.clone(),
                    exit: unique_name("switchExpression"),
                };
                self.declare_temp(&result.var, result.ty.clone());
                self.scope
                    .break_labels
                    .define(result.exit.clone(), break_label.clone());
                self.switch_results.push(result.clone());
                Some(result)
            }
            None => None,
        };

        let selector = self.switch_selector(switch)?;
        self.marker(
            format!("start of switch statement #{}", switch.id.0),
            switch.id,
        );

        let cases = &switch.cases;
        let body_labels: Vec<Label> = cases
            .iter()
            .map(|_| Label::new())
            .chain(iter::once(break_label.clone()))
            .collect();

        let deferred = cases
            .iter()
            .position(|case| case.is_default)
            .or_else(|| (switch.exhaustive && !cases.is_empty()).then(|| cases.len() - 1));

        for (index, case) in cases.iter().enumerate() {
            if Some(index) != deferred {
                self.switch_case(case, selector, &body_labels, index, false, result.as_ref())?;
            }
        }
        if let Some(index) = deferred {
            self.switch_case(&cases[index], selector, &body_labels, index, true, result.as_ref())?;
        }

        self.bind(&break_label)?;
        self.scope.break_target = outer_break;
        self.marker(format!("end of switch statement #{}", switch.id.0), switch.id);

        match (expr, result) {
            (Some(expr), Some(result)) => {
                self.switch_results.pop();
                self.scope.break_labels.undefine(&result.exit);
                Ok(Some(self.extend(Node::synthetic(
                    NodeKind::LocalVariable(result.var),
                    result.ty,
                    Some(expr.id),
                ))))
            }
            _ => Ok(None),
        }
    }

    /// Assigns the unboxed selector to a fresh temporary and returns the assignment.
    fn switch_selector(&mut self, switch: &'ast Switch) -> Result<NodeId> {
        let ty = switch
            .selector
            .ty
            .unboxed()
            .map_or_else(|| switch.selector.ty.clone(), Type::from);
        let var = unique_name("switch");
        self.declare_temp(&var, ty.clone());
        let target = self.extend(lvalue(Node::synthetic(
            NodeKind::LocalVariable(var),
            ty.clone(),
            None,
        )));

        let value = self.expr(&switch.selector)?;
        let value = self.unbox(value);
        Ok(self.extend(Node::synthetic(
            NodeKind::Assignment { target, value },
            ty,
            None,
        )))
    }

    /// Emits the test and body of one case.
    ///
    /// The terminal case (the default, or the last case of an exhaustive switch) has no
    /// test: control only reaches it when every other test failed.
    fn switch_case(
        &mut self,
        case: &'ast Case,
        selector: NodeId,
        body_labels: &[Label],
        index: usize,
        terminal: bool,
        result: Option<&SwitchResult>,
    ) -> Result<()> {
        let this_body = body_labels[index].clone();
        let next_body = body_labels[index + 1].clone();
        let next_case = Label::new();

        if !terminal {
            let mut labels = Vec::with_capacity(case.labels.len());
            for label in &case.labels {
                labels.push(self.expr(label)?);
            }
            let test = self.extend(Node::new(
                NodeKind::Case { selector, labels },
                Type::boolean(),
                Some(case.id),
            ));
            self.branch(test, this_body.clone(), next_case.clone())?;
        }

        self.bind(&this_body)?;
        match &case.body {
            CaseBody::Statements(stmts) => {
                for stmt in stmts {
                    self.stmt(stmt)?;
                }
                self.jump(next_body);
            }
            CaseBody::Expr(value) => {
                match result {
                    Some(result) => {
                        let value = self.expr(value)?;
                        let value = self.assign_convert(value, &result.ty);
                        self.assign_temp(&result.var, result.ty.clone(), value);
                    }
                    None => {
                        self.expr(value)?;
                    }
                }
                self.jump_to_break()?;
            }
            CaseBody::Stmt(stmt) => {
                self.stmt(stmt)?;
                self.jump_to_break()?;
            }
        }

        if !terminal {
            self.bind(&next_case)?;
        }
        Ok(())
    }

    fn jump_to_break(&mut self) -> Result<()> {
        let target = self
            .scope
            .break_target
            .as_mut()
            .ok_or_else(|| internal_error!("switch case without break target"))?
            .access();
        self.jump(target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        analysis::cfg::{builder::ExtendedKind, NodeKind},
        ast::{AstBuilder, CaseBody},
        test::{kinds_of, linearize_block},
        types::Type,
    };

    #[test]
    fn test_default_case_is_tested_last() {
        let ast = AstBuilder::new();
        let first = ast.case(vec![ast.int(1)], CaseBody::Statements(vec![ast.break_stmt(None)]));
        let default = ast.default_case(CaseBody::Statements(vec![]));
        let last = ast.case(vec![ast.int(2), ast.int(3)], CaseBody::Statements(vec![]));
        let body = ast.block(vec![ast.switch_stmt(
            ast.local("x", Type::int()),
            vec![first, default, last],
        )]);
        let linear = linearize_block(&body);

        let tests: Vec<usize> = linear
            .nodes()
            .iter()
            .filter_map(|(_, node)| match &node.kind {
                NodeKind::Case { labels, .. } => Some(labels.len()),
                _ => None,
            })
            .collect();
        assert_eq!(tests, vec![1, 2]);
        assert!(linear.unbound_labels().is_empty());

        let kinds = kinds_of(&linear);
        assert_eq!(kinds.iter().filter(|k| **k == "Marker").count(), 2);
    }

    #[test]
    fn test_boxed_selector_is_unboxed() {
        let ast = AstBuilder::new();
        let case = ast.case(vec![ast.int(1)], CaseBody::Statements(vec![]));
        let body = ast.block(vec![ast.switch_stmt(
            ast.local("boxed", Type::class("java.lang.Integer")),
            vec![case],
        )]);
        let linear = linearize_block(&body);

        let kinds = kinds_of(&linear);
        assert_eq!(
            &kinds[..6],
            &[
                "VariableDeclaration",
                "LocalVariable",
                "LocalVariable",
                "MethodAccess",
                "MethodInvocation",
                "Assignment"
            ]
        );
    }

    #[test]
    fn test_switch_expression_reads_result() {
        let ast = AstBuilder::new();
        let one = ast.case(vec![ast.int(1)], CaseBody::Expr(ast.string("one")));
        let other = ast.default_case(CaseBody::Stmt(Box::new(ast.block_stmt(vec![
            ast.yield_stmt(ast.string("many")),
        ]))));
        let switch = ast.switch_expr(Type::string(), ast.local("n", Type::int()), vec![one, other], false);
        let switch_id = switch.id;
        let body = ast.block(vec![ast.local_var("s", Type::string(), Some(switch))]);
        let linear = linearize_block(&body);

        let result = linear.lookups.unconverted[&switch_id][0];
        match &linear.nodes().get(result).unwrap().kind {
            NodeKind::LocalVariable(name) => assert!(name.starts_with("switchResult#num")),
            other => panic!("unexpected result node {other:?}"),
        }

        let assigned_results = linear
            .nodes()
            .iter()
            .filter(|(_, node)| {
                matches!(&node.kind, NodeKind::LocalVariable(name)
                    if name.starts_with("switchResult#num") && node.is_lvalue())
            })
            .count();
        assert_eq!(assigned_results, 2);
        assert!(linear.unbound_labels().is_empty());
    }

    #[test]
    fn test_arrow_cases_do_not_fall_through() {
        let ast = AstBuilder::new();
        let first = ast.case(vec![ast.int(1)], CaseBody::Expr(ast.local("a", Type::int())));
        let second = ast.case(vec![ast.int(2)], CaseBody::Expr(ast.local("b", Type::int())));
        let body = ast.block(vec![ast.switch_stmt(ast.local("x", Type::int()), vec![first, second])]);
        let linear = linearize_block(&body);

        let break_jumps = linear
            .sequence()
            .iter()
            .filter(|element| matches!(&element.kind, ExtendedKind::Jump(label)
                if linear.binding(label) == Some(linear.sequence().len() - 2)))
            .count();
        assert_eq!(break_jumps, 2);
    }
}

//! Switch expressions: arrow results and `yield` from nested statements.

mod common;

use flowscope::{
    analysis::{
        cfg::builder::{ExtendedKind, PhaseOneResult},
        NodeId, NodeKind,
    },
    ast::{AstBuilder, BinaryOp, Block, CaseBody, UnaryOp, UnderlyingAst},
    types::{ClassHierarchy, Type},
    CfgBuilder, Result,
};

use common::test_class;

/// `int r = switch (x) { case 1 -> 10; case 2 -> { loop with yield; yield -1; } default -> { yield 0; } };`
fn searching_switch(ast: &AstBuilder) -> Block {
    let int = Type::int;
    let i = || ast.local("i", int());

    let search = ast.block_stmt(vec![
        ast.local_var("i", int(), Some(ast.int(0))),
        ast.while_stmt(
            ast.binary(BinaryOp::Lt, i(), ast.local("n", int())),
            ast.block_stmt(vec![
                ast.if_stmt(
                    ast.local("found", Type::boolean()),
                    ast.yield_stmt(i()),
                    None,
                ),
                ast.expr_stmt(ast.unary(UnaryOp::PostIncrement, i())),
            ]),
        ),
        ast.yield_stmt(ast.int(-1)),
    ]);
    let cases = vec![
        ast.case(vec![ast.int(1)], CaseBody::Expr(ast.int(10))),
        ast.case(vec![ast.int(2)], CaseBody::Stmt(Box::new(search))),
        ast.default_case(CaseBody::Stmt(Box::new(
            ast.block_stmt(vec![ast.yield_stmt(ast.int(0))]),
        ))),
    ];
    let switch = ast.switch_expr(int(), ast.local("x", int()), cases, false);
    ast.block(vec![ast.local_var("r", int(), Some(switch))])
}

fn node_kind<'a>(linear: &'a PhaseOneResult<'_>, index: usize) -> Option<&'a NodeKind> {
    let id = linear.sequence().get(index)?.node_id()?;
    Some(&linear.nodes().get(id)?.kind)
}

/// Index of the last `end of switch statement` marker, which belongs to the outermost switch.
fn outer_switch_end(linear: &PhaseOneResult<'_>) -> usize {
    (0..linear.sequence().len())
        .filter(|index| {
            matches!(node_kind(linear, *index),
                Some(NodeKind::Marker(text)) if text.starts_with("end of switch statement"))
        })
        .max()
        .unwrap()
}

/// Sequence indices of the assignments to the result variable of a switch expression.
fn result_assignments(linear: &PhaseOneResult<'_>) -> Vec<usize> {
    let is_result = |id: NodeId| {
        matches!(&linear.nodes().get(id).unwrap().kind,
            NodeKind::LocalVariable(name) if name.starts_with("switchResult"))
    };
    (0..linear.sequence().len())
        .filter(|index| {
            matches!(node_kind(linear, *index),
                Some(NodeKind::Assignment { target, .. }) if is_result(*target))
        })
        .collect()
}

#[test]
fn test_every_result_jumps_to_the_end_of_the_switch() -> Result<()> {
    let ast = AstBuilder::new();
    let body = searching_switch(&ast);
    let class = test_class();
    let hierarchy = ClassHierarchy::with_java_lang();
    let linear = CfgBuilder::new(&hierarchy).linearize(UnderlyingAst::arbitrary(&body, &class))?;
    assert!(linear.unbound_labels().is_empty());

    let end = outer_switch_end(&linear);
    let assignments = result_assignments(&linear);
    // `10`, `yield i`, `yield -1` and `yield 0`
    assert_eq!(assignments.len(), 4);

    for index in assignments {
        match &linear.sequence()[index + 1].kind {
            ExtendedKind::Jump(label) => assert_eq!(linear.binding(label), Some(end)),
            other => panic!("result assignment followed by {other:?}"),
        }
    }
    Ok(())
}

#[test]
fn test_yield_inside_loop_leaves_the_loop() -> Result<()> {
    let ast = AstBuilder::new();
    let body = searching_switch(&ast);
    let class = test_class();
    let hierarchy = ClassHierarchy::with_java_lang();
    let cfg = CfgBuilder::new(&hierarchy).build(UnderlyingAst::arbitrary(&body, &class))?;
    cfg.check_invariants()?;

    let end_marker = cfg
        .nodes()
        .iter()
        .find(|(_, node)| {
            matches!(&node.kind, NodeKind::Marker(text) if text.starts_with("end of switch statement"))
        })
        .map(|(id, _)| id)
        .unwrap();
    let end = cfg.block_of(end_marker).unwrap();

    // One incoming edge per result, none of them from the loop head.
    assert_eq!(cfg.predecessors(end).count(), 4);
    for pred in cfg.predecessors(end) {
        let block = cfg.block(pred).unwrap();
        let last = *block.nodes().last().unwrap();
        assert!(matches!(cfg.node(last).unwrap().kind, NodeKind::Assignment { .. }));
    }
    Ok(())
}

#[test]
fn test_yield_through_nested_switch_statement() -> Result<()> {
    let ast = AstBuilder::new();
    let int = Type::int;

    // case 1 -> { switch (y) { case 1: yield 5; default: break; } yield 6; }
    let inner = ast.switch_stmt(
        ast.local("y", int()),
        vec![
            ast.case(vec![ast.int(1)], CaseBody::Statements(vec![ast.yield_stmt(ast.int(5))])),
            ast.default_case(CaseBody::Statements(vec![ast.break_stmt(None)])),
        ],
    );
    let cases = vec![
        ast.case(
            vec![ast.int(1)],
            CaseBody::Stmt(Box::new(
                ast.block_stmt(vec![inner, ast.yield_stmt(ast.int(6))]),
            )),
        ),
        ast.default_case(CaseBody::Expr(ast.int(7))),
    ];
    let switch = ast.switch_expr(int(), ast.local("x", int()), cases, false);
    let body = ast.block(vec![ast.local_var("r", int(), Some(switch))]);

    let class = test_class();
    let hierarchy = ClassHierarchy::with_java_lang();
    let builder = CfgBuilder::new(&hierarchy);
    let linear = builder.linearize(UnderlyingAst::arbitrary(&body, &class))?;
    assert!(linear.unbound_labels().is_empty());

    let end = outer_switch_end(&linear);
    let assignments = result_assignments(&linear);
    assert_eq!(assignments.len(), 3);
    for index in assignments {
        match &linear.sequence()[index + 1].kind {
            ExtendedKind::Jump(label) => assert_eq!(linear.binding(label), Some(end)),
            other => panic!("result assignment followed by {other:?}"),
        }
    }

    builder
        .build(UnderlyingAst::arbitrary(&body, &class))?
        .check_invariants()
}

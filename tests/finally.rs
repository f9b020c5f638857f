//! Finally duplication and try-with-resources.
//!
//! A finally block is emitted once per distinct way of leaving its try statement that the
//! protected region actually uses. These tests count the copies that survive in the
//! simplified graph and check where each of them continues.

mod common;

use std::sync::Arc;

use flowscope::{
    analysis::{BuilderOptions, NodeKind},
    ast::{AstBuilder, BinaryOp, MethodSig, UnderlyingAst},
    types::{ClassHierarchy, Type},
    CfgBuilder, Result,
};

use common::{action, reachable_calls, reaches, test_class};

#[test]
fn test_one_copy_per_exit_kind() -> Result<()> {
    let ast = AstBuilder::new();
    let risky = action("risky");
    let cleanup = action("cleanup");
    let flag = |name: &str| ast.local(name, Type::boolean());

    let protected = ast.block(vec![
        ast.if_stmt(flag("a"), ast.return_stmt(None), None),
        ast.if_stmt(flag("b"), ast.break_stmt(None), None),
        ast.if_stmt(flag("c"), ast.continue_stmt(None), None),
        ast.expr_stmt(ast.call(None, &risky, vec![])),
    ]);
    let body = ast.block(vec![ast.while_stmt(
        flag("running"),
        ast.try_stmt(
            protected,
            vec![],
            Some(ast.block(vec![ast.expr_stmt(ast.call(None, &cleanup, vec![]))])),
        ),
    )]);
    let class = test_class();
    let hierarchy = ClassHierarchy::with_java_lang();
    let cfg = CfgBuilder::new(&hierarchy).build(UnderlyingAst::arbitrary(&body, &class))?;
    cfg.check_invariants()?;

    // normal, exceptional, return, break and continue
    assert_eq!(reachable_calls(&cfg, "cleanup").len(), 5);
    Ok(())
}

#[test]
fn test_labeled_escapes_get_their_own_copy() -> Result<()> {
    let ast = AstBuilder::new();
    let cleanup = action("cleanup");
    let flag = |name: &str| ast.local(name, Type::boolean());

    let protected = ast.block(vec![
        ast.if_stmt(flag("a"), ast.break_stmt(Some("outer")), None),
        ast.if_stmt(flag("b"), ast.break_stmt(None), None),
        ast.if_stmt(flag("c"), ast.continue_stmt(Some("outer")), None),
    ]);
    let inner = ast.while_stmt(
        flag("inner"),
        ast.try_stmt(
            protected,
            vec![],
            Some(ast.block(vec![ast.expr_stmt(ast.call(None, &cleanup, vec![]))])),
        ),
    );
    let body = ast.block(vec![ast.labeled(
        "outer",
        ast.while_stmt(flag("outer"), ast.block_stmt(vec![inner])),
    )]);
    let class = test_class();
    let hierarchy = ClassHierarchy::with_java_lang();
    let builder = CfgBuilder::new(&hierarchy);

    let linear = builder.linearize(UnderlyingAst::arbitrary(&body, &class))?;
    assert!(linear.unbound_labels().is_empty());

    let cfg = builder.build(UnderlyingAst::arbitrary(&body, &class))?;
    cfg.check_invariants()?;

    // Reading locals cannot throw, so there is no exceptional copy: normal, break,
    // break outer and continue outer.
    let copies = reachable_calls(&cfg, "cleanup");
    assert_eq!(copies.len(), 4);
    Ok(())
}

#[test]
fn test_return_copy_continues_at_exit() -> Result<()> {
    let ast = AstBuilder::new();
    let cleanup = action("cleanup");
    let method = ast.method(
        "answer",
        vec![],
        Type::int(),
        ast.block(vec![ast.try_stmt(
            ast.block(vec![ast.return_stmt(Some(ast.int(42)))]),
            vec![],
            Some(ast.block(vec![ast.expr_stmt(ast.call(None, &cleanup, vec![]))])),
        )]),
    );
    let class = test_class();
    let hierarchy = ClassHierarchy::with_java_lang();
    let cfg = CfgBuilder::new(&hierarchy).build(UnderlyingAst::method(&method, &class))?;
    cfg.check_invariants()?;

    assert_eq!(cfg.return_nodes().len(), 1);
    let copies = reachable_calls(&cfg, "cleanup");
    assert_eq!(copies.len(), 1, "only the return path leaves the region");
    let copy = cfg.block_of(copies[0]).unwrap();
    assert!(reaches(&cfg, copy, cfg.exit()));

    let returned = cfg.block_of(cfg.return_nodes()[0]).unwrap();
    assert!(reaches(&cfg, returned, copy));
    Ok(())
}

#[test]
fn test_resources_are_closed_in_reverse_order() -> Result<()> {
    let ast = AstBuilder::new();
    let reader = Type::class("java.io.Reader");
    let io = Type::class("java.io.IOException");
    let open = Arc::new(
        MethodSig::new(Type::class("Test"), "open", vec![], reader.clone())
            .with_static()
            .throws(io.clone()),
    );
    let close =
        Arc::new(MethodSig::new(reader.clone(), "close", vec![], Type::Void).throws(io.clone()));
    let consume = action("consume");
    let handle = action("handle");

    let first = ast.resource(
        ast.var("first", reader.clone(), Some(ast.call(None, &open, vec![]))),
        &close,
    );
    let second = ast.resource(
        ast.var("second", reader, Some(ast.call(None, &open, vec![]))),
        &close,
    );
    let body = ast.block(vec![ast.try_with_resources(
        vec![first, second],
        ast.block(vec![ast.expr_stmt(ast.call(None, &consume, vec![]))]),
        vec![ast.catch(
            ast.var("e", io, None),
            ast.block(vec![ast.expr_stmt(ast.call(None, &handle, vec![]))]),
        )],
        None,
    )]);
    let class = test_class();
    let hierarchy = ClassHierarchy::with_java_lang();
    let builder = CfgBuilder::new(&hierarchy);

    let linear = builder.linearize(UnderlyingAst::arbitrary(&body, &class))?;
    let closed: Vec<String> = linear
        .sequence()
        .iter()
        .filter_map(|element| element.node_id())
        .filter_map(|id| match &linear.nodes().get(id)?.kind {
            NodeKind::MethodAccess { receiver, method } if &*method.name == "close" => {
                match &linear.nodes().get(*receiver)?.kind {
                    NodeKind::LocalVariable(name) => Some(name.to_string()),
                    _ => None,
                }
            }
            _ => None,
        })
        .collect();
    // normal and exceptional copy for each resource, the inner one first
    assert_eq!(closed, vec!["second", "second", "first", "first"]);

    let null_checks = linear
        .nodes()
        .iter()
        .filter(|(_, node)| matches!(node.kind, NodeKind::Binary { op: BinaryOp::Ne, .. }))
        .count();
    assert_eq!(null_checks, 4);

    let cfg = builder.build(UnderlyingAst::arbitrary(&body, &class))?;
    cfg.check_invariants()?;

    // An exception from any close reaches the catch clause.
    let handler = cfg.block_of(reachable_calls(&cfg, "handle")[0]).unwrap();
    for copy in reachable_calls(&cfg, "close") {
        assert!(reaches(&cfg, cfg.block_of(copy).unwrap(), handler));
    }
    Ok(())
}

#[test]
fn test_non_throwing_region_has_no_exceptional_copy() -> Result<()> {
    let ast = AstBuilder::new();
    let cleanup = action("cleanup");
    let body = ast.block(vec![ast.try_stmt(
        ast.block(vec![ast.expr_stmt(ast.local("x", Type::int()))]),
        vec![],
        Some(ast.block(vec![ast.expr_stmt(ast.call(None, &cleanup, vec![]))])),
    )]);
    let class = test_class();
    let hierarchy = ClassHierarchy::with_java_lang();
    let cfg = CfgBuilder::new(&hierarchy)
        .with_options(BuilderOptions::unsimplified())
        .build(UnderlyingAst::arbitrary(&body, &class))?;
    cfg.check_invariants()?;

    // Reading a local cannot throw, so only the normal copy exists.
    assert_eq!(reachable_calls(&cfg, "cleanup").len(), 1);
    Ok(())
}

//! Fixtures shared by the unit tests.
//!
//! Bodies are translated against [`ClassHierarchy::with_java_lang`] inside a leaked
//! placeholder class, so tests only have to keep the body itself alive.

use crate::{
    analysis::{cfg::builder::PhaseOneResult, BuilderOptions, CfgBuilder, ControlFlowGraph},
    ast::{AstBuilder, BinaryOp, Block, ClassDecl, Member, MethodDecl, UnaryOp, UnderlyingAst},
    types::{ClassHierarchy, Type},
};

/// A class without members.
pub fn class_named(name: &str) -> ClassDecl {
    AstBuilder::new().class(name, vec![])
}

fn placeholder_class() -> &'static ClassDecl {
    Box::leak(Box::new(class_named("Test")))
}

/// A class with the methods `empty` and `looping`.
pub fn sample_class() -> ClassDecl {
    let ast = AstBuilder::new();
    let empty = ast.method("empty", vec![], Type::Void, ast.block(vec![]));

    let i = || ast.local("i", Type::int());
    let looping = ast.method(
        "looping",
        vec![],
        Type::Void,
        ast.block(vec![
            ast.local_var("i", Type::int(), Some(ast.int(0))),
            ast.while_stmt(
                ast.binary(BinaryOp::Lt, i(), ast.int(10)),
                ast.expr_stmt(ast.unary(UnaryOp::PostIncrement, i())),
            ),
        ]),
    );

    ast.class(
        "Sample",
        vec![Member::Method(empty), Member::Method(looping)],
    )
}

/// Finds the method `name` of `class`.
pub fn method_in_class<'a>(class: &'a ClassDecl, name: &str) -> &'a MethodDecl {
    class
        .members
        .iter()
        .find_map(|member| match member {
            Member::Method(method) if &*method.name == name => Some(method),
            _ => None,
        })
        .unwrap_or_else(|| panic!("{} has no method {name}", class.name))
}

/// Linearizes `body` with default options.
pub fn linearize_block(body: &Block) -> PhaseOneResult<'_> {
    linearize_block_with(body, BuilderOptions::default())
}

/// Linearizes `body` with `options`.
pub fn linearize_block_with(body: &Block, options: BuilderOptions) -> PhaseOneResult<'_> {
    let hierarchy = ClassHierarchy::with_java_lang();
    CfgBuilder::new(&hierarchy)
        .with_options(options)
        .linearize(UnderlyingAst::arbitrary(body, placeholder_class()))
        .unwrap()
}

/// Linearizes the body of `method`, converting returned values to its return type.
pub fn linearize_method(method: &MethodDecl) -> PhaseOneResult<'_> {
    let hierarchy = ClassHierarchy::with_java_lang();
    CfgBuilder::new(&hierarchy)
        .linearize(UnderlyingAst::method(method, placeholder_class()))
        .unwrap()
}

/// Builds the simplified graph of `body`.
pub fn build_block(body: &Block) -> ControlFlowGraph<'_> {
    let hierarchy = ClassHierarchy::with_java_lang();
    CfgBuilder::new(&hierarchy)
        .build(UnderlyingAst::arbitrary(body, placeholder_class()))
        .unwrap()
}

/// Builds the graph of `body` as assembled, without simplification.
pub fn build_block_unsimplified(body: &Block) -> ControlFlowGraph<'_> {
    let hierarchy = ClassHierarchy::with_java_lang();
    CfgBuilder::new(&hierarchy)
        .with_options(BuilderOptions::unsimplified())
        .build(UnderlyingAst::arbitrary(body, placeholder_class()))
        .unwrap()
}

/// Kind names of the operations in sequence order, including throwing ones.
pub fn kinds_of(linear: &PhaseOneResult<'_>) -> Vec<&'static str> {
    linear
        .sequence()
        .iter()
        .filter_map(|element| element.node_id())
        .filter_map(|id| linear.nodes().get(id))
        .map(|node| node.kind.name())
        .collect()
}

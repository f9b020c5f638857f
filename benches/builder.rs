//! Benchmarks for control flow graph construction.
//!
//! Measures each phase on its own and the full pipeline for:
//! - A loop with a nested try/finally that is copied for every exit
//! - Generated skeletons mixing loops, labels, switches and try statements
//! - Parallel construction of many bodies

extern crate flowscope;

#[path = "../tests/common/skeleton.rs"]
mod skeleton;

use std::{hint::black_box, sync::Arc};

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use flowscope::{
    ast::{AstBuilder, BinaryOp, Block, ClassDecl, MethodSig, UnaryOp, UnderlyingAst},
    types::{ClassHierarchy, Type},
    BuilderOptions, CfgBuilder,
};

/// `for (int i = 0; i < n; i++) { try { if (a) break; if (b) continue; work(i); } finally { done(); } }`
fn finally_loop(ast: &AstBuilder) -> Block {
    let void = |name: &str, params| {
        Arc::new(MethodSig::new(Type::class("Bench"), name, params, Type::Void).with_static())
    };
    let work = void("work", vec![Type::int()]);
    let done = void("done", vec![]);
    let i = || ast.local("i", Type::int());

    let protected = ast.block(vec![
        ast.if_stmt(ast.local("a", Type::boolean()), ast.break_stmt(None), None),
        ast.if_stmt(ast.local("b", Type::boolean()), ast.continue_stmt(None), None),
        ast.expr_stmt(ast.call(None, &work, vec![i()])),
    ]);
    ast.block(vec![ast.for_stmt(
        vec![ast.local_var("i", Type::int(), Some(ast.int(0)))],
        Some(ast.binary(BinaryOp::Lt, i(), ast.local("n", Type::int()))),
        vec![ast.unary(UnaryOp::PostIncrement, i())],
        ast.try_stmt(
            protected,
            vec![],
            Some(ast.block(vec![ast.expr_stmt(ast.call(None, &done, vec![]))])),
        ),
    )])
}

fn generated(count: u64) -> Vec<Block> {
    (0..count)
        .map(|seed| {
            let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
            let data: Vec<u8> = (0..128)
                .map(|_| {
                    state ^= state << 13;
                    state ^= state >> 7;
                    state ^= state << 17;
                    (state >> 24) as u8
                })
                .collect();
            skeleton::skeleton(&data)
        })
        .collect()
}

fn bench_class() -> ClassDecl {
    AstBuilder::new().class("Bench", vec![])
}

/// Benchmark the first phase alone.
fn bench_linearize(c: &mut Criterion) {
    let ast = AstBuilder::new();
    let body = finally_loop(&ast);
    let class = bench_class();
    let hierarchy = ClassHierarchy::with_java_lang();
    let builder = CfgBuilder::new(&hierarchy);

    c.bench_function("linearize_finally_loop", |b| {
        b.iter(|| {
            let linear = builder
                .linearize(UnderlyingAst::arbitrary(black_box(&body), &class))
                .unwrap();
            black_box(linear)
        });
    });
}

/// Benchmark block assembly, with a fresh first-phase result per iteration.
fn bench_assemble(c: &mut Criterion) {
    let ast = AstBuilder::new();
    let body = finally_loop(&ast);
    let class = bench_class();
    let hierarchy = ClassHierarchy::with_java_lang();
    let builder = CfgBuilder::new(&hierarchy);

    c.bench_function("assemble_finally_loop", |b| {
        b.iter_batched(
            || {
                builder
                    .linearize(UnderlyingAst::arbitrary(&body, &class))
                    .unwrap()
            },
            |linear| black_box(CfgBuilder::assemble(linear).unwrap()),
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark simplification of an assembled graph.
fn bench_simplify(c: &mut Criterion) {
    let ast = AstBuilder::new();
    let body = finally_loop(&ast);
    let class = bench_class();
    let hierarchy = ClassHierarchy::with_java_lang();
    let builder = CfgBuilder::new(&hierarchy).with_options(BuilderOptions::unsimplified());

    c.bench_function("simplify_finally_loop", |b| {
        b.iter_batched(
            || {
                builder
                    .build(UnderlyingAst::arbitrary(&body, &class))
                    .unwrap()
            },
            |mut cfg| {
                cfg.simplify();
                black_box(cfg)
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark the full pipeline over generated skeletons.
fn bench_build_generated(c: &mut Criterion) {
    let bodies = generated(64);
    let class = bench_class();
    let hierarchy = ClassHierarchy::with_java_lang();
    let builder = CfgBuilder::new(&hierarchy);

    c.bench_function("build_generated_64", |b| {
        b.iter(|| {
            for body in &bodies {
                let cfg = builder
                    .build(UnderlyingAst::arbitrary(black_box(body), &class))
                    .unwrap();
                black_box(cfg);
            }
        });
    });
}

/// Benchmark parallel construction of the same skeletons.
fn bench_build_all(c: &mut Criterion) {
    let bodies = generated(64);
    let class = bench_class();
    let hierarchy = ClassHierarchy::with_java_lang();
    let builder = CfgBuilder::new(&hierarchy);
    let underlying: Vec<_> = bodies
        .iter()
        .map(|body| UnderlyingAst::arbitrary(body, &class))
        .collect();

    c.bench_function("build_all_generated_64", |b| {
        b.iter(|| black_box(builder.build_all(black_box(&underlying))));
    });
}

criterion_group!(
    benches,
    bench_linearize,
    bench_assemble,
    bench_simplify,
    bench_build_generated,
    bench_build_all
);
criterion_main!(benches);

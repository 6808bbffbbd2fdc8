//! Effect Checker Benchmarks
//!
//! This module benchmarks whole-program effect analysis:
//! - Many independent invocations
//! - Long chains of relative effects forwarded through parameters
//! - Target resolution through deep class hierarchies

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use purity_ast::{Annotation, DeclId, DeclKind, Program, ProgramBuilder, Ty, TypeKind};
use purity_effects::{Analysis, AnalysisConfig, NamedEffectDomain, PurityDomain};

// ============================================================================
// Program Generators
// ============================================================================

fn declare_write(b: &mut ProgramBuilder) -> DeclId {
    let write = b.declare(DeclKind::Operation, "write");
    b.param(write, "s", Ty::Int);
    b.annotate(write, Annotation::new("effect", ["IO"]));
    write
}

/// `count` helpers each calling `write`, all invoked from a pure `main`
fn generate_many_calls(count: usize) -> Program {
    let mut b = ProgramBuilder::new();
    let write = declare_write(&mut b);

    let mut calls = Vec::with_capacity(count);
    for i in 0..count {
        let helper = b.declare(DeclKind::Operation, format!("helper{}", i));
        b.annotate(helper, Annotation::new("effect", ["IO"]));
        let arg = b.int(i as i64);
        let call = b.invoke(None, write, vec![arg]);
        b.set_body(helper, call);
        calls.push(b.invoke(None, helper, vec![]));
    }

    let main = b.declare(DeclKind::Operation, "main");
    b.annotate(main, Annotation::marker("pure"));
    let body = b.block(calls, None);
    b.set_body(main, body);
    b.finish()
}

/// `layer{n}(f)` forwards `f` to `layer{n-1}`; `layer0` applies it
fn generate_forwarding_chain(depth: usize) -> Program {
    let mut b = ProgramBuilder::new();
    let write = declare_write(&mut b);
    let fn_ty = b.function_type("Function1");
    let fn_apply = b.program().type_def(fn_ty).members["apply"];

    let layer = |b: &mut ProgramBuilder, level: usize, inner: Option<DeclId>| {
        let hof = b.declare(DeclKind::Operation, format!("layer{}", level));
        let f = b.param(hof, "f", Ty::Named(fn_ty));
        b.annotate(hof, Annotation::new("rel", ["f"]));
        let arg = b.param_ref(f);
        let body = match inner {
            Some(inner) => b.invoke(None, inner, vec![arg]),
            None => b.invoke(Some(arg), fn_apply, vec![]),
        };
        b.set_body(hof, body);
        hof
    };

    let mut top = layer(&mut b, 0, None);
    for level in 1..depth {
        top = layer(&mut b, level, Some(top));
    }

    let main = b.declare(DeclKind::Operation, "main");
    let callback = b.eta_expand(fn_ty, write);
    let body = b.invoke(None, top, vec![callback]);
    b.set_body(main, body);
    b.finish()
}

/// `step` is declared only on the root of a `depth`-deep class chain
fn generate_deep_hierarchy(depth: usize) -> Program {
    let mut b = ProgramBuilder::new();
    let root = b.declare_type(TypeKind::Class, "Base", None);
    let step = b.declare_member(root, DeclKind::Operation, "step");
    b.annotate(step, Annotation::new("effect", ["IO"]));

    let mut leaf = root;
    for i in 0..depth {
        leaf = b.declare_type(TypeKind::Class, format!("Derived{}", i), Some(leaf));
    }

    let drive = b.declare(DeclKind::Operation, "drive");
    b.param(drive, "c", Ty::Named(root));
    b.annotate(drive, Annotation::new("rel", ["c.step"]));

    let main = b.declare(DeclKind::Operation, "main");
    let c = b.param(main, "c", Ty::Named(leaf));
    let arg = b.param_ref(c);
    let body = b.invoke(None, drive, vec![arg]);
    b.set_body(main, body);
    b.finish()
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_checker_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("checker_throughput");
    let domain = NamedEffectDomain::new();

    for &count in &[10, 100, 1000] {
        let program = generate_many_calls(count);
        group.throughput(Throughput::Elements(program.expr_count() as u64));

        group.bench_with_input(BenchmarkId::new("many_calls", count), &program, |b, program| {
            b.iter(|| {
                let report = Analysis::new(black_box(program), &domain, AnalysisConfig::default()).run();
                black_box(report)
            })
        });
    }

    group.finish();
}

fn bench_relative_effects(c: &mut Criterion) {
    let mut group = c.benchmark_group("relative_effects");
    let domain = PurityDomain::new();

    for &depth in &[5, 20, 50] {
        let program = generate_forwarding_chain(depth);
        group.bench_with_input(
            BenchmarkId::new("forwarding_chain", depth),
            &program,
            |b, program| {
                b.iter(|| {
                    let report = Analysis::new(black_box(program), &domain, AnalysisConfig::default()).run();
                    black_box(report)
                })
            },
        );
    }

    for &depth in &[5, 20, 50] {
        let program = generate_deep_hierarchy(depth);
        group.bench_with_input(
            BenchmarkId::new("deep_hierarchy", depth),
            &program,
            |b, program| {
                b.iter(|| {
                    let report = Analysis::new(black_box(program), &domain, AnalysisConfig::default()).run();
                    black_box(report)
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// Criterion Main
// ============================================================================

criterion_group!(benches, bench_checker_throughput, bench_relative_effects);

criterion_main!(benches);

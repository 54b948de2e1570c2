use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use bet_ast::{Context, NodeId, SecurityKind, ValueId, VarKey};
use bet_engine::{rewrite, RewriteOptions, TreeCache};

/// `a*x1 + a*x2 + ... + a*xn`, left nested.
fn common_factor_sum(ctx: &mut Context, n: u64) -> NodeId {
    let mut acc: Option<NodeId> = None;
    for i in 0..n {
        let a = ctx.variable(VarKey(0), "a", Some(ValueId(0)), SecurityKind::SecretShared);
        let name = format!("x{}", i);
        let x = ctx.variable(VarKey(i + 1), &name, Some(ValueId(i as u32 + 1)), SecurityKind::Plaintext);
        let term = ctx.mul(a, x);
        acc = Some(match acc {
            Some(prev) => ctx.add(prev, term),
            None => term,
        });
    }
    acc.unwrap_or_else(|| ctx.int(0, Some(ValueId(0))))
}

/// `((s * p1) * p2) * ... * pn`
fn secure_mul_chain(ctx: &mut Context, n: u64) -> NodeId {
    let mut acc = ctx.variable(VarKey(0), "s", Some(ValueId(0)), SecurityKind::EncryptedCiphertext);
    for i in 0..n {
        let name = format!("p{}", i);
        let p = ctx.variable(VarKey(i + 1), &name, Some(ValueId(i as u32 + 1)), SecurityKind::Plaintext);
        acc = ctx.mul(acc, p);
    }
    acc
}

fn bench_factorization(c: &mut Criterion) {
    let mut group = c.benchmark_group("factorize");
    for n in [4u64, 16, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut ctx = Context::new();
                let root = common_factor_sum(&mut ctx, n);
                let report = rewrite(
                    &mut ctx,
                    root,
                    &TreeCache::new(),
                    &RewriteOptions::polynomial(),
                );
                black_box(report)
            })
        });
    }
    group.finish();
}

fn bench_reordering(c: &mut Criterion) {
    let mut group = c.benchmark_group("reorder");
    for n in [4u64, 16, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut ctx = Context::new();
                let root = secure_mul_chain(&mut ctx, n);
                let report = rewrite(
                    &mut ctx,
                    root,
                    &TreeCache::new(),
                    &RewriteOptions::default(),
                );
                black_box(report)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_factorization, bench_reordering);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use procalg_lts::{bisimulation_partition, Equivalence, Lts, TAU};

/// A ring of `n` states where every state steps to the next one by `a`, to
/// the one after by `tau`, and every third state also by `b` back to 0.
fn ring(n: usize) -> Lts {
    let mut lts = Lts::new(n, 0);
    let a = lts.add_label("a");
    let b = lts.add_label("b");
    for s in 0..n {
        lts.add_transition(s, a, (s + 1) % n);
        lts.add_transition(s, TAU, (s + 2) % n);
        if s % 3 == 0 {
            lts.add_transition(s, b, 0);
        }
    }
    lts
}

/// A binary tree of depth `depth` whose leaves all deadlock; every level
/// collapses to one class.
fn tree(depth: u32) -> Lts {
    let n = (1usize << (depth + 1)) - 1;
    let mut lts = Lts::new(n, 0);
    let a = lts.add_label("a");
    for s in 0..n / 2 {
        lts.add_transition(s, a, 2 * s + 1);
        lts.add_transition(s, TAU, 2 * s + 2);
    }
    lts
}

fn bench_ring(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring");
    for n in [100, 1_000, 10_000] {
        let lts = ring(n);
        for equivalence in [Equivalence::Strong, Equivalence::Branching] {
            group.bench_with_input(BenchmarkId::new(format!("{equivalence:?}"), n), &lts, |b, lts| {
                b.iter(|| bisimulation_partition(black_box(lts), equivalence))
            });
        }
    }
    group.finish();
}

fn bench_tree(c: &mut Criterion) {
    let lts = tree(14);
    c.bench_function("tree_branching", |b| {
        b.iter(|| bisimulation_partition(black_box(&lts), Equivalence::DivergencePreservingBranching))
    });
}

criterion_group!(benches, bench_ring, bench_tree);
criterion_main!(benches);

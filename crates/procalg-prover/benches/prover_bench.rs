use criterion::{black_box, criterion_group, criterion_main, Criterion};

use procalg_data::parse::{parse_data_expression, parse_specification, parse_variables};
use procalg_data::{InnermostRewriter, Sort, Variable};
use procalg_prover::{BddProver, EnumerationOracle, ProverOptions};

fn bench_pigeonhole(c: &mut Criterion) {
    let spec = parse_specification("", "empty").unwrap();
    let normal = spec.normalised().unwrap();
    let rewriter = InnermostRewriter::new(normal);
    let vars = parse_variables("a, b, c, d, e, f: Bool", normal, "vars").unwrap();
    // Three pigeons, two holes.
    let e = parse_data_expression(
        "(a || b) && (c || d) && (e || f) && !(a && c) && !(a && e) && !(c && e) \
         && !(b && d) && !(b && f) && !(d && f)",
        normal,
        &vars,
        "formula",
    )
    .unwrap();
    c.bench_function("prove_pigeonhole_3_2", |bench| {
        bench.iter(|| {
            let mut prover = BddProver::new(&rewriter, ProverOptions::default());
            prover.set_formula(black_box(e.clone()));
            prover.answer().unwrap()
        })
    });
}

fn bench_enumeration_oracle(c: &mut Criterion) {
    let spec = parse_specification("sort Digit = struct d0 | d1 | d2 | d3 | d4 | d5 | d6 | d7;", "digits.spec").unwrap();
    let normal = spec.normalised().unwrap();
    let rewriter = InnermostRewriter::new(normal);
    let vars: Vec<Variable> = ["x", "y"].iter().map(|n| Variable::new(n, Sort::basic("Digit"))).collect();
    let e = parse_data_expression("(x == d0 && y == d0) => x == y", normal, &vars, "formula").unwrap();
    c.bench_function("prove_with_enumeration_oracle", |bench| {
        bench.iter(|| {
            let oracle = EnumerationOracle::new(normal, &rewriter);
            let options = ProverOptions::default().with_path_elimination(true);
            let mut prover = BddProver::with_oracle(&rewriter, oracle, options);
            prover.set_formula(black_box(e.clone()));
            prover.answer().unwrap()
        })
    });
}

criterion_group!(benches, bench_pigeonhole, bench_enumeration_oracle);
criterion_main!(benches);

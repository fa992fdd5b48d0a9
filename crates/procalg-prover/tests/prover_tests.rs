use procalg_data::parse::{
    parse_data_expression, parse_data_expression_into, parse_specification, parse_variables, parse_variables_into,
};
use procalg_data::proptest_generators::{arb_bool_expr, arb_guarded_expr, bool_variables};
use procalg_data::standard::boolean::{bool_, not};
use procalg_data::standard::numbers::nat;
use procalg_data::{DataExpr, DataSpecification, InnermostRewriter, Rewriter, Sort, Substitution, Variable};
use procalg_prover::{
    BddProver, EnumerationOracle, GuardOrder, ProverOptions, SmtError, SmtOracle, Verdict,
};
use proptest::prelude::*;

fn verdict(spec: &DataSpecification, vars: &str, formula: &str, options: ProverOptions) -> Verdict {
    let mut spec = spec.clone();
    let vars = parse_variables_into(vars, &mut spec, "vars").unwrap();
    let e = parse_data_expression_into(formula, &mut spec, &vars, "formula").unwrap();
    let normal = spec.normalised().unwrap();
    let rewriter = InnermostRewriter::new(normal);
    let mut prover = BddProver::new(&rewriter, options);
    prover.set_formula(e);
    prover.answer().unwrap()
}

#[test]
fn induction_proves_snoc_is_never_empty() {
    let spec = DataSpecification::new();
    let vars = "xs: List(Nat), d: Nat";
    let plain = ProverOptions::default();
    let inductive = ProverOptions::default().with_induction(true);

    assert_eq!(verdict(&spec, vars, "(xs <| d) != []", plain), Verdict::Undetermined);
    assert_eq!(verdict(&spec, vars, "(xs <| d) != []", inductive.clone()), Verdict::Tautology);
    assert_eq!(verdict(&spec, vars, "(xs <| d) == []", inductive), Verdict::Contradiction);
}

/// Knows exactly one fact: `n < 2 && !(n < 3)` has no model.
struct Arithmetic {
    below_two: DataExpr,
    not_below_three: DataExpr,
    queries: usize,
}

impl SmtOracle for Arithmetic {
    fn is_satisfiable(&mut self, guards: &[DataExpr]) -> Result<bool, SmtError> {
        self.queries += 1;
        Ok(!(guards.contains(&self.below_two) && guards.contains(&self.not_below_three)))
    }
}

#[test]
fn path_elimination_uses_the_oracle() {
    let spec = DataSpecification::new();
    let normal = spec.normalised().unwrap();
    let rewriter = InnermostRewriter::new(normal);
    let vars = parse_variables("n: Nat", normal, "vars").unwrap();
    let parse = |s: &str| {
        let e = parse_data_expression(s, normal, &vars, "formula").unwrap();
        rewriter.rewrite_closed(&e).unwrap()
    };
    let formula = parse("n < 2 => n < 3");

    let mut oracle = Arithmetic {
        below_two: parse("n < 2"),
        not_below_three: not(parse("n < 3")),
        queries: 0,
    };
    {
        let mut prover = BddProver::with_oracle(&rewriter, &mut oracle, ProverOptions::default());
        prover.set_formula(formula.clone());
        assert_eq!(prover.answer().unwrap(), Verdict::Undetermined);
    }
    assert_eq!(oracle.queries, 0);

    let options = ProverOptions::default().with_path_elimination(true);
    let mut prover = BddProver::with_oracle(&rewriter, &mut oracle, options);
    prover.set_formula(formula);
    assert_eq!(prover.answer().unwrap(), Verdict::Tautology);
    drop(prover);
    assert!(oracle.queries > 0);
}

#[test]
fn enumeration_oracle_settles_finite_sorts() {
    let spec = parse_specification("sort Color = struct red | green | blue;", "color.spec").unwrap();
    let normal = spec.normalised().unwrap();
    let rewriter = InnermostRewriter::new(normal);
    let vars = [Variable::new("c", Sort::basic("Color"))];
    let formula = parse_data_expression("c == red => c != green", normal, &vars, "formula").unwrap();

    let mut prover = BddProver::new(&rewriter, ProverOptions::default());
    prover.set_formula(formula.clone());
    assert_eq!(prover.answer().unwrap(), Verdict::Undetermined);

    let oracle = EnumerationOracle::new(normal, &rewriter);
    let options = ProverOptions::default().with_path_elimination(true);
    let mut prover = BddProver::with_oracle(&rewriter, oracle, options);
    prover.set_formula(formula);
    assert_eq!(prover.answer().unwrap(), Verdict::Tautology);
    assert!(prover.witness().unwrap().is_none());
}

fn holds_everywhere(
    rewriter: &InnermostRewriter<'_>,
    e: &DataExpr,
    bools: &[Variable],
    n: Option<&Variable>,
) -> (bool, bool) {
    let mut all = true;
    let mut none = true;
    let values: Vec<u64> = if n.is_some() { (0..6).collect() } else { vec![0] };
    for row in 0..(1u32 << bools.len()) {
        for &k in &values {
            let mut sigma: Substitution = bools
                .iter()
                .enumerate()
                .map(|(i, v)| (v.clone(), bool_(row & (1 << i) != 0)))
                .collect();
            if let Some(n) = n {
                sigma.insert(n.clone(), nat(k));
            }
            let value = rewriter.rewrite(e, &sigma).unwrap().is_true();
            all &= value;
            none &= !value;
        }
    }
    (all, none)
}

fn decide(rewriter: &InnermostRewriter<'_>, e: &DataExpr, order: GuardOrder) -> Verdict {
    let mut prover = BddProver::new(rewriter, ProverOptions::default().with_guard_order(order));
    prover.set_formula(e.clone());
    prover.answer().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn propositional_verdicts_match_truth_tables(e in arb_bool_expr(bool_variables(3), 4)) {
        let spec = DataSpecification::new();
        let rewriter = InnermostRewriter::new(spec.normalised().unwrap());
        let (all, none) = holds_everywhere(&rewriter, &e, &bool_variables(3), None);
        let expected = if all {
            Verdict::Tautology
        } else if none {
            Verdict::Contradiction
        } else {
            Verdict::Undetermined
        };
        for order in [GuardOrder::SizeThenStructure, GuardOrder::Reverse] {
            prop_assert_eq!(decide(&rewriter, &e, order), expected);
        }
    }

    #[test]
    fn guarded_verdicts_are_sound_under_both_orders(e in arb_guarded_expr(bool_variables(2), 3)) {
        let spec = DataSpecification::new();
        let rewriter = InnermostRewriter::new(spec.normalised().unwrap());
        let n = Variable::new("n", Sort::nat());
        let (all, none) = holds_everywhere(&rewriter, &e, &bool_variables(2), Some(&n));
        for order in [GuardOrder::SizeThenStructure, GuardOrder::Reverse] {
            match decide(&rewriter, &e, order) {
                Verdict::Tautology => prop_assert!(all),
                Verdict::Contradiction => prop_assert!(none),
                Verdict::Undetermined => {}
            }
        }
    }
}

// Command handlers for: Prove, Smtlib

use std::path::Path;
use std::time::Duration;

use miette::IntoDiagnostic;
use serde::Serialize;
use tracing::info;

use procalg_data::parse::parse_data_expression_into;
use procalg_data::InnermostRewriter;
use procalg_prover::{
    BddProver, GuardOrder, NoOracle, ProcessOracle, ProverOptions, SmtLibBenchmark, SmtOracle, SolverKind, Verdict,
};

use super::helpers::{load_specification, parse_declarations, print_json};

pub(crate) struct ProveFlags {
    pub(crate) induction: bool,
    pub(crate) time_limit: Option<f64>,
    pub(crate) solver: Option<SolverKind>,
    pub(crate) reverse_guards: bool,
    pub(crate) json: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProveReport {
    pub(crate) formula: String,
    pub(crate) verdict: Verdict,
    pub(crate) bdd: String,
    /// Set when the time limit cut the diagram short.
    pub(crate) truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) witness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) counter_example: Option<String>,
}

pub(crate) fn prover_options(flags: &ProveFlags) -> miette::Result<ProverOptions> {
    let time_limit = flags
        .time_limit
        .map(Duration::try_from_secs_f64)
        .transpose()
        .into_diagnostic()?;
    let guard_order = if flags.reverse_guards {
        GuardOrder::Reverse
    } else {
        GuardOrder::default()
    };
    Ok(ProverOptions::default()
        .with_time_limit(time_limit)
        .with_induction(flags.induction)
        .with_path_elimination(flags.solver.is_some())
        .with_guard_order(guard_order))
}

pub(crate) fn run_prove_command(
    path: &Path,
    declarations: &[String],
    formula: &str,
    flags: ProveFlags,
) -> miette::Result<()> {
    let mut spec = load_specification(path)?;
    let variables = parse_declarations(declarations, &mut spec)?;
    let formula = parse_data_expression_into(formula, &mut spec, &variables, "formula")?;
    let normal = spec.normalised()?;
    let options = prover_options(&flags)?;

    let oracle: Box<dyn SmtOracle> = match flags.solver {
        Some(kind) => Box::new(ProcessOracle::new(kind)?),
        None => Box::new(NoOracle),
    };
    let rewriter = InnermostRewriter::new(normal);
    let mut prover = BddProver::with_oracle(&rewriter, oracle, options);
    prover.set_formula(formula.clone());

    let verdict = prover.answer()?;
    let bdd = prover.bdd()?;
    let truncated = prover.truncated();
    let (witness, counter_example) = if truncated {
        (None, None)
    } else {
        (prover.witness()?, prover.counter_example()?)
    };
    info!(?verdict, truncated, "prover finished");

    let report = ProveReport {
        formula: formula.to_string(),
        verdict,
        bdd: bdd.to_string(),
        truncated,
        witness: witness.map(|w| w.to_string()),
        counter_example: counter_example.map(|c| c.to_string()),
    };
    if flags.json {
        return print_json(&report);
    }
    print_prove_report(&report);
    Ok(())
}

fn print_prove_report(report: &ProveReport) {
    match report.verdict {
        Verdict::Tautology => println!("tautology"),
        Verdict::Contradiction => println!("contradiction"),
        Verdict::Undetermined => println!("undetermined"),
    }
    if report.truncated {
        println!("The time limit was reached; the diagram is incomplete.");
    }
    println!("BDD: {}", report.bdd);
    if let Some(witness) = &report.witness {
        println!("Witness: {witness}");
    }
    if let Some(counter_example) = &report.counter_example {
        println!("Counter-example: {counter_example}");
    }
}

pub(crate) fn run_smtlib_command(
    path: &Path,
    declarations: &[String],
    guards: &[String],
    script: bool,
) -> miette::Result<()> {
    let mut spec = load_specification(path)?;
    let variables = parse_declarations(declarations, &mut spec)?;
    let guards = guards
        .iter()
        .map(|g| parse_data_expression_into(g, &mut spec, &variables, "guard"))
        .collect::<Result<Vec<_>, _>>()?;
    let benchmark = SmtLibBenchmark::new(&guards)?;
    if script {
        print!("{}", benchmark.to_script());
    } else {
        print!("{}", benchmark.to_benchmark());
    }
    Ok(())
}

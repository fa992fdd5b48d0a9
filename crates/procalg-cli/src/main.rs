#![doc = include_str!("../README.md")]

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use procalg_lts::Equivalence;
use procalg_prover::SolverKind;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "procalg")]
#[command(about = "Bisimulation reduction, data specifications and a BDD prover for process algebra")]
#[command(version)]
pub(crate) struct Cli {
    /// Log debug output of the libraries (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    pub(crate) verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Equivalences accepted by `--equivalence`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum EquivalenceArg {
    Strong,
    Branching,
    DivergencePreservingBranching,
}

impl From<EquivalenceArg> for Equivalence {
    fn from(arg: EquivalenceArg) -> Self {
        match arg {
            EquivalenceArg::Strong => Equivalence::Strong,
            EquivalenceArg::Branching => Equivalence::Branching,
            EquivalenceArg::DivergencePreservingBranching => Equivalence::DivergencePreservingBranching,
        }
    }
}

/// Solvers accepted by `--smt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum SolverArg {
    Z3,
    Cvc5,
    None,
}

impl SolverArg {
    pub(crate) fn kind(self) -> Option<SolverKind> {
        match self {
            SolverArg::Z3 => Some(SolverKind::Z3),
            SolverArg::Cvc5 => Some(SolverKind::Cvc5),
            SolverArg::None => None,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Reduce an .aut file modulo a bisimulation equivalence
    #[command(display_order = 10)]
    Reduce {
        /// Path to the .aut file
        file: PathBuf,

        #[arg(long, short, value_enum, default_value = "strong")]
        equivalence: EquivalenceArg,

        /// Write the quotient here instead of to stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Decide whether the initial states of two .aut files are equivalent
    #[command(display_order = 11)]
    Compare {
        first: PathBuf,
        second: PathBuf,

        #[arg(long, short, value_enum, default_value = "strong")]
        equivalence: EquivalenceArg,
    },

    /// Print the size of an .aut file
    #[command(display_order = 12)]
    Info {
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Print the normalised form of a data specification
    #[command(display_order = 20)]
    Normalise {
        /// Path to the data specification
        spec: PathBuf,
    },

    /// Decide whether a sort is certainly finite
    #[command(display_order = 21)]
    Finite {
        spec: PathBuf,

        /// The sort, e.g. `List(Bool)`
        sort: String,
    },

    /// Enumerate solutions of a Boolean condition
    #[command(display_order = 22)]
    Enumerate {
        spec: PathBuf,

        /// Variables to solve for, e.g. `x, y: Nat`
        #[arg(long = "var", value_name = "DECL")]
        vars: Vec<String>,

        /// The condition
        condition: String,

        /// Stop after this many solutions
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Enumerate solutions of the negated condition
        #[arg(long)]
        invert: bool,
    },

    /// Decide whether a Boolean formula is a tautology or a contradiction
    #[command(display_order = 30)]
    Prove {
        spec: PathBuf,

        /// Free variables of the formula, e.g. `l: List(Nat)`
        #[arg(long = "var", value_name = "DECL")]
        vars: Vec<String>,

        formula: String,

        /// Try structural induction over list variables
        #[arg(long)]
        induction: bool,

        /// Time limit in seconds for building the diagram
        #[arg(long, value_name = "SECS")]
        time_limit: Option<f64>,

        /// Solver used to prune inconsistent paths
        #[arg(long, value_enum, default_value = "none")]
        smt: SolverArg,

        /// Branch on the largest guards first
        #[arg(long)]
        reverse_guards: bool,

        #[arg(long)]
        json: bool,
    },

    /// Print the SMT-LIB translation of a conjunction of guards
    #[command(display_order = 31)]
    Smtlib {
        spec: PathBuf,

        #[arg(long = "var", value_name = "DECL")]
        vars: Vec<String>,

        /// The conjuncts
        #[arg(required = true)]
        guards: Vec<String>,

        /// Print SMT-LIB 2 commands instead of the benchmark layout
        #[arg(long)]
        script: bool,
    },
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Reduce {
            file,
            equivalence,
            output,
        } => commands::lts::run_reduce_command(&file, equivalence.into(), output.as_deref()),
        Commands::Compare {
            first,
            second,
            equivalence,
        } => commands::lts::run_compare_command(&first, &second, equivalence.into()),
        Commands::Info { file, json } => commands::lts::run_info_command(&file, json),
        Commands::Normalise { spec } => commands::data::run_normalise_command(&spec),
        Commands::Finite { spec, sort } => commands::data::run_finite_command(&spec, &sort),
        Commands::Enumerate {
            spec,
            vars,
            condition,
            limit,
            invert,
        } => commands::data::run_enumerate_command(&spec, &vars, &condition, limit, invert),
        Commands::Prove {
            spec,
            vars,
            formula,
            induction,
            time_limit,
            smt,
            reverse_guards,
            json,
        } => commands::prove::run_prove_command(
            &spec,
            &vars,
            &formula,
            commands::prove::ProveFlags {
                induction,
                time_limit,
                solver: smt.kind(),
                reverse_guards,
                json,
            },
        ),
        Commands::Smtlib {
            spec,
            vars,
            guards,
            script,
        } => commands::prove::run_smtlib_command(&spec, &vars, &guards, script),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn equivalence_names_are_kebab_case() {
        let cli = Cli::try_parse_from(["procalg", "reduce", "x.aut", "-e", "divergence-preserving-branching"]).unwrap();
        match cli.command {
            Commands::Reduce { equivalence, .. } => {
                assert_eq!(Equivalence::from(equivalence), Equivalence::DivergencePreservingBranching)
            }
            _ => panic!("expected reduce"),
        }
    }

    #[test]
    fn prove_defaults_to_no_solver() {
        let cli = Cli::try_parse_from(["procalg", "prove", "s.spec", "true"]).unwrap();
        match cli.command {
            Commands::Prove { smt, time_limit, .. } => {
                assert_eq!(smt.kind(), None);
                assert_eq!(time_limit, None);
            }
            _ => panic!("expected prove"),
        }
    }
}

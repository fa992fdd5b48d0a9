#![doc = include_str!("../README.md")]

//! EQ-BDD prover for Boolean data expressions.
//!
//! [`BddProver`] builds the diagram, optionally prunes it with an
//! [`SmtOracle`] and optionally applies structural induction. The
//! [`smtlib`] module translates guard conjunctions to SMT-LIB, both the
//! legacy benchmark layout and SMT-LIB 2 commands for the solver processes
//! in [`backends`].

pub mod backends;
pub mod bdd;
pub mod error;
pub mod guard;
pub mod induction;
pub mod oracle;
pub mod path_eliminator;
pub mod smtlib;
pub mod terms;
pub mod timeout;

pub use backends::{ProcessOracle, SolverKind};
pub use bdd::{Answer, BddProver, ProverOptions, Verdict};
pub use error::{ProverError, SmtError};
pub use guard::GuardOrder;
pub use oracle::{EnumerationOracle, NoOracle, SmtOracle};
pub use smtlib::SmtLibBenchmark;

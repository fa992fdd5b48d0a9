#![allow(unused_assignments)]

use miette::Diagnostic;
use procalg_data::{EnumerationError, RewriteError};
use thiserror::Error;

/// Failures of an SMT oracle.
#[derive(Debug, Error, Diagnostic)]
pub enum SmtError {
    #[error("SMT solver `{command}` could not be started: {reason}")]
    #[diagnostic(
        code(procalg::smt::not_found),
        help("install the solver or put it on PATH, or run without an SMT oracle")
    )]
    NotFound { command: String, reason: String },

    #[error("SMT solver I/O error: {0}")]
    #[diagnostic(code(procalg::smt::io))]
    Io(#[from] std::io::Error),

    #[error("SMT solver answered `{answer}` to `{command}`")]
    #[diagnostic(code(procalg::smt::unexpected_answer))]
    UnexpectedAnswer { command: String, answer: String },

    #[error("Function {symbol} cannot be translated to the SMT-LIB format.")]
    #[diagnostic(code(procalg::smt::function_sort))]
    FunctionSort { symbol: String },

    #[error("Unable to handle the current clause ({clause}).")]
    #[diagnostic(code(procalg::smt::unsupported_clause))]
    UnsupportedClause { clause: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Enumeration(#[from] EnumerationError),
}

#[derive(Debug, Error, Diagnostic)]
pub enum ProverError {
    #[error("Cannot provide a {what}: the time limit interrupted the construction of the BDD.")]
    #[diagnostic(
        code(procalg::prover::time_limit),
        help("raise or remove the time limit")
    )]
    TimeLimitExceeded { what: &'static str },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Oracle(#[from] SmtError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Rewrite(#[from] RewriteError),
}

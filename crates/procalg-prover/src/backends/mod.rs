pub mod process;
pub mod smtlib_printer;

pub use process::{ProcessOracle, SolverKind};

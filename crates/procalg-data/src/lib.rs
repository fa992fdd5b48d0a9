#![doc = include_str!("../README.md")]

//! Sorts, data expressions and data specifications.
//!
//! This crate defines the hash-consed sort and term model, the generated
//! system-defined data types, the data specification with its lazily
//! normalised view, dependent-sort analysis, the finiteness oracle, the
//! rewriter interface with an innermost reference rewriter, the term
//! enumerator and the parser for the textual specification format.

pub mod dependent;
pub mod enumerate;
pub mod equation;
pub mod error;
pub mod finite;
pub mod intern;
pub mod normalise;
pub mod parse;
#[cfg(any(test, feature = "proptest"))]
pub mod proptest_generators;
pub mod rewrite;
pub mod sort;
pub mod spec;
pub mod standard;
pub mod term;

/// Identifier of a sort, function symbol or variable.
pub type Name = std::sync::Arc<str>;

pub use enumerate::{Enumerator, EnumeratorConfig, EnumeratorSolution};
pub use equation::DataEquation;
pub use error::{EnumerationError, ParseError, RewriteError, SpecificationError};
pub use rewrite::{InnermostRewriter, Rewriter, RewriterConfig};
pub use sort::{ContainerKind, Sort, SortKind, StructArgument, StructConstructor};
pub use spec::{Alias, DataSpecification, NormalisedSpecification};
pub use term::{Binder, DataExpr, FunctionSymbol, Substitution, TermKind, Variable};

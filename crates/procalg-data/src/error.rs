#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Errors detected while normalising a data specification.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum SpecificationError {
    #[error("Sort alias {alias} is defined in terms of itself.")]
    #[diagnostic(code(procalg::spec::circular_alias))]
    CircularAlias { alias: String },

    #[error("Sort alias {alias} is declared twice with different definitions ({first} and {second}).")]
    #[diagnostic(code(procalg::spec::duplicate_alias))]
    DuplicateAlias {
        alias: String,
        first: String,
        second: String,
    },

    #[error("The {kind} {symbol}: {sort} refers to the undeclared sort {missing}.")]
    #[diagnostic(
        code(procalg::spec::ill_typed_symbol),
        help("declare the sort in a `sort` section or fix the symbol's sort")
    )]
    IllTypedSymbol {
        kind: &'static str,
        symbol: String,
        sort: String,
        missing: String,
    },

    #[error("The equation {equation} is not well typed: {reason}.")]
    #[diagnostic(code(procalg::spec::ill_typed_equation))]
    IllTypedEquation { equation: String, reason: String },
}

/// Errors raised by a rewriter.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum RewriteError {
    #[error("Rewriting {term} did not terminate within {limit} steps.")]
    #[diagnostic(
        code(procalg::rewrite::step_limit),
        help("the equations may not be terminating; raise the step limit if they are")
    )]
    StepLimit { limit: usize, term: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Specification(#[from] SpecificationError),
}

/// Errors raised by the enumerator. Running out of solutions is not an
/// error; these report that enumeration cannot proceed at all.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum EnumerationError {
    #[error("Cannot enumerate elements of the function sort {sort} (variable {variable}).")]
    #[diagnostic(code(procalg::enumerate::function_sort))]
    FunctionSort { variable: String, sort: String },

    #[error("Cannot enumerate elements of the {kind} sort {sort} (variable {variable}).")]
    #[diagnostic(code(procalg::enumerate::container_sort))]
    ContainerSort {
        kind: &'static str,
        variable: String,
        sort: String,
    },

    #[error("Cannot enumerate elements of sort {sort} (variable {variable}): it has no constructors.")]
    #[diagnostic(code(procalg::enumerate::no_constructors))]
    NoConstructors { variable: String, sort: String },

    #[error(
        "The enumerator introduced more than {limit} variables while solving {condition}; \
         the free variables are {variables}."
    )]
    #[diagnostic(
        code(procalg::enumerate::too_many_variables),
        help("the condition probably has infinitely many solutions")
    )]
    TooManyVariables {
        limit: usize,
        variables: String,
        condition: String,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Specification(#[from] SpecificationError),
}

/// Syntax and typing errors of the textual data specification format.
#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("Syntax error: {message}")]
    #[diagnostic(code(procalg::parse::syntax))]
    Syntax {
        message: String,
        #[label("here")]
        span: miette::SourceSpan,
        #[source_code]
        src: miette::NamedSource<String>,
    },

    #[error("Type error: {message}")]
    #[diagnostic(code(procalg::parse::type_error))]
    Type {
        message: String,
        #[label("in this expression")]
        span: miette::SourceSpan,
        #[source_code]
        src: miette::NamedSource<String>,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Specification(#[from] SpecificationError),
}

impl ParseError {
    pub fn syntax(message: impl Into<String>, start: usize, end: usize, source: &str, filename: &str) -> Self {
        ParseError::Syntax {
            message: message.into(),
            span: (start, end.saturating_sub(start).max(1)).into(),
            src: miette::NamedSource::new(filename, source.to_string()),
        }
    }

    pub fn type_error(
        message: impl Into<String>,
        start: usize,
        end: usize,
        source: &str,
        filename: &str,
    ) -> Self {
        ParseError::Type {
            message: message.into(),
            span: (start, end.saturating_sub(start).max(1)).into(),
            src: miette::NamedSource::new(filename, source.to_string()),
        }
    }
}

#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

use crate::lts::StateId;

#[derive(Debug, Error, Diagnostic)]
pub enum LtsError {
    #[error("Cannot access {path}: {source}")]
    #[diagnostic(code(procalg::lts::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed .aut file: {message}")]
    #[diagnostic(code(procalg::lts::malformed))]
    Malformed {
        message: String,
        #[label("here")]
        span: miette::SourceSpan,
        #[source_code]
        src: miette::NamedSource<String>,
    },

    #[error("State {state} does not exist; the LTS has {num_states} states.")]
    #[diagnostic(code(procalg::lts::state_out_of_range))]
    StateOutOfRange { state: StateId, num_states: usize },
}

impl LtsError {
    pub fn malformed(message: impl Into<String>, start: usize, end: usize, source: &str, filename: &str) -> Self {
        LtsError::Malformed {
            message: message.into(),
            span: (start, end.saturating_sub(start).max(1)).into(),
            src: miette::NamedSource::new(filename, source.to_string()),
        }
    }
}

// Shared plumbing for the command handlers: reading inputs, parsing
// variable declarations and printing reports.

use std::path::Path;

use miette::IntoDiagnostic;
use serde::Serialize;

use procalg_data::parse::{parse_specification, parse_variables_into};
use procalg_data::{DataSpecification, Variable};

pub(crate) fn read_source(path: &Path) -> miette::Result<String> {
    std::fs::read_to_string(path)
        .into_diagnostic()
        .map_err(|e| e.wrap_err(format!("Cannot read {}", path.display())))
}

pub(crate) fn load_specification(path: &Path) -> miette::Result<DataSpecification> {
    let source = read_source(path)?;
    Ok(parse_specification(&source, &path.display().to_string())?)
}

/// Parse every `--var` declaration, importing the declared sorts into
/// `spec`.
pub(crate) fn parse_declarations(
    declarations: &[String],
    spec: &mut DataSpecification,
) -> miette::Result<Vec<Variable>> {
    let mut variables = Vec::new();
    for declaration in declarations {
        variables.extend(parse_variables_into(declaration, spec, "--var")?);
    }
    Ok(variables)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> miette::Result<()> {
    let text = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{text}");
    Ok(())
}

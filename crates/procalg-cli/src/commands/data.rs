// Command handlers for: Normalise, Finite, Enumerate

use std::path::Path;

use procalg_data::parse::{parse_data_expression_into, parse_sort_into};
use procalg_data::{Enumerator, InnermostRewriter};

use super::helpers::{load_specification, parse_declarations};

pub(crate) fn run_normalise_command(path: &Path) -> miette::Result<()> {
    let spec = load_specification(path)?;
    let normal = spec.normalised()?;
    print!("{normal}");
    Ok(())
}

pub(crate) fn run_finite_command(path: &Path, sort: &str) -> miette::Result<()> {
    let mut spec = load_specification(path)?;
    let sort = parse_sort_into(sort, &mut spec, "sort")?;
    let normal = spec.normalised()?;
    if normal.is_certainly_finite(&sort) {
        println!("{sort} is finite");
    } else {
        println!("{sort} is not certainly finite");
    }
    Ok(())
}

pub(crate) fn run_enumerate_command(
    path: &Path,
    declarations: &[String],
    condition: &str,
    limit: usize,
    invert: bool,
) -> miette::Result<()> {
    let mut spec = load_specification(path)?;
    let variables = parse_declarations(declarations, &mut spec)?;
    let condition = parse_data_expression_into(condition, &mut spec, &variables, "condition")?;
    let normal = spec.normalised()?;

    let rewriter = InnermostRewriter::new(normal);
    let mut enumerator = Enumerator::new(normal, &rewriter);
    enumerator.reset(&variables, &condition, invert, false)?;
    let mut found = 0;
    for solution in enumerator.solutions().take(limit) {
        let solution = solution?;
        let assignments: Vec<String> = solution
            .assignments
            .iter()
            .map(|(v, value)| format!("{} := {value}", v.name()))
            .collect();
        if solution.condition.is_true() {
            println!("[{}]", assignments.join(", "));
        } else {
            println!("[{}] provided {}", assignments.join(", "), solution.condition);
        }
        found += 1;
    }
    if found == 0 {
        println!("no solutions");
    }
    Ok(())
}

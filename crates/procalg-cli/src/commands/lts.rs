// Command handlers for: Reduce, Compare, Info

use std::path::Path;

use tracing::info;

use procalg_lts::{bisimulation_compare, bisimulation_reduce, load_aut, save_aut, to_aut_string, Equivalence};

use super::helpers::print_json;

pub(crate) fn run_reduce_command(file: &Path, equivalence: Equivalence, output: Option<&Path>) -> miette::Result<()> {
    let mut lts = load_aut(file)?;
    let before = lts.summary();
    bisimulation_reduce(&mut lts, equivalence);
    info!(
        states = before.states,
        transitions = before.transitions,
        reduced_states = lts.num_states(),
        reduced_transitions = lts.num_transitions(),
        "reduced modulo {equivalence}"
    );
    match output {
        Some(path) => save_aut(&lts, path)?,
        None => print!("{}", to_aut_string(&lts)),
    }
    Ok(())
}

pub(crate) fn run_compare_command(first: &Path, second: &Path, equivalence: Equivalence) -> miette::Result<()> {
    let lts1 = load_aut(first)?;
    let lts2 = load_aut(second)?;
    if bisimulation_compare(&lts1, &lts2, equivalence) {
        println!("The initial states are equivalent modulo {equivalence}.");
    } else {
        println!("The initial states are not equivalent modulo {equivalence}.");
    }
    Ok(())
}

pub(crate) fn run_info_command(file: &Path, json: bool) -> miette::Result<()> {
    let lts = load_aut(file)?;
    let summary = lts.summary();
    if json {
        return print_json(&summary);
    }
    println!("Number of states: {}", summary.states);
    println!("Number of transitions: {}", summary.transitions);
    println!("Number of action labels: {}", summary.labels);
    println!("Number of tau transitions: {}", summary.tau_transitions);
    println!("Initial state: {}", summary.initial_state);
    Ok(())
}

//! Contraction of strongly connected components of tau transitions.
//!
//! States on a tau cycle are branching bisimilar, so the partitioner can
//! assume an LTS without tau cycles once they are contracted.

use tracing::debug;

use crate::lts::{Lts, StateId, Transition, TAU};

/// Tarjan's algorithm restricted to tau transitions, without recursion.
/// Returns the component of every state; components are numbered in the
/// order they are completed.
pub fn tau_scc_partition(lts: &Lts) -> Vec<usize> {
    let n = lts.num_states();
    let mut adjacency_begin = vec![0usize; n + 1];
    for t in lts.transitions().iter().filter(|t| t.label == TAU) {
        adjacency_begin[t.from + 1] += 1;
    }
    for s in 0..n {
        adjacency_begin[s + 1] += adjacency_begin[s];
    }
    let mut fill = adjacency_begin.clone();
    let mut adjacency = vec![0; adjacency_begin[n]];
    for t in lts.transitions().iter().filter(|t| t.label == TAU) {
        adjacency[fill[t.from]] = t.to;
        fill[t.from] += 1;
    }

    const UNVISITED: usize = usize::MAX;
    let mut index = vec![UNVISITED; n];
    let mut lowlink = vec![0; n];
    let mut on_stack = vec![false; n];
    let mut component = vec![UNVISITED; n];
    let mut stack = Vec::new();
    // (state, next successor to look at)
    let mut work: Vec<(StateId, usize)> = Vec::new();
    let mut next_index = 0;
    let mut next_component = 0;

    for root in 0..n {
        if index[root] != UNVISITED {
            continue;
        }
        work.push((root, adjacency_begin[root]));
        index[root] = next_index;
        lowlink[root] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root] = true;

        while let Some(top) = work.last_mut() {
            let v = top.0;
            if top.1 < adjacency_begin[v + 1] {
                let w = adjacency[top.1];
                top.1 += 1;
                if index[w] == UNVISITED {
                    index[w] = next_index;
                    lowlink[w] = next_index;
                    next_index += 1;
                    stack.push(w);
                    on_stack[w] = true;
                    work.push((w, adjacency_begin[w]));
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(index[w]);
                }
                continue;
            }

            work.pop();
            if let Some(&(parent, _)) = work.last() {
                lowlink[parent] = lowlink[parent].min(lowlink[v]);
            }
            if lowlink[v] == index[v] {
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    component[w] = next_component;
                    if w == v {
                        break;
                    }
                }
                next_component += 1;
            }
        }
    }
    component
}

/// Replace every tau-SCC by a single state. Tau transitions inside a
/// component disappear, except that with `preserve_divergence` a
/// component that had an internal tau transition keeps a tau self-loop.
/// Returns the component of every original state.
pub fn contract_tau_sccs(lts: &mut Lts, preserve_divergence: bool) -> Vec<usize> {
    let component = tau_scc_partition(lts);
    let num_components = component.iter().map(|&c| c + 1).max().unwrap_or(0);

    let mut transitions: Vec<Transition> = lts
        .transitions()
        .iter()
        .filter_map(|t| {
            let (from, to) = (component[t.from], component[t.to]);
            if t.label == TAU && from == to && !preserve_divergence {
                None
            } else {
                Some(Transition::new(from, t.label, to))
            }
        })
        .collect();
    transitions.sort_unstable();
    transitions.dedup();

    debug!(
        states = lts.num_states(),
        components = num_components,
        "contracted tau cycles"
    );
    let initial = component.get(lts.initial_state()).copied().unwrap_or(0);
    lts.clear_transitions();
    lts.set_num_states(num_components);
    lts.set_initial_state(initial);
    for t in transitions {
        lts.add_transition(t.from, t.label, t.to);
    }
    component
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle_lts() -> Lts {
        // 0 -tau-> 1 -tau-> 2 -tau-> 0, 2 -a-> 3, 3 -tau-> 3
        let mut lts = Lts::new(4, 1);
        let a = lts.add_label("a");
        lts.add_transition(0, TAU, 1);
        lts.add_transition(1, TAU, 2);
        lts.add_transition(2, TAU, 0);
        lts.add_transition(2, a, 3);
        lts.add_transition(3, TAU, 3);
        lts
    }

    #[test]
    fn tau_cycle_is_one_component() {
        let components = tau_scc_partition(&cycle_lts());
        assert_eq!(components[0], components[1]);
        assert_eq!(components[1], components[2]);
        assert_ne!(components[0], components[3]);
    }

    #[test]
    fn visible_cycles_are_not_contracted() {
        let mut lts = Lts::new(2, 0);
        let a = lts.add_label("a");
        lts.add_transition(0, a, 1);
        lts.add_transition(1, a, 0);
        let components = tau_scc_partition(&lts);
        assert_ne!(components[0], components[1]);
    }

    #[test]
    fn contraction_drops_internal_taus() {
        let mut lts = cycle_lts();
        let components = contract_tau_sccs(&mut lts, false);
        assert_eq!(lts.num_states(), 2);
        assert_eq!(lts.initial_state(), components[1]);
        let a = lts.label_id("a").unwrap();
        assert_eq!(lts.transitions(), &[Transition::new(components[0], a, components[3])]);
    }

    #[test]
    fn divergence_leaves_a_self_loop() {
        let mut lts = cycle_lts();
        let components = contract_tau_sccs(&mut lts, true);
        let (c, d) = (components[0], components[3]);
        assert!(lts.transitions().contains(&Transition::new(c, TAU, c)));
        assert!(lts.transitions().contains(&Transition::new(d, TAU, d)));
        assert_eq!(lts.num_transitions(), 3);
    }

    #[test]
    fn long_tau_chains_do_not_recurse() {
        let n = 200_000;
        let mut lts = Lts::new(n, 0);
        for s in 0..n - 1 {
            lts.add_transition(s, TAU, s + 1);
        }
        lts.add_transition(n - 1, TAU, 0);
        let components = tau_scc_partition(&lts);
        assert!(components.iter().all(|&c| c == components[0]));
    }
}

//! Signature refinement: a slow but obviously correct reference for the
//! partitioner. Every round computes a signature per state from the
//! current partition and splits classes whose states disagree, until the
//! number of classes stops growing.

use std::collections::{BTreeSet, HashMap};

use crate::bisim::Equivalence;
use crate::lts::{LabelId, Lts, StateId, TAU};

/// Marker pair added to the signature of divergent states.
const DIVERGENT: (LabelId, usize) = (usize::MAX, usize::MAX);

/// Class of every state of `lts` modulo `equivalence`, numbered in order of
/// first occurrence.
pub fn partition(lts: &Lts, equivalence: Equivalence) -> Vec<usize> {
    let n = lts.num_states();
    let mut successors: Vec<Vec<(LabelId, StateId)>> = vec![Vec::new(); n];
    for t in lts.transitions() {
        successors[t.from].push((t.label, t.to));
    }

    let mut class = vec![0usize; n];
    let mut num_classes = usize::from(n > 0);
    loop {
        let signatures: Vec<(usize, BTreeSet<(LabelId, usize)>)> = (0..n)
            .map(|s| {
                let signature = match equivalence {
                    Equivalence::Strong => successors[s].iter().map(|&(a, t)| (a, class[t])).collect(),
                    Equivalence::Branching => branching_signature(s, &successors, &class),
                    Equivalence::DivergencePreservingBranching => {
                        let mut signature = branching_signature(s, &successors, &class);
                        if diverges_within_class(s, &successors, &class) {
                            signature.insert(DIVERGENT);
                        }
                        signature
                    }
                };
                (class[s], signature)
            })
            .collect();

        let mut numbering: HashMap<&(usize, BTreeSet<(LabelId, usize)>), usize> = HashMap::new();
        let refined: Vec<usize> = signatures
            .iter()
            .map(|signature| {
                let next = numbering.len();
                *numbering.entry(signature).or_insert(next)
            })
            .collect();
        let refined_count = numbering.len();
        class = refined;
        if refined_count == num_classes {
            return class;
        }
        num_classes = refined_count;
    }
}

/// States reachable from `s` by tau steps that stay in the class of `s`.
fn inert_closure(s: StateId, successors: &[Vec<(LabelId, StateId)>], class: &[usize]) -> Vec<StateId> {
    let mut seen = BTreeSet::from([s]);
    let mut stack = vec![s];
    while let Some(u) = stack.pop() {
        for &(a, v) in &successors[u] {
            if a == TAU && class[v] == class[s] && seen.insert(v) {
                stack.push(v);
            }
        }
    }
    seen.into_iter().collect()
}

/// Steps `(a, class)` possible after inert taus, except inert taus
/// themselves.
fn branching_signature(
    s: StateId,
    successors: &[Vec<(LabelId, StateId)>],
    class: &[usize],
) -> BTreeSet<(LabelId, usize)> {
    let mut signature = BTreeSet::new();
    for u in inert_closure(s, successors, class) {
        for &(a, v) in &successors[u] {
            if !(a == TAU && class[v] == class[s]) {
                signature.insert((a, class[v]));
            }
        }
    }
    signature
}

/// Whether `s` has an infinite tau path within its class, i.e. reaches an
/// inert tau cycle.
fn diverges_within_class(s: StateId, successors: &[Vec<(LabelId, StateId)>], class: &[usize]) -> bool {
    // peel off states all of whose inert steps lead to peeled states
    let mut remaining: BTreeSet<StateId> = inert_closure(s, successors, class).into_iter().collect();
    loop {
        let peel: Vec<StateId> = remaining
            .iter()
            .copied()
            .filter(|&u| {
                !successors[u]
                    .iter()
                    .any(|&(a, v)| a == TAU && class[v] == class[s] && remaining.contains(&v))
            })
            .collect();
        if peel.is_empty() {
            return !remaining.is_empty();
        }
        for u in peel {
            remaining.remove(&u);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bisim::bisimulation_partition;
    use crate::proptest_generators::{arb_lts, arb_visible_lts};
    use proptest::prelude::*;

    const EQUIVALENCES: [Equivalence; 3] = [
        Equivalence::Strong,
        Equivalence::Branching,
        Equivalence::DivergencePreservingBranching,
    ];

    fn same_class_relation(classes: &[usize]) -> Vec<Vec<bool>> {
        classes
            .iter()
            .map(|&c| classes.iter().map(|&d| c == d).collect())
            .collect()
    }

    #[test]
    fn strong_distinguishes_tau_steps() {
        let mut lts = Lts::new(3, 0);
        let a = lts.add_label("a");
        lts.add_transition(0, TAU, 1);
        lts.add_transition(1, a, 2);
        lts.add_transition(0, a, 2);
        let strong = partition(&lts, Equivalence::Strong);
        assert_eq!(strong.iter().collect::<BTreeSet<_>>().len(), 3);
        let branching = partition(&lts, Equivalence::Branching);
        assert_eq!(branching[0], branching[1]);
        assert_ne!(branching[1], branching[2]);
    }

    #[test]
    fn tau_loops_diverge() {
        let mut lts = Lts::new(3, 0);
        lts.add_transition(0, TAU, 1);
        lts.add_transition(1, TAU, 0);
        let branching = partition(&lts, Equivalence::Branching);
        assert!(branching.iter().all(|&c| c == branching[0]));
        let divergent = partition(&lts, Equivalence::DivergencePreservingBranching);
        assert_eq!(divergent[0], divergent[1]);
        assert_ne!(divergent[0], divergent[2]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn partitioner_agrees_with_signature_refinement(lts in arb_lts(8, 16)) {
            for equivalence in EQUIVALENCES {
                let fast = bisimulation_partition(&lts, equivalence);
                let slow = partition(&lts, equivalence);
                prop_assert_eq!(same_class_relation(&fast), same_class_relation(&slow), "{}", equivalence);
            }
        }

        #[test]
        fn branching_coincides_with_strong_without_taus(lts in arb_visible_lts(8, 16)) {
            let strong = partition(&lts, Equivalence::Strong);
            let branching = partition(&lts, Equivalence::Branching);
            prop_assert_eq!(same_class_relation(&strong), same_class_relation(&branching));
            let fast = bisimulation_partition(&lts, Equivalence::Branching);
            prop_assert_eq!(same_class_relation(&fast), same_class_relation(&strong));
        }
    }
}

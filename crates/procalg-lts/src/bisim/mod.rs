//! Strong, branching and divergence-preserving branching bisimulation in
//! O(m log n).
//!
//! The LTS is translated into a Kripke structure (see [`init`]) and then
//! refined with the algorithm of Groote, Jansen, Keiren and Wijs (2017):
//! blocks are split against small splitter blocks, each split searching
//! the red and blue halves in lock-step so that only the smaller half is
//! paid for.

#[cfg(debug_assertions)]
mod consistency;
mod init;
mod partition;
mod refine;
mod transitions;

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::lts::{Lts, StateId};
use crate::scc::contract_tau_sccs;

use init::ExtraStates;
use partition::Refinement;

/// The equivalence to reduce or compare modulo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Equivalence {
    Strong,
    Branching,
    DivergencePreservingBranching,
}

impl fmt::Display for Equivalence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Equivalence::Strong => "strong bisimulation",
            Equivalence::Branching => "branching bisimulation",
            Equivalence::DivergencePreservingBranching => "divergence-preserving branching bisimulation",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefinementOptions {
    /// Treat tau steps inside a block as invisible.
    pub branching: bool,
    /// Distinguish states that can diverge within their class. Only
    /// meaningful together with `branching`.
    pub preserve_divergence: bool,
}

impl RefinementOptions {
    pub fn with_branching(mut self, branching: bool) -> Self {
        self.branching = branching;
        self
    }

    pub fn with_preserve_divergence(mut self, preserve_divergence: bool) -> Self {
        self.preserve_divergence = preserve_divergence;
        self
    }
}

impl From<Equivalence> for RefinementOptions {
    fn from(equivalence: Equivalence) -> Self {
        let options = RefinementOptions::default();
        match equivalence {
            Equivalence::Strong => options,
            Equivalence::Branching => options.with_branching(true),
            Equivalence::DivergencePreservingBranching => {
                options.with_branching(true).with_preserve_divergence(true)
            }
        }
    }
}

/// The stable partition of an LTS.
pub struct BisimPartitioner {
    refinement: Refinement,
    extra_states: ExtraStates,
    /// State of the (contracted) LTS the refinement ran on, per state of
    /// the input LTS.
    representative: Vec<StateId>,
    /// States of the contracted LTS; the Kripke states after them are
    /// extra states.
    kripke_lts_states: usize,
    options: RefinementOptions,
}

impl BisimPartitioner {
    /// Compute the stable partition of `lts`. In branching modes the tau
    /// cycles of a private copy are contracted first.
    pub fn new(lts: &Lts, options: RefinementOptions) -> Self {
        let options = RefinementOptions {
            preserve_divergence: options.branching && options.preserve_divergence,
            ..options
        };
        let (subject, representative) = if options.branching {
            let mut contracted = lts.clone();
            let components = contract_tau_sccs(&mut contracted, options.preserve_divergence);
            (Cow::Owned(contracted), components)
        } else {
            (Cow::Borrowed(lts), (0..lts.num_states()).collect())
        };

        let (mut refinement, extra_states) =
            Refinement::from_lts(&subject, options.branching, options.preserve_divergence);
        refinement.refine_until_stable();
        #[cfg(debug_assertions)]
        refinement.check_consistency();

        info!(
            states = lts.num_states(),
            transitions = lts.num_transitions(),
            classes = refinement.nr_of_blocks,
            "partition is stable"
        );
        Self {
            refinement,
            extra_states,
            representative,
            kripke_lts_states: subject.num_states(),
            options,
        }
    }

    pub fn num_eq_classes(&self) -> usize {
        self.refinement.nr_of_blocks
    }

    /// Class of `state` of the input LTS, in `0..num_eq_classes()`.
    pub fn get_eq_class(&self, state: StateId) -> usize {
        self.refinement
            .seqnr_of(self.representative[state])
            .expect("every state of the LTS lies in a numbered block")
    }

    pub fn in_same_class(&self, s: StateId, t: StateId) -> bool {
        self.get_eq_class(s) == self.get_eq_class(t)
    }

    /// Class of every state of the input LTS.
    pub fn classes(&self) -> Vec<usize> {
        (0..self.representative.len()).map(|s| self.get_eq_class(s)).collect()
    }

    /// Replace `lts`, which must be the LTS the partition was computed
    /// for, by its quotient: one state per class, one transition per
    /// class-level step, without inert taus.
    pub fn replace_transition_system(self, lts: &mut Lts) {
        let mut transitions = self.refinement.quotient_transitions(
            &self.extra_states,
            self.kripke_lts_states,
            self.options.preserve_divergence,
        );
        transitions.sort_unstable();
        transitions.dedup();
        let initial = self.get_eq_class(lts.initial_state());
        debug!(
            states = self.num_eq_classes(),
            transitions = transitions.len(),
            "replacing transition system by its quotient"
        );
        lts.clear_transitions();
        lts.set_num_states(self.num_eq_classes());
        lts.set_initial_state(initial);
        for t in transitions {
            lts.add_transition(t.from, t.label, t.to);
        }
    }
}

/// Reduce `lts` modulo `equivalence` in place.
pub fn bisimulation_reduce(lts: &mut Lts, equivalence: Equivalence) {
    let partitioner = BisimPartitioner::new(lts, equivalence.into());
    partitioner.replace_transition_system(lts);
}

/// Whether the initial states of `lts1` and `lts2` are equivalent. The two
/// are compared as one disjoint union; labels match by name.
pub fn bisimulation_compare(lts1: &Lts, lts2: &Lts, equivalence: Equivalence) -> bool {
    let mut union = lts1.clone();
    let initial2 = union.merge(lts2);
    let partitioner = BisimPartitioner::new(&union, equivalence.into());
    partitioner.in_same_class(lts1.initial_state(), initial2)
}

/// Class of every state of `lts` modulo `equivalence`.
pub fn bisimulation_partition(lts: &Lts, equivalence: Equivalence) -> Vec<usize> {
    BisimPartitioner::new(lts, equivalence.into()).classes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lts::{Transition, TAU};
    use crate::proptest_generators::arb_lts;
    use proptest::prelude::*;

    #[test]
    fn options_follow_the_equivalence() {
        let strong = RefinementOptions::from(Equivalence::Strong);
        assert!(!strong.branching && !strong.preserve_divergence);
        let dpb = RefinementOptions::from(Equivalence::DivergencePreservingBranching);
        assert!(dpb.branching && dpb.preserve_divergence);
    }

    #[test]
    fn tau_step_to_an_equivalent_state_is_inert() {
        // 0 -tau-> 1 -a-> 2 and 0 -a-> 2: 0 and 1 are branching bisimilar
        let mut lts = Lts::new(3, 0);
        let a = lts.add_label("a");
        lts.add_transition(0, TAU, 1);
        lts.add_transition(1, a, 2);
        lts.add_transition(0, a, 2);

        let branching = BisimPartitioner::new(&lts, Equivalence::Branching.into());
        assert_eq!(branching.num_eq_classes(), 2);
        assert!(branching.in_same_class(0, 1));
        assert!(!branching.in_same_class(1, 2));

        let strong = BisimPartitioner::new(&lts, Equivalence::Strong.into());
        assert_eq!(strong.num_eq_classes(), 3);
    }

    #[test]
    fn quotient_keeps_visible_steps() {
        let mut lts = Lts::new(3, 0);
        let a = lts.add_label("a");
        lts.add_transition(0, TAU, 1);
        lts.add_transition(1, a, 2);
        lts.add_transition(0, a, 2);
        bisimulation_reduce(&mut lts, Equivalence::Branching);
        assert_eq!(lts.num_states(), 2);
        let init = lts.initial_state();
        assert_eq!(lts.transitions().len(), 1);
        assert_eq!(lts.transitions()[0].from, init);
        assert_eq!(lts.transitions()[0].label, a);
        assert_ne!(lts.transitions()[0].to, init);
    }

    #[test]
    fn divergence_is_observed_only_when_preserved() {
        // 0 -tau-> 0, 0 -a-> 1 versus 2 -a-> 3
        let mut lts = Lts::new(4, 0);
        let a = lts.add_label("a");
        lts.add_transition(0, TAU, 0);
        lts.add_transition(0, a, 1);
        lts.add_transition(2, a, 3);
        let plain = bisimulation_partition(&lts, Equivalence::Branching);
        assert_eq!(plain[0], plain[2]);
        let divergent = bisimulation_partition(&lts, Equivalence::DivergencePreservingBranching);
        assert_ne!(divergent[0], divergent[2]);

        let mut reduced = lts.clone();
        bisimulation_reduce(&mut reduced, Equivalence::DivergencePreservingBranching);
        let init = reduced.initial_state();
        assert!(reduced.transitions().contains(&Transition::new(init, TAU, init)));
    }

    #[test]
    #[should_panic(expected = "numbered block")]
    fn unnumbered_block_is_not_reported_as_class_zero() {
        let mut lts = Lts::new(2, 0);
        let a = lts.add_label("a");
        lts.add_transition(0, a, 1);
        let mut partitioner = BisimPartitioner::new(&lts, Equivalence::Strong.into());
        let block = partitioner.refinement.block_of(1);
        partitioner.refinement.blocks[block].seqnr = None;
        partitioner.get_eq_class(1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn reduction_is_idempotent(lts in arb_lts(8, 16)) {
            for equivalence in [Equivalence::Strong, Equivalence::Branching, Equivalence::DivergencePreservingBranching] {
                let mut once = lts.clone();
                bisimulation_reduce(&mut once, equivalence);
                let mut twice = once.clone();
                bisimulation_reduce(&mut twice, equivalence);
                prop_assert_eq!(once.num_states(), twice.num_states());
                prop_assert_eq!(once.num_transitions(), twice.num_transitions());
            }
        }

        #[test]
        fn quotient_is_equivalent_to_its_input(lts in arb_lts(8, 16)) {
            for equivalence in [Equivalence::Strong, Equivalence::Branching, Equivalence::DivergencePreservingBranching] {
                let mut reduced = lts.clone();
                bisimulation_reduce(&mut reduced, equivalence);
                prop_assert!(bisimulation_compare(&lts, &reduced, equivalence));
            }
        }
    }
}

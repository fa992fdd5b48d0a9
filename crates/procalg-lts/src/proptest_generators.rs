//! Proptest strategies for small labelled transition systems.

use proptest::prelude::*;

use crate::lts::{Lts, TAU};

/// Strategy for an LTS with `1..=max_states` states over the labels
/// `tau`, `a` and `b`.
///
/// About a third of the generated transitions are tau steps, so tau cycles
/// and divergent states are common.
pub fn arb_lts(max_states: usize, max_transitions: usize) -> impl Strategy<Value = Lts> {
    (1..=max_states)
        .prop_flat_map(move |n| {
            let transition = (0..n, 0usize..3, 0..n);
            (Just(n), 0..n, proptest::collection::vec(transition, 0..=max_transitions))
        })
        .prop_map(|(n, initial, transitions)| {
            let mut lts = Lts::new(n, initial);
            let labels = [TAU, lts.add_label("a"), lts.add_label("b")];
            for (from, label, to) in transitions {
                lts.add_transition(from, labels[label], to);
            }
            lts
        })
}

/// Strategy for an LTS without tau transitions.
pub fn arb_visible_lts(max_states: usize, max_transitions: usize) -> impl Strategy<Value = Lts> {
    arb_lts(max_states, max_transitions).prop_map(|lts| {
        let mut visible = Lts::new(lts.num_states(), lts.initial_state());
        for t in lts.transitions().iter().filter(|t| t.label != TAU) {
            let label = visible.add_label(lts.label_name(t.label));
            visible.add_transition(t.from, label, t.to);
        }
        visible
    })
}

//! Translation between an LTS and the Kripke structure the refinement works
//! on, and back to the quotient.
//!
//! Every non-inert transition `s -a-> t` is split into `s -> (a, t) -> t`
//! through an extra state `(a, t)`, so that the refinement only has to deal
//! with unlabelled transitions. Extra states with the same label start out
//! in one block; the LTS states start in block 0. Inert transitions (tau
//! steps in branching mode, except divergent self-loops) stay direct.

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use super::partition::Refinement;
use super::transitions::PredEntry;
use crate::lts::{LabelId, Lts, StateId, Transition, TAU};

/// The extra Kripke states, numbered after the states of the LTS.
pub(super) type ExtraStates = IndexSet<(LabelId, StateId)>;

fn goes_through_extra_state(t: &Transition, branching: bool, preserve_divergence: bool) -> bool {
    !branching || t.label != TAU || (preserve_divergence && t.from == t.to)
}

impl Refinement {
    /// Build the initial partition for `lts`: block 0 with all LTS states,
    /// non-bottom states first, and one block of extra states per label.
    pub fn from_lts(lts: &Lts, branching: bool, preserve_divergence: bool) -> (Self, ExtraStates) {
        let n = lts.num_states();
        let mut extra_states = ExtraStates::new();
        let mut action_block: IndexMap<LabelId, usize> = IndexMap::new();

        let mut noninert_out_per_state = vec![0usize; n];
        let mut inert_out_per_state = vec![0usize; n];
        let mut noninert_in_per_state = vec![0usize; n];
        let mut inert_in_per_state = vec![0usize; n];
        let mut noninert_out_per_block = vec![0usize];
        let mut inert_out_per_block = vec![0usize];
        let mut states_per_block = vec![n];
        let mut nonbottom_states = 0;
        let mut num_transitions = lts.num_transitions();

        for t in lts.transitions() {
            if goes_through_extra_state(t, branching, preserve_divergence) {
                let (index, new) = extra_states.insert_full((t.label, t.to));
                let extra = n + index;
                if new {
                    noninert_out_per_state.push(0);
                    inert_out_per_state.push(0);
                    noninert_in_per_state.push(0);
                    inert_in_per_state.push(0);
                    let block = match action_block.get(&t.label) {
                        Some(&block) => block,
                        None => {
                            let block = states_per_block.len();
                            action_block.insert(t.label, block);
                            noninert_out_per_block.push(0);
                            inert_out_per_block.push(0);
                            states_per_block.push(0);
                            block
                        }
                    };
                    noninert_in_per_state[t.to] += 1;
                    noninert_out_per_state[extra] += 1;
                    noninert_out_per_block[block] += 1;
                    states_per_block[block] += 1;
                    num_transitions += 1;
                }
                noninert_in_per_state[extra] += 1;
                noninert_out_per_state[t.from] += 1;
                noninert_out_per_block[0] += 1;
            } else {
                inert_in_per_state[t.to] += 1;
                inert_out_per_state[t.from] += 1;
                if inert_out_per_state[t.from] == 1 {
                    nonbottom_states += 1;
                }
                inert_out_per_block[0] += 1;
            }
        }
        let num_states = n + extra_states.len();
        debug!(
            extra_states = extra_states.len(),
            states = num_states,
            transitions = num_transitions,
            "built Kripke structure"
        );

        let mut r = Refinement::with_capacity(num_states, num_transitions);
        let constln = r.new_constln(num_states, 0, num_states, num_transitions);
        if states_per_block.len() > 1 {
            r.make_nontrivial(constln);
        }

        // blocks and their single B_to_C slice
        let mut begin = 0;
        let mut b_to_c_begin = 0;
        for (b, &size) in states_per_block.iter().enumerate() {
            let block = r.new_block(constln, begin, begin + size);
            debug_assert_eq!(block, b);
            let outgoing = noninert_out_per_block[b] + inert_out_per_block[b];
            if outgoing != 0 {
                let inert_begin = b_to_c_begin + noninert_out_per_block[b];
                r.blocks[block].inert_begin = inert_begin;
                r.blocks[block].inert_end = b_to_c_begin + outgoing;
                let slice = r.new_descriptor(b_to_c_begin, b_to_c_begin + outgoing);
                r.push_back(block, slice);
                for entry in &mut r.b_to_c[b_to_c_begin..b_to_c_begin + outgoing] {
                    entry.slice = slice;
                }
                b_to_c_begin += outgoing;
            }
            begin += size;
        }
        r.assign_seqnr(0);
        r.blocks[0].bottom_begin = nonbottom_states;
        r.blocks[0].marked_nonbottom_begin = nonbottom_states;

        // states and their succ slices
        let mut nonbottom_left = nonbottom_states;
        for s in 0..num_states {
            let pred_begin = r.states[s].pred_begin;
            r.states[s + 1].pred_begin = pred_begin + noninert_in_per_state[s] + inert_in_per_state[s];
            r.states[s].inert_pred_begin = pred_begin + noninert_in_per_state[s];

            let succ_begin = r.states[s].succ_begin;
            let succ_end = succ_begin + noninert_out_per_state[s] + inert_out_per_state[s];
            r.states[s + 1].succ_begin = succ_end;
            r.states[s].current_constln = succ_end;
            r.states[s].inert_succ_begin = succ_begin + noninert_out_per_state[s];
            r.states[s].inert_succ_end = succ_end;
            if succ_begin < succ_end {
                for entry in &mut r.succ[succ_begin..succ_end - 1] {
                    entry.slice = succ_end - 1;
                }
                r.succ[succ_end - 1].slice = succ_begin;
            }
            if s < n {
                let pos = if inert_out_per_state[s] != 0 {
                    nonbottom_left -= 1;
                    nonbottom_left
                } else {
                    states_per_block[0] -= 1;
                    states_per_block[0]
                };
                r.states[s].block = 0;
                r.states[s].pos = pos;
                r.permutation[pos] = s;
            }
        }

        // transitions, filled in from the back of each range
        for t in lts.transitions() {
            if goes_through_extra_state(t, branching, preserve_divergence) {
                let Some(index) = extra_states.get_index_of(&(t.label, t.to)) else {
                    continue;
                };
                let extra = n + index;
                if noninert_out_per_state[extra] != 0 {
                    // first visit: place the extra state and its transition
                    let block = action_block.get(&t.label).copied().unwrap_or_default();
                    states_per_block[block] -= 1;
                    let pos = r.blocks[block].begin + states_per_block[block];
                    r.states[extra].block = block;
                    r.states[extra].pos = pos;
                    r.permutation[pos] = extra;

                    noninert_in_per_state[t.to] -= 1;
                    let pred = r.states[t.to].pred_begin + noninert_in_per_state[t.to];
                    noninert_out_per_state[extra] -= 1;
                    let succ = r.states[extra].succ_begin;
                    let b_to_c = r.blocks[block].inert_begin - noninert_out_per_block[block];
                    noninert_out_per_block[block] -= 1;
                    r.link(pred, succ, b_to_c, extra, t.to);
                }
                noninert_in_per_state[extra] -= 1;
                let pred = r.states[extra].pred_begin + noninert_in_per_state[extra];
                noninert_out_per_state[t.from] -= 1;
                let succ = r.states[t.from].succ_begin + noninert_out_per_state[t.from];
                let b_to_c = r.blocks[0].inert_begin - noninert_out_per_block[0];
                noninert_out_per_block[0] -= 1;
                r.link(pred, succ, b_to_c, t.from, extra);
            } else {
                inert_in_per_state[t.to] -= 1;
                let pred = r.states[t.to].inert_pred_begin + inert_in_per_state[t.to];
                inert_out_per_state[t.from] -= 1;
                let succ = r.states[t.from].inert_succ_begin + inert_out_per_state[t.from];
                inert_out_per_block[0] -= 1;
                let b_to_c = r.blocks[0].inert_begin + inert_out_per_block[0];
                r.link(pred, succ, b_to_c, t.from, t.to);
            }
        }
        (r, extra_states)
    }

    fn link(&mut self, pred: usize, succ: usize, b_to_c: usize, source: usize, target: usize) {
        self.pred[pred] = PredEntry { succ, source };
        self.succ[succ].target = target;
        self.succ[succ].b_to_c = b_to_c;
        self.b_to_c[b_to_c].pred = pred;
    }

    /// Equivalence class of a Kripke state; `None` for extra states.
    pub fn seqnr_of(&self, s: usize) -> Option<usize> {
        self.blocks[self.block_of(s)].seqnr
    }

    /// Transitions of the quotient, one per (block, goal constellation)
    /// slice of a bottom state of every block. Inert taus are dropped;
    /// with `preserve_divergence` a divergent self-loop survives.
    pub fn quotient_transitions(
        &self,
        extra_states: &ExtraStates,
        lts_states: usize,
        preserve_divergence: bool,
    ) -> Vec<Transition> {
        let mut transitions = Vec::new();
        let mut pos = 0;
        while pos < self.num_states() {
            let block = self.block_of(self.permutation[pos]);
            let Some(from) = self.blocks[block].seqnr else {
                break;
            };
            // the last state of a block is a bottom state
            let s = self.permutation[self.blocks[block].end - 1];
            let mut succ_iter = self.states[s].succ_begin;
            while succ_iter < self.succ_end(s) {
                let target = self.succ[succ_iter].target;
                match self.seqnr_of(target) {
                    Some(to) => {
                        if from == to {
                            if !preserve_divergence {
                                succ_iter = self.slice_end(succ_iter);
                                continue;
                            }
                            if s != target {
                                succ_iter += 1;
                                continue;
                            }
                        }
                        transitions.push(Transition::new(from, TAU, to));
                    }
                    None => {
                        if let Some(&(label, lts_target)) = extra_states.get_index(target - lts_states) {
                            if let Some(to) = self.seqnr_of(lts_target) {
                                transitions.push(Transition::new(from, label, to));
                            }
                        }
                    }
                }
                // other transitions into the same constellation map to the
                // same quotient transition
                succ_iter = self.slice_end(succ_iter);
            }
            pos = self.blocks[block].end;
        }
        transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lts() -> Lts {
        // 0 -tau-> 1 -a-> 2, 0 -a-> 2, 2 -tau-> 2
        let mut lts = Lts::new(3, 0);
        let a = lts.add_label("a");
        lts.add_transition(0, TAU, 1);
        lts.add_transition(1, a, 2);
        lts.add_transition(0, a, 2);
        lts.add_transition(2, TAU, 2);
        lts
    }

    #[test]
    fn visible_transitions_share_extra_states() {
        let (r, extra) = Refinement::from_lts(&lts(), true, true);
        // (a, 2) and the divergent self-loop (tau, 2)
        assert_eq!(extra.len(), 2);
        assert_eq!(r.num_states(), 5);
        // 3 transitions into extra states, 2 out of them, 1 inert
        assert_eq!(r.num_transitions(), 6);
        assert_eq!(r.blocks.len(), 3);
        assert_eq!(r.blocks[0].bottom_begin, 1);
        assert_eq!(r.permutation[0], 0);
    }

    #[test]
    fn strong_mode_has_no_inert_transitions() {
        let (r, extra) = Refinement::from_lts(&lts(), false, false);
        assert_eq!(extra.len(), 3);
        for s in 0..r.num_states() {
            assert_eq!(r.states[s].inert_succ_begin, r.states[s].inert_succ_end);
        }
        assert_eq!(r.blocks[0].bottom_begin, 0);
    }

    #[test]
    fn initial_arrays_are_linked() {
        let (r, _) = Refinement::from_lts(&lts(), true, false);
        for b in 0..r.num_transitions() {
            let pred = r.b_to_c[b].pred;
            assert_eq!(r.succ[r.pred[pred].succ].b_to_c, b);
        }
        for s in 0..r.num_states() {
            for pred in r.states[s].pred_begin..r.pred_end(s) {
                assert_eq!(r.succ[r.pred[pred].succ].target, s);
            }
        }
        for pos in 0..r.num_states() {
            assert_eq!(r.states[r.permutation[pos]].pos, pos);
        }
    }
}

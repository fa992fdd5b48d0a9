//! Structural self-check of the refinement data, compiled in debug builds.

use super::partition::Refinement;

impl Refinement {
    /// Panic if the three transition arrays, the permutation or the block
    /// and constellation layout are out of sync.
    pub fn check_consistency(&self) {
        let n = self.num_states();
        let m = self.num_transitions();
        assert_eq!(self.states[n].pred_begin, m, "pred ranges must cover all transitions");
        assert_eq!(self.states[n].succ_begin, m, "succ ranges must cover all transitions");

        for (pos, &s) in self.permutation.iter().enumerate() {
            assert_eq!(self.states[s].pos, pos, "position of state {s}");
        }

        for b_to_c in 0..m {
            let pred = self.b_to_c[b_to_c].pred;
            let succ = self.pred[pred].succ;
            assert_eq!(self.succ[succ].b_to_c, b_to_c, "transition triangle at B_to_C {b_to_c}");
        }

        for s in 0..n {
            let info = &self.states[s];
            assert!(info.pred_begin <= info.inert_pred_begin && info.inert_pred_begin <= self.pred_end(s));
            assert!(info.succ_begin <= info.inert_succ_begin);
            assert!(info.inert_succ_begin <= info.inert_succ_end && info.inert_succ_end <= self.succ_end(s));
            for pred in info.pred_begin..self.pred_end(s) {
                let succ = self.pred[pred].succ;
                assert_eq!(self.succ[succ].target, s, "pred entry {pred} of state {s}");
                let source = self.pred[pred].source;
                assert!(
                    self.states[source].succ_begin <= succ && succ < self.succ_end(source),
                    "pred entry {pred} points outside the succ range of its source"
                );
                let inert = pred >= info.inert_pred_begin;
                assert_eq!(
                    inert,
                    self.block_of(source) == self.block_of(s) && self.is_inert_succ(source, succ),
                    "inertness of pred entry {pred}"
                );
            }
            for succ in info.inert_succ_begin..info.inert_succ_end {
                assert_eq!(
                    self.block_of(self.succ[succ].target),
                    self.block_of(s),
                    "inert transition of state {s} leaves its block"
                );
            }
            // succ slices are contiguous and sorted by constellation
            let mut i = info.succ_begin;
            let mut previous_key = None;
            while i < self.succ_end(s) {
                let begin = self.slice_begin(i);
                let end = self.slice_end(i);
                assert_eq!(begin, i, "succ slice of state {s} does not start at {i}");
                let c = self.constln_of(self.succ[i].target);
                for j in begin..end {
                    assert_eq!(self.constln_of(self.succ[j].target), c, "succ slice of state {s}");
                }
                let key = self.key_of(c);
                assert!(previous_key < Some(key), "succ slices of state {s} are not sorted");
                previous_key = Some(key);
                i = end;
            }
        }

        for (b, block) in self.blocks.iter().enumerate() {
            assert!(
                block.begin <= block.marked_nonbottom_begin
                    && block.marked_nonbottom_begin <= block.bottom_begin
                    && block.bottom_begin <= block.marked_bottom_begin
                    && block.marked_bottom_begin <= block.end,
                "zones of block {b}"
            );
            if block.begin == block.end {
                continue;
            }
            for pos in block.begin..block.end {
                let s = self.permutation[pos];
                assert_eq!(self.states[s].block, b, "state {s} at {pos} is not in block {b}");
                let bottom = self.states[s].inert_succ_begin == self.states[s].inert_succ_end;
                assert_eq!(bottom, pos >= block.bottom_begin, "bottom zone of block {b}");
            }
            let constln = &self.constlns[block.constln];
            assert!(constln.begin <= block.begin && block.end <= constln.end, "block {b} outside its constellation");
            for d in self.descriptors_of(b) {
                let slice = &self.descriptors[d];
                assert!(slice.begin < slice.end, "empty slice in block {b}");
                let goal = self.to_constln(d);
                for i in slice.begin..slice.end {
                    assert_eq!(self.b_to_c[i].slice, d);
                    assert_eq!(self.block_of(self.source_of(i)), b, "B_to_C slice of block {b}");
                    assert_eq!(self.constln_of(self.target_of(i)), goal, "B_to_C slice of block {b}");
                }
            }
        }
    }

    fn is_inert_succ(&self, s: usize, succ: usize) -> bool {
        self.states[s].inert_succ_begin <= succ && succ < self.states[s].inert_succ_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lts::{Lts, TAU};

    fn diamond() -> Lts {
        let mut lts = Lts::new(4, 0);
        let a = lts.add_label("a");
        let b = lts.add_label("b");
        lts.add_transition(0, TAU, 1);
        lts.add_transition(0, a, 2);
        lts.add_transition(1, a, 2);
        lts.add_transition(1, b, 3);
        lts.add_transition(2, TAU, 3);
        lts
    }

    #[test]
    fn initial_partition_is_consistent() {
        let (r, _) = Refinement::from_lts(&diamond(), true, false);
        r.check_consistency();
        let (r, _) = Refinement::from_lts(&diamond(), false, false);
        r.check_consistency();
    }

    #[test]
    fn stable_partition_is_consistent() {
        for (branching, divergence) in [(false, false), (true, false), (true, true)] {
            let (mut r, _) = Refinement::from_lts(&diamond(), branching, divergence);
            r.refine_until_stable();
            r.check_consistency();
        }
    }

    #[test]
    #[should_panic(expected = "transition triangle")]
    fn broken_links_are_detected() {
        let (mut r, _) = Refinement::from_lts(&diamond(), true, false);
        let first = r.b_to_c[0].pred;
        r.b_to_c[0].pred = r.b_to_c[1].pred;
        r.b_to_c[1].pred = first;
        r.check_consistency();
    }
}

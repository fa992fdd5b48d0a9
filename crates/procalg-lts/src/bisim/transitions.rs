//! The three transition arrays and the operations that keep them in sync.
//!
//! Every Kripke transition appears once in each array:
//!
//! * `pred`, grouped by target state, inert transitions last;
//! * `succ`, grouped by source state and then by goal constellation;
//! * `b_to_c`, grouped by source block and goal constellation into slices.
//!
//! Each entry points at the entry of the same transition in the next array
//! (`pred -> succ -> b_to_c -> pred`). The `slice` field of a `succ` entry
//! encodes the extent of its constellation slice: the last entry of a slice
//! points to the first, all others point to the last.

use super::partition::{BlockId, DescId, Refinement, StateIdx};

#[derive(Debug, Clone, Copy, Default)]
pub(super) struct PredEntry {
    pub succ: usize,
    pub source: StateIdx,
}

#[derive(Debug, Clone, Copy, Default)]
pub(super) struct SuccEntry {
    pub b_to_c: usize,
    pub target: StateIdx,
    pub slice: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub(super) struct BToCEntry {
    pub pred: usize,
    pub slice: DescId,
}

impl Refinement {
    pub fn slice_begin(&self, i: usize) -> usize {
        let slice = self.succ[i].slice;
        if i < slice {
            self.succ[slice].slice
        } else {
            slice
        }
    }

    pub fn slice_end(&self, i: usize) -> usize {
        let slice = self.succ[i].slice;
        if i < slice {
            slice + 1
        } else {
            i + 1
        }
    }

    /// The `succ` position of the transition at a `b_to_c` position.
    pub fn succ_of(&self, b_to_c: usize) -> usize {
        self.pred[self.b_to_c[b_to_c].pred].succ
    }

    pub fn source_of(&self, b_to_c: usize) -> StateIdx {
        self.pred[self.b_to_c[b_to_c].pred].source
    }

    pub fn target_of(&self, b_to_c: usize) -> StateIdx {
        self.succ[self.succ_of(b_to_c)].target
    }

    /// Swap two transitions in `pred`, given by their `b_to_c` positions.
    pub fn swap_in(&mut self, pos1: usize, pos2: usize) {
        let (p1, p2) = (self.b_to_c[pos1].pred, self.b_to_c[pos2].pred);
        self.pred.swap(p1, p2);
        self.b_to_c[pos1].pred = p2;
        self.b_to_c[pos2].pred = p1;
    }

    /// Swap two transitions in `succ`, given by their `pred` positions. The
    /// slice fields stay where they are.
    pub fn swap_out(&mut self, pred1: usize, pred2: usize) {
        let (s1, s2) = (self.pred[pred1].succ, self.pred[pred2].succ);
        let first = self.succ[s1];
        self.succ[s1].b_to_c = self.succ[s2].b_to_c;
        self.succ[s1].target = self.succ[s2].target;
        self.succ[s2].b_to_c = first.b_to_c;
        self.succ[s2].target = first.target;
        self.pred[pred1].succ = s2;
        self.pred[pred2].succ = s1;
    }

    /// Swap two transitions in `b_to_c`, given by their `succ` positions.
    pub fn swap_b_to_c(&mut self, succ1: usize, succ2: usize) {
        let (b1, b2) = (self.succ[succ1].b_to_c, self.succ[succ2].b_to_c);
        self.b_to_c.swap(b1, b2);
        self.succ[succ1].b_to_c = b2;
        self.succ[succ2].b_to_c = b1;
    }

    /// Rotate three transitions in `b_to_c`: the first moves to the place
    /// of the second, the second to that of the third, the third to that
    /// of the first. Any two of the positions may coincide.
    pub fn swap3_b_to_c(&mut self, succ1: usize, succ2: usize, succ3: usize) {
        let temp = self.b_to_c[self.succ[succ1].b_to_c];
        self.b_to_c[self.succ[succ1].b_to_c] = self.b_to_c[self.succ[succ3].b_to_c];
        self.b_to_c[self.succ[succ3].b_to_c] = self.b_to_c[self.succ[succ2].b_to_c];
        self.b_to_c[self.succ[succ2].b_to_c] = temp;

        let temp = self.succ[succ2].b_to_c;
        self.succ[succ2].b_to_c = self.succ[succ3].b_to_c;
        self.succ[succ3].b_to_c = self.succ[succ1].b_to_c;
        self.succ[succ1].b_to_c = temp;
    }

    /// Separate the inert transitions of `spb` from the other transitions
    /// into its (old) constellation, putting the non-inert part first in
    /// the list of `spb`.
    pub fn split_inert_to_c(&mut self, spb: BlockId) {
        let (inert_begin, inert_end) = (self.blocks[spb].inert_begin, self.blocks[spb].inert_end);
        if inert_begin == inert_end {
            if inert_end != 0 {
                let slice = self.b_to_c[inert_end - 1].slice;
                self.move_to_front(spb, slice);
                self.blocks[spb].inert_begin = 0;
                self.blocks[spb].inert_end = 0;
            }
            return;
        }
        let slice = self.b_to_c[inert_begin].slice;
        let (slice_begin, slice_end) = (self.descriptors[slice].begin, self.descriptors[slice].end);
        if slice_begin == inert_begin {
            return;
        }
        let new_slice = if inert_begin - slice_begin < slice_end - inert_begin {
            let new_slice = self.new_descriptor(slice_begin, inert_begin);
            self.push_front(spb, new_slice);
            self.descriptors[slice].begin = inert_begin;
            new_slice
        } else {
            let new_slice = self.new_descriptor(inert_begin, slice_end);
            self.push_back(spb, new_slice);
            self.descriptors[slice].end = inert_begin;
            self.move_to_front(spb, slice);
            new_slice
        };
        for i in self.descriptors[new_slice].begin..self.descriptors[new_slice].end {
            self.b_to_c[i].slice = new_slice;
        }
    }

    /// Move a transition into the new constellation: to the front of its
    /// slice in `succ` and in `b_to_c`. Returns the position after the new
    /// `succ` slice, which is where `current_constln` of the source should
    /// point.
    pub fn change_to_c(&mut self, pred_iter: usize, first_of_state: bool, first_of_block: bool) -> usize {
        let old_pos = self.succ[self.pred[pred_iter].succ].b_to_c;
        let old_slice = self.b_to_c[old_pos].slice;
        let new_pos = self.descriptors[old_slice].begin;
        let source_block = self.block_of(self.pred[pred_iter].source);
        let new_slice = if first_of_block {
            let new_slice = self.new_descriptor(new_pos, new_pos);
            self.push_back(source_block, new_slice);
            self.move_to_front(source_block, old_slice);
            new_slice
        } else {
            self.b_to_c[new_pos - 1].slice
        };
        self.descriptors[new_slice].end += 1;
        self.descriptors[old_slice].begin += 1;
        if self.descriptors[old_slice].begin == self.descriptors[old_slice].end {
            if self.blocks[source_block].inert_end == self.descriptors[old_slice].begin {
                self.blocks[source_block].inert_begin = 0;
                self.blocks[source_block].inert_end = 0;
            }
            self.erase(source_block, old_slice);
        }
        let other = self.succ_of(new_pos);
        self.swap_b_to_c(self.pred[pred_iter].succ, other);
        self.b_to_c[new_pos].slice = new_slice;

        let old_out_pos = self.pred[pred_iter].succ;
        let new_out_pos = self.slice_begin(old_out_pos);
        let other = self.b_to_c[self.succ[new_out_pos].b_to_c].pred;
        self.swap_out(pred_iter, other);
        let old_slice_end = self.slice_end(old_out_pos);
        if old_slice_end > new_out_pos + 1 {
            self.succ[old_slice_end - 1].slice = new_out_pos + 1;
        }
        self.succ[new_out_pos].slice = if first_of_state {
            new_out_pos
        } else {
            self.succ[new_out_pos - 1].slice
        };
        new_out_pos + 1
    }

    /// Split the outgoing transitions of `s` into its old constellation so
    /// that those into the new constellation (its inert transitions) come
    /// first. Returns whether `s` still has a transition into the old
    /// constellation.
    pub fn split_s_inert_out(&mut self, s: StateIdx) -> bool {
        let new_c = self.constln_of(s);
        let mut split = self.states[s].inert_succ_begin;
        let to_c_end = self.states[s].inert_succ_end;
        let to_c_begin = if self.states[s].succ_begin == to_c_end {
            to_c_end
        } else {
            self.succ[to_c_end - 1].slice
        };
        let mut result = to_c_begin < split;
        if !result {
            // all transitions of the slice are inert
        } else if split < to_c_end {
            let mut swapcount = (to_c_end - split).min(split - to_c_begin);
            split = to_c_end - split + to_c_begin;
            let (mut pos1, mut pos2) = (to_c_begin, to_c_end);
            let temp = self.succ[pos1];
            loop {
                pos2 -= 1;
                self.succ[pos1].target = self.succ[pos2].target;
                self.succ[pos1].b_to_c = self.succ[pos2].b_to_c;
                let p = self.b_to_c[self.succ[pos1].b_to_c].pred;
                self.pred[p].succ = pos1;
                pos1 += 1;
                swapcount -= 1;
                if swapcount == 0 {
                    break;
                }
                self.succ[pos2].target = self.succ[pos1].target;
                self.succ[pos2].b_to_c = self.succ[pos1].b_to_c;
                let p = self.b_to_c[self.succ[pos2].b_to_c].pred;
                self.pred[p].succ = pos2;
            }
            self.succ[pos2].target = temp.target;
            self.succ[pos2].b_to_c = temp.b_to_c;
            let p = self.b_to_c[temp.b_to_c].pred;
            self.pred[p].succ = pos2;

            self.states[s].inert_succ_begin = to_c_begin;
            self.states[s].inert_succ_end = split;
            self.succ[to_c_end - 1].slice = split;
            self.succ[split - 1].slice = to_c_begin;
            let mut i = split - 1;
            while i != to_c_begin {
                i -= 1;
                self.succ[i].slice = split - 1;
            }
        } else if self.key_of(self.constln_of(self.succ[to_c_begin].target)) > self.key_of(new_c) {
            self.states[s].inert_succ_begin = to_c_begin;
            self.states[s].inert_succ_end = to_c_begin;
        } else {
            result = false;
        }
        result
    }

    /// Turn an inert transition into a non-inert one after its source and
    /// target ended up in different blocks.
    pub fn make_noninert(&mut self, succ_iter: usize) {
        let source = self.source_of(self.succ[succ_iter].b_to_c);
        let source_block = self.block_of(source);
        let other_b_to_c = self.blocks[source_block].inert_begin;
        let other_succ = self.succ_of(other_b_to_c);
        self.swap_b_to_c(succ_iter, other_succ);
        self.blocks[source_block].inert_begin += 1;

        let target = self.succ[succ_iter].target;
        let other_pred = self.states[target].inert_pred_begin;
        let other_b_to_c = self.succ[self.pred[other_pred].succ].b_to_c;
        self.swap_in(self.succ[succ_iter].b_to_c, other_b_to_c);
        self.states[target].inert_pred_begin += 1;

        let other_succ = self.states[source].inert_succ_begin;
        let pred1 = self.b_to_c[self.succ[succ_iter].b_to_c].pred;
        let pred2 = self.b_to_c[self.succ[other_succ].b_to_c].pred;
        self.swap_out(pred1, pred2);
        self.states[source].inert_succ_begin += 1;
    }

    /// Split the B_to_C slices of `rfnb` after the blue block `new_b` was
    /// split off it. Slices of `new_b` are put in front of those of `rfnb`.
    pub fn new_blue_block_created(&mut self, rfnb: BlockId, new_b: BlockId) {
        self.blocks[new_b].inert_begin = 0;
        self.blocks[new_b].inert_end = 0;
        let m = self.num_transitions();
        for pos in self.blocks[new_b].begin..self.blocks[new_b].end {
            let s = self.permutation[pos];
            for succ_iter in self.states[s].succ_begin..self.succ_end(s) {
                let old_pos = self.succ[succ_iter].b_to_c;
                let old_slice = self.b_to_c[old_pos].slice;
                let after_new_pos = self.descriptors[old_slice].end;
                let new_slice = if after_new_pos == m
                    || self.block_of(self.source_of(after_new_pos)) != new_b
                    || self.constln_of(self.target_of(after_new_pos)) != self.constln_of(self.succ[succ_iter].target)
                {
                    // first transition of new_b into this constellation
                    let new_slice = self.new_descriptor(after_new_pos, after_new_pos);
                    if self.needs_postprocessing(old_slice) {
                        self.push_back(new_b, new_slice);
                    } else {
                        self.push_front(new_b, new_slice);
                    }
                    if self.blocks[rfnb].inert_end == after_new_pos {
                        self.blocks[new_b].inert_begin = after_new_pos;
                        self.blocks[new_b].inert_end = after_new_pos;
                    }
                    new_slice
                } else {
                    self.b_to_c[after_new_pos].slice
                };
                self.descriptors[new_slice].begin -= 1;
                self.descriptors[old_slice].end -= 1;
                let mut new_pos = after_new_pos - 1;
                if self.blocks[rfnb].inert_end == after_new_pos {
                    if self.blocks[rfnb].inert_begin <= old_pos {
                        self.blocks[new_b].inert_begin -= 1;
                        new_pos = self.blocks[new_b].inert_begin;
                        let (second, third) = (self.succ_of(new_pos), self.succ_of(self.descriptors[new_slice].begin));
                        self.swap3_b_to_c(succ_iter, second, third);
                    } else {
                        self.blocks[rfnb].inert_begin -= 1;
                        let (second, third) = (self.succ_of(new_pos), self.succ_of(self.blocks[rfnb].inert_begin));
                        self.swap3_b_to_c(succ_iter, second, third);
                    }
                    self.blocks[rfnb].inert_end -= 1;
                    if self.descriptors[old_slice].begin == self.descriptors[old_slice].end {
                        self.blocks[rfnb].inert_begin = 0;
                        self.blocks[rfnb].inert_end = 0;
                        self.erase(rfnb, old_slice);
                    }
                } else {
                    let other = self.succ_of(new_pos);
                    self.swap_b_to_c(succ_iter, other);
                    if self.descriptors[old_slice].begin == self.descriptors[old_slice].end {
                        self.erase(rfnb, old_slice);
                    }
                }
                self.b_to_c[new_pos].slice = new_slice;
            }
        }
    }

    /// Split the B_to_C slices of `rfnb` after the red block `new_b` was
    /// split off it. During postprocessing, slices that still need
    /// postprocessing go to the back of the list of `new_b`; otherwise the
    /// slice into the splitter stays first.
    pub fn new_red_block_created(&mut self, rfnb: BlockId, new_b: BlockId, postprocessing: bool) {
        self.blocks[new_b].inert_begin = 0;
        self.blocks[new_b].inert_end = 0;
        let mut old_fromred_invalid = false;
        for pos in self.blocks[new_b].begin..self.blocks[new_b].end {
            let s = self.permutation[pos];
            for succ_iter in self.states[s].succ_begin..self.succ_end(s) {
                let old_pos = self.succ[succ_iter].b_to_c;
                let old_slice = self.b_to_c[old_pos].slice;
                let mut new_pos = self.descriptors[old_slice].begin;
                let new_slice = if new_pos == 0
                    || self.block_of(self.source_of(new_pos - 1)) != new_b
                    || self.constln_of(self.target_of(new_pos - 1)) != self.constln_of(self.succ[succ_iter].target)
                {
                    // first transition of new_b into this constellation
                    let new_slice = self.new_descriptor(new_pos, new_pos);
                    let in_front = if postprocessing {
                        !self.needs_postprocessing(old_slice)
                    } else {
                        !old_fromred_invalid && self.blocks[rfnb].to_constln.first == Some(old_slice)
                    };
                    if in_front {
                        self.push_front(new_b, new_slice);
                    } else {
                        self.push_back(new_b, new_slice);
                    }
                    if self.blocks[rfnb].inert_end == self.descriptors[old_slice].end {
                        self.blocks[new_b].inert_begin = new_pos;
                        self.blocks[new_b].inert_end = new_pos;
                    }
                    new_slice
                } else {
                    self.b_to_c[new_pos - 1].slice
                };
                self.descriptors[new_slice].end += 1;
                self.descriptors[old_slice].begin += 1;
                let emptied = |r: &Self| r.descriptors[old_slice].begin == r.descriptors[old_slice].end;
                if self.blocks[rfnb].inert_end == self.descriptors[old_slice].end {
                    self.blocks[new_b].inert_end += 1;
                    if self.blocks[rfnb].inert_begin <= old_pos {
                        let (second, third) = (self.succ_of(new_pos), self.succ_of(self.blocks[rfnb].inert_begin));
                        self.swap3_b_to_c(succ_iter, second, third);
                        self.blocks[rfnb].inert_begin += 1;
                    } else {
                        new_pos = self.blocks[new_b].inert_begin;
                        self.blocks[new_b].inert_begin += 1;
                        let (second, third) = (self.succ_of(new_pos), self.succ_of(self.blocks[new_b].inert_end - 1));
                        self.swap3_b_to_c(succ_iter, second, third);
                    }
                    if emptied(self) {
                        self.blocks[rfnb].inert_begin = 0;
                        self.blocks[rfnb].inert_end = 0;
                        if self.blocks[rfnb].to_constln.first == Some(old_slice) {
                            old_fromred_invalid = true;
                        }
                        self.erase(rfnb, old_slice);
                    }
                } else {
                    let other = self.succ_of(new_pos);
                    self.swap_b_to_c(succ_iter, other);
                    if emptied(self) {
                        if self.blocks[rfnb].to_constln.first == Some(old_slice) {
                            old_fromred_invalid = true;
                        }
                        self.erase(rfnb, old_slice);
                    }
                }
                self.b_to_c[new_pos].slice = new_slice;
            }
        }
    }
}

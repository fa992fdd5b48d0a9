//! The refinable partition: states, blocks and constellations.
//!
//! All states live in one permutation array. A block is a slice of it and a
//! constellation is a slice made of whole blocks. Inside a block the states
//! are kept in four zones:
//!
//! ```text
//! begin           marked_nonbottom_begin  bottom_begin  marked_bottom_begin  end
//!   | unmarked non-bottom | marked non-bottom | unmarked bottom | marked bottom |
//! ```
//!
//! Marking a state moves it into the marked zone of its kind, so every
//! zone boundary can be adjusted in constant time.

use super::transitions::{BToCEntry, PredEntry, SuccEntry};

pub(super) type StateIdx = usize;
pub(super) type BlockId = usize;
pub(super) type ConstlnId = usize;
pub(super) type DescId = usize;

/// Everything the algorithm stores per state of the Kripke structure. The
/// transition ranges of a state end where those of the next state begin;
/// the state array has one extra sentinel entry for the last state.
#[derive(Debug, Clone, Default)]
pub(super) struct StateInfo {
    pub pred_begin: usize,
    pub inert_pred_begin: usize,
    pub succ_begin: usize,
    pub inert_succ_begin: usize,
    pub inert_succ_end: usize,
    pub block: BlockId,
    pub pos: usize,
    /// Inert successors not yet known to be blue, valid while the state is
    /// a candidate in `refine`.
    pub notblue: usize,
    /// First outgoing transition to the constellation of interest.
    pub current_constln: usize,
}

#[derive(Debug, Clone)]
pub(super) struct Block {
    pub begin: usize,
    pub marked_nonbottom_begin: usize,
    pub bottom_begin: usize,
    pub marked_bottom_begin: usize,
    pub end: usize,
    /// Inert transitions of the block in the B_to_C array; `0..0` if none.
    pub inert_begin: usize,
    pub inert_end: usize,
    /// B_to_C slices starting in this block, one per goal constellation.
    pub to_constln: DescList,
    pub constln: ConstlnId,
    /// Next refinable block; a block that is last points to itself.
    pub refinable_next: Option<BlockId>,
    /// Number of the block in the quotient; blocks of extra Kripke states
    /// have none.
    pub seqnr: Option<usize>,
}

impl Block {
    pub fn new(constln: ConstlnId, begin: usize, end: usize) -> Self {
        Self {
            begin,
            marked_nonbottom_begin: begin,
            bottom_begin: begin,
            marked_bottom_begin: end,
            end,
            inert_begin: 0,
            inert_end: 0,
            to_constln: DescList::default(),
            constln,
            refinable_next: None,
            seqnr: None,
        }
    }

    pub fn size(&self) -> usize {
        self.end - self.begin
    }

    pub fn unmarked_bottom_size(&self) -> usize {
        self.marked_bottom_begin - self.bottom_begin
    }

    /// Old bottom states count as marked.
    pub fn marked_bottom_size(&self) -> usize {
        self.end - self.marked_bottom_begin
    }

    pub fn marked_size(&self) -> usize {
        self.bottom_begin - self.marked_nonbottom_begin + self.marked_bottom_size()
    }
}

#[derive(Debug, Clone)]
pub(super) struct Constln {
    pub begin: usize,
    pub end: usize,
    /// Next non-trivial constellation; the last one points to itself.
    pub nontrivial_next: Option<ConstlnId>,
    /// B_to_C range whose transitions into this constellation still need
    /// postprocessing. Empty when `postprocess_begin == postprocess_end`.
    pub postprocess_begin: usize,
    pub postprocess_end: usize,
    /// Constellations are ordered by this key. A constellation split off
    /// from `C` gets a key just below that of `C`, so the relative order of
    /// all other constellations is kept.
    pub sort_key: usize,
}

impl Constln {
    fn new(sort_key: usize, begin: usize, end: usize, postprocess_none: usize) -> Self {
        Self {
            begin,
            end,
            nontrivial_next: None,
            postprocess_begin: postprocess_none,
            postprocess_end: postprocess_none,
            sort_key,
        }
    }
}

/// A slice of the B_to_C array: transitions from one block into one
/// constellation. Descriptors of a block form a doubly linked list.
#[derive(Debug, Clone)]
pub(super) struct Descriptor {
    pub begin: usize,
    pub end: usize,
    prev: Option<DescId>,
    next: Option<DescId>,
}

#[derive(Debug, Clone, Copy, Default)]
pub(super) struct DescList {
    pub first: Option<DescId>,
    pub last: Option<DescId>,
}

/// The complete state of a refinement run.
pub(super) struct Refinement {
    pub states: Vec<StateInfo>,
    pub permutation: Vec<StateIdx>,
    pub blocks: Vec<Block>,
    pub constlns: Vec<Constln>,
    pub descriptors: Vec<Descriptor>,
    free_descriptors: Vec<DescId>,
    pub pred: Vec<PredEntry>,
    pub succ: Vec<SuccEntry>,
    pub b_to_c: Vec<BToCEntry>,
    refinable_first: Option<BlockId>,
    nontrivial_first: Option<ConstlnId>,
    /// Blocks that carry a sequence number.
    pub nr_of_blocks: usize,
}

impl Refinement {
    /// Allocate the arrays for `n` Kripke states and `m` Kripke transitions.
    pub fn with_capacity(n: usize, m: usize) -> Self {
        Self {
            states: vec![StateInfo::default(); n + 1],
            permutation: vec![0; n],
            blocks: Vec::new(),
            constlns: Vec::new(),
            descriptors: Vec::new(),
            free_descriptors: Vec::new(),
            pred: vec![PredEntry::default(); m],
            succ: vec![SuccEntry::default(); m],
            b_to_c: vec![BToCEntry::default(); m],
            refinable_first: None,
            nontrivial_first: None,
            nr_of_blocks: 0,
        }
    }

    pub fn num_states(&self) -> usize {
        self.permutation.len()
    }

    pub fn num_transitions(&self) -> usize {
        self.pred.len()
    }

    // States.

    pub fn pred_end(&self, s: StateIdx) -> usize {
        self.states[s + 1].pred_begin
    }

    pub fn succ_end(&self, s: StateIdx) -> usize {
        self.states[s + 1].succ_begin
    }

    pub fn block_of(&self, s: StateIdx) -> BlockId {
        self.states[s].block
    }

    pub fn constln_of(&self, s: StateIdx) -> ConstlnId {
        self.blocks[self.states[s].block].constln
    }

    pub fn key_of(&self, c: ConstlnId) -> usize {
        self.constlns[c].sort_key
    }

    pub fn swap_permutation(&mut self, pos1: usize, pos2: usize) {
        self.permutation.swap(pos1, pos2);
        let (s1, s2) = (self.permutation[pos1], self.permutation[pos2]);
        self.states[s1].pos = pos1;
        self.states[s2].pos = pos2;
    }

    /// Whether the transition at `current_constln` certainly goes into
    /// `spc`.
    pub fn surely_has_transition_to(&self, s: StateIdx, spc: ConstlnId) -> bool {
        let current = self.states[s].current_constln;
        current != self.succ_end(s) && self.constln_of(self.succ[current].target) == spc
    }

    /// Whether `current_constln` sits exactly between the transitions into
    /// constellations below `spc` and those above it.
    pub fn surely_has_no_transition_to(&self, s: StateIdx, spc: ConstlnId) -> bool {
        let current = self.states[s].current_constln;
        let key = self.key_of(spc);
        if current != self.succ_end(s) && self.key_of(self.constln_of(self.succ[current].target)) <= key {
            return false;
        }
        if current != self.states[s].succ_begin && key <= self.key_of(self.constln_of(self.succ[current - 1].target)) {
            return false;
        }
        true
    }

    // Blocks.

    pub fn new_block(&mut self, constln: ConstlnId, begin: usize, end: usize) -> BlockId {
        self.blocks.push(Block::new(constln, begin, end));
        self.blocks.len() - 1
    }

    pub fn assign_seqnr(&mut self, b: BlockId) {
        self.blocks[b].seqnr = Some(self.nr_of_blocks);
        self.nr_of_blocks += 1;
    }

    pub fn some_refinable(&self) -> Option<BlockId> {
        self.refinable_first
    }

    /// Returns whether the block was not refinable before.
    pub fn make_refinable(&mut self, b: BlockId) -> bool {
        if self.blocks[b].refinable_next.is_some() {
            return false;
        }
        self.blocks[b].refinable_next = Some(self.refinable_first.unwrap_or(b));
        self.refinable_first = Some(b);
        true
    }

    /// Only valid for the first refinable block.
    pub fn make_nonrefinable(&mut self, b: BlockId) {
        debug_assert_eq!(self.refinable_first, Some(b));
        let next = self.blocks[b].refinable_next;
        self.refinable_first = if next == Some(b) { None } else { next };
        self.blocks[b].refinable_next = None;
    }

    /// Mark a non-bottom state. Returns whether it was unmarked.
    pub fn mark_nonbottom(&mut self, b: BlockId, s: StateIdx) -> bool {
        let pos = self.states[s].pos;
        if self.blocks[b].marked_nonbottom_begin <= pos {
            return false;
        }
        self.blocks[b].marked_nonbottom_begin -= 1;
        self.swap_permutation(pos, self.blocks[b].marked_nonbottom_begin);
        true
    }

    /// Mark a state. Returns whether it was unmarked.
    pub fn mark(&mut self, b: BlockId, s: StateIdx) -> bool {
        let pos = self.states[s].pos;
        if self.blocks[b].bottom_begin <= pos {
            if self.blocks[b].marked_bottom_begin <= pos {
                return false;
            }
            self.blocks[b].marked_bottom_begin -= 1;
            self.swap_permutation(pos, self.blocks[b].marked_bottom_begin);
            return true;
        }
        self.mark_nonbottom(b, s)
    }

    /// Move the slice `[from, to)` of the permutation so that the slice
    /// `[to, to + len)` ends up in front of it. Only the states' positions
    /// matter, not their order inside either slice.
    fn rotate_unmarked_bottom(&mut self, from: usize, unmarked_bottom_end: usize, mut swapcount: usize) {
        if swapcount == 0 {
            return;
        }
        let (mut pos1, mut pos2) = (from, unmarked_bottom_end);
        let temp = self.permutation[pos1];
        loop {
            pos2 -= 1;
            self.permutation[pos1] = self.permutation[pos2];
            self.states[self.permutation[pos1]].pos = pos1;
            pos1 += 1;
            swapcount -= 1;
            if swapcount == 0 {
                break;
            }
            self.permutation[pos2] = self.permutation[pos1];
            self.states[self.permutation[pos2]].pos = pos2;
        }
        self.permutation[pos2] = temp;
        self.states[temp].pos = pos2;
    }

    fn move_states_to(&mut self, b: BlockId) {
        for pos in self.blocks[b].begin..self.blocks[b].end {
            let s = self.permutation[pos];
            self.states[s].block = b;
        }
    }

    /// Split off the blue states of `b` (the unmarked non-bottom states
    /// before `blue_nonbottom_end` and the unmarked bottom states) as a new
    /// block in front of `b`.
    pub fn split_off_blue(&mut self, b: BlockId, blue_nonbottom_end: usize) -> BlockId {
        let block = &self.blocks[b];
        let unmarked_bottom = block.unmarked_bottom_size();
        let splitpoint = blue_nonbottom_end + unmarked_bottom;
        debug_assert!(splitpoint < block.end);
        let swapcount = unmarked_bottom.min(block.bottom_begin - blue_nonbottom_end);
        let (begin, marked_bottom_begin, constln, numbered) =
            (block.begin, block.marked_bottom_begin, block.constln, block.seqnr.is_some());
        self.rotate_unmarked_bottom(blue_nonbottom_end, marked_bottom_begin, swapcount);

        let new_b = self.new_block(constln, begin, splitpoint);
        if numbered {
            self.assign_seqnr(new_b);
        }
        self.blocks[new_b].bottom_begin = blue_nonbottom_end;
        self.blocks[new_b].marked_nonbottom_begin = blue_nonbottom_end;
        self.move_states_to(new_b);

        let block = &mut self.blocks[b];
        block.bottom_begin = block.marked_bottom_begin;
        block.marked_nonbottom_begin = block.marked_bottom_begin;
        block.begin = splitpoint;
        self.make_nontrivial(constln);
        new_b
    }

    /// Split off the red states of `b` (the non-bottom states from
    /// `red_nonbottom_begin` on and the marked bottom states) as a new
    /// block behind `b`.
    pub fn split_off_red(&mut self, b: BlockId, red_nonbottom_begin: usize) -> BlockId {
        let block = &self.blocks[b];
        let unmarked_bottom = block.unmarked_bottom_size();
        let splitpoint = red_nonbottom_begin + unmarked_bottom;
        debug_assert!(block.begin < splitpoint);
        let swapcount = unmarked_bottom.min(block.bottom_begin - red_nonbottom_begin);
        let (end, marked_bottom_begin, constln, numbered) =
            (block.end, block.marked_bottom_begin, block.constln, block.seqnr.is_some());
        self.rotate_unmarked_bottom(red_nonbottom_begin, marked_bottom_begin, swapcount);

        let new_b = self.new_block(constln, splitpoint, end);
        if numbered {
            self.assign_seqnr(new_b);
        }
        let new_block = &mut self.blocks[new_b];
        new_block.marked_bottom_begin = marked_bottom_begin;
        new_block.bottom_begin = marked_bottom_begin;
        new_block.marked_nonbottom_begin = marked_bottom_begin;
        self.move_states_to(new_b);

        let block = &mut self.blocks[b];
        block.marked_nonbottom_begin = red_nonbottom_begin;
        block.bottom_begin = red_nonbottom_begin;
        block.marked_bottom_begin = splitpoint;
        block.end = splitpoint;
        self.make_nontrivial(constln);
        new_b
    }

    // Constellations.

    pub fn new_constln(&mut self, sort_key: usize, begin: usize, end: usize, postprocess_none: usize) -> ConstlnId {
        self.constlns.push(Constln::new(sort_key, begin, end, postprocess_none));
        self.constlns.len() - 1
    }

    pub fn some_nontrivial(&self) -> Option<ConstlnId> {
        self.nontrivial_first
    }

    pub fn make_nontrivial(&mut self, c: ConstlnId) {
        if self.constlns[c].nontrivial_next.is_none() {
            self.constlns[c].nontrivial_next = Some(self.nontrivial_first.unwrap_or(c));
            self.nontrivial_first = Some(c);
        }
    }

    /// Only valid for the first non-trivial constellation.
    pub fn make_trivial(&mut self, c: ConstlnId) {
        debug_assert_eq!(self.nontrivial_first, Some(c));
        let next = self.constlns[c].nontrivial_next;
        self.nontrivial_first = if next == Some(c) { None } else { next };
        self.constlns[c].nontrivial_next = None;
    }

    /// Split the first or the last block off `c`, whichever is smaller, into
    /// a new constellation. Ties split off the first block, which makes
    /// the following `change_to_c` calls cheaper.
    pub fn split_off_small_block(&mut self, c: ConstlnId) -> BlockId {
        let (begin, end) = (self.constlns[c].begin, self.constlns[c].end);
        let first_b = self.block_of(self.permutation[begin]);
        let last_b = self.block_of(self.permutation[end - 1]);
        if self.blocks[first_b].end == self.blocks[last_b].begin {
            self.make_trivial(c);
        }
        let key = self.constlns[c].sort_key;
        let postprocess_none = self.constlns[c].postprocess_end;
        if self.blocks[first_b].size() > self.blocks[last_b].size() {
            let split = self.blocks[last_b].begin;
            let new_c = self.new_constln(key - (split - begin), split, end, postprocess_none);
            self.constlns[c].end = split;
            self.blocks[last_b].constln = new_c;
            last_b
        } else {
            let split = self.blocks[first_b].end;
            let new_c = self.new_constln(key - (end - split), begin, split, postprocess_none);
            self.constlns[c].begin = split;
            self.blocks[first_b].constln = new_c;
            first_b
        }
    }

    // B_to_C descriptors.

    pub fn new_descriptor(&mut self, begin: usize, end: usize) -> DescId {
        let descriptor = Descriptor {
            begin,
            end,
            prev: None,
            next: None,
        };
        match self.free_descriptors.pop() {
            Some(d) => {
                self.descriptors[d] = descriptor;
                d
            }
            None => {
                self.descriptors.push(descriptor);
                self.descriptors.len() - 1
            }
        }
    }

    pub fn push_front(&mut self, b: BlockId, d: DescId) {
        let first = self.blocks[b].to_constln.first;
        self.descriptors[d].prev = None;
        self.descriptors[d].next = first;
        match first {
            Some(f) => self.descriptors[f].prev = Some(d),
            None => self.blocks[b].to_constln.last = Some(d),
        }
        self.blocks[b].to_constln.first = Some(d);
    }

    pub fn push_back(&mut self, b: BlockId, d: DescId) {
        let last = self.blocks[b].to_constln.last;
        self.descriptors[d].next = None;
        self.descriptors[d].prev = last;
        match last {
            Some(l) => self.descriptors[l].next = Some(d),
            None => self.blocks[b].to_constln.first = Some(d),
        }
        self.blocks[b].to_constln.last = Some(d);
    }

    fn unlink(&mut self, b: BlockId, d: DescId) {
        let (prev, next) = (self.descriptors[d].prev, self.descriptors[d].next);
        match prev {
            Some(p) => self.descriptors[p].next = next,
            None => self.blocks[b].to_constln.first = next,
        }
        match next {
            Some(n) => self.descriptors[n].prev = prev,
            None => self.blocks[b].to_constln.last = prev,
        }
        self.descriptors[d].prev = None;
        self.descriptors[d].next = None;
    }

    pub fn erase(&mut self, b: BlockId, d: DescId) {
        self.unlink(b, d);
        self.free_descriptors.push(d);
    }

    pub fn move_to_front(&mut self, b: BlockId, d: DescId) {
        if self.blocks[b].to_constln.first != Some(d) {
            self.unlink(b, d);
            self.push_front(b, d);
        }
    }

    pub fn move_to_back(&mut self, b: BlockId, d: DescId) {
        if self.blocks[b].to_constln.last != Some(d) {
            self.unlink(b, d);
            self.push_back(b, d);
        }
    }

    pub fn descriptors_of(&self, b: BlockId) -> impl Iterator<Item = DescId> + '_ {
        std::iter::successors(self.blocks[b].to_constln.first, move |&d| self.descriptors[d].next)
    }

    /// Source block of the transitions in a non-empty slice.
    pub fn from_block(&self, d: DescId) -> BlockId {
        let pred = self.b_to_c[self.descriptors[d].begin].pred;
        self.block_of(self.pred[pred].source)
    }

    /// Goal constellation of the transitions in a non-empty slice.
    pub fn to_constln(&self, d: DescId) -> ConstlnId {
        let pred = self.b_to_c[self.descriptors[d].begin].pred;
        self.constln_of(self.succ[self.pred[pred].succ].target)
    }

    pub fn needs_postprocessing(&self, d: DescId) -> bool {
        let c = &self.constlns[self.to_constln(d)];
        let slice = &self.descriptors[d];
        c.postprocess_begin <= slice.begin && slice.end <= c.postprocess_end
    }

    /// The slice of `b` into `spc`, provided it is the first of the block.
    pub fn from_red(&self, b: BlockId, spc: ConstlnId) -> Option<DescId> {
        self.blocks[b].to_constln.first.filter(|&d| self.to_constln(d) == spc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two constellation-free blocks over six states, enough to exercise
    /// the permutation and list primitives without transitions.
    fn six_states() -> (Refinement, BlockId) {
        let mut r = Refinement::with_capacity(6, 0);
        for s in 0..6 {
            r.permutation[s] = s;
            r.states[s].pos = s;
        }
        let c = r.new_constln(6, 0, 6, 0);
        let b = r.new_block(c, 0, 6);
        r.assign_seqnr(b);
        // states 0..2 non-bottom, 2..6 bottom
        r.blocks[b].bottom_begin = 2;
        r.blocks[b].marked_nonbottom_begin = 2;
        (r, b)
    }

    #[test]
    fn marking_moves_states_into_their_zone() {
        let (mut r, b) = six_states();
        assert!(r.mark(b, 3));
        assert!(!r.mark(b, 3));
        assert!(r.mark(b, 0));
        let block = &r.blocks[b];
        assert_eq!(block.marked_bottom_begin, 5);
        assert_eq!(block.marked_nonbottom_begin, 1);
        assert_eq!(r.permutation[5], 3);
        assert_eq!(r.permutation[1], 0);
        assert_eq!(block.marked_size(), 2);
        assert_eq!(block.unmarked_bottom_size(), 3);
        for pos in 0..6 {
            assert_eq!(r.states[r.permutation[pos]].pos, pos);
        }
    }

    #[test]
    fn blue_split_takes_unmarked_bottom_states() {
        let (mut r, b) = six_states();
        r.mark(b, 5);
        r.mark(b, 1);
        // state 0 is blue, 1 is red; bottom 2, 3, 4 are blue, 5 is red
        let blue = r.split_off_blue(b, 1);
        assert_eq!((r.blocks[blue].begin, r.blocks[blue].end), (0, 4));
        assert_eq!(r.blocks[blue].bottom_begin, 1);
        assert_eq!((r.blocks[b].begin, r.blocks[b].end), (4, 6));
        assert_eq!(r.blocks[b].bottom_begin, 5);
        let mut blue_states: Vec<_> = r.permutation[0..4].to_vec();
        blue_states.sort_unstable();
        assert_eq!(blue_states, vec![0, 2, 3, 4]);
        assert!(blue_states.iter().all(|&s| r.states[s].block == blue));
        assert_eq!(r.blocks[blue].seqnr, Some(1));
        assert_eq!(r.some_nontrivial(), Some(r.blocks[b].constln));
    }

    #[test]
    fn red_split_takes_marked_states() {
        let (mut r, b) = six_states();
        r.mark(b, 5);
        r.mark(b, 1);
        let red = r.split_off_red(b, r.blocks[b].marked_nonbottom_begin);
        let mut red_states: Vec<_> = r.permutation[r.blocks[red].begin..r.blocks[red].end].to_vec();
        red_states.sort_unstable();
        assert_eq!(red_states, vec![1, 5]);
        assert_eq!(r.blocks[b].size(), 4);
        assert_eq!(r.blocks[b].end, r.blocks[red].begin);
        assert_eq!(r.blocks[red].unmarked_bottom_size(), 0);
    }

    #[test]
    fn refinable_list_is_a_stack() {
        let (mut r, b) = six_states();
        let c = r.blocks[b].constln;
        let other = r.new_block(c, 6, 6);
        assert!(r.make_refinable(b));
        assert!(!r.make_refinable(b));
        assert!(r.make_refinable(other));
        assert_eq!(r.some_refinable(), Some(other));
        r.make_nonrefinable(other);
        assert_eq!(r.some_refinable(), Some(b));
        r.make_nonrefinable(b);
        assert_eq!(r.some_refinable(), None);
    }

    #[test]
    fn descriptor_lists_splice() {
        let (mut r, b) = six_states();
        let d1 = r.new_descriptor(0, 1);
        let d2 = r.new_descriptor(1, 2);
        let d3 = r.new_descriptor(2, 3);
        r.push_back(b, d1);
        r.push_back(b, d2);
        r.push_front(b, d3);
        assert_eq!(r.descriptors_of(b).collect::<Vec<_>>(), vec![d3, d1, d2]);
        r.move_to_front(b, d2);
        assert_eq!(r.descriptors_of(b).collect::<Vec<_>>(), vec![d2, d3, d1]);
        r.move_to_back(b, d2);
        r.erase(b, d3);
        assert_eq!(r.descriptors_of(b).collect::<Vec<_>>(), vec![d1, d2]);
        assert_eq!(r.new_descriptor(4, 5), d3);
    }
}

//! The main loop, `refine` and the postprocessing of new bottom states.
//!
//! `refine` splits a block into the states that can reach the splitter
//! through inert transitions (red) and those that cannot (blue). Both sides
//! are searched at the same time by two resumable state machines so that
//! the total work stays proportional to the smaller side. Each machine
//! saves its locals and a resume point whenever its allowance runs out at a
//! loop back-edge; the allowance grows by a factor of about sqrt(2) per
//! turn.

use std::collections::BTreeSet;
use std::f64::consts::SQRT_2;

use tracing::trace;

use super::partition::{BlockId, ConstlnId, DescId, Refinement, StateIdx};

/// Result of running one search until it yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// The allowance is used up; resume later.
    Yield,
    /// This side turned out to be the larger one.
    Abort,
    /// The block has been split; carries the red block.
    Finished(BlockId),
}

/// How many loop iterations a search may run before it has to yield.
struct Budget {
    remaining: usize,
    /// The other search was aborted, so this one runs to completion.
    exclusive: bool,
}

impl Budget {
    fn turn(allowance: usize) -> Self {
        Self {
            remaining: allowance,
            exclusive: false,
        }
    }

    fn exclusive() -> Self {
        Self {
            remaining: 0,
            exclusive: true,
        }
    }

    /// Count one back-edge. Returns true if the search must yield now.
    fn tick(&mut self) -> bool {
        if self.exclusive {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }

    fn abort_other(&mut self) {
        self.exclusive = true;
    }
}

fn next_allowance(previous: usize) -> usize {
    (previous as f64 * SQRT_2).ceil() as usize
}

/// Variables both searches see.
struct Shared {
    rfnb: BlockId,
    spc: Option<ConstlnId>,
    from_red: Option<DescId>,
    postprocessing: bool,
    /// Non-bottom states before this position have a valid `notblue`.
    notblue_initialised_end: usize,
    from_red_is_empty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BluePc {
    Start,
    CollectBottom,
    AfterCollect,
    VisitState,
    Predecessor,
    Testing,
    AddBlue,
    NextPredecessor,
    StateHandled,
    Split,
}

/// Search for states that cannot reach the splitter.
struct BlueSearch {
    pc: BluePc,
    visited_end: usize,
    s: StateIdx,
    pred_iter: usize,
    s_prime: StateIdx,
    blue_nonbottom_end: usize,
    begin: usize,
    end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RedPc {
    Start,
    CollectFromRed,
    StartVisiting,
    VisitState,
    Predecessor,
    StateHandled,
    Split,
}

/// Search for states that can reach the splitter.
struct RedSearch {
    pc: RedPc,
    fromred_visited_begin: usize,
    visited_begin: usize,
    s: StateIdx,
    pred_iter: usize,
}

impl BlueSearch {
    fn new() -> Self {
        Self {
            pc: BluePc::Start,
            visited_end: 0,
            s: 0,
            pred_iter: 0,
            s_prime: 0,
            blue_nonbottom_end: 0,
            begin: 0,
            end: 0,
        }
    }

    fn resume(&mut self, r: &mut Refinement, sh: &mut Shared, budget: &mut Budget) -> Step {
        let rfnb = sh.rfnb;
        loop {
            match self.pc {
                BluePc::Start => {
                    self.visited_end = r.blocks[rfnb].bottom_begin;
                    self.pc = BluePc::CollectBottom;
                }
                BluePc::CollectBottom => {
                    // decide which unmarked bottom states are blue
                    if r.blocks[rfnb].marked_bottom_begin <= self.visited_end {
                        self.pc = BluePc::AfterCollect;
                        continue;
                    }
                    if sh.from_red_is_empty {
                        // all remaining unmarked bottom states are blue
                        let block = &r.blocks[rfnb];
                        if block.unmarked_bottom_size() > block.size() / 2 {
                            return Step::Abort;
                        }
                        self.pc = BluePc::AfterCollect;
                        continue;
                    }
                    self.s = r.permutation[self.visited_end];
                    if sh.spc.is_some_and(|spc| r.surely_has_transition_to(self.s, spc)) {
                        r.blocks[rfnb].marked_bottom_begin -= 1;
                        r.swap_permutation(self.visited_end, r.blocks[rfnb].marked_bottom_begin);
                        let block = &r.blocks[rfnb];
                        if block.marked_size() > block.size() / 2 {
                            budget.abort_other();
                        }
                    } else {
                        self.visited_end += 1;
                        let block = &r.blocks[rfnb];
                        if self.visited_end - block.bottom_begin > block.size() / 2 {
                            return Step::Abort;
                        }
                    }
                    if budget.tick() {
                        return Step::Yield;
                    }
                }
                BluePc::AfterCollect => {
                    if r.blocks[rfnb].unmarked_bottom_size() == 0 {
                        // every bottom state is red, so there is no blue state
                        let block = &mut r.blocks[rfnb];
                        block.marked_nonbottom_begin = block.bottom_begin;
                        return Step::Finished(rfnb);
                    }
                    self.visited_end = r.blocks[rfnb].bottom_begin;
                    self.blue_nonbottom_end = r.blocks[rfnb].begin;
                    self.pc = BluePc::VisitState;
                }
                BluePc::VisitState => {
                    self.s = r.permutation[self.visited_end];
                    self.visited_end += 1;
                    self.pred_iter = r.states[self.s].inert_pred_begin;
                    self.pc = BluePc::Predecessor;
                }
                BluePc::Predecessor => {
                    if self.pred_iter == r.pred_end(self.s) {
                        if r.blocks[rfnb].marked_bottom_begin == self.visited_end {
                            self.visited_end = r.blocks[rfnb].begin;
                        }
                        self.pc = BluePc::StateHandled;
                        if budget.tick() {
                            return Step::Yield;
                        }
                        continue;
                    }
                    self.s_prime = r.pred[self.pred_iter].source;
                    self.pc = self.inspect_predecessor(r, sh);
                }
                BluePc::Testing => {
                    // binary search for a transition of s_prime into the splitter
                    if self.begin < self.end {
                        if let Some(spc) = sh.spc {
                            let mid = self.begin + (self.end - self.begin) / 2;
                            let key = r.key_of(r.constln_of(r.succ[mid].target));
                            let spc_key = r.key_of(spc);
                            if spc_key <= key {
                                self.end = r.slice_begin(mid);
                            }
                            if key <= spc_key {
                                self.begin = r.slice_end(mid);
                            }
                        } else {
                            self.begin = self.end;
                        }
                        if budget.tick() {
                            return Step::Yield;
                        }
                        continue;
                    }
                    self.pc = if self.begin != self.end {
                        BluePc::NextPredecessor
                    } else {
                        BluePc::AddBlue
                    };
                }
                BluePc::AddBlue => {
                    r.swap_permutation(r.states[self.s_prime].pos, self.blue_nonbottom_end);
                    self.blue_nonbottom_end += 1;
                    let block = &r.blocks[rfnb];
                    if self.blue_nonbottom_end - block.begin + block.unmarked_bottom_size() > block.size() / 2 {
                        return Step::Abort;
                    }
                    self.pc = BluePc::NextPredecessor;
                }
                BluePc::NextPredecessor => {
                    self.pred_iter += 1;
                    self.pc = BluePc::Predecessor;
                    if budget.tick() {
                        return Step::Yield;
                    }
                }
                BluePc::StateHandled => {
                    if self.visited_end != self.blue_nonbottom_end {
                        self.pc = BluePc::VisitState;
                    } else {
                        self.pc = BluePc::Split;
                    }
                }
                BluePc::Split => {
                    budget.abort_other();
                    return Step::Finished(self.split(r, rfnb));
                }
            }
        }
    }

    /// Decrement `notblue` of the inert predecessor `s_prime` of a blue
    /// state and decide whether it has become blue. Returns where to
    /// continue.
    fn inspect_predecessor(&mut self, r: &mut Refinement, sh: &mut Shared) -> BluePc {
        let rfnb = sh.rfnb;
        let s_prime = self.s_prime;
        if r.states[s_prime].pos >= r.blocks[rfnb].marked_nonbottom_begin {
            return BluePc::NextPredecessor;
        }
        if r.states[s_prime].pos >= sh.notblue_initialised_end {
            let info = &mut r.states[s_prime];
            info.notblue = info.inert_succ_end - info.inert_succ_begin;
            r.swap_permutation(r.states[s_prime].pos, sh.notblue_initialised_end);
            sh.notblue_initialised_end += 1;
        }
        r.states[s_prime].notblue -= 1;
        if r.states[s_prime].notblue != 0 {
            return BluePc::NextPredecessor;
        }
        if !sh.from_red_is_empty {
            if let Some(spc) = sh.spc {
                if r.surely_has_transition_to(s_prime, spc) {
                    return BluePc::NextPredecessor;
                }
                if !r.surely_has_no_transition_to(s_prime, spc) {
                    self.begin = r.states[s_prime].succ_begin;
                    self.end = r.succ_end(s_prime);
                    return BluePc::Testing;
                }
            }
        }
        BluePc::AddBlue
    }

    fn split(&mut self, r: &mut Refinement, rfnb: BlockId) -> BlockId {
        let new_b = r.split_off_blue(rfnb, self.blue_nonbottom_end);
        r.new_blue_block_created(rfnb, new_b);
        for pos in r.blocks[new_b].begin..r.blocks[new_b].end {
            let s = r.permutation[pos];
            for pred_iter in r.states[s].inert_pred_begin..r.pred_end(s) {
                let s_prime = r.pred[pred_iter].source;
                if r.block_of(s_prime) == new_b {
                    continue;
                }
                r.make_noninert(r.pred[pred_iter].succ);
                if r.states[s_prime].inert_succ_begin == r.states[s_prime].inert_succ_end {
                    // new bottom state
                    let block = &mut r.blocks[rfnb];
                    block.marked_nonbottom_begin = block.bottom_begin - 1;
                    block.bottom_begin = block.marked_nonbottom_begin;
                    let bottom_begin = block.bottom_begin;
                    r.swap_permutation(r.states[s_prime].pos, bottom_begin);
                }
            }
        }
        rfnb
    }
}

impl RedSearch {
    fn new() -> Self {
        Self {
            pc: RedPc::Start,
            fromred_visited_begin: 0,
            visited_begin: 0,
            s: 0,
            pred_iter: 0,
        }
    }

    fn resume(&mut self, r: &mut Refinement, sh: &mut Shared, budget: &mut Budget) -> Step {
        let rfnb = sh.rfnb;
        let too_large = |r: &Refinement| r.blocks[rfnb].marked_size() > r.blocks[rfnb].size() / 2;
        loop {
            match self.pc {
                RedPc::Start => {
                    if too_large(r) {
                        return Step::Abort;
                    }
                    match sh.from_red {
                        Some(d) => {
                            self.fromred_visited_begin = r.descriptors[d].end;
                            self.pc = RedPc::CollectFromRed;
                        }
                        None => self.pc = RedPc::StartVisiting,
                    }
                }
                RedPc::CollectFromRed => {
                    let Some(d) = sh.from_red else {
                        self.pc = RedPc::StartVisiting;
                        continue;
                    };
                    if r.descriptors[d].begin == self.fromred_visited_begin {
                        sh.from_red_is_empty = true;
                        self.pc = RedPc::StartVisiting;
                        continue;
                    }
                    self.fromred_visited_begin -= 1;
                    let s = r.source_of(self.fromred_visited_begin);
                    Self::reveal_red(r, sh, s);
                    if r.mark(rfnb, s) && too_large(r) {
                        return Step::Abort;
                    }
                    if budget.tick() {
                        return Step::Yield;
                    }
                }
                RedPc::StartVisiting => {
                    let block = &r.blocks[rfnb];
                    self.visited_begin = if block.marked_bottom_begin == block.end {
                        // only non-bottom states are red so far
                        block.bottom_begin
                    } else {
                        block.end
                    };
                    self.pc = RedPc::VisitState;
                }
                RedPc::VisitState => {
                    self.visited_begin -= 1;
                    self.s = r.permutation[self.visited_begin];
                    self.pred_iter = r.states[self.s].inert_pred_begin;
                    self.pc = RedPc::Predecessor;
                }
                RedPc::Predecessor => {
                    if self.pred_iter == r.pred_end(self.s) {
                        if r.blocks[rfnb].marked_bottom_begin == self.visited_begin {
                            self.visited_begin = r.blocks[rfnb].bottom_begin;
                        }
                        self.pc = RedPc::StateHandled;
                        if budget.tick() {
                            return Step::Yield;
                        }
                        continue;
                    }
                    let s_prime = r.pred[self.pred_iter].source;
                    Self::reveal_red(r, sh, s_prime);
                    if r.mark_nonbottom(rfnb, s_prime) && too_large(r) {
                        return Step::Abort;
                    }
                    self.pred_iter += 1;
                    if budget.tick() {
                        return Step::Yield;
                    }
                }
                RedPc::StateHandled => {
                    if r.blocks[rfnb].marked_nonbottom_begin != self.visited_begin {
                        self.pc = RedPc::VisitState;
                    } else {
                        self.pc = RedPc::Split;
                    }
                }
                RedPc::Split => {
                    budget.abort_other();
                    return Step::Finished(Self::split(r, rfnb, sh.postprocessing));
                }
            }
        }
    }

    /// A state whose `notblue` counter was initialised turned out red.
    fn reveal_red(r: &mut Refinement, sh: &mut Shared, s: StateIdx) {
        if r.states[s].pos < sh.notblue_initialised_end {
            sh.notblue_initialised_end -= 1;
            r.swap_permutation(r.states[s].pos, sh.notblue_initialised_end);
        }
    }

    fn split(r: &mut Refinement, rfnb: BlockId, postprocessing: bool) -> BlockId {
        let red_b = r.split_off_red(rfnb, r.blocks[rfnb].marked_nonbottom_begin);
        r.new_red_block_created(rfnb, red_b, postprocessing);
        // backwards, because new bottom states are swapped behind `pos`
        let mut pos = r.blocks[red_b].bottom_begin;
        while pos != r.blocks[red_b].begin {
            pos -= 1;
            let s = r.permutation[pos];
            for succ_iter in r.states[s].inert_succ_begin..r.states[s].inert_succ_end {
                if r.block_of(r.succ[succ_iter].target) != red_b {
                    r.make_noninert(succ_iter);
                }
            }
            if r.states[s].inert_succ_begin == r.states[s].inert_succ_end {
                let block = &mut r.blocks[red_b];
                block.marked_nonbottom_begin = block.bottom_begin - 1;
                block.bottom_begin = block.marked_nonbottom_begin;
                let bottom_begin = block.bottom_begin;
                r.swap_permutation(r.states[s].pos, bottom_begin);
            }
        }
        red_b
    }
}

impl Refinement {
    fn unmark_bottom(&mut self, b: BlockId) {
        self.blocks[b].marked_bottom_begin = self.blocks[b].end;
    }

    /// Split `rfnb` into the states that can reach `spc` through inert
    /// transitions and the rest. Either some states are marked red, or
    /// `from_red` holds the transitions of `rfnb` into `spc`. Returns the
    /// red block; its old bottom states are marked, new ones unmarked.
    pub fn refine(
        &mut self,
        rfnb: BlockId,
        spc: Option<ConstlnId>,
        from_red: Option<DescId>,
        postprocessing: bool,
    ) -> BlockId {
        if spc == Some(self.blocks[rfnb].constln) {
            let block = &mut self.blocks[rfnb];
            block.marked_nonbottom_begin = block.bottom_begin;
            block.marked_bottom_begin = block.bottom_begin;
            return rfnb;
        }
        let mut shared = Shared {
            rfnb,
            spc,
            from_red,
            postprocessing,
            notblue_initialised_end: self.blocks[rfnb].begin,
            from_red_is_empty: from_red.is_none(),
        };
        let mut blue = BlueSearch::new();
        let mut red = RedSearch::new();
        let mut allowance = 1;
        let mut blue_turn = true;
        loop {
            let mut budget = Budget::turn(allowance);
            let step = if blue_turn {
                blue.resume(self, &mut shared, &mut budget)
            } else {
                red.resume(self, &mut shared, &mut budget)
            };
            match step {
                Step::Finished(red_b) => return red_b,
                Step::Yield => {
                    allowance = next_allowance(allowance);
                    blue_turn = !blue_turn;
                }
                Step::Abort => {
                    let mut budget = Budget::exclusive();
                    let step = if blue_turn {
                        red.resume(self, &mut shared, &mut budget)
                    } else {
                        blue.resume(self, &mut shared, &mut budget)
                    };
                    match step {
                        Step::Finished(red_b) => return red_b,
                        Step::Yield | Step::Abort => unreachable!("both halves of a block exceed half its size"),
                    }
                }
            }
        }
    }

    /// Refine until every constellation consists of a single block.
    pub fn refine_until_stable(&mut self) {
        while let Some(spc) = self.some_nontrivial() {
            let spb = self.split_off_small_block(spc);
            let new_c = self.blocks[spb].constln;
            trace!(block = spb, size = self.blocks[spb].size(), "splitter");
            debug_assert!(self.some_refinable().is_none());

            self.split_inert_to_c(spb);
            // backwards, because marking moves states to visited positions
            let mut pos = self.blocks[spb].end;
            while pos != self.blocks[spb].begin {
                pos -= 1;
                let s = self.permutation[pos];
                for pred_iter in self.states[s].pred_begin..self.states[s].inert_pred_begin {
                    let s_prime = self.pred[pred_iter].source;
                    let b = self.block_of(s_prime);
                    let first_of_block = self.make_refinable(b);
                    let first_of_state = self.mark(b, s_prime);
                    let current = self.change_to_c(pred_iter, first_of_state, first_of_block);
                    self.states[s_prime].current_constln = current;
                }
                if self.split_s_inert_out(s) {
                    self.mark(spb, s);
                }
            }

            // second pass: point the new slices' entries at their last entry
            for pos in self.blocks[spb].begin..self.blocks[spb].end {
                let s = self.permutation[pos];
                for pred_iter in self.states[s].pred_begin..self.states[s].inert_pred_begin {
                    let succ = self.pred[pred_iter].succ;
                    let before_end = self.states[self.pred[pred_iter].source].current_constln - 1;
                    if succ != before_end {
                        self.succ[succ].slice = before_end;
                    }
                }
            }

            // states of the splitter with a transition to the rest of spc
            if self.blocks[spb].marked_size() != 0 {
                if self.blocks[spb].size() == 1 {
                    self.unmark_bottom(spb);
                } else {
                    let red_b = self.refine(spb, Some(spc), None, false);
                    if self.blocks[red_b].unmarked_bottom_size() != 0 {
                        self.postprocess_new_bottom(red_b);
                    } else {
                        self.unmark_bottom(red_b);
                    }
                }
            }

            while let Some(rfnb) = self.some_refinable() {
                self.make_nonrefinable(rfnb);
                if self.blocks[rfnb].size() == 1 {
                    self.unmark_bottom(rfnb);
                    continue;
                }
                let mut red_b = self.refine(rfnb, Some(new_c), None, false);
                if self.blocks[red_b].unmarked_bottom_size() != 0 {
                    match self.postprocess_new_bottom(red_b) {
                        Some(b) => red_b = b,
                        None => continue,
                    }
                } else {
                    self.unmark_bottom(red_b);
                }
                if self.blocks[red_b].size() == 1 {
                    continue;
                }
                let Some(from_red) = self.from_red(red_b, spc) else {
                    continue;
                };
                let red_b = self.refine(red_b, Some(spc), Some(from_red), false);
                if self.blocks[red_b].unmarked_bottom_size() != 0 {
                    self.postprocess_new_bottom(red_b);
                } else {
                    self.unmark_bottom(red_b);
                }
            }
        }
    }

    /// Stabilise a block that got new bottom states. First the states that
    /// can reach an old bottom state are split off; the rest is refined
    /// against every constellation its new bottom states can reach, in
    /// constellation order. Returns the block with the old bottom states,
    /// if there were any.
    fn postprocess_new_bottom(&mut self, red_b: BlockId) -> Option<BlockId> {
        let (result_b, mut rfnb) = if self.blocks[red_b].marked_bottom_size() != 0 {
            let result_b = self.refine(red_b, None, None, false);
            self.unmark_bottom(result_b);
            let rfnb = self.block_of(self.permutation[self.blocks[result_b].begin - 1]);
            (Some(result_b), rfnb)
        } else {
            (None, red_b)
        };
        if self.blocks[rfnb].size() == 1 {
            return result_b;
        }

        // constellations reachable from the new bottom states, by sort key
        let mut reachable: BTreeSet<(usize, ConstlnId)> = BTreeSet::new();
        'restart: loop {
            while let Some(slice) = self.blocks[rfnb].to_constln.first {
                if self.needs_postprocessing(slice) {
                    break;
                }
                let c = self.to_constln(slice);
                reachable.insert((self.key_of(c), c));
                debug_assert_eq!(self.constlns[c].postprocess_begin, self.constlns[c].postprocess_end);
                self.constlns[c].postprocess_begin = self.descriptors[slice].begin;
                self.constlns[c].postprocess_end = self.descriptors[slice].end;
                self.move_to_back(rfnb, slice);
            }
            for pos in self.blocks[rfnb].bottom_begin..self.blocks[rfnb].marked_bottom_begin {
                let s = self.permutation[pos];
                self.states[s].current_constln = self.states[s].succ_begin;
            }

            while let Some(&(_, spc)) = reachable.first() {
                while self.constlns[spc].postprocess_begin != self.constlns[spc].postprocess_end {
                    let b_iter = self.constlns[spc].postprocess_begin;
                    let b = self.block_of(self.source_of(b_iter));
                    let from_red = self.b_to_c[b_iter].slice;
                    self.constlns[spc].postprocess_begin = self.descriptors[from_red].end;
                    self.move_to_front(b, from_red);
                    if self.blocks[b].size() == 1 {
                        continue;
                    }
                    let mut red_b = self.refine(b, Some(spc), Some(from_red), true);
                    for pos in self.blocks[red_b].marked_bottom_begin..self.blocks[red_b].end {
                        let s = self.permutation[pos];
                        let current = self.states[s].current_constln;
                        if current < self.succ_end(s) && self.constln_of(self.succ[current].target) == spc {
                            self.states[s].current_constln = self.slice_end(current);
                        }
                    }
                    if self.blocks[red_b].unmarked_bottom_size() != 0 {
                        if self.blocks[red_b].marked_bottom_size() != 0 {
                            red_b = self.refine(red_b, None, None, true);
                            self.unmark_bottom(red_b);
                            rfnb = self.block_of(self.permutation[self.blocks[red_b].begin - 1]);
                        } else {
                            rfnb = red_b;
                        }
                        if self.blocks[rfnb].size() == 1 {
                            continue;
                        }
                        let new_slice = self.b_to_c[self.constlns[spc].postprocess_begin - 1].slice;
                        debug_assert_eq!(self.from_block(new_slice), rfnb);
                        self.constlns[spc].postprocess_begin = self.descriptors[new_slice].begin;
                        self.move_to_back(rfnb, new_slice);
                        continue 'restart;
                    }
                    self.unmark_bottom(red_b);
                }
                reachable.pop_first();
            }
            return result_b;
        }
    }
}

use indexmap::IndexSet;
use serde::Serialize;

use crate::error::LtsError;

/// Index of a state; states are numbered `0..num_states`.
pub type StateId = usize;
/// Index of an action label.
pub type LabelId = usize;

/// The label of internal steps. Every LTS has it at index 0.
pub const TAU: LabelId = 0;
pub const TAU_NAME: &str = "tau";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Transition {
    pub from: StateId,
    pub label: LabelId,
    pub to: StateId,
}

impl Transition {
    pub fn new(from: StateId, label: LabelId, to: StateId) -> Self {
        Self { from, label, to }
    }
}

/// A labelled transition system with numbered states and named actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lts {
    num_states: usize,
    initial_state: StateId,
    labels: IndexSet<String>,
    transitions: Vec<Transition>,
}

impl Lts {
    pub fn new(num_states: usize, initial_state: StateId) -> Self {
        let mut labels = IndexSet::new();
        labels.insert(TAU_NAME.to_string());
        Self {
            num_states,
            initial_state,
            labels,
            transitions: Vec::new(),
        }
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn set_num_states(&mut self, num_states: usize) {
        self.num_states = num_states;
    }

    pub fn initial_state(&self) -> StateId {
        self.initial_state
    }

    pub fn set_initial_state(&mut self, state: StateId) {
        self.initial_state = state;
    }

    /// Index of the label `name`, adding it if it is new.
    pub fn add_label(&mut self, name: &str) -> LabelId {
        if let Some(id) = self.labels.get_index_of(name) {
            return id;
        }
        self.labels.insert_full(name.to_string()).0
    }

    pub fn label_id(&self, name: &str) -> Option<LabelId> {
        self.labels.get_index_of(name)
    }

    pub fn label_name(&self, label: LabelId) -> &str {
        self.labels.get_index(label).map_or("?", String::as_str)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }

    pub fn is_tau(&self, label: LabelId) -> bool {
        label == TAU
    }

    pub fn add_transition(&mut self, from: StateId, label: LabelId, to: StateId) {
        debug_assert!(from < self.num_states && to < self.num_states);
        debug_assert!(label < self.labels.len());
        self.transitions.push(Transition::new(from, label, to));
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn num_transitions(&self) -> usize {
        self.transitions.len()
    }

    pub fn clear_transitions(&mut self) {
        self.transitions.clear();
    }

    /// Sort the transitions and drop duplicates.
    pub fn normalise_transitions(&mut self) {
        self.transitions.sort_unstable();
        self.transitions.dedup();
    }

    /// Check that the initial state and every transition endpoint exist.
    pub fn validate(&self) -> Result<(), LtsError> {
        let check = |state: StateId| {
            if state < self.num_states {
                Ok(())
            } else {
                Err(LtsError::StateOutOfRange {
                    state,
                    num_states: self.num_states,
                })
            }
        };
        check(self.initial_state)?;
        for t in &self.transitions {
            check(t.from)?;
            check(t.to)?;
        }
        Ok(())
    }

    /// Append the states and transitions of `other`, unifying labels by
    /// name. Returns the number the initial state of `other` got.
    pub fn merge(&mut self, other: &Lts) -> StateId {
        let offset = self.num_states;
        let labels: Vec<LabelId> = other.labels().map(|name| self.add_label(name)).collect();
        self.transitions.extend(
            other
                .transitions
                .iter()
                .map(|t| Transition::new(t.from + offset, labels[t.label], t.to + offset)),
        );
        self.num_states += other.num_states;
        other.initial_state + offset
    }

    pub fn summary(&self) -> LtsSummary {
        LtsSummary {
            states: self.num_states,
            transitions: self.transitions.len(),
            labels: self.labels.len(),
            tau_transitions: self.transitions.iter().filter(|t| t.label == TAU).count(),
            initial_state: self.initial_state,
        }
    }
}

/// Size figures of an LTS, as printed by `procalg info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LtsSummary {
    pub states: usize,
    pub transitions: usize,
    pub labels: usize,
    pub tau_transitions: usize,
    pub initial_state: StateId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tau_is_label_zero() {
        let mut lts = Lts::new(1, 0);
        assert_eq!(lts.label_id("tau"), Some(TAU));
        assert_eq!(lts.add_label("tau"), TAU);
        assert_eq!(lts.add_label("a"), 1);
        assert_eq!(lts.add_label("a"), 1);
        assert_eq!(lts.num_labels(), 2);
    }

    #[test]
    fn merge_unifies_labels_and_shifts_states() {
        let mut left = Lts::new(2, 0);
        let a = left.add_label("a");
        left.add_transition(0, a, 1);

        let mut right = Lts::new(3, 2);
        let b = right.add_label("b");
        let a2 = right.add_label("a");
        right.add_transition(2, b, 0);
        right.add_transition(0, a2, 1);

        let init = left.merge(&right);
        assert_eq!(init, 4);
        assert_eq!(left.num_states(), 5);
        let b_left = left.label_id("b").unwrap();
        assert_eq!(
            left.transitions(),
            &[Transition::new(0, a, 1), Transition::new(4, b_left, 2), Transition::new(2, a, 3)]
        );
    }

    #[test]
    fn validate_reports_dangling_states() {
        let mut lts = Lts::new(2, 0);
        lts.transitions.push(Transition::new(0, TAU, 7));
        assert!(matches!(
            lts.validate(),
            Err(LtsError::StateOutOfRange { state: 7, num_states: 2 })
        ));
    }
}

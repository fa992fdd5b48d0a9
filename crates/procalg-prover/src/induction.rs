//! Structural induction over list-typed variables.

use procalg_data::standard::boolean::{and, implies};
use procalg_data::standard::containers::{cons, empty_list, list_element};
use procalg_data::{DataExpr, Substitution, Variable};
use tracing::debug;

/// Rewrites a proof obligation `P` into `P[[]/x] && (P[t/x] => P[h |> t/x])`
/// for one list variable `x` at a time, in order of first occurrence. `h`
/// and `t` are fresh and implicitly universally quantified, so validity of
/// the result implies validity of `P`.
#[derive(Debug, Clone, Default)]
pub struct Induction {
    formula: Option<DataExpr>,
    list_variables: Vec<Variable>,
    next: usize,
    fresh: usize,
}

impl Induction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialize(&mut self, formula: &DataExpr) {
        self.list_variables = formula
            .free_variables()
            .into_iter()
            .filter(|v| list_element(v.sort()).is_some())
            .collect();
        self.formula = Some(formula.clone());
        self.next = 0;
    }

    pub fn can_apply_induction(&self) -> bool {
        self.formula.is_some() && self.next < self.list_variables.len()
    }

    /// The obligation after one more induction step; `None` once every list
    /// variable has been used.
    pub fn apply_induction(&mut self) -> Option<DataExpr> {
        let formula = self.formula.as_ref()?;
        let x = self.list_variables.get(self.next)?.clone();
        self.next += 1;
        let element = list_element(x.sort())?.clone();

        let id = self.fresh;
        self.fresh += 1;
        let h = Variable::new(&format!("@ind@h{id}"), element.clone());
        let t = Variable::new(&format!("@ind@t{id}"), x.sort().clone());

        let at = |value: DataExpr| formula.substitute(&Substitution::singleton(x.clone(), value));
        let base = at(empty_list(&element));
        let hypothesis = at(t.to_expr());
        let step = at(cons(h.to_expr(), t.to_expr()));
        let result = and(base, implies(hypothesis, step));

        debug!(variable = %x, "induction step");
        self.formula = Some(result.clone());
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procalg_data::standard::equal_to;
    use procalg_data::Sort;

    #[test]
    fn only_list_variables_are_inducted_on() {
        let xs = Variable::new("xs", Sort::list(Sort::nat()));
        let n = Variable::new("n", Sort::nat());
        let p = equal_to(
            cons(n.to_expr(), xs.to_expr()),
            cons(n.to_expr(), xs.to_expr()),
        );
        let mut induction = Induction::new();
        induction.initialize(&p);
        assert!(induction.can_apply_induction());

        let obligation = induction.apply_induction().unwrap();
        assert!(!induction.can_apply_induction());
        assert!(!obligation.occurs(&xs));
        let names: Vec<String> = obligation
            .free_variables()
            .iter()
            .map(|v| v.name().to_string())
            .collect();
        assert_eq!(names, ["n", "@ind@t0", "@ind@h0"]);
    }

    #[test]
    fn formulas_without_lists_are_left_alone() {
        let b = Variable::new("b", Sort::bool_());
        let mut induction = Induction::new();
        induction.initialize(&b.to_expr());
        assert!(!induction.can_apply_induction());
        assert_eq!(induction.apply_induction(), None);
    }
}

//! Enumeration of the solutions of Boolean conditions.
//!
//! The enumerator keeps a frontier of partially instantiated conditions and a
//! stack of solved ones. Variables are eliminated by syntactic equalities
//! where possible and otherwise split over the constructors of their sort,
//! introducing fresh variables for constructor arguments.

use tracing::warn;

use crate::error::EnumerationError;
use crate::rewrite::Rewriter;
use crate::sort::{ContainerKind, Sort};
use crate::spec::NormalisedSpecification;
use crate::standard::{as_equality, boolean};
use crate::term::{DataExpr, Substitution, Variable};

#[derive(Debug, Clone)]
pub struct EnumeratorConfig {
    /// Fresh variables allowed before the first warning.
    pub max_vars_init: usize,
    /// Factor by which the soft budget grows after each warning.
    pub max_vars_factor: usize,
    /// Fresh variables after which enumeration fails.
    pub hard_max_vars: Option<usize>,
}

impl Default for EnumeratorConfig {
    fn default() -> Self {
        Self {
            max_vars_init: 1000,
            max_vars_factor: 5,
            hard_max_vars: None,
        }
    }
}

impl EnumeratorConfig {
    pub fn with_max_vars_init(mut self, n: usize) -> Self {
        self.max_vars_init = n;
        self
    }

    pub fn with_max_vars_factor(mut self, factor: usize) -> Self {
        self.max_vars_factor = factor;
        self
    }

    pub fn with_hard_max_vars(mut self, n: Option<usize>) -> Self {
        self.hard_max_vars = n;
        self
    }
}

/// One valuation of the enumerated variables, with the condition that
/// remains after substituting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumeratorSolution {
    pub condition: DataExpr,
    pub assignments: Vec<(Variable, DataExpr)>,
}

impl EnumeratorSolution {
    pub fn value(&self, v: &Variable) -> Option<&DataExpr> {
        self.assignments.iter().find(|(w, _)| w == v).map(|(_, e)| e)
    }

    pub fn substitution(&self) -> Substitution {
        self.assignments.iter().cloned().collect()
    }
}

/// A partially instantiated condition. `values[i]` is the value chosen for
/// `substituted_vars[i]`; `vars` still need a value.
#[derive(Debug, Clone)]
struct FrontierEntry {
    vars: Vec<Variable>,
    substituted_vars: Vec<Variable>,
    values: Vec<DataExpr>,
    expr: DataExpr,
}

pub struct Enumerator<'a, R: Rewriter + ?Sized> {
    spec: &'a NormalisedSpecification,
    rewriter: &'a R,
    config: EnumeratorConfig,
    max_vars: usize,
    used_vars: usize,
    fresh_index: usize,
    variables: Vec<Variable>,
    condition: Option<DataExpr>,
    frontier: Vec<FrontierEntry>,
    solved: Vec<EnumeratorSolution>,
}

impl<'a, R: Rewriter + ?Sized> Enumerator<'a, R> {
    pub fn new(spec: &'a NormalisedSpecification, rewriter: &'a R) -> Self {
        Self::with_config(spec, rewriter, EnumeratorConfig::default())
    }

    pub fn with_config(
        spec: &'a NormalisedSpecification,
        rewriter: &'a R,
        config: EnumeratorConfig,
    ) -> Self {
        let max_vars = config.max_vars_init;
        Self {
            spec,
            rewriter,
            config,
            max_vars,
            used_vars: 0,
            fresh_index: 0,
            variables: Vec::new(),
            condition: None,
            frontier: Vec::new(),
            solved: Vec::new(),
        }
    }

    /// Start enumerating valuations of `vars` that make `expr` (or its
    /// negation, when `invert` is set) not rewrite to `false`.
    pub fn reset(
        &mut self,
        vars: &[Variable],
        expr: &DataExpr,
        invert: bool,
        is_normal_form: bool,
    ) -> Result<(), EnumerationError> {
        self.frontier.clear();
        self.solved.clear();
        self.used_vars = 0;
        self.max_vars = self.config.max_vars_init;
        self.variables = vars.to_vec();
        self.condition = Some(expr.clone());

        let target = if invert {
            boolean::not(expr.clone())
        } else {
            expr.clone()
        };
        let target = if is_normal_form && !invert {
            target
        } else {
            self.rewriter.rewrite_closed(&target)?
        };
        self.push_split(vars.to_vec(), Vec::new(), Vec::new(), target)
    }

    /// Variables still to be instantiated, per frontier entry, top of the
    /// stack last.
    pub fn frontier_variables(&self) -> Vec<&[Variable]> {
        self.frontier.iter().map(|e| e.vars.as_slice()).collect()
    }

    /// The next solution, `None` once exhausted. Sorts that cannot be
    /// enumerated and an exceeded hard budget are errors.
    pub fn next(&mut self) -> Result<Option<EnumeratorSolution>, EnumerationError> {
        loop {
            if let Some(s) = self.solved.pop() {
                return Ok(Some(s));
            }
            let Some(entry) = self.frontier.pop() else {
                return Ok(None);
            };
            self.split(entry)?;
        }
    }

    /// Like [`next`](Self::next), but when enumeration cannot proceed
    /// `solution_possible` is cleared and `None` is returned instead of an
    /// error.
    pub fn next_or_impossible(
        &mut self,
        solution_possible: &mut bool,
    ) -> Result<Option<EnumeratorSolution>, EnumerationError> {
        match self.next() {
            Ok(s) => Ok(s),
            Err(
                EnumerationError::FunctionSort { .. }
                | EnumerationError::ContainerSort { .. }
                | EnumerationError::NoConstructors { .. }
                | EnumerationError::TooManyVariables { .. },
            ) => {
                *solution_possible = false;
                self.frontier.clear();
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Iterate over the remaining solutions; iteration stops after the first
    /// error.
    pub fn solutions(&mut self) -> Solutions<'_, 'a, R> {
        Solutions {
            enumerator: self,
            failed: false,
        }
    }

    fn fresh_variable(&mut self, sort: &Sort) -> Variable {
        let v = Variable::new(&format!("@enum@{}", self.fresh_index), sort.clone());
        self.fresh_index += 1;
        v
    }

    /// Instantiate the first open variable of `entry` with every constructor
    /// of its sort.
    fn split(&mut self, entry: FrontierEntry) -> Result<(), EnumerationError> {
        let v = entry.vars[0].clone();
        let sort = v.sort().clone();
        if sort.is_function() {
            return Err(EnumerationError::FunctionSort {
                variable: v.name().to_string(),
                sort: sort.to_string(),
            });
        }
        if let Some(kind @ (ContainerKind::Set | ContainerKind::Bag)) = sort.container_kind() {
            return Err(EnumerationError::ContainerSort {
                kind: kind.name(),
                variable: v.name().to_string(),
                sort: sort.to_string(),
            });
        }
        let constructors = self.spec.constructors_of(&sort).to_vec();
        if constructors.is_empty() {
            return Err(EnumerationError::NoConstructors {
                variable: v.name().to_string(),
                sort: sort.to_string(),
            });
        }

        for c in constructors.iter().rev() {
            let fresh: Vec<Variable> = c
                .sort()
                .domain()
                .iter()
                .map(|d| self.fresh_variable(d))
                .collect();
            self.charge(fresh.len(), &entry)?;
            let term = c.apply(fresh.iter().map(Variable::to_expr).collect());
            let sigma = Substitution::singleton(v.clone(), term.clone());
            let expr = self.rewriter.rewrite(&entry.expr, &sigma)?;
            if expr.is_false() {
                continue;
            }
            let mut values: Vec<DataExpr> = entry.values.iter().map(|x| x.substitute(&sigma)).collect();
            values.push(term);
            let mut substituted_vars = entry.substituted_vars.clone();
            substituted_vars.push(v.clone());
            let mut vars = entry.vars[1..].to_vec();
            vars.extend(fresh);
            self.push_split(vars, substituted_vars, values, expr)?;
        }
        Ok(())
    }

    fn charge(&mut self, fresh: usize, entry: &FrontierEntry) -> Result<(), EnumerationError> {
        self.used_vars += fresh;
        if let Some(hard) = self.config.hard_max_vars {
            if self.used_vars > hard {
                let variables: Vec<String> = entry.vars.iter().map(|v| format!("{v:?}")).collect();
                return Err(EnumerationError::TooManyVariables {
                    limit: hard,
                    variables: format!("[{}]", variables.join(", ")),
                    condition: self
                        .condition
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                });
            }
        }
        if self.used_vars > self.max_vars {
            warn!(
                used = self.used_vars,
                condition = %self.condition.as_ref().map(ToString::to_string).unwrap_or_default(),
                "enumeration introduced many variables; the condition may have infinitely many solutions"
            );
            self.max_vars = self.max_vars.saturating_mul(self.config.max_vars_factor.max(2));
        }
        Ok(())
    }

    /// Split `expr` on top-level disjunctions (and on conjunctions under a
    /// negation) and push one entry per part, leftmost part on top.
    fn push_split(
        &mut self,
        vars: Vec<Variable>,
        substituted_vars: Vec<Variable>,
        values: Vec<DataExpr>,
        expr: DataExpr,
    ) -> Result<(), EnumerationError> {
        let mut parts = Vec::new();
        let mut stack = vec![(expr, false)];
        while let Some((e, negated)) = stack.pop() {
            if !negated && boolean::is_or(&e) {
                let args = e.arguments();
                stack.push((args[1].clone(), false));
                stack.push((args[0].clone(), false));
            } else if negated && boolean::is_and(&e) {
                let args = e.arguments();
                stack.push((args[1].clone(), true));
                stack.push((args[0].clone(), true));
            } else if boolean::is_not(&e) {
                stack.push((e.arguments()[0].clone(), !negated));
            } else if negated {
                parts.push(self.rewriter.rewrite_closed(&boolean::not(e))?);
            } else {
                parts.push(e);
            }
        }
        for part in parts.into_iter().rev() {
            self.push_entry(FrontierEntry {
                vars: vars.clone(),
                substituted_vars: substituted_vars.clone(),
                values: values.clone(),
                expr: part,
            })?;
        }
        Ok(())
    }

    /// Eliminate equalities on open variables, then file the entry as solved
    /// or keep it on the frontier.
    fn push_entry(&mut self, mut entry: FrontierEntry) -> Result<(), EnumerationError> {
        if entry.expr.is_false() {
            return Ok(());
        }
        while let Some((v, value)) = find_equality(&entry.expr, &entry.vars) {
            let sigma = Substitution::singleton(v.clone(), value.clone());
            entry.expr = self.rewriter.rewrite(&entry.expr, &sigma)?;
            for x in &mut entry.values {
                *x = x.substitute(&sigma);
            }
            entry.vars.retain(|w| *w != v);
            entry.substituted_vars.push(v);
            entry.values.push(value);
            if entry.expr.is_false() {
                return Ok(());
            }
        }
        if entry.vars.is_empty() {
            let solution = self.solution(&entry)?;
            self.solved.push(solution);
        } else {
            self.frontier.push(entry);
        }
        Ok(())
    }

    fn solution(&self, entry: &FrontierEntry) -> Result<EnumeratorSolution, EnumerationError> {
        let mut assignments = Vec::with_capacity(self.variables.len());
        for v in &self.variables {
            let value = match entry.substituted_vars.iter().position(|w| w == v) {
                Some(i) => self.rewriter.rewrite_closed(&entry.values[i])?,
                None => v.to_expr(),
            };
            assignments.push((v.clone(), value));
        }
        Ok(EnumeratorSolution {
            condition: entry.expr.clone(),
            assignments,
        })
    }
}

/// A conjunct of `expr` that fixes one of `vars`: `v == t` or `t == v` with
/// `v` not occurring in `t`, a bare Boolean `v`, or `!v`.
fn find_equality(expr: &DataExpr, vars: &[Variable]) -> Option<(Variable, DataExpr)> {
    let open = |e: &DataExpr| e.as_variable().filter(|v| vars.contains(v)).cloned();
    for c in boolean::split_and(expr) {
        if let Some((l, r)) = as_equality(&c) {
            if let Some(v) = open(l) {
                if !r.occurs(&v) {
                    return Some((v, r.clone()));
                }
            }
            if let Some(v) = open(r) {
                if !l.occurs(&v) {
                    return Some((v, l.clone()));
                }
            }
        } else if let Some(v) = open(&c) {
            if v.sort().is_bool() {
                return Some((v, boolean::true_()));
            }
        } else if boolean::is_not(&c) {
            if let Some(v) = open(&c.arguments()[0]) {
                return Some((v, boolean::false_()));
            }
        }
    }
    None
}

pub struct Solutions<'e, 'a, R: Rewriter + ?Sized> {
    enumerator: &'e mut Enumerator<'a, R>,
    failed: bool,
}

impl<R: Rewriter + ?Sized> Iterator for Solutions<'_, '_, R> {
    type Item = Result<EnumeratorSolution, EnumerationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.enumerator.next() {
            Ok(s) => s.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::*;
    use crate::proptest_generators::{arb_bool_expr, bool_variables};
    use crate::rewrite::InnermostRewriter;
    use crate::spec::DataSpecification;

    #[test]
    fn boolean_variable_gets_both_values() {
        let spec = DataSpecification::new();
        let normal = spec.normalised().unwrap();
        let rewriter = InnermostRewriter::new(normal);
        let b = Variable::new("b", Sort::bool_());
        let c = Variable::new("c", Sort::bool_());
        let mut e = Enumerator::new(normal, &rewriter);
        e.reset(&[b.clone(), c.clone()], &boolean::or(b.to_expr(), c.to_expr()), false, false)
            .unwrap();
        let solutions: Vec<_> = e.solutions().collect::<Result<_, _>>().unwrap();
        assert!(solutions.iter().all(|s| s.condition.is_true()));
        assert!(solutions.iter().any(|s| s.value(&b) == Some(&boolean::false_())));
    }

    #[test]
    fn function_sorts_cannot_be_enumerated() {
        let spec = DataSpecification::new();
        let normal = spec.normalised().unwrap();
        let rewriter = InnermostRewriter::new(normal);
        let f = Variable::new("f", Sort::function(vec![Sort::bool_()], Sort::bool_()));
        let app = DataExpr::application(f.to_expr(), vec![boolean::true_()]);
        let mut e = Enumerator::new(normal, &rewriter);
        e.reset(&[f.clone()], &app, false, false).unwrap();
        assert!(matches!(e.next(), Err(EnumerationError::FunctionSort { .. })));

        e.reset(&[f], &app, false, false).unwrap();
        let mut possible = true;
        assert_eq!(e.next_or_impossible(&mut possible).unwrap(), None);
        assert!(!possible);
    }

    #[test]
    fn hard_budget_names_the_condition() {
        let spec = DataSpecification::new();
        let normal = spec.normalised().unwrap();
        let rewriter = InnermostRewriter::new(normal);
        let n = Variable::new("n", Sort::nat());
        // n < n has no solution but never simplifies to false before n is
        // fully instantiated, so every split adds fresh variables.
        let cond = crate::standard::numbers::less(n.to_expr(), n.to_expr());
        let config = EnumeratorConfig::default().with_hard_max_vars(Some(20));
        let mut e = Enumerator::with_config(normal, &rewriter, config);
        e.reset(&[n], &cond, false, false).unwrap();
        let err = e.solutions().find_map(Result::err).unwrap();
        assert!(matches!(err, EnumerationError::TooManyVariables { limit: 20, .. }));
    }

    fn truth_table(rewriter: &InnermostRewriter<'_>, vars: &[Variable], e: &DataExpr) -> BTreeSet<Vec<bool>> {
        let mut rows = BTreeSet::new();
        for bits in 0..(1u32 << vars.len()) {
            let row: Vec<bool> = (0..vars.len()).map(|i| bits & (1 << i) != 0).collect();
            let sigma: Substitution = vars.iter().cloned().zip(row.iter().map(|&b| boolean::bool_(b))).collect();
            if rewriter.rewrite(e, &sigma).unwrap().is_true() {
                rows.insert(row);
            }
        }
        rows
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn solutions_match_the_truth_table(e in arb_bool_expr(bool_variables(3), 4)) {
            let spec = DataSpecification::new();
            let normal = spec.normalised().unwrap();
            let rewriter = InnermostRewriter::new(normal);
            let vars = bool_variables(3);

            let mut enumerator = Enumerator::new(normal, &rewriter);
            enumerator.reset(&vars, &e, false, false).unwrap();
            let mut found = BTreeSet::new();
            for s in enumerator.solutions() {
                let s = s.unwrap();
                prop_assert!(s.condition.is_true());
                found.insert(vars.iter().map(|v| s.value(v).unwrap().is_true()).collect::<Vec<_>>());
            }
            prop_assert_eq!(found, truth_table(&rewriter, &vars, &e));
        }
    }
}

//! The EQ-BDD prover.
//!
//! A formula is rewritten to normal form and then split on its smallest
//! Boolean guard: the guard is replaced by `true` and by `false`, both
//! results are rewritten and split in turn, and the two diagrams are joined
//! into a reduced if-then-else. This is repeated until the diagram no longer
//! changes. A formula whose diagram is `true` is a tautology, one whose
//! diagram is `false` a contradiction.

use std::collections::HashMap;
use std::time::Duration;

use procalg_data::standard::boolean::{and, false_, not, true_};
use procalg_data::standard::{as_if, if_};
use procalg_data::{DataExpr, Rewriter, Substitution, TermKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProverError;
use crate::guard::{orient, GuardOrder};
use crate::induction::Induction;
use crate::oracle::{NoOracle, SmtOracle};
use crate::path_eliminator::PathEliminator;
use crate::timeout::Deadline;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProverOptions {
    /// Wall-clock limit per diagram construction; `None` for no limit.
    pub time_limit: Option<Duration>,
    /// Try structural induction over list variables.
    pub apply_induction: bool,
    /// Prune inconsistent paths with the oracle.
    pub path_elimination: bool,
    pub guard_order: GuardOrder,
}

impl ProverOptions {
    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn with_induction(mut self, apply: bool) -> Self {
        self.apply_induction = apply;
        self
    }

    pub fn with_path_elimination(mut self, enabled: bool) -> Self {
        self.path_elimination = enabled;
        self
    }

    pub fn with_guard_order(mut self, order: GuardOrder) -> Self {
        self.guard_order = order;
        self
    }
}

/// Three-valued answer to "is the formula a tautology" and "is it a
/// contradiction".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    Yes,
    No,
    Undefined,
}

/// What the prover concluded about a formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Tautology,
    Contradiction,
    Undetermined,
}

/// `if(guard, then, otherwise)`, or `then` when both branches agree.
pub fn reduced_if(guard: DataExpr, then: DataExpr, otherwise: DataExpr) -> DataExpr {
    if then == otherwise {
        then
    } else {
        if_(guard, then, otherwise)
    }
}

/// Decides Boolean data expressions with EQ-BDDs.
///
/// A fresh prover holds the formula `true`. Answers are computed on first
/// request and cached until the formula or the substitution changes.
pub struct BddProver<'a, R: Rewriter + ?Sized, O: SmtOracle = NoOracle> {
    rewriter: &'a R,
    oracle: O,
    options: ProverOptions,
    sigma: Substitution,
    formula: DataExpr,
    /// The formula the current diagram was built for; differs from
    /// `formula` after induction.
    current: DataExpr,
    bdd: DataExpr,
    answers: Option<(Answer, Answer)>,
    truncated: bool,
    deadline: Deadline,
    formula_to_bdd: HashMap<DataExpr, DataExpr>,
    smallest: HashMap<DataExpr, DataExpr>,
    induction: Induction,
}

impl<'a, R: Rewriter + ?Sized> BddProver<'a, R, NoOracle> {
    pub fn new(rewriter: &'a R, options: ProverOptions) -> Self {
        Self::with_oracle(rewriter, NoOracle, options)
    }
}

impl<'a, R: Rewriter + ?Sized, O: SmtOracle> BddProver<'a, R, O> {
    /// A prover that consults `oracle` when `options.path_elimination` is
    /// set.
    pub fn with_oracle(rewriter: &'a R, oracle: O, options: ProverOptions) -> Self {
        Self {
            rewriter,
            oracle,
            options,
            sigma: Substitution::new(),
            formula: true_(),
            current: true_(),
            bdd: true_(),
            answers: None,
            truncated: false,
            deadline: Deadline::never(),
            formula_to_bdd: HashMap::new(),
            smallest: HashMap::new(),
            induction: Induction::new(),
        }
    }

    pub fn options(&self) -> &ProverOptions {
        &self.options
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn formula(&self) -> &DataExpr {
        &self.formula
    }

    pub fn set_formula(&mut self, formula: DataExpr) {
        self.formula = formula;
        self.answers = None;
    }

    /// Values for free variables of the formula, applied while rewriting.
    /// The values must be in normal form.
    pub fn set_substitution(&mut self, sigma: Substitution) {
        self.sigma = sigma;
        self.answers = None;
    }

    /// Whether the time limit interrupted the construction of the current
    /// diagram.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn is_tautology(&mut self) -> Result<Answer, ProverError> {
        Ok(self.update_answers()?.0)
    }

    pub fn is_contradiction(&mut self) -> Result<Answer, ProverError> {
        Ok(self.update_answers()?.1)
    }

    pub fn answer(&mut self) -> Result<Verdict, ProverError> {
        Ok(match self.update_answers()? {
            (Answer::Yes, _) => Verdict::Tautology,
            (_, Answer::Yes) => Verdict::Contradiction,
            _ => Verdict::Undetermined,
        })
    }

    pub fn bdd(&mut self) -> Result<DataExpr, ProverError> {
        self.update_answers()?;
        Ok(self.bdd.clone())
    }

    /// A conjunction of guards under which the formula holds. `None` when
    /// the formula is a tautology or a contradiction.
    pub fn witness(&mut self) -> Result<Option<DataExpr>, ProverError> {
        self.path_to(true, "witness")
    }

    /// A conjunction of guards under which the formula fails. `None` when
    /// the formula is a tautology or a contradiction.
    pub fn counter_example(&mut self) -> Result<Option<DataExpr>, ProverError> {
        self.path_to(false, "counter-example")
    }

    fn path_to(&mut self, polarity: bool, what: &'static str) -> Result<Option<DataExpr>, ProverError> {
        let answers = self.update_answers()?;
        if answers.0 == Answer::Yes || answers.1 == Answer::Yes {
            return Ok(None);
        }
        if self.truncated {
            return Err(ProverError::TimeLimitExceeded { what });
        }
        Ok(branch(&self.bdd, polarity))
    }

    fn update_answers(&mut self) -> Result<(Answer, Answer), ProverError> {
        if let Some(answers) = self.answers {
            return Ok(answers);
        }
        self.current = self.formula.clone();
        self.build_bdd()?;
        self.eliminate_paths()?;

        let answers = if self.options.apply_induction && !is_leaf(&self.bdd) {
            let original_bdd = self.bdd.clone();
            let original_truncated = self.truncated;
            if self.induct(self.formula.clone())? {
                (Answer::Yes, Answer::No)
            } else {
                self.bdd = original_bdd.clone();
                if self.induct(not(self.formula.clone()))? {
                    self.bdd = false_();
                    (Answer::No, Answer::Yes)
                } else {
                    self.bdd = original_bdd;
                    self.truncated = original_truncated;
                    (Answer::Undefined, Answer::Undefined)
                }
            }
        } else if self.bdd.is_true() {
            (Answer::Yes, Answer::No)
        } else if self.bdd.is_false() {
            (Answer::No, Answer::Yes)
        } else {
            (Answer::Undefined, Answer::Undefined)
        };
        debug!(?answers, "prover answers");
        self.answers = Some(answers);
        Ok(answers)
    }

    /// Apply induction rounds to `formula` until its diagram is `true` or no
    /// list variable is left.
    fn induct(&mut self, formula: DataExpr) -> Result<bool, ProverError> {
        self.induction.initialize(&formula);
        while !self.bdd.is_true() {
            let Some(obligation) = self.induction.apply_induction() else {
                break;
            };
            debug!(formula = %obligation, "applying induction");
            self.current = obligation;
            self.build_bdd()?;
            self.eliminate_paths()?;
        }
        Ok(self.bdd.is_true())
    }

    fn build_bdd(&mut self) -> Result<(), ProverError> {
        self.deadline = Deadline::after(self.options.time_limit);
        self.truncated = false;
        self.formula_to_bdd.clear();
        self.smallest.clear();
        debug!(formula = %self.current, "building BDD");

        let formula = self.current.clone();
        let mut bdd = self.rewrite(&formula)?;
        let mut previous: [Option<DataExpr>; 2] = [None, None];
        let mut iterations = 0usize;
        while previous[0].as_ref() != Some(&bdd) && previous[1].as_ref() != Some(&bdd) {
            previous[1] = previous[0].replace(bdd.clone());
            bdd = self.bdd_down(&bdd)?;
            iterations += 1;
        }
        debug!(iterations, bdd = %bdd, truncated = self.truncated, "BDD built");
        self.bdd = bdd;
        Ok(())
    }

    fn eliminate_paths(&mut self) -> Result<(), ProverError> {
        if !self.options.path_elimination || self.deadline.expired() {
            return Ok(());
        }
        let mut eliminator = PathEliminator::new(&mut self.oracle, self.deadline);
        let simplified = eliminator.simplify(&self.bdd)?;
        self.bdd = simplified;
        Ok(())
    }

    fn rewrite(&self, e: &DataExpr) -> Result<DataExpr, ProverError> {
        let normal = self.rewriter.rewrite(e, &self.sigma)?;
        Ok(orient(&normal, self.options.guard_order))
    }

    fn bdd_down(&mut self, formula: &DataExpr) -> Result<DataExpr, ProverError> {
        if self.deadline.expired() {
            self.truncated = true;
            return Ok(formula.clone());
        }
        if is_leaf(formula) {
            return Ok(formula.clone());
        }
        if let TermKind::Abstraction {
            binder,
            variables,
            body,
        } = formula.kind()
        {
            let body = self.bdd_down(body)?;
            return Ok(DataExpr::abstraction(*binder, variables.clone(), body));
        }
        if let Some(bdd) = self.formula_to_bdd.get(formula) {
            return Ok(bdd.clone());
        }
        let Some(guard) = self.smallest(formula) else {
            return Ok(formula.clone());
        };

        let then = self.rewrite(&formula.replace(&guard, &true_()))?;
        let then = self.bdd_down(&then)?;
        let otherwise = self.rewrite(&formula.replace(&guard, &false_()))?;
        let otherwise = self.bdd_down(&otherwise)?;

        let bdd = reduced_if(guard, then, otherwise);
        self.formula_to_bdd.insert(formula.clone(), bdd.clone());
        Ok(bdd)
    }

    /// The smallest Boolean subterm of `e` outside abstractions. Bound
    /// variables would escape their binder if a guard were taken from under
    /// one.
    fn smallest(&mut self, e: &DataExpr) -> Option<DataExpr> {
        match e.kind() {
            TermKind::Variable(v) => v.sort().is_bool().then(|| e.clone()),
            TermKind::Function(f) => {
                (f.sort().is_bool() && !is_leaf(e)).then(|| e.clone())
            }
            TermKind::Abstraction { .. } => None,
            TermKind::Application { arguments, .. } => {
                if let Some(s) = self.smallest.get(e) {
                    return Some(s.clone());
                }
                let order = self.options.guard_order;
                let mut result: Option<DataExpr> = None;
                for a in arguments {
                    if let Some(s) = self.smallest(a) {
                        result = Some(match result {
                            Some(r) => order.min(r, s),
                            None => s,
                        });
                    }
                }
                match result {
                    Some(r) => {
                        self.smallest.insert(e.clone(), r.clone());
                        Some(r)
                    }
                    None => e.sort().is_bool().then(|| e.clone()),
                }
            }
        }
    }
}

fn is_leaf(e: &DataExpr) -> bool {
    e.is_true() || e.is_false()
}

fn lazy_and(a: DataExpr, b: DataExpr) -> DataExpr {
    if a.is_true() {
        b
    } else if b.is_true() {
        a
    } else {
        and(a, b)
    }
}

/// The guards along the first path to a leaf of the given polarity.
fn branch(bdd: &DataExpr, polarity: bool) -> Option<DataExpr> {
    match as_if(bdd) {
        Some((guard, then, otherwise)) => {
            if let Some(path) = branch(then, polarity) {
                return Some(lazy_and(path, guard.clone()));
            }
            branch(otherwise, polarity).map(|path| lazy_and(path, not(guard.clone())))
        }
        None => ((bdd.is_true() && polarity) || (bdd.is_false() && !polarity)).then(true_),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procalg_data::parse::{parse_data_expression, parse_variables};
    use procalg_data::standard::boolean::bool_;
    use procalg_data::{DataSpecification, InnermostRewriter, Variable};

    type Prover = BddProver<'static, InnermostRewriter<'static>>;

    fn rewriter() -> &'static InnermostRewriter<'static> {
        let spec: &'static DataSpecification = Box::leak(Box::new(DataSpecification::new()));
        Box::leak(Box::new(InnermostRewriter::new(spec.normalised().unwrap())))
    }

    fn prover(vars: &str, formula: &str, options: ProverOptions) -> (Prover, Vec<Variable>) {
        let r = rewriter();
        let normal = r.specification();
        let vars = parse_variables(vars, normal, "vars").unwrap();
        let e = parse_data_expression(formula, normal, &vars, "formula").unwrap();
        let mut p = BddProver::new(r, options);
        p.set_formula(e);
        (p, vars)
    }

    #[test]
    fn excluded_middle_is_a_tautology() {
        let (mut p, _) = prover("b: Bool", "b || !b", ProverOptions::default());
        assert_eq!(p.is_tautology().unwrap(), Answer::Yes);
        assert_eq!(p.is_contradiction().unwrap(), Answer::No);
        assert_eq!(p.answer().unwrap(), Verdict::Tautology);
        assert_eq!(p.witness().unwrap(), None);
        assert_eq!(p.counter_example().unwrap(), None);
    }

    #[test]
    fn contradictions_reduce_to_false() {
        let (mut p, _) = prover("b, c: Bool", "(b => c) && b && !c", ProverOptions::default());
        assert_eq!(p.answer().unwrap(), Verdict::Contradiction);
        assert!(p.bdd().unwrap().is_false());
    }

    #[test]
    fn witnesses_satisfy_the_formula() {
        let (mut p, vars) = prover("b0, b1: Bool", "b0 && !b1", ProverOptions::default());
        let r = rewriter();
        assert_eq!(p.answer().unwrap(), Verdict::Undetermined);
        let formula = p.formula().clone();
        let witness = p.witness().unwrap().unwrap();
        let counter = p.counter_example().unwrap().unwrap();
        for row in 0..4u32 {
            let sigma: Substitution = vars
                .iter()
                .enumerate()
                .map(|(i, v)| (v.clone(), bool_(row & (1 << i) != 0)))
                .collect();
            let holds = r.rewrite(&formula, &sigma).unwrap().is_true();
            if r.rewrite(&witness, &sigma).unwrap().is_true() {
                assert!(holds);
            }
            if r.rewrite(&counter, &sigma).unwrap().is_true() {
                assert!(!holds);
            }
        }
    }

    #[test]
    fn diagrams_are_reduced() {
        let (mut p, vars) = prover("b, c: Bool", "(b && c) || (!b && c)", ProverOptions::default());
        let c = vars[1].to_expr();
        assert_eq!(p.bdd().unwrap(), if_(c, true_(), false_()));
    }

    #[test]
    fn time_limit_yields_undetermined() {
        let options = ProverOptions::default().with_time_limit(Some(Duration::ZERO));
        let (mut p, _) = prover("b0, b1: Bool", "b0 && !b1", options);
        assert_eq!(p.answer().unwrap(), Verdict::Undetermined);
        assert!(p.truncated());
        assert!(matches!(
            p.witness(),
            Err(ProverError::TimeLimitExceeded { what: "witness" })
        ));
    }

    #[test]
    fn substitutions_are_applied() {
        let (mut p, vars) = prover("b0, b1: Bool", "b0 && !b1", ProverOptions::default());
        p.set_substitution(vars.iter().map(|v| (v.clone(), bool_(v.name() == "b0"))).collect());
        assert_eq!(p.answer().unwrap(), Verdict::Tautology);
        p.set_substitution(Substitution::new());
        assert_eq!(p.answer().unwrap(), Verdict::Undetermined);
    }
}

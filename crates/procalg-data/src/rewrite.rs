//! The rewriter interface and an innermost reference implementation.

use std::cell::Cell;
use std::collections::HashMap;

use tracing::trace;

use crate::enumerate::{Enumerator, EnumeratorConfig};
use crate::equation::DataEquation;
use crate::error::{EnumerationError, RewriteError};
use crate::spec::NormalisedSpecification;
use crate::standard::{as_if, boolean};
use crate::term::{Binder, DataExpr, FunctionSymbol, Substitution, TermKind, Variable};

/// Computes normal forms with respect to the equations of a data
/// specification. Implementations are expected to be confluent and
/// terminating for the equations they are given; nothing here checks that.
pub trait Rewriter {
    /// The normal form of `expr` with `sigma` applied. Values in `sigma`
    /// must already be in normal form.
    fn rewrite(&self, expr: &DataExpr, sigma: &Substitution) -> Result<DataExpr, RewriteError>;

    /// Convert into the representation the rewriter works on.
    fn to_rewrite_format(&self, expr: &DataExpr) -> DataExpr {
        expr.clone()
    }

    /// Convert a rewrite result back into a plain data expression.
    fn from_rewrite_format(&self, expr: &DataExpr) -> DataExpr {
        expr.clone()
    }

    fn rewrite_closed(&self, expr: &DataExpr) -> Result<DataExpr, RewriteError> {
        self.rewrite(expr, &Substitution::new())
    }
}

impl<R: Rewriter + ?Sized> Rewriter for &R {
    fn rewrite(&self, expr: &DataExpr, sigma: &Substitution) -> Result<DataExpr, RewriteError> {
        (**self).rewrite(expr, sigma)
    }

    fn to_rewrite_format(&self, expr: &DataExpr) -> DataExpr {
        (**self).to_rewrite_format(expr)
    }

    fn from_rewrite_format(&self, expr: &DataExpr) -> DataExpr {
        (**self).from_rewrite_format(expr)
    }
}

#[derive(Debug, Clone)]
pub struct RewriterConfig {
    /// Rule applications allowed per top-level call.
    pub max_steps: usize,
}

impl Default for RewriterConfig {
    fn default() -> Self {
        Self { max_steps: 1_000_000 }
    }
}

impl RewriterConfig {
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

/// Innermost rewriting with the first matching equation.
///
/// Equations are indexed by the function symbol at the head of their left
/// hand side and tried in declaration order. Left-hand sides may be
/// nonlinear. Conditional equations fire when their condition rewrites to
/// `true`. `if` is evaluated lazily, lambda applications are beta reduced and
/// quantifiers over certainly finite sorts are eliminated by enumeration.
pub struct InnermostRewriter<'a> {
    spec: &'a NormalisedSpecification,
    rules: HashMap<FunctionSymbol, Vec<DataEquation>>,
    config: RewriterConfig,
    steps: Cell<usize>,
    depth: Cell<usize>,
}

impl<'a> InnermostRewriter<'a> {
    pub fn new(spec: &'a NormalisedSpecification) -> Self {
        Self::with_config(spec, RewriterConfig::default())
    }

    pub fn with_config(spec: &'a NormalisedSpecification, config: RewriterConfig) -> Self {
        let mut rules: HashMap<FunctionSymbol, Vec<DataEquation>> = HashMap::new();
        for e in spec.equations() {
            if let Some(head) = e.lhs.head_symbol() {
                rules.entry(head.clone()).or_default().push(e.clone());
            }
        }
        Self {
            spec,
            rules,
            config,
            steps: Cell::new(0),
            depth: Cell::new(0),
        }
    }

    pub fn specification(&self) -> &'a NormalisedSpecification {
        self.spec
    }

    /// Rule applications performed by the last top-level call.
    pub fn steps(&self) -> usize {
        self.steps.get()
    }

    fn step(&self, term: &DataExpr) -> Result<(), RewriteError> {
        let n = self.steps.get() + 1;
        if n > self.config.max_steps {
            return Err(RewriteError::StepLimit {
                limit: self.config.max_steps,
                term: term.to_string(),
            });
        }
        self.steps.set(n);
        Ok(())
    }

    fn normalise(&self, t: &DataExpr, sigma: &Substitution) -> Result<DataExpr, RewriteError> {
        match t.kind() {
            TermKind::Variable(v) => Ok(sigma.get(v).cloned().unwrap_or_else(|| t.clone())),
            TermKind::Function(_) => self.apply_rules(t.clone()),
            TermKind::Application { head, arguments } => {
                if let Some((c, then, otherwise)) = as_if(t) {
                    let c = self.normalise(c, sigma)?;
                    if c.is_true() {
                        return self.normalise(then, sigma);
                    }
                    if c.is_false() {
                        return self.normalise(otherwise, sigma);
                    }
                    let then = self.normalise(then, sigma)?;
                    let otherwise = self.normalise(otherwise, sigma)?;
                    let f = head.clone();
                    return self.apply_rules(DataExpr::application(f, vec![c, then, otherwise]));
                }
                let head = self.normalise(head, sigma)?;
                let arguments = arguments
                    .iter()
                    .map(|a| self.normalise(a, sigma))
                    .collect::<Result<Vec<_>, _>>()?;
                if let TermKind::Abstraction {
                    binder: Binder::Lambda,
                    variables,
                    body,
                } = head.kind()
                {
                    if variables.len() == arguments.len() {
                        self.step(t)?;
                        let beta: Substitution =
                            variables.iter().cloned().zip(arguments).collect();
                        return self.normalise(body, &beta);
                    }
                }
                self.apply_rules(DataExpr::application(head, arguments))
            }
            TermKind::Abstraction {
                binder,
                variables,
                body,
            } => {
                let mut inner = sigma.clone();
                for v in variables {
                    inner.remove(v);
                }
                let body = self.normalise(body, &inner)?;
                match binder {
                    Binder::Lambda => Ok(DataExpr::abstraction(*binder, variables.clone(), body)),
                    Binder::Forall | Binder::Exists => {
                        if body.is_true() || body.is_false() {
                            return Ok(body);
                        }
                        self.eliminate_quantifier(*binder, variables, body)
                    }
                }
            }
        }
    }

    /// Replace a quantifier over certainly finite sorts by the disjunction
    /// (or negated disjunction) of the enumerated residual conditions.
    fn eliminate_quantifier(
        &self,
        binder: Binder,
        variables: &[Variable],
        body: DataExpr,
    ) -> Result<DataExpr, RewriteError> {
        let bound: Vec<Variable> = variables.iter().filter(|v| body.occurs(v)).cloned().collect();
        if bound.is_empty() {
            return Ok(body);
        }
        if !bound.iter().all(|v| self.spec.is_certainly_finite(v.sort())) {
            return Ok(DataExpr::abstraction(binder, variables.to_vec(), body));
        }
        let invert = binder == Binder::Forall;
        let mut enumerator = Enumerator::with_config(self.spec, self, EnumeratorConfig::default());
        let mut conditions = Vec::new();
        let outcome = enumerator.reset(&bound, &body, invert, true).and_then(|()| {
            while let Some(solution) = enumerator.next()? {
                if solution.condition.is_true() {
                    conditions = vec![solution.condition];
                    break;
                }
                conditions.push(solution.condition);
            }
            Ok(())
        });
        match outcome {
            Ok(()) => {}
            Err(EnumerationError::Rewrite(e)) => return Err(e),
            Err(e) => {
                trace!(error = %e, "keeping quantifier that cannot be enumerated");
                return Ok(DataExpr::abstraction(binder, variables.to_vec(), body));
            }
        }
        let disjunction = self.normalise(&boolean::join_or(conditions), &Substitution::new())?;
        if invert {
            self.normalise(&boolean::not(disjunction), &Substitution::new())
        } else {
            Ok(disjunction)
        }
    }

    fn apply_rules(&self, t: DataExpr) -> Result<DataExpr, RewriteError> {
        let Some(rules) = t.head_symbol().and_then(|f| self.rules.get(f)) else {
            return Ok(t);
        };
        for rule in rules {
            let mut m = Substitution::new();
            if !match_pattern(&rule.lhs, &t, &mut m) {
                continue;
            }
            if rule.is_conditional() && !self.normalise(&rule.condition, &m)?.is_true() {
                continue;
            }
            self.step(&t)?;
            return self.normalise(&rule.rhs, &m);
        }
        Ok(t)
    }
}

/// Match `pattern` against `term`, extending `m`. Repeated pattern variables
/// must match identical subterms.
fn match_pattern(pattern: &DataExpr, term: &DataExpr, m: &mut Substitution) -> bool {
    match pattern.kind() {
        TermKind::Variable(v) => match m.get(v) {
            Some(bound) => bound == term,
            None => {
                if *v.sort() != term.sort() {
                    return false;
                }
                m.insert(v.clone(), term.clone());
                true
            }
        },
        TermKind::Function(_) | TermKind::Abstraction { .. } => pattern == term,
        TermKind::Application { head, arguments } => match term.kind() {
            TermKind::Application {
                head: term_head,
                arguments: term_arguments,
            } => {
                arguments.len() == term_arguments.len()
                    && match_pattern(head, term_head, m)
                    && arguments
                        .iter()
                        .zip(term_arguments)
                        .all(|(p, a)| match_pattern(p, a, m))
            }
            _ => false,
        },
    }
}

impl Rewriter for InnermostRewriter<'_> {
    fn rewrite(&self, expr: &DataExpr, sigma: &Substitution) -> Result<DataExpr, RewriteError> {
        let depth = self.depth.get();
        if depth == 0 {
            self.steps.set(0);
        }
        self.depth.set(depth + 1);
        let result = self.normalise(expr, sigma);
        self.depth.set(depth);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{parse_data_expression, parse_specification};
    use crate::standard::numbers::{integer_value, nat, plus};

    fn rewrite_in(spec_text: &str, expr: &str) -> DataExpr {
        let spec = parse_specification(spec_text, "test.spec").unwrap();
        let normal = spec.normalised().unwrap();
        let e = parse_data_expression(expr, normal, &[], "expr").unwrap();
        InnermostRewriter::new(normal).rewrite_closed(&e).unwrap()
    }

    #[test]
    fn numbers_add_up() {
        let spec = parse_specification("", "empty").unwrap();
        let normal = spec.normalised().unwrap();
        let r = InnermostRewriter::new(normal);
        let sum = r.rewrite_closed(&plus(nat(19), nat(23))).unwrap();
        assert_eq!(integer_value(&sum), Some(42));
    }

    #[test]
    fn user_equations_and_lazy_if() {
        let text = "sort Color = struct red | green | blue;
                    map next: Color -> Color;
                    var c: Color;
                    eqn next(red) = green; next(green) = blue; next(blue) = red;";
        assert_eq!(rewrite_in(text, "next(next(red))").to_string(), "blue");
        assert_eq!(rewrite_in(text, "if(red == blue, 1, 2)").to_string(), "2");
    }

    #[test]
    fn finite_quantifiers_are_eliminated() {
        assert!(rewrite_in("", "forall b: Bool. b || !b").is_true());
        assert!(rewrite_in("", "exists b: Bool. b && !b").is_false());
        assert!(rewrite_in("", "exists b: Bool, c: Bool. b && !c").is_true());
    }

    #[test]
    fn step_limit_reports_non_termination() {
        let text = "map f: Nat -> Nat; var n: Nat; eqn f(n) = f(n + 1);";
        let spec = parse_specification(text, "loop.spec").unwrap();
        let normal = spec.normalised().unwrap();
        let e = parse_data_expression("f(0)", normal, &[], "expr").unwrap();
        let r = InnermostRewriter::with_config(normal, RewriterConfig::default().with_max_steps(500));
        assert!(matches!(r.rewrite_closed(&e), Err(RewriteError::StepLimit { limit: 500, .. })));
    }

    #[test]
    fn beta_reduction() {
        assert_eq!(rewrite_in("", "(lambda n: Nat. n + n)(2)").to_string(), "4");
    }
}

//! Satisfiability oracles for conjunctions of guards.

use procalg_data::standard::boolean::join_and;
use procalg_data::{EnumeratorConfig, Enumerator, NormalisedSpecification, Rewriter, Variable};
use procalg_data::DataExpr;
use tracing::trace;

use crate::error::SmtError;

/// Decides whether a conjunction of Boolean guards has a model. An oracle
/// that cannot tell must answer `true`: a wrong `false` prunes reachable
/// paths and makes the prover unsound.
pub trait SmtOracle {
    fn is_satisfiable(&mut self, guards: &[DataExpr]) -> Result<bool, SmtError>;
}

impl<O: SmtOracle + ?Sized> SmtOracle for &mut O {
    fn is_satisfiable(&mut self, guards: &[DataExpr]) -> Result<bool, SmtError> {
        (**self).is_satisfiable(guards)
    }
}

impl<O: SmtOracle + ?Sized> SmtOracle for Box<O> {
    fn is_satisfiable(&mut self, guards: &[DataExpr]) -> Result<bool, SmtError> {
        (**self).is_satisfiable(guards)
    }
}

/// The oracle that knows nothing; every path stays.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOracle;

impl SmtOracle for NoOracle {
    fn is_satisfiable(&mut self, _guards: &[DataExpr]) -> Result<bool, SmtError> {
        Ok(true)
    }
}

/// Decides satisfiability by enumerating the free variables of certainly
/// finite sorts. Variables of other sorts stay symbolic, so a conjunction
/// over them is reported unsatisfiable only when it rewrites to `false`.
pub struct EnumerationOracle<'a, R: Rewriter + ?Sized> {
    spec: &'a NormalisedSpecification,
    rewriter: &'a R,
    config: EnumeratorConfig,
}

impl<'a, R: Rewriter + ?Sized> EnumerationOracle<'a, R> {
    pub fn new(spec: &'a NormalisedSpecification, rewriter: &'a R) -> Self {
        Self {
            spec,
            rewriter,
            config: EnumeratorConfig::default().with_hard_max_vars(Some(10_000)),
        }
    }

    pub fn with_config(mut self, config: EnumeratorConfig) -> Self {
        self.config = config;
        self
    }
}

impl<R: Rewriter + ?Sized> SmtOracle for EnumerationOracle<'_, R> {
    fn is_satisfiable(&mut self, guards: &[DataExpr]) -> Result<bool, SmtError> {
        let conjunction = join_and(guards.iter().cloned());
        let finite: Vec<Variable> = conjunction
            .free_variables()
            .into_iter()
            .filter(|v| self.spec.is_certainly_finite(v.sort()))
            .collect();
        if finite.is_empty() {
            let normal = self
                .rewriter
                .rewrite_closed(&conjunction)
                .map_err(procalg_data::EnumerationError::from)?;
            return Ok(!normal.is_false());
        }

        let variables = self.spec.order_variables_to_optimise_enumeration(&finite);
        let mut enumerator = Enumerator::with_config(self.spec, self.rewriter, self.config.clone());
        enumerator.reset(&variables, &conjunction, false, false)?;
        let mut possible = true;
        let found = enumerator.next_or_impossible(&mut possible)?.is_some();
        trace!(guards = guards.len(), found, possible, "enumeration oracle");
        Ok(found || !possible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procalg_data::parse::{parse_data_expression, parse_specification};
    use procalg_data::{InnermostRewriter, Sort};

    #[test]
    fn enumerates_finite_sorts() {
        let spec = parse_specification("sort Color = struct red | green | blue;", "c.spec").unwrap();
        let normal = spec.normalised().unwrap();
        let rewriter = InnermostRewriter::new(normal);
        let c = Variable::new("c", Sort::basic("Color"));
        let vars = [c];
        let parse = |s: &str| parse_data_expression(s, normal, &vars, "g").unwrap();

        let mut oracle = EnumerationOracle::new(normal, &rewriter);
        assert!(oracle.is_satisfiable(&[parse("c != red"), parse("c != green")]).unwrap());
        assert!(!oracle.is_satisfiable(&[parse("c == red"), parse("c == green")]).unwrap());
        assert!(oracle.is_satisfiable(&[]).unwrap());
    }

    #[test]
    fn infinite_sorts_are_assumed_satisfiable() {
        let spec = procalg_data::DataSpecification::new();
        let normal = spec.normalised().unwrap();
        let rewriter = InnermostRewriter::new(normal);
        let vars = [Variable::new("n", Sort::nat())];
        let g = parse_data_expression("n < 2 && n > 3", normal, &vars, "g").unwrap();
        let mut oracle = EnumerationOracle::new(normal, &rewriter);
        assert!(oracle.is_satisfiable(&[g]).unwrap());
        let f = parse_data_expression("n < 0", normal, &vars, "g").unwrap();
        assert!(!oracle.is_satisfiable(&[f]).unwrap());
    }
}

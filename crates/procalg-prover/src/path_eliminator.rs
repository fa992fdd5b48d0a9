//! Removal of inconsistent paths from EQ-BDDs.

use procalg_data::standard::as_if;
use procalg_data::standard::boolean::not;
use procalg_data::DataExpr;
use tracing::debug;

use crate::bdd::reduced_if;
use crate::error::SmtError;
use crate::oracle::SmtOracle;
use crate::timeout::Deadline;

/// Walks a BDD keeping the guards along the current path, and drops every
/// branch whose path condition the oracle proves unsatisfiable.
pub struct PathEliminator<'o, O: SmtOracle + ?Sized> {
    oracle: &'o mut O,
    deadline: Deadline,
    pruned: usize,
}

impl<'o, O: SmtOracle + ?Sized> PathEliminator<'o, O> {
    pub fn new(oracle: &'o mut O, deadline: Deadline) -> Self {
        Self {
            oracle,
            deadline,
            pruned: 0,
        }
    }

    /// Branches removed so far.
    pub fn pruned(&self) -> usize {
        self.pruned
    }

    pub fn simplify(&mut self, bdd: &DataExpr) -> Result<DataExpr, SmtError> {
        let result = self.aux(bdd, &mut Vec::new())?;
        debug!(pruned = self.pruned, "path elimination");
        Ok(result)
    }

    fn aux(&mut self, bdd: &DataExpr, path: &mut Vec<DataExpr>) -> Result<DataExpr, SmtError> {
        if self.deadline.expired() {
            return Ok(bdd.clone());
        }
        let Some((guard, then, otherwise)) = as_if(bdd) else {
            return Ok(bdd.clone());
        };
        let negated = not(guard.clone());

        path.push(guard.clone());
        let then_possible = self.oracle.is_satisfiable(path)?;
        path.pop();
        if !then_possible {
            self.pruned += 1;
            return self.under(otherwise, path, negated);
        }

        path.push(negated.clone());
        let otherwise_possible = self.oracle.is_satisfiable(path)?;
        path.pop();
        if !otherwise_possible {
            self.pruned += 1;
            return self.under(then, path, guard.clone());
        }

        let then = self.under(then, path, guard.clone())?;
        let otherwise = self.under(otherwise, path, negated)?;
        Ok(reduced_if(guard.clone(), then, otherwise))
    }

    fn under(
        &mut self,
        bdd: &DataExpr,
        path: &mut Vec<DataExpr>,
        condition: DataExpr,
    ) -> Result<DataExpr, SmtError> {
        path.push(condition);
        let result = self.aux(bdd, path);
        path.pop();
        result
    }
}

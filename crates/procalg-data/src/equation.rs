use std::fmt;

use crate::standard::boolean;
use crate::term::{DataExpr, Variable};

/// A conditional rewrite equation `condition -> lhs = rhs` over `variables`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataEquation {
    pub variables: Vec<Variable>,
    pub condition: DataExpr,
    pub lhs: DataExpr,
    pub rhs: DataExpr,
}

impl DataEquation {
    /// An unconditional equation whose variables are the free variables of
    /// both sides.
    pub fn new(lhs: DataExpr, rhs: DataExpr) -> Self {
        Self::conditional(boolean::true_(), lhs, rhs)
    }

    pub fn conditional(condition: DataExpr, lhs: DataExpr, rhs: DataExpr) -> Self {
        let mut variables = lhs.free_variables();
        variables.extend(rhs.free_variables());
        variables.extend(condition.free_variables());
        Self {
            variables: variables.into_iter().collect(),
            condition,
            lhs,
            rhs,
        }
    }

    pub fn with_variables(
        variables: Vec<Variable>,
        condition: DataExpr,
        lhs: DataExpr,
        rhs: DataExpr,
    ) -> Self {
        Self {
            variables,
            condition,
            lhs,
            rhs,
        }
    }

    pub fn is_conditional(&self) -> bool {
        !self.condition.is_true()
    }

    pub fn map_expressions(&self, f: &mut dyn FnMut(&DataExpr) -> DataExpr) -> Self {
        let variables = self
            .variables
            .iter()
            .map(|v| match f(&v.to_expr()).as_variable() {
                Some(w) => w.clone(),
                None => v.clone(),
            })
            .collect();
        Self {
            variables,
            condition: f(&self.condition),
            lhs: f(&self.lhs),
            rhs: f(&self.rhs),
        }
    }
}

impl fmt::Display for DataEquation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_conditional() {
            write!(f, "{} -> ", self.condition)?;
        }
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}

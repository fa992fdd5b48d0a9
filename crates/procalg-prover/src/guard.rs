//! Guard ordering and orientation of equalities.

use std::cmp::Ordering;

use procalg_data::standard::{as_equality, equal_to};
use procalg_data::{DataExpr, TermKind};
use serde::{Deserialize, Serialize};

/// The total order in which the prover picks guards to branch on. The
/// order affects the size of the diagrams, not the answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GuardOrder {
    /// Smaller terms first, ties broken by the structural order.
    #[default]
    SizeThenStructure,
    /// The reverse of [`GuardOrder::SizeThenStructure`].
    Reverse,
}

impl GuardOrder {
    pub fn compare(self, a: &DataExpr, b: &DataExpr) -> Ordering {
        let forward = a.size().cmp(&b.size()).then_with(|| a.cmp(b));
        match self {
            GuardOrder::SizeThenStructure => forward,
            GuardOrder::Reverse => forward.reverse(),
        }
    }

    /// The smaller of two guards.
    pub fn min(self, a: DataExpr, b: DataExpr) -> DataExpr {
        if self.compare(&b, &a) == Ordering::Less {
            b
        } else {
            a
        }
    }
}

/// Put the greater side of every equality on the left, so that `x == y`
/// and `y == x` become the same guard.
pub fn orient(e: &DataExpr, order: GuardOrder) -> DataExpr {
    match e.kind() {
        TermKind::Variable(_) | TermKind::Function(_) => e.clone(),
        TermKind::Abstraction {
            binder,
            variables,
            body,
        } => DataExpr::abstraction(*binder, variables.clone(), orient(body, order)),
        TermKind::Application { head, arguments } => {
            let oriented = DataExpr::application(
                orient(head, order),
                arguments.iter().map(|a| orient(a, order)).collect(),
            );
            match as_equality(&oriented) {
                Some((lhs, rhs)) if order.compare(lhs, rhs) == Ordering::Less => {
                    equal_to(rhs.clone(), lhs.clone())
                }
                _ => oriented,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procalg_data::standard::numbers::nat;
    use procalg_data::{Sort, Variable};

    #[test]
    fn equalities_get_one_orientation() {
        let x = Variable::new("x", Sort::nat()).to_expr();
        let a = orient(&equal_to(x.clone(), nat(5)), GuardOrder::default());
        let b = orient(&equal_to(nat(5), x.clone()), GuardOrder::default());
        assert_eq!(a, b);
        assert_eq!(a.arguments()[0], nat(5));
    }

    #[test]
    fn smaller_terms_come_first() {
        let x = Variable::new("x", Sort::bool_()).to_expr();
        let big = equal_to(nat(7), nat(8));
        let order = GuardOrder::default();
        assert_eq!(order.min(big.clone(), x.clone()), x);
        assert_eq!(GuardOrder::Reverse.min(big.clone(), x), big);
    }
}

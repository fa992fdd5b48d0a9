//! Proptest strategies for Boolean data expressions.

use proptest::prelude::*;

use crate::sort::Sort;
use crate::standard::boolean::{and, bool_, implies, not, or};
use crate::standard::equal_to;
use crate::standard::numbers::{less, nat};
use crate::term::{DataExpr, Variable};

/// The Boolean variables `b0..bn`.
pub fn bool_variables(n: usize) -> Vec<Variable> {
    (0..n).map(|i| Variable::new(&format!("b{i}"), Sort::bool_())).collect()
}

/// Strategy for Boolean expressions built from `variables`, `true`,
/// `false` and the connectives `!`, `&&`, `||`, `=>` and `==`.
///
/// Generated expressions have:
/// - at most `depth` nested connectives
/// - only the given variables free
pub fn arb_bool_expr(variables: Vec<Variable>, depth: u32) -> impl Strategy<Value = DataExpr> {
    let leaf = prop_oneof![
        1 => any::<bool>().prop_map(bool_),
        4 => proptest::sample::select(variables).prop_map(|v| v.to_expr()),
    ];
    leaf.prop_recursive(depth, 64, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(not),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| and(a, b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| or(a, b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| implies(a, b)),
            (inner.clone(), inner).prop_map(|(a, b)| equal_to(a, b)),
        ]
    })
}

/// Strategy for Boolean expressions that also compare the Nat variable
/// `n` against small constants, so that guards are not just variables.
pub fn arb_guarded_expr(variables: Vec<Variable>, depth: u32) -> impl Strategy<Value = DataExpr> {
    let n = Variable::new("n", Sort::nat()).to_expr();
    let comparison = (0u64..4, any::<bool>()).prop_map(move |(k, strict)| {
        if strict {
            less(n.clone(), nat(k))
        } else {
            equal_to(n.clone(), nat(k))
        }
    });
    (arb_bool_expr(variables, depth), comparison, any::<bool>()).prop_map(|(e, c, conjoin)| {
        if conjoin {
            and(c, e)
        } else {
            or(e, c)
        }
    })
}

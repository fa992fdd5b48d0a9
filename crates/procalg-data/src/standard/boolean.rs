//! The sort Bool.

use super::DataTypeDefinition;
use crate::equation::DataEquation;
use crate::sort::Sort;
use crate::term::{DataExpr, FunctionSymbol, Variable};

pub fn true_symbol() -> FunctionSymbol {
    FunctionSymbol::new("true", Sort::bool_())
}

pub fn false_symbol() -> FunctionSymbol {
    FunctionSymbol::new("false", Sort::bool_())
}

pub fn not_symbol() -> FunctionSymbol {
    FunctionSymbol::new("!", Sort::function(vec![Sort::bool_()], Sort::bool_()))
}

fn binary(name: &str) -> FunctionSymbol {
    FunctionSymbol::new(
        name,
        Sort::function(vec![Sort::bool_(), Sort::bool_()], Sort::bool_()),
    )
}

pub fn and_symbol() -> FunctionSymbol {
    binary("&&")
}

pub fn or_symbol() -> FunctionSymbol {
    binary("||")
}

pub fn implies_symbol() -> FunctionSymbol {
    binary("=>")
}

pub fn true_() -> DataExpr {
    true_symbol().to_expr()
}

pub fn false_() -> DataExpr {
    false_symbol().to_expr()
}

pub fn bool_(value: bool) -> DataExpr {
    if value {
        true_()
    } else {
        false_()
    }
}

pub fn not(e: DataExpr) -> DataExpr {
    not_symbol().apply(vec![e])
}

pub fn and(a: DataExpr, b: DataExpr) -> DataExpr {
    and_symbol().apply(vec![a, b])
}

pub fn or(a: DataExpr, b: DataExpr) -> DataExpr {
    or_symbol().apply(vec![a, b])
}

pub fn implies(a: DataExpr, b: DataExpr) -> DataExpr {
    implies_symbol().apply(vec![a, b])
}

pub fn is_not(e: &DataExpr) -> bool {
    e.is_application_of("!", 1) && e.sort().is_bool()
}

pub fn is_and(e: &DataExpr) -> bool {
    e.is_application_of("&&", 2)
}

pub fn is_or(e: &DataExpr) -> bool {
    e.is_application_of("||", 2)
}

pub fn is_implies(e: &DataExpr) -> bool {
    e.is_application_of("=>", 2)
}

/// Conjunction of `terms`; `true` when empty.
pub fn join_and(terms: impl IntoIterator<Item = DataExpr>) -> DataExpr {
    let mut iter = terms.into_iter();
    match iter.next() {
        None => true_(),
        Some(first) => iter.fold(first, and),
    }
}

/// Disjunction of `terms`; `false` when empty.
pub fn join_or(terms: impl IntoIterator<Item = DataExpr>) -> DataExpr {
    let mut iter = terms.into_iter();
    match iter.next() {
        None => false_(),
        Some(first) => iter.fold(first, or),
    }
}

/// The conjuncts of a nested conjunction.
pub fn split_and(e: &DataExpr) -> Vec<DataExpr> {
    let mut result = Vec::new();
    let mut stack = vec![e.clone()];
    while let Some(t) = stack.pop() {
        if is_and(&t) {
            let args = t.arguments();
            stack.push(args[1].clone());
            stack.push(args[0].clone());
        } else {
            result.push(t);
        }
    }
    result
}

pub(super) fn definition() -> DataTypeDefinition {
    let b = Variable::new("b", Sort::bool_()).to_expr();
    let t = true_();
    let f = false_();
    let eq = |l: DataExpr, r: DataExpr| super::equal_to(l, r);
    let e = DataEquation::new;
    DataTypeDefinition {
        constructors: vec![true_symbol(), false_symbol()],
        mappings: vec![not_symbol(), and_symbol(), or_symbol(), implies_symbol()],
        equations: vec![
            e(not(t.clone()), f.clone()),
            e(not(f.clone()), t.clone()),
            e(not(not(b.clone())), b.clone()),
            e(and(t.clone(), b.clone()), b.clone()),
            e(and(f.clone(), b.clone()), f.clone()),
            e(and(b.clone(), t.clone()), b.clone()),
            e(and(b.clone(), f.clone()), f.clone()),
            e(and(b.clone(), b.clone()), b.clone()),
            e(or(t.clone(), b.clone()), t.clone()),
            e(or(f.clone(), b.clone()), b.clone()),
            e(or(b.clone(), t.clone()), t.clone()),
            e(or(b.clone(), f.clone()), b.clone()),
            e(or(b.clone(), b.clone()), b.clone()),
            e(implies(t.clone(), b.clone()), b.clone()),
            e(implies(f.clone(), b.clone()), t.clone()),
            e(implies(b.clone(), t.clone()), t.clone()),
            e(implies(b.clone(), f.clone()), not(b.clone())),
            e(eq(t.clone(), b.clone()), b.clone()),
            e(eq(f.clone(), b.clone()), not(b.clone())),
            e(eq(b.clone(), t.clone()), b.clone()),
            e(eq(b.clone(), f), not(b)),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_and_flattens_nested_conjunctions() {
        let a = Variable::new("a", Sort::bool_()).to_expr();
        let b = Variable::new("b", Sort::bool_()).to_expr();
        let c = Variable::new("c", Sort::bool_()).to_expr();
        let e = and(and(a.clone(), b.clone()), c.clone());
        assert_eq!(split_and(&e), vec![a.clone(), b.clone(), c.clone()]);
        assert_eq!(join_and(vec![a.clone()]), a);
        assert!(join_and(Vec::new()).is_true());
        assert!(join_or(Vec::new()).is_false());
    }
}

//! The numeric tower Pos ⊂ Nat ⊂ Int ⊂ Real in binary constructor form.
//!
//! `Pos` numbers are `@c1` or `@cDub(b, p)` denoting `2p + b`; `Nat` adds
//! `@c0` and the embedding `@cNat`; `Int` is `@cInt(n)` or `@cNeg(p)`, the
//! latter denoting `-p`; `Real` is the fraction `@cReal(x, p)`.

use super::boolean::{and, false_, not, or, true_};
use super::{equal_to, if_, DataTypeDefinition};
use crate::equation::DataEquation;
use crate::sort::Sort;
use crate::term::{DataExpr, FunctionSymbol, Variable};

fn unary(name: &str, from: Sort, to: Sort) -> FunctionSymbol {
    FunctionSymbol::new(name, Sort::function(vec![from], to))
}

fn binary(name: &str, a: Sort, b: Sort, to: Sort) -> FunctionSymbol {
    FunctionSymbol::new(name, Sort::function(vec![a, b], to))
}

pub fn c1_symbol() -> FunctionSymbol {
    FunctionSymbol::new("@c1", Sort::pos())
}

pub fn cdub_symbol() -> FunctionSymbol {
    binary("@cDub", Sort::bool_(), Sort::pos(), Sort::pos())
}

pub fn c0_symbol() -> FunctionSymbol {
    FunctionSymbol::new("@c0", Sort::nat())
}

pub fn cnat_symbol() -> FunctionSymbol {
    unary("@cNat", Sort::pos(), Sort::nat())
}

pub fn cint_symbol() -> FunctionSymbol {
    unary("@cInt", Sort::nat(), Sort::int_())
}

pub fn cneg_symbol() -> FunctionSymbol {
    unary("@cNeg", Sort::pos(), Sort::int_())
}

pub fn creal_symbol() -> FunctionSymbol {
    binary("@cReal", Sort::int_(), Sort::pos(), Sort::real_())
}

pub fn c1() -> DataExpr {
    c1_symbol().to_expr()
}

pub fn cdub(b: DataExpr, p: DataExpr) -> DataExpr {
    cdub_symbol().apply(vec![b, p])
}

pub fn c0() -> DataExpr {
    c0_symbol().to_expr()
}

pub fn cnat(p: DataExpr) -> DataExpr {
    cnat_symbol().apply(vec![p])
}

pub fn cint(n: DataExpr) -> DataExpr {
    cint_symbol().apply(vec![n])
}

pub fn cneg(p: DataExpr) -> DataExpr {
    cneg_symbol().apply(vec![p])
}

pub fn creal(x: DataExpr, p: DataExpr) -> DataExpr {
    creal_symbol().apply(vec![x, p])
}

/// The Pos numeral for `n`.
///
/// # Panics
/// When `n` is zero.
pub fn pos(n: u64) -> DataExpr {
    assert!(n > 0, "Pos numerals are positive");
    if n == 1 {
        c1()
    } else {
        cdub(super::boolean::bool_(n % 2 == 1), pos(n / 2))
    }
}

pub fn nat(n: u64) -> DataExpr {
    if n == 0 {
        c0()
    } else {
        cnat(pos(n))
    }
}

pub fn int(i: i64) -> DataExpr {
    if i >= 0 {
        cint(nat(i.unsigned_abs()))
    } else {
        cneg(pos(i.unsigned_abs()))
    }
}

/// The numeral of sort `sort` for `n`, if `n` is representable in it.
pub fn numeral(n: u64, sort: &Sort) -> Option<DataExpr> {
    match sort.basic_name()? {
        "Pos" if n > 0 => Some(pos(n)),
        "Nat" => Some(nat(n)),
        "Int" => i64::try_from(n).ok().map(int),
        "Real" => i64::try_from(n).ok().map(|i| creal(int(i), c1())),
        _ => None,
    }
}

/// The value of a closed numeral of the numeric tower.
pub fn integer_value(e: &DataExpr) -> Option<i128> {
    let f = e.head().as_function()?;
    let args = e.arguments();
    match (f.name(), args.len()) {
        ("@c1", 0) if f.sort().basic_name() == Some("Pos") => Some(1),
        ("@c0", 0) if f.sort().basic_name() == Some("Nat") => Some(0),
        ("@cDub", 2) => {
            let bit = if args[0].is_true() {
                1
            } else if args[0].is_false() {
                0
            } else {
                return None;
            };
            integer_value(&args[1])?.checked_mul(2)?.checked_add(bit)
        }
        ("@cNat", 1) | ("@cInt", 1) => integer_value(&args[0]),
        ("@cNeg", 1) => integer_value(&args[0]).map(|v| -v),
        _ => None,
    }
}

fn same_sort_binary(name: &str, a: &DataExpr, b: DataExpr, to: Option<Sort>) -> DataExpr {
    let s = a.sort();
    let to = to.unwrap_or_else(|| s.clone());
    binary(name, s.clone(), s, to).apply(vec![a.clone(), b])
}

pub fn less(a: DataExpr, b: DataExpr) -> DataExpr {
    same_sort_binary("<", &a, b, Some(Sort::bool_()))
}

pub fn less_equal(a: DataExpr, b: DataExpr) -> DataExpr {
    same_sort_binary("<=", &a, b, Some(Sort::bool_()))
}

pub fn greater(a: DataExpr, b: DataExpr) -> DataExpr {
    same_sort_binary(">", &a, b, Some(Sort::bool_()))
}

pub fn greater_equal(a: DataExpr, b: DataExpr) -> DataExpr {
    same_sort_binary(">=", &a, b, Some(Sort::bool_()))
}

pub fn plus(a: DataExpr, b: DataExpr) -> DataExpr {
    same_sort_binary("+", &a, b, None)
}

pub fn maximum(a: DataExpr, b: DataExpr) -> DataExpr {
    same_sort_binary("max", &a, b, None)
}

pub fn minimum(a: DataExpr, b: DataExpr) -> DataExpr {
    same_sort_binary("min", &a, b, None)
}

/// Successor; always of sort Pos, except on Int.
pub fn succ(a: DataExpr) -> DataExpr {
    let s = a.sort();
    let to = if s == Sort::int_() { Sort::int_() } else { Sort::pos() };
    unary("succ", s, to).apply(vec![a])
}

/// Predecessor of a positive number.
pub fn pred(p: DataExpr) -> DataExpr {
    unary("pred", Sort::pos(), Sort::nat()).apply(vec![p])
}

pub fn dub(b: DataExpr, n: DataExpr) -> DataExpr {
    binary("@dub", Sort::bool_(), Sort::nat(), Sort::nat()).apply(vec![b, n])
}

pub fn negate(x: DataExpr) -> DataExpr {
    unary("-", Sort::int_(), Sort::int_()).apply(vec![x])
}

pub fn abs(x: DataExpr) -> DataExpr {
    unary("abs", Sort::int_(), Sort::nat()).apply(vec![x])
}

pub fn pos2nat(p: DataExpr) -> DataExpr {
    unary("Pos2Nat", Sort::pos(), Sort::nat()).apply(vec![p])
}

pub fn nat2pos(n: DataExpr) -> DataExpr {
    unary("Nat2Pos", Sort::nat(), Sort::pos()).apply(vec![n])
}

pub fn nat2int(n: DataExpr) -> DataExpr {
    unary("Nat2Int", Sort::nat(), Sort::int_()).apply(vec![n])
}

pub fn int2nat(x: DataExpr) -> DataExpr {
    unary("Int2Nat", Sort::int_(), Sort::nat()).apply(vec![x])
}

pub fn int2real(x: DataExpr) -> DataExpr {
    unary("Int2Real", Sort::int_(), Sort::real_()).apply(vec![x])
}

fn symbol_of(e: &DataExpr) -> FunctionSymbol {
    match e.head_symbol() {
        Some(f) => f.clone(),
        None => unreachable!("numeric builders always produce applications of symbols"),
    }
}

fn comparison_mappings(s: &Sort) -> Vec<FunctionSymbol> {
    let x = Variable::new("x", s.clone()).to_expr();
    vec![
        symbol_of(&less(x.clone(), x.clone())),
        symbol_of(&less_equal(x.clone(), x.clone())),
        symbol_of(&greater(x.clone(), x.clone())),
        symbol_of(&greater_equal(x.clone(), x.clone())),
        symbol_of(&maximum(x.clone(), x.clone())),
        symbol_of(&minimum(x.clone(), x)),
    ]
}

/// `>`, `>=`, `max` and `min` in terms of `<` and `<=`.
fn derived_comparisons(s: &Sort) -> Vec<DataEquation> {
    let x = Variable::new("x", s.clone()).to_expr();
    let y = Variable::new("y", s.clone()).to_expr();
    vec![
        DataEquation::new(greater(x.clone(), y.clone()), less(y.clone(), x.clone())),
        DataEquation::new(greater_equal(x.clone(), y.clone()), less_equal(y.clone(), x.clone())),
        DataEquation::new(
            maximum(x.clone(), y.clone()),
            if_(less_equal(x.clone(), y.clone()), y.clone(), x.clone()),
        ),
        DataEquation::new(
            minimum(x.clone(), y.clone()),
            if_(less_equal(x.clone(), y.clone()), x, y),
        ),
    ]
}

pub(super) fn pos_definition() -> DataTypeDefinition {
    let b = Variable::new("b", Sort::bool_()).to_expr();
    let c = Variable::new("c", Sort::bool_()).to_expr();
    let p = Variable::new("p", Sort::pos()).to_expr();
    let q = Variable::new("q", Sort::pos()).to_expr();
    let e = DataEquation::new;

    let mut mappings = comparison_mappings(&Sort::pos());
    mappings.push(symbol_of(&succ(p.clone())));
    mappings.push(symbol_of(&plus(p.clone(), p.clone())));

    let mut equations = vec![
        e(equal_to(c1(), cdub(b.clone(), p.clone())), false_()),
        e(equal_to(cdub(b.clone(), p.clone()), c1()), false_()),
        e(
            equal_to(cdub(b.clone(), p.clone()), cdub(c.clone(), q.clone())),
            and(equal_to(b.clone(), c.clone()), equal_to(p.clone(), q.clone())),
        ),
        e(less(p.clone(), c1()), false_()),
        e(less(c1(), cdub(b.clone(), p.clone())), true_()),
        e(
            less(cdub(b.clone(), p.clone()), cdub(c.clone(), q.clone())),
            if_(
                and(not(b.clone()), c.clone()),
                less_equal(p.clone(), q.clone()),
                less(p.clone(), q.clone()),
            ),
        ),
        e(less_equal(c1(), p.clone()), true_()),
        e(less_equal(cdub(b.clone(), p.clone()), c1()), false_()),
        e(
            less_equal(cdub(b.clone(), p.clone()), cdub(c.clone(), q.clone())),
            if_(
                and(b.clone(), not(c.clone())),
                less(p.clone(), q.clone()),
                less_equal(p.clone(), q.clone()),
            ),
        ),
        e(succ(c1()), cdub(false_(), c1())),
        e(succ(cdub(false_(), p.clone())), cdub(true_(), p.clone())),
        e(succ(cdub(true_(), p.clone())), cdub(false_(), succ(p.clone()))),
        e(plus(c1(), p.clone()), succ(p.clone())),
        e(plus(p.clone(), c1()), succ(p.clone())),
        e(
            plus(cdub(b.clone(), p.clone()), cdub(c.clone(), q.clone())),
            if_(
                and(b.clone(), c.clone()),
                cdub(false_(), succ(plus(p.clone(), q.clone()))),
                cdub(or(b, c), plus(p, q)),
            ),
        ),
    ];
    equations.extend(derived_comparisons(&Sort::pos()));

    DataTypeDefinition {
        constructors: vec![c1_symbol(), cdub_symbol()],
        mappings,
        equations,
    }
}

pub(super) fn nat_definition() -> DataTypeDefinition {
    let b = Variable::new("b", Sort::bool_()).to_expr();
    let n = Variable::new("n", Sort::nat()).to_expr();
    let p = Variable::new("p", Sort::pos()).to_expr();
    let q = Variable::new("q", Sort::pos()).to_expr();
    let e = DataEquation::new;

    let mut mappings = comparison_mappings(&Sort::nat());
    mappings.extend([
        symbol_of(&pos2nat(p.clone())),
        symbol_of(&nat2pos(n.clone())),
        symbol_of(&succ(n.clone())),
        symbol_of(&pred(p.clone())),
        symbol_of(&dub(b.clone(), n.clone())),
        symbol_of(&plus(n.clone(), n.clone())),
    ]);

    let mut equations = vec![
        e(equal_to(c0(), cnat(p.clone())), false_()),
        e(equal_to(cnat(p.clone()), c0()), false_()),
        e(
            equal_to(cnat(p.clone()), cnat(q.clone())),
            equal_to(p.clone(), q.clone()),
        ),
        e(less(n.clone(), c0()), false_()),
        e(less(c0(), cnat(p.clone())), true_()),
        e(less(cnat(p.clone()), cnat(q.clone())), less(p.clone(), q.clone())),
        e(less_equal(c0(), n.clone()), true_()),
        e(less_equal(cnat(p.clone()), c0()), false_()),
        e(
            less_equal(cnat(p.clone()), cnat(q.clone())),
            less_equal(p.clone(), q.clone()),
        ),
        e(pos2nat(p.clone()), cnat(p.clone())),
        e(nat2pos(cnat(p.clone())), p.clone()),
        e(succ(c0()), c1()),
        e(succ(cnat(p.clone())), succ(p.clone())),
        e(pred(c1()), c0()),
        e(pred(cdub(true_(), p.clone())), cnat(cdub(false_(), p.clone()))),
        e(pred(cdub(false_(), p.clone())), dub(true_(), pred(p.clone()))),
        e(dub(false_(), c0()), c0()),
        e(dub(true_(), c0()), cnat(c1())),
        e(dub(b.clone(), cnat(p.clone())), cnat(cdub(b, p.clone()))),
        e(plus(c0(), n.clone()), n.clone()),
        e(plus(n.clone(), c0()), n),
        e(plus(cnat(p.clone()), cnat(q.clone())), cnat(plus(p, q))),
    ];
    equations.extend(derived_comparisons(&Sort::nat()));

    DataTypeDefinition {
        constructors: vec![c0_symbol(), cnat_symbol()],
        mappings,
        equations,
    }
}

pub(super) fn int_definition() -> DataTypeDefinition {
    let m = Variable::new("m", Sort::nat()).to_expr();
    let n = Variable::new("n", Sort::nat()).to_expr();
    let p = Variable::new("p", Sort::pos()).to_expr();
    let q = Variable::new("q", Sort::pos()).to_expr();
    let x = Variable::new("x", Sort::int_()).to_expr();
    let e = DataEquation::new;

    let mut mappings = comparison_mappings(&Sort::int_());
    mappings.extend([
        symbol_of(&nat2int(n.clone())),
        symbol_of(&int2nat(x.clone())),
        symbol_of(&negate(x.clone())),
        symbol_of(&abs(x)),
    ]);

    let mut equations = vec![
        e(
            equal_to(cint(m.clone()), cint(n.clone())),
            equal_to(m.clone(), n.clone()),
        ),
        e(equal_to(cint(m.clone()), cneg(p.clone())), false_()),
        e(equal_to(cneg(p.clone()), cint(m.clone())), false_()),
        e(
            equal_to(cneg(p.clone()), cneg(q.clone())),
            equal_to(p.clone(), q.clone()),
        ),
        e(less(cint(m.clone()), cint(n.clone())), less(m.clone(), n.clone())),
        e(less(cint(m.clone()), cneg(p.clone())), false_()),
        e(less(cneg(p.clone()), cint(m.clone())), true_()),
        e(less(cneg(p.clone()), cneg(q.clone())), less(q.clone(), p.clone())),
        e(
            less_equal(cint(m.clone()), cint(n.clone())),
            less_equal(m.clone(), n.clone()),
        ),
        e(less_equal(cint(m.clone()), cneg(p.clone())), false_()),
        e(less_equal(cneg(p.clone()), cint(m.clone())), true_()),
        e(
            less_equal(cneg(p.clone()), cneg(q.clone())),
            less_equal(q.clone(), p.clone()),
        ),
        e(nat2int(n.clone()), cint(n.clone())),
        e(int2nat(cint(n.clone())), n.clone()),
        e(negate(cint(c0())), cint(c0())),
        e(negate(cint(cnat(p.clone()))), cneg(p.clone())),
        e(negate(cneg(p.clone())), cint(cnat(p.clone()))),
        e(abs(cint(n.clone())), n),
        e(abs(cneg(p.clone())), cnat(p)),
    ];
    equations.extend(derived_comparisons(&Sort::int_()));

    DataTypeDefinition {
        constructors: vec![cint_symbol(), cneg_symbol()],
        mappings,
        equations,
    }
}

pub(super) fn real_definition() -> DataTypeDefinition {
    let x = Variable::new("x", Sort::int_()).to_expr();
    DataTypeDefinition {
        constructors: vec![creal_symbol()],
        mappings: vec![symbol_of(&int2real(x.clone()))],
        equations: vec![DataEquation::new(int2real(x.clone()), creal(x, c1()))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numerals_round_trip_through_integer_value() {
        for n in [1u64, 2, 3, 7, 8, 1023] {
            assert_eq!(integer_value(&pos(n)), Some(i128::from(n)));
        }
        assert_eq!(integer_value(&nat(0)), Some(0));
        assert_eq!(integer_value(&int(-5)), Some(-5));
        assert_eq!(integer_value(&true_()), None);
    }

    #[test]
    fn three_is_dub_true_one() {
        assert_eq!(pos(3), cdub(true_(), c1()));
        assert_eq!(nat(3), cnat(cdub(true_(), c1())));
    }

    #[test]
    fn numeral_respects_target_sort() {
        assert!(numeral(0, &Sort::pos()).is_none());
        assert_eq!(numeral(0, &Sort::nat()), Some(c0()));
        assert_eq!(numeral(2, &Sort::int_()), Some(int(2)));
        assert!(numeral(2, &Sort::bool_()).is_none());
    }
}

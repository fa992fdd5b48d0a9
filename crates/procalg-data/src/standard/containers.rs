//! Lists, finite sets and bags, and their function-based counterparts.

use super::boolean::{false_, or};
use super::numbers::{c0, cnat, greater, plus, succ};
use super::{equal_to, if_, not_equal_to, DataTypeDefinition};
use crate::equation::DataEquation;
use crate::sort::{ContainerKind, Sort};
use crate::term::{DataExpr, FunctionSymbol, Variable};

pub(super) fn definition(kind: ContainerKind, element: &Sort) -> DataTypeDefinition {
    match kind {
        ContainerKind::List => list_definition(element),
        ContainerKind::FSet => fset_definition(element),
        ContainerKind::Set => set_definition(element),
        ContainerKind::FBag => fbag_definition(element),
        ContainerKind::Bag => bag_definition(element),
    }
}

fn symbol(name: &str, domain: Vec<Sort>, codomain: Sort) -> FunctionSymbol {
    FunctionSymbol::new(name, Sort::function(domain, codomain))
}

pub fn empty_list_symbol(element: &Sort) -> FunctionSymbol {
    FunctionSymbol::new("[]", Sort::list(element.clone()))
}

pub fn cons_symbol(element: &Sort) -> FunctionSymbol {
    let l = Sort::list(element.clone());
    symbol("|>", vec![element.clone(), l.clone()], l)
}

pub fn empty_list(element: &Sort) -> DataExpr {
    empty_list_symbol(element).to_expr()
}

pub fn cons(head: DataExpr, tail: DataExpr) -> DataExpr {
    cons_symbol(&head.sort()).apply(vec![head, tail])
}

/// The list sort's element sort, if `s` is a list.
pub fn list_element(s: &Sort) -> Option<&Sort> {
    if s.is_container_of(ContainerKind::List) {
        s.element()
    } else {
        None
    }
}

fn list_definition(s: &Sort) -> DataTypeDefinition {
    let l_sort = Sort::list(s.clone());
    let d = Variable::new("d", s.clone()).to_expr();
    let e = Variable::new("e", s.clone()).to_expr();
    let l = Variable::new("l", l_sort.clone()).to_expr();
    let m = Variable::new("m", l_sort.clone()).to_expr();
    let empty = empty_list(s);

    let length = symbol("#", vec![l_sort.clone()], Sort::nat());
    let snoc = symbol("<|", vec![l_sort.clone(), s.clone()], l_sort.clone());
    let concat = symbol("++", vec![l_sort.clone(), l_sort.clone()], l_sort.clone());
    let head = symbol("head", vec![l_sort.clone()], s.clone());
    let tail = symbol("tail", vec![l_sort.clone()], l_sort.clone());
    let member = symbol("in", vec![s.clone(), l_sort.clone()], Sort::bool_());

    let dl = cons(d.clone(), l.clone());
    let el = cons(e.clone(), l.clone());
    let em = cons(e.clone(), m.clone());
    let eq = DataEquation::new;
    DataTypeDefinition {
        constructors: vec![empty_list_symbol(s), cons_symbol(s)],
        mappings: vec![
            length.clone(),
            snoc.clone(),
            concat.clone(),
            head.clone(),
            tail.clone(),
            member.clone(),
        ],
        equations: vec![
            eq(equal_to(empty.clone(), dl.clone()), false_()),
            eq(equal_to(dl.clone(), empty.clone()), false_()),
            eq(
                equal_to(dl.clone(), em.clone()),
                super::boolean::and(equal_to(d.clone(), e.clone()), equal_to(l.clone(), m.clone())),
            ),
            eq(length.apply(vec![empty.clone()]), c0()),
            eq(
                length.apply(vec![dl.clone()]),
                cnat(succ(length.apply(vec![l.clone()]))),
            ),
            eq(snoc.apply(vec![empty.clone(), d.clone()]), cons(d.clone(), empty.clone())),
            eq(
                snoc.apply(vec![el.clone(), d.clone()]),
                cons(e.clone(), snoc.apply(vec![l.clone(), d.clone()])),
            ),
            eq(concat.apply(vec![empty.clone(), l.clone()]), l.clone()),
            eq(
                concat.apply(vec![dl.clone(), m.clone()]),
                cons(d.clone(), concat.apply(vec![l.clone(), m.clone()])),
            ),
            eq(concat.apply(vec![l.clone(), empty.clone()]), l.clone()),
            eq(head.apply(vec![dl.clone()]), d.clone()),
            eq(tail.apply(vec![dl.clone()]), l.clone()),
            eq(member.apply(vec![d.clone(), empty]), false_()),
            eq(
                member.apply(vec![d.clone(), el]),
                or(equal_to(d.clone(), e), member.apply(vec![d, l])),
            ),
        ],
    }
}

fn fset_definition(s: &Sort) -> DataTypeDefinition {
    let f_sort = Sort::fset(s.clone());
    let d = Variable::new("d", s.clone()).to_expr();
    let e = Variable::new("e", s.clone()).to_expr();
    let x = Variable::new("s", f_sort.clone()).to_expr();
    let y = Variable::new("t", f_sort.clone()).to_expr();

    let empty = FunctionSymbol::new("{}", f_sort.clone());
    let insert = symbol("@fset_cons", vec![s.clone(), f_sort.clone()], f_sort.clone());
    let member = symbol("in", vec![s.clone(), f_sort.clone()], Sort::bool_());

    let ds = insert.apply(vec![d.clone(), x.clone()]);
    let et = insert.apply(vec![e.clone(), y.clone()]);
    let es = insert.apply(vec![e.clone(), x.clone()]);
    let eq = DataEquation::new;
    DataTypeDefinition {
        constructors: vec![empty.clone(), insert],
        mappings: vec![member.clone()],
        equations: vec![
            eq(equal_to(empty.to_expr(), ds.clone()), false_()),
            eq(equal_to(ds.clone(), empty.to_expr()), false_()),
            eq(
                equal_to(ds, et),
                super::boolean::and(equal_to(d.clone(), e.clone()), equal_to(x.clone(), y)),
            ),
            eq(member.apply(vec![d.clone(), empty.to_expr()]), false_()),
            eq(
                member.apply(vec![d.clone(), es]),
                or(equal_to(d.clone(), e), member.apply(vec![d, x])),
            ),
        ],
    }
}

fn set_definition(s: &Sort) -> DataTypeDefinition {
    let set_sort = Sort::set(s.clone());
    let f_sort = Sort::fset(s.clone());
    let pred_sort = Sort::function(vec![s.clone()], Sort::bool_());
    let d = Variable::new("d", s.clone()).to_expr();
    let f = Variable::new("f", pred_sort.clone()).to_expr();
    let x = Variable::new("s", f_sort.clone()).to_expr();

    let constructor = symbol("@set", vec![pred_sort.clone(), f_sort.clone()], set_sort.clone());
    let empty = FunctionSymbol::new("{}", set_sort.clone());
    let false_function = symbol("@false_", vec![s.clone()], Sort::bool_());
    let from_fset = symbol("@setfset", vec![f_sort.clone()], set_sort.clone());
    let member = symbol("in", vec![s.clone(), set_sort], Sort::bool_());
    let fset_member = symbol("in", vec![s.clone(), f_sort.clone()], Sort::bool_());
    let empty_fset = FunctionSymbol::new("{}", f_sort);

    let eq = DataEquation::new;
    DataTypeDefinition {
        constructors: vec![constructor.clone()],
        mappings: vec![
            empty.clone(),
            false_function.clone(),
            from_fset.clone(),
            member.clone(),
        ],
        equations: vec![
            eq(false_function.apply(vec![d.clone()]), false_()),
            eq(
                empty.to_expr(),
                constructor.apply(vec![false_function.to_expr(), empty_fset.to_expr()]),
            ),
            eq(
                from_fset.apply(vec![x.clone()]),
                constructor.apply(vec![false_function.to_expr(), x.clone()]),
            ),
            eq(
                member.apply(vec![d.clone(), constructor.apply(vec![f.clone(), x.clone()])]),
                not_equal_to(
                    DataExpr::application(f, vec![d.clone()]),
                    fset_member.apply(vec![d, x]),
                ),
            ),
        ],
    }
}

fn fbag_definition(s: &Sort) -> DataTypeDefinition {
    let f_sort = Sort::fbag(s.clone());
    let d = Variable::new("d", s.clone()).to_expr();
    let e = Variable::new("e", s.clone()).to_expr();
    let p = Variable::new("p", Sort::pos()).to_expr();
    let q = Variable::new("q", Sort::pos()).to_expr();
    let x = Variable::new("b", f_sort.clone()).to_expr();
    let y = Variable::new("c", f_sort.clone()).to_expr();

    let empty = FunctionSymbol::new("{:}", f_sort.clone());
    let insert = symbol(
        "@fbag_cons",
        vec![s.clone(), Sort::pos(), f_sort.clone()],
        f_sort.clone(),
    );
    let count = symbol("count", vec![s.clone(), f_sort], Sort::nat());

    let dpb = insert.apply(vec![d.clone(), p.clone(), x.clone()]);
    let eqc = insert.apply(vec![e.clone(), q.clone(), y.clone()]);
    let epb = insert.apply(vec![e.clone(), p.clone(), x.clone()]);
    let eq = DataEquation::new;
    DataTypeDefinition {
        constructors: vec![empty.clone(), insert],
        mappings: vec![count.clone()],
        equations: vec![
            eq(equal_to(empty.to_expr(), dpb.clone()), false_()),
            eq(equal_to(dpb.clone(), empty.to_expr()), false_()),
            eq(
                equal_to(dpb, eqc),
                super::boolean::and(
                    equal_to(d.clone(), e.clone()),
                    super::boolean::and(equal_to(p.clone(), q), equal_to(x.clone(), y)),
                ),
            ),
            eq(count.apply(vec![d.clone(), empty.to_expr()]), c0()),
            eq(
                count.apply(vec![d.clone(), epb]),
                if_(
                    equal_to(d.clone(), e),
                    cnat(p),
                    count.apply(vec![d, x]),
                ),
            ),
        ],
    }
}

fn bag_definition(s: &Sort) -> DataTypeDefinition {
    let bag_sort = Sort::bag(s.clone());
    let f_sort = Sort::fbag(s.clone());
    let count_sort = Sort::function(vec![s.clone()], Sort::nat());
    let d = Variable::new("d", s.clone()).to_expr();
    let f = Variable::new("f", count_sort.clone()).to_expr();
    let x = Variable::new("b", f_sort.clone()).to_expr();
    let y = Variable::new("y", bag_sort.clone()).to_expr();

    let constructor = symbol("@bag", vec![count_sort, f_sort.clone()], bag_sort.clone());
    let empty = FunctionSymbol::new("{:}", bag_sort.clone());
    let zero_function = symbol("@zero_", vec![s.clone()], Sort::nat());
    let count = symbol("count", vec![s.clone(), bag_sort.clone()], Sort::nat());
    let fbag_count = symbol("count", vec![s.clone(), f_sort.clone()], Sort::nat());
    let member = symbol("in", vec![s.clone(), bag_sort], Sort::bool_());
    let empty_fbag = FunctionSymbol::new("{:}", f_sort);

    let eq = DataEquation::new;
    DataTypeDefinition {
        constructors: vec![constructor.clone()],
        mappings: vec![
            empty.clone(),
            zero_function.clone(),
            count.clone(),
            member.clone(),
        ],
        equations: vec![
            eq(zero_function.apply(vec![d.clone()]), c0()),
            eq(
                empty.to_expr(),
                constructor.apply(vec![zero_function.to_expr(), empty_fbag.to_expr()]),
            ),
            eq(
                count.apply(vec![d.clone(), constructor.apply(vec![f.clone(), x.clone()])]),
                plus(
                    DataExpr::application(f, vec![d.clone()]),
                    fbag_count.apply(vec![d.clone(), x]),
                ),
            ),
            eq(
                member.apply(vec![d.clone(), y.clone()]),
                greater(count.apply(vec![d, y]), c0()),
            ),
        ],
    }
}

/// True for the list constructors `[]` and `|>`.
pub fn is_list_constructor(f: &FunctionSymbol) -> bool {
    (f.name() == "[]" || f.name() == "|>") && list_element(f.target_sort()).is_some()
}

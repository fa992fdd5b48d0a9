//! Dependent-sort analysis.
//!
//! A sort depends on the element sort of a container, the argument sorts of
//! a structured sort, the domain and codomain of a function sort and, for a
//! basic sort, the domains of its constructors. The traversal is an explicit
//! work stack gated by a visited set, which is the only thing that makes it
//! terminate on recursive sorts.

use indexmap::IndexSet;

use crate::sort::{Sort, SortKind};
use crate::term::{DataExpr, FunctionSymbol};

/// What the analysis needs to know about a specification.
pub trait SortContext {
    fn normalise_sort(&self, sort: &Sort) -> Sort;

    /// Constructors whose target sort is `sort`, already normalised.
    fn constructors_of(&self, sort: &Sort) -> Vec<FunctionSymbol>;
}

/// Computes the sorts a seed set transitively depends on.
pub struct DependentSorts<'a, C: SortContext + ?Sized> {
    context: &'a C,
}

impl<'a, C: SortContext + ?Sized> DependentSorts<'a, C> {
    pub fn new(context: &'a C) -> Self {
        Self { context }
    }

    /// Every sort reachable from `seeds`, the seeds included, in discovery
    /// order.
    pub fn closure<'s>(&self, seeds: impl IntoIterator<Item = &'s Sort>) -> IndexSet<Sort> {
        let mut visited = IndexSet::new();
        self.visit(seeds, &mut visited, &mut |_| {});
        visited
    }

    /// Like [`closure`](Self::closure) but streams each newly discovered
    /// sort into `sink` and returns nothing.
    pub fn for_each<'s>(
        &self,
        seeds: impl IntoIterator<Item = &'s Sort>,
        sink: &mut dyn FnMut(&Sort),
    ) {
        let mut visited = IndexSet::new();
        self.visit(seeds, &mut visited, sink);
    }

    /// The sorts that the constructors of `sort` depend on. Contains `sort`
    /// itself exactly when it can be nested inside its own values.
    pub fn closure_of_constructors(&self, sort: &Sort) -> IndexSet<Sort> {
        let mut domains = Vec::new();
        for f in self.context.constructors_of(sort) {
            for d in f.sort().domain() {
                if !domains.contains(d) {
                    domains.push(d.clone());
                }
            }
        }
        self.closure(domains.iter())
    }

    /// Sorts occurring in `expr` and everything they depend on.
    pub fn of_expression(&self, expr: &DataExpr) -> IndexSet<Sort> {
        let sorts = expr.sorts();
        self.closure(sorts.iter())
    }

    fn visit<'s>(
        &self,
        seeds: impl IntoIterator<Item = &'s Sort>,
        visited: &mut IndexSet<Sort>,
        sink: &mut dyn FnMut(&Sort),
    ) {
        let mut stack: Vec<Sort> = seeds.into_iter().cloned().collect();
        stack.reverse();
        while let Some(s) = stack.pop() {
            if !visited.insert(s.clone()) {
                continue;
            }
            sink(&s);
            let mut next = Vec::new();
            match s.kind() {
                SortKind::Container { element, .. } => next.push(element.clone()),
                SortKind::Structured(constructors) => {
                    for c in constructors {
                        next.extend(c.arguments.iter().map(|a| a.sort.clone()));
                    }
                }
                SortKind::Function { domain, codomain } => {
                    next.extend(domain.iter().cloned());
                    next.push(codomain.clone());
                }
                SortKind::Basic(_) => {
                    let normal = self.context.normalise_sort(&s);
                    if normal != s {
                        next.push(normal);
                    } else {
                        for f in self.context.constructors_of(&s) {
                            for d in f.sort().domain() {
                                if *d != s {
                                    next.push(d.clone());
                                }
                            }
                        }
                    }
                }
            }
            for n in next.into_iter().rev() {
                if !visited.contains(&n) {
                    stack.push(n);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Fixed {
        constructors: HashMap<Sort, Vec<FunctionSymbol>>,
    }

    impl SortContext for Fixed {
        fn normalise_sort(&self, sort: &Sort) -> Sort {
            sort.clone()
        }

        fn constructors_of(&self, sort: &Sort) -> Vec<FunctionSymbol> {
            self.constructors.get(sort).cloned().unwrap_or_default()
        }
    }

    fn tree_context() -> (Fixed, Sort) {
        let tree = Sort::basic("Tree");
        let leaf = FunctionSymbol::new("leaf", Sort::function(vec![Sort::nat()], tree.clone()));
        let node = FunctionSymbol::new(
            "node",
            Sort::function(vec![tree.clone(), tree.clone()], tree.clone()),
        );
        let mut constructors = HashMap::new();
        constructors.insert(tree.clone(), vec![leaf, node]);
        (Fixed { constructors }, tree)
    }

    #[test]
    fn recursive_sorts_terminate() {
        let (ctx, tree) = tree_context();
        let deps = DependentSorts::new(&ctx).closure([&tree]);
        let names: Vec<_> = deps.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["Tree", "Nat"]);
    }

    #[test]
    fn constructor_closure_contains_recursive_sort() {
        let (ctx, tree) = tree_context();
        let inner = DependentSorts::new(&ctx).closure_of_constructors(&tree);
        assert!(inner.contains(&tree));
        assert!(!DependentSorts::new(&ctx)
            .closure_of_constructors(&Sort::nat())
            .contains(&Sort::nat()));
        let list = Sort::list(tree.clone());
        let deps = DependentSorts::new(&ctx).closure([&list]);
        assert!(deps.contains(&tree));
        assert!(deps.contains(&Sort::nat()));
    }

    #[test]
    fn function_sorts_visit_domain_and_codomain() {
        let (ctx, _) = tree_context();
        let f = Sort::function(vec![Sort::bool_(), Sort::pos()], Sort::set(Sort::nat()));
        let mut seen = Vec::new();
        DependentSorts::new(&ctx).for_each([&f], &mut |s| seen.push(s.to_string()));
        assert_eq!(seen, vec!["Bool # Pos -> Set(Nat)", "Bool", "Pos", "Set(Nat)", "Nat"]);
    }
}

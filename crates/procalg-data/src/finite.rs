//! Conservative finiteness check for sorts.
//!
//! `true` means the sort provably has finitely many elements; `false` means
//! it is infinite or that finiteness could not be established.

use std::collections::HashMap;

use indexmap::IndexSet;

use crate::dependent::DependentSorts;
use crate::sort::{ContainerKind, Sort, SortKind};
use crate::spec::NormalisedSpecification;

pub struct FinitenessOracle<'a> {
    spec: &'a NormalisedSpecification,
    visiting: Vec<Sort>,
    closures: HashMap<Sort, IndexSet<Sort>>,
}

impl<'a> FinitenessOracle<'a> {
    pub fn new(spec: &'a NormalisedSpecification) -> Self {
        Self {
            spec,
            visiting: Vec::new(),
            closures: HashMap::new(),
        }
    }

    pub fn is_finite(&mut self, sort: &Sort) -> bool {
        let sort = self.spec.normalise_sort(sort);
        // A sort under evaluation is assumed finite; the check that started
        // the evaluation decides.
        if self.visiting.contains(&sort) {
            return true;
        }
        self.visiting.push(sort.clone());
        let result = self.check(&sort);
        self.visiting.pop();
        result
    }

    fn check(&mut self, sort: &Sort) -> bool {
        match sort.kind() {
            SortKind::Container { kind, element } => {
                *kind == ContainerKind::Set && self.is_finite(&element.clone())
            }
            SortKind::Function { domain, codomain } => {
                let (domain, codomain) = (domain.clone(), codomain.clone());
                domain.iter().all(|d| self.is_finite(d))
                    && codomain != *sort
                    && self.is_finite(&codomain)
            }
            SortKind::Basic(_) | SortKind::Structured(_) => {
                if self.spec.constructors_of(sort).is_empty() {
                    return false;
                }
                let closure = self.closure(sort);
                if closure.contains(sort) {
                    return false;
                }
                closure.iter().all(|s| self.is_finite(s))
            }
        }
    }

    fn closure(&mut self, sort: &Sort) -> IndexSet<Sort> {
        if let Some(c) = self.closures.get(sort) {
            return c.clone();
        }
        let c = DependentSorts::new(self.spec).closure_of_constructors(sort);
        self.closures.insert(sort.clone(), c.clone());
        c
    }
}

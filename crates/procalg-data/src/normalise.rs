//! Normalisation of data specifications.
//!
//! Normalising resolves every sort through the alias closure, imports the
//! generated definitions of every system-defined and structured sort that is
//! reachable from the declarations, and checks that the declared symbols and
//! equations are well typed.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::dependent::{DependentSorts, SortContext};
use crate::equation::DataEquation;
use crate::error::SpecificationError;
use crate::sort::{Sort, SortKind, StructArgument, StructConstructor};
use crate::spec::{Alias, DataSpecification, NormalisedSpecification};
use crate::standard;
use crate::term::{FunctionSymbol, TermKind};

/// Resolve `sort` through `aliases`. The alias map is consulted for the
/// sort itself before descending into its structure.
pub(crate) fn resolve(
    aliases: &IndexMap<Sort, Sort>,
    sort: &Sort,
    seen: &mut Vec<Sort>,
) -> Result<Sort, SpecificationError> {
    if let Some(target) = aliases.get(sort) {
        return follow(aliases, sort, target, seen);
    }
    let rebuilt = rebuild(aliases, sort, seen)?;
    if rebuilt != *sort {
        if let Some(target) = aliases.get(&rebuilt) {
            return follow(aliases, &rebuilt, target, seen);
        }
    }
    Ok(rebuilt)
}

fn follow(
    aliases: &IndexMap<Sort, Sort>,
    key: &Sort,
    target: &Sort,
    seen: &mut Vec<Sort>,
) -> Result<Sort, SpecificationError> {
    if seen.contains(key) {
        return Err(SpecificationError::CircularAlias {
            alias: key.to_string(),
        });
    }
    seen.push(key.clone());
    let result = resolve(aliases, target, seen);
    seen.pop();
    result
}

/// Normalise the immediate subsorts of `sort` without looking `sort` itself
/// up in the alias map.
fn rebuild(
    aliases: &IndexMap<Sort, Sort>,
    sort: &Sort,
    seen: &mut Vec<Sort>,
) -> Result<Sort, SpecificationError> {
    Ok(match sort.kind() {
        SortKind::Basic(_) => sort.clone(),
        SortKind::Function { domain, codomain } => {
            let domain = domain
                .iter()
                .map(|d| resolve(aliases, d, seen))
                .collect::<Result<Vec<_>, _>>()?;
            Sort::function(domain, resolve(aliases, codomain, seen)?)
        }
        SortKind::Container { kind, element } => {
            Sort::container(*kind, resolve(aliases, element, seen)?)
        }
        SortKind::Structured(constructors) => {
            let mut normalised = Vec::with_capacity(constructors.len());
            for c in constructors {
                let arguments = c
                    .arguments
                    .iter()
                    .map(|a| {
                        Ok(StructArgument {
                            name: a.name.clone(),
                            sort: resolve(aliases, &a.sort, seen)?,
                        })
                    })
                    .collect::<Result<Vec<_>, SpecificationError>>()?;
                normalised.push(StructConstructor {
                    name: c.name.clone(),
                    arguments,
                    recogniser: c.recogniser.clone(),
                });
            }
            Sort::structured(normalised)
        }
    })
}

/// Build the alias closure map.
///
/// Basic-to-basic aliases map left to right. Aliases with a container,
/// function or structured right-hand side map right to left, so the complex
/// sort collapses onto the alias name; when two aliases share a right-hand
/// side the one declared first wins and the later name maps onto it.
pub(crate) fn reconstruct_normalised_aliases(
    aliases: &IndexSet<Alias>,
) -> Result<IndexMap<Sort, Sort>, SpecificationError> {
    let mut declared: IndexMap<Sort, Sort> = IndexMap::new();
    for a in aliases {
        if let Some(previous) = declared.insert(a.name.clone(), a.rhs.clone()) {
            if previous != a.rhs {
                return Err(SpecificationError::DuplicateAlias {
                    alias: a.name.to_string(),
                    first: previous.to_string(),
                    second: a.rhs.to_string(),
                });
            }
        }
    }

    let mut map: IndexMap<Sort, Sort> = IndexMap::new();
    for (name, rhs) in &declared {
        if rhs.is_basic() {
            map.insert(name.clone(), rhs.clone());
        }
    }
    for name in map.keys() {
        let mut chain = vec![name.clone()];
        let mut current = name;
        while let Some(next) = map.get(current) {
            if chain.contains(next) {
                return Err(SpecificationError::CircularAlias {
                    alias: name.to_string(),
                });
            }
            chain.push(next.clone());
            current = next;
        }
    }

    for (name, rhs) in &declared {
        if rhs.is_basic() {
            continue;
        }
        // only the subsorts: the right-hand side itself may already name
        // an earlier alias
        let key = rebuild(&map, rhs, &mut Vec::new())?;
        let target = resolve(&map, name, &mut Vec::new())?;
        if key == target {
            continue;
        }
        match map.get(&key).cloned() {
            Some(existing) if existing != target => {
                map.insert(target, existing);
            }
            Some(_) => {}
            None => {
                map.insert(key, target);
            }
        }
    }

    let mut closed = IndexMap::with_capacity(map.len());
    for (key, value) in &map {
        let value = resolve(&map, value, &mut vec![key.clone()])?;
        let key = if key.is_basic() {
            key.clone()
        } else {
            rebuild(&map, key, &mut vec![key.clone()])?
        };
        if key != value {
            closed.insert(key, value);
        }
    }
    debug!(aliases = aliases.len(), closure = closed.len(), "rebuilt alias closure");
    Ok(closed)
}

const BUILTIN_SORTS: [&str; 5] = ["Bool", "Pos", "Nat", "Int", "Real"];

struct Builder {
    aliases: IndexMap<Sort, Sort>,
    imported: HashSet<Sort>,
    sorts: IndexSet<Sort>,
    constructors: IndexSet<FunctionSymbol>,
    mappings: IndexSet<FunctionSymbol>,
    equations: IndexSet<DataEquation>,
}

impl Builder {
    fn nf(&self, sort: &Sort) -> Result<Sort, SpecificationError> {
        resolve(&self.aliases, sort, &mut Vec::new())
    }

    fn nf_symbol(&self, f: &FunctionSymbol) -> Result<FunctionSymbol, SpecificationError> {
        Ok(f.with_sort(self.nf(f.sort())?))
    }

    fn nf_equation(&self, e: &DataEquation) -> DataEquation {
        // The alias map is acyclic by now, so resolution cannot fail.
        let aliases = &self.aliases;
        let mut f = |s: &Sort| resolve(aliases, s, &mut Vec::new()).unwrap_or_else(|_| s.clone());
        e.map_expressions(&mut |x| x.map_sorts(&mut f))
    }

    /// Register the generated definition of `raw` and of everything it
    /// needs, each exactly once.
    fn import(&mut self, raw: &Sort) -> Result<(), SpecificationError> {
        let mut pending = vec![raw.clone()];
        while let Some(s) = pending.pop() {
            if !self.imported.insert(s.clone()) {
                continue;
            }
            let normal = self.nf(&s)?;
            self.sorts.insert(normal.clone());
            if normal != s && !self.imported.contains(&normal) {
                pending.push(normal.clone());
            }
            let definition = standard::definition(&s);
            if s.is_system_defined() || s.is_structured() {
                debug!(sort = %s, "importing generated data type");
            }
            for f in &definition.constructors {
                let f = self.nf_symbol(f)?;
                self.constructors.insert(f);
            }
            for f in &definition.mappings {
                let f = self.nf_symbol(f)?;
                self.mappings.insert(f);
            }
            for e in &definition.equations {
                let e = self.nf_equation(e);
                self.equations.insert(e);
            }
            for d in standard::import_dependencies(&s) {
                let d = self.nf(&d)?;
                if !self.imported.contains(&d) {
                    pending.push(d);
                }
            }
        }
        Ok(())
    }

    fn check_symbol(&self, kind: &'static str, f: &FunctionSymbol) -> Result<(), SpecificationError> {
        let mut basic = Vec::new();
        collect_basic_sorts(f.sort(), &mut basic);
        for b in basic {
            let builtin = b.basic_name().is_some_and(|n| BUILTIN_SORTS.contains(&n));
            if !builtin && !self.sorts.contains(&b) {
                return Err(SpecificationError::IllTypedSymbol {
                    kind,
                    symbol: f.name().to_string(),
                    sort: f.sort().to_string(),
                    missing: b.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Sorts the closure is computed from. Symbols contribute their domain
    /// and codomain rather than their own function sort, otherwise the
    /// standard mappings of every imported function sort would introduce a
    /// new function sort forever.
    fn seeds(&self, raw_aliases: &IndexSet<Alias>) -> Result<IndexSet<Sort>, SpecificationError> {
        let mut seeds = IndexSet::new();
        seeds.insert(Sort::bool_());
        // Numerals must be typeable against every specification.
        seeds.insert(Sort::real_());
        for f in self.constructors.iter().chain(self.mappings.iter()) {
            symbol_seeds(f.sort(), &mut seeds);
        }
        for e in &self.equations {
            for side in [&e.lhs, &e.rhs, &e.condition] {
                side.for_each_subterm(&mut |t| match t.kind() {
                    TermKind::Variable(v) => {
                        seeds.insert(v.sort().clone());
                    }
                    TermKind::Function(f) => symbol_seeds(f.sort(), &mut seeds),
                    TermKind::Abstraction { variables, .. } => {
                        seeds.extend(variables.iter().map(|v| v.sort().clone()));
                    }
                    TermKind::Application { .. } => {}
                });
            }
        }
        for a in raw_aliases {
            seeds.insert(self.nf(&a.name)?);
            seeds.insert(self.nf(&a.rhs)?);
        }
        Ok(seeds)
    }
}

fn symbol_seeds(sort: &Sort, seeds: &mut IndexSet<Sort>) {
    if sort.is_function() {
        seeds.extend(sort.domain().iter().cloned());
        seeds.insert(sort.codomain().clone());
    } else {
        seeds.insert(sort.clone());
    }
}

fn collect_basic_sorts(sort: &Sort, result: &mut Vec<Sort>) {
    match sort.kind() {
        SortKind::Basic(_) => {
            if !result.contains(sort) {
                result.push(sort.clone());
            }
        }
        SortKind::Function { domain, codomain } => {
            for d in domain {
                collect_basic_sorts(d, result);
            }
            collect_basic_sorts(codomain, result);
        }
        SortKind::Container { element, .. } => collect_basic_sorts(element, result),
        SortKind::Structured(constructors) => {
            for c in constructors {
                for a in &c.arguments {
                    collect_basic_sorts(&a.sort, result);
                }
            }
        }
    }
}

impl SortContext for Builder {
    fn normalise_sort(&self, sort: &Sort) -> Sort {
        self.nf(sort).unwrap_or_else(|_| sort.clone())
    }

    fn constructors_of(&self, sort: &Sort) -> Vec<FunctionSymbol> {
        self.constructors
            .iter()
            .filter(|f| f.target_sort() == sort)
            .cloned()
            .collect()
    }
}

fn check_equation(e: &DataEquation) -> Result<(), SpecificationError> {
    let reason = if e.lhs.sort() != e.rhs.sort() {
        Some(format!(
            "the left-hand side has sort {} and the right-hand side has sort {}",
            e.lhs.sort(),
            e.rhs.sort()
        ))
    } else if !e.condition.sort().is_bool() {
        Some(format!("the condition has sort {} instead of Bool", e.condition.sort()))
    } else {
        None
    };
    match reason {
        Some(reason) => Err(SpecificationError::IllTypedEquation {
            equation: e.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Compute the normalised view of `spec`.
pub fn normalise(spec: &DataSpecification) -> Result<NormalisedSpecification, SpecificationError> {
    let aliases = reconstruct_normalised_aliases(spec.aliases())?;
    let mut builder = Builder {
        aliases,
        imported: HashSet::new(),
        sorts: IndexSet::new(),
        constructors: IndexSet::new(),
        mappings: IndexSet::new(),
        equations: IndexSet::new(),
    };

    for s in spec.sorts() {
        builder.import(s)?;
    }
    for a in spec.aliases() {
        builder.import(&a.name)?;
        builder.import(&a.rhs)?;
    }
    for s in spec.context_sorts() {
        builder.import(s)?;
    }

    for f in spec.constructors() {
        let f = builder.nf_symbol(f)?;
        builder.check_symbol("constructor", &f)?;
        builder.constructors.insert(f);
    }
    for f in spec.mappings() {
        let f = builder.nf_symbol(f)?;
        builder.check_symbol("mapping", &f)?;
        builder.mappings.insert(f);
    }
    for e in spec.equations() {
        let e = builder.nf_equation(e);
        check_equation(&e)?;
        builder.equations.insert(e);
    }

    loop {
        let mut seeds = builder.seeds(spec.aliases())?;
        for s in spec.context_sorts() {
            seeds.insert(builder.nf(s)?);
        }
        let closure = DependentSorts::new(&builder).closure(seeds.iter());
        let missing: Vec<Sort> = closure
            .into_iter()
            .filter(|s| !builder.imported.contains(s))
            .collect();
        if missing.is_empty() {
            break;
        }
        for s in &missing {
            builder.import(s)?;
        }
    }

    debug!(
        sorts = builder.sorts.len(),
        constructors = builder.constructors.len(),
        mappings = builder.mappings.len(),
        equations = builder.equations.len(),
        "normalised data specification"
    );
    Ok(NormalisedSpecification::new(
        builder.sorts,
        builder.aliases,
        builder.constructors,
        builder.mappings,
        builder.equations,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aliases(list: &[(&str, Sort)]) -> IndexSet<Alias> {
        list.iter().map(|(n, s)| Alias::new(n, s.clone())).collect()
    }

    #[test]
    fn basic_aliases_map_left_to_right() {
        let map = reconstruct_normalised_aliases(&aliases(&[
            ("A", Sort::basic("B")),
            ("B", Sort::basic("C")),
        ]))
        .unwrap();
        assert_eq!(map.get(&Sort::basic("A")), Some(&Sort::basic("C")));
        assert_eq!(map.get(&Sort::basic("B")), Some(&Sort::basic("C")));
    }

    #[test]
    fn complex_aliases_map_right_to_left_and_first_wins() {
        let list = Sort::list(Sort::nat());
        let map = reconstruct_normalised_aliases(&aliases(&[
            ("A", list.clone()),
            ("B", list.clone()),
        ]))
        .unwrap();
        assert_eq!(map.get(&list), Some(&Sort::basic("A")));
        assert_eq!(map.get(&Sort::basic("B")), Some(&Sort::basic("A")));
    }

    #[test]
    fn later_duplicates_collapse_onto_the_earliest_alias() {
        let list = Sort::list(Sort::nat());
        let map = reconstruct_normalised_aliases(&aliases(&[
            ("A", list.clone()),
            ("B", list.clone()),
            ("C", Sort::list(Sort::basic("N"))),
            ("N", Sort::nat()),
        ]))
        .unwrap();
        for sort in [list.clone(), Sort::basic("B"), Sort::basic("C")] {
            assert_eq!(resolve(&map, &sort, &mut Vec::new()).unwrap(), Sort::basic("A"), "{sort}");
        }
        assert_eq!(resolve(&map, &Sort::basic("A"), &mut Vec::new()).unwrap(), Sort::basic("A"));
    }

    #[test]
    fn recursive_container_alias_is_accepted() {
        let a = Sort::basic("A");
        let map = reconstruct_normalised_aliases(&aliases(&[("A", Sort::list(a.clone()))])).unwrap();
        assert_eq!(resolve(&map, &Sort::list(a.clone()), &mut Vec::new()).unwrap(), a);
        assert_eq!(resolve(&map, &a, &mut Vec::new()).unwrap(), a);
    }

    #[test]
    fn basic_cycles_are_rejected() {
        let err = reconstruct_normalised_aliases(&aliases(&[
            ("A", Sort::basic("B")),
            ("B", Sort::basic("C")),
            ("C", Sort::basic("A")),
        ]))
        .unwrap_err();
        assert!(matches!(err, SpecificationError::CircularAlias { .. }));
        assert!(err.to_string().contains("is defined in terms of itself"));
    }

    #[test]
    fn undeclared_sort_in_mapping_is_ill_typed() {
        let mut spec = DataSpecification::new();
        spec.add_mapping(FunctionSymbol::new(
            "f",
            Sort::function(vec![Sort::basic("Undeclared")], Sort::nat()),
        ));
        let err = normalise(&spec).unwrap_err();
        assert!(matches!(err, SpecificationError::IllTypedSymbol { ref missing, .. } if missing == "Undeclared"));
    }
}

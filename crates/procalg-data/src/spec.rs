//! Data specifications and their normalised view.

use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::ops::Add;

use indexmap::{IndexMap, IndexSet};

use crate::dependent::SortContext;
use crate::equation::DataEquation;
use crate::error::{ParseError, SpecificationError};
use crate::sort::Sort;
use crate::term::{DataExpr, FunctionSymbol, Variable};

/// A sort alias `name = rhs`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Alias {
    pub name: Sort,
    pub rhs: Sort,
}

impl Alias {
    pub fn new(name: &str, rhs: Sort) -> Self {
        Self {
            name: Sort::basic(name),
            rhs,
        }
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.rhs)
    }
}

/// A data specification as declared by the user.
///
/// The raw collections are kept exactly as added. Every query that needs
/// aliases resolved or system-defined sorts present goes through
/// [`normalised`](Self::normalised), which computes the normalised view on
/// first use and caches it (or the error) until the next mutation.
#[derive(Default)]
pub struct DataSpecification {
    sorts: IndexSet<Sort>,
    aliases: IndexSet<Alias>,
    constructors: IndexSet<FunctionSymbol>,
    mappings: IndexSet<FunctionSymbol>,
    equations: IndexSet<DataEquation>,
    /// Sorts used by expressions and variables outside the specification,
    /// imported like declared sorts but never written out.
    context_sorts: IndexSet<Sort>,
    normalised: OnceCell<Result<NormalisedSpecification, SpecificationError>>,
}

impl DataSpecification {
    pub fn new() -> Self {
        Self::default()
    }

    fn invalidate(&mut self) {
        self.normalised = OnceCell::new();
    }

    pub fn add_sort(&mut self, sort: Sort) {
        if self.sorts.insert(sort) {
            self.invalidate();
        }
    }

    /// Make the generated functions of `sort` available, as if it were used
    /// in a declaration.
    pub fn add_context_sort(&mut self, sort: Sort) {
        if self.context_sorts.insert(sort) {
            self.invalidate();
        }
    }

    pub fn add_context_sorts(&mut self, sorts: impl IntoIterator<Item = Sort>) {
        for sort in sorts {
            self.add_context_sort(sort);
        }
    }

    pub fn add_alias(&mut self, alias: Alias) {
        if self.aliases.insert(alias) {
            self.invalidate();
        }
    }

    pub fn add_constructor(&mut self, f: FunctionSymbol) {
        if self.constructors.insert(f) {
            self.invalidate();
        }
    }

    pub fn add_mapping(&mut self, f: FunctionSymbol) {
        if self.mappings.insert(f) {
            self.invalidate();
        }
    }

    pub fn add_equation(&mut self, e: DataEquation) {
        if self.equations.insert(e) {
            self.invalidate();
        }
    }

    pub fn remove_sort(&mut self, sort: &Sort) {
        if self.sorts.shift_remove(sort) {
            self.invalidate();
        }
    }

    pub fn remove_alias(&mut self, alias: &Alias) {
        if self.aliases.shift_remove(alias) {
            self.invalidate();
        }
    }

    pub fn remove_constructor(&mut self, f: &FunctionSymbol) {
        if self.constructors.shift_remove(f) {
            self.invalidate();
        }
    }

    pub fn remove_mapping(&mut self, f: &FunctionSymbol) {
        if self.mappings.shift_remove(f) {
            self.invalidate();
        }
    }

    pub fn remove_equation(&mut self, e: &DataEquation) {
        if self.equations.shift_remove(e) {
            self.invalidate();
        }
    }

    /// Replace the contents with the specification parsed from `source`.
    pub fn build_from_specification(&mut self, source: &str, filename: &str) -> Result<(), ParseError> {
        *self = crate::parse::parse_specification(source, filename)?;
        Ok(())
    }

    /// Add every declaration of `other`.
    pub fn merge(&mut self, other: &DataSpecification) {
        for s in &other.sorts {
            self.add_sort(s.clone());
        }
        for a in &other.aliases {
            self.add_alias(a.clone());
        }
        for f in &other.constructors {
            self.add_constructor(f.clone());
        }
        for f in &other.mappings {
            self.add_mapping(f.clone());
        }
        for e in &other.equations {
            self.add_equation(e.clone());
        }
        self.add_context_sorts(other.context_sorts.iter().cloned());
    }

    pub fn sorts(&self) -> &IndexSet<Sort> {
        &self.sorts
    }

    pub fn aliases(&self) -> &IndexSet<Alias> {
        &self.aliases
    }

    pub fn context_sorts(&self) -> &IndexSet<Sort> {
        &self.context_sorts
    }

    pub fn constructors(&self) -> &IndexSet<FunctionSymbol> {
        &self.constructors
    }

    pub fn mappings(&self) -> &IndexSet<FunctionSymbol> {
        &self.mappings
    }

    pub fn equations(&self) -> &IndexSet<DataEquation> {
        &self.equations
    }

    /// True when the next query will recompute the normalised view.
    pub fn needs_normalisation(&self) -> bool {
        self.normalised.get().is_none()
    }

    /// The normalised view, computed on first use.
    pub fn normalised(&self) -> Result<&NormalisedSpecification, SpecificationError> {
        self.normalised
            .get_or_init(|| crate::normalise::normalise(self))
            .as_ref()
            .map_err(Clone::clone)
    }
}

impl Clone for DataSpecification {
    fn clone(&self) -> Self {
        Self {
            sorts: self.sorts.clone(),
            aliases: self.aliases.clone(),
            constructors: self.constructors.clone(),
            mappings: self.mappings.clone(),
            equations: self.equations.clone(),
            context_sorts: self.context_sorts.clone(),
            normalised: OnceCell::new(),
        }
    }
}

impl fmt::Debug for DataSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSpecification")
            .field("sorts", &self.sorts)
            .field("aliases", &self.aliases)
            .field("constructors", &self.constructors)
            .field("mappings", &self.mappings)
            .field("equations", &self.equations)
            .field("context_sorts", &self.context_sorts)
            .finish()
    }
}

impl Add for DataSpecification {
    type Output = DataSpecification;

    fn add(mut self, other: DataSpecification) -> DataSpecification {
        self.merge(&other);
        self
    }
}

/// Writes the raw declarations in the textual format.
impl fmt::Display for DataSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sections(
            f,
            self.sorts.iter(),
            self.aliases.iter(),
            self.constructors.iter(),
            self.mappings.iter(),
            self.equations.iter(),
        )
    }
}

fn write_sections<'a>(
    f: &mut fmt::Formatter<'_>,
    sorts: impl Iterator<Item = &'a Sort>,
    aliases: impl Iterator<Item = &'a Alias>,
    constructors: impl Iterator<Item = &'a FunctionSymbol>,
    mappings: impl Iterator<Item = &'a FunctionSymbol>,
    equations: impl Iterator<Item = &'a DataEquation>,
) -> fmt::Result {
    let mut sort_lines: Vec<String> = sorts.map(|s| format!("{s};")).collect();
    sort_lines.extend(aliases.map(|a| format!("{a};")));
    if !sort_lines.is_empty() {
        writeln!(f, "sort")?;
        for l in sort_lines {
            writeln!(f, "  {l}")?;
        }
    }
    for (keyword, symbols) in [("cons", constructors.collect::<Vec<_>>()), ("map", mappings.collect())] {
        if !symbols.is_empty() {
            writeln!(f, "{keyword}")?;
            for s in symbols {
                writeln!(f, "  {}: {};", s.name(), s.sort())?;
            }
        }
    }
    let equations: Vec<_> = equations.collect();
    let mut variables = IndexSet::new();
    for e in &equations {
        variables.extend(e.variables.iter().cloned());
    }
    if !variables.is_empty() {
        writeln!(f, "var")?;
        for v in &variables {
            writeln!(f, "  {v:?};")?;
        }
    }
    if !equations.is_empty() {
        writeln!(f, "eqn")?;
        for e in equations {
            writeln!(f, "  {e};")?;
        }
    }
    Ok(())
}

/// The normalised view of a [`DataSpecification`]: aliases resolved, every
/// system-defined sort that is reachable imported, and symbols indexed by
/// target sort.
pub struct NormalisedSpecification {
    pub(crate) sorts: IndexSet<Sort>,
    pub(crate) aliases: IndexMap<Sort, Sort>,
    pub(crate) constructors: IndexSet<FunctionSymbol>,
    pub(crate) mappings: IndexSet<FunctionSymbol>,
    pub(crate) equations: IndexSet<DataEquation>,
    pub(crate) constructors_by_sort: IndexMap<Sort, Vec<FunctionSymbol>>,
    pub(crate) mappings_by_sort: IndexMap<Sort, Vec<FunctionSymbol>>,
    pub(crate) finite: RefCell<HashMap<Sort, bool>>,
}

impl NormalisedSpecification {
    pub(crate) fn new(
        sorts: IndexSet<Sort>,
        aliases: IndexMap<Sort, Sort>,
        constructors: IndexSet<FunctionSymbol>,
        mappings: IndexSet<FunctionSymbol>,
        equations: IndexSet<DataEquation>,
    ) -> Self {
        let mut constructors_by_sort: IndexMap<Sort, Vec<FunctionSymbol>> = IndexMap::new();
        for f in &constructors {
            constructors_by_sort
                .entry(f.target_sort().clone())
                .or_default()
                .push(f.clone());
        }
        let mut mappings_by_sort: IndexMap<Sort, Vec<FunctionSymbol>> = IndexMap::new();
        for f in &mappings {
            mappings_by_sort
                .entry(f.target_sort().clone())
                .or_default()
                .push(f.clone());
        }
        Self {
            sorts,
            aliases,
            constructors,
            mappings,
            equations,
            constructors_by_sort,
            mappings_by_sort,
            finite: RefCell::new(HashMap::new()),
        }
    }

    pub fn sorts(&self) -> &IndexSet<Sort> {
        &self.sorts
    }

    /// The alias closure: every key normalises to its value.
    pub fn aliases(&self) -> &IndexMap<Sort, Sort> {
        &self.aliases
    }

    pub fn constructors(&self) -> &IndexSet<FunctionSymbol> {
        &self.constructors
    }

    pub fn mappings(&self) -> &IndexSet<FunctionSymbol> {
        &self.mappings
    }

    pub fn equations(&self) -> &IndexSet<DataEquation> {
        &self.equations
    }

    /// Constructors with target sort `sort` in declaration order.
    pub fn constructors_of(&self, sort: &Sort) -> &[FunctionSymbol] {
        self.constructors_by_sort
            .get(&self.normalise_sort(sort))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn mappings_of(&self, sort: &Sort) -> &[FunctionSymbol] {
        self.mappings_by_sort
            .get(&self.normalise_sort(sort))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn normalise_sort(&self, sort: &Sort) -> Sort {
        crate::normalise::resolve(&self.aliases, sort, &mut Vec::new()).unwrap_or_else(|_| sort.clone())
    }

    pub fn normalise_expression(&self, expr: &DataExpr) -> DataExpr {
        expr.map_sorts(&mut |s| self.normalise_sort(s))
    }

    pub fn normalise_variable(&self, v: &Variable) -> Variable {
        v.with_sort(self.normalise_sort(v.sort()))
    }

    pub fn equal_sorts(&self, a: &Sort, b: &Sort) -> bool {
        self.normalise_sort(a) == self.normalise_sort(b)
    }

    pub fn is_constructor_sort(&self, sort: &Sort) -> bool {
        !self.constructors_of(sort).is_empty()
    }

    /// True when `sort` provably has finitely many elements.
    pub fn is_certainly_finite(&self, sort: &Sort) -> bool {
        let sort = self.normalise_sort(sort);
        if let Some(&known) = self.finite.borrow().get(&sort) {
            return known;
        }
        let result = crate::finite::FinitenessOracle::new(self).is_finite(&sort);
        self.finite.borrow_mut().insert(sort, result);
        result
    }

    /// All constructors and mappings.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionSymbol> {
        self.constructors.iter().chain(self.mappings.iter())
    }

    /// A declared or imported basic sort named `name`, following aliases.
    pub fn find_sort(&self, name: &str) -> Option<Sort> {
        let s = Sort::basic(name);
        if self.sorts.contains(&s) || self.aliases.contains_key(&s) {
            Some(self.normalise_sort(&s))
        } else {
            None
        }
    }

    pub fn find_constructor(&self, name: &str) -> Vec<&FunctionSymbol> {
        self.constructors.iter().filter(|f| f.name() == name).collect()
    }

    pub fn find_mapping(&self, name: &str) -> Vec<&FunctionSymbol> {
        self.mappings.iter().filter(|f| f.name() == name).collect()
    }

    /// Equations having `expr` as a side or as the head of a side.
    pub fn find_equations(&self, expr: &DataExpr) -> Vec<&DataEquation> {
        self.equations
            .iter()
            .filter(|e| {
                e.lhs == *expr || e.rhs == *expr || e.lhs.head() == expr || e.rhs.head() == expr
            })
            .collect()
    }

    /// Reorder `variables` so that enumeration splits the cheapest variables
    /// first: variables of enumerated types (constant constructors only,
    /// most constructors first), then other finite sorts, then the rest.
    pub fn order_variables_to_optimise_enumeration(&self, variables: &[Variable]) -> Vec<Variable> {
        let mut enumerated = Vec::new();
        let mut finite = Vec::new();
        let mut rest = Vec::new();
        for v in variables {
            let constructors = self.constructors_of(v.sort());
            if !constructors.is_empty() && constructors.iter().all(|f| f.arity() == 0) {
                enumerated.push((constructors.len(), v.clone()));
            } else if self.is_certainly_finite(v.sort()) {
                finite.push(v.clone());
            } else {
                rest.push(v.clone());
            }
        }
        enumerated.sort_by(|a, b| b.0.cmp(&a.0));
        enumerated
            .into_iter()
            .map(|(_, v)| v)
            .chain(finite)
            .chain(rest)
            .collect()
    }

    /// A raw specification whose normalised view equals this one.
    pub fn to_specification(&self) -> DataSpecification {
        let mut spec = DataSpecification::new();
        for s in &self.sorts {
            spec.add_sort(s.clone());
        }
        for (key, value) in &self.aliases {
            let alias = if key.is_basic() {
                Alias {
                    name: key.clone(),
                    rhs: value.clone(),
                }
            } else {
                Alias {
                    name: value.clone(),
                    rhs: key.clone(),
                }
            };
            spec.add_alias(alias);
        }
        for f in &self.constructors {
            spec.add_constructor(f.clone());
        }
        for f in &self.mappings {
            spec.add_mapping(f.clone());
        }
        for e in &self.equations {
            spec.add_equation(e.clone());
        }
        spec
    }
}

impl SortContext for NormalisedSpecification {
    fn normalise_sort(&self, sort: &Sort) -> Sort {
        NormalisedSpecification::normalise_sort(self, sort)
    }

    fn constructors_of(&self, sort: &Sort) -> Vec<FunctionSymbol> {
        NormalisedSpecification::constructors_of(self, sort).to_vec()
    }
}

/// Equality ignores declaration order.
impl PartialEq for NormalisedSpecification {
    fn eq(&self, other: &Self) -> bool {
        self.sorts == other.sorts
            && self.aliases == other.aliases
            && self.constructors == other.constructors
            && self.mappings == other.mappings
            && self.equations == other.equations
    }
}

impl fmt::Debug for NormalisedSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalisedSpecification")
            .field("sorts", &self.sorts.len())
            .field("aliases", &self.aliases)
            .field("constructors", &self.constructors.len())
            .field("mappings", &self.mappings.len())
            .field("equations", &self.equations.len())
            .finish()
    }
}

impl fmt::Display for NormalisedSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let aliases: Vec<Alias> = self
            .aliases
            .iter()
            .map(|(k, v)| {
                if k.is_basic() {
                    Alias {
                        name: k.clone(),
                        rhs: v.clone(),
                    }
                } else {
                    Alias {
                        name: v.clone(),
                        rhs: k.clone(),
                    }
                }
            })
            .collect();
        write_sections(
            f,
            self.sorts.iter(),
            aliases.iter(),
            self.constructors.iter(),
            self.mappings.iter(),
            self.equations.iter(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutation_invalidates_the_normalised_view() {
        let mut spec = DataSpecification::new();
        spec.add_sort(Sort::basic("S"));
        assert!(spec.normalised().is_ok());
        assert!(!spec.needs_normalisation());
        spec.add_mapping(FunctionSymbol::new("c", Sort::basic("S")));
        assert!(spec.needs_normalisation());
        let normal = spec.normalised().unwrap();
        assert_eq!(normal.find_mapping("c").len(), 1);
    }

    #[test]
    fn errors_are_cached_and_repeated() {
        let mut spec = DataSpecification::new();
        spec.add_alias(Alias::new("A", Sort::basic("B")));
        spec.add_alias(Alias::new("B", Sort::basic("A")));
        let first = spec.normalised().unwrap_err();
        let second = spec.normalised().unwrap_err();
        assert_eq!(first, second);
    }

    #[test]
    fn enumerated_variables_come_first() {
        let mut spec = DataSpecification::new();
        let color = Sort::basic("Color");
        spec.add_sort(color.clone());
        for c in ["red", "green", "blue"] {
            spec.add_constructor(FunctionSymbol::new(c, color.clone()));
        }
        let normal = spec.normalised().unwrap();
        let n = Variable::new("n", Sort::nat());
        let b = Variable::new("b", Sort::bool_());
        let c = Variable::new("c", color);
        let ordered = normal.order_variables_to_optimise_enumeration(&[n.clone(), b.clone(), c.clone()]);
        assert_eq!(ordered, vec![c, b, n]);
    }

    #[test]
    fn context_sorts_import_their_functions() {
        let mut spec = DataSpecification::new();
        let list = Sort::list(Sort::nat());
        assert!(spec.normalised().unwrap().find_mapping("<|").is_empty());
        spec.add_context_sort(list.clone());
        assert!(spec.needs_normalisation());
        let normal = spec.normalised().unwrap();
        assert!(normal.sorts().contains(&list));
        assert_eq!(normal.constructors_of(&list).len(), 2);
        assert!(normal.find_mapping("<|").iter().any(|f| f.target_sort() == &list));
        // not a declaration
        assert!(spec.sorts().is_empty());
        assert!(!spec.to_string().contains("List"));
    }

    #[test]
    fn merge_unions_declarations() {
        let mut a = DataSpecification::new();
        a.add_sort(Sort::basic("A"));
        let mut b = DataSpecification::new();
        b.add_sort(Sort::basic("B"));
        b.add_sort(Sort::basic("A"));
        let merged = a + b;
        assert_eq!(merged.sorts().len(), 2);
    }
}

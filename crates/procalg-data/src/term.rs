//! Data expressions: variables, function symbols, applications and binders.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::intern::Interner;
use crate::sort::Sort;
use crate::Name;

static TERMS: Interner<TermKind> = Interner::new();

pub(crate) fn interned_terms() -> usize {
    TERMS.len()
}

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    name: Name,
    sort: Sort,
}

impl Variable {
    pub fn new(name: &str, sort: Sort) -> Self {
        Self {
            name: Name::from(name),
            sort,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    pub fn with_sort(&self, sort: Sort) -> Self {
        Self {
            name: self.name.clone(),
            sort,
        }
    }

    pub fn to_expr(&self) -> DataExpr {
        DataExpr::variable(self.clone())
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.sort)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A named operation. Whether it is a constructor or a mapping is decided by
/// the data specification it is declared in.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionSymbol {
    name: Name,
    sort: Sort,
}

impl FunctionSymbol {
    pub fn new(name: &str, sort: Sort) -> Self {
        Self {
            name: Name::from(name),
            sort,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    pub fn with_sort(&self, sort: Sort) -> Self {
        Self {
            name: self.name.clone(),
            sort,
        }
    }

    pub fn arity(&self) -> usize {
        self.sort.domain().len()
    }

    /// The sort of a fully applied occurrence.
    pub fn target_sort(&self) -> &Sort {
        self.sort.codomain()
    }

    pub fn to_expr(&self) -> DataExpr {
        DataExpr::function(self.clone())
    }

    pub fn apply(&self, arguments: Vec<DataExpr>) -> DataExpr {
        DataExpr::application(self.to_expr(), arguments)
    }
}

impl fmt::Debug for FunctionSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.sort)
    }
}

impl fmt::Display for FunctionSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Binder {
    Lambda,
    Forall,
    Exists,
}

impl Binder {
    pub fn keyword(self) -> &'static str {
        match self {
            Binder::Lambda => "lambda",
            Binder::Forall => "forall",
            Binder::Exists => "exists",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TermKind {
    Variable(Variable),
    Function(FunctionSymbol),
    Application {
        head: DataExpr,
        arguments: Vec<DataExpr>,
    },
    Abstraction {
        binder: Binder,
        variables: Vec<Variable>,
        body: DataExpr,
    },
}

/// A hash-consed data expression.
#[derive(Clone)]
pub struct DataExpr(Arc<TermKind>);

impl DataExpr {
    fn make(kind: TermKind) -> Self {
        DataExpr(TERMS.intern(kind))
    }

    pub fn variable(v: Variable) -> Self {
        Self::make(TermKind::Variable(v))
    }

    pub fn function(f: FunctionSymbol) -> Self {
        Self::make(TermKind::Function(f))
    }

    /// Apply `head` to `arguments`; without arguments this is `head` itself.
    pub fn application(head: DataExpr, arguments: Vec<DataExpr>) -> Self {
        if arguments.is_empty() {
            return head;
        }
        Self::make(TermKind::Application { head, arguments })
    }

    /// Bind `variables` in `body`. Quantifiers without variables collapse
    /// onto their body.
    pub fn abstraction(binder: Binder, variables: Vec<Variable>, body: DataExpr) -> Self {
        if variables.is_empty() && binder != Binder::Lambda {
            return body;
        }
        Self::make(TermKind::Abstraction {
            binder,
            variables,
            body,
        })
    }

    pub fn kind(&self) -> &TermKind {
        &self.0
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match &*self.0 {
            TermKind::Variable(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionSymbol> {
        match &*self.0 {
            TermKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(*self.0, TermKind::Variable(_))
    }

    pub fn is_application(&self) -> bool {
        matches!(*self.0, TermKind::Application { .. })
    }

    pub fn is_abstraction(&self) -> bool {
        matches!(*self.0, TermKind::Abstraction { .. })
    }

    /// Head of an application; the expression itself otherwise.
    pub fn head(&self) -> &DataExpr {
        match &*self.0 {
            TermKind::Application { head, .. } => head,
            _ => self,
        }
    }

    pub fn arguments(&self) -> &[DataExpr] {
        match &*self.0 {
            TermKind::Application { arguments, .. } => arguments,
            _ => &[],
        }
    }

    /// The function symbol at the root of a (possibly curried) application.
    pub fn head_symbol(&self) -> Option<&FunctionSymbol> {
        let mut current = self;
        loop {
            match &*current.0 {
                TermKind::Function(f) => return Some(f),
                TermKind::Application { head, .. } => current = head,
                _ => return None,
            }
        }
    }

    /// True when this is an application of a function symbol named `name`
    /// to exactly `arity` arguments.
    pub fn is_application_of(&self, name: &str, arity: usize) -> bool {
        match &*self.0 {
            TermKind::Application { head, arguments } => {
                arguments.len() == arity && head.as_function().is_some_and(|f| f.name() == name)
            }
            TermKind::Function(f) => arity == 0 && f.name() == name,
            _ => false,
        }
    }

    pub fn sort(&self) -> Sort {
        match &*self.0 {
            TermKind::Variable(v) => v.sort().clone(),
            TermKind::Function(f) => f.sort().clone(),
            TermKind::Application { head, .. } => head.sort().codomain().clone(),
            TermKind::Abstraction {
                binder: Binder::Lambda,
                variables,
                body,
            } => Sort::function(
                variables.iter().map(|v| v.sort().clone()).collect(),
                body.sort(),
            ),
            TermKind::Abstraction { .. } => Sort::bool_(),
        }
    }

    pub fn is_true(&self) -> bool {
        self.as_function()
            .is_some_and(|f| f.name() == "true" && f.sort().is_bool())
    }

    pub fn is_false(&self) -> bool {
        self.as_function()
            .is_some_and(|f| f.name() == "false" && f.sort().is_bool())
    }

    pub fn size(&self) -> usize {
        match &*self.0 {
            TermKind::Variable(_) | TermKind::Function(_) => 1,
            TermKind::Application { head, arguments } => {
                head.size() + arguments.iter().map(DataExpr::size).sum::<usize>()
            }
            TermKind::Abstraction { body, variables, .. } => 1 + variables.len() + body.size(),
        }
    }

    /// Free variables in order of first occurrence.
    pub fn free_variables(&self) -> IndexSet<Variable> {
        let mut result = IndexSet::new();
        self.collect_free_variables(&mut Vec::new(), &mut result);
        result
    }

    fn collect_free_variables(&self, bound: &mut Vec<Variable>, result: &mut IndexSet<Variable>) {
        match &*self.0 {
            TermKind::Variable(v) => {
                if !bound.contains(v) {
                    result.insert(v.clone());
                }
            }
            TermKind::Function(_) => {}
            TermKind::Application { head, arguments } => {
                head.collect_free_variables(bound, result);
                for a in arguments {
                    a.collect_free_variables(bound, result);
                }
            }
            TermKind::Abstraction {
                variables, body, ..
            } => {
                let depth = bound.len();
                bound.extend(variables.iter().cloned());
                body.collect_free_variables(bound, result);
                bound.truncate(depth);
            }
        }
    }

    /// True when `v` occurs free in the expression.
    pub fn occurs(&self, v: &Variable) -> bool {
        match &*self.0 {
            TermKind::Variable(w) => w == v,
            TermKind::Function(_) => false,
            TermKind::Application { head, arguments } => {
                head.occurs(v) || arguments.iter().any(|a| a.occurs(v))
            }
            TermKind::Abstraction {
                variables, body, ..
            } => !variables.contains(v) && body.occurs(v),
        }
    }

    pub fn substitute(&self, sigma: &Substitution) -> DataExpr {
        if sigma.is_empty() {
            return self.clone();
        }
        match &*self.0 {
            TermKind::Variable(v) => sigma.get(v).cloned().unwrap_or_else(|| self.clone()),
            TermKind::Function(_) => self.clone(),
            TermKind::Application { head, arguments } => DataExpr::application(
                head.substitute(sigma),
                arguments.iter().map(|a| a.substitute(sigma)).collect(),
            ),
            TermKind::Abstraction {
                binder,
                variables,
                body,
            } => {
                if variables.iter().any(|v| sigma.contains(v)) {
                    let mut inner = sigma.clone();
                    for v in variables {
                        inner.remove(v);
                    }
                    DataExpr::abstraction(*binder, variables.clone(), body.substitute(&inner))
                } else {
                    DataExpr::abstraction(*binder, variables.clone(), body.substitute(sigma))
                }
            }
        }
    }

    /// Replace every occurrence of the subterm `from` by `to`.
    pub fn replace(&self, from: &DataExpr, to: &DataExpr) -> DataExpr {
        if self == from {
            return to.clone();
        }
        match &*self.0 {
            TermKind::Variable(_) | TermKind::Function(_) => self.clone(),
            TermKind::Application { head, arguments } => DataExpr::application(
                head.replace(from, to),
                arguments.iter().map(|a| a.replace(from, to)).collect(),
            ),
            TermKind::Abstraction {
                binder,
                variables,
                body,
            } => {
                if from.free_variables().iter().any(|v| variables.contains(v)) {
                    self.clone()
                } else {
                    DataExpr::abstraction(*binder, variables.clone(), body.replace(from, to))
                }
            }
        }
    }

    /// Rebuild the expression with every sort mapped through `f`.
    pub fn map_sorts(&self, f: &mut dyn FnMut(&Sort) -> Sort) -> DataExpr {
        match &*self.0 {
            TermKind::Variable(v) => DataExpr::variable(v.with_sort(f(v.sort()))),
            TermKind::Function(s) => DataExpr::function(s.with_sort(f(s.sort()))),
            TermKind::Application { head, arguments } => DataExpr::application(
                head.map_sorts(f),
                arguments.iter().map(|a| a.map_sorts(f)).collect(),
            ),
            TermKind::Abstraction {
                binder,
                variables,
                body,
            } => DataExpr::abstraction(
                *binder,
                variables.iter().map(|v| v.with_sort(f(v.sort()))).collect(),
                body.map_sorts(f),
            ),
        }
    }

    /// Visit every subterm, outermost first.
    pub fn for_each_subterm(&self, f: &mut dyn FnMut(&DataExpr)) {
        f(self);
        match &*self.0 {
            TermKind::Variable(_) | TermKind::Function(_) => {}
            TermKind::Application { head, arguments } => {
                head.for_each_subterm(f);
                for a in arguments {
                    a.for_each_subterm(f);
                }
            }
            TermKind::Abstraction { body, .. } => body.for_each_subterm(f),
        }
    }

    /// Every sort mentioned by the expression, including binder sorts.
    pub fn sorts(&self) -> IndexSet<Sort> {
        let mut result = IndexSet::new();
        self.for_each_subterm(&mut |t| match t.kind() {
            TermKind::Variable(v) => {
                result.insert(v.sort().clone());
            }
            TermKind::Function(f) => {
                result.insert(f.sort().clone());
            }
            TermKind::Abstraction { variables, .. } => {
                result.extend(variables.iter().map(|v| v.sort().clone()));
            }
            TermKind::Application { .. } => {}
        });
        result
    }
}

impl PartialEq for DataExpr {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for DataExpr {}

impl Hash for DataExpr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl PartialOrd for DataExpr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DataExpr {
    fn cmp(&self, other: &Self) -> Ordering {
        if Arc::ptr_eq(&self.0, &other.0) {
            return Ordering::Equal;
        }
        self.0.cmp(&other.0)
    }
}

/// A finite map from variables to expressions, applied simultaneously.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution(IndexMap<Variable, DataExpr>);

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(v: Variable, e: DataExpr) -> Self {
        let mut sigma = Self::new();
        sigma.insert(v, e);
        sigma
    }

    pub fn insert(&mut self, v: Variable, e: DataExpr) -> Option<DataExpr> {
        self.0.insert(v, e)
    }

    pub fn remove(&mut self, v: &Variable) -> Option<DataExpr> {
        self.0.shift_remove(v)
    }

    pub fn get(&self, v: &Variable) -> Option<&DataExpr> {
        self.0.get(v)
    }

    pub fn contains(&self, v: &Variable) -> bool {
        self.0.contains_key(v)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &DataExpr)> {
        self.0.iter()
    }

    pub fn apply(&self, e: &DataExpr) -> DataExpr {
        e.substitute(self)
    }
}

impl FromIterator<(Variable, DataExpr)> for Substitution {
    fn from_iter<I: IntoIterator<Item = (Variable, DataExpr)>>(iter: I) -> Self {
        Substitution(iter.into_iter().collect())
    }
}

const INFIX: &[&str] = &[
    "&&", "||", "=>", "==", "!=", "<", "<=", ">", ">=", "+", "-", "*", "|>", "<|", "++",
];

fn write_operand(f: &mut fmt::Formatter<'_>, e: &DataExpr) -> fmt::Result {
    let needs_parens = match e.kind() {
        TermKind::Application { head, arguments } => {
            arguments.len() == 2 && head.as_function().is_some_and(|s| INFIX.contains(&s.name()))
        }
        TermKind::Abstraction { .. } => true,
        _ => false,
    };
    if needs_parens {
        write!(f, "({e})")
    } else {
        write!(f, "{e}")
    }
}

impl fmt::Display for DataExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = crate::standard::numbers::integer_value(self) {
            return write!(f, "{n}");
        }
        match &*self.0 {
            TermKind::Variable(v) => write!(f, "{v}"),
            TermKind::Function(s) => write!(f, "{s}"),
            TermKind::Application { head, arguments } => {
                if let Some(s) = head.as_function() {
                    if arguments.len() == 2 && INFIX.contains(&s.name()) {
                        write_operand(f, &arguments[0])?;
                        write!(f, " {} ", s.name())?;
                        return write_operand(f, &arguments[1]);
                    }
                    if arguments.len() == 1 && (s.name() == "!" || s.name() == "-") {
                        write!(f, "{}", s.name())?;
                        return write_operand(f, &arguments[0]);
                    }
                }
                write_operand(f, head)?;
                write!(f, "(")?;
                for (i, a) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, ")")
            }
            TermKind::Abstraction {
                binder,
                variables,
                body,
            } => {
                write!(f, "{} ", binder.keyword())?;
                for (i, v) in variables.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", v.name(), v.sort())?;
                }
                write!(f, ". {body}")
            }
        }
    }
}

impl fmt::Debug for DataExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standard::boolean;

    fn var(name: &str) -> Variable {
        Variable::new(name, Sort::bool_())
    }

    #[test]
    fn application_without_arguments_is_the_head() {
        let t = boolean::true_();
        assert_eq!(DataExpr::application(t.clone(), vec![]), t);
    }

    #[test]
    fn substitution_respects_binders() {
        let x = var("x");
        let y = var("y");
        let body = boolean::and(x.to_expr(), y.to_expr());
        let e = DataExpr::abstraction(Binder::Forall, vec![x.clone()], body);
        let sigma: Substitution = [
            (x.clone(), boolean::false_()),
            (y.clone(), boolean::true_()),
        ]
        .into_iter()
        .collect();
        let expected = DataExpr::abstraction(
            Binder::Forall,
            vec![x.clone()],
            boolean::and(x.to_expr(), boolean::true_()),
        );
        assert_eq!(e.substitute(&sigma), expected);
        assert!(!e.occurs(&x));
        assert!(e.occurs(&y));
    }

    #[test]
    fn free_variables_in_first_occurrence_order() {
        let e = boolean::or(var("b").to_expr(), boolean::and(var("a").to_expr(), var("b").to_expr()));
        let names: Vec<_> = e.free_variables().iter().map(|v| v.name().to_string()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn replace_swaps_guard_occurrences() {
        let b = var("b").to_expr();
        let e = boolean::or(b.clone(), boolean::not(b.clone()));
        let replaced = e.replace(&b, &boolean::true_());
        assert_eq!(replaced, boolean::or(boolean::true_(), boolean::not(boolean::true_())));
    }

    #[test]
    fn display_prints_infix_and_numerals() {
        let n = Variable::new("n", Sort::nat());
        let e = crate::standard::numbers::less(
            crate::standard::numbers::nat(3),
            n.to_expr(),
        );
        assert_eq!(e.to_string(), "3 < n");
        let f = boolean::not(boolean::and(var("a").to_expr(), var("b").to_expr()));
        assert_eq!(f.to_string(), "!(a && b)");
    }
}

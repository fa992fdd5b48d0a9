//! Sort expressions.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::intern::Interner;
use crate::Name;

static SORTS: Interner<SortKind> = Interner::new();

pub(crate) fn interned_sorts() -> usize {
    SORTS.len()
}

/// The container constructors of the sort language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContainerKind {
    List,
    Set,
    Bag,
    FSet,
    FBag,
}

impl ContainerKind {
    pub fn name(self) -> &'static str {
        match self {
            ContainerKind::List => "List",
            ContainerKind::Set => "Set",
            ContainerKind::Bag => "Bag",
            ContainerKind::FSet => "FSet",
            ContainerKind::FBag => "FBag",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "List" => Some(ContainerKind::List),
            "Set" => Some(ContainerKind::Set),
            "Bag" => Some(ContainerKind::Bag),
            "FSet" => Some(ContainerKind::FSet),
            "FBag" => Some(ContainerKind::FBag),
            _ => None,
        }
    }
}

/// An argument of a structured-sort constructor, optionally named by its
/// projection function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructArgument {
    pub name: Option<Name>,
    pub sort: Sort,
}

impl StructArgument {
    pub fn new(name: Option<&str>, sort: Sort) -> Self {
        Self {
            name: name.map(Name::from),
            sort,
        }
    }
}

/// One alternative of a structured sort.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructConstructor {
    pub name: Name,
    pub arguments: Vec<StructArgument>,
    pub recogniser: Option<Name>,
}

impl StructConstructor {
    pub fn new(name: &str, arguments: Vec<StructArgument>, recogniser: Option<&str>) -> Self {
        Self {
            name: Name::from(name),
            arguments,
            recogniser: recogniser.map(Name::from),
        }
    }

    pub fn constant(name: &str) -> Self {
        Self::new(name, Vec::new(), None)
    }
}

#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SortKind {
    Basic(Name),
    Function { domain: Vec<Sort>, codomain: Sort },
    Container { kind: ContainerKind, element: Sort },
    Structured(Vec<StructConstructor>),
}

/// A hash-consed sort expression. Cloning is a reference-count bump and
/// equality is pointer equality.
#[derive(Clone)]
pub struct Sort(Arc<SortKind>);

impl Sort {
    fn make(kind: SortKind) -> Self {
        Sort(SORTS.intern(kind))
    }

    pub fn basic(name: &str) -> Self {
        Self::make(SortKind::Basic(Name::from(name)))
    }

    /// A function sort. An empty domain yields the codomain itself.
    pub fn function(domain: Vec<Sort>, codomain: Sort) -> Self {
        if domain.is_empty() {
            return codomain;
        }
        Self::make(SortKind::Function { domain, codomain })
    }

    pub fn container(kind: ContainerKind, element: Sort) -> Self {
        Self::make(SortKind::Container { kind, element })
    }

    pub fn structured(constructors: Vec<StructConstructor>) -> Self {
        Self::make(SortKind::Structured(constructors))
    }

    pub fn list(element: Sort) -> Self {
        Self::container(ContainerKind::List, element)
    }

    pub fn set(element: Sort) -> Self {
        Self::container(ContainerKind::Set, element)
    }

    pub fn bag(element: Sort) -> Self {
        Self::container(ContainerKind::Bag, element)
    }

    pub fn fset(element: Sort) -> Self {
        Self::container(ContainerKind::FSet, element)
    }

    pub fn fbag(element: Sort) -> Self {
        Self::container(ContainerKind::FBag, element)
    }

    pub fn bool_() -> Self {
        Self::basic("Bool")
    }

    pub fn pos() -> Self {
        Self::basic("Pos")
    }

    pub fn nat() -> Self {
        Self::basic("Nat")
    }

    pub fn int_() -> Self {
        Self::basic("Int")
    }

    pub fn real_() -> Self {
        Self::basic("Real")
    }

    pub fn kind(&self) -> &SortKind {
        &self.0
    }

    pub fn is_basic(&self) -> bool {
        matches!(*self.0, SortKind::Basic(_))
    }

    pub fn is_function(&self) -> bool {
        matches!(*self.0, SortKind::Function { .. })
    }

    pub fn is_container(&self) -> bool {
        matches!(*self.0, SortKind::Container { .. })
    }

    pub fn is_structured(&self) -> bool {
        matches!(*self.0, SortKind::Structured(_))
    }

    pub fn basic_name(&self) -> Option<&str> {
        match &*self.0 {
            SortKind::Basic(name) => Some(name),
            _ => None,
        }
    }

    pub fn container_kind(&self) -> Option<ContainerKind> {
        match &*self.0 {
            SortKind::Container { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn element(&self) -> Option<&Sort> {
        match &*self.0 {
            SortKind::Container { element, .. } => Some(element),
            _ => None,
        }
    }

    pub fn is_container_of(&self, kind: ContainerKind) -> bool {
        self.container_kind() == Some(kind)
    }

    /// Domain of a function sort; empty for every other sort.
    pub fn domain(&self) -> &[Sort] {
        match &*self.0 {
            SortKind::Function { domain, .. } => domain,
            _ => &[],
        }
    }

    /// Codomain of a function sort; the sort itself otherwise.
    pub fn codomain(&self) -> &Sort {
        match &*self.0 {
            SortKind::Function { codomain, .. } => codomain,
            _ => self,
        }
    }

    pub fn is_bool(&self) -> bool {
        self.basic_name() == Some("Bool")
    }

    /// True for the sorts of the numeric tower.
    pub fn is_numeric(&self) -> bool {
        matches!(self.basic_name(), Some("Pos" | "Nat" | "Int" | "Real"))
    }

    /// True for sorts whose data types are generated rather than declared.
    pub fn is_system_defined(&self) -> bool {
        self.is_bool() || self.is_numeric() || self.is_container()
    }

    /// Number of nodes in the sort expression.
    pub fn size(&self) -> usize {
        match &*self.0 {
            SortKind::Basic(_) => 1,
            SortKind::Function { domain, codomain } => {
                1 + codomain.size() + domain.iter().map(Sort::size).sum::<usize>()
            }
            SortKind::Container { element, .. } => 1 + element.size(),
            SortKind::Structured(constructors) => {
                1 + constructors
                    .iter()
                    .flat_map(|c| c.arguments.iter())
                    .map(|a| a.sort.size())
                    .sum::<usize>()
            }
        }
    }
}

impl PartialEq for Sort {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Sort {}

impl Hash for Sort {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl PartialOrd for Sort {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Sort {
    fn cmp(&self, other: &Self) -> Ordering {
        if Arc::ptr_eq(&self.0, &other.0) {
            return Ordering::Equal;
        }
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            SortKind::Basic(name) => write!(f, "{name}"),
            SortKind::Function { domain, codomain } => {
                for (i, s) in domain.iter().enumerate() {
                    if i > 0 {
                        write!(f, " # ")?;
                    }
                    if s.is_function() {
                        write!(f, "({s})")?;
                    } else {
                        write!(f, "{s}")?;
                    }
                }
                write!(f, " -> {codomain}")
            }
            SortKind::Container { kind, element } => write!(f, "{}({element})", kind.name()),
            SortKind::Structured(constructors) => {
                write!(f, "struct ")?;
                for (i, c) in constructors.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", c.name)?;
                    if !c.arguments.is_empty() {
                        write!(f, "(")?;
                        for (j, a) in c.arguments.iter().enumerate() {
                            if j > 0 {
                                write!(f, ", ")?;
                            }
                            match &a.name {
                                Some(name) => write!(f, "{name}: {}", a.sort)?,
                                None => write!(f, "{}", a.sort)?,
                            }
                        }
                        write!(f, ")")?;
                    }
                    if let Some(r) = &c.recogniser {
                        write!(f, "?{r}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sort({self})")
    }
}

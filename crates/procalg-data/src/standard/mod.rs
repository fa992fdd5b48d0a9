//! Programmatically generated data types.
//!
//! Each system-defined sort (Bool, the numeric tower and the containers) and
//! every structured sort comes with constructors, mappings and equations that
//! are generated here rather than declared by the user. Every sort
//! additionally gets the standard mappings `==`, `!=` and `if`.

pub mod boolean;
pub mod containers;
pub mod numbers;
pub mod structured;

use crate::equation::DataEquation;
use crate::sort::{ContainerKind, Sort, SortKind};
use crate::term::{DataExpr, FunctionSymbol, Variable};

/// The generated part of a data type.
#[derive(Debug, Clone, Default)]
pub struct DataTypeDefinition {
    pub constructors: Vec<FunctionSymbol>,
    pub mappings: Vec<FunctionSymbol>,
    pub equations: Vec<DataEquation>,
}

impl DataTypeDefinition {
    pub fn extend(&mut self, other: DataTypeDefinition) {
        self.constructors.extend(other.constructors);
        self.mappings.extend(other.mappings);
        self.equations.extend(other.equations);
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty() && self.mappings.is_empty() && self.equations.is_empty()
    }
}

/// Everything generated for `sort`, including its standard mappings.
pub fn definition(sort: &Sort) -> DataTypeDefinition {
    let mut result = match sort.kind() {
        SortKind::Basic(name) => match &**name {
            "Bool" => boolean::definition(),
            "Pos" => numbers::pos_definition(),
            "Nat" => numbers::nat_definition(),
            "Int" => numbers::int_definition(),
            "Real" => numbers::real_definition(),
            _ => DataTypeDefinition::default(),
        },
        SortKind::Container { kind, element } => containers::definition(*kind, element),
        SortKind::Structured(constructors) => structured::definition(sort, constructors),
        SortKind::Function { .. } => DataTypeDefinition::default(),
    };
    result.extend(standard_definition(sort));
    result
}

/// Sorts whose definitions must be present before `sort` can be used.
pub fn import_dependencies(sort: &Sort) -> Vec<Sort> {
    match sort.kind() {
        SortKind::Basic(name) => match &**name {
            "Real" => vec![Sort::int_()],
            "Int" => vec![Sort::nat()],
            "Nat" => vec![Sort::pos()],
            "Pos" => vec![Sort::bool_()],
            _ => Vec::new(),
        },
        SortKind::Function { domain, codomain } => {
            let mut result = domain.clone();
            result.push(codomain.clone());
            result
        }
        SortKind::Container { kind, element } => {
            let e = element.clone();
            match kind {
                ContainerKind::List => vec![e, Sort::nat()],
                ContainerKind::FSet => vec![e],
                ContainerKind::Set => vec![
                    e.clone(),
                    Sort::fset(e.clone()),
                    Sort::function(vec![e], Sort::bool_()),
                ],
                ContainerKind::FBag => vec![e, Sort::nat()],
                ContainerKind::Bag => vec![
                    e.clone(),
                    Sort::nat(),
                    Sort::set(e.clone()),
                    Sort::fbag(e.clone()),
                    Sort::function(vec![e], Sort::nat()),
                ],
            }
        }
        SortKind::Structured(constructors) => {
            let mut result = vec![Sort::bool_()];
            for c in constructors {
                for a in &c.arguments {
                    if !result.contains(&a.sort) {
                        result.push(a.sort.clone());
                    }
                }
            }
            result
        }
    }
}

pub fn equal_to_symbol(s: &Sort) -> FunctionSymbol {
    FunctionSymbol::new("==", Sort::function(vec![s.clone(), s.clone()], Sort::bool_()))
}

pub fn not_equal_to_symbol(s: &Sort) -> FunctionSymbol {
    FunctionSymbol::new("!=", Sort::function(vec![s.clone(), s.clone()], Sort::bool_()))
}

pub fn if_symbol(s: &Sort) -> FunctionSymbol {
    FunctionSymbol::new(
        "if",
        Sort::function(vec![Sort::bool_(), s.clone(), s.clone()], s.clone()),
    )
}

pub fn equal_to(a: DataExpr, b: DataExpr) -> DataExpr {
    equal_to_symbol(&a.sort()).apply(vec![a, b])
}

pub fn not_equal_to(a: DataExpr, b: DataExpr) -> DataExpr {
    not_equal_to_symbol(&a.sort()).apply(vec![a, b])
}

pub fn if_(c: DataExpr, then: DataExpr, otherwise: DataExpr) -> DataExpr {
    if_symbol(&then.sort()).apply(vec![c, then, otherwise])
}

/// `(lhs, rhs)` when `e` is an equality.
pub fn as_equality(e: &DataExpr) -> Option<(&DataExpr, &DataExpr)> {
    if e.is_application_of("==", 2) {
        let args = e.arguments();
        Some((&args[0], &args[1]))
    } else {
        None
    }
}

/// `(condition, then, else)` when `e` is an if-then-else.
pub fn as_if(e: &DataExpr) -> Option<(&DataExpr, &DataExpr, &DataExpr)> {
    if e.is_application_of("if", 3) {
        let args = e.arguments();
        Some((&args[0], &args[1], &args[2]))
    } else {
        None
    }
}

fn standard_definition(s: &Sort) -> DataTypeDefinition {
    let x = Variable::new("x", s.clone()).to_expr();
    let y = Variable::new("y", s.clone()).to_expr();
    let b = Variable::new("b", Sort::bool_()).to_expr();
    let t = boolean::true_();
    let f = boolean::false_();
    DataTypeDefinition {
        constructors: Vec::new(),
        mappings: vec![equal_to_symbol(s), not_equal_to_symbol(s), if_symbol(s)],
        equations: vec![
            DataEquation::new(equal_to(x.clone(), x.clone()), t.clone()),
            DataEquation::new(
                not_equal_to(x.clone(), y.clone()),
                boolean::not(equal_to(x.clone(), y.clone())),
            ),
            DataEquation::new(if_(t, x.clone(), y.clone()), x.clone()),
            DataEquation::new(if_(f, x.clone(), y.clone()), y),
            DataEquation::new(if_(b, x.clone(), x.clone()), x),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bag_imports_set_and_nat() {
        let deps = import_dependencies(&Sort::bag(Sort::bool_()));
        assert!(deps.contains(&Sort::nat()));
        assert!(deps.contains(&Sort::set(Sort::bool_())));
    }

    #[test]
    fn every_sort_gets_standard_mappings() {
        let s = Sort::basic("S");
        let def = definition(&s);
        let names: Vec<_> = def.mappings.iter().map(|f| f.name().to_string()).collect();
        assert_eq!(names, vec!["==", "!=", "if"]);
        assert_eq!(def.equations.len(), 5);
    }
}

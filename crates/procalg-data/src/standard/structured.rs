//! Constructors, projections and recognisers generated for `struct` sorts.

use super::boolean::{and, false_, true_};
use super::{equal_to, DataTypeDefinition};
use crate::equation::DataEquation;
use crate::sort::{Sort, StructConstructor};
use crate::term::{DataExpr, FunctionSymbol, Variable};

/// The constructor function of alternative `c` of the structured sort `sort`.
pub fn constructor_function(sort: &Sort, c: &StructConstructor) -> FunctionSymbol {
    FunctionSymbol::new(
        &c.name,
        Sort::function(c.arguments.iter().map(|a| a.sort.clone()).collect(), sort.clone()),
    )
}

fn arguments(c: &StructConstructor, prefix: &str) -> Vec<DataExpr> {
    c.arguments
        .iter()
        .enumerate()
        .map(|(i, a)| Variable::new(&format!("{prefix}{}", i + 1), a.sort.clone()).to_expr())
        .collect()
}

pub(super) fn definition(sort: &Sort, constructors: &[StructConstructor]) -> DataTypeDefinition {
    let mut result = DataTypeDefinition::default();
    let functions: Vec<FunctionSymbol> = constructors
        .iter()
        .map(|c| constructor_function(sort, c))
        .collect();
    result.constructors.extend(functions.iter().cloned());

    for (i, (c, f)) in constructors.iter().zip(&functions).enumerate() {
        let xs = arguments(c, "x");
        let term = f.apply(xs.clone());

        for (a, x) in c.arguments.iter().zip(&xs) {
            if let Some(name) = &a.name {
                let projection =
                    FunctionSymbol::new(name, Sort::function(vec![sort.clone()], a.sort.clone()));
                if !result.mappings.contains(&projection) {
                    result.mappings.push(projection.clone());
                }
                result
                    .equations
                    .push(DataEquation::new(projection.apply(vec![term.clone()]), x.clone()));
            }
        }

        if let Some(name) = &c.recogniser {
            let recogniser =
                FunctionSymbol::new(name, Sort::function(vec![sort.clone()], Sort::bool_()));
            result.mappings.push(recogniser.clone());
            for (j, (d, g)) in constructors.iter().zip(&functions).enumerate() {
                let other = g.apply(arguments(d, "y"));
                let value = if i == j { true_() } else { false_() };
                result
                    .equations
                    .push(DataEquation::new(recogniser.apply(vec![other]), value));
            }
        }

        for (j, (d, g)) in constructors.iter().zip(&functions).enumerate() {
            let ys = arguments(d, "y");
            let other = g.apply(ys.clone());
            let rhs = if i == j {
                let pairs: Vec<DataExpr> = xs
                    .iter()
                    .zip(&ys)
                    .map(|(x, y)| equal_to(x.clone(), y.clone()))
                    .collect();
                if pairs.is_empty() {
                    continue;
                }
                pairs.into_iter().reduce(and).unwrap_or_else(true_)
            } else {
                false_()
            };
            result
                .equations
                .push(DataEquation::new(equal_to(term.clone(), other), rhs));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::StructArgument;

    #[test]
    fn enumerated_struct_gets_pairwise_disequalities() {
        let color = Sort::structured(vec![
            StructConstructor::constant("red"),
            StructConstructor::constant("green"),
        ]);
        let def = super::super::definition(&color);
        assert_eq!(def.constructors.len(), 2);
        // red == green, green == red, plus the five standard equations
        assert_eq!(def.equations.len(), 2 + 5);
    }

    #[test]
    fn projections_and_recognisers_are_generated() {
        let tree = Sort::basic("Tree");
        let s = Sort::structured(vec![
            StructConstructor::new("leaf", vec![], Some("is_leaf")),
            StructConstructor::new(
                "node",
                vec![
                    StructArgument::new(Some("left"), tree.clone()),
                    StructArgument::new(Some("right"), tree),
                ],
                None,
            ),
        ]);
        let def = definition(&s, match s.kind() {
            crate::sort::SortKind::Structured(cs) => cs,
            _ => unreachable!(),
        });
        let names: Vec<_> = def.mappings.iter().map(|f| f.name().to_string()).collect();
        assert_eq!(names, vec!["is_leaf", "left", "right"]);
    }
}

//! Translation of guard conjunctions into SMT-LIB benchmarks.
//!
//! Sorts without an arithmetic counterpart are declared as `sort0`,
//! `sort1`, ... and function symbols the solver does not know as `op0`,
//! `op1`, ..., numbered in order of first use. Notes in the output map the
//! generated names back to the source names. Boolean-valued terms in
//! predicate positions are wrapped in the predicate `bool2pred`.

use std::fmt::Write as _;

use indexmap::IndexSet;
use procalg_data::standard::numbers::integer_value;
use procalg_data::{DataExpr, FunctionSymbol, Sort, TermKind, Variable};

use crate::backends::smtlib_printer::{symbol, to_smtlib, Dialect};
use crate::error::SmtError;
use crate::terms::{SmtSort, SmtTerm};

const BOOL2PRED: &str = "bool2pred";

/// A conjunction of guards in SMT-LIB form.
#[derive(Debug, Clone)]
pub struct SmtLibBenchmark {
    clauses: Vec<SmtTerm>,
    sorts: IndexSet<Sort>,
    operators: IndexSet<FunctionSymbol>,
    variables: IndexSet<Variable>,
    operator_signatures: Vec<(Vec<SmtSort>, SmtSort)>,
    variable_sorts: Vec<SmtSort>,
    bool2pred: Option<SmtSort>,
}

impl SmtLibBenchmark {
    pub fn new(guards: &[DataExpr]) -> Result<Self, SmtError> {
        let mut t = Translator::default();
        let mut clauses = guards
            .iter()
            .map(|g| t.clause(g, true))
            .collect::<Result<Vec<_>, _>>()?;
        for v in &t.variables {
            let bound = match v.sort().basic_name() {
                Some("Nat") => 0,
                Some("Pos") => 1,
                _ => continue,
            };
            clauses.push(SmtTerm::binary(">=", SmtTerm::var(v.name()), SmtTerm::int(bound)));
        }

        // Sorts are numbered while declaring: variables first, then
        // operators, then the predicate.
        let mut sorts = IndexSet::new();
        let variable_sorts = t
            .variables
            .iter()
            .map(|v| smt_sort(v.sort(), &mut sorts))
            .collect();
        let mut operator_signatures = Vec::with_capacity(t.operators.len());
        for f in &t.operators {
            let mut domain = Vec::new();
            let mut sort = f.sort().clone();
            while sort.is_function() {
                for d in sort.domain() {
                    if d.is_function() {
                        return Err(SmtError::FunctionSort {
                            symbol: f.name().to_string(),
                        });
                    }
                    domain.push(smt_sort(d, &mut sorts));
                }
                sort = sort.codomain().clone();
            }
            operator_signatures.push((domain, smt_sort(&sort, &mut sorts)));
        }
        let bool2pred = t.bool2pred.then(|| smt_sort(&Sort::bool_(), &mut sorts));

        Ok(Self {
            clauses,
            sorts,
            operators: t.operators,
            variables: t.variables,
            operator_signatures,
            variable_sorts,
            bool2pred,
        })
    }

    pub fn sorts(&self) -> &IndexSet<Sort> {
        &self.sorts
    }

    pub fn operators(&self) -> &IndexSet<FunctionSymbol> {
        &self.operators
    }

    pub fn variables(&self) -> &IndexSet<Variable> {
        &self.variables
    }

    pub fn uses_bool2pred(&self) -> bool {
        self.bool2pred.is_some()
    }

    /// The benchmark in the SMT-LIB 1.2 layout.
    pub fn to_benchmark(&self) -> String {
        let d = Dialect::Legacy;
        let mut out = String::from("(benchmark nameless\n");
        if !self.sorts.is_empty() {
            out.push_str("  :notes \"");
            for (i, s) in self.sorts.iter().enumerate() {
                let _ = write!(out, "(sort{i} = {s})");
            }
            out.push_str("\"\n");
        }
        if !self.operators.is_empty() {
            out.push_str("  :notes \"");
            for (i, f) in self.operators.iter().enumerate() {
                let _ = write!(out, "(op{i} = {})", f.name());
            }
            out.push_str("\"\n");
        }
        if self.bool2pred.is_some() {
            out.push_str("  :notes \"bool2pred was introduced, because the smt-lib format cannot deal\"\n");
            out.push_str("  :notes \"with boolean variables or functions returning boolean values.\"\n");
        }
        if !self.sorts.is_empty() {
            let names: Vec<String> = (0..self.sorts.len()).map(|i| format!("sort{i}")).collect();
            let _ = writeln!(out, "  :extrasorts ({})", names.join(" "));
        }
        if !self.operators.is_empty() {
            out.push_str("  :extrafuns (");
            for (i, (domain, codomain)) in self.operator_signatures.iter().enumerate() {
                let _ = write!(out, "(op{i}");
                for s in domain.iter().chain(std::iter::once(codomain)) {
                    let _ = write!(out, " {s}");
                }
                out.push(')');
            }
            out.push_str(")\n");
        }
        if !self.variables.is_empty() {
            out.push_str("  :extrafuns (");
            for (v, s) in self.variables.iter().zip(&self.variable_sorts) {
                let _ = write!(out, "({} {s})", symbol(v.name(), d));
            }
            out.push_str(")\n");
        }
        if let Some(s) = self.bool2pred {
            let _ = writeln!(out, "  :extrapreds (({BOOL2PRED} {s}))");
        }
        out.push_str("  :formula (and");
        for c in &self.clauses {
            out.push(' ');
            out.push_str(&to_smtlib(c, d));
        }
        out.push_str(")\n)\n");
        out
    }

    /// SMT-LIB 2 declarations followed by one assertion of the conjunction.
    pub fn commands(&self) -> Vec<String> {
        let d = Dialect::V2;
        let mut commands = Vec::new();
        for (i, s) in self.sorts.iter().enumerate() {
            commands.push(format!("(declare-sort sort{i} 0) ; {s}"));
        }
        for (i, ((domain, codomain), f)) in self.operator_signatures.iter().zip(&self.operators).enumerate() {
            let domain: Vec<String> = domain.iter().map(SmtSort::to_string).collect();
            commands.push(format!(
                "(declare-fun op{i} ({}) {codomain}) ; {}",
                domain.join(" "),
                f.name()
            ));
        }
        for (v, s) in self.variables.iter().zip(&self.variable_sorts) {
            commands.push(format!("(declare-const {} {s})", symbol(v.name(), d)));
        }
        if let Some(s) = self.bool2pred {
            commands.push(format!("(declare-fun {BOOL2PRED} ({s}) Bool)"));
        }
        commands.push(format!(
            "(assert {})",
            to_smtlib(&SmtTerm::And(self.clauses.clone()), d)
        ));
        commands
    }

    /// A complete SMT-LIB 2 script checking the conjunction.
    pub fn to_script(&self) -> String {
        let mut out = String::from("(set-logic ALL)\n");
        for c in self.commands() {
            out.push_str(&c);
            out.push('\n');
        }
        out.push_str("(check-sat)\n");
        out
    }
}

fn smt_sort(sort: &Sort, sorts: &mut IndexSet<Sort>) -> SmtSort {
    match sort.basic_name() {
        Some("Int" | "Nat" | "Pos") => SmtSort::Int,
        Some("Real") => SmtSort::Real,
        _ => SmtSort::Uninterpreted(sorts.insert_full(sort.clone()).0),
    }
}

#[derive(Default)]
struct Translator {
    operators: IndexSet<FunctionSymbol>,
    variables: IndexSet<Variable>,
    bool2pred: bool,
}

impl Translator {
    fn clause(&mut self, e: &DataExpr, predicate: bool) -> Result<SmtTerm, SmtError> {
        if e.sort().is_numeric() {
            if let Some(n) = integer_value(e) {
                return Ok(SmtTerm::int(n));
            }
        }
        if predicate && (e.is_true() || e.is_false()) {
            return Ok(SmtTerm::BoolLit(e.is_true()));
        }
        match e.kind() {
            TermKind::Variable(v) => {
                self.variables.insert(v.clone());
                Ok(self.wrap(SmtTerm::var(v.name()), predicate))
            }
            TermKind::Function(f) => {
                let op = self.operator(f);
                Ok(self.wrap(SmtTerm::app(op, vec![]), predicate))
            }
            TermKind::Abstraction { .. } => Err(unsupported(e)),
            TermKind::Application { head, arguments } => {
                let Some(f) = head.as_function() else {
                    return Err(unsupported(e));
                };
                self.application(f, arguments, predicate)
            }
        }
    }

    fn application(
        &mut self,
        f: &FunctionSymbol,
        args: &[DataExpr],
        predicate: bool,
    ) -> Result<SmtTerm, SmtError> {
        let term = |t: &mut Self, i: usize| t.clause(&args[i], false);
        let relation = |t: &mut Self, op: &str| -> Result<SmtTerm, SmtError> {
            Ok(SmtTerm::binary(op, t.clause(&args[0], false)?, t.clause(&args[1], false)?))
        };
        let result = match (f.name(), args.len()) {
            ("!", 1) if predicate => self.clause(&args[0], true)?.not(),
            ("&&", 2) if predicate => SmtTerm::And(vec![self.clause(&args[0], true)?, self.clause(&args[1], true)?]),
            ("||", 2) if predicate => SmtTerm::Or(vec![self.clause(&args[0], true)?, self.clause(&args[1], true)?]),
            ("=>", 2) if predicate => self.clause(&args[0], true)?.implies(self.clause(&args[1], true)?),
            ("==", 2) => relation(self, "=")?,
            ("!=", 2) => relation(self, "distinct")?,
            ("<", 2) => relation(self, "<")?,
            ("<=", 2) => relation(self, "<=")?,
            (">", 2) => relation(self, ">")?,
            (">=", 2) => relation(self, ">=")?,
            ("+", 2) => relation(self, "+")?,
            ("-", 1) => term(self, 0)?.neg(),
            ("max", 2) | ("min", 2) => {
                let a = term(self, 0)?;
                let b = term(self, 1)?;
                let cmp = if f.name() == "max" { ">=" } else { "<=" };
                SmtTerm::ite(SmtTerm::binary(cmp, a.clone(), b.clone()), a, b)
            }
            ("abs", 1) => {
                let a = term(self, 0)?;
                SmtTerm::ite(SmtTerm::binary("<", a.clone(), SmtTerm::int(0)), a.clone().neg(), a)
            }
            ("succ", 1) => SmtTerm::binary("+", term(self, 0)?, SmtTerm::int(1)),
            ("pred", 1) => SmtTerm::binary("-", term(self, 0)?, SmtTerm::int(1)),
            ("@cNat", 1) | ("@cInt", 1) | ("Pos2Nat", 1) | ("Nat2Int", 1) => term(self, 0)?,
            ("@cNeg", 1) => term(self, 0)?.neg(),
            ("Int2Real", 1) => SmtTerm::app("to_real", vec![term(self, 0)?]),
            ("@cReal", 2) => SmtTerm::binary(
                "/",
                SmtTerm::app("to_real", vec![term(self, 0)?]),
                SmtTerm::app("to_real", vec![term(self, 1)?]),
            ),
            ("@cDub", 2) => {
                let bit = self.clause(&args[0], true)?;
                let double = SmtTerm::binary("*", SmtTerm::int(2), term(self, 1)?);
                SmtTerm::ite(bit, SmtTerm::binary("+", double.clone(), SmtTerm::int(1)), double)
            }
            ("if", 3) => SmtTerm::ite(
                self.clause(&args[0], true)?,
                self.clause(&args[1], predicate)?,
                self.clause(&args[2], predicate)?,
            ),
            _ => {
                let op = self.operator(f);
                let args = args
                    .iter()
                    .map(|a| self.clause(a, false))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(self.wrap(SmtTerm::app(op, args), predicate));
            }
        };
        Ok(result)
    }

    fn operator(&mut self, f: &FunctionSymbol) -> String {
        let (i, _) = self.operators.insert_full(f.clone());
        format!("op{i}")
    }

    fn wrap(&mut self, t: SmtTerm, predicate: bool) -> SmtTerm {
        if predicate {
            self.bool2pred = true;
            SmtTerm::app(BOOL2PRED, vec![t])
        } else {
            t
        }
    }
}

fn unsupported(e: &DataExpr) -> SmtError {
    SmtError::UnsupportedClause {
        clause: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procalg_data::parse::{parse_data_expression, parse_specification, parse_variables};

    fn guards(spec: &str, vars: &str, guards: &[&str]) -> Vec<DataExpr> {
        let spec = parse_specification(spec, "s.spec").unwrap();
        let normal = spec.normalised().unwrap();
        let vars = parse_variables(vars, normal, "vars").unwrap();
        guards
            .iter()
            .map(|g| parse_data_expression(g, normal, &vars, "guard").unwrap())
            .collect()
    }

    #[test]
    fn arithmetic_guards_use_native_arithmetic() {
        let g = guards("", "n: Nat, p: Pos", &["n < 3", "p <= 5", "n != 4"]);
        let b = SmtLibBenchmark::new(&g).unwrap();
        assert!(b.sorts().is_empty());
        assert!(!b.uses_bool2pred());
        assert_eq!(
            b.to_benchmark(),
            "(benchmark nameless\n  :extrafuns ((n Int)(p Int))\n  :formula (and (< n 3) (<= p 5) (distinct n 4) (>= n 0) (>= p 1))\n)\n"
        );
    }

    #[test]
    fn uninterpreted_symbols_are_numbered_in_order_of_use() {
        let spec = "sort S; map f: S -> Nat; g: S -> Bool; c: S;";
        let g = guards(spec, "x: S, b: Bool", &["f(x) < f(c)", "g(x)", "b"]);
        let b = SmtLibBenchmark::new(&g).unwrap();
        let names: Vec<&str> = b.operators().iter().map(|f| f.name()).collect();
        assert_eq!(names, ["f", "c", "g"]);
        assert!(b.uses_bool2pred());

        let text = b.to_benchmark();
        assert!(text.contains(":notes \"(sort0 = S)(sort1 = Bool)\""), "{text}");
        assert!(text.contains(":notes \"(op0 = f)(op1 = c)(op2 = g)\""), "{text}");
        assert!(text.contains(":extrasorts (sort0 sort1)"), "{text}");
        assert!(text.contains(":extrafuns ((op0 sort0 Int)(op1 sort0)(op2 sort0 sort1))"), "{text}");
        assert!(text.contains(":extrafuns ((x sort0)(b sort1))"), "{text}");
        assert!(text.contains(":extrapreds ((bool2pred sort1))"), "{text}");
        assert!(text.contains("(< (op0 x) (op0 op1)) (bool2pred (op2 x)) (bool2pred b)"), "{text}");
    }

    #[test]
    fn scripts_declare_before_asserting() {
        let g = guards("", "n: Nat", &["n < 2", "!(n < 1)"]);
        let script = SmtLibBenchmark::new(&g).unwrap().to_script();
        assert_eq!(
            script,
            "(set-logic ALL)\n(declare-const n Int)\n(assert (and (< n 2) (not (< n 1)) (>= n 0)))\n(check-sat)\n"
        );
    }

    #[test]
    fn higher_order_symbols_are_rejected() {
        let spec = "sort S; map apply: (S -> Bool) # S -> Bool; p: S -> Bool;";
        let g = guards(spec, "x: S", &["apply(p, x)"]);
        let err = SmtLibBenchmark::new(&g).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Function apply cannot be translated to the SMT-LIB format."
        );
    }
}

use crate::terms::SmtTerm;

/// The two concrete syntaxes the benchmarks are printed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// SMT-LIB 1.2 benchmarks: `~` for unary minus, `implies`.
    Legacy,
    /// SMT-LIB 2 scripts.
    V2,
}

/// Print a term in the given dialect.
pub fn to_smtlib(term: &SmtTerm, dialect: Dialect) -> String {
    let p = |t: &SmtTerm| to_smtlib(t, dialect);
    match term {
        SmtTerm::Var(name) => symbol(name, dialect),
        SmtTerm::IntLit(n) => {
            if *n < 0 {
                format!("({} {})", minus(dialect), n.unsigned_abs())
            } else {
                n.to_string()
            }
        }
        SmtTerm::BoolLit(b) => b.to_string(),
        SmtTerm::Neg(inner) => format!("({} {})", minus(dialect), p(inner)),
        SmtTerm::App(op, args) => {
            if args.is_empty() {
                op.clone()
            } else {
                let inner: Vec<String> = args.iter().map(p).collect();
                format!("({op} {})", inner.join(" "))
            }
        }
        SmtTerm::Ite(c, t, e) => format!("(ite {} {} {})", p(c), p(t), p(e)),
        SmtTerm::Not(inner) => format!("(not {})", p(inner)),
        SmtTerm::And(terms) => nary("and", "true", terms, dialect),
        SmtTerm::Or(terms) => nary("or", "false", terms, dialect),
        SmtTerm::Implies(lhs, rhs) => {
            let op = match dialect {
                Dialect::Legacy => "implies",
                Dialect::V2 => "=>",
            };
            format!("({op} {} {})", p(lhs), p(rhs))
        }
    }
}

fn nary(op: &str, unit: &str, terms: &[SmtTerm], dialect: Dialect) -> String {
    match terms {
        [] => unit.to_string(),
        [single] => to_smtlib(single, dialect),
        _ => {
            let inner: Vec<String> = terms.iter().map(|t| to_smtlib(t, dialect)).collect();
            format!("({op} {})", inner.join(" "))
        }
    }
}

fn minus(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Legacy => "~",
        Dialect::V2 => "-",
    }
}

/// An identifier as a symbol of the dialect. SMT-LIB 2 symbols outside the
/// simple-symbol alphabet are quoted.
pub fn symbol(name: &str, dialect: Dialect) -> String {
    let simple = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "~!$%^&*_-+=<>.?/".contains(c))
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if dialect == Dialect::V2 && (!simple || name.is_empty()) {
        format!("|{}|", name.replace('|', "_"))
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_arithmetic() {
        let term = SmtTerm::binary(">=", SmtTerm::binary("+", SmtTerm::var("x"), SmtTerm::int(1)), SmtTerm::int(0));
        assert_eq!(to_smtlib(&term, Dialect::V2), "(>= (+ x 1) 0)");
    }

    #[test]
    fn unary_minus_depends_on_dialect() {
        let term = SmtTerm::var("x").neg();
        assert_eq!(to_smtlib(&term, Dialect::Legacy), "(~ x)");
        assert_eq!(to_smtlib(&term, Dialect::V2), "(- x)");
        assert_eq!(to_smtlib(&SmtTerm::int(-3), Dialect::V2), "(- 3)");
    }

    #[test]
    fn print_and_term() {
        let term = SmtTerm::And(vec![
            SmtTerm::binary(">", SmtTerm::var("a"), SmtTerm::int(0)),
            SmtTerm::binary("<", SmtTerm::var("b"), SmtTerm::int(10)),
        ]);
        assert_eq!(to_smtlib(&term, Dialect::V2), "(and (> a 0) (< b 10))");
        assert_eq!(to_smtlib(&SmtTerm::And(vec![]), Dialect::V2), "true");
    }

    #[test]
    fn odd_names_are_quoted() {
        assert_eq!(symbol("@enum@3", Dialect::V2), "|@enum@3|");
        assert_eq!(symbol("x'", Dialect::V2), "|x'|");
        assert_eq!(symbol("x'", Dialect::Legacy), "x'");
        assert_eq!(symbol("op0", Dialect::V2), "op0");
    }
}

/// SMT sorts. Sorts without an arithmetic counterpart become uninterpreted
/// `sortN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SmtSort {
    Bool,
    Int,
    Real,
    Uninterpreted(usize),
}

impl std::fmt::Display for SmtSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SmtSort::Bool => write!(f, "Bool"),
            SmtSort::Int => write!(f, "Int"),
            SmtSort::Real => write!(f, "Real"),
            SmtSort::Uninterpreted(n) => write!(f, "sort{n}"),
        }
    }
}

/// Solver-agnostic SMT term.
#[derive(Debug, Clone, PartialEq)]
pub enum SmtTerm {
    Var(String),
    /// Integer literal; negative values are printed with the dialect's
    /// unary minus.
    IntLit(i128),
    BoolLit(bool),
    Neg(Box<SmtTerm>),
    /// Application of a named function or operator, e.g. `+`, `distinct`,
    /// `op3`, `bool2pred`.
    App(String, Vec<SmtTerm>),
    Ite(Box<SmtTerm>, Box<SmtTerm>, Box<SmtTerm>),
    Not(Box<SmtTerm>),
    And(Vec<SmtTerm>),
    Or(Vec<SmtTerm>),
    Implies(Box<SmtTerm>, Box<SmtTerm>),
}

#[allow(clippy::should_implement_trait)]
impl SmtTerm {
    pub fn var(name: impl Into<String>) -> Self {
        SmtTerm::Var(name.into())
    }

    pub fn int(n: i128) -> Self {
        SmtTerm::IntLit(n)
    }

    pub fn app(op: impl Into<String>, args: Vec<SmtTerm>) -> Self {
        SmtTerm::App(op.into(), args)
    }

    pub fn binary(op: &str, lhs: SmtTerm, rhs: SmtTerm) -> Self {
        SmtTerm::App(op.to_string(), vec![lhs, rhs])
    }

    pub fn neg(self) -> Self {
        SmtTerm::Neg(Box::new(self))
    }

    pub fn not(self) -> Self {
        SmtTerm::Not(Box::new(self))
    }

    pub fn ite(cond: SmtTerm, then: SmtTerm, otherwise: SmtTerm) -> Self {
        SmtTerm::Ite(Box::new(cond), Box::new(then), Box::new(otherwise))
    }

    pub fn implies(self, other: SmtTerm) -> Self {
        SmtTerm::Implies(Box::new(self), Box::new(other))
    }
}

//! Parser for the textual data specification format.
//!
//! Parsing happens in two phases. The pest grammar produces an untyped
//! expression tree; sorts of identifiers, numerals and overloaded operators
//! are then resolved against a normalised specification. A specification
//! file is normalised without its equations first so that the equations can
//! be typed against the declared sorts, constructors and mappings.
//!
//! The `*_into` entry points also import the sorts an expression needs but
//! the specification does not mention, registering them as context sorts
//! and typing again.
#![allow(clippy::result_large_err)]

use indexmap::IndexSet;
use pest::Parser;
use pest_derive::Parser;
use tracing::debug;

use crate::equation::DataEquation;
use crate::error::ParseError;
use crate::sort::{ContainerKind, Sort, StructArgument, StructConstructor};
use crate::spec::{Alias, DataSpecification, NormalisedSpecification};
use crate::standard::boolean;
use crate::standard::containers::{cons_symbol, empty_list_symbol, list_element};
use crate::standard::numbers::numeral;
use crate::term::{Binder, DataExpr, FunctionSymbol, Variable};

#[derive(Parser)]
#[grammar = "grammar.pest"]
struct DataParser;

type Pair<'a> = pest::iterators::Pair<'a, Rule>;

/// Parse a data specification: `sort`, `cons`, `map`, `var` and `eqn`
/// sections in any order.
pub fn parse_specification(source: &str, filename: &str) -> Result<DataSpecification, ParseError> {
    let ctx = Ctx { source, filename };
    let root = ctx.parse(Rule::specification, source)?;

    let mut spec = DataSpecification::new();
    let mut variables: Vec<(String, Sort)> = Vec::new();
    let mut equations = Vec::new();
    for section in root.into_inner() {
        match section.as_rule() {
            Rule::sort_section => {
                for decl in section.into_inner().filter(|p| p.as_rule() == Rule::sort_decl) {
                    let mut inner = decl.into_inner();
                    let names = ctx.ident_list(ctx.next(&mut inner, "sort names")?);
                    match inner.next() {
                        Some(rhs) => {
                            let rhs = ctx.sort(rhs)?;
                            for name in names {
                                spec.add_alias(Alias::new(&name, rhs.clone()));
                            }
                        }
                        None => {
                            for name in names {
                                spec.add_sort(Sort::basic(&name));
                            }
                        }
                    }
                }
            }
            Rule::cons_section | Rule::map_section => {
                let is_constructor = section.as_rule() == Rule::cons_section;
                for decl in section.into_inner().filter(|p| p.as_rule() == Rule::op_decl) {
                    let (names, sort) = ctx.typed_names(decl)?;
                    for name in names {
                        let f = FunctionSymbol::new(&name, sort.clone());
                        if is_constructor {
                            spec.add_constructor(f);
                        } else {
                            spec.add_mapping(f);
                        }
                    }
                }
            }
            Rule::var_section => {
                for decl in section.into_inner().filter(|p| p.as_rule() == Rule::var_decl) {
                    let (names, sort) = ctx.typed_names(decl)?;
                    variables.extend(names.into_iter().map(|n| (n, sort.clone())));
                }
            }
            Rule::eqn_section => {
                equations.extend(section.into_inner().filter(|p| p.as_rule() == Rule::eqn_decl));
            }
            _ => {}
        }
    }

    if equations.is_empty() {
        return Ok(spec);
    }
    let untyped = equations
        .into_iter()
        .map(|eqn| ctx.equation(eqn))
        .collect::<Result<Vec<_>, _>>()?;
    let variables: Vec<Variable> = variables.iter().map(|(name, sort)| Variable::new(name, sort.clone())).collect();
    let typed = type_with_context(&mut spec, ctx, &variables, |typer| {
        untyped.iter().map(|eqn| typer.equation(eqn)).collect::<Result<Vec<_>, _>>()
    })?;
    for e in typed {
        spec.add_equation(e);
    }
    Ok(spec)
}

/// Run `typing` against the normalised view of `spec` until it no longer
/// asks for sorts the view lacks; each round registers the missing sorts as
/// context sorts.
fn type_with_context<T>(
    spec: &mut DataSpecification,
    ctx: Ctx<'_>,
    variables: &[Variable],
    mut typing: impl FnMut(&mut Typer<'_>) -> Result<T, ParseError>,
) -> Result<T, ParseError> {
    loop {
        let normal = spec.normalised()?;
        let scope = variables.iter().map(|v| normal.normalise_variable(v)).collect();
        let mut typer = Typer::new(normal, scope, ctx);
        let result = typing(&mut typer);
        let missing: Vec<Sort> = typer
            .missing
            .into_iter()
            .filter(|s| !spec.context_sorts().contains(s))
            .collect();
        if missing.is_empty() {
            return result;
        }
        debug!(sorts = ?missing, "importing context sorts");
        spec.add_context_sorts(missing);
    }
}

/// Parse and type a data expression. Identifiers resolve to `variables`
/// first (later entries shadow earlier ones) and then to the constructors
/// and mappings of `spec`.
pub fn parse_data_expression(
    text: &str,
    spec: &NormalisedSpecification,
    variables: &[Variable],
    filename: &str,
) -> Result<DataExpr, ParseError> {
    let ctx = Ctx { source: text, filename };
    let root = ctx.parse(Rule::data_expression, text)?;
    let node = ctx.expr(ctx.next(&mut root.into_inner(), "expression")?)?;
    let scope = variables.iter().map(|v| spec.normalise_variable(v)).collect();
    Typer::new(spec, scope, ctx).infer(&node, None)
}

/// Like [`parse_data_expression`], but first imports the sorts of
/// `variables` and of whatever the expression needs into `spec`.
pub fn parse_data_expression_into(
    text: &str,
    spec: &mut DataSpecification,
    variables: &[Variable],
    filename: &str,
) -> Result<DataExpr, ParseError> {
    let ctx = Ctx { source: text, filename };
    let root = ctx.parse(Rule::data_expression, text)?;
    let node = ctx.expr(ctx.next(&mut root.into_inner(), "expression")?)?;
    spec.add_context_sorts(variables.iter().map(|v| v.sort().clone()));
    type_with_context(spec, ctx, variables, |typer| typer.infer(&node, None))
}

/// Parse a sort and normalise it against `spec`.
pub fn parse_sort(text: &str, spec: &NormalisedSpecification, filename: &str) -> Result<Sort, ParseError> {
    let ctx = Ctx { source: text, filename };
    let root = ctx.parse(Rule::sort_expression, text)?;
    let sort = ctx.sort(ctx.next(&mut root.into_inner(), "sort")?)?;
    Ok(spec.normalise_sort(&sort))
}

/// Parse a sort, import it into `spec` and normalise it.
pub fn parse_sort_into(text: &str, spec: &mut DataSpecification, filename: &str) -> Result<Sort, ParseError> {
    let ctx = Ctx { source: text, filename };
    let root = ctx.parse(Rule::sort_expression, text)?;
    let sort = ctx.sort(ctx.next(&mut root.into_inner(), "sort")?)?;
    spec.add_context_sort(sort.clone());
    Ok(spec.normalised()?.normalise_sort(&sort))
}

/// Parse variable declarations such as `x, y: Nat, b: Bool`.
pub fn parse_variables(
    text: &str,
    spec: &NormalisedSpecification,
    filename: &str,
) -> Result<Vec<Variable>, ParseError> {
    let ctx = Ctx { source: text, filename };
    let root = ctx.parse(Rule::variable_declaration, text)?;
    let mut variables = Vec::new();
    for groups in root.into_inner().filter(|p| p.as_rule() == Rule::var_groups) {
        variables.extend(ctx.var_groups(groups)?);
    }
    Ok(variables.iter().map(|v| spec.normalise_variable(v)).collect())
}

/// Parse variable declarations and import their sorts into `spec`.
pub fn parse_variables_into(
    text: &str,
    spec: &mut DataSpecification,
    filename: &str,
) -> Result<Vec<Variable>, ParseError> {
    let ctx = Ctx { source: text, filename };
    let root = ctx.parse(Rule::variable_declaration, text)?;
    let mut variables = Vec::new();
    for groups in root.into_inner().filter(|p| p.as_rule() == Rule::var_groups) {
        variables.extend(ctx.var_groups(groups)?);
    }
    spec.add_context_sorts(variables.iter().map(|v| v.sort().clone()));
    let normal = spec.normalised()?;
    Ok(variables.iter().map(|v| normal.normalise_variable(v)).collect())
}

/// Untyped expression tree with source spans.
#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    start: usize,
    end: usize,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Name(String),
    Number(u64),
    EmptyList,
    EmptySet,
    EmptyBag,
    List(Vec<Node>),
    Call(Box<Node>, Vec<Node>),
    Binder(Binder, Vec<Variable>, Box<Node>),
}

impl Node {
    fn new(kind: NodeKind, pair: &Pair<'_>) -> Self {
        let span = pair.as_span();
        Node {
            kind,
            start: span.start(),
            end: span.end(),
        }
    }

    fn operator(name: &str, arguments: Vec<Node>, start: usize, end: usize) -> Self {
        let head = Node {
            kind: NodeKind::Name(name.to_string()),
            start,
            end,
        };
        Node {
            kind: NodeKind::Call(Box::new(head), arguments),
            start,
            end,
        }
    }
}

struct UntypedEquation {
    condition: Option<Node>,
    lhs: Node,
    rhs: Node,
}

#[derive(Clone, Copy)]
struct Ctx<'s> {
    source: &'s str,
    filename: &'s str,
}

impl<'s> Ctx<'s> {
    fn parse(&self, rule: Rule, text: &'s str) -> Result<Pair<'s>, ParseError> {
        let mut pairs = DataParser::parse(rule, text).map_err(|e| {
            let (start, end) = match e.location {
                pest::error::InputLocation::Pos(p) => (p, p + 1),
                pest::error::InputLocation::Span((s, e)) => (s, e),
            };
            ParseError::syntax(e.variant.message().to_string(), start, end, self.source, self.filename)
        })?;
        pairs
            .next()
            .ok_or_else(|| ParseError::syntax("empty input", 0, 0, self.source, self.filename))
    }

    fn next<'p>(
        &self,
        inner: &mut pest::iterators::Pairs<'p, Rule>,
        what: &str,
    ) -> Result<Pair<'p>, ParseError> {
        inner
            .next()
            .ok_or_else(|| ParseError::syntax(format!("expected {what}"), 0, 0, self.source, self.filename))
    }

    fn error_at(&self, pair: &Pair<'_>, message: impl Into<String>) -> ParseError {
        let span = pair.as_span();
        ParseError::syntax(message, span.start(), span.end(), self.source, self.filename)
    }

    fn ident_list(&self, pair: Pair<'_>) -> Vec<String> {
        pair.into_inner().map(|p| p.as_str().to_string()).collect()
    }

    /// `names : sort` as used by op, var and var-group declarations.
    fn typed_names(&self, pair: Pair<'_>) -> Result<(Vec<String>, Sort), ParseError> {
        let mut inner = pair.into_inner();
        let names = self.ident_list(self.next(&mut inner, "names")?);
        let sort = self.sort(self.next(&mut inner, "sort")?)?;
        Ok((names, sort))
    }

    fn var_groups(&self, pair: Pair<'_>) -> Result<Vec<Variable>, ParseError> {
        let mut variables = Vec::new();
        for group in pair.into_inner() {
            let (names, sort) = self.typed_names(group)?;
            variables.extend(names.iter().map(|n| Variable::new(n, sort.clone())));
        }
        Ok(variables)
    }

    fn sort(&self, pair: Pair<'_>) -> Result<Sort, ParseError> {
        match pair.as_rule() {
            Rule::sort_expr => {
                let span = pair.clone();
                let mut inner = pair.into_inner();
                let product = self.next(&mut inner, "sort")?;
                let domain = product
                    .into_inner()
                    .map(|p| self.sort(p))
                    .collect::<Result<Vec<_>, _>>()?;
                match inner.next() {
                    Some(codomain) => Ok(Sort::function(domain, self.sort(codomain)?)),
                    None => match <[Sort; 1]>::try_from(domain) {
                        Ok([s]) => Ok(s),
                        Err(_) => Err(self.error_at(&span, "a product of sorts must be followed by `->`")),
                    },
                }
            }
            Rule::sort_name => Ok(Sort::basic(pair.as_str().trim())),
            Rule::container_sort => {
                let mut inner = pair.into_inner();
                let kind_pair = self.next(&mut inner, "container kind")?;
                let kind = ContainerKind::from_name(kind_pair.as_str())
                    .ok_or_else(|| self.error_at(&kind_pair, "unknown container kind"))?;
                let element = self.sort(self.next(&mut inner, "element sort")?)?;
                Ok(Sort::container(kind, element))
            }
            Rule::struct_sort => {
                let constructors = pair
                    .into_inner()
                    .filter(|p| p.as_rule() == Rule::struct_cons)
                    .map(|p| self.struct_constructor(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Sort::structured(constructors))
            }
            _ => Err(self.error_at(&pair, "expected a sort")),
        }
    }

    fn struct_constructor(&self, pair: Pair<'_>) -> Result<StructConstructor, ParseError> {
        let mut name = "";
        let mut arguments = Vec::new();
        let mut recogniser = None;
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::ident => name = p.as_str(),
                Rule::struct_args => {
                    for arg in p.into_inner() {
                        let mut projection = None;
                        let mut sort = None;
                        for part in arg.into_inner() {
                            match part.as_rule() {
                                Rule::projection => projection = Some(part.as_str().trim()),
                                _ => sort = Some(self.sort(part)?),
                            }
                        }
                        if let Some(sort) = sort {
                            arguments.push(StructArgument::new(projection, sort));
                        }
                    }
                }
                Rule::recogniser => {
                    recogniser = p.into_inner().next().map(|r| r.as_str());
                }
                _ => {}
            }
        }
        Ok(StructConstructor::new(name, arguments, recogniser))
    }

    fn equation(&self, pair: Pair<'_>) -> Result<UntypedEquation, ParseError> {
        let mut condition = None;
        let mut sides = Vec::with_capacity(2);
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::condition => {
                    condition = Some(self.expr(self.next(&mut p.into_inner(), "condition")?)?);
                }
                _ => sides.push(self.expr(p)?),
            }
        }
        let rhs = sides.pop();
        let lhs = sides.pop();
        match (lhs, rhs) {
            (Some(lhs), Some(rhs)) => Ok(UntypedEquation { condition, lhs, rhs }),
            _ => Err(ParseError::syntax("incomplete equation", 0, 0, self.source, self.filename)),
        }
    }

    fn expr(&self, pair: Pair<'_>) -> Result<Node, ParseError> {
        let span = pair.as_span();
        let (start, end) = (span.start(), span.end());
        match pair.as_rule() {
            Rule::expr => self.expr(self.next(&mut pair.into_inner(), "expression")?),
            Rule::binder_expr => {
                let node_pair = pair.clone();
                let mut inner = pair.into_inner();
                let binder = match self.next(&mut inner, "binder")?.as_str() {
                    "lambda" => Binder::Lambda,
                    "forall" => Binder::Forall,
                    _ => Binder::Exists,
                };
                let variables = self.var_groups(self.next(&mut inner, "variables")?)?;
                let body = self.expr(self.next(&mut inner, "body")?)?;
                Ok(Node::new(NodeKind::Binder(binder, variables, Box::new(body)), &node_pair))
            }
            Rule::implies_expr | Rule::cons_expr => {
                let op = if pair.as_rule() == Rule::implies_expr { "=>" } else { "|>" };
                let mut inner = pair.into_inner();
                let lhs = self.expr(self.next(&mut inner, "operand")?)?;
                match inner.next() {
                    Some(rhs) => Ok(Node::operator(op, vec![lhs, self.expr(rhs)?], start, end)),
                    None => Ok(lhs),
                }
            }
            Rule::or_expr | Rule::and_expr => {
                let op = if pair.as_rule() == Rule::or_expr { "||" } else { "&&" };
                let mut inner = pair.into_inner();
                let mut acc = self.expr(self.next(&mut inner, "operand")?)?;
                for rhs in inner {
                    let rhs = self.expr(rhs)?;
                    let end = rhs.end;
                    acc = Node::operator(op, vec![acc, rhs], start, end);
                }
                Ok(acc)
            }
            Rule::cmp_expr | Rule::snoc_expr | Rule::add_expr => {
                let mut inner = pair.into_inner();
                let mut acc = self.expr(self.next(&mut inner, "operand")?)?;
                while let Some(op) = inner.next() {
                    let rhs = self.expr(self.next(&mut inner, "operand")?)?;
                    let end = rhs.end;
                    acc = Node::operator(op.as_str(), vec![acc, rhs], start, end);
                }
                Ok(acc)
            }
            Rule::unary_expr => {
                let mut ops = Vec::new();
                let mut operand = None;
                for p in pair.into_inner() {
                    match p.as_rule() {
                        Rule::prefix_op => ops.push((p.as_str().to_string(), p.as_span().start())),
                        _ => operand = Some(self.expr(p)?),
                    }
                }
                let mut acc = operand
                    .ok_or_else(|| ParseError::syntax("expected an operand", start, end, self.source, self.filename))?;
                for (op, op_start) in ops.into_iter().rev() {
                    acc = Node::operator(&op, vec![acc], op_start, end);
                }
                Ok(acc)
            }
            Rule::postfix_expr => {
                let mut inner = pair.into_inner();
                let mut acc = self.expr(self.next(&mut inner, "expression")?)?;
                for args in inner {
                    let call_end = args.as_span().end();
                    let arguments = args.into_inner().map(|a| self.expr(a)).collect::<Result<Vec<_>, _>>()?;
                    acc = Node {
                        kind: NodeKind::Call(Box::new(acc), arguments),
                        start,
                        end: call_end,
                    };
                }
                Ok(acc)
            }
            Rule::number => {
                let value = pair
                    .as_str()
                    .parse::<u64>()
                    .map_err(|_| self.error_at(&pair, "number out of range"))?;
                Ok(Node::new(NodeKind::Number(value), &pair))
            }
            Rule::ident => Ok(Node::new(NodeKind::Name(pair.as_str().to_string()), &pair)),
            Rule::empty_set => Ok(Node::new(NodeKind::EmptySet, &pair)),
            Rule::empty_bag => Ok(Node::new(NodeKind::EmptyBag, &pair)),
            Rule::list_literal => {
                let node_pair = pair.clone();
                let items = pair.into_inner().map(|p| self.expr(p)).collect::<Result<Vec<_>, _>>()?;
                let kind = if items.is_empty() {
                    NodeKind::EmptyList
                } else {
                    NodeKind::List(items)
                };
                Ok(Node::new(kind, &node_pair))
            }
            _ => Err(self.error_at(&pair, "expected an expression")),
        }
    }
}

/// Numerals and empty containers get their sort from the context.
fn needs_context(node: &Node) -> bool {
    match &node.kind {
        NodeKind::Number(_) | NodeKind::EmptyList | NodeKind::EmptySet | NodeKind::EmptyBag => true,
        NodeKind::List(items) => items.iter().all(needs_context),
        NodeKind::Call(head, args) => {
            matches!(head.kind, NodeKind::Name(_)) && !args.is_empty() && args.iter().all(needs_context)
        }
        NodeKind::Name(_) | NodeKind::Binder(..) => false,
    }
}

/// The sort a numeral gets when nothing constrains it.
fn default_sort(node: &Node) -> Option<Sort> {
    match &node.kind {
        NodeKind::Number(0) => Some(Sort::nat()),
        NodeKind::Number(_) => Some(Sort::pos()),
        _ => None,
    }
}

/// The candidates whose domain agrees with the arguments typed so far.
fn matching<'f>(candidates: &[&'f FunctionSymbol], typed: &[Option<DataExpr>]) -> Vec<&'f FunctionSymbol> {
    candidates
        .iter()
        .copied()
        .filter(|f| {
            f.sort()
                .domain()
                .iter()
                .zip(typed)
                .all(|(d, t)| t.as_ref().map_or(true, |t| t.sort() == *d))
        })
        .collect()
}

struct Typer<'a> {
    spec: &'a NormalisedSpecification,
    scope: Vec<Variable>,
    ctx: Ctx<'a>,
    /// Sorts the expression needs that `spec` does not provide.
    missing: IndexSet<Sort>,
}

impl<'a> Typer<'a> {
    fn new(spec: &'a NormalisedSpecification, scope: Vec<Variable>, ctx: Ctx<'a>) -> Self {
        Typer {
            spec,
            scope,
            ctx,
            missing: IndexSet::new(),
        }
    }

    fn require(&mut self, sort: &Sort) {
        let sort = self.spec.normalise_sort(sort);
        if !self.spec.sorts().contains(&sort) {
            self.missing.insert(sort);
        }
    }

    /// `[]` and `|>` of the list sort `sort`, if it is imported.
    fn list_constructors(&self, sort: &Sort) -> Option<(FunctionSymbol, FunctionSymbol)> {
        let constructors = self.spec.constructors_of(sort);
        let empty = constructors.iter().find(|f| f.name() == "[]")?;
        let cons = constructors.iter().find(|f| f.name() == "|>" && f.arity() == 2)?;
        Some((empty.clone(), cons.clone()))
    }

    /// The element sort of `sort` with its `[]` and `|>`. A list sort that
    /// is not imported yet is required and gets unnormalised symbols.
    fn list_symbols(&mut self, sort: &Sort) -> Option<(Sort, FunctionSymbol, FunctionSymbol)> {
        if let Some((empty, cons)) = self.list_constructors(sort) {
            let element = cons.sort().domain().first()?.clone();
            return Some((element, empty, cons));
        }
        let element = list_element(sort)?.clone();
        self.require(sort);
        Some((element.clone(), empty_list_symbol(&element), cons_symbol(&element)))
    }

    fn error(&self, node: &Node, message: impl Into<String>) -> ParseError {
        ParseError::type_error(message, node.start, node.end, self.ctx.source, self.ctx.filename)
    }

    fn lookup_variable(&self, name: &str) -> Option<&Variable> {
        self.scope.iter().rev().find(|v| v.name() == name)
    }

    fn equation(&mut self, eqn: &UntypedEquation) -> Result<DataEquation, ParseError> {
        let condition = match &eqn.condition {
            Some(c) => self.check(c, &Sort::bool_())?,
            None => boolean::true_(),
        };
        let (lhs, rhs) = if needs_context(&eqn.lhs) && !needs_context(&eqn.rhs) {
            let rhs = self.infer(&eqn.rhs, None)?;
            (self.check(&eqn.lhs, &rhs.sort())?, rhs)
        } else {
            let lhs = self.infer(&eqn.lhs, None)?;
            let rhs = self.check(&eqn.rhs, &lhs.sort())?;
            (lhs, rhs)
        };
        Ok(DataEquation::conditional(condition, lhs, rhs))
    }

    fn check(&mut self, node: &Node, expected: &Sort) -> Result<DataExpr, ParseError> {
        let e = self.infer(node, Some(expected))?;
        if e.sort() != *expected {
            return Err(self.error(
                node,
                format!("expected an expression of sort {expected}, found {e} of sort {}", e.sort()),
            ));
        }
        Ok(e)
    }

    fn infer(&mut self, node: &Node, expected: Option<&Sort>) -> Result<DataExpr, ParseError> {
        match &node.kind {
            NodeKind::Number(n) => {
                let sort = match expected {
                    Some(s) if s.is_numeric() => s.clone(),
                    Some(s) => return Err(self.error(node, format!("the number {n} cannot have sort {s}"))),
                    None if *n == 0 => Sort::nat(),
                    None => Sort::pos(),
                };
                numeral(*n, &sort).ok_or_else(|| self.error(node, format!("{n} is not a value of sort {sort}")))
            }
            NodeKind::EmptyList => match expected.and_then(|s| self.list_symbols(s)) {
                Some((_, empty, _)) => Ok(empty.to_expr()),
                None => Err(self.error(node, "cannot determine the element sort of []")),
            },
            NodeKind::EmptySet | NodeKind::EmptyBag => {
                let name = if matches!(node.kind, NodeKind::EmptySet) { "{}" } else { "{:}" };
                let f = expected.and_then(|s| self.spec.functions().find(|f| f.name() == name && f.sort() == s));
                match f {
                    Some(f) => Ok(f.to_expr()),
                    None => Err(self.error(node, format!("cannot determine the sort of {name}"))),
                }
            }
            NodeKind::List(items) => {
                let symbols = match expected.and_then(|s| self.list_symbols(s)) {
                    Some(symbols) => Some(symbols),
                    None => match items.first() {
                        Some(first) => {
                            let element = self.infer(first, None)?.sort();
                            let sort = self.spec.normalise_sort(&Sort::list(element));
                            self.list_symbols(&sort)
                        }
                        None => None,
                    },
                };
                let Some((element, empty, cons)) = symbols else {
                    return Err(self.error(node, "cannot determine the element sort of []"));
                };
                let typed = items
                    .iter()
                    .map(|item| self.check(item, &element))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(typed
                    .into_iter()
                    .rev()
                    .fold(empty.to_expr(), |acc, item| cons.apply(vec![item, acc])))
            }
            NodeKind::Name(name) => {
                if let Some(v) = self.lookup_variable(name) {
                    return Ok(v.to_expr());
                }
                let candidates: Vec<&FunctionSymbol> = self.spec.functions().filter(|f| f.name() == name).collect();
                let chosen = expected
                    .and_then(|s| candidates.iter().find(|f| f.sort() == s))
                    .or_else(|| candidates.iter().find(|f| !f.sort().is_function()))
                    .or_else(|| candidates.first());
                match chosen {
                    Some(f) => Ok(f.to_expr()),
                    None => Err(self.error(node, format!("unknown identifier {name}"))),
                }
            }
            NodeKind::Call(head, args) => self.infer_call(node, head, args, expected),
            NodeKind::Binder(binder, variables, body) => {
                let variables: Vec<Variable> = variables.iter().map(|v| self.spec.normalise_variable(v)).collect();
                for v in &variables {
                    self.require(v.sort());
                }
                let depth = self.scope.len();
                self.scope.extend(variables.iter().cloned());
                let body = match binder {
                    Binder::Lambda => {
                        let target = expected.filter(|s| s.is_function()).map(|s| s.codomain().clone());
                        self.infer(body, target.as_ref())
                    }
                    Binder::Forall | Binder::Exists => self.check(body, &Sort::bool_()),
                };
                self.scope.truncate(depth);
                Ok(DataExpr::abstraction(*binder, variables, body?))
            }
        }
    }

    fn infer_call(
        &mut self,
        node: &Node,
        head: &Node,
        args: &[Node],
        expected: Option<&Sort>,
    ) -> Result<DataExpr, ParseError> {
        let name = match &head.kind {
            NodeKind::Name(n) if self.lookup_variable(n).is_none() => n.clone(),
            _ => {
                let h = self.infer(head, None)?;
                let domain = h.sort().domain().to_vec();
                if domain.len() != args.len() {
                    return Err(self.error(
                        node,
                        format!("{h} of sort {} cannot be applied to {} arguments", h.sort(), args.len()),
                    ));
                }
                let typed = args
                    .iter()
                    .zip(&domain)
                    .map(|(a, d)| self.check(a, d))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(DataExpr::application(h, typed));
            }
        };

        let candidates: Vec<FunctionSymbol> = self
            .spec
            .functions()
            .filter(|f| f.name() == name && f.arity() == args.len())
            .cloned()
            .collect();
        if candidates.is_empty() {
            self.require_argument_sorts(args);
            return Err(self.error(node, format!("no function {name} with {} arguments", args.len())));
        }

        let mut typed: Vec<Option<DataExpr>> = Vec::with_capacity(args.len());
        for a in args {
            typed.push(if needs_context(a) { None } else { Some(self.infer(a, None)?) });
        }
        let all: Vec<&FunctionSymbol> = candidates.iter().collect();
        let mut viable = matching(&all, &typed);
        if viable.is_empty() {
            self.require_argument_sorts(args);
            let sorts: Vec<String> = typed
                .iter()
                .map(|t| t.as_ref().map_or_else(|| "_".to_string(), |t| t.sort().to_string()))
                .collect();
            return Err(self.error(
                node,
                format!("no overload of {name} accepts arguments of sorts ({})", sorts.join(", ")),
            ));
        }
        if viable.len() > 1 {
            if let Some(expected) = expected {
                let by_target: Vec<&FunctionSymbol> =
                    viable.iter().copied().filter(|f| f.target_sort() == expected).collect();
                if !by_target.is_empty() {
                    viable = by_target;
                }
            }
        }
        if viable.len() > 1 {
            // Let compound arguments settle their own sorts.
            let snapshot = typed.clone();
            let mut changed = false;
            for (a, t) in args.iter().zip(typed.iter_mut()) {
                if t.is_none() && matches!(a.kind, NodeKind::Call(..) | NodeKind::List(_)) {
                    *t = Some(self.infer(a, None)?);
                    changed = true;
                }
            }
            if changed {
                let refined = matching(&viable, &typed);
                if refined.is_empty() {
                    typed = snapshot;
                } else {
                    viable = refined;
                }
            }
        }
        if viable.len() > 1 {
            let defaults: Vec<Option<Sort>> = args
                .iter()
                .zip(&typed)
                .map(|(a, t)| if t.is_none() { default_sort(a) } else { None })
                .collect();
            let by_default: Vec<&FunctionSymbol> = viable
                .iter()
                .copied()
                .filter(|f| {
                    f.sort()
                        .domain()
                        .iter()
                        .zip(&defaults)
                        .all(|(d, s)| s.as_ref().map_or(true, |s| s == d))
                })
                .collect();
            if !by_default.is_empty() {
                viable = by_default;
            }
        }

        let f = viable[0].clone();
        let domain = f.sort().domain().to_vec();
        let mut arguments = Vec::with_capacity(args.len());
        for ((a, t), d) in args.iter().zip(typed).zip(&domain) {
            arguments.push(match t {
                Some(t) => t,
                None => self.check(a, d)?,
            });
        }
        Ok(f.apply(arguments))
    }

    /// The sorts of the arguments of a call that found no function; their
    /// generated functions may be the ones missing.
    fn require_argument_sorts(&mut self, args: &[Node]) {
        for a in args {
            if let Ok(e) = self.infer(a, None) {
                self.require(&e.sort());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standard::numbers::{integer_value, nat};

    fn normal(text: &str) -> DataSpecification {
        parse_specification(text, "test.spec").unwrap()
    }

    #[test]
    fn sections_populate_the_specification() {
        let spec = normal(
            "sort S; A = List(Nat);
             cons c, d: S;
             map f: S # Nat -> A;
             var s: S; n: Nat;
             eqn f(s, n) = [n];
                 s == c -> f(s, 0) = [];",
        );
        assert_eq!(spec.sorts().len(), 1);
        assert_eq!(spec.aliases().len(), 1);
        assert_eq!(spec.constructors().len(), 2);
        assert_eq!(spec.mappings().len(), 1);
        assert_eq!(spec.equations().len(), 2);
        assert!(spec.equations().iter().any(|e| e.is_conditional()));
    }

    #[test]
    fn struct_sorts_carry_projections_and_recognisers() {
        let spec = normal("sort Tree = struct leaf?is_leaf | node(left: Tree, right: Tree);");
        let rhs = spec.aliases()[0].rhs.clone();
        assert_eq!(
            rhs.to_string(),
            "struct leaf?is_leaf | node(left: Tree, right: Tree)"
        );
    }

    #[test]
    fn numerals_take_their_sort_from_context() {
        let spec = normal("map f: Int -> Bool;");
        let n = spec.normalised().unwrap();
        let e = parse_data_expression("f(3)", n, &[], "expr").unwrap();
        assert_eq!(e.arguments()[0].sort(), Sort::int_());

        let x = Variable::new("x", Sort::nat());
        let e = parse_data_expression("x + 1", n, &[x], "expr").unwrap();
        assert_eq!(e.sort(), Sort::nat());
        assert_eq!(e.arguments()[1], nat(1));

        let e = parse_data_expression("1 + 2", n, &[], "expr").unwrap();
        assert_eq!(e.sort(), Sort::pos());
    }

    #[test]
    fn binders_scope_their_variables() {
        let spec = normal("");
        let n = spec.normalised().unwrap();
        let e = parse_data_expression("forall b: Bool, m: Nat. b || m == 0", n, &[], "expr").unwrap();
        assert_eq!(e.sort(), Sort::bool_());
        assert!(e.free_variables().is_empty());
        let e = parse_data_expression("(lambda k: Nat. k)(7)", n, &[], "expr").unwrap();
        assert_eq!(integer_value(&e.arguments()[0]), Some(7));
    }

    #[test]
    fn list_literals_and_operators() {
        let mut spec = normal("");
        let e = parse_data_expression_into("#([1, 2] ++ [3]) == 3", &mut spec, &[], "expr").unwrap();
        assert_eq!(e.sort(), Sort::bool_());
        assert_eq!(e.arguments()[0].arguments()[0].sort(), Sort::list(Sort::pos()));
        assert!(spec.context_sorts().contains(&Sort::list(Sort::pos())));
    }

    #[test]
    fn list_terms_of_an_aliased_list_sort_use_the_alias() {
        let spec = normal("sort A = List(Nat);");
        let n = spec.normalised().unwrap();
        let a = Sort::basic("A");
        let x = Variable::new("x", a.clone());
        let e = parse_data_expression("x == [1, 2]", n, &[x.clone()], "expr").unwrap();
        let literal = &e.arguments()[1];
        assert_eq!(literal.sort(), a);
        let cons = n.constructors_of(&a).iter().find(|f| f.name() == "|>").cloned().unwrap();
        assert_eq!(literal.head(), &cons.to_expr());
        assert_eq!(literal.arguments()[0], nat(1));
        let e = parse_data_expression("x != []", n, &[x], "expr").unwrap();
        assert_eq!(e.arguments()[1].sort(), a);
    }

    #[test]
    fn variables_of_an_alias_sort_accept_list_operators() {
        let mut spec = normal("sort L = List(Nat);");
        let vars = parse_variables_into("xs: L, d: Nat", &mut spec, "vars").unwrap();
        assert_eq!(vars[0].sort(), &Sort::basic("L"));
        let e = parse_data_expression_into("(xs <| d) != []", &mut spec, &vars, "expr").unwrap();
        assert_eq!(e.arguments()[1].sort(), Sort::basic("L"));
    }

    #[test]
    fn context_sorts_come_from_variables_and_binders() {
        let mut spec = normal("");
        let vars = parse_variables_into("xs: List(Nat), d: Nat", &mut spec, "vars").unwrap();
        assert!(spec.context_sorts().contains(&Sort::list(Sort::nat())));
        let e = parse_data_expression_into("(xs <| d) != []", &mut spec, &vars, "expr").unwrap();
        assert_eq!(e.sort(), Sort::bool_());

        let e = parse_data_expression_into("forall s: FSet(Bool). s == s", &mut spec, &[], "expr").unwrap();
        assert_eq!(e.sort(), Sort::bool_());
        let n = spec.normalised().unwrap();
        assert!(n.sorts().contains(&Sort::fset(Sort::bool_())));
        assert_eq!(n.constructors_of(&Sort::fset(Sort::bool_())).len(), 2);
    }

    #[test]
    fn variable_declarations() {
        let spec = normal("");
        let n = spec.normalised().unwrap();
        let vars = parse_variables("x, y: Nat, b: Bool", n, "vars").unwrap();
        let names: Vec<_> = vars.iter().map(|v| format!("{v:?}")).collect();
        assert_eq!(names, ["x: Nat", "y: Nat", "b: Bool"]);
        assert_eq!(parse_sort("Nat # Bool -> List(Pos)", n, "sort").unwrap().to_string(), "Nat # Bool -> List(Pos)");
    }

    #[test]
    fn syntax_errors_carry_a_span() {
        let err = parse_specification("sort S\ncons c: S;", "bad.spec").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn type_errors_are_reported() {
        let spec = normal("sort S; cons c: S;");
        let n = spec.normalised().unwrap();
        let err = parse_data_expression("c && true", n, &[], "expr").unwrap_err();
        assert!(matches!(err, ParseError::Type { .. }));
        let err = parse_data_expression("nope", n, &[], "expr").unwrap_err();
        assert!(matches!(err, ParseError::Type { .. }));
    }

    #[test]
    fn undeclared_sorts_surface_as_specification_errors() {
        let err = parse_specification("map f: Foo -> Bool; var x: Foo; eqn f(x) = true;", "u.spec").unwrap_err();
        assert!(matches!(err, ParseError::Specification(_)));
    }
}

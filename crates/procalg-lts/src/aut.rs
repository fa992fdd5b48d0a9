//! Reading and writing the Aldebaran `.aut` format.
//!
//! ```text
//! des (initial, #transitions, #states)
//! (from, "label", to)
//! ```
//!
//! Labels may be unquoted as long as they contain no commas, quotes or
//! parentheses. The label `tau` is the internal action.
#![allow(clippy::result_large_err)]

use std::io::{self, Write};
use std::path::Path;

use pest::Parser;
use pest_derive::Parser;
use tracing::debug;

use crate::error::LtsError;
use crate::lts::Lts;

#[derive(Parser)]
#[grammar = "aut.pest"]
struct AutParser;

type Pair<'a> = pest::iterators::Pair<'a, Rule>;

pub fn read_aut(source: &str, filename: &str) -> Result<Lts, LtsError> {
    let malformed = |message: String, start: usize, end: usize| LtsError::malformed(message, start, end, source, filename);

    let mut lines = lines(source);
    let (header_offset, header_line) = lines
        .next()
        .ok_or_else(|| malformed("expected a `des` header".to_string(), 0, 0))?;
    let header = parse_line(Rule::header_line, header_line, header_offset, &malformed)?;
    let header_span = span_of(&header, header_offset);
    let [initial, num_transitions, num_states] = numbers::<3>(header, header_offset, &malformed)?;

    let state = |pair: &Pair<'_>, offset: usize, value: usize| {
        if value < num_states {
            Ok(value)
        } else {
            let (start, end) = span_of(pair, offset);
            Err(malformed(
                format!("state {value} does not exist; the header declares {num_states} states"),
                start,
                end,
            ))
        }
    };

    let mut lts = Lts::new(num_states, 0);
    let mut count = 0;
    for (offset, line) in lines {
        let transition = parse_line(Rule::transition_line, line, offset, &malformed)?;
        let mut inner = transition
            .into_inner()
            .filter(|p| matches!(p.as_rule(), Rule::number | Rule::quoted | Rule::bare));
        let (Some(from), Some(label), Some(to)) = (inner.next(), inner.next(), inner.next()) else {
            continue;
        };
        let from_id = state(&from, offset, parse_number(&from, offset, &malformed)?)?;
        let to_id = state(&to, offset, parse_number(&to, offset, &malformed)?)?;
        let name = match label.as_rule() {
            Rule::quoted => label.into_inner().next().map_or("", |raw| raw.as_str()),
            _ => label.as_str().trim(),
        };
        let label_id = lts.add_label(name);
        lts.add_transition(from_id, label_id, to_id);
        count += 1;
    }

    if num_states == 0 || initial >= num_states {
        return Err(malformed(
            format!("initial state {initial} does not exist; the header declares {num_states} states"),
            header_span.0,
            header_span.1,
        ));
    }
    if count != num_transitions {
        return Err(malformed(
            format!("the header declares {num_transitions} transitions but the file contains {count}"),
            header_span.0,
            header_span.1,
        ));
    }
    lts.set_initial_state(initial);
    debug!(
        states = lts.num_states(),
        transitions = lts.num_transitions(),
        labels = lts.num_labels(),
        "read {filename}"
    );
    Ok(lts)
}

/// Non-blank lines with their offsets in `source`.
fn lines(source: &str) -> impl Iterator<Item = (usize, &str)> {
    source
        .split_inclusive('\n')
        .scan(0, |offset, line| {
            let start = *offset;
            *offset += line.len();
            Some((start, line))
        })
        .filter(|(_, line)| !line.trim().is_empty())
}

/// Parse a single line; errors point into the whole file.
fn parse_line<'s>(
    rule: Rule,
    line: &'s str,
    offset: usize,
    malformed: &impl Fn(String, usize, usize) -> LtsError,
) -> Result<Pair<'s>, LtsError> {
    let mut pairs = AutParser::parse(rule, line).map_err(|e| {
        let e = e.renamed_rules(|rule| match rule {
            Rule::open => "`(`".to_string(),
            Rule::close => "`)`".to_string(),
            Rule::comma => "`,`".to_string(),
            Rule::quoted | Rule::bare => "a label".to_string(),
            other => format!("{other:?}"),
        });
        let (start, end) = match e.location {
            pest::error::InputLocation::Pos(p) => (p, p + 1),
            pest::error::InputLocation::Span((s, e)) => (s, e),
        };
        malformed(e.variant.message().to_string(), offset + start, offset + end)
    })?;
    pairs
        .next()
        .ok_or_else(|| malformed("empty line".to_string(), offset, offset + line.len()))
}

fn span_of(pair: &Pair<'_>, offset: usize) -> (usize, usize) {
    let span = pair.as_span();
    (offset + span.start(), offset + span.end())
}

fn numbers<const N: usize>(
    pair: Pair<'_>,
    offset: usize,
    malformed: &impl Fn(String, usize, usize) -> LtsError,
) -> Result<[usize; N], LtsError> {
    let (start, end) = span_of(&pair, offset);
    let mut out = [0; N];
    let mut inner = pair.into_inner().filter(|p| p.as_rule() == Rule::number);
    for slot in &mut out {
        let number = inner
            .next()
            .ok_or_else(|| malformed("expected a number".to_string(), start, end))?;
        *slot = parse_number(&number, offset, malformed)?;
    }
    Ok(out)
}

fn parse_number(
    pair: &Pair<'_>,
    offset: usize,
    malformed: &impl Fn(String, usize, usize) -> LtsError,
) -> Result<usize, LtsError> {
    pair.as_str().parse().map_err(|_| {
        let (start, end) = span_of(pair, offset);
        malformed(format!("number {} is too large", pair.as_str()), start, end)
    })
}

pub fn load_aut(path: &Path) -> Result<Lts, LtsError> {
    let source = std::fs::read_to_string(path).map_err(|source| LtsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_aut(&source, &path.display().to_string())
}

pub fn write_aut<W: Write>(lts: &Lts, out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "des ({},{},{})",
        lts.initial_state(),
        lts.num_transitions(),
        lts.num_states()
    )?;
    for t in lts.transitions() {
        writeln!(out, "({},\"{}\",{})", t.from, lts.label_name(t.label), t.to)?;
    }
    Ok(())
}

pub fn save_aut(lts: &Lts, path: &Path) -> Result<(), LtsError> {
    let io_error = |source| LtsError::Io {
        path: path.display().to_string(),
        source,
    };
    let file = std::fs::File::create(path).map_err(io_error)?;
    let mut out = io::BufWriter::new(file);
    write_aut(lts, &mut out).map_err(io_error)?;
    out.flush().map_err(io_error)
}

/// Render an LTS as `.aut` text.
pub fn to_aut_string(lts: &Lts) -> String {
    let mut out = Vec::new();
    // Writing to a Vec cannot fail.
    let _ = write_aut(lts, &mut out);
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lts::{Transition, TAU};

    #[test]
    fn reads_quoted_and_bare_labels() {
        let lts = read_aut("des (1, 3, 3)\n(0,\"a(1, 2)\",1)\n(1, tau, 2)\n( 2 , b , 0 )\n", "t.aut").unwrap();
        assert_eq!(lts.num_states(), 3);
        assert_eq!(lts.initial_state(), 1);
        let a = lts.label_id("a(1, 2)").unwrap();
        let b = lts.label_id("b").unwrap();
        assert_eq!(
            lts.transitions(),
            &[Transition::new(0, a, 1), Transition::new(1, TAU, 2), Transition::new(2, b, 0)]
        );
    }

    #[test]
    fn writes_what_it_reads() {
        let text = "des (0,2,2)\n(0,\"a\",1)\n(1,\"tau\",0)\n";
        let lts = read_aut(text, "t.aut").unwrap();
        assert_eq!(to_aut_string(&lts), text);
    }

    #[test]
    fn transition_count_must_match_header() {
        let err = read_aut("des (0, 2, 2)\n(0, \"a\", 1)\n", "t.aut").unwrap_err();
        assert!(err.to_string().contains("declares 2 transitions but the file contains 1"));
    }

    #[test]
    fn states_must_exist() {
        let err = read_aut("des (0, 1, 2)\n(0, \"a\", 5)\n", "t.aut").unwrap_err();
        assert!(err.to_string().contains("state 5 does not exist"));
        let err = read_aut("des (3, 0, 2)\n", "t.aut").unwrap_err();
        assert!(err.to_string().contains("initial state 3 does not exist"));
    }

    #[test]
    fn syntax_errors_point_at_the_offending_token() {
        // the missing comma is at the `1` on the second line
        let text = "des (0, 1, 2)\n(0, \"a\" 1)\n";
        match read_aut(text, "t.aut").unwrap_err() {
            LtsError::Malformed { span, message, .. } => {
                assert_eq!(span.offset(), text.find(" 1)").unwrap() + 1, "{message}");
                assert!(message.contains("`,`"), "{message}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn errors_on_later_lines_are_offset_into_the_file() {
        let text = "des (0, 2, 2)\n(0, \"a\", 1)\n\n(1, \"b\", x)\n";
        match read_aut(text, "t.aut").unwrap_err() {
            LtsError::Malformed { span, .. } => assert_eq!(span.offset(), text.find('x').unwrap()),
            other => panic!("unexpected error {other:?}"),
        }
        let err = read_aut("des (0, 1, 2)\n(0, \"a\", 7)\n", "t.aut").unwrap_err();
        match err {
            LtsError::Malformed { span, .. } => assert_eq!(span.offset(), 23),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn empty_input_has_no_header() {
        let err = read_aut("\n  \n", "t.aut").unwrap_err();
        assert!(err.to_string().contains("expected a `des` header"));
    }
}

//! Reader for the ASCII AIGER format (`aag`).
//!
//! Only combinational networks are accepted: a file with latches is
//! rejected as [`Error::Unsupported`]. AND gates may appear in any order;
//! they are added to the [`Aig`] once both fanins are known, without
//! structural hashing, so the result mirrors the file.

use std::collections::HashMap;

use log::debug;

use crate::aig::{Aig, Edge};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub m: usize,
    pub i: usize,
    pub l: usize,
    pub o: usize,
    pub a: usize,
}

#[derive(Debug, Clone, Copy)]
struct AndLine {
    line: usize,
    lhs: usize,
    rhs0: usize,
    rhs1: usize,
}

fn parse_numbers(line: usize, text: &str, expected: usize) -> Result<Vec<usize>> {
    let numbers = text
        .split_whitespace()
        .map(|t| {
            t.parse::<usize>()
                .map_err(|_| Error::parse(line, format!("expected a number, found '{}'", t)))
        })
        .collect::<Result<Vec<_>>>()?;
    if numbers.len() != expected {
        return Err(Error::parse(
            line,
            format!("expected {} numbers, found {}", expected, numbers.len()),
        ));
    }
    Ok(numbers)
}

fn parse_header(text: &str) -> Result<Header> {
    let mut tokens = text.split_whitespace();
    match tokens.next() {
        Some("aag") => {}
        Some("aig") => return Err(Error::Unsupported("binary AIGER".to_string())),
        Some(other) => return Err(Error::parse(1, format!("unknown format '{}'", other))),
        None => return Err(Error::parse(1, "missing header")),
    }
    let rest: Vec<&str> = tokens.collect();
    let numbers = parse_numbers(1, &rest.join(" "), 5)?;
    Ok(Header {
        m: numbers[0],
        i: numbers[1],
        l: numbers[2],
        o: numbers[3],
        a: numbers[4],
    })
}

/// Parse an ASCII AIGER description.
pub fn parse_aiger(text: &str) -> Result<Aig> {
    let mut lines = text.lines().enumerate().map(|(n, s)| (n + 1, s.trim()));

    let header = match lines.next() {
        Some((_, line)) => parse_header(line)?,
        None => return Err(Error::parse(1, "empty input")),
    };
    debug!("AIGER header: {:?}", header);
    if header.l > 0 {
        return Err(Error::Unsupported(format!(
            "{} latches (only combinational networks are supported)",
            header.l
        )));
    }
    if header.m < header.i + header.a {
        return Err(Error::parse(
            1,
            format!(
                "maximum variable index {} is below I + A = {}",
                header.m,
                header.i + header.a
            ),
        ));
    }

    let mut last_line = 1;
    let mut next_line = |what: &str| match lines.next() {
        Some((line, text)) => {
            last_line = line;
            Ok((line, text))
        }
        None => Err(Error::parse(
            last_line + 1,
            format!("unexpected end of input, expected {}", what),
        )),
    };

    let mut aig = Aig::new();
    // Edge for each defined variable.
    let mut defined: HashMap<usize, Edge> = HashMap::new();
    defined.insert(0, Edge::constant(false));

    let check_var = |line: usize, lit: usize| -> Result<usize> {
        let var = lit / 2;
        if var > header.m {
            return Err(Error::parse(
                line,
                format!("literal {} exceeds the maximum variable index {}", lit, header.m),
            ));
        }
        Ok(var)
    };

    for _ in 0..header.i {
        let (line, text) = next_line("an input")?;
        let lit = parse_numbers(line, text, 1)?[0];
        if lit % 2 != 0 || lit < 2 {
            return Err(Error::parse(line, format!("invalid input literal {}", lit)));
        }
        let var = check_var(line, lit)?;
        if defined.contains_key(&var) {
            return Err(Error::parse(line, format!("variable {} is defined twice", var)));
        }
        defined.insert(var, aig.add_input());
    }

    let mut output_lits = Vec::with_capacity(header.o);
    for _ in 0..header.o {
        let (line, text) = next_line("an output")?;
        let lit = parse_numbers(line, text, 1)?[0];
        check_var(line, lit)?;
        output_lits.push((line, lit));
    }

    let mut pending = Vec::with_capacity(header.a);
    let mut lhs_seen = HashMap::new();
    for _ in 0..header.a {
        let (line, text) = next_line("an AND gate")?;
        let numbers = parse_numbers(line, text, 3)?;
        let (lhs, rhs0, rhs1) = (numbers[0], numbers[1], numbers[2]);
        if lhs % 2 != 0 || lhs < 2 {
            return Err(Error::parse(line, format!("invalid AND literal {}", lhs)));
        }
        let var = check_var(line, lhs)?;
        check_var(line, rhs0)?;
        check_var(line, rhs1)?;
        if defined.contains_key(&var) || lhs_seen.insert(var, line).is_some() {
            return Err(Error::parse(line, format!("variable {} is defined twice", var)));
        }
        pending.push(AndLine {
            line,
            lhs,
            rhs0,
            rhs1,
        });
    }

    // Resolve AND gates whose fanins are known until nothing changes.
    let resolve = |defined: &HashMap<usize, Edge>, lit: usize| {
        defined.get(&(lit / 2)).map(|e| e.not_if(lit % 2 == 1))
    };
    while !pending.is_empty() {
        let before = pending.len();
        let mut rest = Vec::new();
        for gate in pending {
            match (resolve(&defined, gate.rhs0), resolve(&defined, gate.rhs1)) {
                (Some(a), Some(b)) => {
                    let edge = aig.and_unhashed(a, b);
                    defined.insert(gate.lhs / 2, edge);
                }
                _ => rest.push(gate),
            }
        }
        if rest.len() == before {
            let gate = rest[0];
            return Err(Error::parse(
                gate.line,
                format!(
                    "AND gate {} has an undefined or cyclic fanin ({} {})",
                    gate.lhs, gate.rhs0, gate.rhs1
                ),
            ));
        }
        pending = rest;
    }

    for &(line, lit) in &output_lits {
        let edge = resolve(&defined, lit)
            .ok_or_else(|| Error::parse(line, format!("output literal {} is undefined", lit)))?;
        aig.add_output(edge);
    }

    // Symbol table and comments.
    for (line, text) in lines {
        if text.is_empty() {
            continue;
        }
        if text == "c" {
            break;
        }
        let mut chars = text.chars();
        let kind = chars.next();
        if !matches!(kind, Some('i' | 'o')) {
            return Err(Error::parse(
                line,
                format!("unknown symbol kind in '{}'", text),
            ));
        }
        let (position, name) = chars
            .as_str()
            .split_once(' ')
            .ok_or_else(|| Error::parse(line, format!("malformed symbol '{}'", text)))?;
        let position: usize = position
            .parse()
            .map_err(|_| Error::parse(line, format!("malformed symbol '{}'", text)))?;
        match kind {
            Some('i') if position < aig.num_inputs() => aig.set_input_name(position, name),
            Some('o') if position < aig.num_outputs() => aig.set_output_name(position, name),
            _ => {
                return Err(Error::parse(
                    line,
                    format!("symbol position {} is out of range", position),
                ))
            }
        }
    }

    debug!(
        "parsed AIG with {} inputs, {} outputs, {} AND gates",
        aig.num_inputs(),
        aig.num_outputs(),
        aig.num_ands()
    );
    Ok(aig)
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_or() {
        // Output is ¬(¬a ∧ ¬b ∧ ¬c).
        let src = "\
aag 5 3 0 1 2
2
4
6
11
8 3 5
10 8 7
i0 a
i1 b
o0 f
c
any comment
";
        let aig = parse_aiger(src).unwrap();
        assert_eq!(aig.num_inputs(), 3);
        assert_eq!(aig.num_outputs(), 1);
        assert_eq!(aig.num_ands(), 2);
        assert_eq!(aig.input_name(0), "a");
        assert_eq!(aig.input_name(2), "pi2");
        assert_eq!(aig.output_name(0), "f");

        let mut count = 0;
        for bits in 0..8u32 {
            let v = [bits & 1 != 0, bits & 2 != 0, bits & 4 != 0];
            let out = aig.eval(&v)[0];
            assert_eq!(out, v[0] || v[1] || v[2]);
            count += out as usize;
        }
        assert_eq!(count, 7);
    }

    #[test]
    fn test_parse_out_of_order() {
        let src = "\
aag 4 2 0 1 2
2
4
8
8 6 2
6 2 4
";
        let aig = parse_aiger(src).unwrap();
        assert_eq!(aig.eval(&[true, true]), vec![true]);
        assert_eq!(aig.eval(&[true, false]), vec![false]);
    }

    #[test]
    fn test_parse_constant_output() {
        let aig = parse_aiger("aag 1 1 0 2 0\n2\n1\n0\n").unwrap();
        assert_eq!(aig.output_fanin(0), Edge::constant(true));
        assert_eq!(aig.output_fanin(1), Edge::constant(false));
    }

    #[test]
    fn test_reject_latches() {
        let err = parse_aiger("aag 1 0 1 0 0\n2 3\n").unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[test]
    fn test_reject_binary() {
        let err = parse_aiger("aig 0 0 0 0 0\n").unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[test]
    fn test_reject_cycle() {
        let src = "\
aag 3 1 0 1 2
2
6
4 6 2
6 4 2
";
        let err = parse_aiger(src).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("cyclic"));
    }

    #[test]
    fn test_reject_bad_literal() {
        let err = parse_aiger("aag 1 1 0 1 0\n2\n9\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));

        let err = parse_aiger("aag 1 1 0 1 0\n3\n2\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));

        let err = parse_aiger("aag 1 1 0 1 0\n2\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));
        let err = parse_aiger("aag 2 2 0 0 0\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn test_reject_bad_symbol() {
        let err = parse_aiger("aag 1 1 0 1 0\n2\n2\né x\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 4, .. }));
        assert!(err.to_string().contains("unknown symbol kind"));

        let err = parse_aiger("aag 1 1 0 1 0\n2\n2\ni5 x\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 4, .. }));

        let aig = parse_aiger("aag 1 1 0 1 0\n2\n2\ni0 é\n").unwrap();
        assert_eq!(aig.input_name(0), "é");
    }
}

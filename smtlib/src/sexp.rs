// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! A custom s-expression data type and parsing.
//!
//! Formulas sent to the solver and the solver's replies are both
//! s-expressions. Comments are part of the grammar so that annotated
//! transcripts and solver output with comments parse.

use peg::str::LineCol;
use serde::Serialize;
use std::fmt;

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, PartialOrd, Ord)]
pub enum Atom {
    I(usize),
    S(String),
}

impl Atom {
    /// Return the string value of self, if it is a string.
    pub fn s(&self) -> Option<&str> {
        if let Self::S(s) = self {
            Some(s)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A value in some interpreted universe. Currently either a Boolean or an integer.
pub enum InterpretedValue {
    /// A Boolean value
    Bool(bool),
    /// An integer value
    Int(isize),
}

impl InterpretedValue {
    /// Return the inner `bool` (if the interpreted value is a `bool`).
    pub fn bool(&self) -> Option<bool> {
        match self {
            InterpretedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Return the inner integer (if the interpreted value is an integer).
    pub fn int(&self) -> Option<isize> {
        match self {
            InterpretedValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

/// An s-expression which also tracks comments.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, PartialOrd, Ord)]
pub enum Sexp {
    Atom(Atom),
    Comment(String),
    List(Vec<Sexp>),
}

/// Construct an sexp atom from a string.
pub fn atom_s<S: AsRef<str>>(s: S) -> Sexp {
    Sexp::Atom(Atom::S(s.as_ref().to_string()))
}

/// Construct an sexp atom from an integer.
pub fn atom_i(i: usize) -> Sexp {
    Sexp::Atom(Atom::I(i))
}

/// Construct an sexp list from an iteratable.
pub fn sexp_l<I>(i: I) -> Sexp
where
    I: IntoIterator,
    I::IntoIter: Iterator<Item = Sexp>,
{
    Sexp::List(i.into_iter().collect())
}

/// Construct an sexp list with a string atom as its "head" element, followed by
/// an iterable of remaining arguments.
pub fn app<I>(head: &str, args: I) -> Sexp
where
    I: IntoIterator,
    I::IntoIter: Iterator<Item = Sexp>,
{
    let mut ss = vec![atom_s(head)];
    #[allow(clippy::useless_conversion)]
    ss.extend(args.into_iter());
    Sexp::List(ss)
}

/// Conjoin formulas, with the empty conjunction being `true` and a single
/// formula left unwrapped (solvers can reject `(and)`).
pub fn and<I>(conjuncts: I) -> Sexp
where
    I: IntoIterator<Item = Sexp>,
{
    let mut conjuncts: Vec<Sexp> = conjuncts.into_iter().collect();
    match conjuncts.len() {
        0 => atom_s("true"),
        1 => conjuncts.swap_remove(0),
        _ => app("and", conjuncts),
    }
}

/// Negate a formula.
pub fn not(e: Sexp) -> Sexp {
    app("not", [e])
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::I(i) => write!(f, "{i}"),
            Atom::S(s) => {
                if s.contains([' ', '\"', '\'']) {
                    write!(f, "|{s}|")
                } else if s.contains('|') {
                    write!(f, "\"{s}\"")
                } else {
                    write!(f, "{s}")
                }
            }
        }
    }
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexp::Atom(s) => write!(f, "{s}"),
            Sexp::Comment(s) => write!(f, ";{s}"),
            Sexp::List(ss) => {
                write!(f, "(")?;
                for (i, s) in ss.iter().enumerate() {
                    let last = i == ss.len() - 1;
                    let this_comment = matches!(s, Sexp::Comment(_));
                    let next_comment = !last && matches!(ss[i + 1], Sexp::Comment(_));
                    let space = if last || this_comment || next_comment {
                        ""
                    } else {
                        " "
                    };
                    if this_comment {
                        write!(f, "\n{s}\n{space}")?;
                    } else {
                        write!(f, "{s}{space}")?;
                    }
                }
                write!(f, ")")?;
                Ok(())
            }
        }
    }
}

impl Sexp {
    /// Return the inner elements if self is a Sexp::List
    pub fn list(&self) -> Option<&[Sexp]> {
        if let Sexp::List(ss) = self {
            Some(ss)
        } else {
            None
        }
    }

    /// Return the inner string if self is a string atom.
    pub fn atom_s(&self) -> Option<&str> {
        if let Sexp::Atom(Atom::S(s)) = self {
            Some(s)
        } else {
            None
        }
    }

    /// Return the inner integer if self is an integer atom.
    pub fn atom_i(&self) -> Option<usize> {
        if let Sexp::Atom(Atom::I(i)) = self {
            Some(*i)
        } else {
            None
        }
    }

    /// Return the interpreted value of the [`Sexp`]
    pub fn interpreted_value(&self) -> Option<InterpretedValue> {
        match self {
            Sexp::Atom(Atom::I(i)) => isize::try_from(*i).ok().map(InterpretedValue::Int),
            Sexp::Atom(Atom::S(s)) => match s as &str {
                "true" => Some(InterpretedValue::Bool(true)),
                "false" => Some(InterpretedValue::Bool(false)),
                _ => None,
            },
            Sexp::List(v) if v.len() == 2 && v[0].atom_s().is_some_and(|h| h == "-") => {
                match v[1].interpreted_value() {
                    Some(InterpretedValue::Int(i)) => Some(InterpretedValue::Int(-i)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Return the head and tail if self is of the form `(head rest..)`.
    pub fn app(&self) -> Option<(&str, &[Sexp])> {
        self.list().and_then(|ss| {
            if !ss.is_empty() {
                if let Some(head) = ss[0].atom_s() {
                    return Some((head, &ss[1..]));
                }
            }
            None
        })
    }

    /// Remove comments, recursively.
    pub fn without_comments(&self) -> Sexp {
        match self {
            Sexp::List(ss) => Sexp::List(
                ss.iter()
                    .filter(|s| !matches!(s, Sexp::Comment(_)))
                    .map(|s| s.without_comments())
                    .collect(),
            ),
            _ => self.clone(),
        }
    }
}

peg::parser! {
grammar parser() for str {
  rule ident_start() = ['a'..='z' | 'A'..='Z' | '_' | '\'' | '<' | '>' | ':' | '=' | '$' | '@' | '+' | '-' | '*' | '/' | '~' | '&' | '^' | '?' | '!' | '.']
  rule ident_char() = ident_start() / ['0'..='9' | '#' | '%']
  rule ident() = quiet! { ident_start() ident_char()* } / expected!("atom")

  rule whitespace() = [' ' | '\t' | '\n' | '\r']
  rule _ = whitespace()*

  rule quoted_atom() -> Atom
  = "\"" s:$([^'"']*) "\"" { Atom::S(s.to_string()) }

  rule pipe_quoted_atom() -> Atom
  = "|" s:$([^'|']*) "|" { Atom::S(s.to_string()) }

  rule unquoted_atom() -> Atom
  = s:$(ident()) { Atom::S(s.to_string()) }

  rule decimal_atom() -> Atom
  = d:$(['0'..='9']+ "." ['0'..='9']+) { Atom::S(d.to_string()) }

  rule bitvector_atom() -> Atom
  = b:$("#b" ['0' | '1']+ / "#x" ['0'..='9' | 'a'..='f' | 'A'..='F']+) { Atom::S(b.to_string()) }

  // numerals too large for a usize are kept as strings
  rule int_atom() -> Atom
  = i:$(['0'..='9']+) {
      match i.parse() {
          Ok(n) => Atom::I(n),
          Err(_) => Atom::S(i.to_string()),
      }
  }

  rule atom() -> Sexp
  = s:(quoted_atom() /
       pipe_quoted_atom() /
       unquoted_atom() /
       decimal_atom() /
       bitvector_atom() /
       int_atom()) { Sexp::Atom(s) }

  rule comment() -> Sexp
  = ";" s:$(([^'\n']*)) ['\n'] { Sexp::Comment(s.to_string()) }

  rule list() -> Sexp
  = "(" _ ss:(sexp() ** _) _ ")" { Sexp::List(ss) }

  rule sexp() -> Sexp
  = atom() / comment() / list()

  /// Parse an sexp but be tolerant to whitespace around it.
  pub(super) rule sexp_whitespace() -> Sexp
  = _ s:sexp() _ { s }

  /// Parse a sequence of sexps.
  pub(super) rule sexps() -> Vec<Sexp>
  = _ ss:(sexp() ** _) _ { ss }
}
}

/// Parse an sexp.
///
/// Allows whitespace before or after.
pub fn parse(s: &str) -> Result<Sexp, peg::error::ParseError<LineCol>> {
    parser::sexp_whitespace(s)
}

/// Parse a sequence of sexps, separated by whitespace.
pub fn parse_many(s: &str) -> Result<Vec<Sexp>, peg::error::ParseError<LineCol>> {
    parser::sexps(s)
}

#[cfg(test)]
mod tests {
    use super::{and, not, parse, parse_many, InterpretedValue};
    use super::{app, atom_i, atom_s, sexp_l};

    #[test]
    fn test_parsing() {
        assert_eq!(
            parse("(foo  a (bar () 1))"),
            Ok(app(
                "foo",
                [atom_s("a"), app("bar", [sexp_l([]), atom_i(1)])]
            ))
        );
    }

    #[test]
    fn test_app_arguments() {
        let args = vec![atom_s("Int"), atom_s("Bool")];
        let from_iter = app("Array", args.iter().cloned());
        assert_eq!(app("Array", args), from_iter);
        insta::assert_snapshot!(from_iter, @"(Array Int Bool)");
        insta::assert_snapshot!(app("f", [atom_i(1)]), @"(f 1)");
        insta::assert_snapshot!(app("g", std::iter::empty::<super::Sexp>()), @"(g)");
    }

    #[test]
    fn test_printing() {
        let e = parse(
            r#"(hello a b c (there
            ; here's a comment
            (friend)))
            "#,
        )
        .unwrap();
        insta::assert_snapshot!(e, @r#"
        (hello a b c (there
        ; here's a comment
        (friend)))
        "#);
    }

    #[test]
    fn test_parsing_unusual_chars() {
        let s = vec![
            "(p A!val!0)",
            "(labels +A @B)",
            "(! (<= x 0) :lblneg +A)",
            "<<DONE>>\n",
            "(:reason-unknown \"timeout\")",
        ]
        .into_iter()
        .map(|s| parse(s).unwrap());
        let printed: Vec<String> = s.map(|s| s.to_string()).collect();
        insta::assert_snapshot!(printed.join("\n"), @r###"
        (p A!val!0)
        (labels +A @B)
        (! (<= x 0) :lblneg +A)
        <<DONE>>
        (:reason-unknown timeout)
        "###);
    }

    #[test]
    fn test_roundtrip_parsing() {
        let mut es = vec![];
        for s in [
            r#"  "hello there" "#,
            r#"|"hello"|"#,
            r#"|also has a space|"#,
            r#"(forall ((x T)) (= x T!val!0))"#,
        ] {
            let e = parse(s).unwrap_or_else(|_| panic!("`{s}` did not parse"));
            es.push(e.clone());
            assert_eq!(
                parse(&e.to_string()).unwrap(),
                e,
                "`{s}` does not roundtrip",
            );
        }
        insta::assert_snapshot!(&es[0], @"|hello there|");
        insta::assert_snapshot!(&es[1], @r#"|"hello"|"#);
        insta::assert_snapshot!(&es[2], @"|also has a space|");
    }

    #[test]
    fn test_numerals() {
        let es = parse_many("1.5 (- 3) 123456789012345678901234567890 #x0a #b101").unwrap();
        assert_eq!(es[0], atom_s("1.5"));
        assert_eq!(es[3], atom_s("#x0a"));
        assert_eq!(es[4], atom_s("#b101"));
        assert_eq!(es[1].interpreted_value(), Some(InterpretedValue::Int(-3)));
        assert_eq!(es[2], atom_s("123456789012345678901234567890"));
        assert_eq!(es[2].interpreted_value(), None);
    }

    #[test]
    fn test_connectives() {
        assert_eq!(and([]), atom_s("true"));
        assert_eq!(and([atom_s("p")]), atom_s("p"));
        insta::assert_snapshot!(not(and([atom_s("p"), atom_s("q")])), @"(not (and p q))");
    }

    #[test]
    fn test_without_comments() {
        let e = parse("(model\n; a comment\n(define-fun x () Int 1))").unwrap();
        assert_eq!(
            e.without_comments(),
            parse("(model (define-fun x () Int 1))").unwrap()
        );
    }
}

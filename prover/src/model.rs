// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Counterexample models as returned by the solver's `(get-model)`.

use std::collections::BTreeMap;
use std::fmt;

use smtlib::proc::SolverError;
use smtlib::sexp::{atom_s, InterpretedValue, Sexp};

/// One symbol's interpretation: `(define-fun name ((p S) ...) S body)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    /// Parameters with their sorts, in order
    pub params: Vec<(String, Sexp)>,
    /// Result sort
    pub sort: Sexp,
    /// Value (for constants) or function body
    pub body: Sexp,
}

/// A counterexample: the solver's interpretation of the symbols it needed.
///
/// Models are partial (completion is off), so a declared symbol can be
/// missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorModel {
    definitions: BTreeMap<String, Definition>,
    universes: BTreeMap<String, Vec<String>>,
}

fn malformed(what: &str, s: &Sexp) -> SolverError {
    SolverError::UnexpectedResponse {
        cmd: "(get-model)".to_string(),
        resp: format!("{what}: {s}"),
    }
}

fn parse_params(binders: &Sexp) -> Result<Vec<(String, Sexp)>, SolverError> {
    let binder_sexps = binders
        .list()
        .ok_or_else(|| malformed("binders should be a list", binders))?;
    binder_sexps
        .iter()
        .map(|b| match b.list() {
            Some([name, sort]) => name
                .atom_s()
                .map(|name| (name.to_string(), sort.clone()))
                .ok_or_else(|| malformed("binder name should be a symbol", b)),
            _ => Err(malformed("binder should be (name sort)", b)),
        })
        .collect()
}

impl ErrorModel {
    /// An empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a Z3 `(get-model)` response.
    pub fn parse(model: &Sexp) -> Result<Self, SolverError> {
        let model = model.without_comments();
        let ss = model
            .list()
            .ok_or_else(|| malformed("model should be a list", &model))?;
        // remove a leading "model" for older versions
        let ss = if ss.first() == Some(&atom_s("model")) {
            &ss[1..]
        } else {
            ss
        };
        let mut parsed = Self::new();
        for s in ss {
            match s.app() {
                Some(("define-fun", [name, binders, sort, body])) => {
                    let name = name
                        .atom_s()
                        .ok_or_else(|| malformed("define-fun name should be a symbol", s))?;
                    parsed.definitions.insert(
                        name.to_string(),
                        Definition {
                            params: parse_params(binders)?,
                            sort: sort.clone(),
                            body: body.clone(),
                        },
                    );
                }
                // a universe element of an uninterpreted sort, with no body
                Some(("declare-fun", [name, binders, sort]))
                    if binders.list().is_some_and(|l| l.is_empty()) =>
                {
                    match (name.atom_s(), sort.atom_s()) {
                        (Some(name), Some(sort)) => parsed
                            .universes
                            .entry(sort.to_string())
                            .or_default()
                            .push(name.to_string()),
                        _ => return Err(malformed("ill-formed universe element", s)),
                    }
                }
                // cardinality constraints on universes
                Some(("forall", _)) => {}
                _ => log::warn!("unexpected {s} in z3 model"),
            }
        }
        Ok(parsed)
    }

    /// Add (or replace) the value of a 0-ary symbol.
    pub fn with_value<S: AsRef<str>>(mut self, name: S, sort: Sexp, value: Sexp) -> Self {
        self.definitions.insert(
            name.as_ref().to_string(),
            Definition {
                params: vec![],
                sort,
                body: value,
            },
        );
        self
    }

    /// The definition of `name`, if the model has one.
    pub fn definition(&self, name: &str) -> Option<&Definition> {
        self.definitions.get(name)
    }

    /// The value of a 0-ary symbol.
    pub fn value(&self, name: &str) -> Option<&Sexp> {
        self.definitions
            .get(name)
            .filter(|d| d.params.is_empty())
            .map(|d| &d.body)
    }

    /// The value of a 0-ary symbol if it is a boolean or integer literal.
    pub fn interpreted_value(&self, name: &str) -> Option<InterpretedValue> {
        self.value(name).and_then(|v| v.interpreted_value())
    }

    /// Symbols with a definition, in name order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(|s| s.as_str())
    }

    /// The elements the solver used for an uninterpreted sort.
    pub fn universe(&self, sort: &str) -> &[String] {
        self.universes.get(sort).map_or(&[], |u| u.as_slice())
    }

    /// Whether the model interprets nothing.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl fmt::Display for ErrorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, def) in &self.definitions {
            if def.params.is_empty() {
                writeln!(f, "{name} = {}", def.body)?;
            } else {
                let params = def
                    .params
                    .iter()
                    .map(|(p, _)| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                writeln!(f, "{name}({params}) = {}", def.body)?;
            }
        }
        Ok(())
    }
}

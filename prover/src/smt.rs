// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! A [`Backend`] for Z3, talking SMT-LIB2 to a solver process.

use std::path::{Path, PathBuf};

use smtlib::conf::Z3Conf;
use smtlib::proc::{SatResp, SmtProc, SolverError};
use smtlib::sexp::{self, app, atom_i, atom_s, sexp_l, Atom, Sexp};

use crate::backend::{Backend, CheckResult, ErrorModelAndLabels, Outcome, SessionFactory};
use crate::conf::SessionConf;
use crate::decl::Type;
use crate::error::SessionError;
use crate::model::ErrorModel;
use crate::prover::Prover;
use crate::solver_path;

/// The SMT-LIB sort for a type. Maps become nested arrays, curried over
/// their domain.
pub fn sort(ty: &Type) -> Sexp {
    match ty {
        Type::Bool => atom_s("Bool"),
        Type::Int => atom_s("Int"),
        Type::Real => atom_s("Real"),
        Type::BitVector(width) => app("_", [atom_s("BitVec"), atom_i(*width as usize)]),
        Type::Ctor(name) => atom_s(name),
        Type::Map { domain, range } => domain
            .iter()
            .rev()
            .fold(sort(range), |acc, d| app("Array", [sort(d), acc])),
    }
}

/// How many counterexamples one invalid check reports. Without a bound only
/// the first model is returned, and no enumeration takes place. A bound of 0
/// still reports that model, since an invalid outcome always carries one.
pub fn models_per_check(conf: &SessionConf) -> usize {
    conf.counterexample_limit().unwrap_or(1).max(1)
}

// Values that can be written back into an assertion. Universe elements
// such as `T!val!0` cannot.
fn is_literal(v: &Sexp) -> bool {
    match v {
        Sexp::Atom(Atom::I(_)) => true,
        Sexp::Atom(Atom::S(s)) => {
            s == "true"
                || s == "false"
                || s.starts_with("#b")
                || s.starts_with("#x")
                || (!s.is_empty() && s.chars().all(|c| c.is_ascii_digit() || c == '.'))
        }
        Sexp::List(_) => match v.app() {
            Some(("-" | "/", args)) => !args.is_empty() && args.iter().all(is_literal),
            Some(("_", [bv, _])) => bv.atom_s().is_some_and(|s| s.starts_with("bv")),
            _ => false,
        },
        Sexp::Comment(_) => false,
    }
}

fn blockable(ty: &Type) -> bool {
    matches!(
        ty,
        Type::Bool | Type::Int | Type::Real | Type::BitVector(_)
    )
}

/// A Z3 session.
///
/// Every check that comes back `sat` reports the labels and model of the
/// solver's answer. With a counterexample limit above one, further
/// counterexamples are found by blocking the values the previous one gave
/// the declared constants and checking again, in a temporary frame.
#[derive(Debug)]
pub struct SmtBackend {
    proc: SmtProc,
    counterexample_limit: usize,
    // 0-ary symbols whose values can be blocked
    constants: Vec<String>,
}

impl SmtBackend {
    /// Launch Z3 from `bin`, configured by `conf`. If `tee` is given, the
    /// SMT-LIB sent to the solver is saved there on every check.
    pub fn new(bin: &str, conf: &SessionConf, tee: Option<&Path>) -> Result<Self, SolverError> {
        let conf = conf.effective();
        let mut z3 = Z3Conf::new(bin);
        z3.model_generation(conf.model_generation)
            .model_completion(conf.model_completion)
            .type_check(conf.type_check)
            .soft_timeout_ms(conf.timeout_ms());
        let cmd = z3.done();
        log::info!("starting prover session: {}", cmd.cmdline());
        let proc = SmtProc::new(cmd, tee)?;
        Ok(Self {
            proc,
            counterexample_limit: models_per_check(&conf),
            constants: vec![],
        })
    }

    fn counterexample(&mut self) -> Result<ErrorModelAndLabels, SolverError> {
        // labels refer to the latest check-sat, so get them first
        let labels = self.proc.get_labels()?;
        let model = ErrorModel::parse(&self.proc.get_model()?)?;
        Ok(ErrorModelAndLabels { model, labels })
    }

    /// A formula ruling out the values `model` gives the declared constants,
    /// or None if it gives none of them a literal value.
    fn blocking_clause(&self, model: &ErrorModel) -> Option<Sexp> {
        let eqs: Vec<Sexp> = self
            .constants
            .iter()
            .filter_map(|name| {
                model
                    .value(name)
                    .filter(|v| is_literal(v))
                    .map(|v| app("=", [atom_s(name), v.clone()]))
            })
            .collect();
        if eqs.is_empty() {
            return None;
        }
        Some(sexp::not(sexp::and(eqs)))
    }

    fn enumerate(&mut self, models: &mut Vec<ErrorModelAndLabels>) -> Result<(), SolverError> {
        while models.len() < self.counterexample_limit {
            let Some(block) = models.last().and_then(|m| self.blocking_clause(&m.model)) else {
                log::debug!("counterexample has no values to block");
                break;
            };
            self.proc.send(&app("assert", [block]))?;
            match self.proc.check_sat()? {
                SatResp::Sat => models.push(self.counterexample()?),
                SatResp::Unsat => break,
                SatResp::Unknown(reason) => {
                    log::debug!("stopped looking for counterexamples: {reason}");
                    break;
                }
            }
        }
        Ok(())
    }
}

impl Backend for SmtBackend {
    fn declare_type(&mut self, name: &str) -> Result<(), SolverError> {
        self.proc
            .send(&app("declare-sort", [atom_s(name), atom_i(0)]))
    }

    fn declare_constant(&mut self, name: &str, ty: &Type) -> Result<(), SolverError> {
        self.proc
            .send(&app("declare-fun", [atom_s(name), sexp_l([]), sort(ty)]))?;
        if blockable(ty) {
            self.constants.push(name.to_string());
        }
        Ok(())
    }

    fn declare_function(
        &mut self,
        name: &str,
        domain: &[Type],
        range: &Type,
    ) -> Result<(), SolverError> {
        self.proc.send(&app(
            "declare-fun",
            [atom_s(name), sexp_l(domain.iter().map(sort)), sort(range)],
        ))
    }

    fn create_backtrack_point(&mut self) -> Result<(), SolverError> {
        self.proc.push()
    }

    fn backtrack(&mut self) -> Result<(), SolverError> {
        self.proc.pop()
    }

    fn add_axiom(&mut self, formula: &Sexp) -> Result<(), SolverError> {
        self.proc.send(&app("assert", [formula.clone()]))
    }

    fn add_conjecture(&mut self, formula: &Sexp) -> Result<(), SolverError> {
        self.proc
            .send(&app("assert", [sexp::not(formula.clone())]))
    }

    fn check(&mut self) -> Result<CheckResult, SolverError> {
        match self.proc.check_sat()? {
            SatResp::Unsat => Ok(CheckResult::new(Outcome::Valid)),
            SatResp::Unknown(reason) => {
                let outcome = Outcome::from_unknown_reason(&reason);
                log::warn!("solver returned unknown ({reason}), reporting {outcome}");
                Ok(CheckResult::new(outcome))
            }
            SatResp::Sat => {
                let mut models = vec![self.counterexample()?];
                if self.counterexample_limit > 1 {
                    self.proc.push()?;
                    let found = self.enumerate(&mut models);
                    self.proc.pop()?;
                    found?;
                }
                Ok(CheckResult::invalid(models))
            }
        }
    }

    fn comment(&mut self, text: &str) {
        self.proc.comment_with(|| text.to_string());
    }

    fn flush_log(&mut self, name: &str) {
        if let Some(path) = self.proc.save_tee(name) {
            log::debug!("saved smt2 for {name} to {}", path.display());
        }
    }
}

/// Starts Z3 sessions.
#[derive(Debug, Clone)]
pub struct SmtFactory {
    bin: String,
    tee: Option<PathBuf>,
}

impl Default for SmtFactory {
    fn default() -> Self {
        Self::new(&solver_path("z3"))
    }
}

impl SmtFactory {
    /// Sessions will run the Z3 binary at `bin`.
    pub fn new(bin: &str) -> Self {
        Self {
            bin: bin.to_string(),
            tee: None,
        }
    }

    /// Save the SMT-LIB of every check to files in `dir`.
    pub fn tee<P: AsRef<Path>>(&mut self, dir: P) -> &mut Self {
        self.tee = Some(dir.as_ref().to_path_buf());
        return self;
    }
}

impl SessionFactory for SmtFactory {
    type Backend = SmtBackend;

    fn create_session(&self, conf: &SessionConf) -> Result<Prover<SmtBackend>, SessionError> {
        // warn about forced options once
        let conf = conf.effective();
        let backend = SmtBackend::new(&self.bin, &conf, self.tee.as_deref())?;
        Ok(Prover::new(backend, &conf))
    }
}

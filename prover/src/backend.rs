// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The interface to a solver that a [`Prover`] drives.
//!
//! A backend forwards declarations and assertions, manages the solver's
//! assertion stack, and reports what a check returned. Whether a symbol is
//! already declared, when the background theory is asserted, and what labels
//! mean are decided by the layers above.

use std::fmt;

use smtlib::proc::SolverError;

use crate::conf::SessionConf;
use crate::decl::Type;
use crate::error::SessionError;
use crate::model::ErrorModel;
use crate::prover::Prover;
use crate::Sexp;

/// The classification of one check.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The goal holds: its negation is unsatisfiable
    Valid,
    /// The goal does not hold; counterexamples are available
    Invalid,
    /// The solver gave up for a reason other than a limit
    Undetermined,
    /// The solver ran out of memory
    OutOfMemory,
    /// The solver hit a resource limit
    OutOfResource,
    /// The solver hit its timeout (or was canceled)
    TimeOut,
}

impl Outcome {
    /// Classify the reason a solver gives for answering `unknown`.
    pub fn from_unknown_reason(reason: &str) -> Self {
        let reason = reason.to_lowercase();
        if reason.contains("timeout") || reason.contains("canceled") {
            Outcome::TimeOut
        } else if reason.contains("memout") || reason.contains("memory") {
            Outcome::OutOfMemory
        } else if reason.contains("resource") || reason.contains("rlimit") {
            Outcome::OutOfResource
        } else {
            Outcome::Undetermined
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Valid => "valid",
            Outcome::Invalid => "invalid",
            Outcome::Undetermined => "undetermined",
            Outcome::OutOfMemory => "out of memory",
            Outcome::OutOfResource => "out of resource",
            Outcome::TimeOut => "timeout",
        };
        write!(f, "{s}")
    }
}

/// A counterexample together with the labels, still encoded, that the solver
/// reported as relevant to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorModelAndLabels {
    #[allow(missing_docs)]
    pub model: ErrorModel,
    /// Raw labels, each with its sentinel
    pub labels: Vec<String>,
}

/// What a backend check returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    #[allow(missing_docs)]
    pub outcome: Outcome,
    /// Counterexamples; only non-empty when the outcome is
    /// [`Outcome::Invalid`]
    pub models: Vec<ErrorModelAndLabels>,
}

impl CheckResult {
    /// A result with no counterexamples.
    pub fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            models: vec![],
        }
    }

    /// An invalid result with the given counterexamples.
    pub fn invalid(models: Vec<ErrorModelAndLabels>) -> Self {
        Self {
            outcome: Outcome::Invalid,
            models,
        }
    }
}

/// One live session with a solver.
///
/// Symbols must be declared before any assertion mentions them; the backend
/// does not check this.
pub trait Backend {
    /// Declare an uninterpreted sort.
    fn declare_type(&mut self, name: &str) -> Result<(), SolverError>;

    /// Declare a 0-ary symbol.
    fn declare_constant(&mut self, name: &str, ty: &Type) -> Result<(), SolverError>;

    /// Declare a function symbol.
    fn declare_function(
        &mut self,
        name: &str,
        domain: &[Type],
        range: &Type,
    ) -> Result<(), SolverError>;

    /// Push a new frame on the assertion stack.
    fn create_backtrack_point(&mut self) -> Result<(), SolverError>;

    /// Pop the latest frame and everything asserted in it.
    fn backtrack(&mut self) -> Result<(), SolverError>;

    /// Assert a formula.
    fn add_axiom(&mut self, formula: &Sexp) -> Result<(), SolverError>;

    /// Assert the negation of a formula, so that the next check decides
    /// whether the formula is valid.
    fn add_conjecture(&mut self, formula: &Sexp) -> Result<(), SolverError>;

    /// Check the current assertions.
    fn check(&mut self) -> Result<CheckResult, SolverError>;

    /// Record a comment in whatever transcript the backend keeps.
    fn comment(&mut self, text: &str) {
        _ = text;
    }

    /// Persist the transcript of the session so far under a name derived
    /// from `name`.
    fn flush_log(&mut self, name: &str) {
        _ = name;
    }
}

/// Something that can start new prover sessions.
pub trait SessionFactory {
    /// The backend of the sessions this creates.
    type Backend: Backend;

    /// Start a new session with its own solver.
    fn create_session(&self, conf: &SessionConf) -> Result<Prover<Self::Backend>, SessionError>;
}

// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Errors from declaring symbols and running a prover session.
//!
//! Check outcomes such as a timeout are not errors; see
//! [`Outcome`](crate::backend::Outcome).

use smtlib::proc::SolverError;
use thiserror::Error;

use crate::decl::{DeclKind, Type};
use crate::labels::LabelError;

/// A declaration that cannot be made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeclError {
    /// The name is already taken in its namespace
    #[error("{kind} {name} is already declared")]
    Duplicate {
        #[allow(missing_docs)]
        kind: DeclKind,
        #[allow(missing_docs)]
        name: String,
    },
    /// Only functions with exactly one output can be declared
    #[error("cannot handle function {name} with {outputs} out parameters")]
    Arity {
        #[allow(missing_docs)]
        name: String,
        /// number of outputs the function has
        outputs: usize,
    },
    /// The declaration mentions a type constructor that was not declared yet
    #[error("{name} uses undeclared type {ty}")]
    UndeclaredType {
        #[allow(missing_docs)]
        name: String,
        #[allow(missing_docs)]
        ty: Type,
    },
}

/// Errors from a prover session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// A declaration was rejected before reaching the solver
    #[error(transparent)]
    Declaration(#[from] DeclError),
    /// The solver produced a label outside the label protocol
    #[error("label protocol violation: {0}")]
    Protocol(#[from] LabelError),
    /// The solver could not be reached or misbehaved
    #[error("solver unavailable: {0}")]
    Solver(#[from] SolverError),
    /// An axiom was added after the background theory was asserted
    #[error("background theory is already asserted; axioms can no longer be added")]
    TheoryLoaded,
}

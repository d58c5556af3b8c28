// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Incremental prover sessions on top of an SMT solver.
//!
//! A [`Prover`](prover::Prover) drives one solver session: symbols are declared
//! through its [`ProverContext`](context::ProverContext), the background theory
//! is asserted once, and each goal is checked under its own backtrack point so
//! it can be popped and the next goal checked against the same theory. When a
//! goal is not valid, the counterexample models and their labels are handed to
//! an [`ErrorHandler`](prover::ErrorHandler).
//!
//! The solver itself sits behind the [`Backend`](backend::Backend) trait;
//! [`SmtBackend`](smt::SmtBackend) implements it for Z3 over SMT-LIB2.

// configure clippy
#![allow(clippy::needless_return)]
#![allow(clippy::type_complexity)]
#![deny(clippy::uninlined_format_args)]
// documentation-related lints (only checked when running rustdoc)
#![warn(missing_docs)]
#![allow(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod backend;
pub mod conf;
pub mod context;
pub mod decl;
pub mod error;
pub mod labels;
pub mod model;
pub mod prover;
pub mod registry;
pub mod smt;

#[cfg(test)]
mod testing;

pub use smtlib::path::solver_path;
pub use smtlib::sexp::Sexp;

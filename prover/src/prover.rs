// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The session controller: asserts the background theory and goals on a
//! backend's assertion stack, runs checks, and reports counterexamples.
//!
//! The incremental path ([`Prover::begin_check`]) asserts the background
//! theory once and then checks every goal in its own frame on top of it,
//! popping the previous goal first. The one-shot path
//! ([`Prover::prepare_check`] and [`Prover::begin_prepared_check`]) pushes the
//! theory and the goal in frames of their own and leaves the stack to the
//! caller.
//!
//! The controller tracks the depth of the stack, the level at which the
//! theory was asserted, and the level of the live goal. Popping below either
//! level forgets it, so the next incremental check re-asserts the theory or
//! skips popping a goal the caller already removed.

use std::time::Instant;

use crate::backend::{Backend, ErrorModelAndLabels, Outcome};
use crate::conf::SessionConf;
use crate::context::ProverContext;
use crate::error::SessionError;
use crate::labels;
use crate::model::ErrorModel;
use crate::Sexp;

/// Receives the counterexamples of an invalid check.
pub trait ErrorHandler {
    /// Called once per counterexample with its decoded labels.
    fn on_model(&mut self, labels: &[String], model: &ErrorModel);
}

impl<F> ErrorHandler for F
where
    F: FnMut(&[String], &ErrorModel),
{
    fn on_model(&mut self, labels: &[String], model: &ErrorModel) {
        self(labels, model)
    }
}

/// Where a session is in the incremental protocol.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// The background theory is not asserted
    Idle,
    /// The background theory is asserted and no goal is live
    TheoryLoaded,
    /// A goal from [`Prover::begin_check`] is live on top of the theory
    GoalPushed,
}

/// A prover session over a backend.
#[derive(Debug)]
pub struct Prover<B> {
    ctx: ProverContext<B>,
    conf: SessionConf,
    depth: usize,
    theory_level: Option<usize>,
    goal_level: Option<usize>,
    outcome: Outcome,
    models: Vec<ErrorModelAndLabels>,
}

impl<B: Backend> Prover<B> {
    /// Start a session on `backend`, which must have been set up according
    /// to `conf`.
    pub fn new(backend: B, conf: &SessionConf) -> Self {
        Self {
            ctx: ProverContext::new(backend),
            conf: conf.effective(),
            depth: 0,
            theory_level: None,
            goal_level: None,
            outcome: Outcome::Undetermined,
            models: vec![],
        }
    }

    /// The declarations and background theory of this session.
    pub fn context(&self) -> &ProverContext<B> {
        &self.ctx
    }

    /// Mutable access to the context, to declare symbols.
    pub fn context_mut(&mut self) -> &mut ProverContext<B> {
        &mut self.ctx
    }

    /// The configuration the session runs with.
    pub fn conf(&self) -> &SessionConf {
        &self.conf
    }

    /// Number of live backtrack points.
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[allow(missing_docs)]
    pub fn state(&self) -> SessionState {
        if self.goal_level.is_some() {
            SessionState::GoalPushed
        } else if self.theory_level.is_some() {
            SessionState::TheoryLoaded
        } else {
            SessionState::Idle
        }
    }

    /// The outcome of the latest check.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Extend the background theory. Fails once the incremental path has
    /// asserted the theory, since the new axiom would never reach the solver.
    pub fn add_axiom(&mut self, formula: Sexp) -> Result<(), SessionError> {
        if self.theory_level.is_some() {
            return Err(SessionError::TheoryLoaded);
        }
        self.ctx.add_axiom(formula);
        Ok(())
    }

    /// Push a new backtrack point.
    pub fn create_backtrack_point(&mut self) -> Result<(), SessionError> {
        self.ctx.backend_mut().create_backtrack_point()?;
        self.depth += 1;
        log::debug!("push (depth {})", self.depth);
        Ok(())
    }

    /// Discard the latest backtrack point and everything asserted since.
    ///
    /// # Panics
    ///
    /// Panics if there is no backtrack point.
    pub fn pop(&mut self) -> Result<(), SessionError> {
        assert!(self.depth > 0, "pop with no backtrack point");
        self.ctx.backend_mut().backtrack()?;
        self.depth -= 1;
        log::debug!("pop (depth {})", self.depth);
        if self.goal_level.is_some_and(|l| l > self.depth) {
            self.goal_level = None;
        }
        if self.theory_level.is_some_and(|l| l > self.depth) {
            self.theory_level = None;
        }
        Ok(())
    }

    /// Push a backtrack point and assert `formula` in it.
    pub fn push_axiom(&mut self, formula: &Sexp) -> Result<(), SessionError> {
        self.create_backtrack_point()?;
        self.ctx.backend_mut().add_axiom(formula)?;
        Ok(())
    }

    /// Push a backtrack point and assert the negation of `formula` in it.
    pub fn push_conjecture(&mut self, formula: &Sexp) -> Result<(), SessionError> {
        self.create_backtrack_point()?;
        self.ctx.backend_mut().add_conjecture(formula)?;
        Ok(())
    }

    /// Push the background theory and then the goal `vc`, each in its own
    /// backtrack point. Both stay on the stack after the check.
    pub fn prepare_check(&mut self, name: &str, vc: &Sexp) -> Result<(), SessionError> {
        self.ctx.backend_mut().comment(&format!("prepare {name}"));
        let theory = self.ctx.axioms();
        self.push_axiom(&theory)?;
        self.push_conjecture(vc)
    }

    /// Check whatever is currently asserted and record the outcome and
    /// counterexamples.
    pub fn begin_prepared_check(&mut self, name: &str) -> Result<(), SessionError> {
        self.outcome = Outcome::Undetermined;
        self.models.clear();
        let start = Instant::now();
        let result = self.ctx.backend_mut().check();
        self.ctx.backend_mut().flush_log(name);
        let result = result?;
        log::debug!(
            "{name}: {} after {}ms ({} models)",
            result.outcome,
            start.elapsed().as_millis(),
            result.models.len()
        );
        self.outcome = result.outcome;
        self.models = result.models;
        Ok(())
    }

    /// Check `vc` against the background theory, reusing the theory from
    /// earlier checks.
    ///
    /// The first call asserts the theory at the current level; later calls
    /// pop the previous goal if it is still live. The goal gets a backtrack
    /// point of its own, so [`Prover::pop`] discards it.
    pub fn begin_check(&mut self, name: &str, vc: &Sexp) -> Result<(), SessionError> {
        if let Some(level) = self.goal_level {
            while self.depth >= level {
                self.pop()?;
            }
        }
        if self.theory_level.is_none() {
            log::debug!(
                "asserting background theory ({} axioms) at depth {}",
                self.ctx.num_axioms(),
                self.depth
            );
            let theory = self.ctx.axioms();
            self.ctx.backend_mut().add_axiom(&theory)?;
            self.theory_level = Some(self.depth);
        }
        self.ctx.backend_mut().comment(&format!("check {name}"));
        self.create_backtrack_point()?;
        // recorded before asserting, so the next check pops this frame even
        // if the goal never reaches the solver
        self.goal_level = Some(self.depth);
        self.ctx.backend_mut().add_conjecture(vc)?;
        self.begin_prepared_check(name)
    }

    /// Report the latest outcome. If it is [`Outcome::Invalid`], `handler`
    /// gets every counterexample in the order the backend returned them.
    ///
    /// Labels are decoded for all counterexamples before the handler sees
    /// any, so a label protocol violation reports nothing.
    pub fn check_outcome<H>(&self, handler: &mut H) -> Result<Outcome, SessionError>
    where
        H: ErrorHandler + ?Sized,
    {
        if self.outcome == Outcome::Invalid {
            let decoded = self
                .models
                .iter()
                .map(|m| labels::decode_all(&m.labels))
                .collect::<Result<Vec<_>, _>>()?;
            for (labels, m) in decoded.iter().zip(&self.models) {
                handler.on_model(labels, &m.model);
            }
        }
        Ok(self.outcome)
    }

    /// End the session and release the solver.
    pub fn close(self) {
        log::debug!("closing prover session at depth {}", self.depth);
    }
}

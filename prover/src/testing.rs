// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! A scripted in-memory backend for unit tests.
//!
//! It records every call, simulates the solver's assertion stack, and answers
//! checks from a queue of canned results.

use std::collections::VecDeque;

use smtlib::proc::SolverError;

use crate::backend::{Backend, CheckResult, ErrorModelAndLabels, Outcome, SessionFactory};
use crate::conf::SessionConf;
use crate::decl::Type;
use crate::error::SessionError;
use crate::model::ErrorModel;
use crate::prover::Prover;
use crate::Sexp;

/// A backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    DeclareType(String),
    DeclareConstant(String, Type),
    DeclareFunction(String, Vec<Type>, Type),
    Push,
    Pop,
    Axiom(Sexp),
    Conjecture(Sexp),
    Check,
    Comment(String),
    FlushLog(String),
}

/// Something asserted on the simulated stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assertion {
    Axiom(Sexp),
    Conjecture(Sexp),
}

#[derive(Debug)]
enum Answer {
    Result(CheckResult),
    Error(String),
}

#[derive(Debug)]
pub struct ScriptedBackend {
    events: Vec<Event>,
    // frames[0] is the base level, which can never be popped
    frames: Vec<Vec<Assertion>>,
    answers: VecDeque<Answer>,
    conjecture_error: Option<String>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            events: vec![],
            frames: vec![vec![]],
            answers: VecDeque::new(),
            conjecture_error: None,
        }
    }

    /// Queue the result of a future check. Checks with nothing queued are
    /// valid.
    pub fn answer(&mut self, result: CheckResult) -> &mut Self {
        self.answers.push_back(Answer::Result(result));
        self
    }

    /// Make a future check fail as if the solver died.
    pub fn fail_check(&mut self, msg: &str) -> &mut Self {
        self.answers.push_back(Answer::Error(msg.to_string()));
        self
    }

    /// Make the next conjecture fail to reach the solver. Nothing is
    /// asserted.
    pub fn fail_next_conjecture(&mut self, msg: &str) -> &mut Self {
        self.conjecture_error = Some(msg.to_string());
        self
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    /// Everything currently asserted, bottom frame first.
    pub fn visible(&self) -> Vec<Assertion> {
        self.frames.iter().flatten().cloned().collect()
    }

    /// Number of frames above the base level.
    pub fn stack_depth(&self) -> usize {
        self.frames.len() - 1
    }

    fn assert(&mut self, a: Assertion) {
        self.frames
            .last_mut()
            .expect("the base frame is never popped")
            .push(a);
    }
}

impl Backend for ScriptedBackend {
    fn declare_type(&mut self, name: &str) -> Result<(), SolverError> {
        self.events.push(Event::DeclareType(name.to_string()));
        Ok(())
    }

    fn declare_constant(&mut self, name: &str, ty: &Type) -> Result<(), SolverError> {
        self.events
            .push(Event::DeclareConstant(name.to_string(), ty.clone()));
        Ok(())
    }

    fn declare_function(
        &mut self,
        name: &str,
        domain: &[Type],
        range: &Type,
    ) -> Result<(), SolverError> {
        self.events.push(Event::DeclareFunction(
            name.to_string(),
            domain.to_vec(),
            range.clone(),
        ));
        Ok(())
    }

    fn create_backtrack_point(&mut self) -> Result<(), SolverError> {
        self.events.push(Event::Push);
        self.frames.push(vec![]);
        Ok(())
    }

    fn backtrack(&mut self) -> Result<(), SolverError> {
        self.events.push(Event::Pop);
        if self.frames.len() == 1 {
            return Err(SolverError::UnexpectedClose(
                "pop on an empty stack".to_string(),
            ));
        }
        self.frames.pop();
        Ok(())
    }

    fn add_axiom(&mut self, formula: &Sexp) -> Result<(), SolverError> {
        self.events.push(Event::Axiom(formula.clone()));
        self.assert(Assertion::Axiom(formula.clone()));
        Ok(())
    }

    fn add_conjecture(&mut self, formula: &Sexp) -> Result<(), SolverError> {
        self.events.push(Event::Conjecture(formula.clone()));
        if let Some(msg) = self.conjecture_error.take() {
            return Err(SolverError::UnexpectedClose(msg));
        }
        self.assert(Assertion::Conjecture(formula.clone()));
        Ok(())
    }

    fn check(&mut self) -> Result<CheckResult, SolverError> {
        self.events.push(Event::Check);
        match self.answers.pop_front() {
            Some(Answer::Result(r)) => Ok(r),
            Some(Answer::Error(msg)) => Err(SolverError::UnexpectedClose(msg)),
            None => Ok(CheckResult::new(Outcome::Valid)),
        }
    }

    fn comment(&mut self, text: &str) {
        self.events.push(Event::Comment(text.to_string()));
    }

    fn flush_log(&mut self, name: &str) {
        self.events.push(Event::FlushLog(name.to_string()));
    }
}

pub struct ScriptedFactory;

impl SessionFactory for ScriptedFactory {
    type Backend = ScriptedBackend;

    fn create_session(&self, conf: &SessionConf) -> Result<Prover<ScriptedBackend>, SessionError> {
        Ok(Prover::new(ScriptedBackend::new(), conf))
    }
}

/// A counterexample with the given raw labels.
pub fn labeled<const N: usize>(labels: [&str; N]) -> ErrorModelAndLabels {
    ErrorModelAndLabels {
        model: ErrorModel::new(),
        labels: labels.iter().map(|l| l.to_string()).collect(),
    }
}

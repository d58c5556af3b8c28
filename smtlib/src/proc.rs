// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Manage a running SMT process.
//!
//! This is a low-level generic API for SMT-LIB solvers; the solver-specific
//! parts are captured by the [`SolverCmd`] passed to launch the solver. The
//! process is owned by [`SmtProc`] and is shut down when it is dropped.

use crate::conf::SolverCmd;
use crate::sexp;
use crate::tee::Tee;
use std::{
    ffi::{OsStr, OsString},
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
    process::{Child, ChildStdin, ChildStdout, Command, Stdio},
};
use thiserror::Error;

use super::sexp::{app, atom_i, atom_s, Atom, Sexp};

/// SmtProc wraps an instance of a solver process.
#[derive(Debug)]
pub struct SmtProc {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    tee: Option<Tee>,
}

/// SatResp is a solver's response to a `(check-sat)` command.
///
/// For unknown it also returns the reason the solver provides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SatResp {
    /// The query is satisfiable.
    Sat,
    /// The query is unsatisfiable (and thus negated assertions are valid).
    Unsat,
    /// Unknown whether the query is sat or unsat. The reason is the one given
    /// by (get-info :reason-unknown).
    ///
    /// This can happen due to a timeout or limitations of quantifier instantiation
    /// heuristics, for example.
    Unknown(String),
}

#[derive(Error, Debug)]
/// An error from trying to call the solver
pub enum SolverError {
    /// I/O went wrong
    #[error("some I/O went wrong: {0}")]
    Io(#[from] io::Error),
    /// Solver returned an `(error ...)` response or exited
    #[error("solver returned an error:\n{0}")]
    UnexpectedClose(String),
    /// Solver replied with something that doesn't fit the command
    #[error("unexpected solver response to {cmd}: {resp}")]
    UnexpectedResponse {
        /// the command that was sent
        cmd: String,
        /// what came back
        resp: String,
    },
}

type Result<T> = std::result::Result<T, SolverError>;

impl Drop for SmtProc {
    fn drop(&mut self) {
        self.kill();
    }
}

impl SmtProc {
    /// A marker for determining end of solver response.
    const DONE: &'static str = "<<DONE>>";

    /// Create a new SMT process by running a solver and sending it the
    /// startup options from `cmd`.
    ///
    /// The optional `tee` argument is a directory where the SMT sent to the
    /// solver can be saved (see [`SmtProc::save_tee`]).
    pub fn new(cmd: SolverCmd, tee: Option<&Path>) -> Result<Self> {
        let mut child = Command::new(OsStr::new(&cmd.cmd))
            .args(cmd.args.iter().map(OsString::from))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;
        let tee = tee.map(|dir| {
            let mut f = Tee::new(dir);
            f.append(Sexp::Comment(cmd.cmdline()));
            f
        });
        let stdin = child.stdin.take().expect("child stdin is piped");
        let stdout = BufReader::new(child.stdout.take().expect("child stdout is piped"));
        let mut proc = Self {
            child,
            stdin,
            stdout,
            tee,
        };
        log::debug!("started solver: {}", cmd.cmdline());
        for (option, val) in &cmd.options {
            proc.send(&app(
                "set-option",
                [atom_s(format!(":{option}")), atom_s(val)],
            ))?;
        }
        // options are silent on success, so anything here is a complaint
        let startup = proc.get_response(|s| s.to_string())?;
        if !startup.is_empty() {
            log::warn!("solver complained about startup options: {startup}");
        }
        Ok(proc)
    }

    fn write_stdin(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.stdin, "{line}")?;
        self.stdin.flush()?;
        Ok(())
    }

    /// Low-level API to send the solver a command as an s-expression. This
    /// should only be used for commands that do not require a response.
    pub fn send(&mut self, data: &Sexp) -> Result<()> {
        writeln!(self.stdin, "{data}")?;
        if let Some(f) = &mut self.tee {
            f.append(data.clone());
        }
        Ok(())
    }

    /// Low-level API to send the solver a command that expects a response,
    /// which is parsed as a single s-expression.
    pub fn send_with_reply(&mut self, data: &Sexp) -> Result<Sexp> {
        self.send(data)?;
        let resp = self.get_response(|s| s.to_string())?;
        match sexp::parse(&resp) {
            Ok(s) if s.app().is_some_and(|(head, _)| head == "error") => {
                Err(SolverError::UnexpectedClose(Self::parse_error(&resp)))
            }
            Ok(s) => Ok(s),
            Err(_) => Err(SolverError::UnexpectedResponse {
                cmd: data.to_string(),
                resp,
            }),
        }
    }

    /// Low-level mechanism to get a response. Note that this needs to be issued
    /// after each query that returns a response, since it sends a marker and
    /// waits for the solver to reach that marker.
    fn get_response<F, T>(&mut self, cb: F) -> Result<T>
    where
        F: FnOnce(&str) -> T,
    {
        self.write_stdin(&format!(r#"(echo "{}")"#, Self::DONE))?;
        // buf accumulates the entire response, which is read line-by-line
        // looking for the DONE marker.
        let mut buf = String::new();
        loop {
            let last_end = buf.len();
            // n is the number of bytes read (that is, the length of this line
            // including the newline)
            let n = self.stdout.read_line(&mut buf)?;
            if n == 0 {
                let msg = Self::parse_error(&buf);
                return Err(SolverError::UnexpectedClose(msg));
            }
            // last line, without the newline
            let last_line = buf[last_end..last_end + n].trim_end();
            // Z3 doesn't put quotes and CVC does (quotes do follow SMT-LIB)
            if last_line == Self::DONE || last_line == format!("\"{}\"", Self::DONE) {
                let response = buf[..last_end].trim_end();
                return Ok(cb(response));
            }
        }
    }

    fn kill(&mut self) {
        _ = writeln!(self.stdin, "(exit)");
        _ = self.stdin.flush();
        _ = self.child.kill();
        _ = self.child.wait();
    }

    /// Extract the message of an `(error "...")` reply, falling back to the
    /// whole response if there is none.
    fn parse_error(resp: &str) -> String {
        // Z3 returns check-sat errors as:
        // (error "error msg")
        // sat
        //
        // Thus we parse the result as a sequence of sexps and look for the
        // error sexp.
        let Ok(sexps) = sexp::parse_many(resp) else {
            return resp.to_string();
        };
        sexps
            .iter()
            .find_map(|s| {
                s.app().and_then(|(head, args)| {
                    if head == "error" && args.len() == 1 {
                        args[0].atom_s().map(|s| s.to_string())
                    } else {
                        None
                    }
                })
            })
            .unwrap_or_else(|| resp.to_string())
    }

    fn parse_sat(&mut self, resp: &str) -> Result<SatResp> {
        match resp {
            "unsat" => Ok(SatResp::Unsat),
            "sat" => Ok(SatResp::Sat),
            "unknown" => {
                let reason = self.get_info(":reason-unknown")?;
                Ok(SatResp::Unknown(reason.to_string()))
            }
            _ => Err(SolverError::UnexpectedClose(Self::parse_error(resp))),
        }
    }

    /// Send the solver `(check-sat)`. For unknown gets a reason, but does not
    /// call `(get-model)` for sat.
    pub fn check_sat(&mut self) -> Result<SatResp> {
        self.send(&app("check-sat", []))?;
        let resp = self.get_response(|s| s.to_string())?;
        self.parse_sat(&resp)
    }

    /// Get some attribute using the SMT get-info command.
    pub fn get_info(&mut self, attribute: &str) -> Result<Sexp> {
        let cmd = app("get-info", [atom_s(attribute)]);
        let resp = self.send_with_reply(&cmd)?;
        match resp.list() {
            Some([key, val]) if key == &atom_s(attribute) => Ok(val.clone()),
            _ => Err(SolverError::UnexpectedResponse {
                cmd: cmd.to_string(),
                resp: resp.to_string(),
            }),
        }
    }

    /// Get a model (following a sat reply) as an s-expression.
    pub fn get_model(&mut self) -> Result<Sexp> {
        self.send_with_reply(&app("get-model", []))
    }

    /// Get the labels the solver considers relevant to its last sat reply,
    /// using the Z3 `(labels)` command. Label names are returned as sent.
    pub fn get_labels(&mut self) -> Result<Vec<String>> {
        let cmd = app("labels", []);
        let resp = self.send_with_reply(&cmd)?;
        let unexpected = || SolverError::UnexpectedResponse {
            cmd: cmd.to_string(),
            resp: resp.to_string(),
        };
        match resp.app() {
            Some(("labels", args)) => args
                .iter()
                .map(|l| match l {
                    Sexp::Atom(Atom::S(s)) => Ok(s.clone()),
                    Sexp::Atom(Atom::I(i)) => Ok(i.to_string()),
                    _ => Err(unexpected()),
                })
                .collect(),
            _ => Err(unexpected()),
        }
    }

    /// Call the SMT push command to create a new assertion stack frame.
    pub fn push(&mut self) -> Result<()> {
        self.send(&app("push", [atom_i(1)]))
    }

    /// Call the SMT pop command to discard the latest assertion stack frame.
    pub fn pop(&mut self) -> Result<()> {
        self.send(&app("pop", [atom_i(1)]))
    }

    // =============
    // Tee support
    // =============

    /// Save the current tee file, if there is one, under a name derived from
    /// `name`. Returns the path of the created file (or None if there is no
    /// tee'd output setup).
    ///
    /// Failing to save is reported but not fatal.
    pub fn save_tee(&self, name: &str) -> Option<PathBuf> {
        self.tee.as_ref().and_then(|tee| match tee.save(name) {
            Ok(path) => Some(path),
            Err(err) => {
                log::warn!("failed to save tee: {err}");
                None
            }
        })
    }

    /// Add a comment to the tee'd file.
    ///
    /// The comment is passed as a closure, which is not evaluated if there is
    /// no tee'd smt2 file.
    pub fn comment_with<F>(&mut self, comment: F)
    where
        F: FnOnce() -> String,
    {
        if let Some(f) = &mut self.tee {
            let comment = comment();
            f.append(Sexp::Comment("".to_string()));
            f.append(Sexp::Comment(comment));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        conf::Z3Conf,
        path::solver_path,
        proc::{SatResp, SmtProc, SolverError},
        sexp::{app, atom_s, parse},
    };
    use eyre::Context;

    /// Start Z3 or return None (and say so) if it isn't installed.
    fn z3() -> Option<SmtProc> {
        let conf = Z3Conf::new(&solver_path("z3")).done();
        match SmtProc::new(conf, None) {
            Ok(proc) => Some(proc),
            Err(err) => {
                eprintln!("could not start z3 ({err}), skipping test");
                None
            }
        }
    }

    #[test]
    fn test_check_sat_z3() {
        let Some(mut solver) = z3() else { return };
        let response = solver.check_sat().wrap_err("could not check-sat").unwrap();
        assert!(
            matches!(response, SatResp::Sat),
            "should be sat, got {response:?}"
        );
    }

    #[test]
    fn test_unsat_z3() {
        let Some(mut solver) = z3() else { return };
        solver
            .send(&app("declare-const", [atom_s("a"), atom_s("Bool")]))
            .unwrap();
        solver
            .send(&parse("(assert (and a (not a)))").unwrap())
            .unwrap();
        let response = solver.check_sat().wrap_err("could not check-sat").unwrap();
        insta::assert_debug_snapshot!(response, @"Unsat");
    }

    #[test]
    fn test_push_pop_z3() {
        let Some(mut solver) = z3() else { return };
        solver
            .send(&parse("(declare-const x Int)").unwrap())
            .unwrap();
        solver.send(&parse("(assert (> x 0))").unwrap()).unwrap();
        solver.push().unwrap();
        solver.send(&parse("(assert (< x 0))").unwrap()).unwrap();
        assert_eq!(solver.check_sat().unwrap(), SatResp::Unsat);
        solver.pop().unwrap();
        assert_eq!(solver.check_sat().unwrap(), SatResp::Sat);
        let model = solver.get_model().unwrap();
        assert!(
            model.to_string().contains("define-fun x"),
            "model should define x: {model}"
        );
    }

    #[test]
    fn test_labels_z3() {
        let Some(mut solver) = z3() else { return };
        solver
            .send(&parse("(declare-const x Int)").unwrap())
            .unwrap();
        solver
            .send(&parse("(assert (> x 0))").unwrap())
            .unwrap();
        assert_eq!(solver.check_sat().unwrap(), SatResp::Sat);
        // no labels were used
        assert_eq!(solver.get_labels().unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_z3_ill_formed() {
        let Some(mut proc) = z3() else { return };
        // unbound symbol
        let e = parse("(assert p)").unwrap();
        proc.send(&e).unwrap();
        let r = proc.check_sat();
        assert!(
            matches!(r, Err(SolverError::UnexpectedClose(_))),
            "expected an error, got {r:?}"
        );
    }

    #[test]
    fn test_spawn_many() {
        let Some(_) = z3() else { return };
        let z3 = Z3Conf::new(&solver_path("z3")).done();
        for _ in 0..100 {
            let _ = SmtProc::new(z3.clone(), None).unwrap();
        }
    }

    #[test]
    fn test_missing_binary() {
        let conf = Z3Conf::new("/nonexistent/solver/binary").done();
        let r = SmtProc::new(conf, None);
        assert!(matches!(r, Err(SolverError::Io(_))));
    }

    #[test]
    fn test_parse_error() {
        assert_eq!(
            SmtProc::parse_error("(error \"line 1: unknown constant p\")\nsat"),
            "line 1: unknown constant p"
        );
        assert_eq!(SmtProc::parse_error("garbage ("), "garbage (");
    }
}

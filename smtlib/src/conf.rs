// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Construct launch and option configurations for Z3.

/// The full invocation of a solver binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverCmd {
    /// Binary to launch
    pub cmd: String,
    /// Arguments to pass
    pub args: Vec<String>,
    /// SMT options to send on startup, in order
    pub options: Vec<(String, String)>,
}

impl SolverCmd {
    fn args<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
    }

    /// Set an option. Setting the same option again replaces its value but
    /// keeps its original position.
    pub fn option<S: AsRef<str>>(&mut self, name: &str, val: S) {
        let val = val.as_ref().to_string();
        match self.options.iter_mut().find(|(n, _)| n == name) {
            Some((_, old)) => *old = val,
            None => self.options.push((name.to_string(), val)),
        }
    }

    /// Remove an option if it was set.
    pub fn remove_option(&mut self, name: &str) {
        self.options.retain(|(n, _)| n != name);
    }

    /// Look up the value of an option.
    pub fn get_option(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Build the command line string, for printing purposes.
    pub fn cmdline(&self) -> String {
        let args: Vec<_> = self
            .args
            .iter()
            .map(|a| {
                if a.contains(' ') {
                    format!("\"{a}\"")
                } else {
                    a.clone()
                }
            })
            .collect();
        format!("{} {}", &self.cmd, args.join(" "))
    }
}

/// Builder for creating a Z3 [`SolverCmd`].
///
/// Starts out with models enabled and declarations global (so they survive
/// `(pop)`); everything else is left at Z3's defaults until set.
#[derive(Debug, Clone)]
pub struct Z3Conf(SolverCmd);

impl Z3Conf {
    /// Create a Z3Conf with the base options. Uses `cmd` as the path to Z3.
    pub fn new(cmd: &str) -> Self {
        let mut cmd = SolverCmd {
            cmd: cmd.to_string(),
            args: vec![],
            options: vec![],
        };
        cmd.args(["-in", "-smt2"]);
        cmd.option("global-declarations", "true");
        cmd.option("produce-models", "true");
        Self(cmd)
    }

    /// Control whether `(get-model)` returns models at all.
    pub fn model_generation(&mut self, enable: bool) -> &mut Self {
        self.0.option("produce-models", bool_opt(enable));
        self
    }

    /// Control whether models are completed with default values for symbols
    /// the solver did not need to interpret.
    pub fn model_completion(&mut self, enable: bool) -> &mut Self {
        self.0.option("model.completion", bool_opt(enable));
        self
    }

    /// Control sort checking of every asserted term.
    pub fn type_check(&mut self, enable: bool) -> &mut Self {
        self.0.option("well_sorted_check", bool_opt(enable));
        self
    }

    /// Set the soft timeout per check. None removes the timeout.
    pub fn soft_timeout_ms(&mut self, ms: Option<u64>) -> &mut Self {
        match ms {
            Some(ms) => self.0.option("timeout", format!("{ms}")),
            None => self.0.remove_option("timeout"),
        }
        self
    }

    /// Get access to the raw options of the solver.
    pub fn options(&mut self) -> &mut SolverCmd {
        &mut self.0
    }

    /// Get the final command to run the solver.
    pub fn done(self) -> SolverCmd {
        self.0
    }
}

fn bool_opt(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::Z3Conf;

    #[test]
    fn test_z3_options() {
        let mut conf = Z3Conf::new("z3");
        conf.model_completion(false)
            .type_check(true)
            .soft_timeout_ms(Some(2500));
        let cmd = conf.done();
        assert_eq!(cmd.cmdline(), "z3 -in -smt2");
        assert_eq!(cmd.get_option("model.completion"), Some("false"));
        assert_eq!(cmd.get_option("well_sorted_check"), Some("true"));
        assert_eq!(cmd.get_option("timeout"), Some("2500"));
        assert_eq!(cmd.get_option("global-declarations"), Some("true"));
    }

    #[test]
    fn test_option_overrides_in_place() {
        let mut conf = Z3Conf::new("z3");
        conf.soft_timeout_ms(Some(10)).model_generation(false);
        conf.model_generation(true).soft_timeout_ms(None);
        let cmd = conf.done();
        let names: Vec<&str> = cmd.options.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["global-declarations", "produce-models"]);
        assert_eq!(cmd.get_option("produce-models"), Some("true"));
    }

    #[test]
    fn test_cmdline_quotes_spaces() {
        let mut conf = Z3Conf::new("/opt/my solvers/z3");
        conf.options().args.push("-v:1 x".to_string());
        insta::assert_snapshot!(conf.done().cmdline(), @r#"/opt/my solvers/z3 -in -smt2 "-v:1 x""#);
    }
}

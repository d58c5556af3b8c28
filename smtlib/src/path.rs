// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Utilities for finding solver binaries.

use std::{env, path::Path};

fn workspace_root() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("could not get parent directory of smtlib package")
}

fn exe_name(bin: &str) -> String {
    if env::consts::OS == "windows" && !bin.ends_with(".exe") {
        format!("{bin}.exe")
    } else {
        bin.to_owned()
    }
}

/// Get the right invocation of the solver with binary name `bin`.
///
/// The solver environment variable (eg, `Z3_BIN`) takes priority. Next is a
/// copy of the binary in the workspace's `solvers/` directory. Otherwise `bin`
/// is returned as-is and resolved through `$PATH` when launched.
pub fn solver_path(bin: &str) -> String {
    let var = bin.to_uppercase() + "_BIN";
    if let Some(val) = env::var_os(var) {
        return val.to_string_lossy().into();
    }
    let bin = exe_name(bin);
    let local = workspace_root().join("solvers").join(&bin);
    if local.exists() {
        return local.to_string_lossy().into();
    }
    bin
}

#[cfg(test)]
mod tests {
    use super::solver_path;

    #[test]
    fn test_fallback_to_bare_name() {
        assert_eq!(
            solver_path("definitely-not-a-solver"),
            super::exe_name("definitely-not-a-solver")
        );
    }
}

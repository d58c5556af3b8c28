// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration of a prover session.

use serde::{Deserialize, Serialize};

/// Solver limits and model options for one session.
///
/// Negative numbers are accepted and mean the same as leaving the field out,
/// so configurations written for tools that use `-1` for "off" still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConf {
    /// Soft timeout per check, in milliseconds.
    pub timeout: Option<i64>,
    /// Bound on the counterexample models returned by one check.
    pub counterexample_limit: Option<i64>,
    /// Models are needed to report labels, so this is always forced on.
    pub model_generation: bool,
    /// Always forced off: uninterpreted values stay partial.
    pub model_completion: bool,
    /// Always forced on.
    pub type_check: bool,
}

impl Default for SessionConf {
    fn default() -> Self {
        Self {
            timeout: None,
            counterexample_limit: None,
            model_generation: true,
            model_completion: false,
            type_check: true,
        }
    }
}

impl SessionConf {
    /// Load a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Set the soft timeout; None disables it.
    pub fn with_timeout_ms(mut self, ms: Option<u64>) -> Self {
        self.timeout = ms.map(|ms| ms.try_into().unwrap_or(i64::MAX));
        self
    }

    /// Set the counterexample bound; None removes it.
    pub fn with_counterexample_limit(mut self, limit: Option<usize>) -> Self {
        self.counterexample_limit = limit.map(|n| n.try_into().unwrap_or(i64::MAX));
        self
    }

    /// The soft timeout, if enabled.
    pub fn timeout_ms(&self) -> Option<u64> {
        self.timeout.and_then(|t| u64::try_from(t).ok())
    }

    /// The counterexample bound, if there is one.
    pub fn counterexample_limit(&self) -> Option<usize> {
        self.counterexample_limit
            .and_then(|n| usize::try_from(n).ok())
    }

    /// The configuration a session actually runs with: the model and type
    /// checking flags are fixed for this kind of session, whatever was asked.
    pub fn effective(&self) -> Self {
        if !self.model_generation {
            log::warn!("model generation is required to report labels; enabling it");
        }
        if self.model_completion {
            log::warn!("model completion is not supported; disabling it");
        }
        if !self.type_check {
            log::warn!("type checking cannot be disabled; enabling it");
        }
        Self {
            model_generation: true,
            model_completion: false,
            type_check: true,
            ..self.clone()
        }
    }
}

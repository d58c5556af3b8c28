// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Decoding of the labels a solver reports with a counterexample.
//!
//! Every label starts with exactly one sentinel character giving its class,
//! followed by the identifier the caller attached to a sub-formula:
//!
//! | sentinel | class |
//! |---|---|
//! | `+` | positively relevant justification |
//! | `\|` | disjunctive choice |
//! | `@` | variable or goal tracking |
//!
//! Anything else means the label protocol changed under us, so decoding
//! fails rather than producing a misleading diagnostic.

use thiserror::Error;

/// A label that does not start with a known sentinel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown prefix in label {label:?}")]
pub struct LabelError {
    label: String,
}

impl LabelError {
    /// Create an error for `label`.
    pub fn new<S: AsRef<str>>(label: S) -> Self {
        Self {
            label: label.as_ref().to_string(),
        }
    }

    /// The offending label.
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// The class of a label, given by its sentinel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LabelKind {
    /// `+`
    Positive,
    /// `|`
    Choice,
    /// `@`
    Tracking,
}

impl LabelKind {
    /// The sentinel character for this class.
    pub fn sentinel(self) -> char {
        match self {
            LabelKind::Positive => '+',
            LabelKind::Choice => '|',
            LabelKind::Tracking => '@',
        }
    }

    /// Classify a raw label by its first character.
    pub fn of(label: &str) -> Result<Self, LabelError> {
        match label.chars().next() {
            Some('+') => Ok(LabelKind::Positive),
            Some('|') => Ok(LabelKind::Choice),
            Some('@') => Ok(LabelKind::Tracking),
            _ => Err(LabelError::new(label)),
        }
    }

    /// Attach this class's sentinel to an identifier, giving the raw label
    /// a solver will report.
    pub fn encode(self, id: &str) -> String {
        format!("{}{id}", self.sentinel())
    }
}

/// Strip the sentinel from a raw label.
pub fn decode(label: &str) -> Result<&str, LabelError> {
    let kind = LabelKind::of(label)?;
    // all sentinels are one byte
    Ok(&label[kind.sentinel().len_utf8()..])
}

/// Decode a whole label set, in order. A single bad label fails the set.
pub fn decode_all<S: AsRef<str>>(labels: &[S]) -> Result<Vec<String>, LabelError> {
    labels
        .iter()
        .map(|l| decode(l.as_ref()).map(|s| s.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{decode, decode_all, LabelError, LabelKind};

    #[test]
    fn test_decode_sentinels() {
        assert_eq!(decode("+x"), Ok("x"));
        assert_eq!(decode("|y"), Ok("y"));
        assert_eq!(decode("@z"), Ok("z"));
        // only the first character is stripped
        assert_eq!(decode("++x"), Ok("+x"));
        assert_eq!(decode("@"), Ok(""));
    }

    #[test]
    fn test_decode_rejects_unknown() {
        assert_eq!(decode("x"), Err(LabelError::new("x")));
        assert_eq!(decode(""), Err(LabelError::new("")));
        assert_eq!(decode("%lbl%+1"), Err(LabelError::new("%lbl%+1")));
        assert_eq!(decode("é"), Err(LabelError::new("é")));
    }

    #[test]
    fn test_decode_all() {
        assert_eq!(
            decode_all(&["+A", "@B", "|C"]),
            Ok(vec!["A".to_string(), "B".to_string(), "C".to_string()])
        );
        let err = decode_all(&["+A", "B", "@C"]).unwrap_err();
        assert_eq!(err.label(), "B");
        assert_eq!(decode_all::<&str>(&[]), Ok(vec![]));
    }

    #[test]
    fn test_kind_roundtrip() {
        for kind in [LabelKind::Positive, LabelKind::Choice, LabelKind::Tracking] {
            let raw = kind.encode("assert_12");
            assert_eq!(LabelKind::of(&raw), Ok(kind));
            assert_eq!(decode(&raw), Ok("assert_12"));
        }
    }
}

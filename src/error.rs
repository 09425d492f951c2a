//! Error types for the analysis pipeline.

use thiserror::Error;

use crate::fetch::FetchError;

/// Errors that terminate an analysis and produce an error report.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("failed to parse as JSON or YAML: {0}")]
    Parse(String),
    #[error("{0}")]
    Structural(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl AnalysisError {
    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Parse(_) => "parse_error",
            AnalysisError::Structural(_) => "structural_error",
            AnalysisError::Fetch(_) => "fetch_error",
        }
    }
}

/// A single rule could not inspect part of the document.
///
/// Never escapes the rule engine: it is downgraded to one advisory finding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not analyze {subject}: {reason}")]
pub struct RuleError {
    pub subject: String,
    pub reason: String,
}

impl RuleError {
    pub fn new(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            reason: reason.into(),
        }
    }
}

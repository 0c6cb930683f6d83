//! Core types for check results.

use serde::{Deserialize, Serialize};

use crate::matchers::Tally;

/// Failure taxonomy. None of these abort a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A required file does not exist or cannot be read.
    MissingResource,
    /// Some but not all required identifiers, fields or tokens were found.
    PartialMatch,
    /// A forbidden pattern is present or a required convention is unused.
    ConventionViolation,
    /// A paired-count invariant does not hold.
    Imbalance,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::MissingResource => "missing_resource",
            IssueKind::PartialMatch => "partial_match",
            IssueKind::ConventionViolation => "convention_violation",
            IssueKind::Imbalance => "imbalance",
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One human-readable failure detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Name of the check that produced this issue
    pub check: String,
    pub kind: IssueKind,
    pub message: String,
    /// Weight of this issue in the run's issue count (occurrences for
    /// forbidden patterns, otherwise 1)
    pub count: usize,
}

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub kind: String,
    pub passed: bool,
    pub message: String,
    /// Left out of the run's pass rate, issue list and exit status
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub informational: bool,
    /// Measured value of a count check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tally: Option<Tally>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<Issue>,
}

impl CheckResult {
    pub fn pass(name: &str, kind: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            passed: true,
            message: message.into(),
            informational: false,
            value: None,
            tally: None,
            issues: Vec::new(),
        }
    }

    pub fn fail(name: &str, kind: &str, message: impl Into<String>) -> Self {
        Self {
            passed: false,
            ..Self::pass(name, kind, message)
        }
    }

    pub fn with_tally(mut self, tally: Tally) -> Self {
        self.tally = Some(tally);
        self
    }

    /// Mark the result as reported only.
    pub fn informational(mut self, informational: bool) -> Self {
        self.informational = informational;
        self
    }

    pub fn with_value(mut self, value: usize) -> Self {
        self.value = Some(value);
        self
    }

    /// Attach an issue with a weight of one.
    pub fn issue(self, kind: IssueKind, message: impl Into<String>) -> Self {
        self.issue_weighted(kind, message, 1)
    }

    pub fn issue_weighted(mut self, kind: IssueKind, message: impl Into<String>, count: usize) -> Self {
        self.issues.push(Issue {
            check: self.name.clone(),
            kind,
            message: message.into(),
            count,
        });
        self
    }

    /// Summed issue weight.
    pub fn issue_count(&self) -> usize {
        self.issues.iter().map(|i| i.count).sum()
    }

    /// Status tag used in console and document output.
    pub fn tag(&self) -> &'static str {
        if self.informational {
            "[INFO]"
        } else if self.passed {
            "[PASS]"
        } else {
            "[FAIL]"
        }
    }
}

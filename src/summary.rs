//! Run aggregation.
//!
//! Turns the ordered check results of one run into a `RunReport` with
//! totals, pass rate and a recommendation band.

use serde::{Deserialize, Serialize};

use crate::corpus::CorpusStats;
use crate::verify::{CheckResult, Issue};

/// Recommendation cut points, in percent.
pub mod bands {
    pub const COMPLIANT: f64 = 100.0;
    pub const MINOR_GAPS: f64 = 80.0;
}

/// Qualitative verdict banded by pass rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Every check passed.
    Compliant,
    /// Pass rate of at least 80%.
    MinorGaps,
    /// Pass rate below 80%.
    SignificantGaps,
}

impl Recommendation {
    pub fn from_pass_rate(pass_rate: f64) -> Self {
        if pass_rate >= bands::COMPLIANT {
            Recommendation::Compliant
        } else if pass_rate >= bands::MINOR_GAPS {
            Recommendation::MinorGaps
        } else {
            Recommendation::SignificantGaps
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Recommendation::Compliant => "[OK]",
            Recommendation::MinorGaps => "[WARN]",
            Recommendation::SignificantGaps => "[ERROR]",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Recommendation::Compliant => "All checks passed; the project is fully compliant.",
            Recommendation::MinorGaps => {
                "Most checks passed; review and fix the failed checks."
            }
            Recommendation::SignificantGaps => {
                "Several checks failed; the implementation needs a full review."
            }
        }
    }
}

/// Summary statistics for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Gating checks only; informational checks are counted separately
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// 100 * passed / total, 0 when there are no checks
    pub pass_rate: f64,
    /// Summed issue weight across all checks
    pub issue_count: usize,
    pub files_inspected: usize,
    pub files_missing: usize,
    /// Checks reported without affecting the verdict
    #[serde(default)]
    pub informational: usize,
}

/// Everything one run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub contract: String,
    pub results: Vec<CheckResult>,
    /// Issues of gating checks, flattened in check order
    pub issues: Vec<Issue>,
    pub stats: RunStats,
    pub recommendation: Recommendation,
    /// The run stopped at a check boundary before evaluating every check
    #[serde(default)]
    pub cancelled: bool,
}

impl RunReport {
    /// Aggregate ordered check results. Informational results are kept in
    /// `results` but do not count towards totals, issues or the verdict.
    pub fn aggregate(
        contract: &str,
        results: Vec<CheckResult>,
        corpus: CorpusStats,
        cancelled: bool,
    ) -> Self {
        let gating: Vec<&CheckResult> = results.iter().filter(|r| !r.informational).collect();
        let total = gating.len();
        let passed = gating.iter().filter(|r| r.passed).count();
        let pass_rate = pass_rate(passed, total);
        let issues: Vec<Issue> = gating
            .iter()
            .flat_map(|r| r.issues.iter().cloned())
            .collect();
        let issue_count = issues.iter().map(|i| i.count).sum();

        Self {
            contract: contract.to_string(),
            stats: RunStats {
                total,
                passed,
                failed: total - passed,
                pass_rate,
                issue_count,
                files_inspected: corpus.files_inspected,
                files_missing: corpus.files_missing,
                informational: results.len() - total,
            },
            recommendation: Recommendation::from_pass_rate(pass_rate),
            results,
            issues,
            cancelled,
        }
    }

    /// Whether the process should exit successfully.
    pub fn all_passed(&self) -> bool {
        self.stats.failed == 0 && !self.cancelled
    }

    pub fn result(&self, name: &str) -> Option<&CheckResult> {
        self.results.iter().find(|r| r.name == name)
    }

    /// Measured values of count checks, in check order.
    pub fn measurements(&self) -> impl Iterator<Item = (&str, usize)> {
        self.results
            .iter()
            .filter_map(|r| r.value.map(|v| (r.name.as_str(), v)))
    }
}

/// Percentage of passing checks; 0 when there are none.
pub fn pass_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 * passed as f64 / total as f64
}

//! Verifier that runs every check of a contract.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::contract::{CheckSpec, Contract};
use crate::corpus::Corpus;
use crate::matchers::MatchMode;
use crate::summary::RunReport;

use super::{evaluate, CheckResult};

/// Executes contract checks against a project root.
pub struct Verifier {
    root: PathBuf,
    parallel: bool,
    cancel: Option<Arc<AtomicBool>>,
}

impl Verifier {
    /// Create a new verifier for a project root.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            parallel: false,
            cancel: None,
        }
    }

    /// Evaluate checks on the rayon thread pool. Result order is unchanged.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Stop before the next check once the flag is set.
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run every check in the contract.
    pub fn run(&self, contract: &Contract) -> RunReport {
        self.run_checks(&contract.name, &contract.checks, contract.identifier_matching)
    }

    /// Run an ordered list of checks. Always returns a report, even when
    /// nothing passes.
    pub fn run_checks(&self, name: &str, checks: &[CheckSpec], mode: MatchMode) -> RunReport {
        let corpus = Corpus::new(&self.root);
        let _span = tracing::info_span!("verify", contract = name, root = %self.root.display())
            .entered();

        let evaluated: Vec<Option<CheckResult>> = if self.parallel {
            checks
                .par_iter()
                .map(|spec| self.evaluate_unless_cancelled(spec, &corpus, mode))
                .collect()
        } else {
            let mut out = Vec::with_capacity(checks.len());
            for spec in checks {
                match self.evaluate_unless_cancelled(spec, &corpus, mode) {
                    Some(r) => out.push(Some(r)),
                    None => break,
                }
            }
            out
        };

        let cancelled = evaluated.len() < checks.len() || evaluated.iter().any(Option::is_none);
        let results: Vec<CheckResult> = evaluated.into_iter().flatten().collect();

        let report = RunReport::aggregate(name, results, corpus.stats(), cancelled);
        tracing::info!(
            total = report.stats.total,
            passed = report.stats.passed,
            failed = report.stats.failed,
            pass_rate = report.stats.pass_rate,
            cancelled,
            "verification finished"
        );
        report
    }

    fn evaluate_unless_cancelled(
        &self,
        spec: &CheckSpec,
        corpus: &Corpus,
        mode: MatchMode,
    ) -> Option<CheckResult> {
        if self.is_cancelled() {
            tracing::debug!(check = %spec.name, "skipped after cancellation");
            return None;
        }

        let _span =
            tracing::debug_span!("check", name = %spec.name, kind = spec.matcher.kind()).entered();
        let result = evaluate(spec, corpus, mode);
        tracing::debug!(
            passed = result.passed,
            issues = result.issues.len(),
            message = %result.message,
            "check evaluated"
        );
        Some(result)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|f| f.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}

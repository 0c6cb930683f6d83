//! Verification of contract checks.

mod evaluate;
mod runner;
mod types;

pub use evaluate::evaluate;
pub use runner::Verifier;
pub use types::{CheckResult, Issue, IssueKind};

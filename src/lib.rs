//! contractlint - contract verification engine.
//!
//! contractlint inspects a body of source text (headers, implementation
//! files, tests, build files) and decides, without compiling or running
//! anything, whether it satisfies a declared set of contracts: interface
//! methods declared and implemented, data-structure fields present, paired
//! calls balanced, instrumentation calls used, forbidden patterns absent.
//!
//! # Architecture
//!
//! - `corpus`: cached file text for one run
//! - `matchers`: pure substring/regex predicates and counters
//! - `contract`: YAML check table schema and validation
//! - `verify`: the `Verifier` that evaluates each check into a `CheckResult`
//! - `summary`: aggregation into a `RunReport` with pass rate and recommendation
//! - `report`: output formatting (pretty, Markdown, JSON)
//!
//! Matching is literal. An identifier that is a substring of a
//! longer identifier matches it; select `identifier_matching: word` in the
//! contract for word-boundary matching.

pub mod cli;
pub mod contract;
pub mod corpus;
pub mod error;
pub mod matchers;
pub mod report;
pub mod summary;
pub mod verify;

pub use contract::{CheckSpec, Contract, Matcher};
pub use corpus::Corpus;
pub use error::Error;
pub use matchers::MatchMode;
pub use summary::{Recommendation, RunReport};
pub use verify::{CheckResult, Issue, IssueKind, Verifier};

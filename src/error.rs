//! Fatal error types.
//!
//! Check failures are never errors: they become failed `CheckResult`s. The
//! variants here are the conditions that stop a run outright.

use std::path::PathBuf;

/// Errors that abort a verification run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("parsing contract {path}: {source}")]
    ContractParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid contract: {0}")]
    ContractInvalid(String),

    #[error("writing report {path}: {source}")]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

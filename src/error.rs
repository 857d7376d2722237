// File: ./src/error.rs
//! Error taxonomy for a migration run.
//!
//! Every variant here is fatal: nothing is retried, and a failure halts the
//! run with whatever was already written to the store left in place.
//! "List not found" and duplicate identities are ordinary control flow and
//! never show up as errors.

use http::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// The export payload could not be turned into records.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("task segment is not valid JSON: {0}")]
    Tasks(#[source] serde_json::Error),

    #[error("reminder segment is not valid JSON (after delimiter repair): {0}")]
    Reminders(#[source] serde_json::Error),

    #[error("unexpected data after the task segment at byte {offset}")]
    TrailingData { offset: usize },
}

/// Network, auth or write failure talking to the calendar store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid server URL '{url}': {detail}")]
    InvalidUrl { url: String, detail: String },

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("discovery failed: {0}")]
    Discovery(String),

    #[error("{op} failed: {detail}")]
    Request { op: &'static str, detail: String },

    #[error("{op} on '{path}' returned {status}")]
    Status {
        op: &'static str,
        path: String,
        status: StatusCode,
    },

    #[error("task '{uid}' is not present in the store")]
    MissingTask { uid: String },
}

impl StoreError {
    pub(crate) fn request(op: &'static str, err: impl std::fmt::Debug) -> Self {
        Self::Request {
            op,
            detail: format!("{:?}", err),
        }
    }
}

/// Required startup input is missing or unusable.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("credentials file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{}': {detail}", path.display())]
    Parse { path: PathBuf, detail: String },

    #[error("credentials file '{}' has an empty '{field}'", path.display())]
    MissingField { path: PathBuf, field: &'static str },

    #[error("no credentials path given and no home directory to derive a default from")]
    NoDefaultPath,
}

/// Top-level error of a run; each class converts with `?`.
#[derive(Error, Debug)]
pub enum MigrateError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_converts_into_migrate_error() {
        fn fails() -> Result<(), MigrateError> {
            Err(StoreError::MissingTask {
                uid: "abc".to_string(),
            })?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert!(matches!(err, MigrateError::Store(_)));
        assert_eq!(err.to_string(), "task 'abc' is not present in the store");
    }

    #[test]
    fn status_error_names_the_operation() {
        let err = StoreError::Status {
            op: "PUT",
            path: "/cal/work/1.ics".to_string(),
            status: StatusCode::FORBIDDEN,
        };
        assert_eq!(
            err.to_string(),
            "PUT on '/cal/work/1.ics' returned 403 Forbidden"
        );
    }
}

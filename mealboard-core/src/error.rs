use std::path::PathBuf;

use thiserror::Error;

/// Failures of the persisted documents behind a store.
///
/// `Corrupt` is sticky: the document is left untouched on disk and every
/// subsequent operation against that store keeps failing until the file (or
/// row) is repaired by hand.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{document} document is corrupt: {message}")]
    Corrupt { document: String, message: String },
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to encode {document} document: {source}")]
    Encode {
        document: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0} lock poisoned")]
    Poisoned(&'static str),
}

/// Outcome of a failed planner operation.
///
/// Validation and not-found errors are raised before any state is touched.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PlanError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn recipe_not_found(id: &str) -> Self {
        Self::NotFound(format!("recipe {id}"))
    }
}

pub type PlanResult<T> = Result<T, PlanError>;

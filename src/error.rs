use std::{io, path::PathBuf};

use thiserror::Error;

/// Why an upload was refused. The stored dataset is never touched when this is returned.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("the data source is empty or contains only headers")]
    EmptyBatch,
    #[error(
        "could not identify a revenue column, or both price and quantity columns; \
         check the export for clear headers like 'revenue' or 'price'"
    )]
    NoRevenueSignal,
    #[error("mapping suggestion failed: {0}")]
    Suggestion(#[from] SuggestError),
}

#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("suggestion reply could not be parsed as JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("suggestion reply is not a JSON object")]
    NotAnObject,
    #[error("no mapping suggestion available: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("stored dataset {path:?} is not valid JSON: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("'{0}' cannot be used as a store key")]
    InvalidKey(String),
    #[error("store rejected the write: {0}")]
    WriteRejected(String),
}

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("no data has been uploaded for '{0}'")]
    UnknownDomain(String),
}

use std::path::PathBuf;

use thiserror::Error;

/// The progress backend could not be read or written.
///
/// A missing progress document is not an error: `load` returns an empty
/// store instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("progress file {path} unavailable: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("progress document is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "remote")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("object store returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("{0}")]
    Other(String),
}

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a validation path
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Missing: {}", .path.display())]
    MissingFile { path: PathBuf },

    #[error("Failed to read {}: {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write config file {}: {message}", .path.display())]
    ConfigWrite { path: PathBuf, message: String },

    #[error("Unknown extraction mode '{0}' (expected 'strict' or 'lenient')")]
    InvalidMode(String),

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TraceError>;

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building an index
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("{role} thread count must be at least 1")]
    InvalidThreadCount { role: &'static str },

    #[error("Input list {path} could not be opened: {source}")]
    InputListOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed input list: {0}")]
    MalformedInputList(String),

    #[error("Output directory {path} could not be created: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write bucket {path}: {source}")]
    BucketWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to spawn worker {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker {0} panicked")]
    WorkerPanicked(String),

    #[error("Run aborted before the {0} was reached by every worker")]
    Aborted(&'static str),
}

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, IndexError>;

impl IndexError {
    /// Whether this error was a consequence of another worker failing
    pub fn is_secondary(&self) -> bool {
        matches!(self, IndexError::Aborted(_))
    }
}

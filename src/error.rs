use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors raised while building, persisting or loading a LOF index
#[derive(Debug, Error)]
pub enum IndexError {
    /// Input path does not resolve to a readable file
    #[error("Input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// Input stream could not be opened or read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Index artifact could not be created or written
    #[error("Failed to write index to {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single data line that cannot be turned into a record.
    ///
    /// Local to one line; the builder skips it and continues.
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    /// A build report (JSON summary or gene table) could not be encoded
    #[error("Failed to write report {}: {message}", path.display())]
    Report { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Index encoding error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("Invalid index file: {0}")]
    InvalidIndex(String),
}

impl IndexError {
    /// Whether the error aborts a build (everything except per-line problems)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, IndexError::MalformedRecord { .. })
    }
}

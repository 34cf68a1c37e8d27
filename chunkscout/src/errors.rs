//! This module defines the error types for chunkscout. Every variant is fatal for the
//! run that produced it: the pipeline never reports a partial count.
//!
//! # Rust vs .NET Error Handling
//!
//! .NET would surface a failed worker as an `AggregateException` thrown from `Task.WaitAll`:
//! ```csharp
//! try {
//!     Task.WaitAll(workers);
//! } catch (AggregateException ex) {
//!     // Inspect ex.InnerExceptions
//! }
//! ```
//!
//! Rust workers send a `Result` back over their channel and the coordinator
//! propagates the first error with `?`:
//! ```rust,ignore
//! match scan(&config) {
//!     Ok(output) => // Print report,
//!     Err(SearchError::FileNotFound(path)) => // Handle missing file,
//!     Err(SearchError::WorkerTimeout { index, .. }) => // Handle stuck worker,
//!     Err(e) => // Handle other errors
//! }
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Result type for scan operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur while indexing, dispatching, or scanning
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Failed to access {path}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Invalid UTF-8 in file {path}: {source}")]
    EncodingError {
        path: PathBuf,
        source: std::str::Utf8Error,
    },
    #[error("Worker {index} failed: {reason}")]
    WorkerFailed { index: usize, reason: String },
    #[error("Worker {index} did not report within {timeout:?}")]
    WorkerTimeout { index: usize, timeout: Duration },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl SearchError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_pattern(msg: impl Into<String>) -> Self {
        Self::InvalidPattern(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn worker_failed(index: usize, reason: impl Into<String>) -> Self {
        Self::WorkerFailed {
            index,
            reason: reason.into(),
        }
    }

    pub fn encoding_error(path: impl Into<PathBuf>, source: std::str::Utf8Error) -> Self {
        Self::EncodingError {
            path: path.into(),
            source,
        }
    }

    /// Classifies an error raised while opening or reading `path`
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::file_not_found(path),
            io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::FileAccess {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// True for every flavour of "the input file could not be read"
    pub fn is_file_access(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_) | Self::PermissionDenied(_) | Self::FileAccess { .. }
        )
    }
}

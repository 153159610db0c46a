use std::path::PathBuf;

use thiserror::Error;

/// Result type for file store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while appending to log files.
#[derive(Debug, Error)]
pub enum Error {
    /// IO operation failed.
    #[error("{0}: {1}")]
    Io(&'static str, #[source] std::io::Error),

    /// A directory exists where a file was expected.
    #[error("path is a directory: {}", .0.display())]
    IsDirectory(PathBuf),

    /// The file is held exclusively by another appender.
    #[error("file is locked: {}", .0.display())]
    Locked(PathBuf),
}

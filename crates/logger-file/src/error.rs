//! Error types for file-based logging

/// Result type for file logger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during file logging
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The provider was started twice
    #[error("file logger already started")]
    AlreadyStarted,

    /// Shutdown gave up waiting for the queue to drain
    #[error("completion timed out with {abandoned} queued entries abandoned")]
    CompletionTimeout {
        /// Entries still queued when the processor was stopped
        abandoned: usize,
    },

    /// Invalid date format in a path template or options
    #[error("invalid date format {format:?}")]
    InvalidDateFormat {
        /// The rejected format
        format: String,
    },

    /// Invalid counter format
    #[error("invalid counter format {format:?}: expected a run of '0' characters")]
    InvalidCounterFormat {
        /// The rejected format
        format: String,
    },

    /// Unknown level name
    #[error("invalid log level {0:?}")]
    InvalidLevel(String),

    /// Malformed path template
    #[error("invalid path template {template:?}: {reason}")]
    InvalidTemplate {
        /// The rejected template
        template: String,
        /// What is wrong with it
        reason: &'static str,
    },

    /// A level map without the default entry
    #[error("level map for {path:?} has no \"Default\" entry")]
    MissingDefaultLevel {
        /// Path template of the offending destination
        path: String,
    },

    /// Storage failure
    #[error(transparent)]
    Store(#[from] proven_file_store::Error),

    /// Unknown text encoding label
    #[error("unknown encoding {0:?}")]
    UnknownEncoding(String),

    /// Placeholder other than `<date>` or `<counter>`
    #[error("unknown placeholder <{placeholder}> in path template {template:?}")]
    UnknownPlaceholder {
        /// The rejected template
        template: String,
        /// Name of the placeholder
        placeholder: String,
    },
}

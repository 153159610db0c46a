//! Asynchronous rotating-file logging back end
//!
//! Producers hand records to a [`FileLoggerProvider`], which stamps them,
//! queues them and returns immediately. A single background task routes each
//! record to the destinations whose level map accepts it and appends the
//! rendered text to files named by path templates such as
//! `logs/<date:yyyy>/app-<date>-<counter>.log`, rotating by date and size.
//!
//! ```no_run
//! use proven_logger_file::{FileLoggerContext, FileLoggerOptions, FileLoggerProvider, LogFileOptions, LogLevel, LoggerExt};
//!
//! # async fn run() -> proven_logger_file::Result<()> {
//! let options = FileLoggerOptions::new()
//!     .with_base_path("logs")
//!     .with_max_file_size(10 * 1024 * 1024)
//!     .with_file(
//!         LogFileOptions::new("app-<date>-<counter>.log")
//!             .with_min_level("Default", LogLevel::Information),
//!     );
//!
//! let provider = FileLoggerProvider::new(FileLoggerContext::new(), options)?;
//! provider.start()?;
//!
//! let logger = provider.create_logger("App.Startup");
//! logger.info("ready");
//!
//! provider.dispose().await
//! # }
//! ```

#![warn(missing_docs, unreachable_pub)]
#![forbid(unsafe_code)]

mod clock;
pub mod compat;
mod config;
mod context;
mod destination;
mod encoding;
mod error;
mod filter;
mod level;
mod logger;
mod processor;
mod provider;
mod queue;
mod record;
mod scope;
pub mod template;
pub mod text;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{FileLoggerOptions, LogFileOptions, OverflowPolicy};
pub use context::{DEFAULT_COMPLETION_TIMEOUT, FileLoggerContext};
pub use encoding::FileEncoding;
pub use error::{Error, Result};
pub use filter::{CategoryFilter, DEFAULT_CATEGORY};
pub use level::LogLevel;
pub use logger::{FileLogger, Logger, LoggerExt};
pub use processor::ProcessorState;
pub use provider::{Completion, FileLoggerProvider};
pub use record::{EventId, LogEntry, LogRecord, SharedError};
pub use scope::{ScopeGuard, begin_scope, current_scopes, in_scope};
pub use text::{DefaultTextBuilder, TextBuilder};

pub use proven_file_store::{FileAccessMode, FileStore, LogFile};

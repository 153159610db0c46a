//! Category-bound logger handles

use crate::scope::{self, ScopeGuard};
use crate::{EventId, FileLoggerProvider, LogLevel, LogRecord};
use std::borrow::Cow;
use std::fmt::Display;

/// Core logger trait
pub trait Logger: Send + Sync {
    /// Category records from this logger are filed under
    fn category(&self) -> &str;

    /// Check if a level is enabled for this logger's category
    fn is_enabled(&self, level: LogLevel) -> bool;

    /// Log a record
    fn log(&self, record: LogRecord);
}

/// Extension trait for convenient logging methods
pub trait LoggerExt: Logger {
    /// Log a message with an event id
    fn log_event(&self, level: LogLevel, event_id: impl Into<EventId>, message: impl Into<String>) {
        if self.is_enabled(level) {
            self.log(
                LogRecord::new(self.category().to_string(), level, message).with_event_id(event_id),
            );
        }
    }

    /// Log a trace message
    fn trace(&self, message: impl Into<String>) {
        self.log_event(LogLevel::Trace, EventId::default(), message);
    }

    /// Log a debug message
    fn debug(&self, message: impl Into<String>) {
        self.log_event(LogLevel::Debug, EventId::default(), message);
    }

    /// Log an informational message
    fn info(&self, message: impl Into<String>) {
        self.log_event(LogLevel::Information, EventId::default(), message);
    }

    /// Log a warning
    fn warn(&self, message: impl Into<String>) {
        self.log_event(LogLevel::Warning, EventId::default(), message);
    }

    /// Log an error
    fn error(&self, message: impl Into<String>) {
        self.log_event(LogLevel::Error, EventId::default(), message);
    }

    /// Log a critical failure
    fn critical(&self, message: impl Into<String>) {
        self.log_event(LogLevel::Critical, EventId::default(), message);
    }
}

// Implement for all loggers
impl<T: Logger + ?Sized> LoggerExt for T {}

/// A cheap handle that files records under one category.
#[derive(Debug, Clone)]
pub struct FileLogger {
    category: Cow<'static, str>,
    provider: FileLoggerProvider,
}

impl FileLogger {
    pub(crate) fn new(category: impl Into<Cow<'static, str>>, provider: FileLoggerProvider) -> Self {
        Self {
            category: category.into(),
            provider,
        }
    }

    /// Start a record in this logger's category.
    pub fn record(&self, level: LogLevel, message: impl Into<String>) -> LogRecord {
        LogRecord::new(self.category.clone(), level, message)
    }

    /// Log a record from async code, suspending rather than blocking while
    /// a bounded queue under the block policy is full.
    pub async fn log_async(&self, record: LogRecord) {
        self.provider.enqueue_async(record).await;
    }

    /// Push a scope onto the calling thread's scope stack.
    pub fn begin_scope(&self, value: impl Display) -> ScopeGuard {
        scope::begin_scope(value)
    }
}

impl Logger for FileLogger {
    fn category(&self) -> &str {
        &self.category
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        self.provider.is_enabled(&self.category, level)
    }

    fn log(&self, record: LogRecord) {
        self.provider.enqueue(record);
    }
}

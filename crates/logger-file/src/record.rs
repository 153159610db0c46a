//! Log record types

use crate::LogLevel;
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Error attached to a record, shared between every destination it goes to.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Numeric event identifier with an optional name
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EventId {
    /// Event number
    pub id: i32,
    /// Event name
    pub name: Option<Cow<'static, str>>,
}

impl EventId {
    /// Create a named event id
    pub fn new(id: i32, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }
}

impl From<i32> for EventId {
    fn from(id: i32) -> Self {
        Self { id, name: None }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// A record as handed over by the logging front end
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Dotted category name
    pub category: Cow<'static, str>,
    /// Log level
    pub level: LogLevel,
    /// Event identifier
    pub event_id: EventId,
    /// The log message
    pub message: String,
    /// Attached error
    pub error: Option<SharedError>,
}

impl LogRecord {
    /// Create a new record
    pub fn new(
        category: impl Into<Cow<'static, str>>,
        level: LogLevel,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            level,
            event_id: EventId::default(),
            message: message.into(),
            error: None,
        }
    }

    /// Builder-style method for setting the event id
    #[must_use]
    pub fn with_event_id(mut self, event_id: impl Into<EventId>) -> Self {
        self.event_id = event_id.into();
        self
    }

    /// Builder-style method for attaching an error
    #[must_use]
    pub fn with_error(mut self, error: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.error = Some(Arc::new(error));
        self
    }

    /// Builder-style method for attaching an already shared error
    #[must_use]
    pub fn with_shared_error(mut self, error: SharedError) -> Self {
        self.error = Some(error);
        self
    }
}

/// A record frozen at enqueue time, together with its timestamp and the
/// scopes that were active on the producing context.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// The record
    pub record: LogRecord,
    /// When the record was enqueued
    pub timestamp: DateTime<Utc>,
    /// Active scopes, outermost first
    pub scopes: Vec<Arc<str>>,
}

impl LogEntry {
    /// Create an entry
    pub fn new(record: LogRecord, timestamp: DateTime<Utc>, scopes: Vec<Arc<str>>) -> Self {
        Self {
            record,
            timestamp,
            scopes,
        }
    }
}

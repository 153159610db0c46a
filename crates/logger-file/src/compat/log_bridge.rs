//! Bridge from the `log` crate to a file logger provider

use super::category_for_target;
use crate::{FileLoggerProvider, LogLevel, LogRecord};
use log::kv::Key;
use log::{Log, Metadata, Record};

/// Implements [`log::Log`] by enqueueing into a provider.
///
/// The target becomes the category. An integer `event_id` key-value, if
/// present, becomes the event id.
#[derive(Debug, Clone)]
pub struct LogBridge {
    provider: FileLoggerProvider,
}

impl LogBridge {
    /// Create a new log bridge
    pub fn new(provider: FileLoggerProvider) -> Self {
        Self { provider }
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.provider
            .is_enabled(&category_for_target(metadata.target()), map_level(metadata.level()))
    }

    fn log(&self, record: &Record<'_>) {
        let category = category_for_target(record.target());
        let level = map_level(record.level());
        if !self.provider.is_enabled(&category, level) {
            return;
        }

        let mut entry = LogRecord::new(category, level, record.args().to_string());
        if let Some(id) = record
            .key_values()
            .get(Key::from("event_id"))
            .and_then(|value| value.to_i64())
            .and_then(|id| i32::try_from(id).ok())
        {
            entry = entry.with_event_id(id);
        }

        self.provider.enqueue(entry);
    }

    fn flush(&self) {}
}

/// Map log levels to our levels
fn map_level(level: log::Level) -> LogLevel {
    match level {
        log::Level::Error => LogLevel::Error,
        log::Level::Warn => LogLevel::Warning,
        log::Level::Info => LogLevel::Information,
        log::Level::Debug => LogLevel::Debug,
        log::Level::Trace => LogLevel::Trace,
    }
}

/// Route every `log` macro call in the process to `provider`.
///
/// # Errors
///
/// Fails if a global logger is already installed.
pub fn init_log_bridge(provider: FileLoggerProvider) -> Result<(), log::SetLoggerError> {
    // log::set_logger requires 'static
    let bridge = Box::leak(Box::new(LogBridge::new(provider)));
    log::set_logger(bridge)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

//! Bridge from tracing to a file logger provider

use super::category_for_target;
use crate::scope::current_scopes;
use crate::{FileLoggerProvider, LogLevel, LogRecord};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::{Layer, layer::Context, registry::LookupSpan};

// Diagnostics of the logging pipeline itself are never fed back into it.
const IGNORED_TARGETS: [&str; 2] = ["proven_logger_file", "proven_file_store"];

/// A tracing layer that forwards events to a provider.
///
/// The event target becomes the category (`::` mapped to `.`) and the names
/// of the enclosing spans, outermost first, become scopes.
#[derive(Debug, Clone)]
pub struct TracingBridge {
    provider: FileLoggerProvider,
}

impl TracingBridge {
    /// Create a new tracing bridge
    pub fn new(provider: FileLoggerProvider) -> Self {
        Self { provider }
    }
}

impl<S> Layer<S> for TracingBridge
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if IGNORED_TARGETS
            .iter()
            .any(|ignored| metadata.target().starts_with(ignored))
        {
            return;
        }

        let level = match *metadata.level() {
            tracing::Level::ERROR => LogLevel::Error,
            tracing::Level::WARN => LogLevel::Warning,
            tracing::Level::INFO => LogLevel::Information,
            tracing::Level::DEBUG => LogLevel::Debug,
            tracing::Level::TRACE => LogLevel::Trace,
        };

        let category = category_for_target(metadata.target());
        if !self.provider.is_enabled(&category, level) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let mut scopes = current_scopes();
        if let Some(spans) = ctx.event_scope(event) {
            scopes.extend(spans.from_root().map(|span| Arc::from(span.name())));
        }

        self.provider
            .enqueue_with_scopes(LogRecord::new(category, level, visitor.finish()), scopes);
    }
}

/// Collects the `message` field followed by the other fields as `key=value`.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }

    fn push_field(&mut self, field: &Field, value: impl std::fmt::Display) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", field.name(), value);
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field, value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push_field(field, format_args!("{value:?}"));
        }
    }
}

/// Install a global subscriber that forwards every tracing event to
/// `provider`.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing_bridge(
    provider: FileLoggerProvider,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_subscriber::prelude::*;

    tracing_subscriber::registry()
        .with(TracingBridge::new(provider))
        .try_init()
}

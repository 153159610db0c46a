//! Rendering of entries into text lines

use crate::LogEntry;
use chrono::{Local, SecondsFormat};
use std::error::Error as StdError;
use std::fmt::Debug;

/// Turns an entry into the lines written to a file.
///
/// Lines carry no terminator; the processor appends the platform newline to
/// each of them.
pub trait TextBuilder: Debug + Send + Sync + 'static {
    /// Render `entry`. The scope breadcrumb is only expected when
    /// `include_scopes` is set.
    fn build(&self, entry: &LogEntry, include_scopes: bool) -> Vec<String>;
}

/// The default layout:
///
/// ```text
/// info: App.Web[0] @ 2017-01-01T01:00:00.000000+01:00
///       => request => handler
///       message
/// error display
/// Caused by: source display
/// ```
///
/// The timestamp is converted to local time when the entry is rendered.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTextBuilder;

impl TextBuilder for DefaultTextBuilder {
    fn build(&self, entry: &LogEntry, include_scopes: bool) -> Vec<String> {
        let prefix = format!("{}: ", entry.record.level.short_name());
        let header = format!(
            "{prefix}{}[{}] @ {}",
            entry.record.category,
            entry.record.event_id,
            local_timestamp(entry),
        );
        let indent = " ".repeat(prefix.len());

        let mut lines = vec![header];
        lines.extend(body_lines(entry, include_scopes, &indent));
        lines.extend(error_lines(entry));
        lines
    }
}

/// The entry timestamp in local time, RFC 3339 with microseconds.
pub fn local_timestamp(entry: &LogEntry) -> String {
    entry
        .timestamp
        .with_timezone(&Local)
        .to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// The scope breadcrumb (when requested and non-empty) followed by the
/// message lines, each prefixed with `indent`.
pub fn body_lines(entry: &LogEntry, include_scopes: bool, indent: &str) -> Vec<String> {
    let mut lines = Vec::new();
    if include_scopes && !entry.scopes.is_empty() {
        let breadcrumb: Vec<String> = entry.scopes.iter().map(|scope| format!("=> {scope}")).collect();
        lines.push(format!("{indent}{}", breadcrumb.join(" ")));
    }
    lines.extend(entry.record.message.lines().map(|line| format!("{indent}{line}")));
    lines
}

/// The attached error and its sources, unindented.
pub fn error_lines(entry: &LogEntry) -> Vec<String> {
    let Some(error) = entry.record.error.as_deref() else {
        return Vec::new();
    };

    let mut lines: Vec<String> = error.to_string().lines().map(str::to_string).collect();
    let mut source: Option<&(dyn StdError + 'static)> = error.source();
    while let Some(cause) = source {
        lines.push(format!("Caused by: {cause}"));
        source = cause.source();
    }
    lines
}

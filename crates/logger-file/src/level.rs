//! Log levels

use crate::Error;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Severity of a record, ordered from most to least verbose.
///
/// `None` is never emitted; as a minimum level it suppresses a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum LogLevel {
    /// Most detailed messages
    Trace,
    /// Debugging information
    Debug,
    /// General flow of the application
    Information,
    /// Abnormal or unexpected events
    Warning,
    /// Failures of the current operation
    Error,
    /// Unrecoverable failures
    Critical,
    /// Filter sentinel: nothing is written
    None,
}

impl LogLevel {
    /// All levels that records can carry, in ascending order.
    pub const EMITTABLE: [Self; 6] = [
        Self::Trace,
        Self::Debug,
        Self::Information,
        Self::Warning,
        Self::Error,
        Self::Critical,
    ];

    /// Full name, as accepted by [`FromStr`].
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "Trace",
            Self::Debug => "Debug",
            Self::Information => "Information",
            Self::Warning => "Warning",
            Self::Error => "Error",
            Self::Critical => "Critical",
            Self::None => "None",
        }
    }

    /// Four-letter tag used in rendered entries.
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Trace => "trce",
            Self::Debug => "dbug",
            Self::Information => "info",
            Self::Warning => "warn",
            Self::Error => "fail",
            Self::Critical => "crit",
            Self::None => "none",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" | "trce" => Ok(Self::Trace),
            "debug" | "dbug" => Ok(Self::Debug),
            "information" | "info" => Ok(Self::Information),
            "warning" | "warn" => Ok(Self::Warning),
            "error" | "fail" => Ok(Self::Error),
            "critical" | "crit" => Ok(Self::Critical),
            "none" | "off" => Ok(Self::None),
            _ => Err(Error::InvalidLevel(s.to_string())),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Error> {
        value.parse()
    }
}

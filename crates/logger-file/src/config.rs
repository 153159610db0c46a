//! Configuration for file logging

use crate::text::TextBuilder;
use crate::{FileEncoding, LogLevel};
use proven_file_store::{FileAccessMode, FileStore};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// What to do with a record when the queue is at capacity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Discard the incoming record
    #[default]
    DropNewest,
    /// Discard the oldest queued record to make room
    DropOldest,
    /// Wait for room, then discard the incoming record if none appeared
    Block {
        /// How long the producer may wait, in milliseconds
        timeout_ms: u64,
    },
}

impl OverflowPolicy {
    /// Block producers for at most `timeout`.
    pub fn block(timeout: Duration) -> Self {
        Self::Block {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Options for the whole provider
///
/// Every field has a default, so a partial document binds cleanly:
///
/// ```toml
/// base_path = "logs"
/// max_file_size = 1048576
///
/// [[files]]
/// path = "app-<date>-<counter>.log"
/// min_level = { Default = "Information", "App.Db" = "Warning" }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileLoggerOptions {
    /// Directory every destination path is resolved against
    pub base_path: PathBuf,
    /// Date format for `<date>` placeholders without an explicit format
    pub date_format: String,
    /// Counter format for `<counter>` placeholders
    pub counter_format: String,
    /// Queue capacity, `0` for unbounded
    pub max_queue_size: usize,
    /// Behaviour when the queue is full
    pub overflow_policy: OverflowPolicy,
    /// Size at which a file is rotated, `0` for never
    pub max_file_size: u64,
    /// Text encoding of the written files
    pub file_encoding: FileEncoding,
    /// Whether the scope breadcrumb is rendered
    pub include_scopes: bool,
    /// How files are held between writes
    pub access_mode: FileAccessMode,
    /// Destinations, in order
    pub files: Vec<LogFileOptions>,
    /// Custom entry renderer; the default layout is used when unset
    #[serde(skip)]
    pub text_builder: Option<Arc<dyn TextBuilder>>,
    /// Storage for the files; the local file system when unset
    #[serde(skip)]
    pub file_store: Option<Arc<dyn FileStore>>,
}

impl Default for FileLoggerOptions {
    fn default() -> Self {
        Self {
            base_path: PathBuf::new(),
            date_format: "yyyyMMdd".to_string(),
            counter_format: "0".to_string(),
            max_queue_size: 0,
            overflow_policy: OverflowPolicy::default(),
            max_file_size: 0,
            file_encoding: FileEncoding::default(),
            include_scopes: false,
            access_mode: FileAccessMode::default(),
            files: Vec::new(),
            text_builder: None,
            file_store: None,
        }
    }
}

impl FileLoggerOptions {
    /// Create options with defaults and no destinations
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style method for setting the base directory
    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Builder-style method for setting the default date format
    #[must_use]
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Builder-style method for setting the counter format
    #[must_use]
    pub fn with_counter_format(mut self, format: impl Into<String>) -> Self {
        self.counter_format = format.into();
        self
    }

    /// Builder-style method for bounding the queue
    #[must_use]
    pub fn with_max_queue_size(mut self, size: usize, policy: OverflowPolicy) -> Self {
        self.max_queue_size = size;
        self.overflow_policy = policy;
        self
    }

    /// Builder-style method for setting the default rotation size
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Builder-style method for setting the default encoding
    #[must_use]
    pub fn with_file_encoding(mut self, encoding: FileEncoding) -> Self {
        self.file_encoding = encoding;
        self
    }

    /// Builder-style method for rendering scopes
    #[must_use]
    pub fn with_include_scopes(mut self, include: bool) -> Self {
        self.include_scopes = include;
        self
    }

    /// Builder-style method for setting the default access mode
    #[must_use]
    pub fn with_access_mode(mut self, mode: FileAccessMode) -> Self {
        self.access_mode = mode;
        self
    }

    /// Builder-style method for adding a destination
    #[must_use]
    pub fn with_file(mut self, file: LogFileOptions) -> Self {
        self.files.push(file);
        self
    }

    /// Builder-style method for replacing the entry renderer
    #[must_use]
    pub fn with_text_builder(mut self, builder: impl TextBuilder) -> Self {
        self.text_builder = Some(Arc::new(builder));
        self
    }

    /// Builder-style method for replacing the storage
    #[must_use]
    pub fn with_file_store(mut self, store: impl FileStore) -> Self {
        self.file_store = Some(Arc::new(store));
        self
    }
}

/// Options for a single destination; unset fields fall back to the
/// provider-wide values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogFileOptions {
    /// Path template, e.g. `app-<date>-<counter>.log`
    pub path: String,
    /// Minimum level per category prefix, with a `Default` entry
    pub min_level: BTreeMap<String, LogLevel>,
    /// Date format override
    pub date_format: Option<String>,
    /// Counter format override
    pub counter_format: Option<String>,
    /// Rotation size override, `0` for never
    pub max_file_size: Option<u64>,
    /// Encoding override
    pub file_encoding: Option<FileEncoding>,
    /// Access mode override
    pub access_mode: Option<FileAccessMode>,
}

impl LogFileOptions {
    /// Create a destination writing to `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Builder-style method for adding a level map entry
    #[must_use]
    pub fn with_min_level(mut self, category: impl Into<String>, level: LogLevel) -> Self {
        self.min_level.insert(category.into(), level);
        self
    }

    /// Builder-style method for overriding the date format
    #[must_use]
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    /// Builder-style method for overriding the counter format
    #[must_use]
    pub fn with_counter_format(mut self, format: impl Into<String>) -> Self {
        self.counter_format = Some(format.into());
        self
    }

    /// Builder-style method for overriding the rotation size
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = Some(size);
        self
    }

    /// Builder-style method for overriding the encoding
    #[must_use]
    pub fn with_file_encoding(mut self, encoding: FileEncoding) -> Self {
        self.file_encoding = Some(encoding);
        self
    }

    /// Builder-style method for overriding the access mode
    #[must_use]
    pub fn with_access_mode(mut self, mode: FileAccessMode) -> Self {
        self.access_mode = Some(mode);
        self
    }
}

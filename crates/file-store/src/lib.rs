//! Abstract interface for appending to log files.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::{Error, Result};

use std::fmt::Debug;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

/// How a log file is held between writes.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileAccessMode {
    /// The file stays open and locked for the writer's exclusive use.
    #[default]
    Exclusive,

    /// The file is opened, appended and closed on every write, so other
    /// readers and writers may touch it in between.
    Shared,
}

/// A trait representing a store of append-only log files.
///
/// # Required Methods
/// - `async fn len(&self, path: &Path) -> Result<Option<u64>>`: Size of an existing file, `None` if missing.
/// - `async fn open(&self, path: &Path, mode: FileAccessMode) -> Result<Box<dyn LogFile>>`: Create or open a file for appending.
#[async_trait]
pub trait FileStore: Debug + Send + Sync + 'static {
    /// Returns the length of the file at `path`, or `None` if it does not exist.
    async fn len(&self, path: &Path) -> Result<Option<u64>>;

    /// Creates (including missing parent directories) or opens the file at
    /// `path` for appending.
    async fn open(&self, path: &Path, mode: FileAccessMode) -> Result<Box<dyn LogFile>>;

    /// Checks whether a file exists at `path`.
    async fn exists(&self, path: &Path) -> Result<bool> {
        Ok(self.len(path).await?.is_some())
    }
}

/// An open, append-only log file.
#[async_trait]
pub trait LogFile: Debug + Send + Sync + 'static {
    /// Path of the file within its store.
    fn path(&self) -> &Path;

    /// Current length of the file in bytes.
    fn len(&self) -> u64;

    /// Checks whether nothing has been written to the file yet.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends already-encoded bytes to the end of the file.
    async fn append(&mut self, bytes: &[u8]) -> Result<()>;

    /// Flushes buffered bytes to the underlying storage.
    async fn flush(&mut self) -> Result<()>;

    /// Flushes and releases the file.
    async fn close(self: Box<Self>) -> Result<()>;
}

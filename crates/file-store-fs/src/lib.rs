//! Implementation of log file storage using files on disk.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use proven_file_store::{Error, FileAccessMode, FileStore, LogFile, Result};
use tokio::fs;
use tokio::io::{self, AsyncWriteExt};
use tracing::debug;

/// Log file store backed by a directory on disk.
#[derive(Clone, Debug)]
pub struct FsFileStore {
    dir: PathBuf,
}

impl FsFileStore {
    /// Creates a new `FsFileStore` rooted at the specified directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory all paths are resolved against.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn get_file_path(&self, path: &Path) -> PathBuf {
        self.dir.join(path)
    }
}

#[async_trait]
impl FileStore for FsFileStore {
    async fn len(&self, path: &Path) -> Result<Option<u64>> {
        match fs::metadata(self.get_file_path(path)).await {
            Ok(metadata) if metadata.is_dir() => Err(Error::IsDirectory(path.to_path_buf())),
            Ok(metadata) => Ok(Some(metadata.len())),
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io("error reading file metadata", e)),
        }
    }

    async fn open(&self, path: &Path, mode: FileAccessMode) -> Result<Box<dyn LogFile>> {
        let full_path = self.get_file_path(path);
        if let Some(parent) = full_path.parent() {
            if !parent.as_os_str().is_empty() && !fs::try_exists(parent).await.unwrap_or(false) {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::Io("error creating directory", e))?;
            }
        }

        let file = open_for_append(&full_path).await?;

        match mode {
            FileAccessMode::Exclusive => {
                let file = file.into_std().await;
                if let Err(e) = fs3::FileExt::try_lock_exclusive(&file) {
                    return Err(
                        if e.raw_os_error() == fs3::lock_contended_error().raw_os_error() {
                            Error::Locked(path.to_path_buf())
                        } else {
                            Error::Io("error locking file", e)
                        },
                    );
                }
                let len = file
                    .metadata()
                    .map_err(|e| Error::Io("error reading file metadata", e))?
                    .len();

                debug!("opened {} for exclusive append", full_path.display());

                Ok(Box::new(ExclusiveFile {
                    path: path.to_path_buf(),
                    file: fs::File::from_std(file),
                    len,
                }))
            }
            FileAccessMode::Shared => {
                let len = file
                    .metadata()
                    .await
                    .map_err(|e| Error::Io("error reading file metadata", e))?
                    .len();

                Ok(Box::new(SharedFile {
                    path: path.to_path_buf(),
                    full_path,
                    len,
                }))
            }
        }
    }
}

async fn open_for_append(full_path: &Path) -> Result<fs::File> {
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(full_path)
        .await
        .map_err(|e| {
            if full_path.is_dir() {
                Error::IsDirectory(full_path.to_path_buf())
            } else {
                Error::Io("error opening file", e)
            }
        })
}

/// A file held open and locked until it is closed.
#[derive(Debug)]
struct ExclusiveFile {
    path: PathBuf,
    file: fs::File,
    len: u64,
}

#[async_trait]
impl LogFile for ExclusiveFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn len(&self) -> u64 {
        self.len
    }

    async fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.file
            .write_all(bytes)
            .await
            .map_err(|e| Error::Io("error writing file", e))?;
        self.file
            .flush()
            .await
            .map_err(|e| Error::Io("error flushing file", e))?;
        self.len += bytes.len() as u64;
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.file
            .flush()
            .await
            .map_err(|e| Error::Io("error flushing file", e))
    }

    async fn close(mut self: Box<Self>) -> Result<()> {
        self.flush().await?;
        let file = self.file.into_std().await;
        fs3::FileExt::unlock(&file).map_err(|e| Error::Io("error unlocking file", e))
    }
}

/// A file reopened for every write.
#[derive(Debug)]
struct SharedFile {
    path: PathBuf,
    full_path: PathBuf,
    len: u64,
}

#[async_trait]
impl LogFile for SharedFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn len(&self) -> u64 {
        self.len
    }

    async fn append(&mut self, bytes: &[u8]) -> Result<()> {
        let mut file = open_for_append(&self.full_path).await?;
        file.write_all(bytes)
            .await
            .map_err(|e| Error::Io("error writing file", e))?;
        file.flush()
            .await
            .map_err(|e| Error::Io("error flushing file", e))?;

        // Other writers may have appended since the last write.
        self.len = file
            .metadata()
            .await
            .map_err(|e| Error::Io("error reading file metadata", e))?
            .len();
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

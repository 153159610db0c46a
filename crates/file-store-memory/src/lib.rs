//! In-memory implementation of log file storage for tests and local
//! development.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use encoding_rs::Encoding;
use parking_lot::Mutex;
use proven_file_store::{Error, FileAccessMode, FileStore, LogFile, Result};

#[derive(Debug, Default)]
struct Tree {
    files: BTreeMap<PathBuf, Vec<u8>>,
    directories: BTreeSet<PathBuf>,
    locked: HashSet<PathBuf>,
}

impl Tree {
    fn create_ancestors(&mut self, path: &Path) -> Result<()> {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            if self.files.contains_key(ancestor) {
                return Err(Error::Io(
                    "error creating directory",
                    std::io::Error::new(
                        std::io::ErrorKind::AlreadyExists,
                        format!("{} is a file", ancestor.display()),
                    ),
                ));
            }
            self.directories.insert(ancestor.to_path_buf());
        }
        Ok(())
    }
}

/// In-memory hierarchical file store.
#[derive(Clone, Debug, Default)]
pub struct MemoryFileStore {
    tree: Arc<Mutex<Tree>>,
}

impl MemoryFileStore {
    /// Creates a new, empty `MemoryFileStore`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw contents of the file at `path`.
    #[must_use]
    pub fn read(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.tree.lock().files.get(&normalize(path.as_ref())).cloned()
    }

    /// Decodes the file at `path`, detecting its encoding from the byte order
    /// mark (UTF-8 when there is none).
    #[must_use]
    pub fn read_to_string(&self, path: impl AsRef<Path>) -> Option<(String, &'static Encoding)> {
        let bytes = self.read(path)?;
        let (encoding, bom_len) =
            Encoding::for_bom(&bytes).unwrap_or((encoding_rs::UTF_8, 0));
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        Some((text.into_owned(), encoding))
    }

    /// Writes `bytes` to the file at `path`, replacing any previous contents.
    pub fn write(&self, path: impl AsRef<Path>, bytes: impl Into<Vec<u8>>) -> Result<()> {
        let path = normalize(path.as_ref());
        let mut tree = self.tree.lock();
        if tree.directories.contains(&path) {
            return Err(Error::IsDirectory(path));
        }
        tree.create_ancestors(&path)?;
        tree.files.insert(path, bytes.into());
        Ok(())
    }

    /// Checks whether a file or directory exists at `path`.
    #[must_use]
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        let path = normalize(path.as_ref());
        let tree = self.tree.lock();
        tree.files.contains_key(&path) || tree.directories.contains(&path)
    }

    /// Checks whether a directory exists at `path`.
    #[must_use]
    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        self.tree
            .lock()
            .directories
            .contains(&normalize(path.as_ref()))
    }

    /// Paths of all files, in lexical order.
    #[must_use]
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.tree.lock().files.keys().cloned().collect()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn len(&self, path: &Path) -> Result<Option<u64>> {
        let path = normalize(path);
        let tree = self.tree.lock();
        if tree.directories.contains(&path) {
            return Err(Error::IsDirectory(path));
        }
        Ok(tree.files.get(&path).map(|bytes| bytes.len() as u64))
    }

    async fn open(&self, path: &Path, mode: FileAccessMode) -> Result<Box<dyn LogFile>> {
        let path = normalize(path);
        let mut tree = self.tree.lock();

        if tree.directories.contains(&path) {
            return Err(Error::IsDirectory(path));
        }
        if tree.locked.contains(&path) {
            return Err(Error::Locked(path));
        }

        tree.create_ancestors(&path)?;
        let len = tree.files.entry(path.clone()).or_default().len() as u64;
        if mode == FileAccessMode::Exclusive {
            tree.locked.insert(path.clone());
        }

        Ok(Box::new(MemoryLogFile {
            tree: Arc::clone(&self.tree),
            path,
            mode,
            len,
        }))
    }
}

#[derive(Debug)]
struct MemoryLogFile {
    tree: Arc<Mutex<Tree>>,
    path: PathBuf,
    mode: FileAccessMode,
    len: u64,
}

#[async_trait]
impl LogFile for MemoryLogFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn len(&self) -> u64 {
        self.len
    }

    async fn append(&mut self, bytes: &[u8]) -> Result<()> {
        let mut tree = self.tree.lock();
        if tree.directories.contains(&self.path) {
            return Err(Error::IsDirectory(self.path.clone()));
        }
        let file = tree.files.entry(self.path.clone()).or_default();
        file.extend_from_slice(bytes);
        self.len = file.len() as u64;
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

impl Drop for MemoryLogFile {
    fn drop(&mut self) {
        if self.mode == FileAccessMode::Exclusive {
            self.tree.lock().locked.remove(&self.path);
        }
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}

//! In-memory runtime.
//!
//! Holds virtual files keyed by normalized absolute path. Reads are logged so
//! callers can assert which fragments were actually read, and individual
//! paths can be made to fail with an I/O error.

use async_trait::async_trait;
use parking_lot::RwLock;
use path_clean::PathClean;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

use super::{FileMetadata, Runtime, RuntimeError, RuntimeResult};

/// Which operation an injected failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailOn {
    Read,
    Metadata,
}

#[derive(Debug)]
pub struct MemoryRuntime {
    files: RwLock<FxHashMap<PathBuf, Vec<u8>>>,
    failures: RwLock<FxHashMap<(PathBuf, FailOn), String>>,
    reads: RwLock<Vec<PathBuf>>,
    cwd: PathBuf,
}

impl MemoryRuntime {
    /// Create an empty runtime; relative paths resolve against `cwd`.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            files: RwLock::new(FxHashMap::default()),
            failures: RwLock::new(FxHashMap::default()),
            reads: RwLock::new(Vec::new()),
            cwd: cwd.into(),
        }
    }

    /// Add or replace a virtual file.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = self.normalize(path.as_ref());
        self.files.write().insert(path, content.into());
    }

    /// Builder-style variant of [`MemoryRuntime::add_file`].
    pub fn with_file(self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) -> Self {
        self.add_file(path, content);
        self
    }

    /// Make `op` on `path` fail with an I/O error, whether or not the file exists.
    pub fn fail(&self, path: impl AsRef<Path>, op: FailOn, message: impl Into<String>) {
        let path = self.normalize(path.as_ref());
        self.failures.write().insert((path, op), message.into());
    }

    /// Paths passed to `read_file`, in call order.
    pub fn reads(&self) -> Vec<PathBuf> {
        self.reads.read().clone()
    }

    pub fn was_read(&self, path: impl AsRef<Path>) -> bool {
        let path = self.normalize(path.as_ref());
        self.reads.read().contains(&path)
    }

    fn normalize(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.clean()
        } else {
            self.cwd.join(path).clean()
        }
    }

    fn injected(&self, path: &Path, op: FailOn) -> Option<RuntimeError> {
        self.failures
            .read()
            .get(&(path.to_path_buf(), op))
            .map(|message| RuntimeError::Io(format!("{}: {message}", path.display())))
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .read()
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }
}

#[async_trait]
impl Runtime for MemoryRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        let path = self.normalize(path);
        self.reads.write().push(path.clone());

        if let Some(err) = self.injected(&path, FailOn::Read) {
            return Err(err);
        }

        self.files
            .read()
            .get(&path)
            .cloned()
            .ok_or(RuntimeError::FileNotFound(path))
    }

    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata> {
        let path = self.normalize(path);

        if let Some(err) = self.injected(&path, FailOn::Metadata) {
            return Err(err);
        }

        if let Some(content) = self.files.read().get(&path) {
            return Ok(FileMetadata {
                size: content.len() as u64,
                is_dir: false,
                is_file: true,
                modified: None,
            });
        }

        if self.is_dir(&path) {
            return Ok(FileMetadata {
                size: 0,
                is_dir: true,
                is_file: false,
                modified: None,
            });
        }

        Err(RuntimeError::FileNotFound(path))
    }
}

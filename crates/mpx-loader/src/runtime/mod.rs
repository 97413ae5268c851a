//! Filesystem abstraction for the loader pipeline.
//!
//! Every probe and read the pipeline performs goes through the `Runtime`
//! trait, so embedders can back the loader with the host build's own
//! virtual filesystem and tests can run without touching disk.

pub mod memory;
pub mod native;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub use memory::{FailOn, MemoryRuntime};
pub use native::NativeRuntime;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Other runtime error
    #[error("Runtime error: {0}")]
    Other(String),
}

/// File metadata
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// File size in bytes
    pub size: u64,
    /// Whether this is a directory
    pub is_dir: bool,
    /// Whether this is a file
    pub is_file: bool,
    /// Last modified timestamp (milliseconds since epoch)
    pub modified: Option<u64>,
}

/// Platform runtime trait
///
/// Probing uses `metadata` (a stat), content retrieval uses `read_file`.
/// The pipeline treats any `metadata` error as "absent"; only `read_file`
/// errors are fatal.
#[async_trait]
pub trait Runtime: Send + Sync + std::fmt::Debug {
    /// Read a file from the filesystem
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Get file metadata
    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata>;
}

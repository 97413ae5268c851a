//! Error types for the native loader pipeline.
//!
//! A missing fragment is not an error (it is pruned), and malformed
//! structured-config is tolerated while collecting component references.
//! Everything here is fatal for the resource being processed.

use std::path::PathBuf;
use std::time::Duration;

use crate::runtime::RuntimeError;

/// Error types for native loader operations.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// A selected fragment could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: RuntimeError,
    },

    /// Programmatic structured-config threw or produced no serializable export.
    #[error("Evaluation of programmatic config failed: {0}")]
    Evaluation(String),

    /// Programmatic structured-config did not finish within the sandbox limit.
    #[error("Evaluation of programmatic config timed out after {}ms", .0.as_millis())]
    EvaluationTimeout(Duration),

    /// The nested build of a programmatic structured-config failed.
    #[error("Child build of {} failed: {message}", .entry.display())]
    ChildBuild { entry: PathBuf, message: String },

    /// The nested build finished without producing its named artifact.
    #[error("Child build of {} produced no '{name}' artifact", .entry.display())]
    MissingChildOutput { entry: PathBuf, name: String },

    /// Runtime error outside of a fragment read.
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// Loader options could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] mpx_config::ConfigError),

    /// Any of the above, attributed to the resource that was being processed.
    #[error("{}: {source}", .resource.display())]
    Resource {
        resource: PathBuf,
        #[source]
        source: Box<LoaderError>,
    },
}

/// Result type alias for native loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

impl LoaderError {
    /// Attribute this error to `resource`, unless it already is.
    pub fn for_resource(self, resource: impl Into<PathBuf>) -> Self {
        match self {
            err @ LoaderError::Resource { .. } => err,
            err => LoaderError::Resource {
                resource: resource.into(),
                source: Box::new(err),
            },
        }
    }

    /// The innermost error, skipping resource attribution.
    pub fn root(&self) -> &LoaderError {
        match self {
            LoaderError::Resource { source, .. } => source.root(),
            err => err,
        }
    }
}

impl miette::Diagnostic for LoaderError {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            LoaderError::Read { .. } => "READ_FAILED",
            LoaderError::Evaluation(_) => "EVALUATION_FAILED",
            LoaderError::EvaluationTimeout(_) => "EVALUATION_TIMEOUT",
            LoaderError::ChildBuild { .. } => "CHILD_BUILD_FAILED",
            LoaderError::MissingChildOutput { .. } => "CHILD_OUTPUT_MISSING",
            LoaderError::Runtime(_) => "RUNTIME_ERROR",
            LoaderError::Config(_) => "INVALID_CONFIG",
            LoaderError::Resource { source, .. } => return source.code(),
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            LoaderError::Evaluation(_) => Some(Box::new(
                "Programmatic config must assign a JSON-serializable value to module.exports.",
            )),
            LoaderError::EvaluationTimeout(_) => Some(Box::new(
                "Programmatic config must finish quickly; raise sandbox.timeout_ms if it legitimately needs longer.",
            )),
            LoaderError::ChildBuild { entry, .. } => Some(Box::new(format!(
                "Check that {} and every module it imports compile.",
                entry.display()
            ))),
            LoaderError::Resource { source, .. } => source.help(),
            _ => None,
        }
    }
}

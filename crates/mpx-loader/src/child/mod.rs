//! Nested builds of programmatic structured-config.
//!
//! A `<base>.mpxjson.js` file may import other modules, so it is compiled
//! through a real bundle rather than evaluated as raw text. The bundle's
//! entry artifact is then evaluated in the sandbox and its JSON result is
//! written into the parent build as `<logical path><json ext>`.

pub mod rolldown_compiler;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use indexmap::IndexMap;
use mpx_config::{FragmentKind, LoaderOptions, Mode};

use crate::compilation::{Compilation, LoaderContext};
use crate::error::{LoaderError, Result};

pub use self::rolldown_compiler::{DependencyTrackingPlugin, RolldownChildCompiler};

/// Input of one nested build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildBuildRequest {
    /// The programmatic structured-config file.
    pub entry: PathBuf,
    /// Name of the single artifact the build emits.
    pub entry_name: String,
    /// Name of the entry chunk, the resource's logical path.
    pub chunk_name: String,
    /// Directory relative imports resolve from.
    pub context: PathBuf,
}

/// What a nested build produced before interception.
#[derive(Debug, Clone, Default)]
pub struct ChildCompilation {
    /// Key in `assets` holding the entry artifact.
    pub entry_file: String,
    pub assets: IndexMap<String, String>,
    pub file_dependencies: Vec<PathBuf>,
    pub context_dependencies: Vec<PathBuf>,
}

/// Runs an isolated, module-shaped (CommonJS, Node target) build of one entry.
///
/// Implementations must not write anything to disk; the orchestrator decides
/// what reaches the parent build.
#[async_trait]
pub trait ChildCompiler: Send + Sync + std::fmt::Debug {
    async fn compile(&self, request: ChildBuildRequest) -> Result<ChildCompilation>;
}

/// Result of a successful nested build, merged into the parent already.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedBuildResult {
    /// Evaluated structured-config, 2-space indented JSON.
    pub content: String,
    pub file_dependencies: Vec<PathBuf>,
    pub context_dependencies: Vec<PathBuf>,
    /// Name of the artifact written into the parent build.
    pub target: String,
}

/// Artifact name of a resource's structured-config: its logical path plus the
/// mode's structured-config extension (`pages/index` → `pages/index.json`).
pub fn structured_config_target(options: &LoaderOptions, mode: Mode, logical_path: &str) -> String {
    let json_ext = options
        .type_ext_map(mode)
        .get(&FragmentKind::Json)
        .cloned()
        .unwrap_or_else(|| mode.json_ext().to_string());
    format!("{logical_path}{json_ext}")
}

/// Build, evaluate and emit a programmatic structured-config.
///
/// Nothing reaches the parent until every step has succeeded: on failure no
/// asset is written and no dependency is added to `ctx`.
pub async fn compile_structured_config(
    compilation: &Compilation,
    ctx: &mut LoaderContext,
    entry: &Path,
    logical_path: &str,
) -> Result<NestedBuildResult> {
    let options = compilation.options();
    let mode = compilation
        .registry()
        .map(|registry| registry.mode())
        .unwrap_or_default();
    let target = structured_config_target(options, mode, logical_path);

    let request = ChildBuildRequest {
        entry: entry.to_path_buf(),
        entry_name: options.child_build.entry_name.clone(),
        chunk_name: logical_path.to_string(),
        context: entry.parent().unwrap_or(ctx.context()).to_path_buf(),
    };

    tracing::debug!("Starting child build of {}", entry.display());
    let mut child = compilation.child_compiler().compile(request).await?;

    // Keep the entry artifact, drop everything else the child emitted.
    let source = child
        .assets
        .shift_remove(&child.entry_file)
        .ok_or_else(|| LoaderError::MissingChildOutput {
            entry: entry.to_path_buf(),
            name: child.entry_file.clone(),
        })?;
    if !child.assets.is_empty() {
        tracing::trace!(
            "Discarding {} auxiliary child assets of {}",
            child.assets.len(),
            entry.display()
        );
    }

    let content = compilation.sandbox().evaluate(&source, mode).await?;

    compilation.emit_asset(target.clone(), content.clone());
    for dep in &child.file_dependencies {
        ctx.add_dependency(dep.clone());
    }
    for dep in &child.context_dependencies {
        ctx.add_context_dependency(dep.clone());
    }

    tracing::debug!(
        "Child build of {} emitted {} ({} file deps, {} context deps)",
        entry.display(),
        target,
        child.file_dependencies.len(),
        child.context_dependencies.len()
    );

    Ok(NestedBuildResult {
        content,
        file_dependencies: child.file_dependencies,
        context_dependencies: child.context_dependencies,
        target,
    })
}

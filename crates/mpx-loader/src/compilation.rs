//! The parent build the loader runs inside.
//!
//! A [`Compilation`] is shared by every resource pipeline of one build pass.
//! Its asset set is the only state pipelines write to concurrently, and each
//! pipeline writes a key of its own.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexSet;
use mpx_config::LoaderOptions;

use crate::child::{ChildCompiler, RolldownChildCompiler};
use crate::error::Result;
use crate::registry::Registry;
use crate::runtime::Runtime;
use crate::sandbox::{BoaSandbox, Sandbox};

/// Ordering index of the global injection record; lower runs earlier.
pub const GLOBAL_INJECT_INDEX: i32 = -3;

/// Code the parent build injects into the module at a fixed position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectDependency {
    pub content: String,
    pub index: i32,
}

#[derive(Debug)]
pub struct Compilation {
    registry: Option<Arc<Registry>>,
    runtime: Arc<dyn Runtime>,
    sandbox: Arc<dyn Sandbox>,
    child_compiler: Arc<dyn ChildCompiler>,
    options: LoaderOptions,
    production: bool,
    source_map: bool,
    assets: DashMap<String, Vec<u8>>,
}

impl Compilation {
    /// A compilation with the Boa sandbox and the Rolldown child compiler.
    ///
    /// Without a registry (see [`Compilation::with_registry`]) the loader
    /// passes every resource through untouched.
    pub fn new(runtime: Arc<dyn Runtime>, options: LoaderOptions) -> Self {
        Self {
            registry: None,
            runtime,
            sandbox: Arc::new(BoaSandbox::new(options.sandbox.clone())),
            child_compiler: Arc::new(RolldownChildCompiler::new()),
            options,
            production: false,
            source_map: false,
            assets: DashMap::new(),
        }
    }

    /// A compilation using the options found for the project at `root`.
    pub fn load(
        runtime: Arc<dyn Runtime>,
        root: &Path,
        config_path: Option<&Path>,
    ) -> Result<Self> {
        let options = LoaderOptions::load(root, config_path)?;
        Ok(Self::new(runtime, options))
    }

    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_sandbox(mut self, sandbox: Arc<dyn Sandbox>) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn with_child_compiler(mut self, child_compiler: Arc<dyn ChildCompiler>) -> Self {
        self.child_compiler = child_compiler;
        self
    }

    /// Production builds fingerprint modules by content.
    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    pub fn with_source_map(mut self, source_map: bool) -> Self {
        self.source_map = source_map;
        self
    }

    pub fn registry(&self) -> Option<&Arc<Registry>> {
        self.registry.as_ref()
    }

    pub fn runtime(&self) -> &dyn Runtime {
        self.runtime.as_ref()
    }

    pub fn sandbox(&self) -> &dyn Sandbox {
        self.sandbox.as_ref()
    }

    pub fn child_compiler(&self) -> &dyn ChildCompiler {
        self.child_compiler.as_ref()
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    pub fn production(&self) -> bool {
        self.production
    }

    pub fn source_map(&self) -> bool {
        self.source_map
    }

    /// Add or replace an output artifact. Content is stored byte for byte.
    pub fn emit_asset(&self, name: impl Into<String>, content: impl Into<Vec<u8>>) {
        let name = name.into();
        let content = content.into();
        tracing::debug!("Emitting asset {} ({} bytes)", name, content.len());
        self.assets.insert(name, content);
    }

    pub fn asset(&self, name: &str) -> Option<Vec<u8>> {
        self.assets.get(name).map(|entry| entry.value().clone())
    }

    /// Artifact content as text, with invalid UTF-8 replaced.
    pub fn asset_text(&self, name: &str) -> Option<String> {
        self.assets
            .get(name)
            .map(|entry| String::from_utf8_lossy(entry.value()).into_owned())
    }

    /// Names of all emitted artifacts, sorted.
    pub fn asset_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.assets.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

/// Per-resource state the parent build collects while the loader runs.
#[derive(Debug, Clone)]
pub struct LoaderContext {
    resource_path: PathBuf,
    resource_query: String,
    production: bool,
    source_map: bool,
    cacheable: bool,
    file_dependencies: IndexSet<PathBuf>,
    context_dependencies: IndexSet<PathBuf>,
    injections: Vec<InjectDependency>,
}

impl LoaderContext {
    pub fn new(resource_path: impl Into<PathBuf>, resource_query: impl Into<String>) -> Self {
        Self {
            resource_path: resource_path.into(),
            resource_query: resource_query.into(),
            production: false,
            source_map: false,
            cacheable: false,
            file_dependencies: IndexSet::new(),
            context_dependencies: IndexSet::new(),
            injections: Vec::new(),
        }
    }

    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    pub fn with_source_map(mut self, source_map: bool) -> Self {
        self.source_map = source_map;
        self
    }

    pub fn resource_path(&self) -> &Path {
        &self.resource_path
    }

    pub fn resource_query(&self) -> &str {
        &self.resource_query
    }

    /// Directory of the resource; relative requests resolve from here.
    pub fn context(&self) -> &Path {
        self.resource_path.parent().unwrap_or(Path::new("/"))
    }

    pub fn production(&self) -> bool {
        self.production
    }

    pub fn source_map(&self) -> bool {
        self.source_map
    }

    pub fn cacheable(&mut self) {
        self.cacheable = true;
    }

    /// Re-run the loader when `path` changes.
    pub fn add_dependency(&mut self, path: impl Into<PathBuf>) {
        self.file_dependencies.insert(path.into());
    }

    /// Re-run the loader when the contents of directory `path` change.
    pub fn add_context_dependency(&mut self, path: impl Into<PathBuf>) {
        self.context_dependencies.insert(path.into());
    }

    pub fn add_injection(&mut self, injection: InjectDependency) {
        self.injections.push(injection);
    }

    pub fn file_dependencies(&self) -> &IndexSet<PathBuf> {
        &self.file_dependencies
    }

    pub fn context_dependencies(&self) -> &IndexSet<PathBuf> {
        &self.context_dependencies
    }

    pub fn injections(&self) -> &[InjectDependency] {
        &self.injections
    }

    pub fn into_output(self, source: String, using_components: Vec<String>) -> LoaderOutput {
        LoaderOutput {
            source,
            cacheable: self.cacheable,
            file_dependencies: self.file_dependencies.into_iter().collect(),
            context_dependencies: self.context_dependencies.into_iter().collect(),
            injections: self.injections,
            using_components,
        }
    }
}

/// Everything the loader hands back to the parent build for one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOutput {
    pub source: String,
    pub cacheable: bool,
    pub file_dependencies: Vec<PathBuf>,
    pub context_dependencies: Vec<PathBuf>,
    pub injections: Vec<InjectDependency>,
    pub using_components: Vec<String>,
}

//! Shared test utilities for mpx-loader tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use mpx_config::{LoaderOptions, Mode};
use mpx_loader::{
    ChildBuildRequest, ChildCompilation, ChildCompiler, Compilation, LoaderError, MemoryRuntime,
    NativeLoader, Registry,
};
use parking_lot::Mutex;

pub const ROOT: &str = "/project";

/// What the scripted child compiler does for one entry.
#[derive(Debug, Clone)]
pub enum ChildOutcome {
    /// Emit `code` as the entry artifact plus any auxiliary assets.
    Emit {
        code: String,
        auxiliary: Vec<(String, String)>,
        file_dependencies: Vec<PathBuf>,
        context_dependencies: Vec<PathBuf>,
    },
    /// Succeed without an entry artifact.
    NoOutput,
    /// Fail the build with `message`.
    Fail(String),
}

impl ChildOutcome {
    pub fn emit(code: &str) -> Self {
        ChildOutcome::Emit {
            code: code.to_string(),
            auxiliary: Vec::new(),
            file_dependencies: Vec::new(),
            context_dependencies: Vec::new(),
        }
    }
}

/// Child compiler that replays scripted outcomes and records its requests.
#[derive(Debug, Default)]
pub struct ScriptedChildCompiler {
    outcomes: Mutex<IndexMap<PathBuf, ChildOutcome>>,
    requests: Mutex<Vec<ChildBuildRequest>>,
}

impl ScriptedChildCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, entry: impl Into<PathBuf>, outcome: ChildOutcome) {
        self.outcomes.lock().insert(entry.into(), outcome);
    }

    pub fn requests(&self) -> Vec<ChildBuildRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ChildCompiler for ScriptedChildCompiler {
    async fn compile(&self, request: ChildBuildRequest) -> mpx_loader::Result<ChildCompilation> {
        self.requests.lock().push(request.clone());

        let outcome = self
            .outcomes
            .lock()
            .get(&request.entry)
            .cloned()
            .unwrap_or(ChildOutcome::Fail("no scripted outcome".to_string()));

        match outcome {
            ChildOutcome::Emit {
                code,
                auxiliary,
                file_dependencies,
                context_dependencies,
            } => {
                let mut assets = IndexMap::new();
                assets.insert(request.entry_name.clone(), code);
                assets.extend(auxiliary);
                Ok(ChildCompilation {
                    entry_file: request.entry_name.clone(),
                    assets,
                    file_dependencies,
                    context_dependencies,
                })
            }
            ChildOutcome::NoOutput => Ok(ChildCompilation {
                entry_file: request.entry_name.clone(),
                ..Default::default()
            }),
            ChildOutcome::Fail(message) => Err(LoaderError::ChildBuild {
                entry: request.entry,
                message,
            }),
        }
    }
}

/// An in-memory project with a scripted child compiler.
pub struct TestProject {
    pub runtime: Arc<MemoryRuntime>,
    pub child: Arc<ScriptedChildCompiler>,
    pub compilation: Arc<Compilation>,
}

impl TestProject {
    pub fn loader(&self) -> NativeLoader {
        NativeLoader::new(Arc::clone(&self.compilation))
    }
}

/// Registry with `pages/index` as a page and `components/card` as a component.
pub fn registry(mode: Mode) -> Registry {
    Registry::builder(mode, ROOT)
        .page(src("pages/index"), "pages/index")
        .component(src("components/card"), "components/card")
        .using_component("global-nav")
        .build()
}

pub fn project(registry: Registry, files: &[(&str, &str)]) -> TestProject {
    project_with(registry, files, |compilation| compilation)
}

pub fn project_with(
    registry: Registry,
    files: &[(&str, &str)],
    configure: impl FnOnce(Compilation) -> Compilation,
) -> TestProject {
    let runtime = Arc::new(MemoryRuntime::new(ROOT));
    for (path, content) in files {
        runtime.add_file(src(path), *content);
    }

    let child = Arc::new(ScriptedChildCompiler::new());
    let compilation = Compilation::new(runtime.clone(), LoaderOptions::default())
        .with_registry(Arc::new(registry))
        .with_child_compiler(child.clone());

    TestProject {
        runtime,
        child,
        compilation: Arc::new(configure(compilation)),
    }
}

/// Absolute path of a file under the project's `src` directory.
pub fn src(relative: &str) -> PathBuf {
    Path::new(ROOT).join("src").join(relative)
}

/// Comment headers of the blocks in a loader output, in order.
pub fn block_kinds(source: &str) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| line.strip_prefix("/* ")?.strip_suffix(" */"))
        .map(str::to_string)
        .collect()
}

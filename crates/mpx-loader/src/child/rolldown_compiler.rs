//! [`ChildCompiler`] backed by Rolldown.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::{IndexMap, IndexSet};
use parking_lot::Mutex;
use rolldown::{
    BundlerBuilder as RolldownBundlerBuilder, BundlerOptions, InputItem, OutputFormat, Platform,
};
use rolldown_common::{Output, StrOrBytes};
use rolldown_plugin::{
    __inner::SharedPluginable, HookLoadArgs, HookLoadReturn, HookResolveIdArgs,
    HookResolveIdReturn, HookUsage, Plugin, PluginContext,
};

use super::{ChildBuildRequest, ChildCompilation, ChildCompiler};
use crate::error::{LoaderError, Result};

#[derive(Debug, Default)]
struct TrackedDependencies {
    files: IndexSet<PathBuf>,
    contexts: IndexSet<PathBuf>,
}

/// Records what a child build traverses.
///
/// Every module loaded from disk becomes a file dependency. Every directory
/// a bare specifier is resolved from becomes a context dependency, since
/// adding a package under it can change what the specifier resolves to.
#[derive(Debug, Default)]
pub struct DependencyTrackingPlugin {
    state: Mutex<TrackedDependencies>,
}

impl DependencyTrackingPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the recorded (file, context) dependencies, in discovery order.
    pub fn take(&self) -> (Vec<PathBuf>, Vec<PathBuf>) {
        let state = std::mem::take(&mut *self.state.lock());
        (
            state.files.into_iter().collect(),
            state.contexts.into_iter().collect(),
        )
    }
}

fn is_bare_specifier(specifier: &str) -> bool {
    !(specifier.starts_with('.')
        || specifier.starts_with('/')
        || specifier.starts_with('\0')
        || specifier.contains(':'))
}

impl Plugin for DependencyTrackingPlugin {
    fn name(&self) -> std::borrow::Cow<'static, str> {
        "mpx-child-dependency-tracking".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId | HookUsage::Load
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        if let Some(importer) = args.importer {
            if is_bare_specifier(args.specifier) {
                if let Some(dir) = Path::new(importer).parent() {
                    self.state.lock().contexts.insert(dir.to_path_buf());
                }
            }
        }

        // Resolution itself is left to Rolldown
        async { Ok(None) }
    }

    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let path = Path::new(args.id);
        if path.is_absolute() {
            self.state.lock().files.insert(path.to_path_buf());
        }

        async { Ok(None) }
    }
}

/// Bundles the entry as a single CommonJS module for Node, in memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolldownChildCompiler;

impl RolldownChildCompiler {
    pub fn new() -> Self {
        Self
    }

    fn options(request: &ChildBuildRequest) -> BundlerOptions {
        BundlerOptions {
            input: Some(vec![InputItem {
                name: Some(request.chunk_name.clone()),
                import: request.entry.to_string_lossy().into_owned(),
            }]),
            cwd: Some(request.context.clone()),
            format: Some(OutputFormat::Cjs),
            platform: Some(Platform::Node),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ChildCompiler for RolldownChildCompiler {
    async fn compile(&self, request: ChildBuildRequest) -> Result<ChildCompilation> {
        let child_build_error = |e: &dyn std::fmt::Debug| LoaderError::ChildBuild {
            entry: request.entry.clone(),
            message: format!("{e:?}"),
        };

        let tracker = Arc::new(DependencyTrackingPlugin::new());
        let plugin: SharedPluginable = tracker.clone();

        let mut bundler = RolldownBundlerBuilder::default()
            .with_options(Self::options(&request))
            .with_plugins(vec![plugin])
            .build()
            .map_err(|e| child_build_error(&e))?;

        let bundle = bundler
            .generate()
            .await
            .map_err(|e| child_build_error(&e))?;

        let mut assets = IndexMap::new();
        let mut entry_found = false;
        for output in bundle.assets.iter() {
            match output {
                Output::Chunk(chunk) if chunk.is_entry && !entry_found => {
                    entry_found = true;
                    assets.insert(request.entry_name.clone(), chunk.code.clone());
                }
                Output::Chunk(chunk) => {
                    assets.insert(chunk.filename.to_string(), chunk.code.clone());
                }
                Output::Asset(asset) => {
                    let source = match &asset.source {
                        StrOrBytes::Str(s) => s.clone(),
                        StrOrBytes::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
                    };
                    assets.insert(asset.filename.to_string(), source);
                }
            }
        }

        let (file_dependencies, context_dependencies) = tracker.take();

        Ok(ChildCompilation {
            entry_file: request.entry_name.clone(),
            assets,
            file_dependencies,
            context_dependencies,
        })
    }
}

//! The native component loader.
//!
//! Given a component's script (or app) resource, the loader finds its
//! sibling fragment files, materializes its structured-config as a build
//! artifact and returns a virtual module that pulls every other fragment
//! into the build.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use mpx_config::{FragmentKind, Mode};

use crate::child::{compile_structured_config, structured_config_target};
use crate::compilation::{
    Compilation, GLOBAL_INJECT_INDEX, InjectDependency, LoaderContext, LoaderOutput,
};
use crate::error::Result;
use crate::fragment::with_suffix;
use crate::helpers::{DefaultFragmentRequests, FragmentContext, FragmentRequests, js_string};
use crate::probe::{
    StructuredConfigSource, extract_using_components, probe_fragments, resolve_structured_config,
};
use crate::query::{Query, QueryValue};
use crate::registry::Registry;
use crate::resource::Resource;

/// Statement that makes the host build hoist its `global` plumbing.
const WARM_UP: &str = "global.currentModuleId;\n";

#[derive(Debug, Clone)]
pub struct NativeLoader {
    compilation: Arc<Compilation>,
    requests: Arc<dyn FragmentRequests>,
}

impl NativeLoader {
    pub fn new(compilation: Arc<Compilation>) -> Self {
        Self {
            compilation,
            requests: Arc::new(DefaultFragmentRequests),
        }
    }

    /// Use the host build's sub-loader wiring for inclusion statements.
    pub fn with_requests(mut self, requests: Arc<dyn FragmentRequests>) -> Self {
        self.requests = requests;
        self
    }

    pub fn compilation(&self) -> &Arc<Compilation> {
        &self.compilation
    }

    /// Process one resource.
    ///
    /// Any failure aborts the whole resource and is attributed to
    /// `resource_path`; nothing is emitted for it in that case.
    pub async fn run(
        &self,
        resource_path: impl AsRef<Path>,
        resource_query: &str,
        content: &str,
    ) -> Result<LoaderOutput> {
        let resource_path = resource_path.as_ref();
        let mut ctx = LoaderContext::new(resource_path, resource_query)
            .with_production(self.compilation.production())
            .with_source_map(self.compilation.source_map());
        ctx.cacheable();

        let Some(registry) = self.compilation.registry().cloned() else {
            tracing::trace!("No registry, passing {} through", resource_path.display());
            return Ok(ctx.into_output(content.to_string(), Vec::new()));
        };

        match self.assemble(&registry, &mut ctx, content).await {
            Ok((source, using_components)) => Ok(ctx.into_output(source, using_components)),
            Err(e) => {
                tracing::debug!("Loading {} failed: {}", resource_path.display(), e);
                Err(e.for_resource(resource_path))
            }
        }
    }

    async fn assemble(
        &self,
        registry: &Registry,
        ctx: &mut LoaderContext,
        content: &str,
    ) -> Result<(String, Vec<String>)> {
        let compilation = self.compilation.as_ref();
        let options = compilation.options();
        let runtime = compilation.runtime();

        let resource = Resource::new(
            ctx.resource_path(),
            Query::parse(ctx.resource_query()),
            registry,
            content,
            ctx.production(),
        );
        let base = resource.base_path();
        tracing::debug!(
            "Loading {} as {} (module id {})",
            resource.resource_path().display(),
            resource.ctor(),
            resource.module_id()
        );

        let table = options.type_ext_map(resource.fragment_mode());
        let map = probe_fragments(runtime, base, table).await;

        let logical_path = resource
            .logical_path()
            .unwrap_or(options.app_path.as_str())
            .to_string();

        let config_text = match resolve_structured_config(runtime, base, &map).await? {
            StructuredConfigSource::None => None,
            StructuredConfigSource::Programmatic(entry) => {
                let nested =
                    compile_structured_config(compilation, ctx, &entry, &logical_path).await?;
                Some(nested.content)
            }
            StructuredConfigSource::Static { path, content } => {
                // Only component discovery needs text; the artifact keeps the file's bytes.
                let text = String::from_utf8_lossy(&content).into_owned();
                let target = structured_config_target(options, resource.mode(), &logical_path);
                compilation.emit_asset(target, content);
                ctx.add_dependency(path);
                Some(text)
            }
        };

        let using_components: Vec<String> = match &config_text {
            Some(text) => extract_using_components(registry.using_components(), text),
            None => registry.using_components().clone(),
        }
        .into_iter()
        .collect();

        ctx.add_injection(InjectDependency {
            content: global_inject_code(&resource),
            index: GLOBAL_INJECT_INDEX,
        });

        let fragment_ctx = FragmentContext {
            module_id: resource.module_id().to_string(),
            production: ctx.production(),
            using_components: using_components.clone(),
            need_css_source_map: !ctx.production() && ctx.source_map() && options.css_source_map,
            src_mode: resource.src_mode(),
            project_root: registry.project_root().to_path_buf(),
            is_native: true,
            has_scoped: false,
            has_comment: false,
        };

        let mut output = String::from(WARM_UP);
        for (kind, ext) in map.iter() {
            // Structured-config only ever reaches the build as an artifact.
            if *kind == FragmentKind::Json {
                continue;
            }
            if *kind == FragmentKind::Template && resource.is_app() {
                continue;
            }

            let src = with_suffix(base, ext);
            if *kind != FragmentKind::Script {
                ctx.add_dependency(src.clone());
            }

            let request = inclusion_request(&resource, kind, &src);
            let statement = if *kind == FragmentKind::Script {
                self.requests.named_exports_for_src(&fragment_ctx, kind, &request)
            } else {
                self.requests.require_for_src(&fragment_ctx, kind, &request)
            };

            let _ = write!(output, "/* {kind} */\n{statement}\n\n");
        }

        Ok((output, using_components))
    }
}

/// Fragment request: the fragment path plus the resource's own query,
/// `__resource=<base path>`, and `__component` for structured-config.
pub fn inclusion_request(resource: &Resource, kind: &FragmentKind, src: &Path) -> String {
    let mut query = resource.query().clone().with(
        "__resource",
        QueryValue::Str(resource.base_path().to_string_lossy().into_owned()),
    );
    if *kind == FragmentKind::Json {
        query.set("__component", QueryValue::Flag);
    }
    format!("{}{}", src.display(), query)
}

/// Statements that must run before any fragment of the resource.
pub fn global_inject_code(resource: &Resource) -> String {
    let mut code = String::new();
    let _ = writeln!(code, "global.currentModuleId = {};", js_string(resource.module_id()));
    let _ = writeln!(
        code,
        "global.currentResource = {};",
        js_string(&resource.resource_path().to_string_lossy())
    );
    let _ = writeln!(code, "global.currentCtor = {};", resource.ctor());

    if resource.is_app() && resource.mode() == Mode::Swan {
        code.push_str("if (!global.navigator) {\n  global.navigator = {};\n}\n");
        code.push_str("global.navigator.standalone = true;\n");
    }

    if let Some(src_mode) = resource.src_mode() {
        let _ = writeln!(code, "global.currentSrcMode = {};", js_string(src_mode.as_str()));
    }

    code
}

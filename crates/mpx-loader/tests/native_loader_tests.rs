//! End-to-end tests of the native loader against an in-memory project.

mod helpers;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use helpers::{ChildOutcome, ROOT, block_kinds, project, project_with, registry, src};
use mpx_config::{FragmentKind, Mode};
use mpx_loader::{
    FragmentContext, FragmentRequests, GLOBAL_INJECT_INDEX, LoaderError, Registry,
    runtime::FailOn,
};
use parking_lot::Mutex;

#[tokio::test]
async fn script_only_resource_has_only_a_script_block() {
    let project = project(registry(Mode::Wx), &[("components/card.js", "Component({})")]);

    let output = project
        .loader()
        .run(src("components/card.js"), "", "Component({})")
        .await
        .unwrap();

    assert_eq!(block_kinds(&output.source), vec!["script"]);
    assert!(project.compilation.asset_names().is_empty());
    assert!(output.file_dependencies.is_empty());
    assert!(output.cacheable);
}

#[tokio::test]
async fn static_config_is_emitted_verbatim_and_never_required() {
    let json = r#"{ "usingComponents": { "card": "/components/card" } }"#;
    let project = project(
        registry(Mode::Wx),
        &[("pages/index.js", "Page({})"), ("pages/index.json", json)],
    );

    let output = project
        .loader()
        .run(src("pages/index.js"), "", "Page({})")
        .await
        .unwrap();

    assert_eq!(
        output.source,
        "global.currentModuleId;\n\
         /* script */\n\
         export * from \"/project/src/pages/index.js?__resource=%2Fproject%2Fsrc%2Fpages%2Findex\";\n\n"
    );
    assert_eq!(project.compilation.asset_text("pages/index.json").as_deref(), Some(json));
    assert_eq!(project.compilation.asset_names(), vec!["pages/index.json"]);
    assert_eq!(output.file_dependencies, vec![src("pages/index.json")]);
    assert_eq!(output.using_components, vec!["global-nav", "card"]);
    assert!(project.child.requests().is_empty());
}

#[tokio::test]
async fn static_config_bytes_survive_a_non_utf8_encoding() {
    // GBK-encoded page title
    let mut json = br#"{"navigationBarTitleText":""#.to_vec();
    json.extend_from_slice(&[0xC4, 0xE3, 0xBA, 0xC3]);
    json.extend_from_slice(br#"","usingComponents":{"card":"/components/card"}}"#);

    let project = project(registry(Mode::Wx), &[("pages/index.js", "Page({})")]);
    project.runtime.add_file(src("pages/index.json"), json.clone());

    let output = project
        .loader()
        .run(src("pages/index.js"), "", "Page({})")
        .await
        .unwrap();

    assert_eq!(project.compilation.asset("pages/index.json"), Some(json));
    assert_eq!(output.using_components, vec!["global-nav", "card"]);
    assert_eq!(output.file_dependencies, vec![src("pages/index.json")]);
}

#[tokio::test]
async fn programmatic_config_wins_over_static() {
    let project = project(
        registry(Mode::Wx),
        &[
            ("pages/index.js", "Page({})"),
            ("pages/index.json", r#"{"usingComponents": {"stale": "./stale"}}"#),
            ("pages/index.mpxjson.js", "module.exports = {}"),
        ],
    );
    project.child.script(
        src("pages/index.mpxjson.js"),
        ChildOutcome::emit("module.exports = { usingComponents: { x: './x' } }"),
    );

    let output = project
        .loader()
        .run(src("pages/index.js"), "", "Page({})")
        .await
        .unwrap();

    assert!(!project.runtime.was_read(src("pages/index.json")));
    assert_eq!(output.using_components, vec!["global-nav", "x"]);
    assert_eq!(block_kinds(&output.source), vec!["script"]);

    let emitted = project.compilation.asset_text("pages/index.json").unwrap();
    let value: serde_json::Value = serde_json::from_str(&emitted).unwrap();
    assert_eq!(value, serde_json::json!({ "usingComponents": { "x": "./x" } }));
}

#[tokio::test]
async fn child_build_request_targets_the_logical_path() {
    let project = project(
        registry(Mode::Wx),
        &[
            ("pages/index.js", ""),
            ("pages/index.mpxjson.js", "module.exports = {}"),
        ],
    );
    project
        .child
        .script(src("pages/index.mpxjson.js"), ChildOutcome::emit("module.exports = {}"));

    project.loader().run(src("pages/index.js"), "", "").await.unwrap();

    let requests = project.child.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].entry, src("pages/index.mpxjson.js"));
    assert_eq!(requests[0].entry_name, "mpx-json-filename");
    assert_eq!(requests[0].chunk_name, "pages/index");
    assert_eq!(requests[0].context, src("pages"));
}

#[tokio::test]
async fn no_structured_config_means_no_artifact() {
    let project = project(
        registry(Mode::Wx),
        &[("pages/index.js", ""), ("pages/index.wxml", "<view/>")],
    );

    let output = project.loader().run(src("pages/index.js"), "", "").await.unwrap();

    assert_eq!(block_kinds(&output.source), vec!["template", "script"]);
    assert!(project.compilation.asset_names().is_empty());
    assert!(project.child.requests().is_empty());
    assert_eq!(output.using_components, vec!["global-nav"]);
}

#[tokio::test]
async fn app_root_template_is_not_included() {
    let project = project(
        registry(Mode::Wx),
        &[
            ("app.js", "App({})"),
            ("app.wxml", "<view/>"),
            ("app.wxss", "page {}"),
            ("app.json", r#"{"pages": ["pages/index"]}"#),
        ],
    );

    let output = project.loader().run(src("app.js"), "", "App({})").await.unwrap();

    assert_eq!(block_kinds(&output.source), vec!["script", "styles"]);
    assert!(!output.source.contains("app.wxml"));
    assert!(!output.file_dependencies.contains(&src("app.wxml")));
    assert!(output.file_dependencies.contains(&src("app.wxss")));
    assert_eq!(
        project.compilation.asset_text("app.json").as_deref(),
        Some(r#"{"pages": ["pages/index"]}"#)
    );

    let injection = &output.injections[0];
    assert!(injection.content.contains("global.currentCtor = App;\n"));
}

#[tokio::test]
async fn fragments_follow_table_order_and_declare_dependencies() {
    let project = project(
        registry(Mode::Wx),
        &[
            ("components/card.wxss", ".card {}"),
            ("components/card.js", "Component({})"),
            ("components/card.wxml", "<view/>"),
        ],
    );

    let output = project
        .loader()
        .run(src("components/card.js"), "", "Component({})")
        .await
        .unwrap();

    assert_eq!(block_kinds(&output.source), vec!["template", "script", "styles"]);
    assert!(output.source.starts_with("global.currentModuleId;\n/* template */\nrequire("));
    assert_eq!(
        output.file_dependencies,
        vec![src("components/card.wxml"), src("components/card.wxss")]
    );
}

#[tokio::test]
async fn global_injection_is_emitted_without_fragments() {
    let project = project(registry(Mode::Wx), &[]);

    let output = project
        .loader()
        .run(src("components/card.js"), "", "")
        .await
        .unwrap();

    assert_eq!(output.source, "global.currentModuleId;\n");
    assert_eq!(output.injections.len(), 1);
    assert_eq!(output.injections[0].index, GLOBAL_INJECT_INDEX);
    assert!(output.injections[0].content.contains("global.currentCtor = Component;\n"));
    assert!(
        output.injections[0]
            .content
            .contains("global.currentResource = \"/project/src/components/card.js\";\n")
    );
}

#[tokio::test]
async fn query_mode_selects_the_source_dialect_table() {
    let project = project(
        registry(Mode::Wx),
        &[
            ("components/card.js", ""),
            ("components/card.axml", "<view/>"),
            ("components/card.wxml", "<view/>"),
        ],
    );

    let output = project
        .loader()
        .run(src("components/card.js"), "?mode=ali", "")
        .await
        .unwrap();

    assert!(output.source.contains("card.axml?mode=ali&__resource="));
    assert!(!output.source.contains("card.wxml"));
    assert!(
        output.injections[0]
            .content
            .ends_with("global.currentSrcMode = \"ali\";\n")
    );
}

#[tokio::test]
async fn ali_pages_use_the_page_constructor() {
    let project = project(registry(Mode::Ali), &[("pages/index.js", "")]);

    let output = project.loader().run(src("pages/index.js"), "", "").await.unwrap();
    assert!(output.injections[0].content.contains("global.currentCtor = Page;\n"));
}

#[tokio::test]
async fn swan_app_root_gets_navigator_patch() {
    let project = project(registry(Mode::Swan), &[("app.js", "")]);

    let output = project.loader().run(src("app.js"), "", "").await.unwrap();
    assert!(
        output.injections[0]
            .content
            .contains("global.navigator.standalone = true;\n")
    );
}

#[tokio::test]
async fn failing_child_build_fails_the_resource_without_artifact() {
    let project = project(
        registry(Mode::Wx),
        &[
            ("pages/index.js", ""),
            ("pages/index.mpxjson.js", "module.exports = {"),
        ],
    );
    project.child.script(
        src("pages/index.mpxjson.js"),
        ChildOutcome::Fail("Unexpected token".into()),
    );

    let err = project.loader().run(src("pages/index.js"), "", "").await.unwrap_err();

    match &err {
        LoaderError::Resource { resource, .. } => assert_eq!(resource, &src("pages/index.js")),
        other => panic!("expected resource error, got {other:?}"),
    }
    assert!(matches!(err.root(), LoaderError::ChildBuild { .. }));
    assert!(project.compilation.asset_names().is_empty());
}

#[tokio::test]
async fn evaluation_failure_emits_nothing() {
    let project = project(
        registry(Mode::Wx),
        &[
            ("pages/index.js", ""),
            ("pages/index.mpxjson.js", "throw new Error('bad config')"),
        ],
    );
    project.child.script(
        src("pages/index.mpxjson.js"),
        ChildOutcome::Emit {
            code: "throw new Error('bad config')".into(),
            auxiliary: vec![],
            file_dependencies: vec![src("shared/config.js")],
            context_dependencies: vec![],
        },
    );

    let err = project.loader().run(src("pages/index.js"), "", "").await.unwrap_err();

    assert!(matches!(err.root(), LoaderError::Evaluation(msg) if msg.contains("bad config")));
    assert!(project.compilation.asset_names().is_empty());
}

#[tokio::test]
async fn missing_child_output_is_fatal() {
    let project = project(
        registry(Mode::Wx),
        &[("pages/index.js", ""), ("pages/index.mpxjson.js", "")],
    );
    project
        .child
        .script(src("pages/index.mpxjson.js"), ChildOutcome::NoOutput);

    let err = project.loader().run(src("pages/index.js"), "", "").await.unwrap_err();
    assert!(matches!(
        err.root(),
        LoaderError::MissingChildOutput { name, .. } if name == "mpx-json-filename"
    ));
}

#[tokio::test]
async fn static_read_failure_is_attributed_to_the_resource() {
    let project = project(
        registry(Mode::Wx),
        &[("pages/index.js", ""), ("pages/index.json", "{}")],
    );
    project
        .runtime
        .fail(src("pages/index.json"), FailOn::Read, "EIO");

    let err = project.loader().run(src("pages/index.js"), "", "").await.unwrap_err();

    assert!(matches!(
        err.root(),
        LoaderError::Read { path, .. } if *path == src("pages/index.json")
    ));
    assert!(err.to_string().starts_with("/project/src/pages/index.js: "));
    assert!(project.compilation.asset_names().is_empty());
}

#[tokio::test]
async fn malformed_static_config_still_loads() {
    let project = project(
        registry(Mode::Wx),
        &[("pages/index.js", ""), ("pages/index.json", "{ usingComponents: ")],
    );

    let output = project.loader().run(src("pages/index.js"), "", "").await.unwrap();

    assert_eq!(output.using_components, vec!["global-nav"]);
    assert_eq!(
        project.compilation.asset_text("pages/index.json").as_deref(),
        Some("{ usingComponents: ")
    );
}

#[tokio::test]
async fn passthrough_without_registry() {
    let runtime = Arc::new(mpx_loader::MemoryRuntime::new(ROOT));
    let compilation = Arc::new(mpx_loader::Compilation::new(
        runtime,
        mpx_config::LoaderOptions::default(),
    ));

    let output = mpx_loader::NativeLoader::new(compilation)
        .run(src("pages/index.js"), "", "Page({})")
        .await
        .unwrap();

    assert_eq!(output.source, "Page({})");
    assert!(output.cacheable);
    assert!(output.injections.is_empty());
}

/// Records the context of every inclusion it renders.
#[derive(Debug, Default)]
struct RecordingRequests {
    seen: Mutex<Vec<(FragmentKind, FragmentContext)>>,
}

impl FragmentRequests for RecordingRequests {
    fn require_for_src(&self, ctx: &FragmentContext, kind: &FragmentKind, src: &str) -> String {
        self.seen.lock().push((kind.clone(), ctx.clone()));
        format!("require({src:?});")
    }

    fn named_exports_for_src(
        &self,
        ctx: &FragmentContext,
        kind: &FragmentKind,
        src: &str,
    ) -> String {
        self.seen.lock().push((kind.clone(), ctx.clone()));
        format!("export * from {src:?};")
    }
}

#[tokio::test]
async fn module_id_is_shared_by_injection_and_fragments() {
    let project = project_with(
        registry(Mode::Wx),
        &[("components/card.js", ""), ("components/card.wxss", "")],
        |compilation| compilation.with_source_map(true),
    );
    let requests = Arc::new(RecordingRequests::default());

    let output = project
        .loader()
        .with_requests(requests.clone())
        .run(src("components/card.js"), "", "")
        .await
        .unwrap();

    let seen = requests.seen.lock().clone();
    assert_eq!(seen.len(), 2);
    for (_, ctx) in &seen {
        assert!(
            output.injections[0]
                .content
                .contains(&format!("global.currentModuleId = \"{}\";", ctx.module_id))
        );
        assert!(ctx.need_css_source_map);
        assert!(ctx.is_native);
        assert!(!ctx.has_scoped && !ctx.has_comment);
        assert_eq!(ctx.project_root, PathBuf::from(ROOT));
    }
}

#[tokio::test]
async fn production_disables_css_source_maps_and_fingerprints_content() {
    let project = project_with(
        registry(Mode::Wx),
        &[("components/card.js", "")],
        |compilation| compilation.with_source_map(true).with_production(true),
    );
    let requests = Arc::new(RecordingRequests::default());
    let loader = project.loader().with_requests(requests.clone());

    loader.run(src("components/card.js"), "", "a").await.unwrap();
    loader.run(src("components/card.js"), "", "b").await.unwrap();

    let seen = requests.seen.lock().clone();
    assert!(!seen[0].1.need_css_source_map);
    assert_ne!(seen[0].1.module_id, seen[1].1.module_id);
}

#[tokio::test]
async fn development_module_id_ignores_content() {
    let project = project(registry(Mode::Wx), &[("components/card.js", "")]);
    let requests = Arc::new(RecordingRequests::default());
    let loader = project.loader().with_requests(requests.clone());

    loader.run(src("components/card.js"), "", "a").await.unwrap();
    loader.run(src("components/card.js"), "", "b").await.unwrap();

    let seen = requests.seen.lock().clone();
    assert_eq!(seen[0].1.module_id, seen[1].1.module_id);
}

#[tokio::test]
async fn app_programmatic_config_uses_app_path() {
    let registry = Registry::builder(Mode::Wx, ROOT).build();
    let project = project(
        registry,
        &[("app.js", ""), ("app.mpxjson.js", "module.exports = {}")],
    );
    project.child.script(
        src("app.mpxjson.js"),
        ChildOutcome::emit("module.exports = { pages: ['pages/index'] }"),
    );

    project.loader().run(src("app.js"), "", "").await.unwrap();

    let emitted = project.compilation.asset_text("app.json").unwrap();
    assert_eq!(emitted, "{\n  \"pages\": [\n    \"pages/index\"\n  ]\n}");
    assert_eq!(project.child.requests()[0].chunk_name, "app");
    assert!(Path::new(&project.child.requests()[0].context).ends_with("src"));
}

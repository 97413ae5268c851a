//! Inclusion statements for fragment files.
//!
//! How a fragment request turns into an executable import belongs to the
//! per-fragment sub-loaders of the host build. The loader only needs the
//! statement text, so that wiring sits behind [`FragmentRequests`].

use std::path::PathBuf;

use mpx_config::{FragmentKind, Mode};

/// Per-resource values handed to the sub-loader wiring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentContext {
    pub module_id: String,
    pub production: bool,
    pub using_components: Vec<String>,
    pub need_css_source_map: bool,
    pub src_mode: Option<Mode>,
    pub project_root: PathBuf,
    /// Always true for native components.
    pub is_native: bool,
    pub has_scoped: bool,
    pub has_comment: bool,
}

/// Produces the statement that pulls a fragment request into the module.
pub trait FragmentRequests: Send + Sync + std::fmt::Debug {
    /// Side-effect inclusion, used for every fragment but the script.
    fn require_for_src(&self, ctx: &FragmentContext, kind: &FragmentKind, src: &str) -> String;

    /// Re-export inclusion, used for the script fragment.
    fn named_exports_for_src(
        &self,
        ctx: &FragmentContext,
        kind: &FragmentKind,
        src: &str,
    ) -> String;
}

/// Plain `require("…");` / `export * from "…";` statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFragmentRequests;

impl FragmentRequests for DefaultFragmentRequests {
    fn require_for_src(&self, _ctx: &FragmentContext, _kind: &FragmentKind, src: &str) -> String {
        format!("require({});", js_string(src))
    }

    fn named_exports_for_src(
        &self,
        _ctx: &FragmentContext,
        _kind: &FragmentKind,
        src: &str,
    ) -> String {
        format!("export * from {};", js_string(src))
    }
}

/// Quote `text` as a JavaScript string literal.
pub fn js_string(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

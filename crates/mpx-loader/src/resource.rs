//! The resource being loaded: identity, platform and fingerprint.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use mpx_config::Mode;

use crate::query::Query;
use crate::registry::Registry;

/// Constructor the runtime registers the resource's module with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtorKind {
    App,
    Page,
    Component,
}

impl CtorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CtorKind::App => "App",
            CtorKind::Page => "Page",
            CtorKind::Component => "Component",
        }
    }
}

impl fmt::Display for CtorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Resource {
    resource_path: PathBuf,
    base_path: PathBuf,
    query: Query,
    mode: Mode,
    src_mode: Option<Mode>,
    ctor: CtorKind,
    logical_path: Option<String>,
    module_id: String,
}

impl Resource {
    /// Resolve a resource against the registry.
    ///
    /// The module id is computed here, once, and reused by every statement
    /// and query generated for this resource.
    pub fn new(
        resource_path: &Path,
        query: Query,
        registry: &Registry,
        content: &str,
        production: bool,
    ) -> Self {
        let base_path = resource_path.with_extension("");
        let mode = registry.mode();

        let ctor = if registry.is_page(&base_path) {
            if mode == Mode::Ali {
                CtorKind::Page
            } else {
                CtorKind::Component
            }
        } else if registry.is_component(&base_path) {
            CtorKind::Component
        } else {
            CtorKind::App
        };

        let local_src_mode = query.get_str("mode").and_then(|raw| match raw.parse::<Mode>() {
            Ok(mode) => Some(mode),
            Err(e) => {
                tracing::warn!("Ignoring mode override on {}: {}", resource_path.display(), e);
                None
            }
        });

        let short = short_path(registry.project_root(), resource_path);
        let module_id = module_id(&short, content, production);

        Self {
            resource_path: resource_path.to_path_buf(),
            logical_path: registry.logical_path(&base_path).map(str::to_string),
            base_path,
            query,
            mode,
            src_mode: local_src_mode.or(registry.src_mode()),
            ctor,
            module_id,
        }
    }

    pub fn resource_path(&self) -> &Path {
        &self.resource_path
    }

    /// Resource path with its extension stripped; fragments hang off this.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// True when the resource is neither a registered page nor component.
    pub fn is_app(&self) -> bool {
        self.ctor == CtorKind::App
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Source dialect declared by the query or the build, if any.
    pub fn src_mode(&self) -> Option<Mode> {
        self.src_mode
    }

    /// Dialect whose fragment table applies to this resource.
    pub fn fragment_mode(&self) -> Mode {
        self.src_mode.unwrap_or(self.mode)
    }

    pub fn ctor(&self) -> CtorKind {
        self.ctor
    }

    /// Registered logical path (`pages/index`); `None` for the app root.
    pub fn logical_path(&self) -> Option<&str> {
        self.logical_path.as_deref()
    }

    pub fn module_id(&self) -> &str {
        &self.module_id
    }
}

/// Path of `path` relative to `root`, with forward slashes and without any
/// leading `../` segments.
pub fn short_path(root: &Path, path: &Path) -> String {
    let mut root_components = root.components().peekable();
    let mut rest = path.components().peekable();

    while let (Some(a), Some(b)) = (root_components.peek(), rest.peek()) {
        if a != b {
            break;
        }
        root_components.next();
        rest.next();
    }

    rest.filter_map(|component| match component {
        Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
        _ => None,
    })
    .collect::<Vec<_>>()
    .join("/")
}

/// Fingerprint of a resource.
///
/// Production ids cover the content so they change with it; development ids
/// only cover the path so they stay stable across edits.
pub fn module_id(short_path: &str, content: &str, production: bool) -> String {
    let hash = if production {
        let mut hasher = blake3::Hasher::new();
        hasher.update(short_path.as_bytes());
        hasher.update(b"\n");
        hasher.update(content.as_bytes());
        hasher.finalize()
    } else {
        blake3::hash(short_path.as_bytes())
    };

    hash.to_hex().as_str()[..8].to_string()
}

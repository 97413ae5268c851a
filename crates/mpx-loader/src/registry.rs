//! Compilation-wide registry of pages and components.
//!
//! The registry is owned by the surrounding build and shared with every
//! loader pipeline as `Arc<Registry>`. The loader only ever reads it.

use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use mpx_config::Mode;

/// Read-only view of the build's page/component registrations.
#[derive(Debug, Clone)]
pub struct Registry {
    mode: Mode,
    src_mode: Option<Mode>,
    project_root: PathBuf,
    pages_map: IndexMap<PathBuf, String>,
    components_map: IndexMap<PathBuf, String>,
    using_components: IndexSet<String>,
}

impl Registry {
    pub fn builder(mode: Mode, project_root: impl Into<PathBuf>) -> RegistryBuilder {
        RegistryBuilder {
            registry: Registry {
                mode,
                src_mode: None,
                project_root: project_root.into(),
                pages_map: IndexMap::new(),
                components_map: IndexMap::new(),
                using_components: IndexSet::new(),
            },
        }
    }

    /// Target platform of the build.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Global source dialect, if the build declares one.
    pub fn src_mode(&self) -> Option<Mode> {
        self.src_mode
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn is_page(&self, base: &Path) -> bool {
        self.pages_map.contains_key(base)
    }

    pub fn is_component(&self, base: &Path) -> bool {
        self.components_map.contains_key(base)
    }

    /// Registered logical path (e.g. `pages/index`) of a page or component.
    pub fn logical_path(&self, base: &Path) -> Option<&str> {
        self.pages_map
            .get(base)
            .or_else(|| self.components_map.get(base))
            .map(String::as_str)
    }

    /// Component names every pipeline starts its using-components set from.
    pub fn using_components(&self) -> &IndexSet<String> {
        &self.using_components
    }
}

#[derive(Debug)]
pub struct RegistryBuilder {
    registry: Registry,
}

impl RegistryBuilder {
    pub fn src_mode(mut self, src_mode: Mode) -> Self {
        self.registry.src_mode = Some(src_mode);
        self
    }

    /// Register a page by its extension-stripped base path.
    pub fn page(mut self, base: impl Into<PathBuf>, logical_path: impl Into<String>) -> Self {
        self.registry
            .pages_map
            .insert(base.into(), logical_path.into());
        self
    }

    /// Register a component by its extension-stripped base path.
    pub fn component(mut self, base: impl Into<PathBuf>, logical_path: impl Into<String>) -> Self {
        self.registry
            .components_map
            .insert(base.into(), logical_path.into());
        self
    }

    pub fn using_component(mut self, name: impl Into<String>) -> Self {
        self.registry.using_components.insert(name.into());
        self
    }

    pub fn build(self) -> Registry {
        self.registry
    }
}

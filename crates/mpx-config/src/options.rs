//! Loader options with multi-source loading.
//!
//! Priority: environment variables (`MPX_*`) > `mpx.config.json` > defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::mode::{FragmentKind, Mode, TypeExtMap, default_type_ext_map};

/// File name looked up in the project root when no explicit path is given.
pub const CONFIG_FILE_NAME: &str = "mpx.config.json";

/// Options consumed by the native loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderOptions {
    /// Allow style fragments to request source maps in development builds.
    pub css_source_map: bool,

    pub sandbox: SandboxOptions,

    pub child_build: ChildBuildOptions,

    /// Per-mode overrides of the default fragment table, keyed by mode name.
    pub type_ext_map: HashMap<String, IndexMap<String, String>>,

    /// Logical path used for the app root's structured-config artifact.
    pub app_path: String,
}

/// Limits applied when evaluating programmatic structured-config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxOptions {
    pub timeout_ms: u64,
    pub loop_iteration_limit: u64,
    pub recursion_limit: usize,
}

/// Options for the nested build of a programmatic structured-config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChildBuildOptions {
    /// Name of the single artifact the nested build emits.
    pub entry_name: String,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            css_source_map: true,
            sandbox: SandboxOptions::default(),
            child_build: ChildBuildOptions::default(),
            type_ext_map: HashMap::new(),
            app_path: "app".to_string(),
        }
    }
}

impl Default for SandboxOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            loop_iteration_limit: 10_000_000,
            recursion_limit: 512,
        }
    }
}

impl Default for ChildBuildOptions {
    fn default() -> Self {
        Self {
            entry_name: "mpx-json-filename".to_string(),
        }
    }
}

impl LoaderOptions {
    /// Load options for a project rooted at `root`.
    ///
    /// An explicit `config_path` must exist; otherwise `mpx.config.json` in
    /// `root` is merged when present.
    pub fn load(root: &Path, config_path: Option<&Path>) -> Result<Self> {
        let config_file = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Some(path.to_path_buf())
            }
            None => {
                let default_path = root.join(CONFIG_FILE_NAME);
                default_path.exists().then_some(default_path)
            }
        };

        Self::figment(config_file).extract().map_err(|e| ConfigError::InvalidValue {
            field: "loader options".to_string(),
            hint: Some(e.to_string()),
        })
    }

    fn figment(config_file: Option<PathBuf>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        if let Some(path) = config_file {
            tracing::debug!("Merging loader options from {}", path.display());
            figment = figment.merge(Json::file(path));
        }

        // MPX_CSS_SOURCE_MAP, MPX_SANDBOX__TIMEOUT_MS, ...
        figment.merge(Env::prefixed("MPX_").split("__"))
    }

    /// Fragment table for `mode` with configured overrides applied.
    ///
    /// Overrides replace the extension of a known kind in place and append
    /// new platform kinds after the defaults.
    pub fn type_ext_map(&self, mode: Mode) -> TypeExtMap {
        let mut map = default_type_ext_map(mode);
        if let Some(overrides) = self.type_ext_map.get(mode.as_str()) {
            for (kind, ext) in overrides {
                map.insert(FragmentKind::from(kind.as_str()), ext.clone());
            }
        }
        map
    }
}

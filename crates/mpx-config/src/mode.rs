//! Platform modes and the fragment extension table of each mode.
//!
//! A component is split into fragment files that share a base path. Which
//! extension a fragment uses depends on the target platform: a `wx` template
//! is `.wxml`, an `ali` template is `.axml`, and so on. The loader copies the
//! table for the active mode and prunes it down to the fragments that exist.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Ordered mapping from fragment kind to file extension.
pub type TypeExtMap = IndexMap<FragmentKind, String>;

/// Target mini-program platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Wx,
    Ali,
    Swan,
    Qq,
    Tt,
}

impl Mode {
    pub const ALL: [Mode; 5] = [Mode::Wx, Mode::Ali, Mode::Swan, Mode::Qq, Mode::Tt];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Wx => "wx",
            Mode::Ali => "ali",
            Mode::Swan => "swan",
            Mode::Qq => "qq",
            Mode::Tt => "tt",
        }
    }

    /// Extension of the structured-config fragment for this mode.
    pub fn json_ext(&self) -> &'static str {
        ".json"
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownMode(s.to_string()))
    }
}

/// Kind of a fragment file belonging to a component.
///
/// The four well-known kinds are shared by every platform; anything else
/// (for example a platform's view-script files) is carried as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FragmentKind {
    Template,
    Script,
    Styles,
    Json,
    Other(String),
}

impl FragmentKind {
    pub fn as_str(&self) -> &str {
        match self {
            FragmentKind::Template => "template",
            FragmentKind::Script => "script",
            FragmentKind::Styles => "styles",
            FragmentKind::Json => "json",
            FragmentKind::Other(name) => name,
        }
    }
}

impl From<&str> for FragmentKind {
    fn from(name: &str) -> Self {
        match name {
            "template" => FragmentKind::Template,
            "script" => FragmentKind::Script,
            "styles" => FragmentKind::Styles,
            "json" => FragmentKind::Json,
            other => FragmentKind::Other(other.to_string()),
        }
    }
}

impl From<String> for FragmentKind {
    fn from(name: String) -> Self {
        FragmentKind::from(name.as_str())
    }
}

impl From<FragmentKind> for String {
    fn from(kind: FragmentKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default fragment table for a mode, in template/script/styles/json order.
pub fn default_type_ext_map(mode: Mode) -> TypeExtMap {
    let (template, styles) = match mode {
        Mode::Wx => (".wxml", ".wxss"),
        Mode::Ali => (".axml", ".acss"),
        Mode::Swan => (".swan", ".css"),
        Mode::Qq => (".qml", ".qss"),
        Mode::Tt => (".ttml", ".ttss"),
    };

    let mut map = TypeExtMap::new();
    map.insert(FragmentKind::Template, template.to_string());
    map.insert(FragmentKind::Script, ".js".to_string());
    map.insert(FragmentKind::Styles, styles.to_string());
    map.insert(FragmentKind::Json, mode.json_ext().to_string());
    map
}

//! Per-resource fragment table.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use mpx_config::{FragmentKind, TypeExtMap};

/// Suffix of the programmatic structured-config variant (`<base>.mpxjson.js`).
pub const PROGRAMMATIC_SUFFIX: &str = ".mpxjson.js";

/// Append `suffix` to `base` verbatim (`/a/index` + `.json` = `/a/index.json`).
pub fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut path = OsString::from(base.as_os_str());
    path.push(suffix);
    PathBuf::from(path)
}

/// Ordered fragment kind → extension mapping for one resource.
///
/// Starts as a copy of the mode's table and only ever shrinks: probing
/// removes the kinds whose backing file does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentTypeMap {
    entries: TypeExtMap,
}

impl FragmentTypeMap {
    pub fn new(table: TypeExtMap) -> Self {
        Self { entries: table }
    }

    pub fn ext(&self, kind: &FragmentKind) -> Option<&str> {
        self.entries.get(kind).map(String::as_str)
    }

    /// Path of the fragment file for `kind`, if the kind is present.
    pub fn path_for(&self, base: &Path, kind: &FragmentKind) -> Option<PathBuf> {
        self.ext(kind).map(|ext| with_suffix(base, ext))
    }

    pub fn remove(&mut self, kind: &FragmentKind) -> Option<String> {
        // shift_remove keeps the remaining kinds in table order
        self.entries.shift_remove(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &FragmentKind> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FragmentKind, &str)> {
        self.entries.iter().map(|(kind, ext)| (kind, ext.as_str()))
    }
}

//! Fragment discovery and structured-config resolution.

use std::path::{Path, PathBuf};

use futures::future::join_all;
use indexmap::IndexSet;
use mpx_config::{FragmentKind, TypeExtMap};

use crate::error::{LoaderError, Result};
use crate::fragment::{FragmentTypeMap, PROGRAMMATIC_SUFFIX, with_suffix};
use crate::runtime::Runtime;

/// Where a resource's structured-config comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredConfigSource {
    /// Neither `<base>.json` nor `<base>.mpxjson.js` exists.
    None,
    /// `<base>.mpxjson.js` exists and must go through a nested build.
    Programmatic(PathBuf),
    /// Static file content, read verbatim.
    Static { path: PathBuf, content: Vec<u8> },
}

/// Stat used by probing. Any error, not only "not found", counts as absent.
async fn present(runtime: &dyn Runtime, path: &Path) -> bool {
    match runtime.metadata(path).await {
        Ok(_) => true,
        Err(e) => {
            tracing::trace!("Probe miss {}: {}", path.display(), e);
            false
        }
    }
}

/// Prune `table` down to the fragment kinds whose file exists next to `base`.
///
/// All stats are issued at once and joined before returning. A missing
/// `json` file is kept when the programmatic variant exists instead.
pub async fn probe_fragments(
    runtime: &dyn Runtime,
    base: &Path,
    table: TypeExtMap,
) -> FragmentTypeMap {
    let mut map = FragmentTypeMap::new(table);

    let probes = map.iter().map(|(kind, ext)| {
        let kind = kind.clone();
        let path = with_suffix(base, ext);
        async move {
            let mut found = present(runtime, &path).await;
            if !found && kind == FragmentKind::Json {
                found = present(runtime, &with_suffix(base, PROGRAMMATIC_SUFFIX)).await;
            }
            (kind, found)
        }
    });
    let results = join_all(probes).await;

    for (kind, found) in results {
        if !found {
            map.remove(&kind);
        }
    }

    tracing::debug!(
        "Probed {}: [{}]",
        base.display(),
        map.kinds().map(|k| k.as_str()).collect::<Vec<_>>().join(", ")
    );

    map
}

/// Decide between the programmatic and the static structured-config.
///
/// The programmatic variant is re-checked here and wins whenever it exists;
/// the static file is then never read. Read failures are fatal.
pub async fn resolve_structured_config(
    runtime: &dyn Runtime,
    base: &Path,
    map: &FragmentTypeMap,
) -> Result<StructuredConfigSource> {
    let Some(path) = map.path_for(base, &FragmentKind::Json) else {
        return Ok(StructuredConfigSource::None);
    };

    let programmatic = with_suffix(base, PROGRAMMATIC_SUFFIX);
    if present(runtime, &programmatic).await {
        return Ok(StructuredConfigSource::Programmatic(programmatic));
    }

    let content = runtime
        .read_file(&path)
        .await
        .map_err(|source| LoaderError::Read {
            path: path.clone(),
            source,
        })?;

    Ok(StructuredConfigSource::Static { path, content })
}

/// Seed plus the `usingComponents` keys of `content`, in order.
///
/// Content that is not a JSON object, or has no `usingComponents` object,
/// contributes nothing.
pub fn extract_using_components(seed: &IndexSet<String>, content: &str) -> IndexSet<String> {
    let mut names = seed.clone();

    match serde_json::from_str::<serde_json::Value>(content) {
        Ok(value) => {
            if let Some(components) = value.get("usingComponents").and_then(|v| v.as_object()) {
                names.extend(components.keys().cloned());
            }
        }
        Err(e) => tracing::debug!("Structured-config is not valid JSON, using seed only: {}", e),
    }

    names
}

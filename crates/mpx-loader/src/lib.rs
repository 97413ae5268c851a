//! # mpx-loader
//!
//! Native component loader for multi-platform mini-program builds.
//!
//! A native component is a set of sibling fragment files sharing a base
//! path: `index.wxml`, `index.js`, `index.wxss`, `index.json`. For each
//! component resource the loader
//!
//! 1. probes which fragments exist for the target platform,
//! 2. resolves the structured-config, preferring a programmatic
//!    `index.mpxjson.js` (compiled by a nested Rolldown build and evaluated
//!    in a Boa sandbox) over the static `index.json`,
//! 3. emits the structured-config as a build artifact, and
//! 4. returns a virtual module that includes every other fragment, plus a
//!    global injection record the host runs before it.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mpx_config::{LoaderOptions, Mode};
//! use mpx_loader::{Compilation, NativeLoader, NativeRuntime, Registry};
//!
//! # async fn example() -> mpx_loader::Result<()> {
//! let registry = Registry::builder(Mode::Wx, "/project")
//!     .page("/project/src/pages/index", "pages/index")
//!     .build();
//! let compilation = Arc::new(
//!     Compilation::new(Arc::new(NativeRuntime::new()), LoaderOptions::default())
//!         .with_registry(Arc::new(registry)),
//! );
//!
//! let loader = NativeLoader::new(Arc::clone(&compilation));
//! let output = loader
//!     .run("/project/src/pages/index.js", "", "Component({})")
//!     .await?;
//! println!("{}", output.source);
//! # Ok(())
//! # }
//! ```

pub mod child;
pub mod compilation;
pub mod error;
pub mod fragment;
pub mod helpers;
pub mod loader;
pub mod probe;
pub mod query;
pub mod registry;
pub mod resource;
pub mod runtime;
pub mod sandbox;

// Logging utilities (optional, enabled with "logging" feature)
#[cfg(feature = "logging")]
pub mod logging;

#[cfg(feature = "logging")]
pub use logging::{LogLevel, init_logging, init_logging_from_env};

pub use child::{
    ChildBuildRequest, ChildCompilation, ChildCompiler, NestedBuildResult, RolldownChildCompiler,
    compile_structured_config,
};
pub use compilation::{
    Compilation, GLOBAL_INJECT_INDEX, InjectDependency, LoaderContext, LoaderOutput,
};
pub use error::{LoaderError, Result};
pub use fragment::{FragmentTypeMap, PROGRAMMATIC_SUFFIX};
pub use helpers::{DefaultFragmentRequests, FragmentContext, FragmentRequests};
pub use loader::NativeLoader;
pub use probe::{
    StructuredConfigSource, extract_using_components, probe_fragments, resolve_structured_config,
};
pub use query::{Query, QueryValue};
pub use registry::{Registry, RegistryBuilder};
pub use resource::{CtorKind, Resource, module_id};
pub use runtime::{
    FileMetadata, MemoryRuntime, NativeRuntime, Runtime, RuntimeError, RuntimeResult,
};
pub use sandbox::{BoaSandbox, Sandbox};

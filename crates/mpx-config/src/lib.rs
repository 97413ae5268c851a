//! Configuration for the mpx native component loader.
//!
//! This crate owns the data the loader core consumes but does not decide:
//! the platform [`Mode`], the per-mode fragment extension tables, and the
//! [`LoaderOptions`] layered from defaults, `mpx.config.json` and `MPX_`
//! environment variables.

pub mod error;
pub mod mode;
pub mod options;

pub use error::*;
pub use mode::{FragmentKind, Mode, TypeExtMap, default_type_ext_map};
pub use options::{ChildBuildOptions, LoaderOptions, SandboxOptions};

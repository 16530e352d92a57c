//! Dependency resolution.
//!
//! The build cycle only sees the [`Resolve`] trait: given the boot directory
//! it returns a fresh [`DependencyGraph`]. [`LocalResolver`] is the shipped
//! implementation, reading `component.json` files from disk.

mod graph;
mod local;

pub use graph::{
    Component, ComponentId, DependencyGraph, FileSet, FileType, normalize_relative, parent_dir,
};
pub use local::LocalResolver;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Options passed through to the resolver on every build cycle.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Directories searched for remote components that are not installed.
    pub remotes: Vec<PathBuf>,
    /// Install missing remote components from `remotes`.
    pub install: bool,
}

/// Turns a boot directory into a resolved component graph.
pub trait Resolve: Send + Sync {
    fn resolve(&self, boot: &Path, options: &ResolveOptions)
    -> Result<DependencyGraph, ResolveError>;
}

/// Dependency resolution errors.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("component.json not found in `{0}`")]
    ManifestNotFound(PathBuf),

    #[error("invalid component.json at `{path}`")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("local component `{name}` required by `{parent}` not found (searched: {searched})")]
    MissingLocal {
        name: String,
        parent: String,
        searched: String,
    },

    #[error("remote component `{name}@{version}` is not installed")]
    NotInstalled { name: String, version: String },

    #[error("invalid remote dependency name `{0}` (expected `owner/repo`)")]
    InvalidRemote(String),

    #[error("invalid version `{version}` for remote dependency `{name}`")]
    InvalidVersion { name: String, version: String },

    #[error("local component `{name}` required by `{parent}` has the same id as the boot component")]
    RootNameClash { name: String, parent: String },

    #[error("dependency cycle through `{0}`")]
    Cycle(ComponentId),

    #[error("IO error at `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

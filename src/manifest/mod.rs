//! Boot manifest loading.
//!
//! The boot directory's `component.json` names the bundles (`locals`, first
//! is the main bundle) and declares the dependency sources. It is loaded once
//! at startup and never changes afterwards.

mod json;

pub use json::{ComponentJson, MANIFEST_FILE, ReadError};

use indexmap::IndexMap;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::config::ConfigError;

/// Validated boot manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Path of the manifest file.
    pub path: PathBuf,
    /// Bundle names in serving order; never empty.
    bundle_names: Vec<String>,
    /// Remote dependency declarations, passed through to the resolver.
    pub dependencies: IndexMap<String, String>,
}

impl Manifest {
    /// Load and validate the manifest in `boot`.
    pub fn load(boot: &Path) -> Result<Self, ConfigError> {
        let path = boot.join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(ConfigError::ManifestNotFound(boot.to_path_buf()));
        }

        let json = ComponentJson::read(&path).map_err(|err| match err {
            ReadError::Io(err) => ConfigError::Io(path.clone(), err),
            ReadError::Parse(err) => ConfigError::Manifest(path.clone(), err),
        })?;

        Self::from_json(path, json)
    }

    fn from_json(path: PathBuf, json: ComponentJson) -> Result<Self, ConfigError> {
        let bundle_names = match json.locals {
            Some(locals) if !locals.is_empty() => locals,
            _ => return Err(ConfigError::NoBundles(path)),
        };

        Ok(Self {
            path,
            bundle_names,
            dependencies: json.dependencies,
        })
    }

    /// Bundle names in serving order.
    pub fn bundle_names(&self) -> &[String] {
        &self.bundle_names
    }

    /// The main bundle, which carries the module loader.
    pub fn main_bundle(&self) -> &str {
        // Non-empty by construction.
        &self.bundle_names[0]
    }

    pub fn is_bundle(&self, name: &str) -> bool {
        self.bundle_names.iter().any(|b| b == name)
    }

    /// Create the build root and one directory per bundle.
    ///
    /// Idempotent; existing directories and their contents are kept.
    pub fn ensure_build_dirs(&self, build: &Path) -> Result<(), ConfigError> {
        fs::create_dir_all(build).map_err(|err| ConfigError::Io(build.to_path_buf(), err))?;
        for name in &self.bundle_names {
            let dir = build.join(name);
            fs::create_dir_all(&dir).map_err(|err| ConfigError::Io(dir, err))?;
        }
        Ok(())
    }
}

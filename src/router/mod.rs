//! Request routing for bundle artifacts.
//!
//! The [`Bundler`] decides, for one incoming request, whether it targets a
//! bundle artifact and whether a build cycle must run before it is served:
//!
//! ```text
//! GET /app/script.js
//!   │
//!   ├─ not GET/HEAD, extension not handled,
//!   │  unknown bundle, malformed path ───────────────► Pass
//!   │
//!   ├─ <build>/app/script.js exists, not forced ─────► Asset (no build)
//!   │
//!   └─ build cycle (shared with concurrent callers)
//!        ├─ failed ──────────────────────────────────► HandleError::Build
//!        ├─ target still missing ────────────────────► Pass
//!        └─ target present ──────────────────────────► Asset / Static
//! ```
//!
//! Routing knows nothing about HTTP servers; the `serve` command maps
//! [`Outcome`] onto responses.

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{fs, io};
use thiserror::Error;

use crate::build::{BuildError, Builder, SharedResult};
use crate::config::{BundlerOptions, ConfigError};
use crate::debug;
use crate::manifest::Manifest;
use crate::resolver::Resolve;
use crate::utils::mime::types;

/// How a request should be answered.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// A compiled script or stylesheet, read into memory.
    Asset {
        body: Vec<u8>,
        content_type: &'static str,
    },
    /// Any other file under the build root; sent by the generic file sender.
    Static(PathBuf),
    /// Not ours; the next handler decides.
    Pass,
}

#[derive(Debug, Error)]
pub enum HandleError {
    #[error(transparent)]
    Build(Arc<BuildError>),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Bundle request handler for one boot manifest.
pub struct Bundler {
    builder: Builder,
}

impl Bundler {
    /// Load the boot manifest and prepare the build directories.
    pub fn new(options: Arc<BundlerOptions>, resolver: Box<dyn Resolve>) -> Result<Self, ConfigError> {
        let manifest = Manifest::load(&options.boot)?;
        Self::with_manifest(options, manifest, resolver)
    }

    pub fn with_manifest(
        options: Arc<BundlerOptions>,
        manifest: Manifest,
        resolver: Box<dyn Resolve>,
    ) -> Result<Self, ConfigError> {
        manifest.ensure_build_dirs(&options.build)?;
        debug!(
            "bundle";
            "{}: bundles [{}], {} remote dependencies",
            manifest.path.display(),
            manifest.bundle_names().join(", "),
            manifest.dependencies.len()
        );
        Ok(Self {
            builder: Builder::new(options, manifest, resolver)?,
        })
    }

    pub fn options(&self) -> &BundlerOptions {
        self.builder.options()
    }

    pub fn manifest(&self) -> &Manifest {
        self.builder.manifest()
    }

    /// Build cycles started so far.
    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.builder.generation()
    }

    #[cfg(test)]
    fn waiters(&self) -> usize {
        self.builder.waiters()
    }

    /// Run one build cycle unconditionally.
    pub fn build(&self) -> SharedResult {
        self.builder.build()
    }

    /// Route one request.
    ///
    /// `url` is the raw request target; it may carry a query string and
    /// percent-encoded segments.
    pub fn handle(&self, method: &str, url: &str) -> Result<Outcome, HandleError> {
        let Some(target) = self.target(method, url) else {
            debug!("bundle"; "pass: {} {}", method, url);
            return Ok(Outcome::Pass);
        };

        if target.is_file() && !self.options().force {
            debug!("bundle"; "fresh: {}", target.display());
            return serve(target);
        }

        self.builder.build().map_err(HandleError::Build)?;

        if !target.is_file() {
            debug!("bundle"; "not produced: {}", target.display());
            return Ok(Outcome::Pass);
        }
        serve(target)
    }

    /// Map a request onto a file under the build root, if the bundler owns it.
    fn target(&self, method: &str, url: &str) -> Option<PathBuf> {
        if method != "GET" && method != "HEAD" {
            return None;
        }

        let path = url.split(['?', '#']).next().unwrap_or(url);
        let path = percent_decode_str(path).decode_utf8().ok()?;
        if !self.options().extensions.is_match(&path) {
            return None;
        }

        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        if segments.len() < 2
            || segments
                .iter()
                .any(|s| s.is_empty() || *s == "." || *s == ".." || s.contains('\\'))
        {
            return None;
        }
        if !self.manifest().is_bundle(segments[0]) {
            return None;
        }

        Some(segments.iter().fold(self.options().build.clone(), |dir, s| dir.join(s)))
    }
}

fn serve(target: PathBuf) -> Result<Outcome, HandleError> {
    let content_type = match target.extension().and_then(|e| e.to_str()) {
        Some("js") => types::JAVASCRIPT,
        Some("css") => types::CSS,
        _ => return Ok(Outcome::Static(target)),
    };
    let body = read(&target)?;
    Ok(Outcome::Asset { body, content_type })
}

fn read(path: &Path) -> Result<Vec<u8>, HandleError> {
    fs::read(path).map_err(|source| HandleError::Read {
        path: path.to_path_buf(),
        source,
    })
}

//! Build cycle.
//!
//! One cycle: resolve the graph, partition it into bundles, then for every
//! bundle (in parallel) run three independent chains:
//!
//! ```text
//! scripts:  compile ─► minify-js ──────────────► write script.js
//! styles:   compile ─► autoprefix ─► minify-css ► write styles.css
//! files:    copy into <build>/<bundle>/<id>/...
//! ```
//!
//! Every chain runs to completion or failure on its own; the first failure
//! (manifest order, then scripts / styles / files) is reported once all
//! bundles are done. Artifacts written before a failure are kept.
//!
//! Cycles run on the builder's own rayon pool, entered from a plain scoped
//! thread. A caller that is itself a rayon worker (of any pool) therefore
//! blocks without stealing work while it waits, so it can never pick up a
//! job that needs the gate it holds.

mod gate;

pub use gate::{BuildGate, SharedResult};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use std::{panic, thread};
use thiserror::Error;

use crate::artifact::{ArtifactChange, SCRIPT_FILE, STYLES_FILE, write_artifact};
use crate::bundle::partition;
use crate::compiler::{CompileError, Compiler, CompilerOptions};
use crate::config::BundlerOptions;
use crate::manifest::Manifest;
use crate::postprocess::{postprocess_script, postprocess_style};
use crate::resolver::{Component, Resolve, ResolveError, ResolveOptions};
use crate::{debug, log};

/// Build cycle errors.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("bundle `{bundle}` failed at {stage}: {message}")]
    Stage {
        bundle: String,
        stage: &'static str,
        message: String,
    },

    #[error("build cycle aborted")]
    Aborted,
}

impl BuildError {
    fn stage(bundle: &str, err: CompileError) -> Self {
        Self::Stage {
            bundle: bundle.to_string(),
            stage: err.stage,
            message: err.message,
        }
    }
}

/// What one bundle's build changed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleReport {
    pub name: String,
    pub script: ArtifactChange,
    pub styles: ArtifactChange,
    /// Static files copied.
    pub files: usize,
}

impl BundleReport {
    fn changed(&self) -> bool {
        self.script != ArtifactChange::Unchanged || self.styles != ArtifactChange::Unchanged
    }
}

/// Runs build cycles for one boot manifest.
pub struct Builder {
    options: Arc<BundlerOptions>,
    manifest: Manifest,
    resolver: Box<dyn Resolve>,
    compiler: Compiler,
    gate: BuildGate,
    pool: ThreadPool,
}

impl Builder {
    pub fn new(
        options: Arc<BundlerOptions>,
        manifest: Manifest,
        resolver: Box<dyn Resolve>,
    ) -> Result<Self, ThreadPoolBuildError> {
        let compiler = Compiler::new(&CompilerOptions {
            parse_js: options.parse_js,
            prefix: options.prefix.clone(),
        });
        let pool = ThreadPoolBuilder::new()
            .thread_name(|i| format!("sheaf-build-{i}"))
            .build()?;
        Ok(Self {
            options,
            manifest,
            resolver,
            compiler,
            gate: BuildGate::new(),
            pool,
        })
    }

    pub fn options(&self) -> &BundlerOptions {
        &self.options
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Cycles started so far.
    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.gate.generation()
    }

    /// Callers currently waiting on the in-flight cycle.
    #[cfg(test)]
    pub fn waiters(&self) -> usize {
        self.gate.waiters()
    }

    /// Run a build cycle, or join the one already in flight.
    pub fn build(&self) -> SharedResult {
        self.gate.run(|generation| self.run_cycle(generation))
    }

    fn run_cycle(&self, generation: u64) -> Result<(), BuildError> {
        let started = Instant::now();
        debug!("build"; "cycle #{} started", generation);

        let result = self.build_isolated();
        let elapsed = started.elapsed().as_millis();
        match &result {
            Ok(reports) => {
                for report in reports.iter().filter(|r| r.changed()) {
                    log!(
                        "bundle";
                        "{}: script {}, styles {}, {} files",
                        report.name, report.script, report.styles, report.files
                    );
                }
                log!("build"; "cycle #{} finished in {}ms", generation, elapsed);
            }
            Err(err) => {
                crate::logger::log_failure(
                    "error",
                    &format!("cycle #{generation} failed after {elapsed}ms"),
                    &err.to_string(),
                );
            }
        }
        result.map(drop)
    }

    /// Run [`Self::build_all`] on the build pool and block until it is done.
    fn build_isolated(&self) -> Result<Vec<BundleReport>, BuildError> {
        thread::scope(|scope| {
            scope
                .spawn(|| self.pool.install(|| self.build_all()))
                .join()
                .unwrap_or_else(|payload| panic::resume_unwind(payload))
        })
    }

    fn build_all(&self) -> Result<Vec<BundleReport>, BuildError> {
        let resolve_options = ResolveOptions {
            remotes: self.options.remotes.clone(),
            install: self.options.install,
        };
        let graph = self.resolver.resolve(&self.options.boot, &resolve_options)?;
        let bundles = partition(&graph, self.manifest.bundle_names());
        let main = self.manifest.main_bundle();

        let jobs: Vec<_> = bundles.iter().collect();
        let results: Vec<_> = jobs
            .par_iter()
            .map(|(name, components)| self.build_bundle(name, components, name.as_str() == main))
            .collect();

        results.into_iter().collect()
    }

    fn build_bundle(
        &self,
        name: &str,
        components: &[&Component],
        is_main: bool,
    ) -> Result<BundleReport, BuildError> {
        let root = self.options.build.join(name);

        let (script, (styles, files)) = rayon::join(
            || self.script_chain(&root, components, is_main),
            || {
                rayon::join(
                    || self.style_chain(&root, components),
                    || self.compiler.files(components, &root),
                )
            },
        );

        Ok(BundleReport {
            name: name.to_string(),
            script: script.map_err(|err| BuildError::stage(name, err))?,
            styles: styles.map_err(|err| BuildError::stage(name, err))?,
            files: files.map_err(|err| BuildError::stage(name, err))?.len(),
        })
    }

    fn script_chain(
        &self,
        root: &Path,
        components: &[&Component],
        is_main: bool,
    ) -> Result<ArtifactChange, CompileError> {
        let text = self.compiler.scripts(components, is_main)?;
        let text = postprocess_script(text, self.options.uglifyjs.as_ref())?;
        write(root, SCRIPT_FILE, text.as_deref(), "write-script")
    }

    fn style_chain(
        &self,
        root: &Path,
        components: &[&Component],
    ) -> Result<ArtifactChange, CompileError> {
        let text = self.compiler.styles(components)?;
        let text = postprocess_style(text, self.options.autoprefix, self.options.cleancss.as_ref())?;
        write(root, STYLES_FILE, text.as_deref(), "write-styles")
    }
}

fn write(
    root: &Path,
    filename: &str,
    content: Option<&str>,
    stage: &'static str,
) -> Result<ArtifactChange, CompileError> {
    write_artifact(root, filename, content).map_err(|err| CompileError {
        stage,
        message: format!("{}: {err}", root.join(filename).display()),
    })
}

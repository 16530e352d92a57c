//! One-shot build.

use anyhow::{Result, bail};
use std::time::Instant;

use crate::log;
use crate::router::Bundler;

/// Run a single build cycle regardless of existing artifacts.
pub fn build_once(bundler: &Bundler) -> Result<()> {
    let started = Instant::now();
    if let Err(err) = bundler.build() {
        bail!("build failed: {err}");
    }

    let manifest = bundler.manifest();
    log!(
        "build";
        "{} bundles into {} in {}ms",
        manifest.bundle_names().len(),
        bundler.options().build.display(),
        started.elapsed().as_millis()
    );
    Ok(())
}

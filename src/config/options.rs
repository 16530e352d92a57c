//! Validated bundler options.
//!
//! [`BundlerOptions`] is built once from [`BundlerConfig`] after all
//! validation passed, then shared read-only (`Arc`) for the process lifetime.

use lightningcss::targets::Targets;
use regex::Regex;
use std::path::PathBuf;

use super::section::{CssMinifyOptions, JsMinifyOptions};
#[cfg(test)]
use {super::section::DEFAULT_EXTENSIONS, std::sync::LazyLock};

#[cfg(test)]
static DEFAULT_EXTENSIONS_RE: LazyLock<Regex> =
    LazyLock::new(|| extensions_regex(DEFAULT_EXTENSIONS).unwrap());

/// Compile an `a|b|c` extension list into a path-suffix matcher.
pub fn extensions_regex(extensions: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"\.({extensions})$"))
}

#[derive(Debug, Clone)]
pub struct BundlerOptions {
    /// Absolute boot directory.
    pub boot: PathBuf,
    /// Absolute build root.
    pub build: PathBuf,
    pub force: bool,
    /// Matches request paths the bundler handles.
    pub extensions: Regex,
    pub prefix: String,
    pub remotes: Vec<PathBuf>,
    pub install: bool,
    pub parse_js: bool,
    pub uglifyjs: Option<JsMinifyOptions>,
    /// Prefixing targets, resolved from browserslist queries.
    pub autoprefix: Option<Targets>,
    pub cleancss: Option<CssMinifyOptions>,
}

#[cfg(test)]
impl BundlerOptions {
    /// Defaults for a boot/build pair: no forcing, no post-processing.
    pub fn new(boot: impl Into<PathBuf>, build: impl Into<PathBuf>) -> Self {
        Self {
            boot: boot.into(),
            build: build.into(),
            force: false,
            extensions: DEFAULT_EXTENSIONS_RE.clone(),
            prefix: String::new(),
            remotes: Vec::new(),
            install: true,
            parse_js: false,
            uglifyjs: None,
            autoprefix: None,
            cleancss: None,
        }
    }
}

//! `[bundler]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [bundler]
//! boot = "client/boot"            # Directory holding the boot component.json
//! build = "build"                 # Output root, one directory per bundle
//! force = false                   # Rebuild on every matching request
//! extensions = "js|json|css|woff|eot|svg|ttf"
//! prefix = "/build"               # Prefix for rewritten stylesheet urls
//! remotes = ["vendor/mirror"]     # Mirrors for remote components
//! install = true                  # Install missing remotes from mirrors
//! parse_js = false                # Syntax-check scripts while compiling
//! uglifyjs = true                 # or { mangle = true, compress = true }
//! autoprefix = { browsers = ["last 2 versions"] }
//! cleancss = false                # or { unused_symbols = ["debug"] }
//! ```

use serde::Deserialize;
use std::path::PathBuf;

/// Default extensions served by the bundler.
pub const DEFAULT_EXTENSIONS: &str = "js|json|css|woff|eot|svg|ttf";

/// Bundler settings as written in `sheaf.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BundlerConfig {
    /// Boot directory; may also be given on the command line.
    pub boot: Option<PathBuf>,

    /// Build root, relative to the config directory.
    pub build: PathBuf,

    /// Always rebuild before serving.
    pub force: bool,

    /// `|`-separated file extensions handled by the bundler.
    pub extensions: String,

    /// Prefix for rewritten `url(...)` references in stylesheets.
    pub prefix: String,

    /// Directories searched for remote components that are not installed.
    pub remotes: Vec<PathBuf>,

    /// Install missing remote components from `remotes`.
    pub install: bool,

    /// Syntax-check every script while compiling.
    pub parse_js: bool,

    /// Script minification.
    pub uglifyjs: Toggle<JsMinifyOptions>,

    /// Vendor prefixing for stylesheets.
    pub autoprefix: Toggle<AutoprefixOptions>,

    /// Stylesheet minification.
    pub cleancss: Toggle<CssMinifyOptions>,
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            boot: None,
            build: PathBuf::from("build"),
            force: false,
            extensions: DEFAULT_EXTENSIONS.to_string(),
            prefix: String::new(),
            remotes: Vec::new(),
            install: true,
            parse_js: false,
            uglifyjs: Toggle::default(),
            autoprefix: Toggle::default(),
            cleancss: Toggle::default(),
        }
    }
}

/// A post-processor switch: `true` / `false`, or an options table
/// (which implies enabled).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Toggle<T> {
    Bool(bool),
    Options(T),
}

impl<T> Default for Toggle<T> {
    fn default() -> Self {
        Self::Bool(false)
    }
}

impl<T: Clone + Default> Toggle<T> {
    /// Options to run with, `None` when disabled.
    pub fn resolve(&self) -> Option<T> {
        match self {
            Self::Bool(false) => None,
            Self::Bool(true) => Some(T::default()),
            Self::Options(options) => Some(options.clone()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Bool(false))
    }
}

/// `uglifyjs = { ... }`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JsMinifyOptions {
    /// Shorten local names.
    pub mangle: bool,
    /// Apply compressing transforms.
    pub compress: bool,
}

impl Default for JsMinifyOptions {
    fn default() -> Self {
        Self {
            mangle: true,
            compress: true,
        }
    }
}

/// `autoprefix = { ... }`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutoprefixOptions {
    /// browserslist queries.
    pub browsers: Vec<String>,
}

impl Default for AutoprefixOptions {
    fn default() -> Self {
        Self {
            browsers: vec!["defaults".to_string()],
        }
    }
}

/// `cleancss = { ... }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CssMinifyOptions {
    /// Class names, ids and keyframes to drop.
    pub unused_symbols: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_bundler_defaults() {
        let config = test_parse_config("");
        let bundler = config.bundler;

        assert_eq!(bundler.boot, None);
        assert_eq!(bundler.build, PathBuf::from("build"));
        assert!(!bundler.force);
        assert_eq!(bundler.extensions, DEFAULT_EXTENSIONS);
        assert!(bundler.install);
        assert_eq!(bundler.uglifyjs.resolve(), None);
        assert_eq!(bundler.autoprefix.resolve(), None);
        assert_eq!(bundler.cleancss.resolve(), None);
    }

    #[test]
    fn test_toggle_bool_and_table() {
        let config = test_parse_config(
            "[bundler]\nuglifyjs = true\nautoprefix = { browsers = [\"ie 11\"] }\ncleancss = false",
        );
        let bundler = config.bundler;

        assert_eq!(bundler.uglifyjs.resolve(), Some(JsMinifyOptions::default()));
        assert_eq!(
            bundler.autoprefix.resolve(),
            Some(AutoprefixOptions {
                browsers: vec!["ie 11".into()]
            })
        );
        assert!(!bundler.cleancss.is_enabled());
    }

    #[test]
    fn test_partial_options_table() {
        let config = test_parse_config("[bundler.uglifyjs]\nmangle = false");
        assert_eq!(
            config.bundler.uglifyjs.resolve(),
            Some(JsMinifyOptions {
                mangle: false,
                compress: true,
            })
        );
    }

    #[test]
    fn test_invalid_toggle_shapes_rejected() {
        for bad in [
            "[bundler]\nuglifyjs = \"yes\"",
            "[bundler]\ncleancss = 1",
            "[bundler]\nuglifyjs = { mangel = true }",
        ] {
            let result = crate::config::SheafConfig::from_str(bad);
            assert!(result.is_err(), "accepted: {bad}");
        }
    }
}

//! Configuration management for `sheaf.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── bundler    # [bundler]
//! │   └── serve      # [serve]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   └── field      # FieldPath
//! ├── options.rs     # Validated BundlerOptions
//! └── mod.rs         # SheafConfig (this file)
//! ```
//!
//! The config file is optional: without one, every value comes from the
//! defaults and the command line. Relative paths in the file are resolved
//! against the file's directory; paths given on the command line against
//! the current directory.

mod options;
pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use options::{BundlerOptions, extensions_regex};
pub use section::{
    BundlerConfig, CssMinifyOptions, JsMinifyOptions, ServeConfig, Toggle,
};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::{
    cli::{BuildArgs, Cli, Commands, DEFAULT_CONFIG},
    debug,
    postprocess::browser_targets,
    utils::path::normalize_path,
};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing sheaf.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SheafConfig {
    /// Absolute path to the config file, existing or not (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory relative file paths resolve against (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Bundler settings
    pub bundler: BundlerConfig,

    /// HTTP server settings
    pub serve: ServeConfig,
}

impl SheafConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. A missing default
    /// config is fine; a missing explicitly named one is an error.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let (config_path, exists) = match find_config_file(&cli.config) {
            Some(path) => (path, true),
            None => (cwd.join(&cli.config), false),
        };

        if !exists && cli.config != Path::new(DEFAULT_CONFIG) {
            bail!("Config file '{}' not found", cli.config.display());
        }

        let mut config = if exists {
            debug!("config"; "loading {}", config_path.display());
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };

        config.root = config_path
            .parent()
            .filter(|_| exists)
            .map_or_else(|| cwd.clone(), Path::to_path_buf);
        config.config_path = config_path;
        config.finalize(cli, &cwd);

        Ok(config)
    }

    /// Parse configuration from TOML string, rejecting unknown fields.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let (config, ignored) = Self::parse_with_ignored(content)?;
        if ignored.is_empty() {
            return Ok(config);
        }

        let mut diag = ConfigDiagnostics::new();
        for field in ignored {
            diag.error_with_hint(
                FieldPath::from(field),
                "unknown field",
                "remove it or check the spelling",
            );
        }
        Err(ConfigError::Diagnostics(diag))
    }

    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Resolve file paths, then apply command line overrides.
    fn finalize(&mut self, cli: &Cli, cwd: &Path) {
        self.normalize_paths();
        self.apply_command_options(cli, cwd);
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    fn apply_command_options(&mut self, cli: &Cli, cwd: &Path) {
        crate::logger::set_verbose(cli.verbose);

        match &cli.command {
            Commands::Build { build_args } => {
                self.apply_build_args(build_args, cwd);
            }
            Commands::Serve {
                build_args,
                interface,
                port,
            } => {
                self.apply_build_args(build_args, cwd);
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
            }
        }
    }

    fn apply_build_args(&mut self, args: &BuildArgs, cwd: &Path) {
        if let Some(boot) = &args.boot {
            self.bundler.boot = Some(normalize_path(&cwd.join(boot)));
        }
        if let Some(build) = &args.build {
            self.bundler.build = normalize_path(&cwd.join(build));
        }
        Self::update_option(&mut self.bundler.force, args.force.as_ref());

        // --minify toggles both minifiers, keeping configured options tables
        match args.minify {
            Some(true) => {
                if !self.bundler.uglifyjs.is_enabled() {
                    self.bundler.uglifyjs = Toggle::Bool(true);
                }
                if !self.bundler.cleancss.is_enabled() {
                    self.bundler.cleancss = Toggle::Bool(true);
                }
            }
            Some(false) => {
                self.bundler.uglifyjs = Toggle::Bool(false);
                self.bundler.cleancss = Toggle::Bool(false);
            }
            None => {}
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Normalize all file paths relative to the root directory.
    fn normalize_paths(&mut self) {
        let root = normalize_path(&self.root);
        let resolve = |path: &Path| normalize_path(&root.join(path));

        self.bundler.boot = self.bundler.boot.as_deref().map(resolve);
        self.bundler.build = resolve(&self.bundler.build);
        self.bundler.remotes = self.bundler.remotes.iter().map(|p| resolve(p)).collect();
        self.serve.fallback = self.serve.fallback.iter().map(|p| resolve(p)).collect();
        self.root = root;
    }

    /// Static roots for the server, defaulting to build dir then cwd.
    pub fn fallback_roots(&self) -> Vec<PathBuf> {
        if !self.serve.fallback.is_empty() {
            return self.serve.fallback.clone();
        }
        let mut roots = vec![self.bundler.build.clone()];
        if let Ok(cwd) = std::env::current_dir() {
            roots.push(cwd);
        }
        roots
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate every section and build the immutable bundler options.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<BundlerOptions, ConfigError> {
        let mut diag = ConfigDiagnostics::new();
        let bundler = &self.bundler;

        let boot = match &bundler.boot {
            None => {
                diag.error_with_hint(
                    FieldPath::new("bundler.boot"),
                    "boot directory is required",
                    "pass it as the BOOT argument or set `boot` in [bundler]",
                );
                None
            }
            Some(boot) if !boot.is_dir() => {
                diag.error(
                    FieldPath::new("bundler.boot"),
                    format!("`{}` is not a directory", boot.display()),
                );
                None
            }
            Some(boot) => Some(boot.clone()),
        };

        let extensions = if bundler.extensions.trim().is_empty() {
            diag.error(FieldPath::new("bundler.extensions"), "must not be empty");
            None
        } else {
            extensions_regex(&bundler.extensions)
                .map_err(|err| {
                    diag.error_with_hint(
                        FieldPath::new("bundler.extensions"),
                        format!("invalid extension pattern: {err}"),
                        "use a `|`-separated list such as \"js|css|png\"",
                    );
                })
                .ok()
        };

        let autoprefix = match bundler.autoprefix.resolve() {
            None => None,
            Some(options) if options.browsers.is_empty() => {
                diag.error(
                    FieldPath::new("bundler.autoprefix.browsers"),
                    "at least one browserslist query is required",
                );
                None
            }
            Some(options) => browser_targets(&options.browsers)
                .map_err(|err| {
                    diag.error(
                        FieldPath::new("bundler.autoprefix.browsers"),
                        format!("invalid browserslist query: {err}"),
                    );
                })
                .ok(),
        };

        for remote in &bundler.remotes {
            if !remote.is_dir() {
                diag.error(
                    FieldPath::new("bundler.remotes"),
                    format!("`{}` is not a directory", remote.display()),
                );
            }
        }

        if self.serve.threads == 0 {
            diag.error_with_hint(
                FieldPath::new("serve.threads"),
                "must be at least 1",
                "the default is 4",
            );
        }

        diag.into_result().map_err(ConfigError::Diagnostics)?;

        // All values were checked above.
        let (Some(boot), Some(extensions)) = (boot, extensions) else {
            return Err(ConfigError::Validation("incomplete bundler options".into()));
        };

        Ok(BundlerOptions {
            boot,
            build: bundler.build.clone(),
            force: bundler.force,
            extensions,
            prefix: bundler.prefix.clone(),
            remotes: bundler.remotes.clone(),
            install: bundler.install,
            parse_js: bundler.parse_js,
            uglifyjs: bundler.uglifyjs.resolve(),
            autoprefix,
            cleancss: bundler.cleancss.resolve(),
        })
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SheafConfig {
    let (parsed, ignored) = SheafConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Default config file name.
pub const DEFAULT_CONFIG: &str = "sheaf.toml";

/// On-demand component bundler
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: sheaf.toml, optional)
    #[arg(short = 'C', long, global = true, default_value = DEFAULT_CONFIG, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve bundles, building them on first request
    #[command(visible_alias = "s")]
    Serve {
        #[command(flatten)]
        build_args: BuildArgs,

        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run one full build cycle and exit
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },
}

/// Shared arguments for Build and Serve commands
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Boot directory holding the root component.json
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub boot: Option<PathBuf>,

    /// Build output directory
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub build: Option<PathBuf>,

    /// Rebuild before every matching request
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub force: Option<bool>,

    /// Minify scripts and stylesheets
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from([
            "sheaf", "serve", "client/boot", "-p", "8080", "--force", "-m=false",
        ])
        .unwrap();

        let Commands::Serve { build_args, port, interface } = &cli.command else {
            unreachable!()
        };
        assert_eq!(build_args.boot, Some(PathBuf::from("client/boot")));
        assert_eq!(*port, Some(8080));
        assert_eq!(*interface, None);
        assert_eq!(build_args.force, Some(true));
        assert_eq!(build_args.minify, Some(false));
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG));
    }

    #[test]
    fn test_parse_build_with_globals() {
        let cli = Cli::try_parse_from(["sheaf", "build", "-b", "out", "-V", "-C", "cfg.toml"]).unwrap();

        let Commands::Build { build_args } = &cli.command else {
            panic!("expected build command");
        };
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("cfg.toml"));
        assert_eq!(build_args.build, Some(PathBuf::from("out")));
        assert_eq!(build_args.boot, None);
        assert_eq!(build_args.force, None);
    }
}

//! Sheaf - an on-demand component bundler.

mod artifact;
mod build;
mod bundle;
mod cli;
mod compiler;
mod config;
mod core;
mod embed;
mod logger;
mod manifest;
mod postprocess;
mod resolver;
mod router;
mod utils;

#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::SheafConfig;
use resolver::LocalResolver;
use router::Bundler;
use std::sync::Arc;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = SheafConfig::load(cli)?;
    let options = Arc::new(config.validate()?);
    let bundler = Bundler::new(options, Box::new(LocalResolver))?;

    match &cli.command {
        Commands::Build { .. } => cli::build::build_once(&bundler),
        Commands::Serve { .. } => {
            let server = cli::serve::bind_server(&config.serve)?;
            server.run(bundler, config.fallback_roots())
        }
    }
}

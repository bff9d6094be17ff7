// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! The subcommands mirror the one-shot build steps; running without a
//! subcommand starts the full development workflow.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `sitewatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitewatch",
    version,
    about = "Compile site assets, build with the site generator, serve and live-reload.",
    long_about = None
)]
pub struct CliArgs {
    /// Step to run. Defaults to `dev` (build everything, serve, watch).
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to the config file (TOML).
    ///
    /// If omitted, `Sitewatch.toml` in the current working directory is used
    /// when it exists; otherwise built-in defaults apply.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEWATCH_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the resolved configuration and watch table, run nothing.
    #[arg(long, global = true)]
    pub dry_run: bool,
}

/// Pipeline steps exposed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Compile scripts and styles, build the site, serve it and watch sources.
    Dev,
    /// Compile stylesheets once.
    #[command(visible_alias = "sass")]
    Styles,
    /// Concatenate and minify scripts once.
    #[command(visible_alias = "js")]
    Scripts,
    /// Copy images once.
    #[command(visible_alias = "imagemin")]
    Images,
    /// Run the site generator once; the exit code mirrors the generator's.
    #[command(name = "site-build", visible_alias = "jekyll-build")]
    SiteBuild,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

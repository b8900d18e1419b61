// src/cli.rs

use clap::{Parser, Subcommand, ValueEnum};

/// Dependency-driven workflow engine.
#[derive(Debug, Parser)]
#[command(name = "dagwheel", version, about)]
pub struct CliArgs {
    /// Path to the TOML config file.
    #[arg(short, long, global = true, default_value = "Dagwheel.toml")]
    pub config: String,

    /// Override the log level (otherwise DAGWHEEL_LOG, then info).
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Print the resolved configuration and exit.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Recover stored state and drive the scheduler.
    Run {
        /// Exit once no elements are left.
        #[arg(long)]
        once: bool,
    },
    /// Run a small built-in workflow to completion.
    Demo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}

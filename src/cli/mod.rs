//! CLI module for Edge Console
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `run` - Start the interactive console
//! - `health` - Probe the backend once and show system info
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Start the console against the default backend
//! edge-console run
//!
//! # Check a backend on another machine
//! edge-console health -H 192.168.1.20 --json
//!
//! # Generate shell completions
//! edge-console completions bash > ~/.bash_completion.d/edge-console
//! ```

pub mod completions;
pub mod config;
pub mod health;
pub mod output;
pub mod repl;
pub mod run;

pub use completions::handle_completions;
pub use config::handle_config_init;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Edge Console - operator console for an edge ML pipeline
#[derive(Parser, Debug)]
#[command(
    name = "edge-console",
    version,
    about = "Operator console for training and deploying edge ML models"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the interactive console
    Run(RunArgs),
    /// Probe the backend and show system info
    Health(HealthArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Backend location overrides shared by commands that talk to the backend.
#[derive(Args, Debug, Clone, Default)]
pub struct BackendArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "edge-console.toml")]
    pub config: PathBuf,

    /// Override backend port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override backend host
    #[arg(short = 'H', long)]
    pub host: Option<String>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub backend: BackendArgs,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Disable the backend heartbeat
    #[arg(long)]
    pub no_health_check: bool,
}

#[derive(Args, Debug)]
pub struct HealthArgs {
    #[command(flatten)]
    pub backend: BackendArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "edge-console.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

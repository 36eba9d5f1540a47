//! CLI definition and command handling

pub mod commands;
pub mod output;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::debug;

use cratebump_core::{load_config, load_config_or_default, Config};

use commands::{BumpCommand, CompletionsCommand, GraphCommand, InitCommand};

/// cratebump - bump and propagate versions across a Cargo workspace
#[derive(Debug, Parser)]
#[command(name = "cratebump")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    /// Configuration file (searched upward from the working directory by default)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Bump package versions and rewrite the manifests that pin them
    Bump(BumpCommand),

    /// Show the processing order and flattened local dependencies
    Graph(GraphCommand),

    /// Write a default configuration file
    Init(InitCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(&self) -> anyhow::Result<()> {
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match &self.command {
            Commands::Bump(cmd) => cmd.execute(self),
            Commands::Graph(cmd) => cmd.execute(self),
            Commands::Init(cmd) => cmd.execute(self),
            Commands::Completions(cmd) => cmd.execute(self),
        }
    }

    /// Load the explicit configuration file, or search from `cwd`
    pub fn load_config(&self, cwd: &Path) -> anyhow::Result<Config> {
        let (config, path) = match &self.config {
            Some(path) => (load_config(path)?, Some(path.clone())),
            None => load_config_or_default(cwd)?,
        };
        debug!(config = ?path, "configuration loaded");
        Ok(config)
    }
}

//! Init command

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use cratebump_core::config::defaults::{DEFAULT_CONFIG_TEMPLATE, DEFAULT_CONFIG_TOML};

use crate::cli::output;
use crate::cli::Cli;

/// Write a default configuration file
#[derive(Debug, Args)]
pub struct InitCommand {
    /// Overwrite an existing configuration
    #[arg(short, long)]
    pub force: bool,

    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl InitCommand {
    /// Execute the init command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(force = self.force, "executing init command");
        let cwd = std::env::current_dir()?;
        let config_path = self.write_template(&cwd)?;

        if !cli.quiet {
            output::success(&format!(
                "Configuration written to {}",
                output::path_style().apply_to(config_path.display())
            ));
        }
        Ok(())
    }

    fn write_template(&self, cwd: &std::path::Path) -> anyhow::Result<PathBuf> {
        let config_path = self
            .output
            .clone()
            .unwrap_or_else(|| cwd.join(DEFAULT_CONFIG_TOML));

        if config_path.exists() && !self.force {
            anyhow::bail!(
                "Configuration file already exists at {}. Use --force to overwrite.",
                config_path.display()
            );
        }

        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;
        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cratebump_core::{load_config, Config};
    use tempfile::TempDir;

    #[test]
    fn test_template_loads_as_defaults() {
        let temp = TempDir::new().unwrap();
        let cmd = InitCommand {
            force: false,
            output: None,
        };
        let path = cmd.write_template(temp.path()).unwrap();
        assert_eq!(path, temp.path().join("cratebump.toml"));
        assert_eq!(load_config(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_existing_file_needs_force() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cratebump.toml");
        std::fs::write(&path, "# mine\n").unwrap();

        let cmd = InitCommand {
            force: false,
            output: Some(path.clone()),
        };
        assert!(cmd.write_template(temp.path()).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine\n");

        let cmd = InitCommand {
            force: true,
            output: Some(path.clone()),
        };
        cmd.write_template(temp.path()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG_TEMPLATE);
    }
}

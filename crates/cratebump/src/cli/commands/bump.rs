//! Bump command

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use cratebump_core::config::validate_config;
use cratebump_core::workflow::BumpResult;
use cratebump_core::{BumpOptions, BumpWorkflow, CargoMetadata, Config, ReportSink};

use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Bump package versions and rewrite the manifests that pin them
#[derive(Debug, Args)]
pub struct BumpCommand {
    /// A directive for the only package (`none`, `patch`, `minor`, `major`
    /// or a version), or a JSON object mapping package names to directives
    pub argument: String,

    /// Compute every change without writing manifests
    #[arg(long)]
    pub dry_run: bool,

    /// Append records to this file instead of printing them
    #[arg(long, env = "GITHUB_OUTPUT")]
    pub github_output: Option<PathBuf>,

    /// Seconds to wait for `cargo metadata`
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Let cargo access the network during discovery
    #[arg(long)]
    pub online: bool,

    /// Root manifest of the workspace
    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

impl BumpCommand {
    /// Execute the bump command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(argument = %self.argument, dry_run = self.dry_run, "executing bump command");
        let cwd = std::env::current_dir()?;
        let mut config = cli.load_config(&cwd)?;
        self.apply_overrides(&mut config);

        validate_config(&config)?;

        let source = CargoMetadata::from_config(&config.discovery, &cwd);
        let options = BumpOptions::from_config(&config).dry_run(self.dry_run);
        let result = BumpWorkflow::new(source, options).run(&self.argument)?;

        if let Some(path) = &self.github_output {
            ReportSink::GithubOutput(path.clone()).write(&result.report)?;
        }

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&result.report)?);
            }
            OutputFormat::Text => {
                if self.github_output.is_none() {
                    ReportSink::Stdout.write(&result.report)?;
                }
                if !cli.quiet {
                    self.print_summary(&result);
                }
            }
        }

        Ok(())
    }

    /// Fold command-line flags into the loaded configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(timeout) = self.timeout {
            config.discovery.timeout_secs = timeout;
        }
        if self.online {
            config.discovery.offline = false;
        }
        if let Some(path) = &self.manifest_path {
            config.discovery.manifest_path = Some(path.clone());
        }
    }

    fn print_summary(&self, result: &BumpResult) {
        if result.outcome.is_empty() {
            output::info("No package versions changed");
            return;
        }

        let title = if self.dry_run {
            "Version bump (dry run)"
        } else {
            "Version bump"
        };
        eprintln!("{}", output::header(title));
        eprintln!();
        for (name, version) in &result.outcome.updated {
            eprintln!(
                "{}",
                output::key_value(
                    &output::package_style().apply_to(name).to_string(),
                    &output::version_style().apply_to(version).to_string(),
                )
            );
        }
        eprintln!();
        for path in &result.report.updated_paths {
            eprintln!("  {}", output::path_style().apply_to(path.display()));
        }
        eprintln!();

        if self.dry_run {
            output::warning("Dry run: no manifests were written");
        } else {
            output::success(&format!(
                "Updated {} manifest(s)",
                result.report.updated_paths.len()
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::Commands;

    fn parse(args: &[&str]) -> BumpCommand {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Bump(cmd) => cmd,
            other => panic!("expected bump, got {:?}", other),
        }
    }

    #[test]
    fn test_batch_argument_is_kept_verbatim() {
        let cmd = parse(&["cratebump", "bump", r#"{"a": "minor", "b": null}"#, "--dry-run"]);
        assert_eq!(cmd.argument, r#"{"a": "minor", "b": null}"#);
        assert!(cmd.dry_run);
    }

    #[test]
    fn test_flags_override_config() {
        let cmd = parse(&[
            "cratebump",
            "bump",
            "patch",
            "--timeout",
            "5",
            "--online",
            "--manifest-path",
            "ws/Cargo.toml",
        ]);
        let mut config = Config::default();
        cmd.apply_overrides(&mut config);

        assert_eq!(config.discovery.timeout_secs, 5);
        assert!(!config.discovery.offline);
        assert_eq!(
            config.discovery.manifest_path,
            Some(PathBuf::from("ws/Cargo.toml"))
        );
    }

    #[test]
    fn test_no_flags_keep_config() {
        let cmd = parse(&["cratebump", "bump", "none"]);
        let mut config = Config::default();
        cmd.apply_overrides(&mut config);
        assert_eq!(config, Config::default());
    }
}

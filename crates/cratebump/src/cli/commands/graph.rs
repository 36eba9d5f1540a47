//! Graph command

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::info;

use cratebump_core::{BumpOptions, BumpWorkflow, CargoMetadata, DependencyGraph, Workspace};

use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Show the processing order and flattened local dependencies
#[derive(Debug, Args)]
pub struct GraphCommand {
    /// Leave dev-dependency edges out of the graph
    #[arg(long)]
    pub no_dev: bool,
}

/// One package in processing order
#[derive(Debug, Serialize)]
struct GraphEntry {
    name: String,
    version: String,
    depth: usize,
    dependencies: Vec<String>,
    dependents: Vec<String>,
}

impl GraphCommand {
    /// Execute the graph command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(no_dev = self.no_dev, "executing graph command");
        let cwd = std::env::current_dir()?;
        let mut config = cli.load_config(&cwd)?;
        if self.no_dev {
            config.graph.include_dev_dependencies = false;
        }

        let source = CargoMetadata::from_config(&config.discovery, &cwd);
        let (workspace, graph) =
            BumpWorkflow::new(source, BumpOptions::from_config(&config)).plan()?;
        let entries = entries(&workspace, &graph);

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    eprintln!(
                        "{}",
                        output::header(&format!(
                            "Processing order ({} packages, max depth {})",
                            entries.len(),
                            graph.max_depth()
                        ))
                    );
                }
                for (index, entry) in entries.iter().enumerate() {
                    let deps = if entry.dependencies.is_empty() {
                        style("(no local dependencies)").dim().to_string()
                    } else {
                        entry.dependencies.join(", ")
                    };
                    println!(
                        "{:>3}. {} {} <- {}",
                        index + 1,
                        output::package_style().apply_to(&entry.name),
                        output::version_style().apply_to(&entry.version),
                        deps
                    );
                }
            }
        }

        Ok(())
    }
}

/// Packages in processing order with their flattened dependency sets
fn entries(workspace: &Workspace, graph: &DependencyGraph) -> Vec<GraphEntry> {
    graph
        .sort_packages(&workspace.packages)
        .into_iter()
        .map(|package| GraphEntry {
            name: package.name.clone(),
            version: package.version.clone(),
            depth: graph.get(&package.name).map_or(0, |node| node.depth),
            dependencies: graph
                .flattened(&package.name)
                .map(|deps| deps.iter().cloned().collect())
                .unwrap_or_default(),
            dependents: graph.get_dependents(&package.name).to_vec(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cratebump_core::{Dependency, Package};

    #[test]
    fn test_entries_follow_processing_order() {
        let packages = vec![
            Package::new("app", "0.3.0", "app/Cargo.toml")
                .with_dependency(Dependency::new("cli").with_path("cli"))
                .with_dependency(Dependency::new("core").with_path("core")),
            Package::new("cli", "0.2.0", "cli/Cargo.toml")
                .with_dependency(Dependency::new("core").with_path("core")),
            Package::new("core", "0.1.0", "core/Cargo.toml"),
        ];
        let workspace = Workspace::new(".", packages);
        let graph = DependencyGraph::build(&workspace.packages).unwrap();

        let entries = entries(&workspace, &graph);
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["core", "cli", "app"]);
        assert_eq!(entries[2].dependencies, vec!["cli", "core"]);
        assert_eq!(entries[2].depth, 2);
        assert!(entries[0].dependencies.is_empty());
        assert_eq!(entries[0].dependents, vec!["app", "cli"]);
        assert!(entries[2].dependents.is_empty());
        assert_eq!(graph.max_depth(), 2);
    }
}

//! Discovery through `cargo metadata`

use std::collections::HashSet;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

use crate::config::DiscoveryConfig;
use crate::error::{BumpError, Result};
use crate::types::{Dependency, DependencyKind, Package, Workspace};

use super::PackageSource;

/// Runs `cargo metadata --format-version 1 --no-deps`
#[derive(Debug, Clone)]
pub struct CargoMetadata {
    cargo: String,
    working_dir: PathBuf,
    offline: bool,
    timeout: Duration,
    manifest_path: Option<PathBuf>,
}

impl CargoMetadata {
    /// Create a discovery rooted at `working_dir` with default settings
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self::from_config(&DiscoveryConfig::default(), working_dir)
    }

    /// Create a discovery from configuration
    pub fn from_config(config: &DiscoveryConfig, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            cargo: config.cargo.clone(),
            working_dir: working_dir.into(),
            offline: config.offline,
            timeout: Duration::from_secs(config.timeout_secs),
            manifest_path: config.manifest_path.clone(),
        }
    }

    /// Set whether cargo runs offline
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Set the root manifest
    pub fn with_manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec![
            "metadata".to_string(),
            "--format-version".to_string(),
            "1".to_string(),
            "--no-deps".to_string(),
        ];
        if self.offline {
            args.push("--offline".to_string());
        }
        if let Some(ref manifest_path) = self.manifest_path {
            args.push("--manifest-path".to_string());
            args.push(manifest_path.to_string_lossy().to_string());
        }
        args
    }

    fn run(&self) -> Result<String> {
        let cargo = which::which(&self.cargo).map_err(|e| {
            BumpError::discovery(format!("cargo binary '{}' not found: {}", self.cargo, e))
        })?;
        let args = self.args();
        debug!(cargo = %cargo.display(), ?args, dir = %self.working_dir.display(), "running cargo metadata");

        // Output goes to files so a large workspace cannot fill a pipe while
        // we wait on the child.
        let mut stdout = tempfile::tempfile().map_err(io_failure("create output file"))?;
        let mut stderr = tempfile::tempfile().map_err(io_failure("create output file"))?;

        let mut child = Command::new(&cargo)
            .args(&args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(
                stdout.try_clone().map_err(io_failure("attach stdout"))?,
            ))
            .stderr(Stdio::from(
                stderr.try_clone().map_err(io_failure("attach stderr"))?,
            ))
            .spawn()
            .map_err(io_failure("spawn cargo metadata"))?;

        let waited = child
            .wait_timeout(self.timeout)
            .map_err(io_failure("wait for cargo metadata"))?;
        let status = match waited {
            Some(status) => status,
            None => {
                warn!(timeout_secs = self.timeout.as_secs(), "cargo metadata timed out");
                child.kill().map_err(io_failure("kill cargo metadata"))?;
                child.wait().map_err(io_failure("reap cargo metadata"))?;
                return Err(BumpError::discovery(format!(
                    "cargo metadata did not finish within {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        if !status.success() {
            let mut message = Vec::new();
            stderr
                .seek(SeekFrom::Start(0))
                .and_then(|_| stderr.read_to_end(&mut message))
                .map_err(io_failure("read cargo metadata stderr"))?;
            return Err(BumpError::discovery(format!(
                "cargo metadata exited with {}: {}",
                status,
                String::from_utf8_lossy(&message).trim()
            )));
        }

        let mut output = String::new();
        stdout
            .seek(SeekFrom::Start(0))
            .and_then(|_| stdout.read_to_string(&mut output))
            .map_err(io_failure("read cargo metadata output"))?;
        Ok(output)
    }
}

/// Turn an io error raised while running cargo into a discovery failure
fn io_failure(action: &'static str) -> impl Fn(std::io::Error) -> BumpError {
    move |e| BumpError::discovery(format!("failed to {}: {}", action, e))
}

impl PackageSource for CargoMetadata {
    fn name(&self) -> &'static str {
        "cargo-metadata"
    }

    fn packages(&self) -> Result<Workspace> {
        let output = self.run()?;
        let workspace = parse_metadata(&output)?;
        info!(
            root = %workspace.root.display(),
            count = workspace.packages.len(),
            "discovered packages"
        );
        Ok(workspace)
    }
}

#[derive(Debug, Deserialize)]
struct Metadata {
    packages: Vec<MetadataPackage>,
    workspace_root: PathBuf,
}

#[derive(Debug, Deserialize)]
struct MetadataPackage {
    name: String,
    version: String,
    manifest_path: PathBuf,
    #[serde(default)]
    dependencies: Vec<MetadataDependency>,
}

#[derive(Debug, Deserialize)]
struct MetadataDependency {
    name: String,
    #[serde(default)]
    rename: Option<String>,
    #[serde(default)]
    path: Option<PathBuf>,
    #[serde(default)]
    req: Option<String>,
    #[serde(default)]
    kind: Option<String>,
}

impl MetadataDependency {
    fn into_dependency(self) -> Result<Dependency> {
        let kind = match self.kind.as_deref() {
            None | Some("normal") => DependencyKind::Normal,
            Some("dev") => DependencyKind::Dev,
            Some("build") => DependencyKind::Build,
            Some(other) => {
                return Err(BumpError::discovery(format!(
                    "unknown dependency kind '{}' for '{}'",
                    other, self.name
                )))
            }
        };
        Ok(Dependency {
            name: self.name,
            rename: self.rename,
            path: self.path,
            req: self.req,
            kind,
        })
    }
}

/// Parse `cargo metadata --format-version 1` output.
///
/// Only dependencies declared with a `path` that names another package of
/// the output are kept as local dependencies.
pub fn parse_metadata(json: &str) -> Result<Workspace> {
    let metadata: Metadata = serde_json::from_str(json)
        .map_err(|e| BumpError::discovery(format!("malformed cargo metadata output: {}", e)))?;

    let local: HashSet<String> = metadata.packages.iter().map(|p| p.name.clone()).collect();
    if local.len() != metadata.packages.len() {
        return Err(BumpError::discovery(
            "cargo metadata reported duplicate package names",
        ));
    }

    let mut packages = Vec::with_capacity(metadata.packages.len());
    for pkg in metadata.packages {
        let dependencies = pkg
            .dependencies
            .into_iter()
            .filter(|dep| dep.path.is_some() && local.contains(&dep.name))
            .map(MetadataDependency::into_dependency)
            .collect::<Result<Vec<_>>>()?;
        packages.push(Package {
            name: pkg.name,
            version: pkg.version,
            manifest_path: pkg.manifest_path,
            dependencies,
        });
    }

    Ok(Workspace::new(metadata.workspace_root, packages))
}

//! Applying version changes and rewriting cross-references

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::PropagationConfig;
use crate::error::{BumpError, Result};
use crate::graph::DependencyGraph;
use crate::manifest::{normalize_path, DependencyEntry, ManifestStore};
use crate::request::{RequestMode, UpdateRequest};
use crate::types::{Package, Workspace};
use crate::versioning::{resolve, Directive};

/// Requirement operators kept when a constraint is rewritten
const KEPT_OPERATORS: [&str; 4] = [">=", "=", "^", "~"];

/// Knobs for manifest rewriting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropagationOptions {
    /// Keep the operator of the previous requirement
    pub preserve_requirement_operator: bool,
    /// Rewrite `[workspace.dependencies]` in the root manifest
    pub workspace_dependencies: bool,
}

impl Default for PropagationOptions {
    fn default() -> Self {
        Self::from(&PropagationConfig::default())
    }
}

impl From<&PropagationConfig> for PropagationOptions {
    fn from(config: &PropagationConfig) -> Self {
        Self {
            preserve_requirement_operator: config.preserve_requirement_operator,
            workspace_dependencies: config.workspace_dependencies,
        }
    }
}

/// What a run changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// New versions in processing order
    pub updated: Vec<(String, String)>,
    /// Written manifests, dependencies first
    pub touched: Vec<PathBuf>,
}

impl UpdateOutcome {
    /// New version of a package, if it was updated
    pub fn version_of(&self, name: &str) -> Option<&str> {
        self.updated
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether a package was updated
    pub fn is_updated(&self, name: &str) -> bool {
        self.version_of(name).is_some()
    }

    /// Touched manifests, most dependent first
    pub fn touched_dependent_first(&self) -> Vec<PathBuf> {
        self.touched.iter().rev().cloned().collect()
    }

    /// Whether nothing changed
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.touched.is_empty()
    }

    fn record(&mut self, name: &str, version: &str) {
        self.updated.push((name.to_string(), version.to_string()));
    }

    fn touch(&mut self, path: &Path) {
        let path = normalize_path(path);
        if !self.touched.contains(&path) {
            self.touched.push(path);
        }
    }
}

/// Walks the packages in dependency order, bumps each requested package
/// and rewrites the manifests that pin it.
pub struct UpdatePropagator<'a> {
    workspace: &'a Workspace,
    graph: &'a DependencyGraph,
    store: &'a mut ManifestStore,
    options: PropagationOptions,
}

impl<'a> UpdatePropagator<'a> {
    /// Create a propagator over a discovered workspace
    pub fn new(
        workspace: &'a Workspace,
        graph: &'a DependencyGraph,
        store: &'a mut ManifestStore,
    ) -> Self {
        Self {
            workspace,
            graph,
            store,
            options: PropagationOptions::default(),
        }
    }

    /// Set propagation options
    pub fn with_options(mut self, options: PropagationOptions) -> Self {
        self.options = options;
        self
    }

    /// Apply `request` to every package.
    ///
    /// Manifests are written as soon as each package is finished. A failure
    /// part way through leaves earlier writes in place.
    pub fn apply(&mut self, request: &UpdateRequest) -> Result<UpdateOutcome> {
        let workspace = self.workspace;
        let graph = self.graph;
        let mut outcome = UpdateOutcome::default();

        for package in graph.sort_packages(&workspace.packages) {
            let directive = match request.directive(&package.name) {
                Some(directive) => directive.clone(),
                None if request.mode() == RequestMode::Single => {
                    return Err(BumpError::MissingArgument(package.name.clone()))
                }
                None => Directive::NoChange,
            };

            if !directive.is_change() {
                self.check_unchanged(package, &outcome)?;
                debug!(package = %package.name, "no change requested");
                continue;
            }

            let new_version = resolve(&package.name, &package.version, &directive)?.to_string();
            let document = self.store.get_mut(&package.manifest_path)?;
            if let Some(on_disk) = document.version().filter(|v| *v != package.version) {
                warn!(
                    package = %package.name,
                    discovered = %package.version,
                    on_disk,
                    "manifest version differs from discovered version"
                );
            }
            document.set_version(&new_version)?;
            self.store.save(&package.manifest_path)?;
            outcome.record(&package.name, &new_version);
            outcome.touch(&package.manifest_path);
            info!(
                package = %package.name,
                from = %package.version,
                to = %new_version,
                %directive,
                "updated package version"
            );

            self.propagate(package, &new_version, request, &mut outcome)?;
        }

        // Report manifests in processing order; the virtual root goes first
        let sorted = graph.sorted();
        outcome.touched.sort_by_key(|path| {
            workspace
                .packages
                .iter()
                .find(|p| normalize_path(&p.manifest_path) == *path)
                .and_then(|p| sorted.iter().position(|n| *n == p.name))
                .map_or(0, |i| i + 1)
        });

        Ok(outcome)
    }

    /// A package left alone must not depend on anything that moved
    fn check_unchanged(&self, package: &Package, outcome: &UpdateOutcome) -> Result<()> {
        let changed_dependency = outcome
            .updated
            .iter()
            .map(|(name, _)| name)
            .find(|name| self.graph.depends_on(&package.name, name));

        match changed_dependency {
            Some(dependency) => Err(BumpError::InconsistentUpdate {
                package: package.name.clone(),
                dependency: dependency.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Rewrite every reference to `updated` in the other manifests
    fn propagate(
        &mut self,
        updated: &Package,
        new_version: &str,
        request: &UpdateRequest,
        outcome: &mut UpdateOutcome,
    ) -> Result<()> {
        let workspace = self.workspace;
        for other in &workspace.packages {
            if other.name == updated.name {
                continue;
            }

            let document = self.store.get(&other.manifest_path)?;
            let entries = matching_entries(
                document.dependency_entries(),
                document.dir(),
                updated,
            );
            if entries.is_empty() {
                continue;
            }

            if !request.has_change(&other.name) {
                return Err(BumpError::InconsistentUpdate {
                    package: other.name.clone(),
                    dependency: updated.name.clone(),
                });
            }

            self.rewrite(&other.manifest_path, &entries, new_version)?;
            outcome.touch(&other.manifest_path);
        }

        if self.options.workspace_dependencies {
            let root_manifest = workspace.root_manifest();
            if root_manifest.is_file() {
                let document = self.store.get(&root_manifest)?;
                let entries = matching_entries(
                    document.workspace_dependency_entries(),
                    document.dir(),
                    updated,
                );
                if !entries.is_empty() {
                    self.rewrite(&root_manifest, &entries, new_version)?;
                    outcome.touch(&root_manifest);
                }
            }
        }

        Ok(())
    }

    fn rewrite(&mut self, path: &Path, entries: &[DependencyEntry], new_version: &str) -> Result<()> {
        let preserve = self.options.preserve_requirement_operator;
        let document = self.store.get_mut(path)?;
        for entry in entries {
            let requirement = rewrite_requirement(entry.version.as_deref(), new_version, preserve);
            document.set_dependency_version(entry, &requirement)?;
            debug!(
                manifest = %path.display(),
                entry = %entry.location(),
                from = ?entry.version,
                to = %requirement,
                "rewrote dependency requirement"
            );
        }
        self.store.save(path)
    }
}

/// Entries of `entries` that pin `package`.
///
/// An entry refers to the package when it is a path dependency whose
/// effective name (the `package` alias, else the key) is the package name,
/// or whose path resolves to the package directory. Entries inheriting
/// from the workspace or carrying no version requirement are skipped.
fn matching_entries(
    entries: Vec<DependencyEntry>,
    manifest_dir: &Path,
    package: &Package,
) -> Vec<DependencyEntry> {
    let package_dir = normalize_path(package.root());

    entries
        .into_iter()
        .filter(|entry| {
            if entry.workspace {
                return false;
            }
            let Some(ref path) = entry.path else {
                return false;
            };
            entry.name() == package.name
                || normalize_path(&manifest_dir.join(path)) == package_dir
        })
        .filter(|entry| {
            if entry.version.is_some() {
                return true;
            }
            if entry.table.last().map(String::as_str) != Some("dev-dependencies") {
                warn!(
                    entry = %entry.location(),
                    package = %package.name,
                    "path dependency has no version requirement, leaving it as is"
                );
            }
            false
        })
        .collect()
}

/// The requirement written for `new_version`, keeping the operator of
/// `previous` when asked to. Compound requirements (`>=1.0, <2.0`) are
/// replaced by the bare version.
pub fn rewrite_requirement(previous: Option<&str>, new_version: &str, preserve: bool) -> String {
    if preserve {
        if let Some(previous) = previous.map(str::trim_start).filter(|p| !p.contains(',')) {
            if let Some(op) = KEPT_OPERATORS.iter().find(|op| previous.starts_with(**op)) {
                return format!("{}{}", op, new_version);
            }
        }
    }
    new_version.to_string()
}

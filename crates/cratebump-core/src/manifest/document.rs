//! Format-preserving Cargo.toml editing

use std::path::{Path, PathBuf};

use toml_edit::{DocumentMut, Item, TableLike, Value};

use crate::error::{ManifestError, Result};
use crate::types::DependencyKind;

/// One entry of a dependency table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEntry {
    /// Tables leading to the dependency table, e.g. `["target", "cfg(unix)", "dependencies"]`
    pub table: Vec<String>,
    /// Key the dependency is declared under
    pub key: String,
    /// `package = "..."` rename target
    pub package: Option<String>,
    /// `path = "..."`
    pub path: Option<String>,
    /// `version = "..."`, or the whole value for `name = "1.0"`
    pub version: Option<String>,
    /// `workspace = true`
    pub workspace: bool,
}

impl DependencyEntry {
    /// Name of the package this entry depends on
    pub fn name(&self) -> &str {
        self.package.as_deref().unwrap_or(&self.key)
    }

    /// Human-readable location, e.g. `dev-dependencies.core`
    pub fn location(&self) -> String {
        format!("{}.{}", self.table.join("."), self.key)
    }
}

/// A parsed Cargo.toml that keeps comments and formatting intact
#[derive(Debug, Clone)]
pub struct ManifestDocument {
    path: PathBuf,
    doc: DocumentMut,
}

impl ManifestDocument {
    /// Parse manifest content
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self> {
        let path = path.into();
        let doc = content
            .parse::<DocumentMut>()
            .map_err(|e| ManifestError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?;
        Ok(Self { path, doc })
    }

    /// Read and parse a manifest from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| ManifestError::NotFound(path.to_path_buf()))?;
        Self::parse(path, &content)
    }

    /// Directory containing the manifest
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }

    /// `package.version`, `None` when absent or inherited
    pub fn version(&self) -> Option<&str> {
        self.doc.get("package")?.get("version")?.as_str()
    }

    /// Set `package.version`, keeping the surrounding formatting
    pub fn set_version(&mut self, version: &str) -> Result<()> {
        let path = self.path.clone();
        let package = self
            .doc
            .get_mut("package")
            .and_then(Item::as_table_like_mut)
            .ok_or_else(|| ManifestError::MissingField {
                path: path.clone(),
                field: "package".to_string(),
            })?;

        if package
            .get("version")
            .and_then(Item::as_table_like)
            .is_some_and(|t| t.get("workspace").is_some())
        {
            return Err(ManifestError::InheritedVersion(path).into());
        }

        set_string(package, "version", version);
        Ok(())
    }

    /// Entries of `[dependencies]`, `[dev-dependencies]`,
    /// `[build-dependencies]` and their `[target.<cfg>]` counterparts
    pub fn dependency_entries(&self) -> Vec<DependencyEntry> {
        let mut entries = Vec::new();
        let root = self.doc.as_table();

        for kind in DependencyKind::all() {
            let name = kind.table_name();
            if let Some(table) = root.get(name).and_then(Item::as_table_like) {
                collect_entries(table, vec![name.to_string()], &mut entries);
            }
        }

        if let Some(targets) = root.get("target").and_then(Item::as_table_like) {
            for (cfg, target) in targets.iter() {
                let Some(target) = target.as_table_like() else {
                    continue;
                };
                for kind in DependencyKind::all() {
                    let name = kind.table_name();
                    if let Some(table) = target.get(name).and_then(Item::as_table_like) {
                        collect_entries(
                            table,
                            vec!["target".to_string(), cfg.to_string(), name.to_string()],
                            &mut entries,
                        );
                    }
                }
            }
        }

        entries
    }

    /// Entries of `[workspace.dependencies]`
    pub fn workspace_dependency_entries(&self) -> Vec<DependencyEntry> {
        let mut entries = Vec::new();
        if let Some(table) = self
            .doc
            .get("workspace")
            .and_then(|w| w.get("dependencies"))
            .and_then(Item::as_table_like)
        {
            collect_entries(
                table,
                vec!["workspace".to_string(), "dependencies".to_string()],
                &mut entries,
            );
        }
        entries
    }

    /// Set the `version` of a dependency entry.
    ///
    /// Entries written as a bare string (`name = "1.0"`) are replaced in
    /// place; table entries gain or update their `version` key.
    pub fn set_dependency_version(&mut self, entry: &DependencyEntry, version: &str) -> Result<()> {
        let path = self.path.clone();
        let location = entry.location();
        let missing = || ManifestError::MissingField {
            path: path.clone(),
            field: location.clone(),
        };

        let mut table: &mut dyn TableLike = self.doc.as_table_mut();
        for segment in &entry.table {
            table = table
                .get_mut(segment)
                .and_then(Item::as_table_like_mut)
                .ok_or_else(missing)?;
        }

        let item = table.get_mut(&entry.key).ok_or_else(missing)?;
        if let Some(dep) = item.as_table_like_mut() {
            set_string(dep, "version", version);
        } else if let Some(existing) = item.as_value_mut() {
            replace_value(existing, version);
        } else {
            return Err(missing().into());
        }
        Ok(())
    }
}

impl std::fmt::Display for ManifestDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.doc)
    }
}

fn collect_entries(table: &dyn TableLike, path: Vec<String>, out: &mut Vec<DependencyEntry>) {
    for (key, item) in table.iter() {
        let entry = if let Some(dep) = item.as_table_like() {
            let get_str = |k: &str| dep.get(k).and_then(Item::as_str).map(str::to_string);
            DependencyEntry {
                table: path.clone(),
                key: key.to_string(),
                package: get_str("package"),
                path: get_str("path"),
                version: get_str("version"),
                workspace: dep.get("workspace").and_then(Item::as_bool).unwrap_or(false),
            }
        } else {
            DependencyEntry {
                table: path.clone(),
                key: key.to_string(),
                package: None,
                path: None,
                version: item.as_str().map(str::to_string),
                workspace: false,
            }
        };
        out.push(entry);
    }
}

/// Write a string value under `key`, reusing the old value's decor
fn set_string(table: &mut dyn TableLike, key: &str, value: &str) {
    match table.get_mut(key).and_then(Item::as_value_mut) {
        Some(existing) => replace_value(existing, value),
        None => {
            table.insert(key, toml_edit::value(value));
        }
    }
}

fn replace_value(existing: &mut Value, value: &str) {
    let decor = existing.decor().clone();
    *existing = Value::from(value);
    *existing.decor_mut() = decor;
}

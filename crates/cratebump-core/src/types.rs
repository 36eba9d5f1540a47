//! Shared types for cratebump

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Kind of a declared dependency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// `[dependencies]`
    #[default]
    Normal,
    /// `[dev-dependencies]`
    Dev,
    /// `[build-dependencies]`
    Build,
}

impl DependencyKind {
    /// Manifest table name for this kind
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Normal => "dependencies",
            Self::Dev => "dev-dependencies",
            Self::Build => "build-dependencies",
        }
    }

    /// All kinds, in manifest order
    pub fn all() -> [DependencyKind; 3] {
        [Self::Normal, Self::Dev, Self::Build]
    }
}

impl std::fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Dev => write!(f, "dev"),
            Self::Build => write!(f, "build"),
        }
    }
}

/// A dependency declared by a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Name of the depended-on package
    pub name: String,
    /// Key the dependency is declared under, when it differs from `name`
    pub rename: Option<String>,
    /// Directory of the dependency when declared with `path`
    pub path: Option<PathBuf>,
    /// Version requirement, if any
    pub req: Option<String>,
    /// Dependency kind
    pub kind: DependencyKind,
}

impl Dependency {
    /// Create a plain dependency on `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rename: None,
            path: None,
            req: None,
            kind: DependencyKind::Normal,
        }
    }

    /// Set the path reference
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the rename alias
    pub fn with_rename(mut self, rename: impl Into<String>) -> Self {
        self.rename = Some(rename.into());
        self
    }

    /// Set the version requirement
    pub fn with_req(mut self, req: impl Into<String>) -> Self {
        self.req = Some(req.into());
        self
    }

    /// Set the dependency kind
    pub fn with_kind(mut self, kind: DependencyKind) -> Self {
        self.kind = kind;
        self
    }

    /// Key this dependency is declared under in the manifest
    pub fn declared_name(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.name)
    }
}

/// A local package of the workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Package name, unique among local packages
    pub name: String,
    /// Current version
    pub version: String,
    /// Path to the package's `Cargo.toml`
    pub manifest_path: PathBuf,
    /// Declared dependencies, local or not
    pub dependencies: Vec<Dependency>,
}

impl Package {
    /// Create a package without dependencies
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        manifest_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            manifest_path: manifest_path.into(),
            dependencies: Vec::new(),
        }
    }

    /// Add a dependency
    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Directory containing the manifest
    pub fn root(&self) -> &Path {
        self.manifest_path.parent().unwrap_or(Path::new("."))
    }
}

/// Result of package discovery
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// Workspace root directory
    pub root: PathBuf,
    /// Local packages in discovery order
    pub packages: Vec<Package>,
}

impl Workspace {
    /// Create a workspace
    pub fn new(root: impl Into<PathBuf>, packages: Vec<Package>) -> Self {
        Self {
            root: root.into(),
            packages,
        }
    }

    /// Path of the workspace root manifest
    pub fn root_manifest(&self) -> PathBuf {
        self.root.join("Cargo.toml")
    }

    /// Look up a package by name
    pub fn get(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// Names of all local packages in discovery order
    pub fn package_names(&self) -> Vec<String> {
        self.packages.iter().map(|p| p.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_name_prefers_rename() {
        let dep = Dependency::new("core").with_rename("core2");
        assert_eq!(dep.declared_name(), "core2");
        assert_eq!(Dependency::new("core").declared_name(), "core");
    }

    #[test]
    fn test_package_root() {
        let pkg = Package::new("core", "1.0.0", "/ws/crates/core/Cargo.toml");
        assert_eq!(pkg.root(), Path::new("/ws/crates/core"));
    }
}

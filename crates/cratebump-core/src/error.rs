//! Error types for cratebump

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using BumpError
pub type Result<T> = std::result::Result<T, BumpError>;

/// Main error type for cratebump operations
///
/// Every variant aborts the run. Manifest writes that already happened are
/// left on disk.
#[derive(Debug, Error)]
pub enum BumpError {
    /// Package discovery failed or returned malformed data
    #[error("Package discovery failed: {0}")]
    Discovery(String),

    /// A batch directive names a package that is not part of the workspace
    #[error("Could not find a package named '{0}' in the workspace")]
    UnknownPackage(String),

    /// A directive is not `none`, a bump kind, or a semantic version
    #[error("Expected 'patch', 'minor', 'major', 'none' or a semantic version. Found '{0}'")]
    InvalidDirective(String),

    /// An explicit version does not move the package forward
    #[error("New version {requested} of '{package}' must be greater than current version {current}")]
    VersionNotAdvancing {
        package: String,
        current: String,
        requested: String,
    },

    /// A package depends on an updated package but has no directive itself
    #[error("'{package}' needs to be updated as its dependency '{dependency}' is updated")]
    InconsistentUpdate { package: String, dependency: String },

    /// A single (non JSON) argument was given to a multi-package workspace
    #[error("Expected a single package in the workspace for non-JSON argument '{argument}', found: {}", .packages.join(", "))]
    SinglePackageAmbiguity {
        argument: String,
        packages: Vec<String>,
    },

    /// No directive was supplied for a package in single-package mode
    #[error("No version argument supplied for '{0}'")]
    MissingArgument(String),

    /// Local packages depend on each other in a loop
    #[error("Circular local dependencies detected: {}", .0.iter().map(|c| c.join(" -> ")).collect::<Vec<_>>().join("; "))]
    CyclicDependency(Vec<Vec<String>>),

    /// Manifest-related errors
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Manifest-related errors
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Manifest file not found
    #[error("Manifest not found at {0}")]
    NotFound(PathBuf),

    /// Failed to parse manifest
    #[error("Failed to parse manifest {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A required field is absent
    #[error("Manifest {path} has no '{field}' field")]
    MissingField { path: PathBuf, field: String },

    /// The package version is inherited with `version.workspace = true`
    #[error("Manifest {0} inherits its version from the workspace and cannot be bumped on its own")]
    InheritedVersion(PathBuf),

    /// Failed to write manifest
    #[error("Failed to write manifest {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

impl BumpError {
    /// Create a discovery error with a message
    pub fn discovery<S: Into<String>>(msg: S) -> Self {
        Self::Discovery(msg.into())
    }

    /// Whether the error comes from a request that contradicts the workspace
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnknownPackage(_)
                | Self::InconsistentUpdate { .. }
                | Self::SinglePackageAmbiguity { .. }
                | Self::MissingArgument(_)
                | Self::CyclicDependency(_)
        )
    }

    /// Whether the error comes from a directive or version value
    pub fn is_version(&self) -> bool {
        matches!(
            self,
            Self::InvalidDirective(_) | Self::VersionNotAdvancing { .. }
        )
    }
}

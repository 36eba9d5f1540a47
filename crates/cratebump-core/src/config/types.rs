//! Configuration types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::defaults::{DEFAULT_CARGO, DEFAULT_NONE_SENTINEL, DEFAULT_TIMEOUT_SECS};

/// Main configuration for cratebump
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Package discovery configuration
    pub discovery: DiscoveryConfig,

    /// Dependency graph configuration
    pub graph: GraphConfig,

    /// Version propagation configuration
    pub propagation: PropagationConfig,

    /// Output configuration
    pub output: OutputConfig,
}

/// How `cargo metadata` is invoked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Cargo binary name or path
    pub cargo: String,

    /// Pass `--offline` to cargo
    pub offline: bool,

    /// Seconds before the metadata command is killed
    pub timeout_secs: u64,

    /// Root manifest passed with `--manifest-path`
    pub manifest_path: Option<PathBuf>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            cargo: DEFAULT_CARGO.to_string(),
            offline: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            manifest_path: None,
        }
    }
}

/// Which edges participate in flattening and ordering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Follow dev-dependency edges
    pub include_dev_dependencies: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            include_dev_dependencies: true,
        }
    }
}

/// How dependent manifests are rewritten
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// Keep a leading `=`, `^`, `~` or `>=` of the previous requirement
    pub preserve_requirement_operator: bool,

    /// Rewrite `[workspace.dependencies]` of the root manifest
    pub workspace_dependencies: bool,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            preserve_requirement_operator: true,
            workspace_dependencies: true,
        }
    }
}

/// Output record settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Value of `new-version` outside single-package mode
    pub none_sentinel: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            none_sentinel: DEFAULT_NONE_SENTINEL.to_string(),
        }
    }
}

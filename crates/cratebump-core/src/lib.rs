//! cratebump core - version bumping for Cargo workspaces
//!
//! This crate discovers the local packages of a workspace, flattens their
//! local dependency edges, orders them so dependencies come first, resolves
//! the requested version changes and rewrites every manifest that pins an
//! updated package.

pub mod config;
pub mod discovery;
pub mod error;
pub mod graph;
pub mod manifest;
pub mod propagate;
pub mod report;
pub mod request;
pub mod types;
pub mod versioning;
pub mod workflow;

pub use config::{load_config, load_config_or_default, Config};
pub use discovery::{CargoMetadata, PackageSource, StaticSource};
pub use error::{BumpError, ConfigError, ManifestError, Result};
pub use graph::DependencyGraph;
pub use manifest::{ManifestDocument, ManifestStore};
pub use propagate::{PropagationOptions, UpdateOutcome, UpdatePropagator};
pub use report::{ChangeReport, ReportSink};
pub use request::{RequestMode, UpdateRequest};
pub use types::{Dependency, DependencyKind, Package, Workspace};
pub use versioning::{resolve, BumpKind, Directive};
pub use workflow::{BumpOptions, BumpWorkflow};

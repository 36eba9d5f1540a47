//! Local package discovery
//!
//! Discovery runs once per invocation and yields the workspace root plus
//! every local package with its declared dependencies. `CargoMetadata` asks
//! cargo; `StaticSource` hands out a prepared workspace.

mod metadata;

pub use metadata::{parse_metadata, CargoMetadata};

use crate::error::Result;
use crate::types::Workspace;

/// A source of local packages
pub trait PackageSource {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Discover the workspace
    fn packages(&self) -> Result<Workspace>;
}

/// A fixed, in-memory workspace
#[derive(Debug, Clone)]
pub struct StaticSource {
    workspace: Workspace,
}

impl StaticSource {
    /// Create a source that always returns `workspace`
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

impl PackageSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    fn packages(&self) -> Result<Workspace> {
        Ok(self.workspace.clone())
    }
}

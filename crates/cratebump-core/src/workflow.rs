//! End-to-end bump run

use tracing::{info, instrument};

use crate::config::{Config, GraphConfig};
use crate::discovery::PackageSource;
use crate::error::Result;
use crate::graph::DependencyGraph;
use crate::manifest::ManifestStore;
use crate::propagate::{PropagationOptions, UpdateOutcome, UpdatePropagator};
use crate::report::ChangeReport;
use crate::request::{RequestMode, UpdateRequest};
use crate::types::Workspace;

/// Options for a bump run
#[derive(Debug, Clone)]
pub struct BumpOptions {
    /// Compute everything but leave manifests untouched on disk
    pub dry_run: bool,
    /// Graph edges to follow
    pub graph: GraphConfig,
    /// Manifest rewriting options
    pub propagation: PropagationOptions,
    /// `new-version` value outside single-package mode
    pub none_sentinel: String,
}

impl BumpOptions {
    /// Options taken from configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            dry_run: false,
            graph: config.graph.clone(),
            propagation: PropagationOptions::from(&config.propagation),
            none_sentinel: config.output.none_sentinel.clone(),
        }
    }

    /// Set dry-run mode
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

impl Default for BumpOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct BumpResult {
    /// How the argument addressed packages
    pub mode: RequestMode,
    /// Updated versions and touched manifests
    pub outcome: UpdateOutcome,
    /// Records for the CI consumer
    pub report: ChangeReport,
    /// Manifest writes performed (zero on dry runs)
    pub writes: usize,
}

/// Discovery, graph, propagation and reporting in one pass
pub struct BumpWorkflow<S: PackageSource> {
    source: S,
    options: BumpOptions,
}

impl<S: PackageSource> BumpWorkflow<S> {
    /// Create a workflow over a package source
    pub fn new(source: S, options: BumpOptions) -> Self {
        Self { source, options }
    }

    /// Discover packages and build the graph without changing anything
    pub fn plan(&self) -> Result<(Workspace, DependencyGraph)> {
        let workspace = self.source.packages()?;
        let graph = DependencyGraph::build_with(&workspace.packages, &self.options.graph)?;
        Ok((workspace, graph))
    }

    /// Parse `argument` and run it
    pub fn run(&self, argument: &str) -> Result<BumpResult> {
        let request = UpdateRequest::parse(argument)?;
        self.run_request(request)
    }

    /// Run an already parsed request
    #[instrument(skip_all, fields(source = self.source.name(), dry_run = self.options.dry_run))]
    pub fn run_request(&self, mut request: UpdateRequest) -> Result<BumpResult> {
        let workspace = self.source.packages()?;
        request.bind(&workspace)?;
        let graph = DependencyGraph::build_with(&workspace.packages, &self.options.graph)?;

        let mut store = ManifestStore::new().dry_run(self.options.dry_run);
        let outcome = UpdatePropagator::new(&workspace, &graph, &mut store)
            .with_options(self.options.propagation)
            .apply(&request)?;

        let single_version = match request.mode() {
            RequestMode::Single => workspace.packages.first().map(|pkg| {
                outcome
                    .version_of(&pkg.name)
                    .unwrap_or(&pkg.version)
                    .to_string()
            }),
            RequestMode::Batch => None,
        };
        let report = ChangeReport::new(
            &outcome,
            single_version.as_deref(),
            &self.options.none_sentinel,
        );

        info!(
            updated = outcome.updated.len(),
            touched = outcome.touched.len(),
            parsed = store.len(),
            writes = store.writes(),
            "bump complete"
        );

        Ok(BumpResult {
            mode: request.mode(),
            outcome,
            report,
            writes: store.writes(),
        })
    }
}

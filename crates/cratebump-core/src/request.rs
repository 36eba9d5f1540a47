//! Parsing of the update argument

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::error::{BumpError, Result};
use crate::types::Workspace;
use crate::versioning::Directive;

/// How the update argument addresses packages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// One directive for the only package of the workspace
    Single,
    /// A JSON object of package name to directive
    Batch,
}

/// The parsed update argument
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    mode: RequestMode,
    argument: String,
    single: Option<Directive>,
    directives: HashMap<String, Directive>,
}

impl UpdateRequest {
    /// Parse the raw argument.
    ///
    /// An argument starting with `{` is a batch request whose values are
    /// directive strings or `null` (no change). Anything else is a single
    /// directive.
    pub fn parse(argument: &str) -> Result<Self> {
        let trimmed = argument.trim();

        if trimmed.starts_with('{') {
            let object: serde_json::Map<String, Value> = serde_json::from_str(trimmed)
                .map_err(|e| BumpError::InvalidDirective(format!("{} ({})", trimmed, e)))?;
            let mut directives = HashMap::with_capacity(object.len());
            for (name, value) in object {
                let directive = match value {
                    Value::Null => Directive::NoChange,
                    Value::String(s) => s.parse()?,
                    other => return Err(BumpError::InvalidDirective(other.to_string())),
                };
                directives.insert(name, directive);
            }
            debug!(count = directives.len(), "parsed batch request");
            return Ok(Self {
                mode: RequestMode::Batch,
                argument: trimmed.to_string(),
                single: None,
                directives,
            });
        }

        let directive = trimmed.parse()?;
        debug!(%directive, "parsed single request");
        Ok(Self::single(directive))
    }

    /// A single-package request
    pub fn single(directive: Directive) -> Self {
        Self {
            mode: RequestMode::Single,
            argument: directive.to_string(),
            single: Some(directive),
            directives: HashMap::new(),
        }
    }

    /// A batch request from name/directive pairs
    pub fn batch<I, S>(directives: I) -> Self
    where
        I: IntoIterator<Item = (S, Directive)>,
        S: Into<String>,
    {
        let directives: HashMap<String, Directive> = directives
            .into_iter()
            .map(|(name, directive)| (name.into(), directive))
            .collect();
        let mut names: Vec<&String> = directives.keys().collect();
        names.sort();
        let argument = format!(
            "{{{}}}",
            names
                .iter()
                .map(|n| format!("\"{}\":\"{}\"", n, directives[*n]))
                .collect::<Vec<_>>()
                .join(",")
        );
        Self {
            mode: RequestMode::Batch,
            argument,
            single: None,
            directives,
        }
    }

    /// Request mode
    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    /// The argument as given
    pub fn argument(&self) -> &str {
        &self.argument
    }

    /// Check the request against the discovered packages.
    ///
    /// Single mode requires exactly one package and keys the directive by
    /// its name. Batch mode rejects names that are not local packages.
    /// Runs before any manifest is touched.
    pub fn bind(&mut self, workspace: &Workspace) -> Result<()> {
        match self.mode {
            RequestMode::Single => {
                if workspace.packages.len() != 1 {
                    return Err(BumpError::SinglePackageAmbiguity {
                        argument: self.argument.clone(),
                        packages: workspace.package_names(),
                    });
                }
                if let Some(directive) = self.single.take() {
                    let name = workspace.packages[0].name.clone();
                    self.directives.insert(name, directive);
                }
            }
            RequestMode::Batch => {
                let mut unknown: Vec<&String> = self
                    .directives
                    .keys()
                    .filter(|name| workspace.get(name).is_none())
                    .collect();
                unknown.sort();
                if let Some(name) = unknown.first() {
                    return Err(BumpError::UnknownPackage((*name).clone()));
                }
            }
        }
        Ok(())
    }

    /// Directive for a package, if one was given
    pub fn directive(&self, name: &str) -> Option<&Directive> {
        self.directives.get(name)
    }

    /// Whether the package is asked to change version
    pub fn has_change(&self, name: &str) -> bool {
        self.directive(name).is_some_and(Directive::is_change)
    }
}

//! Per-run manifest cache

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ManifestError, Result};

use super::document::ManifestDocument;
use super::normalize_path;

/// Owns every parsed manifest of a run.
///
/// Documents are parsed on first access and reused afterwards, so edits
/// made through one lookup are visible to the next.
#[derive(Debug, Default)]
pub struct ManifestStore {
    documents: HashMap<PathBuf, ManifestDocument>,
    dry_run: bool,
    writes: usize,
}

impl ManifestStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep edits in memory only
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn load(&mut self, path: &Path) -> Result<&mut ManifestDocument> {
        let key = normalize_path(path);
        match self.documents.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                debug!(path = %path.display(), "parsing manifest");
                let document = ManifestDocument::load(entry.key())?;
                Ok(entry.insert(document))
            }
        }
    }

    /// Get a manifest, parsing it on first use
    pub fn get(&mut self, path: &Path) -> Result<&ManifestDocument> {
        self.load(path).map(|doc| &*doc)
    }

    /// Get a manifest for editing, parsing it on first use
    pub fn get_mut(&mut self, path: &Path) -> Result<&mut ManifestDocument> {
        self.load(path)
    }

    /// Number of parsed manifests
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Number of writes performed
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Write a cached manifest back to disk
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let key = normalize_path(path);
        let document = self
            .documents
            .get(&key)
            .ok_or_else(|| ManifestError::NotFound(key.clone()))?;

        if self.dry_run {
            info!(path = %key.display(), "dry run, not writing manifest");
            return Ok(());
        }

        std::fs::write(&key, document.to_string()).map_err(|source| ManifestError::Write {
            path: key.clone(),
            source,
        })?;
        self.writes += 1;
        debug!(path = %key.display(), "wrote manifest");
        Ok(())
    }
}

//! Change summary records for CI consumers

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::Result;
use crate::propagate::UpdateOutcome;

/// Record keys, in the order they are written
pub const KEY_DESCRIPTION: &str = "new-versions-description";
pub const KEY_CHANGES: &str = "new-versions";
pub const KEY_VERSIONS: &str = "new-versions-map";
pub const KEY_NEW_VERSION: &str = "new-version";
pub const KEY_PATHS: &str = "updated-cargo-toml-paths";

const HEREDOC_DELIMITER: &str = "EOF";

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeReport {
    /// "a to 1.1.0, b to 2.0.0, and c to 0.3.1"
    #[serde(rename = "new-versions-description")]
    pub description: String,
    /// `name-version` tags
    #[serde(rename = "new-versions")]
    pub changes: Vec<String>,
    /// Package name to new version, in processing order
    #[serde(rename = "new-versions-map")]
    pub versions: Map<String, Value>,
    /// Resulting version in single-package mode, the none sentinel otherwise
    #[serde(rename = "new-version")]
    pub new_version: String,
    /// Touched manifests, most dependent first
    #[serde(rename = "updated-cargo-toml-paths")]
    pub updated_paths: Vec<PathBuf>,
}

impl ChangeReport {
    /// Build the report for an outcome.
    ///
    /// `single_version` is set in single-package mode only.
    pub fn new(outcome: &UpdateOutcome, single_version: Option<&str>, none_sentinel: &str) -> Self {
        Self {
            description: describe_changes(&outcome.updated),
            changes: outcome
                .updated
                .iter()
                .map(|(name, version)| format!("{}-{}", name, version))
                .collect(),
            versions: outcome
                .updated
                .iter()
                .map(|(name, version)| (name.clone(), Value::String(version.clone())))
                .collect(),
            new_version: single_version.unwrap_or(none_sentinel).to_string(),
            updated_paths: outcome.touched_dependent_first(),
        }
    }

    /// Key/value records, JSON-encoded where the value is structured
    pub fn records(&self) -> Result<Vec<(&'static str, String)>> {
        let paths: Vec<String> = self
            .updated_paths
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect();
        Ok(vec![
            (KEY_DESCRIPTION, self.description.clone()),
            (KEY_CHANGES, serde_json::to_string(&self.changes)?),
            (KEY_VERSIONS, serde_json::to_string(&self.versions)?),
            (KEY_NEW_VERSION, self.new_version.clone()),
            (KEY_PATHS, serde_json::to_string(&paths)?),
        ])
    }
}

/// Join changes as "a to 1.0.0", "a to 1.0.0 and b to 2.0.0" or
/// "a to 1.0.0, b to 2.0.0, and c to 3.0.0"
pub fn describe_changes(updated: &[(String, String)]) -> String {
    let parts: Vec<String> = updated
        .iter()
        .map(|(name, version)| format!("{} to {}", name, version))
        .collect();

    match parts.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{} and {}", first, second),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

/// Where records go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportSink {
    /// Append to a GitHub Actions output file
    GithubOutput(PathBuf),
    /// Print `key=value` lines on stdout
    Stdout,
}

impl ReportSink {
    /// Pick the GitHub output file when one is configured
    pub fn from_output_path(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => Self::GithubOutput(path),
            None => Self::Stdout,
        }
    }

    /// Emit every record of `report`
    pub fn write(&self, report: &ChangeReport) -> Result<()> {
        let records = report.records()?;
        match self {
            Self::GithubOutput(path) => {
                let mut file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?;
                write_records(&mut file, &records)?;
                info!(path = %path.display(), records = records.len(), "wrote output records");
            }
            Self::Stdout => {
                let stdout = std::io::stdout();
                let mut handle = stdout.lock();
                write_records(&mut handle, &records)?;
                debug!(records = records.len(), "printed output records");
            }
        }
        Ok(())
    }
}

/// Write records as `key=value` lines, multiline values as heredocs
pub fn write_records<W: Write>(out: &mut W, records: &[(&str, String)]) -> Result<()> {
    for (key, value) in records {
        if value.contains('\n') {
            writeln!(out, "{}<<{}", key, HEREDOC_DELIMITER)?;
            writeln!(out, "{}", value)?;
            writeln!(out, "{}", HEREDOC_DELIMITER)?;
        } else {
            writeln!(out, "{}={}", key, value)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn updated(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_describe_changes() {
        assert_eq!(describe_changes(&[]), "");
        assert_eq!(describe_changes(&updated(&[("a", "1.2.0")])), "a to 1.2.0");
        assert_eq!(
            describe_changes(&updated(&[("a", "1.2.0"), ("b", "2.0.0")])),
            "a to 1.2.0 and b to 2.0.0"
        );
        assert_eq!(
            describe_changes(&updated(&[("A", "1.2.0"), ("B", "2.0.0"), ("C", "0.3.1")])),
            "A to 1.2.0, B to 2.0.0, and C to 0.3.1"
        );
    }

    #[test]
    fn test_batch_report_records() {
        let outcome = UpdateOutcome {
            updated: updated(&[("core", "1.1.0"), ("cli", "0.2.1")]),
            touched: vec![
                PathBuf::from("/ws/core/Cargo.toml"),
                PathBuf::from("/ws/cli/Cargo.toml"),
            ],
        };
        let report = ChangeReport::new(&outcome, None, "none");
        let records = report.records().unwrap();

        assert_eq!(records[0], (KEY_DESCRIPTION, "core to 1.1.0 and cli to 0.2.1".to_string()));
        assert_eq!(records[1].1, r#"["core-1.1.0","cli-0.2.1"]"#);
        assert_eq!(records[2].1, r#"{"core":"1.1.0","cli":"0.2.1"}"#);
        assert_eq!(records[3].1, "none");
        assert_eq!(
            records[4].1,
            r#"["/ws/cli/Cargo.toml","/ws/core/Cargo.toml"]"#
        );
    }

    #[test]
    fn test_single_report() {
        let outcome = UpdateOutcome {
            updated: updated(&[("app", "1.5.0")]),
            touched: vec![PathBuf::from("/ws/Cargo.toml")],
        };
        let report = ChangeReport::new(&outcome, Some("1.5.0"), "none");
        assert_eq!(report.new_version, "1.5.0");
        assert_eq!(report.updated_paths.len(), 1);
    }

    #[test]
    fn test_write_records() {
        let mut out = Vec::new();
        write_records(
            &mut out,
            &[("plain", "x".to_string()), ("multi", "a\nb".to_string())],
        )
        .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "plain=x\nmulti<<EOF\na\nb\nEOF\n");
    }

    #[test]
    fn test_github_output_appends() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("output");
        std::fs::write(&path, "existing=1\n").unwrap();

        let report = ChangeReport::new(&UpdateOutcome::default(), None, "none");
        ReportSink::from_output_path(Some(path.clone()))
            .write(&report)
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("existing=1\n"));
        assert!(content.contains("new-versions=[]\n"));
        assert!(content.contains("new-versions-map={}\n"));
        assert!(content.contains("new-version=none\n"));
    }

    #[test]
    fn test_json_serialization_keys() {
        let report = ChangeReport::new(&UpdateOutcome::default(), None, "none");
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("new-versions-description").is_some());
        assert!(json.get("updated-cargo-toml-paths").is_some());
    }
}

//! Default configuration values

use super::types::Config;

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "cratebump.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "cratebump.yaml";

/// Default cargo binary
pub const DEFAULT_CARGO: &str = "cargo";

/// Default metadata command timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default `new-version` value when no single package was bumped
pub const DEFAULT_NONE_SENTINEL: &str = "none";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".cratebump.toml",
        ".cratebump.yaml",
    ]
}

/// Generate default configuration TOML
pub fn default_config_toml() -> String {
    toml::to_string_pretty(&Config::default())
        .unwrap_or_else(|_| DEFAULT_CONFIG_TEMPLATE.to_string())
}

/// Default configuration template
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# cratebump configuration

[discovery]
cargo = "cargo"
offline = true
timeout_secs = 120

[graph]
include_dev_dependencies = true

[propagation]
preserve_requirement_operator = true
workspace_dependencies = true

[output]
none_sentinel = "none"
"#;

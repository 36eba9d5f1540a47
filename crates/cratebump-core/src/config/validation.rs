//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_discovery(config)?;
    validate_output(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_discovery(config: &Config) -> Result<()> {
    if config.discovery.cargo.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "discovery.cargo".to_string(),
            message: "cargo binary cannot be empty".to_string(),
        }
        .into());
    }

    if config.discovery.timeout_secs == 0 {
        return Err(ConfigError::InvalidValue {
            field: "discovery.timeout_secs".to_string(),
            message: "must be greater than zero".to_string(),
        }
        .into());
    }

    Ok(())
}

fn validate_output(config: &Config) -> Result<()> {
    if config.output.none_sentinel.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "output.none_sentinel".to_string(),
            message: "sentinel cannot be empty".to_string(),
        }
        .into());
    }

    Ok(())
}

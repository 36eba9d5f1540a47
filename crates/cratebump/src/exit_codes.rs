//! Exit codes for the CLI

use cratebump_core::BumpError;

/// Success
pub const SUCCESS: u8 = 0;

/// General error
pub const ERROR: u8 = 1;

/// Configuration error
pub const CONFIG_ERROR: u8 = 2;

/// Invalid directive or a version that does not advance
pub const VERSION_ERROR: u8 = 4;

/// Request contradicts the workspace
pub const VALIDATION_ERROR: u8 = 5;

/// Package discovery failed
pub const DISCOVERY_ERROR: u8 = 6;

/// Exit code for an error returned by a command
pub fn for_error(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<BumpError>() {
        Some(BumpError::Config(_)) => CONFIG_ERROR,
        Some(BumpError::Discovery(_)) => DISCOVERY_ERROR,
        Some(e) if e.is_version() => VERSION_ERROR,
        Some(e) if e.is_validation() => VALIDATION_ERROR,
        _ => ERROR,
    }
}

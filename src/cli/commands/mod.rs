//! CLI command implementations
//!
//! This module contains all CLI command implementations plus the helpers
//! they share for loading configuration and mapping errors to exit codes.

pub mod init;
pub mod migrate;
pub mod slot;
pub mod validate;
pub mod visit;

use crate::adapters::database::BackendSelector;
use crate::config::{load_config, SchedulerConfig};
use crate::core::clock::SystemClock;
use crate::core::scheduling::{BackendKind, VisitScheduler};
use crate::domain::{Result, SchedulerError};
use std::path::Path;
use std::sync::Arc;

/// Exit code for configuration errors
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for a request the scheduling rules refused
pub const EXIT_REJECTED: i32 = 3;
/// Exit code for storage connection failures
pub const EXIT_CONNECTION: i32 = 4;
/// Exit code for anything else
pub const EXIT_FATAL: i32 = 5;

/// Loads the configuration file, or defaults plus `VISITS_*` variables when it does not exist
pub fn load_cli_config(config_path: &str) -> Result<SchedulerConfig> {
    if Path::new(config_path).exists() {
        load_config(config_path)
    } else {
        tracing::debug!(config_path, "Configuration file not found, using environment");
        SchedulerConfig::from_env()
    }
}

/// Maps a scheduler error to the process exit code
pub fn exit_code_for(error: &SchedulerError) -> i32 {
    match error {
        SchedulerError::Configuration(_) => EXIT_CONFIG,
        SchedulerError::Database(_) | SchedulerError::MissingSchema(_) => EXIT_CONNECTION,
        e if e.is_domain_rejection() => EXIT_REJECTED,
        _ => EXIT_FATAL,
    }
}

/// Prints an error the way every command reports failures
pub fn report_error(action: &str, error: &SchedulerError) -> i32 {
    println!("❌ {action}");
    println!("   [{}] {}", error.code(), error);
    exit_code_for(error)
}

/// Loads configuration and builds the scheduler for a command
///
/// # Errors
///
/// Returns the exit code to terminate with after printing the failure.
pub async fn open_scheduler(
    config_path: &str,
) -> std::result::Result<Arc<dyn VisitScheduler>, i32> {
    let config = load_cli_config(config_path)
        .map_err(|e| report_error("Failed to load configuration", &e))?;

    let selector = BackendSelector::new(config, Arc::new(SystemClock));
    if selector.backend() == BackendKind::Memory {
        println!("⚠️  Using the in-memory backend: state lives only for this process");
    }

    selector
        .scheduler()
        .await
        .map_err(|e| report_error("Failed to create visit scheduler", &e))
}

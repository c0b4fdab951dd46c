//! Structured logging setup using tracing
//!
//! Console output is always on. When `local_enabled` is set, a second JSON
//! layer writes to rotating files under `local_path`.

use crate::config::LoggingConfig;
use crate::domain::{Result, SchedulerError};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "visit-scheduler.log";

/// Guard that must be kept alive for the duration of the program
/// so buffered file logs are flushed
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence; otherwise the filter is `visit_scheduler=<level>`.
///
/// # Example
///
/// ```no_run
/// use visit_scheduler::logging::init_logging;
/// use visit_scheduler::config::LoggingConfig;
///
/// let config = LoggingConfig::default();
/// let _guard = init_logging("info", &config).expect("Failed to initialize logging");
/// ```
///
/// # Errors
///
/// Returns a configuration error for an unknown level or an unwritable log directory.
pub fn init_logging(log_level_str: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let log_level = parse_log_level(log_level_str)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("visit_scheduler={}", log_level)));

    let mut layers = Vec::new();

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_filter(env_filter.clone());
    layers.push(console_layer.boxed());

    let file_guard = if config.local_enabled {
        std::fs::create_dir_all(&config.local_path).map_err(|e| {
            SchedulerError::Configuration(format!(
                "Failed to create log directory {}: {}",
                config.local_path, e
            ))
        })?;

        let file_appender = RollingFileAppender::new(
            rotation_for(&config.local_rotation),
            &config.local_path,
            LOG_FILE_PREFIX,
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(non_blocking)
            .with_filter(env_filter);

        layers.push(file_layer.boxed());
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry().with(layers).try_init().map_err(|e| {
        SchedulerError::Configuration(format!("Failed to initialize logging: {e}"))
    })?;

    tracing::debug!(
        local_enabled = config.local_enabled,
        local_path = %config.local_path,
        "Logging initialized"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn rotation_for(name: &str) -> Rotation {
    match name {
        "hourly" => Rotation::HOURLY,
        _ => Rotation::DAILY,
    }
}

fn parse_log_level(level_str: &str) -> Result<Level> {
    // Level's own parser also takes "1".."5"; the config file does not
    if level_str.chars().any(|c| c.is_ascii_digit()) {
        return Err(invalid_level(level_str));
    }
    level_str.parse().map_err(|_| invalid_level(level_str))
}

fn invalid_level(level_str: &str) -> SchedulerError {
    SchedulerError::Configuration(format!(
        "Invalid log level '{level_str}' (expected trace, debug, info, warn or error)"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_names_are_case_insensitive() {
        for (name, level) in [
            ("trace", Level::TRACE),
            ("Debug", Level::DEBUG),
            ("INFO", Level::INFO),
            ("warn", Level::WARN),
            ("error", Level::ERROR),
        ] {
            assert_eq!(parse_log_level(name).unwrap(), level);
        }
    }

    #[test]
    fn test_parse_log_level_invalid() {
        assert!(parse_log_level("verbose").is_err());
        assert!(parse_log_level("").is_err());
        assert!(parse_log_level("3").is_err());
    }

    #[test]
    fn test_rotation_names() {
        assert_eq!(rotation_for("hourly"), Rotation::HOURLY);
        assert_eq!(rotation_for("daily"), Rotation::DAILY);
        assert_eq!(rotation_for("weekly"), Rotation::DAILY);
    }
}

//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{Environment, PostgreSQLConfig, SchedulerConfig};
use super::secret::secret_string;
use crate::core::rules::DEFAULT_CANCEL_WINDOW_HOURS;
use crate::domain::errors::SchedulerError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`SchedulerConfig`]
/// 4. Applies environment variable overrides (`VISITS_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns a configuration error if the file is missing or unreadable, a
/// referenced variable is unset, the TOML is malformed, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use visit_scheduler::config::loader::load_config;
///
/// let config = load_config("visits.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<SchedulerConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SchedulerError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SchedulerError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: SchedulerConfig = toml::from_str(&contents)
        .map_err(|e| SchedulerError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;
    finish(config)
}

impl SchedulerConfig {
    /// Loads a configuration file; see [`load_config`]
    ///
    /// # Errors
    ///
    /// Returns a configuration error if loading or validation fails.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        load_config(path)
    }

    /// Builds a configuration from defaults and `VISITS_*` variables only
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an override is invalid.
    pub fn from_env() -> Result<Self> {
        let mut config = SchedulerConfig::default();
        apply_env_overrides(&mut config)?;
        finish(config)
    }
}

fn finish(config: SchedulerConfig) -> Result<SchedulerConfig> {
    config.validate().map_err(|e| {
        SchedulerError::Configuration(format!("Configuration validation failed: {}", e))
    })?;
    Ok(config)
}

fn placeholder_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("static regex"))
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are copied untouched.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = placeholder_pattern();
    let mut missing_vars: Vec<String> = Vec::new();

    let lines: Vec<String> = input
        .lines()
        .map(|line| {
            if line.trim_start().starts_with('#') {
                return line.to_string();
            }
            re.replace_all(line, |caps: &regex::Captures<'_>| {
                let var_name = &caps[1];
                match std::env::var(var_name) {
                    Ok(value) => value,
                    Err(_) => {
                        if !missing_vars.iter().any(|v| v == var_name) {
                            missing_vars.push(var_name.to_string());
                        }
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
        })
        .collect();

    if !missing_vars.is_empty() {
        return Err(SchedulerError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

/// Parses an override, failing with a message naming the variable
fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        SchedulerError::Configuration(format!("Invalid value '{value}' for {name}"))
    })
}

/// Applies environment variable overrides using the `VISITS_*` prefix
fn apply_env_overrides(config: &mut SchedulerConfig) -> Result<()> {
    if let Ok(val) = std::env::var("VISITS_ENVIRONMENT") {
        config.environment = val
            .parse::<Environment>()
            .map_err(SchedulerError::Configuration)?;
    }

    // Application overrides
    if let Ok(val) = std::env::var("VISITS_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Visit rule overrides
    if let Ok(val) = std::env::var("VISITS_CANCEL_WINDOW_HOURS") {
        match val.trim().parse::<f64>() {
            Ok(hours) if hours.is_finite() && hours >= 0.0 => {
                config.visits.cancel_window_hours = hours;
            }
            _ => {
                tracing::warn!(
                    value = %val,
                    default_hours = DEFAULT_CANCEL_WINDOW_HOURS,
                    "Ignoring invalid VISITS_CANCEL_WINDOW_HOURS"
                );
                config.visits.cancel_window_hours = DEFAULT_CANCEL_WINDOW_HOURS;
            }
        }
    }
    if let Ok(val) = std::env::var("VISITS_DEFAULT_AGENT_ID") {
        config.visits.default_agent_id = val;
    }

    // PostgreSQL overrides
    if let Ok(val) = std::env::var("VISITS_DATABASE_URL") {
        match config.postgresql {
            Some(ref mut pg) => pg.connection_string = secret_string(val),
            None => {
                config.postgresql =
                    Some(PostgreSQLConfig::with_connection_string(secret_string(val)))
            }
        }
    }
    if let Some(ref mut pg) = config.postgresql {
        if let Ok(val) = std::env::var("VISITS_POSTGRESQL_MAX_CONNECTIONS") {
            pg.max_connections = parse_override("VISITS_POSTGRESQL_MAX_CONNECTIONS", &val)?;
        }
        if let Ok(val) = std::env::var("VISITS_POSTGRESQL_SSL_MODE") {
            pg.ssl_mode = val;
        }
    }

    // Logging overrides
    if let Ok(val) = std::env::var("VISITS_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_override("VISITS_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("VISITS_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("VISITS_LOADER_UNIT_SUBST", "test_value");
        let input = "password = \"${VISITS_LOADER_UNIT_SUBST}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "password = \"test_value\"");
        std::env::remove_var("VISITS_LOADER_UNIT_SUBST");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        let input = "password = \"${VISITS_LOADER_UNIT_NEVER_SET}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("VISITS_LOADER_UNIT_NEVER_SET"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        let input = "# url = \"${VISITS_LOADER_UNIT_NEVER_SET}\"\nkey = 1";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, input);
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config("nonexistent-visits.toml").is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
environment = "staging"

[application]
log_level = "debug"

[visits]
cancel_window_hours = 4.5
default_agent_id = "agent_042"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.environment, Environment::Staging);
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.visits.cancel_window_hours, 4.5);
        assert_eq!(config.visits.default_agent_id, "agent_042");
    }

    #[test]
    fn test_load_config_invalid_level() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[application]\nlog_level = \"loud\"\n")
            .unwrap();
        temp_file.flush().unwrap();

        let err = load_config(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("validation failed"));
    }
}

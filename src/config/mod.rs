//! Configuration management for the visit scheduler.
//!
//! # Overview
//!
//! Configuration comes from an optional TOML file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `VISITS_*` environment overrides applied after parsing
//! - Default values for every setting
//! - Validation before use
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "development"
//!
//! [application]
//! log_level = "info"
//!
//! [visits]
//! cancel_window_hours = 2.0
//! default_agent_id = "agent_001"
//!
//! [postgresql]
//! connection_string = "${VISITS_DATABASE_URL}"
//! max_connections = 10
//! ssl_mode = "prefer"
//!
//! [logging]
//! local_enabled = false
//! local_path = "./logs"
//! local_rotation = "daily"
//! ```
//!
//! Without a `[postgresql]` section (and without `VISITS_DATABASE_URL`) the
//! in-memory backend is selected.
//!
//! ```rust,no_run
//! use visit_scheduler::config::load_config;
//!
//! # fn example() {
//! match load_config("visits.toml") {
//!     Ok(config) => println!("Environment: {}", config.environment),
//!     Err(e) => eprintln!("Configuration error: {}", e),
//! }
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::load_config;
pub use schema::{
    ApplicationConfig, Environment, LoggingConfig, PostgreSQLConfig, SchedulerConfig,
    VisitsConfig,
};
pub use secret::{redact_connection_string, secret_string, SecretString, SecretValue};

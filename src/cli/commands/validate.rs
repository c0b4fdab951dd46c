//! Validate config command implementation
//!
//! This module implements the `validate-config` command: load the
//! configuration, report the backend it selects and optionally ping
//! PostgreSQL.

use super::{load_cli_config, report_error, EXIT_CONNECTION};
use crate::adapters::database::{create_postgresql_client, select_backend};
use crate::core::scheduling::BackendKind;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Also open a connection to the configured PostgreSQL database
    #[arg(long)]
    pub check_connection: bool,
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration: {config_path}");
        println!();

        let config = match load_cli_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => return Ok(report_error("Configuration validation failed", &e)),
        };

        let backend = select_backend(&config);
        println!();
        println!("Configuration Summary:");
        println!("  Environment: {}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!("  Cancel Window: {} h", config.visits.cancel_window_hours);
        println!("  Default Agent: {}", config.visits.default_agent_id);
        println!("  Backend: {backend}");
        if let Some(ref pg_config) = config.postgresql {
            use secrecy::ExposeSecret;
            println!(
                "  PostgreSQL Connection: {}",
                crate::config::redact_connection_string(
                    pg_config.connection_string.expose_secret().as_ref()
                )
            );
            println!("  Max Connections: {}", pg_config.max_connections);
            println!("  SSL Mode: {}", pg_config.ssl_mode);
        }
        println!();

        if !self.check_connection {
            return Ok(0);
        }

        if backend == BackendKind::Memory {
            println!("ℹ️  In-memory backend selected, no connection to check");
            return Ok(0);
        }

        let client = match create_postgresql_client(&config).await {
            Ok(c) => c,
            Err(e) => return Ok(report_error("Failed to create PostgreSQL client", &e)),
        };
        match client.test_connection().await {
            Ok(()) => {
                println!("✅ Connected to {}", client.connection_string_safe());
                Ok(0)
            }
            Err(e) => {
                report_error("Failed to connect to PostgreSQL", &e);
                Ok(EXIT_CONNECTION)
            }
        }
    }
}

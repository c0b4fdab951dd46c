//! Migrate command implementation
//!
//! Applies the scheduling schema to the configured PostgreSQL database.
//! Every statement is `IF NOT EXISTS`, so running it twice is harmless.

use super::{load_cli_config, report_error, EXIT_CONFIG};
use crate::adapters::database::create_postgresql_client;
use clap::Args;

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {}

impl MigrateArgs {
    /// Execute the migrate command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_cli_config(config_path) {
            Ok(c) => c,
            Err(e) => return Ok(report_error("Failed to load configuration", &e)),
        };

        if config.postgresql.is_none() {
            println!("❌ No PostgreSQL database configured");
            println!("   Add a [postgresql] section or set VISITS_DATABASE_URL");
            return Ok(EXIT_CONFIG);
        }

        let client = match create_postgresql_client(&config).await {
            Ok(c) => c,
            Err(e) => return Ok(report_error("Failed to create PostgreSQL client", &e)),
        };

        println!("🗄️  Applying schema to {}", client.connection_string_safe());
        match client.apply_schema().await {
            Ok(()) => {
                println!("✅ Schema is up to date");
                Ok(0)
            }
            Err(e) => Ok(report_error("Schema migration failed", &e)),
        }
    }
}

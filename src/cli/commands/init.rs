//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "visits.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing visit scheduler configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        match fs::write(&self.output, Self::sample_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Uncomment [postgresql] and set VISITS_DATABASE_URL for durable storage");
                println!("  3. Apply the schema: visit-scheduler migrate");
                println!("  4. Validate configuration: visit-scheduler validate-config --check-connection");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5)
            }
        }
    }

    fn sample_config() -> &'static str {
        r#"# Visit Scheduler Configuration

# development | staging | production | test
environment = "development"

[application]
# trace, debug, info, warn, error
log_level = "info"

[visits]
# Cancel and reschedule are refused once the slot starts within this many hours
cancel_window_hours = 2.0
default_agent_id = "agent_001"

# Without this section the in-memory backend is used and nothing is persisted
# [postgresql]
# connection_string = "${VISITS_DATABASE_URL}"
# max_connections = 10
# connection_timeout_seconds = 30
# statement_timeout_seconds = 30
# ssl_mode = "prefer"

[logging]
local_enabled = false
local_path = "./logs"
# daily | hourly
local_rotation = "daily"
"#
    }
}

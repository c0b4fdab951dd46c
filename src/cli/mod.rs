//! CLI interface and argument parsing
//!
//! This module provides the operator command-line interface using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Visit Scheduler - property visit booking core
#[derive(Parser, Debug)]
#[command(name = "visit-scheduler")]
#[command(version, about, long_about = None)]
#[command(author = "Visit Scheduler Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "visits.toml", env = "VISITS_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "VISITS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Apply the PostgreSQL scheduling schema
    Migrate(commands::migrate::MigrateArgs),

    /// Publish and inspect slots
    Slot(commands::slot::SlotArgs),

    /// Book, cancel, update, reschedule and list visits
    Visit(commands::visit::VisitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::slot::SlotCommand;
    use crate::cli::commands::visit::VisitCommand;
    use crate::domain::VisitStatus;

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["visit-scheduler", "validate-config", "--check-connection"]);
        assert_eq!(cli.config, "visits.toml");
        match cli.command {
            Commands::ValidateConfig(args) => assert!(args.check_connection),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_with_config_and_level() {
        let cli = Cli::parse_from([
            "visit-scheduler",
            "--config",
            "custom.toml",
            "--log-level",
            "debug",
            "migrate",
        ]);
        assert_eq!(cli.config, "custom.toml");
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::Migrate(_)));
    }

    #[test]
    fn test_cli_parse_visit_create() {
        let cli = Cli::parse_from([
            "visit-scheduler",
            "visit",
            "create",
            "--listing",
            "listing-1",
            "--slot",
            "mock-slot-2030-01-15-09:00",
            "--user",
            "user-1",
            "--key",
            "k-1",
            "--channel",
            "whatsapp",
        ]);
        let Commands::Visit(args) = cli.command else {
            panic!("expected visit command");
        };
        let VisitCommand::Create(create) = args.command else {
            panic!("expected create");
        };
        assert_eq!(create.slot, "mock-slot-2030-01-15-09:00");
        assert_eq!(create.key.as_deref(), Some("k-1"));
    }

    #[test]
    fn test_cli_parse_set_status() {
        let cli = Cli::parse_from(["visit-scheduler", "visit", "set-status", "visit_1", "no_show"]);
        let Commands::Visit(args) = cli.command else {
            panic!("expected visit command");
        };
        let VisitCommand::SetStatus(set) = args.command else {
            panic!("expected set-status");
        };
        assert_eq!(set.status, VisitStatus::NoShow);
    }

    #[test]
    fn test_cli_contact_name_requires_phone() {
        let result = Cli::try_parse_from([
            "visit-scheduler",
            "visit",
            "create",
            "--listing",
            "l",
            "--slot",
            "s",
            "--user",
            "u",
            "--contact-name",
            "Ana",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_slot_add() {
        let cli = Cli::parse_from([
            "visit-scheduler",
            "slot",
            "add",
            "--listing",
            "listing-1",
            "--start",
            "2025-01-15T09:00:00-03:00",
            "--end",
            "2025-01-15T10:00:00-03:00",
        ]);
        let Commands::Slot(args) = cli.command else {
            panic!("expected slot command");
        };
        let SlotCommand::Add(add) = args.command else {
            panic!("expected add");
        };
        assert_eq!(add.start.to_rfc3339(), "2025-01-15T12:00:00+00:00");
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["visit-scheduler", "init", "--force"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}

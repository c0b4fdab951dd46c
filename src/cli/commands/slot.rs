//! Slot commands
//!
//! `slot add` publishes an owner slot; `slot show` prints one slot,
//! materialising nothing.

use super::{open_scheduler, report_error};
use crate::domain::{ListingId, SchedulerError, Slot, SlotId, SlotSource};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};

/// Arguments for the slot command group
#[derive(Args, Debug)]
pub struct SlotArgs {
    #[command(subcommand)]
    pub command: SlotCommand,
}

#[derive(Subcommand, Debug)]
pub enum SlotCommand {
    /// Publish a bookable slot for a listing
    Add(AddSlotArgs),

    /// Show a slot
    Show(ShowSlotArgs),
}

#[derive(Args, Debug)]
pub struct AddSlotArgs {
    /// Listing the slot belongs to
    #[arg(long)]
    pub listing: String,

    /// Start time (RFC 3339, e.g. 2025-01-15T09:00:00-03:00)
    #[arg(long)]
    pub start: DateTime<Utc>,

    /// End time (RFC 3339)
    #[arg(long)]
    pub end: DateTime<Utc>,

    /// Slot id; generated when omitted
    #[arg(long)]
    pub id: Option<String>,

    /// Who authored the slot (owner, system)
    #[arg(long, default_value = "owner")]
    pub source: SlotSource,
}

#[derive(Args, Debug)]
pub struct ShowSlotArgs {
    /// Slot id
    pub id: String,
}

impl SlotArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        match &self.command {
            SlotCommand::Add(args) => args.execute(config_path).await,
            SlotCommand::Show(args) => args.execute(config_path).await,
        }
    }
}

impl AddSlotArgs {
    fn build_slot(&self) -> Result<Slot, SchedulerError> {
        let id = match &self.id {
            Some(id) => SlotId::new(id.as_str()),
            None => SlotId::new(format!("slot-{}", uuid::Uuid::new_v4())),
        }
        .map_err(SchedulerError::Validation)?;
        let listing_id = ListingId::new(self.listing.as_str()).map_err(SchedulerError::Validation)?;

        Slot::open(id, listing_id, self.start, self.end, self.source, Utc::now())
            .map_err(SchedulerError::Validation)
    }

    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let slot = match self.build_slot() {
            Ok(slot) => slot,
            Err(e) => return Ok(report_error("Invalid slot", &e)),
        };

        let scheduler = match open_scheduler(config_path).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };

        match scheduler.publish_slot(slot).await {
            Ok(stored) => {
                println!("✅ Slot {} ({})", stored.id, stored.status);
                print_slot(&stored);
                Ok(0)
            }
            Err(e) => Ok(report_error("Failed to publish slot", &e)),
        }
    }
}

impl ShowSlotArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let slot_id = match SlotId::new(self.id.as_str()) {
            Ok(id) => id,
            Err(e) => return Ok(report_error("Invalid slot id", &SchedulerError::Validation(e))),
        };

        let scheduler = match open_scheduler(config_path).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };

        match scheduler.get_slot(&slot_id).await {
            Ok(Some(slot)) => {
                print_slot(&slot);
                Ok(0)
            }
            Ok(None) => Ok(report_error(
                "Slot not found",
                &SchedulerError::SlotUnavailable(slot_id.to_string()),
            )),
            Err(e) => Ok(report_error("Failed to load slot", &e)),
        }
    }
}

fn print_slot(slot: &Slot) {
    println!("  Id:      {}", slot.id);
    println!("  Listing: {}", slot.listing_id);
    println!("  Start:   {}", slot.start_time.to_rfc3339());
    println!("  End:     {}", slot.end_time.to_rfc3339());
    println!("  Status:  {}", slot.status);
    println!("  Source:  {}", slot.source);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn args(start_hour: u32, end_hour: u32) -> AddSlotArgs {
        AddSlotArgs {
            listing: "listing-1".to_string(),
            start: Utc.with_ymd_and_hms(2025, 1, 15, start_hour, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 1, 15, end_hour, 0, 0).unwrap(),
            id: None,
            source: SlotSource::Owner,
        }
    }

    #[test]
    fn test_build_slot_generates_id() {
        let slot = args(12, 13).build_slot().unwrap();
        assert!(slot.id.as_str().starts_with("slot-"));
        assert!(slot.is_open());
    }

    #[test]
    fn test_build_slot_rejects_inverted_window() {
        let err = args(13, 12).build_slot().unwrap_err();
        assert!(matches!(err, SchedulerError::Validation(_)));
    }
}

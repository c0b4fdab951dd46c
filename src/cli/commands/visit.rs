//! Visit commands
//!
//! Drives the scheduling operations from the command line. Each subcommand
//! builds one request, calls the scheduler once and prints the outcome.

use super::{open_scheduler, report_error};
use crate::core::scheduling::{
    CancelVisitRequest, CreateVisitRequest, RescheduleVisitRequest, UpdateVisitStatusRequest,
    VisitSummary,
};
use crate::domain::{
    Actor, ContactInfo, IdempotencyKey, ListingId, SchedulerError, SlotId, UserId, Visit,
    VisitChannel, VisitId, VisitStatus,
};
use clap::{Args, Subcommand};
use std::str::FromStr;

/// Arguments for the visit command group
#[derive(Args, Debug)]
pub struct VisitArgs {
    #[command(subcommand)]
    pub command: VisitCommand,
}

#[derive(Subcommand, Debug)]
pub enum VisitCommand {
    /// Book a visit on a slot
    Create(CreateArgs),

    /// Cancel a visit and free its slot
    Cancel(CancelArgs),

    /// Move a visit to another status
    SetStatus(SetStatusArgs),

    /// Move a visit to another slot
    Reschedule(RescheduleArgs),

    /// List a user's visits grouped into upcoming, past and canceled
    List(ListArgs),

    /// Show the status history of a visit
    History(HistoryArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub listing: String,

    #[arg(long)]
    pub slot: String,

    #[arg(long)]
    pub user: String,

    /// Idempotency key; a random one is used when omitted
    #[arg(long)]
    pub key: Option<String>,

    /// Booking channel (web, whatsapp)
    #[arg(long, default_value = "web")]
    pub channel: VisitChannel,

    #[arg(long, requires = "contact_phone")]
    pub contact_name: Option<String>,

    #[arg(long, requires = "contact_name")]
    pub contact_phone: Option<String>,

    #[arg(long)]
    pub contact_email: Option<String>,

    #[arg(long)]
    pub contact_rut: Option<String>,
}

#[derive(Args, Debug)]
pub struct CancelArgs {
    pub id: String,

    #[arg(long)]
    pub reason: Option<String>,

    #[arg(long)]
    pub actor_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct SetStatusArgs {
    pub id: String,

    /// Target status (pending, confirmed, in_progress, completed, canceled, no_show)
    pub status: VisitStatus,

    #[arg(long)]
    pub reason: Option<String>,

    #[arg(long)]
    pub actor_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct RescheduleArgs {
    pub id: String,

    /// New slot id
    #[arg(long)]
    pub slot: String,

    /// Move the visit to another listing
    #[arg(long)]
    pub listing: Option<String>,

    #[arg(long)]
    pub reason: Option<String>,

    #[arg(long)]
    pub actor_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(long)]
    pub user: String,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    pub id: String,
}

fn parse_id<T: FromStr<Err = String>>(value: &str) -> Result<T, SchedulerError> {
    value.parse().map_err(SchedulerError::Validation)
}

macro_rules! try_or_exit {
    ($expr:expr, $action:literal) => {
        match $expr {
            Ok(value) => value,
            Err(e) => return Ok(report_error($action, &e)),
        }
    };
}

macro_rules! scheduler_or_exit {
    ($config_path:expr) => {
        match open_scheduler($config_path).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        }
    };
}

impl VisitArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        match &self.command {
            VisitCommand::Create(args) => args.execute(config_path).await,
            VisitCommand::Cancel(args) => args.execute(config_path).await,
            VisitCommand::SetStatus(args) => args.execute(config_path).await,
            VisitCommand::Reschedule(args) => args.execute(config_path).await,
            VisitCommand::List(args) => args.execute(config_path).await,
            VisitCommand::History(args) => args.execute(config_path).await,
        }
    }
}

impl CreateArgs {
    fn build_request(&self) -> Result<CreateVisitRequest, SchedulerError> {
        let key = match &self.key {
            Some(key) => key.clone(),
            None => uuid::Uuid::new_v4().to_string(),
        };
        let mut request = CreateVisitRequest::new(
            parse_id::<ListingId>(&self.listing)?,
            parse_id::<SlotId>(&self.slot)?,
            parse_id::<UserId>(&self.user)?,
            parse_id::<IdempotencyKey>(&key)?,
        )
        .with_channel(self.channel);

        if let (Some(name), Some(phone)) = (&self.contact_name, &self.contact_phone) {
            let mut contact = ContactInfo::new(name, phone);
            if let Some(email) = &self.contact_email {
                contact = contact.with_email(email);
            }
            if let Some(rut) = &self.contact_rut {
                contact = contact.with_rut(rut);
            }
            request = request.with_contact(contact);
        }
        Ok(request)
    }

    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let request = try_or_exit!(self.build_request(), "Invalid visit request");
        let scheduler = scheduler_or_exit!(config_path);

        let outcome = try_or_exit!(
            scheduler.create_visit(&request).await,
            "Visit could not be booked"
        );
        if outcome.is_idempotent() {
            println!("♻️  Visit already booked under key {}", request.idempotency_key);
        } else {
            println!("✅ Visit booked");
        }
        print_visit(outcome.visit());
        println!(
            "  Slot:     {} ({} - {})",
            outcome.slot().id,
            outcome.slot().start_time.to_rfc3339(),
            outcome.slot().end_time.to_rfc3339()
        );
        Ok(0)
    }
}

impl CancelArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let visit_id = try_or_exit!(parse_id::<VisitId>(&self.id), "Invalid visit id");
        let mut request =
            CancelVisitRequest::new(visit_id).with_actor(Actor::user(self.actor_id.clone()));
        if let Some(reason) = &self.reason {
            request = request.with_reason(reason);
        }

        let scheduler = scheduler_or_exit!(config_path);
        let visit = try_or_exit!(
            scheduler.cancel_visit(&request).await,
            "Visit could not be canceled"
        );
        println!("✅ Visit canceled");
        print_visit(&visit);
        Ok(0)
    }
}

impl SetStatusArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let visit_id = try_or_exit!(parse_id::<VisitId>(&self.id), "Invalid visit id");
        let mut request = UpdateVisitStatusRequest::new(visit_id, self.status)
            .with_actor(Actor::admin(self.actor_id.clone()));
        if let Some(reason) = &self.reason {
            request = request.with_reason(reason);
        }

        let scheduler = scheduler_or_exit!(config_path);
        let visit = try_or_exit!(
            scheduler.update_visit_status(&request).await,
            "Visit status could not be changed"
        );
        println!("✅ Visit is now {}", visit.status);
        print_visit(&visit);
        Ok(0)
    }
}

impl RescheduleArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let visit_id = try_or_exit!(parse_id::<VisitId>(&self.id), "Invalid visit id");
        let slot_id = try_or_exit!(parse_id::<SlotId>(&self.slot), "Invalid slot id");
        let mut request = RescheduleVisitRequest::new(visit_id, slot_id)
            .with_actor(Actor::user(self.actor_id.clone()));
        if let Some(listing) = &self.listing {
            let listing_id = try_or_exit!(parse_id::<ListingId>(listing), "Invalid listing id");
            request = request.with_listing(listing_id);
        }
        if let Some(reason) = &self.reason {
            request = request.with_reason(reason);
        }

        let scheduler = scheduler_or_exit!(config_path);
        let outcome = try_or_exit!(
            scheduler.reschedule_visit(&request).await,
            "Visit could not be rescheduled"
        );
        println!(
            "✅ Visit moved from {} to {}",
            outcome.previous_slot.id, outcome.next_slot.id
        );
        print_visit(&outcome.visit);
        Ok(0)
    }
}

impl ListArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let user_id = try_or_exit!(parse_id::<UserId>(&self.user), "Invalid user id");
        let scheduler = scheduler_or_exit!(config_path);
        let visits = try_or_exit!(
            scheduler.get_visits_by_user(&user_id).await,
            "Failed to load visits"
        );

        if self.json {
            println!("{}", serde_json::to_string_pretty(&visits)?);
            return Ok(0);
        }

        if visits.is_empty() {
            println!("No visits found for user {user_id}.");
            return Ok(0);
        }

        for (title, group) in [
            ("Upcoming", &visits.upcoming),
            ("Past", &visits.past),
            ("Canceled", &visits.canceled),
        ] {
            println!("{title} ({}):", group.len());
            print_summaries(group);
            println!();
        }
        Ok(0)
    }
}

impl HistoryArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let visit_id = try_or_exit!(parse_id::<VisitId>(&self.id), "Invalid visit id");
        let scheduler = scheduler_or_exit!(config_path);
        let entries = try_or_exit!(
            scheduler.visit_history(&visit_id).await,
            "Failed to load history"
        );

        if entries.is_empty() {
            println!("No history recorded for visit {visit_id}.");
            return Ok(0);
        }

        println!(
            "{:<26} {:<15} {:<12} {:<12} {:<8} {:<20}",
            "At", "Event", "From", "To", "Actor", "Reason"
        );
        println!("{}", "-".repeat(100));
        for entry in entries {
            println!(
                "{:<26} {:<15} {:<12} {:<12} {:<8} {:<20}",
                entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                entry.event.as_str(),
                entry.from_status.map(|s| s.as_str()).unwrap_or("-"),
                entry.to_status.map(|s| s.as_str()).unwrap_or("-"),
                entry.actor.kind.as_str(),
                entry.reason.as_deref().unwrap_or("")
            );
        }
        Ok(0)
    }
}

fn print_visit(visit: &Visit) {
    println!("  Id:       {}", visit.id);
    println!("  Listing:  {}", visit.listing_id);
    println!("  Slot:     {}", visit.slot_id);
    println!("  User:     {}", visit.user_id);
    println!("  Status:   {}", visit.status);
    println!("  Channel:  {}", visit.channel);
    println!("  Agent:    {}", visit.agent_id);
}

fn print_summaries(group: &[VisitSummary]) {
    for summary in group {
        let start = summary
            .slot_start
            .map(|s| s.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "  {:<36} {:<18} {:<12} {}",
            summary.visit.id.as_str(),
            start,
            summary.visit.status.as_str(),
            summary.visit.slot_id
        );
    }
}

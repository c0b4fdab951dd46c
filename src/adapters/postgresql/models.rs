//! PostgreSQL row models
//!
//! This module maps rows of the scheduling tables to domain types. Status
//! and enum columns are stored as their snake_case strings; an unknown value
//! is reported as a database error rather than silently defaulted.

use crate::domain::{
    Actor, ActorType, ContactInfo, HistoryEvent, IdempotencyKey, ListingId, Result,
    SchedulerError, Slot, SlotId, SlotSource, SlotStatus, UserId, Visit, VisitChannel,
    VisitHistoryEntry, VisitId, VisitStatus,
};
use chrono::{DateTime, Utc};
use std::str::FromStr;
use tokio_postgres::Row;

/// Column list for `visit_slots` selects, in the order [`slot_from_row`] reads
pub const SLOT_COLUMNS: &str = "id, listing_id, start_time, end_time, status, source, created_at";

/// Column list for `visits` selects, in the order [`visit_from_row`] reads
pub const VISIT_COLUMNS: &str =
    "id, listing_id, slot_id, user_id, status, idempotency_key, agent_id, channel, created_at";

pub const HISTORY_COLUMNS: &str = "visit_id, event_type, from_status, to_status, from_slot_id, \
     to_slot_id, reason, actor_type, actor_id, metadata, created_at";

pub const CONTACT_COLUMNS: &str = "name, phone, email, rut";

fn column<'a, T>(row: &'a Row, name: &str) -> Result<T>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get(name)
        .map_err(|e| SchedulerError::Database(format!("Failed to read column {name}: {e}")))
}

/// Parses a text column into a typed value
fn parsed<T>(row: &Row, name: &str) -> Result<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = column(row, name)?;
    raw.parse()
        .map_err(|e| SchedulerError::Database(format!("Invalid {name} in row: {e}")))
}

fn parsed_opt<T>(row: &Row, name: &str) -> Result<Option<T>>
where
    T: FromStr<Err = String>,
{
    let raw: Option<String> = column(row, name)?;
    raw.map(|value| {
        value
            .parse()
            .map_err(|e| SchedulerError::Database(format!("Invalid {name} in row: {e}")))
    })
    .transpose()
}

pub fn slot_from_row(row: &Row) -> Result<Slot> {
    Ok(Slot {
        id: parsed::<SlotId>(row, "id")?,
        listing_id: parsed::<ListingId>(row, "listing_id")?,
        start_time: column::<DateTime<Utc>>(row, "start_time")?,
        end_time: column::<DateTime<Utc>>(row, "end_time")?,
        status: parsed::<SlotStatus>(row, "status")?,
        source: parsed::<SlotSource>(row, "source")?,
        created_at: column::<DateTime<Utc>>(row, "created_at")?,
    })
}

pub fn visit_from_row(row: &Row) -> Result<Visit> {
    Ok(Visit {
        id: parsed::<VisitId>(row, "id")?,
        listing_id: parsed::<ListingId>(row, "listing_id")?,
        slot_id: parsed::<SlotId>(row, "slot_id")?,
        user_id: parsed::<UserId>(row, "user_id")?,
        status: parsed::<VisitStatus>(row, "status")?,
        idempotency_key: parsed::<IdempotencyKey>(row, "idempotency_key")?,
        agent_id: column(row, "agent_id")?,
        channel: parsed::<VisitChannel>(row, "channel")?,
        created_at: column::<DateTime<Utc>>(row, "created_at")?,
    })
}

pub fn history_from_row(row: &Row) -> Result<VisitHistoryEntry> {
    Ok(VisitHistoryEntry {
        visit_id: parsed::<VisitId>(row, "visit_id")?,
        event: parsed::<HistoryEvent>(row, "event_type")?,
        from_status: parsed_opt::<VisitStatus>(row, "from_status")?,
        to_status: parsed_opt::<VisitStatus>(row, "to_status")?,
        from_slot_id: parsed_opt::<SlotId>(row, "from_slot_id")?,
        to_slot_id: parsed_opt::<SlotId>(row, "to_slot_id")?,
        reason: column(row, "reason")?,
        actor: Actor {
            kind: parsed::<ActorType>(row, "actor_type")?,
            id: column(row, "actor_id")?,
        },
        metadata: column::<serde_json::Value>(row, "metadata")?,
        created_at: column::<DateTime<Utc>>(row, "created_at")?,
    })
}

pub fn contact_from_row(row: &Row) -> Result<ContactInfo> {
    Ok(ContactInfo {
        name: column(row, "name")?,
        phone: column(row, "phone")?,
        email: column(row, "email")?,
        rut: column(row, "rut")?,
    })
}

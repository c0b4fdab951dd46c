//! Visit entity, lifecycle states and audit history

use crate::domain::ids::{IdempotencyKey, ListingId, SlotId, UserId, VisitId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Canceled,
    NoShow,
}

impl VisitStatus {
    /// Every status, in lifecycle order
    pub const ALL: [VisitStatus; 6] = [
        VisitStatus::Pending,
        VisitStatus::Confirmed,
        VisitStatus::InProgress,
        VisitStatus::Completed,
        VisitStatus::Canceled,
        VisitStatus::NoShow,
    ];

    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
            Self::NoShow => "no_show",
        }
    }

    /// True for states with no outgoing transition
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Canceled | Self::NoShow)
    }

    /// True while the visit must hold its slot
    pub fn holds_slot(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::InProgress)
    }
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisitStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "canceled" => Ok(Self::Canceled),
            "no_show" => Ok(Self::NoShow),
            other => Err(format!("Unknown visit status: {other}")),
        }
    }
}

/// Channel the visit was booked through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitChannel {
    #[default]
    Web,
    Whatsapp,
}

impl VisitChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Whatsapp => "whatsapp",
        }
    }
}

impl fmt::Display for VisitChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisitChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "web" => Ok(Self::Web),
            "whatsapp" => Ok(Self::Whatsapp),
            other => Err(format!("Unknown visit channel: {other}")),
        }
    }
}

/// A booking of one user against one slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: VisitId,
    pub listing_id: ListingId,
    pub slot_id: SlotId,
    pub user_id: UserId,
    pub status: VisitStatus,
    pub idempotency_key: IdempotencyKey,
    pub agent_id: String,
    pub channel: VisitChannel,
    pub created_at: DateTime<Utc>,
}

/// Kind of party that triggered a visit change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    User,
    Admin,
    System,
}

impl ActorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::System => "system",
        }
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "system" => Ok(Self::System),
            other => Err(format!("Unknown actor type: {other}")),
        }
    }
}

/// The party recorded in history entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub kind: ActorType,
    pub id: Option<String>,
}

impl Actor {
    pub fn user(id: Option<String>) -> Self {
        Self {
            kind: ActorType::User,
            id,
        }
    }

    pub fn admin(id: Option<String>) -> Self {
        Self {
            kind: ActorType::Admin,
            id,
        }
    }

    pub fn system() -> Self {
        Self {
            kind: ActorType::System,
            id: None,
        }
    }
}

/// Event recorded in the visit history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryEvent {
    Created,
    StatusChanged,
    Rescheduled,
}

impl HistoryEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::StatusChanged => "status_changed",
            Self::Rescheduled => "rescheduled",
        }
    }
}

impl fmt::Display for HistoryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "status_changed" => Ok(Self::StatusChanged),
            "rescheduled" => Ok(Self::Rescheduled),
            other => Err(format!("Unknown history event: {other}")),
        }
    }
}

/// Append-only audit record of a visit change
///
/// History is best-effort: it is never the source of truth for a visit's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitHistoryEntry {
    pub visit_id: VisitId,
    pub event: HistoryEvent,
    pub from_status: Option<VisitStatus>,
    pub to_status: Option<VisitStatus>,
    pub from_slot_id: Option<SlotId>,
    pub to_slot_id: Option<SlotId>,
    pub reason: Option<String>,
    pub actor: Actor,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl VisitHistoryEntry {
    /// Starts an entry for `visit_id` with empty transition fields
    pub fn new(visit_id: VisitId, event: HistoryEvent, actor: Actor, at: DateTime<Utc>) -> Self {
        Self {
            visit_id,
            event,
            from_status: None,
            to_status: None,
            from_slot_id: None,
            to_slot_id: None,
            reason: None,
            actor,
            metadata: serde_json::Value::Object(serde_json::Map::new()),
            created_at: at,
        }
    }

    pub fn with_status(mut self, from: Option<VisitStatus>, to: VisitStatus) -> Self {
        self.from_status = from;
        self.to_status = Some(to);
        self
    }

    pub fn with_slots(mut self, from: Option<SlotId>, to: SlotId) -> Self {
        self.from_slot_id = from;
        self.to_slot_id = Some(to);
        self
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_status_round_trip() {
        for status in VisitStatus::ALL {
            assert_eq!(VisitStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert!(VisitStatus::from_str("cancelled").is_err());
    }

    #[test]
    fn test_terminal_and_holding_states_partition() {
        for status in VisitStatus::ALL {
            assert_ne!(status.is_terminal(), status.holds_slot());
        }
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&VisitStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let json = serde_json::to_string(&VisitStatus::NoShow).unwrap();
        assert_eq!(json, "\"no_show\"");
    }

    #[test]
    fn test_history_entry_builder() {
        let entry = VisitHistoryEntry::new(
            VisitId::new("visit-1").unwrap(),
            HistoryEvent::StatusChanged,
            Actor::admin(Some("admin-7".to_string())),
            Utc::now(),
        )
        .with_status(Some(VisitStatus::Confirmed), VisitStatus::Completed)
        .with_reason(Some("done".to_string()));

        assert_eq!(entry.from_status, Some(VisitStatus::Confirmed));
        assert_eq!(entry.to_status, Some(VisitStatus::Completed));
        assert_eq!(entry.actor.kind, ActorType::Admin);
        assert!(entry.metadata.as_object().unwrap().is_empty());
    }

    #[test]
    fn test_channel_default_is_web() {
        assert_eq!(VisitChannel::default(), VisitChannel::Web);
        assert_eq!(VisitChannel::from_str("whatsapp").unwrap(), VisitChannel::Whatsapp);
    }
}

//! Bookable slot entity
//!
//! A slot is a time window on one listing. Its status is the only
//! correctness-bearing field: a slot moves `open -> confirmed` exclusively
//! through a store-level conditional reservation.

use crate::domain::ids::{ListingId, SlotId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Availability state of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    /// Free to be reserved
    Open,
    /// Withheld by the owner
    Blocked,
    /// Held but not yet confirmed
    Reserved,
    /// Held by a visit
    Confirmed,
}

impl SlotStatus {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Blocked => "blocked",
            Self::Reserved => "reserved",
            Self::Confirmed => "confirmed",
        }
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "blocked" => Ok(Self::Blocked),
            "reserved" => Ok(Self::Reserved),
            "confirmed" => Ok(Self::Confirmed),
            other => Err(format!("Unknown slot status: {other}")),
        }
    }
}

/// Who authored a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotSource {
    /// Published by the listing owner
    Owner,
    /// Synthesized from a slot id encoding
    System,
}

impl SlotSource {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::System => "system",
        }
    }
}

impl fmt::Display for SlotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "system" => Ok(Self::System),
            other => Err(format!("Unknown slot source: {other}")),
        }
    }
}

/// A bookable time window tied to one listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: SlotId,
    pub listing_id: ListingId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: SlotStatus,
    pub source: SlotSource,
    pub created_at: DateTime<Utc>,
}

impl Slot {
    /// Creates an open owner-authored slot
    ///
    /// # Errors
    ///
    /// Returns an error if `end_time` is not after `start_time`.
    pub fn open(
        id: SlotId,
        listing_id: ListingId,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        source: SlotSource,
        created_at: DateTime<Utc>,
    ) -> Result<Self, String> {
        if end_time <= start_time {
            return Err(format!(
                "Slot {id} must end after it starts ({start_time} >= {end_time})"
            ));
        }
        Ok(Self {
            id,
            listing_id,
            start_time,
            end_time,
            status: SlotStatus::Open,
            source,
            created_at,
        })
    }

    pub fn is_open(&self) -> bool {
        self.status == SlotStatus::Open
    }
}

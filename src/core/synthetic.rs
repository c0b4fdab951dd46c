//! Synthetic slot id encoding
//!
//! Some callers reference slots that were never persisted; the slot id itself
//! carries the start time. Two families are recognised:
//!
//! - `mock-slot-YYYY-MM-DD-HH:MM`: local wall-clock time at UTC-03:00, 30 minute window
//! - `slot_<listingId>_<epochMillis>`: legacy encoding, 60 minute window
//!
//! [`parse_slot_id`] and the `format_*` functions are the only places that
//! know these layouts.

use crate::domain::{ListingId, Slot, SlotId, SlotSource, SlotStatus};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;

const MOCK_PREFIX: &str = "mock-slot-";
const MOCK_OFFSET_SECONDS: i32 = -3 * 3600;
const MOCK_WINDOW_MINUTES: i64 = 30;
const LEGACY_WINDOW_MINUTES: i64 = 60;

/// Time window decoded from a synthetic slot id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

fn mock_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^mock-slot-(\d{4}-\d{2}-\d{2})-(\d{2}:\d{2})$").expect("static regex")
    })
}

fn legacy_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^slot_(.+)_(\d{13})$").expect("static regex"))
}

fn mock_offset() -> FixedOffset {
    FixedOffset::east_opt(MOCK_OFFSET_SECONDS).expect("offset within range")
}

/// Decodes the time window carried by a synthetic slot id
///
/// Returns `None` for ids that match neither family or that encode an
/// impossible date or time.
pub fn parse_slot_id(slot_id: &str) -> Option<SyntheticWindow> {
    if let Some(caps) = mock_pattern().captures(slot_id) {
        let date = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()?;
        let time = NaiveTime::parse_from_str(&caps[2], "%H:%M").ok()?;
        let start = mock_offset()
            .from_local_datetime(&date.and_time(time))
            .single()?
            .with_timezone(&Utc);
        return Some(SyntheticWindow {
            start,
            end: start + Duration::minutes(MOCK_WINDOW_MINUTES),
        });
    }

    if let Some(caps) = legacy_pattern().captures(slot_id) {
        let millis: i64 = caps[2].parse().ok()?;
        let start = DateTime::<Utc>::from_timestamp_millis(millis)?;
        return Some(SyntheticWindow {
            start,
            end: start + Duration::minutes(LEGACY_WINDOW_MINUTES),
        });
    }

    None
}

pub fn is_synthetic(slot_id: &str) -> bool {
    parse_slot_id(slot_id).is_some()
}

/// Encodes a UTC-03:00 wall-clock start as a mock slot id
pub fn format_mock_slot_id(local_start: NaiveDateTime) -> String {
    format!("{MOCK_PREFIX}{}", local_start.format("%Y-%m-%d-%H:%M"))
}

/// Encodes a start instant as a legacy slot id for `listing_id`
pub fn format_legacy_slot_id(listing_id: &ListingId, start: DateTime<Utc>) -> String {
    format!("slot_{}_{:013}", listing_id, start.timestamp_millis())
}

/// Builds the open system slot a synthetic id stands for
pub fn synthesize_slot(slot_id: &SlotId, listing_id: &ListingId, now: DateTime<Utc>) -> Option<Slot> {
    let window = parse_slot_id(slot_id.as_str())?;
    Some(Slot {
        id: slot_id.clone(),
        listing_id: listing_id.clone(),
        start_time: window.start,
        end_time: window.end,
        status: SlotStatus::Open,
        source: SlotSource::System,
        created_at: now,
    })
}

//! Store abstraction traits
//!
//! This module defines the contracts that scheduling backends implement.
//! The in-memory and PostgreSQL adapters both implement [`SlotStore`] and
//! [`VisitStore`]; the scheduling service only ever sees these traits.

use crate::core::synthetic;
use crate::domain::{
    ContactInfo, IdempotencyKey, ListingId, Result, Slot, SlotId, UserId, Visit,
    VisitHistoryEntry, VisitId, VisitStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Result of inserting a visit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Row written
    Inserted(Visit),

    /// Another visit already owns the idempotency key
    DuplicateKey,
}

/// Slot availability storage
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Point lookup
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if the slot does not exist.
    async fn get_slot(&self, slot_id: &SlotId) -> Result<Option<Slot>>;

    /// Switches the slot `open -> confirmed` in one conditional write
    ///
    /// # Returns
    ///
    /// Returns the reserved slot, or `Ok(None)` if the slot is missing or not open.
    /// Of any number of concurrent callers on the same open slot, exactly one
    /// receives `Some`.
    async fn reserve_slot(&self, slot_id: &SlotId) -> Result<Option<Slot>>;

    /// Switches the slot `confirmed -> open`
    ///
    /// A no-op for slots in any other state.
    async fn release_slot(&self, slot_id: &SlotId) -> Result<()>;

    /// Inserts `slot` unless a row with its id exists
    ///
    /// # Returns
    ///
    /// Returns the stored row, which is the existing one on conflict.
    async fn insert_slot_if_absent(&self, slot: Slot) -> Result<Slot>;

    /// Persists the slot a synthetic id stands for
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if `slot_id` is not a recognised synthetic encoding.
    async fn materialize_synthetic_slot(
        &self,
        slot_id: &SlotId,
        listing_id: &ListingId,
        now: DateTime<Utc>,
    ) -> Result<Option<Slot>> {
        match synthetic::synthesize_slot(slot_id, listing_id, now) {
            Some(slot) => self.insert_slot_if_absent(slot).await.map(Some),
            None => Ok(None),
        }
    }
}

/// Visit records, idempotency index, history and contacts
#[async_trait]
pub trait VisitStore: Send + Sync {
    async fn find_by_idempotency_key(&self, key: &IdempotencyKey) -> Result<Option<Visit>>;

    async fn find_by_id(&self, visit_id: &VisitId) -> Result<Option<Visit>>;

    /// Inserts a new visit
    ///
    /// # Returns
    ///
    /// Returns [`InsertOutcome::DuplicateKey`] if the idempotency key is taken.
    async fn insert_visit(&self, visit: Visit) -> Result<InsertOutcome>;

    /// # Errors
    ///
    /// Returns `VisitNotFound` if no visit has this id.
    async fn update_status(&self, visit_id: &VisitId, status: VisitStatus) -> Result<Visit>;

    /// Moves a visit to another slot (and optionally listing) with a new status
    ///
    /// # Errors
    ///
    /// Returns `VisitNotFound` if no visit has this id.
    async fn update_slot_and_status(
        &self,
        visit_id: &VisitId,
        slot_id: &SlotId,
        listing_id: Option<&ListingId>,
        status: VisitStatus,
    ) -> Result<Visit>;

    /// All visits of a user, most recently created first
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Visit>>;

    async fn append_history(&self, entry: VisitHistoryEntry) -> Result<()>;

    /// History of a visit, oldest first
    async fn list_history(&self, visit_id: &VisitId) -> Result<Vec<VisitHistoryEntry>>;

    /// Stores contact details, replacing any previous ones for the visit
    async fn save_contact(&self, visit_id: &VisitId, contact: &ContactInfo) -> Result<()>;

    async fn find_contact(&self, visit_id: &VisitId) -> Result<Option<ContactInfo>>;
}

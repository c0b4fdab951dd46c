//! Visit scheduling orchestration
//!
//! [`VisitScheduler`] is the interface callers program against. Two
//! implementations exist:
//!
//! - [`SchedulingService`] composes a [`SlotStore`](crate::adapters::database::SlotStore),
//!   a [`VisitStore`](crate::adapters::database::VisitStore) and the transition rules
//! - [`DegradingScheduler`] wraps a durable service and re-runs calls on an
//!   in-memory delegate when the durable schema is missing outside production
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use visit_scheduler::adapters::memory::MemoryStore;
//! use visit_scheduler::core::clock::SystemClock;
//! use visit_scheduler::core::rules::CancelWindow;
//! use visit_scheduler::core::scheduling::{BackendKind, CreateVisitRequest, SchedulingService, VisitScheduler};
//! use visit_scheduler::domain::{IdempotencyKey, ListingId, SlotId, UserId};
//!
//! # async fn example() -> visit_scheduler::domain::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let service = SchedulingService::new(
//!     store.clone(),
//!     store,
//!     Arc::new(SystemClock),
//!     CancelWindow::default(),
//!     "agent_001",
//!     BackendKind::Memory,
//! );
//!
//! let request = CreateVisitRequest::new(
//!     ListingId::new("listing-1").unwrap(),
//!     SlotId::new("mock-slot-2030-01-15-09:00").unwrap(),
//!     UserId::new("user-1").unwrap(),
//!     IdempotencyKey::new("abc-1").unwrap(),
//! );
//! let outcome = service.create_visit(&request).await?;
//! assert!(!outcome.is_idempotent());
//! # Ok(())
//! # }
//! ```

pub mod fallback;
pub mod service;

pub use fallback::DegradingScheduler;
pub use service::SchedulingService;

use crate::domain::{
    Actor, ContactInfo, IdempotencyKey, ListingId, Result, Slot, SlotId, UserId, Visit,
    VisitChannel, VisitHistoryEntry, VisitId, VisitStatus,
};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// Which storage family backs a scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Durable,
    Memory,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Durable => "durable",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for [`VisitScheduler::create_visit`]
#[derive(Debug, Clone)]
pub struct CreateVisitRequest {
    pub listing_id: ListingId,
    pub slot_id: SlotId,
    pub user_id: UserId,
    pub idempotency_key: IdempotencyKey,
    pub contact: Option<ContactInfo>,
    pub channel: VisitChannel,
}

impl CreateVisitRequest {
    pub fn new(
        listing_id: ListingId,
        slot_id: SlotId,
        user_id: UserId,
        idempotency_key: IdempotencyKey,
    ) -> Self {
        Self {
            listing_id,
            slot_id,
            user_id,
            idempotency_key,
            contact: None,
            channel: VisitChannel::default(),
        }
    }

    pub fn with_contact(mut self, contact: ContactInfo) -> Self {
        self.contact = Some(contact);
        self
    }

    pub fn with_channel(mut self, channel: VisitChannel) -> Self {
        self.channel = channel;
        self
    }
}

/// Input for [`VisitScheduler::cancel_visit`]
#[derive(Debug, Clone)]
pub struct CancelVisitRequest {
    pub visit_id: VisitId,
    pub reason: Option<String>,
    /// Defaults to an anonymous `user` actor
    pub actor: Option<Actor>,
}

impl CancelVisitRequest {
    pub fn new(visit_id: VisitId) -> Self {
        Self {
            visit_id,
            reason: None,
            actor: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }
}

/// Input for [`VisitScheduler::update_visit_status`]
#[derive(Debug, Clone)]
pub struct UpdateVisitStatusRequest {
    pub visit_id: VisitId,
    pub status: VisitStatus,
    pub reason: Option<String>,
    /// Defaults to an anonymous `admin` actor
    pub actor: Option<Actor>,
}

impl UpdateVisitStatusRequest {
    pub fn new(visit_id: VisitId, status: VisitStatus) -> Self {
        Self {
            visit_id,
            status,
            reason: None,
            actor: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }
}

/// Input for [`VisitScheduler::reschedule_visit`]
#[derive(Debug, Clone)]
pub struct RescheduleVisitRequest {
    pub visit_id: VisitId,
    pub slot_id: SlotId,
    /// Moves the visit to another listing when set
    pub listing_id: Option<ListingId>,
    pub reason: Option<String>,
    /// Defaults to an anonymous `user` actor
    pub actor: Option<Actor>,
}

impl RescheduleVisitRequest {
    pub fn new(visit_id: VisitId, slot_id: SlotId) -> Self {
        Self {
            visit_id,
            slot_id,
            listing_id: None,
            reason: None,
            actor: None,
        }
    }

    pub fn with_listing(mut self, listing_id: ListingId) -> Self {
        self.listing_id = Some(listing_id);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }
}

/// Result of a create call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateVisitOutcome {
    /// A new visit was booked by this call
    Created { visit: Visit, slot: Slot },

    /// A visit already existed under the idempotency key; nothing was written
    Replayed { visit: Visit, slot: Slot },
}

impl CreateVisitOutcome {
    pub fn visit(&self) -> &Visit {
        match self {
            Self::Created { visit, .. } | Self::Replayed { visit, .. } => visit,
        }
    }

    pub fn slot(&self) -> &Slot {
        match self {
            Self::Created { slot, .. } | Self::Replayed { slot, .. } => slot,
        }
    }

    pub fn is_idempotent(&self) -> bool {
        matches!(self, Self::Replayed { .. })
    }
}

/// Result of a reschedule call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescheduleOutcome {
    pub visit: Visit,
    pub previous_slot: Slot,
    pub next_slot: Slot,
}

/// A visit together with its slot start, as listed for a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitSummary {
    #[serde(flatten)]
    pub visit: Visit,
    pub slot_start: Option<chrono::DateTime<chrono::Utc>>,
}

/// A user's visits split into buckets, each in store order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserVisits {
    pub upcoming: Vec<VisitSummary>,
    pub past: Vec<VisitSummary>,
    pub canceled: Vec<VisitSummary>,
}

impl UserVisits {
    pub fn len(&self) -> usize {
        self.upcoming.len() + self.past.len() + self.canceled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The four visit operations and the per-user query
#[async_trait]
pub trait VisitScheduler: Send + Sync {
    fn backend(&self) -> BackendKind;

    /// Books a slot, or replays the visit already stored under the idempotency key
    ///
    /// # Errors
    ///
    /// Returns `SlotUnavailable` if the slot is unknown or already taken.
    async fn create_visit(&self, request: &CreateVisitRequest) -> Result<CreateVisitOutcome>;

    /// Cancels a visit and reopens its slot
    ///
    /// # Errors
    ///
    /// Returns `VisitNotFound`, `InvalidTransition` or `CancelWindowExpired`.
    async fn cancel_visit(&self, request: &CancelVisitRequest) -> Result<Visit>;

    /// Applies an administrative status change; `canceled` also reopens the slot
    ///
    /// # Errors
    ///
    /// Returns `VisitNotFound` or `InvalidTransition`.
    async fn update_visit_status(&self, request: &UpdateVisitStatusRequest) -> Result<Visit>;

    /// Moves a pending or confirmed visit to another slot
    ///
    /// # Errors
    ///
    /// Returns `VisitNotFound`, `InvalidTransition`, `CancelWindowExpired` or
    /// `SlotUnavailable`. On any error the visit and its current slot are unchanged.
    async fn reschedule_visit(&self, request: &RescheduleVisitRequest)
        -> Result<RescheduleOutcome>;

    async fn get_visits_by_user(&self, user_id: &UserId) -> Result<UserVisits>;

    async fn get_visit(&self, visit_id: &VisitId) -> Result<Option<Visit>>;

    /// Audit trail of a visit, oldest first
    async fn visit_history(&self, visit_id: &VisitId) -> Result<Vec<VisitHistoryEntry>>;

    async fn get_slot(&self, slot_id: &SlotId) -> Result<Option<Slot>>;

    /// Stores an owner-authored slot; an existing slot with the same id is kept
    async fn publish_slot(&self, slot: Slot) -> Result<Slot>;
}

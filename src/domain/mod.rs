//! Domain models and types for the visit scheduler.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`VisitId`], [`SlotId`], [`ListingId`], [`UserId`], [`IdempotencyKey`])
//! - **Entities** ([`Slot`], [`Visit`], [`VisitHistoryEntry`], [`ContactInfo`])
//! - **Error types** ([`SchedulerError`])
//! - **Result type alias** ([`Result`])
//!
//! Identifiers are newtypes so a slot id can never be passed where a visit id
//! is expected:
//!
//! ```rust
//! use visit_scheduler::domain::{SlotId, VisitId};
//!
//! # fn example() -> Result<(), String> {
//! let slot = SlotId::new("mock-slot-2025-01-15-09:00")?;
//! let visit = VisitId::new("visit_1736942400000_abc123xyz")?;
//! // let wrong: VisitId = slot;  // Compile error!
//! # let _ = (slot, visit);
//! # Ok(())
//! # }
//! ```

pub mod contact;
pub mod errors;
pub mod ids;
pub mod result;
pub mod slot;
pub mod visit;

pub use contact::{is_valid_chilean_phone, is_valid_chilean_rut, normalize_chilean_phone, ContactInfo};
pub use errors::SchedulerError;
pub use ids::{IdempotencyKey, ListingId, SlotId, UserId, VisitId};
pub use result::Result;
pub use slot::{Slot, SlotSource, SlotStatus};
pub use visit::{
    Actor, ActorType, HistoryEvent, Visit, VisitChannel, VisitHistoryEntry, VisitStatus,
};

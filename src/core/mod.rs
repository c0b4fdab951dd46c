//! Core scheduling logic.
//!
//! # Modules
//!
//! - [`rules`] - Visit state machine, reschedule eligibility, cancel window, bucketing
//! - [`synthetic`] - Synthetic slot id encoding
//! - [`clock`] - Time source
//! - [`scheduling`] - The [`VisitScheduler`](scheduling::VisitScheduler) interface and its implementations
//!
//! # Request Flow
//!
//! 1. **Select**: the backend selector hands back one scheduler for the process
//! 2. **Slot**: the scheduler resolves and conditionally reserves the slot
//! 3. **Visit**: the visit row is inserted or updated under the idempotency index
//! 4. **Audit**: history and contact details are written best-effort

pub mod clock;
pub mod rules;
pub mod scheduling;
pub mod synthetic;

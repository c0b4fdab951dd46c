// Visit Scheduler - Property visit booking core
// Copyright (c) 2025 Visit Scheduler Contributors
// Licensed under the MIT License

//! # Visit Scheduler
//!
//! The scheduling core behind property-visit booking: users reserve a time
//! slot on a listing, and the booking then moves through a small lifecycle
//! (pending, confirmed, in progress, completed, canceled, no-show).
//!
//! ## Overview
//!
//! This library provides:
//! - **Booking** with idempotency keys: repeating a request replays the original visit
//! - **Exclusive slots**: at most one active visit holds a slot at any time
//! - **Lifecycle rules**: a transition table plus a cancel/reschedule window
//! - **Synthetic slots**: well-formed slot ids materialise on first reference
//! - **Two backends**: PostgreSQL, or an in-memory store for tests and development
//!
//! ## Architecture
//!
//! - [`cli`] - Operator command-line interface
//! - [`core`] - Business logic (rules, synthetic slots, scheduling service)
//! - [`adapters`] - Store contracts, PostgreSQL and in-memory backends
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use visit_scheduler::adapters::database::BackendSelector;
//! use visit_scheduler::config::SchedulerConfig;
//! use visit_scheduler::core::clock::SystemClock;
//! use visit_scheduler::core::scheduling::CreateVisitRequest;
//! use visit_scheduler::domain::{IdempotencyKey, ListingId, SlotId, UserId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SchedulerConfig::from_file("visits.toml")?;
//!     let selector = BackendSelector::new(config, Arc::new(SystemClock));
//!     let scheduler = selector.scheduler().await?;
//!
//!     let request = CreateVisitRequest::new(
//!         ListingId::new("listing-1")?,
//!         SlotId::new("mock-slot-2030-01-15-09:00")?,
//!         UserId::new("user-1")?,
//!         IdempotencyKey::new("checkout-42")?,
//!     );
//!     let outcome = scheduler.create_visit(&request).await?;
//!     println!("Booked {}", outcome.visit().id);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`domain::Result`], whose error type
//! [`domain::SchedulerError`] carries a stable code:
//!
//! ```rust,no_run
//! use visit_scheduler::domain::SchedulerError;
//!
//! fn describe(err: &SchedulerError) -> String {
//!     format!("{} ({})", err, err.code())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;

//! Store abstraction layer
//!
//! This module provides the trait-based store contracts and the factory that
//! selects between the PostgreSQL and in-memory backends.

pub mod factory;
pub mod traits;

pub use factory::{
    create_memory_scheduler, create_postgresql_client, create_visit_scheduler, select_backend,
    BackendSelector,
};
pub use traits::{InsertOutcome, SlotStore, VisitStore};

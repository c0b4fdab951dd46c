//! In-memory scheduling backend
//!
//! Used in tests and whenever no durable store is configured. State lives
//! only as long as the [`MemoryStore`] value.

pub mod store;

pub use store::MemoryStore;

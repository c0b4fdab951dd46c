//! PostgreSQL database integration
//!
//! This module provides the durable scheduling backend: slots, visits,
//! status history and contacts stored in PostgreSQL.

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgreSQLAdapter;
pub use client::PostgreSQLClient;

//! Persistence layer for the QueryDesk backend.
//!
//! This crate contains:
//! - Database connection management for the application store
//! - Entity definitions (database row mappings)
//! - Repository implementations, including the store and audit-sink
//!   implementations the query executor depends on

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;

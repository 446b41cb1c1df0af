//! Domain layer for the QueryDesk backend.
//!
//! This crate contains:
//! - Domain models (ConnectionProfile, SavedQuery, execution types, audit events)
//! - The query safety validator and the query executor
//! - Domain error types and the collaborator traits the executor depends on

pub mod errors;
pub mod models;
pub mod services;

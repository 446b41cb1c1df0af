//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod audit_log;
pub mod connection_profile;
pub mod saved_query;

pub use audit_log::AuditLogEntity;
pub use connection_profile::ConnectionProfileEntity;
pub use saved_query::SavedQueryEntity;

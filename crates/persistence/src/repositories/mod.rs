//! Repository implementations for database operations.

pub mod audit_log;
pub mod connection_profile;
pub mod saved_query;

pub use audit_log::AuditLogRepository;
pub use connection_profile::ConnectionProfileRepository;
pub use saved_query::SavedQueryRepository;

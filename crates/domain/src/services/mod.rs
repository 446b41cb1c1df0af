//! Domain services.

pub mod executor;
pub mod safety;

pub use executor::{
    AuditSink, ExecutionTimeouts, ProfileStore, ProtocolSession, QueryExecutor,
    SavedQueryStore, SessionFactory,
};
pub use safety::{SafetyPolicy, SafetyViolation};

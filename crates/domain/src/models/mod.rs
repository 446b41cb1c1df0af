//! Domain models.

pub mod actor;
pub mod audit_log;
pub mod connection_profile;
pub mod execution;
pub mod saved_query;

pub use actor::{Actor, ActorRole};
pub use audit_log::{AuditAction, AuditEvent, AuditLog, AuditLogPage, ListAuditLogsQuery};
pub use connection_profile::{
    ConnectionProfile, ConnectionProfileResponse, CreateConnectionRequest,
    UpdateConnectionRequest,
};
pub use execution::{
    ExecutionOutcome, ExecutionRequest, QueryParam, ResultSet, Row,
};
pub use saved_query::{
    CreateSavedQueryRequest, SavedQuery, SavedQueryResponse, UpdateSavedQueryRequest,
};

//! Domain error types.

use thiserror::Error;

/// Failure of a single lookup in the application store.
#[derive(Debug, Error)]
#[error("store error: {0}")]
pub struct StoreError(pub String);

/// Failure to persist an audit event. Always non-fatal to the caller.
#[derive(Debug, Error)]
#[error("audit write error: {0}")]
pub struct AuditWriteError(pub String);

/// Failure classification produced by the protocol session layer.
///
/// Messages carried here must already be sanitized: the session
/// implementation redacts credentials before constructing a variant.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// Host unreachable, authentication rejected, or protocol handshake failure.
    #[error("connection error: {0}")]
    Connection(String),

    /// The remote engine rejected or errored on the statement.
    #[error("query execution failed: {0}")]
    Execution(String),
}

/// Terminal failure of one execution request.
#[derive(Debug, Clone, Error)]
pub enum ExecuteError {
    /// The statement violates the safety policy. Caller-fixable.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// No resolvable connection profile for the given id.
    #[error("connection profile not found")]
    ProfileNotFound,

    /// No resolvable saved query for the given id.
    #[error("saved query not found")]
    SavedQueryNotFound,

    /// The caller may not use this saved query.
    #[error("saved query belongs to another user")]
    SavedQueryForbidden,

    /// The profile exists but is deactivated. Distinct from not-found.
    #[error("connection profile is disabled")]
    ConnectionDisabled,

    /// Network, authentication, or protocol failure toward the remote engine.
    #[error("connection error: {0}")]
    Connection(String),

    /// Connect or execute exceeded its deadline.
    #[error("timed out after {0} ms")]
    Timeout(u64),

    /// The remote engine rejected the statement.
    #[error("query execution failed: {0}")]
    Execution(String),

    /// The application store failed during profile or query resolution.
    #[error("store error: {0}")]
    Store(String),
}

impl From<SessionError> for ExecuteError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Connection(msg) => ExecuteError::Connection(msg),
            SessionError::Execution(msg) => ExecuteError::Execution(msg),
        }
    }
}

impl From<StoreError> for ExecuteError {
    fn from(err: StoreError) -> Self {
        ExecuteError::Store(err.0)
    }
}

//! Query execution orchestration.
//!
//! The executor composes the safety validator, the profile resolver, the
//! protocol session layer, and the audit sink into one call: validate,
//! resolve, connect, run, collect, close, normalize, audit. Each invocation
//! owns its own protocol session; nothing mutable is shared between
//! concurrent executions.
//!
//! Deadlines are enforced here with `tokio::time::timeout`, independent of
//! whatever the driver does internally. A connect that exceeds its deadline
//! is dropped, which tears down the half-open socket; a session that was
//! handed out is closed exactly once on every exit path, and the close
//! itself gets a grace period after which the session is dropped instead.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::time::timeout;
use uuid::Uuid;

use crate::errors::{AuditWriteError, ExecuteError, SessionError, StoreError};
use crate::models::{
    Actor, AuditAction, AuditEvent, ConnectionProfile, ExecutionOutcome, ExecutionRequest,
    QueryParam, ResultSet, Row, SavedQuery,
};
use crate::services::safety::SafetyPolicy;

/// Lookup of connection profiles by id.
///
/// Implementations must treat soft-deleted profiles as absent. The `active`
/// flag is NOT enforced here so the executor can distinguish a disabled
/// profile from a missing one.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, id: Uuid) -> Result<Option<ConnectionProfile>, StoreError>;
}

/// Lookup of saved queries by id. Soft-deleted queries are absent.
#[async_trait]
pub trait SavedQueryStore: Send + Sync {
    async fn get_saved_query(&self, id: Uuid) -> Result<Option<SavedQuery>, StoreError>;
}

/// Write-only audit trail. Failures are non-fatal to callers.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditWriteError>;
}

/// One live connect-execute-close cycle against a remote engine.
///
/// `run` submits exactly one statement. `close` must be idempotent-safe to
/// call once and is invoked by the executor on every path after a
/// successful connect.
#[async_trait]
pub trait ProtocolSession: Send {
    async fn run(
        &mut self,
        statement: &str,
        params: &[QueryParam],
    ) -> Result<Vec<Row>, SessionError>;

    async fn close(&mut self);
}

/// Opens protocol sessions for a given profile.
///
/// A connect future dropped mid-flight (deadline exceeded) must tear down
/// any half-open transport it holds.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn connect(
        &self,
        profile: &ConnectionProfile,
    ) -> Result<Box<dyn ProtocolSession>, SessionError>;
}

/// Per-phase deadlines for one execution.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionTimeouts {
    pub connect: Duration,
    pub execute: Duration,
}

impl Default for ExecutionTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_millis(5_000),
            execute: Duration::from_millis(30_000),
        }
    }
}

/// Grace period for closing a session. A transport wedged enough to miss
/// the execute deadline tends to wedge close as well; past the grace the
/// session is dropped, which tears down the transport.
const CLOSE_GRACE: Duration = Duration::from_millis(1_000);

/// Orchestrates one execution request end to end.
pub struct QueryExecutor {
    profiles: Arc<dyn ProfileStore>,
    saved_queries: Arc<dyn SavedQueryStore>,
    sessions: Arc<dyn SessionFactory>,
    audit: Arc<dyn AuditSink>,
    policy: SafetyPolicy,
    timeouts: ExecutionTimeouts,
}

impl QueryExecutor {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        saved_queries: Arc<dyn SavedQueryStore>,
        sessions: Arc<dyn SessionFactory>,
        audit: Arc<dyn AuditSink>,
        timeouts: ExecutionTimeouts,
    ) -> Self {
        Self {
            profiles,
            saved_queries,
            sessions,
            audit,
            policy: SafetyPolicy::default(),
            timeouts,
        }
    }

    /// Executes a caller-supplied statement against the given profile.
    pub async fn execute_ad_hoc(
        &self,
        request: ExecutionRequest,
    ) -> Result<ExecutionOutcome, ExecuteError> {
        self.run_audited(request, AuditAction::ExecuteAdhocQuery).await
    }

    /// Executes a stored statement.
    ///
    /// The connection override, when present, takes precedence over the
    /// query's linked profile; with neither the call fails as if the
    /// profile were missing.
    pub async fn execute_saved(
        &self,
        saved_query_id: Uuid,
        connection_override: Option<Uuid>,
        params: Vec<QueryParam>,
        actor: Actor,
        client_ip: Option<IpAddr>,
    ) -> Result<ExecutionOutcome, ExecuteError> {
        let query = match self.resolve_saved(saved_query_id, &actor).await {
            Ok(query) => query,
            Err(err) => {
                return Err(self.fail(&actor, None, client_ip, err).await);
            }
        };

        let connection_id = match connection_override.or(query.connection_id) {
            Some(id) => id,
            None => {
                return Err(self
                    .fail(&actor, None, client_ip, ExecuteError::ProfileNotFound)
                    .await);
            }
        };

        let request = ExecutionRequest {
            query_text: query.query_text,
            connection_id,
            params,
            actor,
            client_ip,
        };
        self.run_audited(request, AuditAction::ExecuteQuery).await
    }

    async fn resolve_saved(
        &self,
        saved_query_id: Uuid,
        actor: &Actor,
    ) -> Result<SavedQuery, ExecuteError> {
        let query = self
            .saved_queries
            .get_saved_query(saved_query_id)
            .await?
            .ok_or(ExecuteError::SavedQueryNotFound)?;

        if query.deleted || !query.active {
            return Err(ExecuteError::SavedQueryNotFound);
        }
        if !query.accessible_by(actor) {
            return Err(ExecuteError::SavedQueryForbidden);
        }
        Ok(query)
    }

    async fn run_audited(
        &self,
        request: ExecutionRequest,
        success_action: AuditAction,
    ) -> Result<ExecutionOutcome, ExecuteError> {
        match self.try_run(&request).await {
            Ok(outcome) => {
                self.record_audit(AuditEvent::execution(
                    &request.actor,
                    success_action,
                    request.connection_id,
                    outcome.row_count,
                    outcome.duration_ms,
                    request.client_ip,
                ))
                .await;
                Ok(outcome)
            }
            Err(err) => {
                Err(self
                    .fail(&request.actor, Some(request.connection_id), request.client_ip, err)
                    .await)
            }
        }
    }

    async fn try_run(
        &self,
        request: &ExecutionRequest,
    ) -> Result<ExecutionOutcome, ExecuteError> {
        // Reject before any I/O: an invalid statement never opens a session.
        self.policy
            .validate(&request.query_text)
            .map_err(|violation| ExecuteError::InvalidQuery(violation.to_string()))?;

        let profile = self
            .profiles
            .get_profile(request.connection_id)
            .await?
            .ok_or(ExecuteError::ProfileNotFound)?;

        if !profile.active {
            return Err(ExecuteError::ConnectionDisabled);
        }

        let start = Instant::now();
        let rows = self
            .run_session(&profile, &request.query_text, &request.params)
            .await
            .map_err(|err| sanitize(err, &profile.password))?;
        let duration_ms = start.elapsed().as_millis() as u64;

        let result_set = ResultSet::normalize(rows);
        Ok(ExecutionOutcome {
            rows: result_set.rows,
            row_count: result_set.row_count,
            duration_ms,
            database: profile.database_name,
        })
    }

    /// Connect, run one statement, close. The session is closed exactly once
    /// on every path after a successful connect; a connect that exceeds its
    /// deadline is dropped, tearing down the half-open transport. Close is
    /// bounded by [`CLOSE_GRACE`]; past it the session is dropped instead.
    async fn run_session(
        &self,
        profile: &ConnectionProfile,
        statement: &str,
        params: &[QueryParam],
    ) -> Result<Vec<Row>, ExecuteError> {
        let mut session = match timeout(self.timeouts.connect, self.sessions.connect(profile)).await
        {
            Err(_) => return Err(ExecuteError::Timeout(self.timeouts.connect.as_millis() as u64)),
            Ok(Err(err)) => return Err(err.into()),
            Ok(Ok(session)) => session,
        };

        let outcome = timeout(self.timeouts.execute, session.run(statement, params)).await;
        if timeout(CLOSE_GRACE, session.close()).await.is_err() {
            tracing::warn!("session close exceeded its grace period, dropping the transport");
        }

        match outcome {
            Err(_) => Err(ExecuteError::Timeout(self.timeouts.execute.as_millis() as u64)),
            Ok(result) => result.map_err(ExecuteError::from),
        }
    }

    /// Records a QUERY_ERROR event for the failure, then hands it back.
    async fn fail(
        &self,
        actor: &Actor,
        connection_id: Option<Uuid>,
        client_ip: Option<IpAddr>,
        err: ExecuteError,
    ) -> ExecuteError {
        self.record_audit(AuditEvent::execution_error(
            actor,
            connection_id,
            &err.to_string(),
            client_ip,
        ))
        .await;
        err
    }

    /// Audit emission failure must never mask the primary outcome.
    async fn record_audit(&self, event: AuditEvent) {
        if let Err(err) = self.audit.record(event).await {
            tracing::warn!(error = %err, "failed to record audit event");
        }
    }
}

/// Second line of defense: the session layer already redacts, but nothing
/// that leaves the executor may carry the profile secret.
fn sanitize(err: ExecuteError, secret: &str) -> ExecuteError {
    match err {
        ExecuteError::Connection(msg) => {
            ExecuteError::Connection(shared::redact::redact_secret(&msg, secret))
        }
        ExecuteError::Execution(msg) => {
            ExecuteError::Execution(shared::redact::redact_secret(&msg, secret))
        }
        other => other,
    }
}

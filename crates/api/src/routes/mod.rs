//! HTTP route handlers.

pub mod audit_logs;
pub mod connections;
pub mod execute;
pub mod health;
pub mod queries;

use domain::models::AuditEvent;
use domain::services::AuditSink;

/// Writes an audit event; failures are logged and never fail the request.
pub(crate) async fn record_audit(sink: &dyn AuditSink, event: AuditEvent) {
    if let Err(err) = sink.record(event).await {
        tracing::warn!(error = %err, "failed to record audit event");
    }
}

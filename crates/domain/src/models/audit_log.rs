//! Audit trail types.
//!
//! Every mutating action and every execution attempt produces an
//! [`AuditEvent`]. Events are write-only from the domain's perspective; the
//! persistence layer stores them and the admin API reads them back as
//! [`AuditLog`] entries.

use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::models::Actor;

/// Kind of audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    ExecuteQuery,
    ExecuteAdhocQuery,
    QueryError,
    ConnectionCreated,
    ConnectionUpdated,
    ConnectionDeleted,
    QueryCreated,
    QueryUpdated,
    QueryDeleted,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuditAction::ExecuteQuery => "EXECUTE_QUERY",
            AuditAction::ExecuteAdhocQuery => "EXECUTE_ADHOC_QUERY",
            AuditAction::QueryError => "QUERY_ERROR",
            AuditAction::ConnectionCreated => "CONNECTION_CREATED",
            AuditAction::ConnectionUpdated => "CONNECTION_UPDATED",
            AuditAction::ConnectionDeleted => "CONNECTION_DELETED",
            AuditAction::QueryCreated => "QUERY_CREATED",
            AuditAction::QueryUpdated => "QUERY_UPDATED",
            AuditAction::QueryDeleted => "QUERY_DELETED",
        };
        write!(f, "{s}")
    }
}

/// An immutable record of who did what, when, from where.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub actor_name: String,
    pub action: AuditAction,
    pub resource_type: String,
    pub client_ip: Option<IpAddr>,
    pub details: JsonValue,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(actor: &Actor, action: AuditAction, resource_type: &str) -> Self {
        Self {
            actor_name: actor.username.clone(),
            action,
            resource_type: resource_type.to_string(),
            client_ip: None,
            details: JsonValue::Null,
            timestamp: Utc::now(),
        }
    }

    pub fn with_client_ip(mut self, ip: Option<IpAddr>) -> Self {
        self.client_ip = ip;
        self
    }

    pub fn with_details(mut self, details: JsonValue) -> Self {
        self.details = details;
        self
    }

    /// Event for a completed execution.
    pub fn execution(
        actor: &Actor,
        action: AuditAction,
        connection_id: Uuid,
        row_count: usize,
        duration_ms: u64,
        client_ip: Option<IpAddr>,
    ) -> Self {
        Self::new(actor, action, "query_execution")
            .with_client_ip(client_ip)
            .with_details(json!({
                "connection_id": connection_id,
                "row_count": row_count,
                "duration_ms": duration_ms,
            }))
    }

    /// Event for a failed execution attempt.
    pub fn execution_error(
        actor: &Actor,
        connection_id: Option<Uuid>,
        reason: &str,
        client_ip: Option<IpAddr>,
    ) -> Self {
        Self::new(actor, AuditAction::QueryError, "query_execution")
            .with_client_ip(client_ip)
            .with_details(json!({
                "connection_id": connection_id,
                "reason": reason,
            }))
    }
}

/// A stored audit log entry, as read back by the admin API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AuditLog {
    pub id: Uuid,
    pub actor_name: String,
    pub action: String,
    pub resource_type: String,
    pub client_ip: Option<String>,
    pub details: Option<JsonValue>,
    pub timestamp: DateTime<Utc>,
}

/// Query parameters for listing audit logs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListAuditLogsQuery {
    pub actor_name: Option<String>,
    pub action: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListAuditLogsQuery {
    /// Effective page number, 1-based.
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Effective page size, clamped to 1..=100.
    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(50).clamp(1, 100)
    }
}

/// One page of audit log entries.
#[derive(Debug, Clone, Serialize)]
pub struct AuditLogPage {
    pub data: Vec<AuditLog>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

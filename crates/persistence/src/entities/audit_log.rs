//! Audit log entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::AuditLog;

/// Database row mapping for the audit_logs table.
#[derive(Debug, Clone, FromRow)]
pub struct AuditLogEntity {
    pub id: Uuid,
    pub actor_name: String,
    pub action: String,
    pub resource_type: String,
    pub client_ip: Option<String>,
    pub details: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<AuditLogEntity> for AuditLog {
    fn from(entity: AuditLogEntity) -> Self {
        Self {
            id: entity.id,
            actor_name: entity.actor_name,
            action: entity.action,
            resource_type: entity.resource_type,
            client_ip: entity.client_ip,
            details: entity.details,
            timestamp: entity.timestamp,
        }
    }
}

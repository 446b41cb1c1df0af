//! Audit log routes (admin-only).

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::{AuditLogPage, ListAuditLogsQuery};
use persistence::repositories::AuditLogRepository;

/// List audit logs with filtering and pagination, newest first.
#[axum::debug_handler]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Query(query): Query<ListAuditLogsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = AuditLogRepository::new(state.pool.clone());
    let (logs, total) = repo.list(&query).await?;

    let response = AuditLogPage {
        data: logs,
        page: query.page(),
        per_page: query.per_page(),
        total,
    };

    Ok((StatusCode::OK, Json(response)))
}

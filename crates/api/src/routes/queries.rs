//! Saved query CRUD endpoints.
//!
//! Visibility is creator-or-admin. Statement text passes the safety policy
//! at create and update time; an unsafe statement is never persisted.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::ClientIp;
use crate::routes::record_audit;
use domain::models::{
    Actor, AuditAction, AuditEvent, CreateSavedQueryRequest, SavedQueryResponse,
    UpdateSavedQueryRequest,
};
use domain::services::SafetyPolicy;
use persistence::repositories::{AuditLogRepository, SavedQueryRepository};

/// List saved queries visible to the caller.
#[axum::debug_handler]
pub async fn list_queries(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = SavedQueryRepository::new(state.pool.clone());
    let queries = repo.list_visible_to(actor.id, actor.is_admin()).await?;

    let response: Vec<SavedQueryResponse> = queries.into_iter().map(Into::into).collect();
    Ok((StatusCode::OK, Json(response)))
}

/// Get a single saved query.
#[axum::debug_handler]
pub async fn get_query(
    State(state): State<AppState>,
    Path(query_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = SavedQueryRepository::new(state.pool.clone());
    let query = repo
        .find_by_id(query_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Saved query not found".into()))?;

    if !query.accessible_by(&actor) {
        return Err(ApiError::Forbidden(
            "Saved query belongs to another user".into(),
        ));
    }

    Ok((StatusCode::OK, Json(SavedQueryResponse::from(query))))
}

/// Create a saved query.
#[axum::debug_handler]
pub async fn create_query(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Extension(ClientIp(client_ip)): Extension<ClientIp>,
    Json(body): Json<CreateSavedQueryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    body.validate()?;
    SafetyPolicy::default()
        .validate(&body.query_text)
        .map_err(|violation| ApiError::Validation(violation.to_string()))?;

    let repo = SavedQueryRepository::new(state.pool.clone());
    let query = repo.create(&body, actor.id).await?;

    let audit = AuditLogRepository::new(state.pool.clone());
    record_audit(
        &audit,
        AuditEvent::new(&actor, AuditAction::QueryCreated, "saved_query")
            .with_client_ip(client_ip)
            .with_details(json!({
                "query_id": query.id,
                "name": query.name,
                "connection_id": query.connection_id,
            })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(SavedQueryResponse::from(query))))
}

/// Partially update a saved query.
#[axum::debug_handler]
pub async fn update_query(
    State(state): State<AppState>,
    Path(query_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Extension(ClientIp(client_ip)): Extension<ClientIp>,
    Json(body): Json<UpdateSavedQueryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    body.validate()?;
    if let Some(ref query_text) = body.query_text {
        SafetyPolicy::default()
            .validate(query_text)
            .map_err(|violation| ApiError::Validation(violation.to_string()))?;
    }

    let repo = SavedQueryRepository::new(state.pool.clone());
    let existing = repo
        .find_by_id(query_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Saved query not found".into()))?;
    if !existing.accessible_by(&actor) {
        return Err(ApiError::Forbidden(
            "Saved query belongs to another user".into(),
        ));
    }

    let query = repo
        .update(query_id, &body, actor.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Saved query not found".into()))?;

    let audit = AuditLogRepository::new(state.pool.clone());
    record_audit(
        &audit,
        AuditEvent::new(&actor, AuditAction::QueryUpdated, "saved_query")
            .with_client_ip(client_ip)
            .with_details(json!({
                "query_id": query.id,
                "changed": changed_fields(&body),
            })),
    )
    .await;

    Ok((StatusCode::OK, Json(SavedQueryResponse::from(query))))
}

/// Soft-delete a saved query.
#[axum::debug_handler]
pub async fn delete_query(
    State(state): State<AppState>,
    Path(query_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Extension(ClientIp(client_ip)): Extension<ClientIp>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = SavedQueryRepository::new(state.pool.clone());
    let existing = repo
        .find_by_id(query_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Saved query not found".into()))?;
    if !existing.accessible_by(&actor) {
        return Err(ApiError::Forbidden(
            "Saved query belongs to another user".into(),
        ));
    }

    if !repo.soft_delete(query_id, actor.id).await? {
        return Err(ApiError::NotFound("Saved query not found".into()));
    }

    let audit = AuditLogRepository::new(state.pool.clone());
    record_audit(
        &audit,
        AuditEvent::new(&actor, AuditAction::QueryDeleted, "saved_query")
            .with_client_ip(client_ip)
            .with_details(json!({ "query_id": query_id })),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

fn changed_fields(patch: &UpdateSavedQueryRequest) -> serde_json::Value {
    let mut changed = Vec::new();
    if patch.name.is_some() {
        changed.push("name");
    }
    if patch.description.is_some() {
        changed.push("description");
    }
    if patch.query_text.is_some() {
        changed.push("query_text");
    }
    if patch.connection_id.is_some() {
        changed.push("connection_id");
    }
    if patch.active.is_some() {
        changed.push("active");
    }
    json!(changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_fields_lists_present_fields() {
        let patch = UpdateSavedQueryRequest {
            name: Some("renamed".into()),
            active: Some(false),
            ..Default::default()
        };
        assert_eq!(changed_fields(&patch), json!(["name", "active"]));
    }

    #[test]
    fn test_changed_fields_empty() {
        assert_eq!(
            changed_fields(&UpdateSavedQueryRequest::default()),
            json!([])
        );
    }
}

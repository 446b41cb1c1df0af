//! Connection profile CRUD endpoints.
//!
//! Reads are open to any authenticated actor; mutations are admin-only
//! (enforced by router middleware). The stored secret never appears in a
//! response or an audit detail.

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
    Actor, AuditAction, AuditEvent, ConnectionProfileResponse, CreateConnectionRequest,
    UpdateConnectionRequest,
};
use persistence::repositories::{AuditLogRepository, ConnectionProfileRepository};
use shared::redact::REDACTED;

/// List all non-deleted connection profiles.
#[axum::debug_handler]
pub async fn list_connections(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ConnectionProfileRepository::new(state.pool.clone());
    let profiles = repo.list().await?;

    let response: Vec<ConnectionProfileResponse> =
        profiles.into_iter().map(Into::into).collect();
    Ok((StatusCode::OK, Json(response)))
}

/// Get a single connection profile.
#[axum::debug_handler]
pub async fn get_connection(
    State(state): State<AppState>,
    Path(connection_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ConnectionProfileRepository::new(state.pool.clone());

    match repo.find_by_id(connection_id).await? {
        Some(profile) => Ok((
            StatusCode::OK,
            Json(ConnectionProfileResponse::from(profile)),
        )),
        None => Err(ApiError::NotFound("Connection profile not found".into())),
    }
}

/// Register a new connection profile.
#[axum::debug_handler]
pub async fn create_connection(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Extension(ClientIp(client_ip)): Extension<ClientIp>,
    Json(body): Json<CreateConnectionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    body.validate()?;

    let repo = ConnectionProfileRepository::new(state.pool.clone());
    if repo.name_exists(&body.name).await? {
        return Err(ApiError::Conflict(format!(
            "Connection profile '{}' already exists",
            body.name
        )));
    }

    let profile = repo.create(&body, actor.id).await?;

    let audit = AuditLogRepository::new(state.pool.clone());
    record_audit(
        &audit,
        AuditEvent::new(&actor, AuditAction::ConnectionCreated, "connection_profile")
            .with_client_ip(client_ip)
            .with_details(json!({
                "connection_id": profile.id,
                "name": profile.name,
                "host": profile.host,
                "port": profile.port,
                "database_name": profile.database_name,
            })),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(ConnectionProfileResponse::from(profile)),
    ))
}

/// Partially update a connection profile. An omitted password keeps the
/// stored secret.
#[axum::debug_handler]
pub async fn update_connection(
    State(state): State<AppState>,
    Path(connection_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Extension(ClientIp(client_ip)): Extension<ClientIp>,
    Json(body): Json<UpdateConnectionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    body.validate()?;
    if body.is_empty() {
        return Err(ApiError::Validation("No fields to update".into()));
    }

    let changed = changed_fields(&body);

    let repo = ConnectionProfileRepository::new(state.pool.clone());
    let profile = repo
        .update(connection_id, &body, actor.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Connection profile not found".into()))?;

    let audit = AuditLogRepository::new(state.pool.clone());
    record_audit(
        &audit,
        AuditEvent::new(&actor, AuditAction::ConnectionUpdated, "connection_profile")
            .with_client_ip(client_ip)
            .with_details(json!({
                "connection_id": profile.id,
                "changed": changed,
            })),
    )
    .await;

    Ok((
        StatusCode::OK,
        Json(ConnectionProfileResponse::from(profile)),
    ))
}

/// Soft-delete a connection profile.
#[axum::debug_handler]
pub async fn delete_connection(
    State(state): State<AppState>,
    Path(connection_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Extension(ClientIp(client_ip)): Extension<ClientIp>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ConnectionProfileRepository::new(state.pool.clone());
    if !repo.soft_delete(connection_id, actor.id).await? {
        return Err(ApiError::NotFound("Connection profile not found".into()));
    }

    let audit = AuditLogRepository::new(state.pool.clone());
    record_audit(
        &audit,
        AuditEvent::new(&actor, AuditAction::ConnectionDeleted, "connection_profile")
            .with_client_ip(client_ip)
            .with_details(json!({ "connection_id": connection_id })),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Audit detail for an update: which fields changed, with the secret value
/// replaced by the redaction marker.
fn changed_fields(patch: &UpdateConnectionRequest) -> serde_json::Value {
    let mut changed = serde_json::Map::new();
    if let Some(ref name) = patch.name {
        changed.insert("name".into(), json!(name));
    }
    if let Some(ref host) = patch.host {
        changed.insert("host".into(), json!(host));
    }
    if let Some(port) = patch.port {
        changed.insert("port".into(), json!(port));
    }
    if let Some(ref database_name) = patch.database_name {
        changed.insert("database_name".into(), json!(database_name));
    }
    if let Some(ref username) = patch.username {
        changed.insert("username".into(), json!(username));
    }
    if patch.password.is_some() {
        changed.insert("password".into(), json!(REDACTED));
    }
    if let Some(active) = patch.active {
        changed.insert("active".into(), json!(active));
    }
    serde_json::Value::Object(changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_fields_redacts_password() {
        let patch = UpdateConnectionRequest {
            password: Some("hunter2".into()),
            active: Some(false),
            ..Default::default()
        };
        let details = changed_fields(&patch);
        assert_eq!(details["password"], json!(REDACTED));
        assert_eq!(details["active"], json!(false));
        assert!(!details.to_string().contains("hunter2"));
    }

    #[test]
    fn test_changed_fields_empty_patch() {
        let details = changed_fields(&UpdateConnectionRequest::default());
        assert_eq!(details, json!({}));
    }

    #[test]
    fn test_changed_fields_plain_values_pass_through() {
        let patch = UpdateConnectionRequest {
            host: Some("erp-db.internal".into()),
            port: Some(1433),
            ..Default::default()
        };
        let details = changed_fields(&patch);
        assert_eq!(details["host"], json!("erp-db.internal"));
        assert_eq!(details["port"], json!(1433));
    }
}

//! Connection profile domain model.
//!
//! A profile holds the coordinates and credentials for reaching one remote
//! SQL Server database. Profiles are soft-deleted only, and the stored
//! secret is never serialized into any response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A stored remote database connection profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConnectionProfile {
    pub id: Uuid,
    pub name: String,
    pub host: String,
    pub port: i32,
    pub database_name: String,
    pub username: String,
    /// Secret used for the remote login. Present on the domain model for the
    /// execution path; excluded from every serialized response.
    #[serde(skip_serializing)]
    pub password: String,
    pub active: bool,
    pub deleted: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub deleted_by: Option<Uuid>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Request payload for registering a connection profile.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateConnectionRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub name: String,

    #[validate(length(min = 1, max = 255, message = "Host must be 1-255 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub host: String,

    #[validate(custom(function = "shared::validation::validate_port"))]
    pub port: i32,

    #[validate(length(min = 1, max = 255, message = "Database name must be 1-255 characters"))]
    pub database_name: String,

    #[validate(length(min = 1, max = 255, message = "Username must be 1-255 characters"))]
    pub username: String,

    #[validate(length(min = 1, max = 255, message = "Password must be 1-255 characters"))]
    pub password: String,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Request payload for updating a connection profile (partial update).
///
/// Omitted fields retain their prior value; in particular an omitted
/// password leaves the stored secret unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateConnectionRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Host must be 1-255 characters"))]
    pub host: Option<String>,

    #[validate(custom(function = "validate_optional_port"))]
    pub port: Option<i32>,

    #[validate(length(min = 1, max = 255, message = "Database name must be 1-255 characters"))]
    pub database_name: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Username must be 1-255 characters"))]
    pub username: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Password must be 1-255 characters"))]
    pub password: Option<String>,

    pub active: Option<bool>,
}

fn validate_optional_port(port: i32) -> Result<(), validator::ValidationError> {
    shared::validation::validate_port(port)
}

impl UpdateConnectionRequest {
    /// True when the patch carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.host.is_none()
            && self.port.is_none()
            && self.database_name.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.active.is_none()
    }
}

/// Response payload for connection profile operations. Never carries the secret.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ConnectionProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub host: String,
    pub port: i32,
    pub database_name: String,
    pub username: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ConnectionProfile> for ConnectionProfileResponse {
    fn from(p: ConnectionProfile) -> Self {
        Self {
            id: p.id,
            name: p.name,
            host: p.host,
            port: p.port,
            database_name: p.database_name,
            username: p.username,
            active: p.active,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> ConnectionProfile {
        ConnectionProfile {
            id: Uuid::new_v4(),
            name: "legacy-erp".into(),
            host: "erp-db.internal".into(),
            port: 1433,
            database_name: "ERP".into(),
            username: "reporting".into(),
            password: "hunter2".into(),
            active: true,
            deleted: false,
            created_by: Some(Uuid::new_v4()),
            created_at: Utc::now(),
            updated_by: None,
            updated_at: Utc::now(),
            deleted_by: None,
            deleted_at: None,
        }
    }

    #[test]
    fn test_profile_serialization_skips_password() {
        let json = serde_json::to_string(&profile()).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(!json.contains("password"));
        assert!(json.contains("\"host\":\"erp-db.internal\""));
    }

    #[test]
    fn test_response_has_no_password_field() {
        let response = ConnectionProfileResponse::from(profile());
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains("\"port\":1433"));
    }

    #[test]
    fn test_create_request_validation() {
        let request = CreateConnectionRequest {
            name: "legacy-erp".into(),
            host: "erp-db.internal".into(),
            port: 1433,
            database_name: "ERP".into(),
            username: "reporting".into(),
            password: "hunter2".into(),
            active: true,
        };
        assert!(validator::Validate::validate(&request).is_ok());
    }

    #[test]
    fn test_create_request_rejects_bad_port() {
        let request = CreateConnectionRequest {
            name: "x".into(),
            host: "h".into(),
            port: 0,
            database_name: "d".into(),
            username: "u".into(),
            password: "p".into(),
            active: true,
        };
        assert!(validator::Validate::validate(&request).is_err());
    }

    #[test]
    fn test_create_request_rejects_blank_name() {
        let request = CreateConnectionRequest {
            name: "   ".into(),
            host: "h".into(),
            port: 1433,
            database_name: "d".into(),
            username: "u".into(),
            password: "p".into(),
            active: true,
        };
        assert!(validator::Validate::validate(&request).is_err());
    }

    #[test]
    fn test_create_request_default_active() {
        let json = r#"{
            "name": "legacy-erp",
            "host": "erp-db.internal",
            "port": 1433,
            "database_name": "ERP",
            "username": "reporting",
            "password": "hunter2"
        }"#;
        let request: CreateConnectionRequest = serde_json::from_str(json).unwrap();
        assert!(request.active);
    }

    #[test]
    fn test_update_request_is_empty() {
        assert!(UpdateConnectionRequest::default().is_empty());
        let patch = UpdateConnectionRequest {
            active: Some(false),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}

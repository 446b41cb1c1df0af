//! Saved query domain model.
//!
//! A saved query is a named, persisted SQL statement, optionally linked to a
//! connection profile. Its text must pass the safety policy at create and
//! update time; persisting an unsafe statement is a hard error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::Actor;

/// A stored, reusable SQL statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SavedQuery {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub query_text: String,
    pub active: bool,
    pub deleted: bool,
    pub connection_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub deleted_by: Option<Uuid>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SavedQuery {
    /// Ownership check for read/update/delete/execute: the creator or any
    /// admin may use the query.
    pub fn accessible_by(&self, actor: &Actor) -> bool {
        actor.is_admin() || self.created_by == Some(actor.id)
    }
}

/// Request payload for creating a saved query.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateSavedQueryRequest {
    #[validate(length(min = 3, max = 255, message = "Name must be 3-255 characters"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    #[validate(custom(function = "shared::validation::validate_query_text"))]
    pub query_text: String,

    pub connection_id: Option<Uuid>,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Request payload for updating a saved query (partial update).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateSavedQueryRequest {
    #[validate(length(min = 3, max = 255, message = "Name must be 3-255 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    #[validate(custom(function = "validate_optional_query_text"))]
    pub query_text: Option<String>,

    pub connection_id: Option<Uuid>,

    pub active: Option<bool>,
}

fn validate_optional_query_text(text: &str) -> Result<(), validator::ValidationError> {
    shared::validation::validate_query_text(text)
}

/// Response payload for saved query operations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SavedQueryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub query_text: String,
    pub active: bool,
    pub connection_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SavedQuery> for SavedQueryResponse {
    fn from(q: SavedQuery) -> Self {
        Self {
            id: q.id,
            name: q.name,
            description: q.description,
            query_text: q.query_text,
            active: q.active,
            connection_id: q.connection_id,
            created_by: q.created_by,
            created_at: q.created_at,
            updated_at: q.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActorRole;

    fn saved_query(created_by: Uuid) -> SavedQuery {
        SavedQuery {
            id: Uuid::new_v4(),
            name: "monthly revenue".into(),
            description: None,
            query_text: "SELECT month, total FROM revenue".into(),
            active: true,
            deleted: false,
            connection_id: None,
            created_by: Some(created_by),
            created_at: Utc::now(),
            updated_by: None,
            updated_at: Utc::now(),
            deleted_by: None,
            deleted_at: None,
        }
    }

    fn actor(role: ActorRole) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            username: "alice".into(),
            role,
        }
    }

    #[test]
    fn test_creator_can_access() {
        let owner = actor(ActorRole::User);
        let query = saved_query(owner.id);
        assert!(query.accessible_by(&owner));
    }

    #[test]
    fn test_other_user_cannot_access() {
        let query = saved_query(Uuid::new_v4());
        assert!(!query.accessible_by(&actor(ActorRole::User)));
    }

    #[test]
    fn test_admin_can_access_any() {
        let query = saved_query(Uuid::new_v4());
        assert!(query.accessible_by(&actor(ActorRole::Admin)));
    }

    #[test]
    fn test_create_request_rejects_short_name() {
        let request = CreateSavedQueryRequest {
            name: "ab".into(),
            description: None,
            query_text: "SELECT 1".into(),
            connection_id: None,
            active: true,
        };
        assert!(validator::Validate::validate(&request).is_err());
    }

    #[test]
    fn test_create_request_rejects_empty_text() {
        let request = CreateSavedQueryRequest {
            name: "valid name".into(),
            description: None,
            query_text: "   ".into(),
            connection_id: None,
            active: true,
        };
        assert!(validator::Validate::validate(&request).is_err());
    }

    #[test]
    fn test_create_request_ok() {
        let request = CreateSavedQueryRequest {
            name: "monthly revenue".into(),
            description: Some("totals per month".into()),
            query_text: "SELECT month, total FROM revenue".into(),
            connection_id: Some(Uuid::new_v4()),
            active: true,
        };
        assert!(validator::Validate::validate(&request).is_ok());
    }
}

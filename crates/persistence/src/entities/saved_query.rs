//! Saved query entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::SavedQuery;

/// Database row mapping for the saved_queries table.
#[derive(Debug, Clone, FromRow)]
pub struct SavedQueryEntity {
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

impl From<SavedQueryEntity> for SavedQuery {
    fn from(entity: SavedQueryEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            description: entity.description,
            query_text: entity.query_text,
            active: entity.active,
            deleted: entity.deleted,
            connection_id: entity.connection_id,
            created_by: entity.created_by,
            created_at: entity.created_at,
            updated_by: entity.updated_by,
            updated_at: entity.updated_at,
            deleted_by: entity.deleted_by,
            deleted_at: entity.deleted_at,
        }
    }
}

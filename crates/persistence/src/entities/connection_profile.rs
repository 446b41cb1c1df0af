//! Connection profile entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::ConnectionProfile;

/// Database row mapping for the connection_profiles table.
#[derive(Debug, Clone, FromRow)]
pub struct ConnectionProfileEntity {
    pub id: Uuid,
    pub name: String,
    pub host: String,
    pub port: i32,
    pub database_name: String,
    pub username: String,
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

impl From<ConnectionProfileEntity> for ConnectionProfile {
    fn from(entity: ConnectionProfileEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            host: entity.host,
            port: entity.port,
            database_name: entity.database_name,
            username: entity.username,
            password: entity.password,
            active: entity.active,
            deleted: entity.deleted,
            created_by: entity.created_by,
            created_at: entity.created_at,
            updated_by: entity.updated_by,
            updated_at: entity.updated_at,
            deleted_by: entity.deleted_by,
            deleted_at: entity.deleted_at,
        }
    }
}

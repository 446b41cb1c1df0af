//! Connection profile repository for database operations.
//!
//! Profiles are never hard-deleted: delete flips the `deleted` flag, clears
//! `active`, and stamps the deleter. Every lookup used for execution
//! filters `deleted = FALSE` so a removed profile is simply absent.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use domain::errors::StoreError;
use domain::models::{ConnectionProfile, CreateConnectionRequest, UpdateConnectionRequest};
use domain::services::ProfileStore;

use crate::entities::ConnectionProfileEntity;
use crate::metrics::QueryTimer;

/// Repository for connection profile database operations.
#[derive(Clone)]
pub struct ConnectionProfileRepository {
    pool: PgPool,
}

impl ConnectionProfileRepository {
    /// Creates a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a new connection profile.
    pub async fn create(
        &self,
        input: &CreateConnectionRequest,
        created_by: Uuid,
    ) -> Result<ConnectionProfile, sqlx::Error> {
        let timer = QueryTimer::new("create_connection_profile");
        let result = sqlx::query_as::<_, ConnectionProfileEntity>(
            r#"
            INSERT INTO connection_profiles
                (name, host, port, database_name, username, password, active, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.host)
        .bind(input.port)
        .bind(&input.database_name)
        .bind(&input.username)
        .bind(&input.password)
        .bind(input.active)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(Into::into)
    }

    /// Find a profile by id, excluding soft-deleted rows.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ConnectionProfile>, sqlx::Error> {
        let timer = QueryTimer::new("find_connection_profile_by_id");
        let result = sqlx::query_as::<_, ConnectionProfileEntity>(
            r#"
            SELECT * FROM connection_profiles
            WHERE id = $1 AND deleted = FALSE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map(|entity| entity.map(Into::into))
    }

    /// List all non-deleted profiles, newest first.
    pub async fn list(&self) -> Result<Vec<ConnectionProfile>, sqlx::Error> {
        let timer = QueryTimer::new("list_connection_profiles");
        let result = sqlx::query_as::<_, ConnectionProfileEntity>(
            r#"
            SELECT * FROM connection_profiles
            WHERE deleted = FALSE
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result.map(|entities| entities.into_iter().map(Into::into).collect())
    }

    /// Partial update. Omitted fields retain their prior value; in
    /// particular an omitted password leaves the stored secret unchanged.
    pub async fn update(
        &self,
        id: Uuid,
        patch: &UpdateConnectionRequest,
        updated_by: Uuid,
    ) -> Result<Option<ConnectionProfile>, sqlx::Error> {
        let timer = QueryTimer::new("update_connection_profile");
        let result = sqlx::query_as::<_, ConnectionProfileEntity>(
            r#"
            UPDATE connection_profiles SET
                name = COALESCE($2, name),
                host = COALESCE($3, host),
                port = COALESCE($4, port),
                database_name = COALESCE($5, database_name),
                username = COALESCE($6, username),
                password = COALESCE($7, password),
                active = COALESCE($8, active),
                updated_by = $9,
                updated_at = NOW()
            WHERE id = $1 AND deleted = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.host)
        .bind(patch.port)
        .bind(&patch.database_name)
        .bind(&patch.username)
        .bind(&patch.password)
        .bind(patch.active)
        .bind(updated_by)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map(|entity| entity.map(Into::into))
    }

    /// Soft delete: marks the row deleted and inactive, stamps the deleter.
    /// Returns false when no non-deleted row matched.
    pub async fn soft_delete(&self, id: Uuid, deleted_by: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("soft_delete_connection_profile");
        let result = sqlx::query(
            r#"
            UPDATE connection_profiles SET
                deleted = TRUE,
                active = FALSE,
                deleted_by = $2,
                deleted_at = NOW()
            WHERE id = $1 AND deleted = FALSE
            "#,
        )
        .bind(id)
        .bind(deleted_by)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|done| done.rows_affected() > 0)
    }

    /// Check whether a non-deleted profile with this name already exists.
    pub async fn name_exists(&self, name: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("connection_profile_name_exists");
        let result: Result<(i64,), sqlx::Error> = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM connection_profiles
            WHERE name = $1 AND deleted = FALSE
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result?.0 > 0)
    }
}

#[async_trait]
impl ProfileStore for ConnectionProfileRepository {
    async fn get_profile(&self, id: Uuid) -> Result<Option<ConnectionProfile>, StoreError> {
        self.find_by_id(id)
            .await
            .map_err(|err| StoreError(err.to_string()))
    }
}

//! Saved query repository for database operations.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use domain::errors::StoreError;
use domain::models::{CreateSavedQueryRequest, SavedQuery, UpdateSavedQueryRequest};
use domain::services::SavedQueryStore;

use crate::entities::SavedQueryEntity;
use crate::metrics::QueryTimer;

/// Repository for saved query database operations.
#[derive(Clone)]
pub struct SavedQueryRepository {
    pool: PgPool,
}

impl SavedQueryRepository {
    /// Creates a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new saved query. The caller has already run the statement
    /// through the safety policy; unsafe text never reaches this point.
    pub async fn create(
        &self,
        input: &CreateSavedQueryRequest,
        created_by: Uuid,
    ) -> Result<SavedQuery, sqlx::Error> {
        let timer = QueryTimer::new("create_saved_query");
        let result = sqlx::query_as::<_, SavedQueryEntity>(
            r#"
            INSERT INTO saved_queries
                (name, description, query_text, connection_id, active, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.query_text)
        .bind(input.connection_id)
        .bind(input.active)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(Into::into)
    }

    /// Find a saved query by id, excluding soft-deleted rows.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<SavedQuery>, sqlx::Error> {
        let timer = QueryTimer::new("find_saved_query_by_id");
        let result = sqlx::query_as::<_, SavedQueryEntity>(
            r#"
            SELECT * FROM saved_queries
            WHERE id = $1 AND deleted = FALSE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map(|entity| entity.map(Into::into))
    }

    /// List queries visible to a caller: admins see everything, users see
    /// their own. Newest first.
    pub async fn list_visible_to(
        &self,
        caller_id: Uuid,
        is_admin: bool,
    ) -> Result<Vec<SavedQuery>, sqlx::Error> {
        let timer = QueryTimer::new("list_saved_queries");
        let result = sqlx::query_as::<_, SavedQueryEntity>(
            r#"
            SELECT * FROM saved_queries
            WHERE deleted = FALSE AND ($2 OR created_by = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(caller_id)
        .bind(is_admin)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result.map(|entities| entities.into_iter().map(Into::into).collect())
    }

    /// Partial update. Omitted fields retain their prior value.
    pub async fn update(
        &self,
        id: Uuid,
        patch: &UpdateSavedQueryRequest,
        updated_by: Uuid,
    ) -> Result<Option<SavedQuery>, sqlx::Error> {
        let timer = QueryTimer::new("update_saved_query");
        let result = sqlx::query_as::<_, SavedQueryEntity>(
            r#"
            UPDATE saved_queries SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                query_text = COALESCE($4, query_text),
                connection_id = COALESCE($5, connection_id),
                active = COALESCE($6, active),
                updated_by = $7,
                updated_at = NOW()
            WHERE id = $1 AND deleted = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(&patch.query_text)
        .bind(patch.connection_id)
        .bind(patch.active)
        .bind(updated_by)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map(|entity| entity.map(Into::into))
    }

    /// Soft delete. Returns false when no non-deleted row matched.
    pub async fn soft_delete(&self, id: Uuid, deleted_by: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("soft_delete_saved_query");
        let result = sqlx::query(
            r#"
            UPDATE saved_queries SET
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
}

#[async_trait]
impl SavedQueryStore for SavedQueryRepository {
    async fn get_saved_query(&self, id: Uuid) -> Result<Option<SavedQuery>, StoreError> {
        self.find_by_id(id)
            .await
            .map_err(|err| StoreError(err.to_string()))
    }
}

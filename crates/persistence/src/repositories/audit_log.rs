//! Audit log repository for database operations.
//!
//! Insert-only from the domain's perspective; the admin API reads entries
//! back with filtering and pagination.

use async_trait::async_trait;
use sqlx::PgPool;

use domain::errors::AuditWriteError;
use domain::models::{AuditEvent, AuditLog, ListAuditLogsQuery};
use domain::services::AuditSink;

use crate::entities::AuditLogEntity;
use crate::metrics::QueryTimer;

/// Helper for building dynamic WHERE clauses from audit log filters.
struct AuditLogFilterBuilder {
    conditions: Vec<String>,
    param_count: i32,
}

impl AuditLogFilterBuilder {
    fn build(query: &ListAuditLogsQuery) -> Self {
        let mut conditions = Vec::new();
        let mut param_count = 0;

        if query.actor_name.is_some() {
            param_count += 1;
            conditions.push(format!("actor_name = ${param_count}"));
        }
        if query.action.is_some() {
            param_count += 1;
            conditions.push(format!("action = ${param_count}"));
        }
        if query.from.is_some() {
            param_count += 1;
            conditions.push(format!("timestamp >= ${param_count}"));
        }
        if query.to.is_some() {
            param_count += 1;
            conditions.push(format!("timestamp <= ${param_count}"));
        }

        Self {
            conditions,
            param_count,
        }
    }

    fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            "TRUE".to_string()
        } else {
            self.conditions.join(" AND ")
        }
    }
}

/// Binds the optional filter parameters in the same order the builder
/// numbered them.
macro_rules! bind_query_filters {
    ($builder:expr, $query:expr) => {{
        let mut b = $builder;
        if let Some(ref actor_name) = $query.actor_name {
            b = b.bind(actor_name);
        }
        if let Some(ref action) = $query.action {
            b = b.bind(action);
        }
        if let Some(ref from) = $query.from {
            b = b.bind(from);
        }
        if let Some(ref to) = $query.to {
            b = b.bind(to);
        }
        b
    }};
}

/// Repository for audit log database operations.
#[derive(Clone)]
pub struct AuditLogRepository {
    pool: PgPool,
}

impl AuditLogRepository {
    /// Creates a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new audit log entry.
    pub async fn insert(&self, event: &AuditEvent) -> Result<AuditLog, sqlx::Error> {
        let timer = QueryTimer::new("insert_audit_log");
        let details = if event.details.is_null() {
            None
        } else {
            Some(event.details.clone())
        };

        let result = sqlx::query_as::<_, AuditLogEntity>(
            r#"
            INSERT INTO audit_logs (actor_name, action, resource_type, client_ip, details, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&event.actor_name)
        .bind(event.action.to_string())
        .bind(&event.resource_type)
        .bind(event.client_ip.map(|ip| ip.to_string()))
        .bind(details)
        .bind(event.timestamp)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(Into::into)
    }

    /// List audit logs matching the filters, newest first, with the total
    /// count for pagination.
    pub async fn list(
        &self,
        query: &ListAuditLogsQuery,
    ) -> Result<(Vec<AuditLog>, i64), sqlx::Error> {
        // A duration sample is recorded on the error path as well.
        let timer = QueryTimer::new("list_audit_logs");
        let result = self.fetch_page(query).await;
        timer.record();
        result
    }

    async fn fetch_page(
        &self,
        query: &ListAuditLogsQuery,
    ) -> Result<(Vec<AuditLog>, i64), sqlx::Error> {
        let filters = AuditLogFilterBuilder::build(query);
        let where_clause = filters.where_clause();

        let count_sql = format!("SELECT COUNT(*) FROM audit_logs WHERE {where_clause}");
        let count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
        let (total,) = bind_query_filters!(count_query, query)
            .fetch_one(&self.pool)
            .await?;

        let limit_param = filters.param_count + 1;
        let offset_param = filters.param_count + 2;
        let list_sql = format!(
            "SELECT * FROM audit_logs WHERE {where_clause} \
             ORDER BY timestamp DESC LIMIT ${limit_param} OFFSET ${offset_param}"
        );
        let per_page = query.per_page();
        let offset = (query.page() - 1) * per_page;

        let list_query = sqlx::query_as::<_, AuditLogEntity>(&list_sql);
        let entities = bind_query_filters!(list_query, query)
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((entities.into_iter().map(Into::into).collect(), total))
    }
}

#[async_trait]
impl AuditSink for AuditLogRepository {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditWriteError> {
        self.insert(&event)
            .await
            .map(|_| ())
            .map_err(|err| AuditWriteError(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_builder_empty() {
        let filters = AuditLogFilterBuilder::build(&ListAuditLogsQuery::default());
        assert_eq!(filters.where_clause(), "TRUE");
        assert_eq!(filters.param_count, 0);
    }

    #[test]
    fn test_filter_builder_numbers_params_in_order() {
        let query = ListAuditLogsQuery {
            actor_name: Some("alice".into()),
            action: Some("EXECUTE_QUERY".into()),
            from: Some(chrono::Utc::now()),
            to: None,
            page: None,
            per_page: None,
        };
        let filters = AuditLogFilterBuilder::build(&query);
        assert_eq!(
            filters.where_clause(),
            "actor_name = $1 AND action = $2 AND timestamp >= $3"
        );
        assert_eq!(filters.param_count, 3);
    }
}

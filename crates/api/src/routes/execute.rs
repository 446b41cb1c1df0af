//! Remote query execution endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_query_execution;
use crate::middleware::ClientIp;
use domain::models::{Actor, ExecutionOutcome, ExecutionRequest, QueryParam, Row};

/// Body for ad-hoc execution.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AdhocExecutionBody {
    pub connection_id: Uuid,
    pub query: String,
    #[serde(default)]
    pub params: Vec<QueryParam>,
}

/// Body for saved-query execution. Both fields optional; `{}` is valid.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SavedExecutionBody {
    pub connection_id: Option<Uuid>,
    #[serde(default)]
    pub params: Vec<QueryParam>,
}

/// Execution response envelope.
#[derive(Debug, Serialize)]
pub struct ExecutionResponse {
    pub success: bool,
    pub data: Vec<Row>,
    pub metadata: ExecutionMetadata,
}

#[derive(Debug, Serialize)]
pub struct ExecutionMetadata {
    pub row_count: usize,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Uuid>,
    pub database: String,
}

impl ExecutionResponse {
    fn from_outcome(outcome: ExecutionOutcome, query: Option<Uuid>) -> Self {
        Self {
            success: true,
            metadata: ExecutionMetadata {
                row_count: outcome.row_count,
                duration_ms: outcome.duration_ms,
                query,
                database: outcome.database,
            },
            data: outcome.rows,
        }
    }
}

/// Execute a caller-supplied statement against a connection profile.
#[axum::debug_handler]
pub async fn execute_ad_hoc(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Extension(ClientIp(client_ip)): Extension<ClientIp>,
    Json(body): Json<AdhocExecutionBody>,
) -> Result<impl IntoResponse, ApiError> {
    let request = ExecutionRequest {
        query_text: body.query,
        connection_id: body.connection_id,
        params: body.params,
        actor,
        client_ip,
    };

    let outcome = observe(state.executor.execute_ad_hoc(request).await)?;
    Ok((StatusCode::OK, Json(ExecutionResponse::from_outcome(outcome, None))))
}

/// Execute a saved query, optionally overriding its linked connection.
#[axum::debug_handler]
pub async fn execute_saved(
    State(state): State<AppState>,
    Path(query_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Extension(ClientIp(client_ip)): Extension<ClientIp>,
    Json(body): Json<SavedExecutionBody>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = observe(
        state
            .executor
            .execute_saved(query_id, body.connection_id, body.params, actor, client_ip)
            .await,
    )?;
    Ok((
        StatusCode::OK,
        Json(ExecutionResponse::from_outcome(outcome, Some(query_id))),
    ))
}

/// Counts the execution outcome before the error mapping consumes it.
fn observe(
    result: Result<ExecutionOutcome, domain::errors::ExecuteError>,
) -> Result<ExecutionOutcome, ApiError> {
    match result {
        Ok(outcome) => {
            record_query_execution("success", outcome.duration_ms as f64 / 1000.0);
            Ok(outcome)
        }
        Err(err) => {
            record_query_execution("failure", 0.0);
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_adhoc_body_params_default_empty() {
        let body: AdhocExecutionBody = serde_json::from_value(json!({
            "connection_id": Uuid::new_v4(),
            "query": "SELECT 1"
        }))
        .unwrap();
        assert!(body.params.is_empty());
    }

    #[test]
    fn test_adhoc_body_typed_params() {
        let body: AdhocExecutionBody = serde_json::from_value(json!({
            "connection_id": Uuid::new_v4(),
            "query": "SELECT * FROM orders WHERE id = @P1",
            "params": [{"type": "int", "value": 42}]
        }))
        .unwrap();
        assert_eq!(body.params, vec![QueryParam::Int(42)]);
    }

    #[test]
    fn test_saved_body_empty_object_is_valid() {
        let body: SavedExecutionBody = serde_json::from_value(json!({})).unwrap();
        assert!(body.connection_id.is_none());
        assert!(body.params.is_empty());
    }

    #[test]
    fn test_response_envelope_shape() {
        let outcome = ExecutionOutcome {
            rows: vec![vec![("n".to_string(), json!(1))].into_iter().collect()],
            row_count: 1,
            duration_ms: 12,
            database: "ERP".into(),
        };
        let response = ExecutionResponse::from_outcome(outcome, None);
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["success"], json!(true));
        assert_eq!(value["data"], json!([{"n": 1}]));
        assert_eq!(value["metadata"]["row_count"], json!(1));
        assert_eq!(value["metadata"]["database"], json!("ERP"));
        assert!(value["metadata"].get("query").is_none());
    }

    #[test]
    fn test_response_envelope_carries_saved_query_id() {
        let id = Uuid::new_v4();
        let outcome = ExecutionOutcome {
            rows: Vec::new(),
            row_count: 0,
            duration_ms: 3,
            database: "ERP".into(),
        };
        let response = ExecutionResponse::from_outcome(outcome, Some(id));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["metadata"]["query"], json!(id));
        assert_eq!(value["metadata"]["row_count"], json!(0));
    }
}

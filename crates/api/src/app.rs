use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, require_actor, require_admin, trace_id,
};
use crate::routes::{audit_logs, connections, execute, health, queries};
use crate::services::TdsSessionFactory;
use domain::services::QueryExecutor;
use persistence::repositories::{
    AuditLogRepository, ConnectionProfileRepository, SavedQueryRepository,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub executor: Arc<QueryExecutor>,
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let config = Arc::new(config);

    let executor = Arc::new(QueryExecutor::new(
        Arc::new(ConnectionProfileRepository::new(pool.clone())),
        Arc::new(SavedQueryRepository::new(pool.clone())),
        Arc::new(TdsSessionFactory::new()),
        Arc::new(AuditLogRepository::new(pool.clone())),
        config.execution.timeouts(),
    ));

    let state = AppState {
        pool,
        config: config.clone(),
        executor,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Production: only allow specified origins
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Admin-only surface. The admin check runs after actor extraction
    // (inner layer = runs later).
    let admin_routes = Router::new()
        .route("/api/v1/connections", post(connections::create_connection))
        .route(
            "/api/v1/connections/:connection_id",
            axum::routing::patch(connections::update_connection)
                .delete(connections::delete_connection),
        )
        .route("/api/v1/audit-logs", get(audit_logs::list_audit_logs))
        .route_layer(middleware::from_fn(require_admin));

    // Routes available to any authenticated actor
    let actor_routes = Router::new()
        // Execution
        .route("/api/v1/execute", post(execute::execute_ad_hoc))
        .route(
            "/api/v1/queries/:query_id/execute",
            post(execute::execute_saved),
        )
        // Saved queries (creator-or-admin enforced per handler)
        .route(
            "/api/v1/queries",
            get(queries::list_queries).post(queries::create_query),
        )
        .route(
            "/api/v1/queries/:query_id",
            get(queries::get_query)
                .patch(queries::update_query)
                .delete(queries::delete_query),
        )
        // Connection profiles (reads; mutations live on the admin router)
        .route("/api/v1/connections", get(connections::list_connections))
        .route(
            "/api/v1/connections/:connection_id",
            get(connections::get_connection),
        )
        .merge(admin_routes)
        // Actor extraction runs first (outermost layer = runs first)
        .route_layer(middleware::from_fn(require_actor));

    // Public routes (no gateway identity required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::ready))
        .route("/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(actor_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware)) // Prometheus metrics
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id)) // Request ID and logging
        .layer(cors)
        .with_state(state)
}

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers::{
    applications_handler, data_handler, health_handler, ingest_handler, monitoring_handler,
    record_request, register_handler, AppState,
};

pub fn create_router(state: AppState, push_path: &str) -> Router {
    Router::new()
        // Pull + admin surfaces
        .route(
            "/monitoring",
            get(monitoring_handler).post(register_handler),
        )
        .route("/monitoring/applications", get(applications_handler))
        .route("/monitoring/health", get(health_handler))
        // This instance's own data, for pulling collectors
        .route("/monitoring/data", get(data_handler))
        // Push ingest surface
        .route(push_path, post(ingest_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            record_request,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

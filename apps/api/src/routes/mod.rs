pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::search::handlers as search_handlers;
use crate::similarity::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Lookup by job (Mode 1)
        .route("/api/v1/jobs", get(handlers::handle_list_jobs))
        .route(
            "/api/v1/jobs/:job_id/matches",
            get(handlers::handle_job_matches),
        )
        // Threshold filter + drilldown (Mode 2)
        .route("/api/v1/pairs", get(handlers::handle_pairs))
        .route("/api/v1/pairs/drilldown", get(handlers::handle_drilldown))
        // NLP search (Mode 3)
        .route("/api/v1/search", post(search_handlers::handle_search))
        // Matrix view
        .route("/api/v1/matrix/jobs", get(handlers::handle_matrix_jobs))
        .route(
            "/api/v1/matrix/export",
            get(handlers::handle_matrix_export),
        )
        .route("/api/v1/matrix/:job_id", get(handlers::handle_matrix_row))
        .with_state(state)
}

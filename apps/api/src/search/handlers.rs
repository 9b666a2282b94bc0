//! Axum route handler for natural-language search.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::search::{enrich_rows, SearchRow};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct SearchQueryResponse {
    pub query: String,
    pub count: usize,
    pub results: Vec<SearchRow>,
    pub notice: Option<String>,
}

/// POST /api/v1/search
///
/// Delegates the query to the configured engine and joins job metadata onto the rows.
pub async fn handle_search(
    State(state): State<AppState>,
    Json(request): Json<SearchQueryRequest>,
) -> Result<Json<SearchQueryResponse>, AppError> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(AppError::Validation("query cannot be empty".to_string()));
    }

    let rows = state.search.search(query).await?;
    info!("Search returned {} rows", rows.len());

    let results = enrich_rows(rows, &state.snapshot.jobs);
    let notice = results
        .is_empty()
        .then(|| "No jobs matched the query.".to_string());

    Ok(Json(SearchQueryResponse {
        query: query.to_string(),
        count: results.len(),
        results,
        notice,
    }))
}

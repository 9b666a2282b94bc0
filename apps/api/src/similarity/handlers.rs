//! Axum route handlers for the lookup, threshold, drilldown and matrix views.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::normalize::normalize_job_id;
use crate::errors::AppError;
use crate::similarity::drilldown::{build_drilldown, default_match_count, Drilldown, DrilldownRow};
use crate::similarity::export::{matrix_to_csv, rows_to_csv, CsvColumns, CsvFile, OutputFormat};
use crate::similarity::lookup::{enrich, job_options, matches_for_job, EnrichedPair, JobOption};
use crate::similarity::matrix::{matrix_row, MatrixCell};
use crate::similarity::pairs::{summarize, DistributionBucket, MatchCountPolicy};
use crate::state::AppState;

const DEFAULT_MIN_SIMILARITY: f64 = 50.0;
const DEFAULT_THRESHOLD: f64 = 70.0;
const MATRIX_FILE_NAME: &str = "job_similarity_matrix.csv";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MatchesQuery {
    pub min_similarity: Option<f64>,
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Deserialize)]
pub struct PairsQuery {
    pub threshold: Option<f64>,
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Deserialize)]
pub struct DrilldownQuery {
    pub threshold: Option<f64>,
    pub match_count: Option<usize>,
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
pub struct JobMatchesResponse {
    pub job_id: String,
    pub label: String,
    pub min_similarity: f64,
    pub count: usize,
    pub matches: Vec<EnrichedPair>,
    pub notice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PairsResponse {
    pub threshold: f64,
    pub policy: MatchCountPolicy,
    pub total_pairs: usize,
    pub unique_job_ids: usize,
    pub distribution: Vec<DistributionBucket>,
    pub pairs: Vec<EnrichedPair>,
    pub notice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DrilldownResponse {
    pub threshold: f64,
    pub match_count: Option<usize>,
    pub job_count: usize,
    pub job_ids: Vec<String>,
    pub rows: Vec<DrilldownRow>,
    pub notice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MatrixRowResponse {
    pub job_id: String,
    pub label: String,
    pub cells: Vec<MatrixCell>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/jobs
///
/// Job picker for the lookup view: sorted unique source ids with display labels.
pub async fn handle_list_jobs(State(state): State<AppState>) -> Json<Vec<JobOption>> {
    let snapshot = &state.snapshot;
    Json(job_options(snapshot.source_job_ids(), &snapshot.jobs))
}

/// GET /api/v1/jobs/:job_id/matches
///
/// Roles similar to one job at or above `min_similarity` (default 50).
/// An id with no rows is an empty table, not an error.
pub async fn handle_job_matches(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(params): Query<MatchesQuery>,
) -> Result<Response, AppError> {
    let min_similarity =
        validate_percent(params.min_similarity.unwrap_or(DEFAULT_MIN_SIMILARITY), "min_similarity")?;
    let job_id = normalize_job_id(&job_id);
    let snapshot = &state.snapshot;

    let matches = enrich(
        &matches_for_job(&snapshot.records, &job_id, min_similarity),
        &snapshot.jobs,
    );
    debug!("{} matches for job {job_id} at >= {min_similarity}", matches.len());

    if params.format == OutputFormat::Csv {
        return csv_response(&matches, &format!("job_{job_id}_matches.csv"));
    }

    let notice = matches
        .is_empty()
        .then(|| format!("No roles similar to job {job_id} at {min_similarity}% or above."));

    Ok(Json(JobMatchesResponse {
        label: snapshot.jobs.label(&job_id),
        job_id,
        min_similarity,
        count: matches.len(),
        matches,
        notice,
    })
    .into_response())
}

/// GET /api/v1/pairs
///
/// Deduplicated job pairs at or above `threshold` (default 70) with the match-count summary.
pub async fn handle_pairs(
    State(state): State<AppState>,
    Query(params): Query<PairsQuery>,
) -> Result<Response, AppError> {
    let threshold = validate_percent(params.threshold.unwrap_or(DEFAULT_THRESHOLD), "threshold")?;
    let snapshot = &state.snapshot;

    let summary = summarize(&snapshot.records, threshold, state.config.match_count_policy);
    let pairs = enrich(&summary.pairs, &snapshot.jobs);

    if params.format == OutputFormat::Csv {
        return csv_response(&pairs, &format!("job_pairs_{threshold}.csv"));
    }

    Ok(Json(PairsResponse {
        threshold,
        policy: summary.policy,
        total_pairs: summary.total_pairs,
        unique_job_ids: summary.unique_job_ids,
        distribution: summary.distribution,
        pairs,
        notice: no_pairs_notice(summary.total_pairs),
    })
    .into_response())
}

/// GET /api/v1/pairs/drilldown
///
/// All pairs for the jobs whose match count equals `match_count`
/// (default: the smallest count in the distribution).
pub async fn handle_drilldown(
    State(state): State<AppState>,
    Query(params): Query<DrilldownQuery>,
) -> Result<Response, AppError> {
    let threshold = validate_percent(params.threshold.unwrap_or(DEFAULT_THRESHOLD), "threshold")?;
    let snapshot = &state.snapshot;

    let summary = summarize(&snapshot.records, threshold, state.config.match_count_policy);
    let match_count = params
        .match_count
        .or_else(|| default_match_count(&summary.distribution));

    let Drilldown { job_ids, rows, .. } = match match_count {
        Some(count) => build_drilldown(&summary, count),
        None => Drilldown {
            match_count: 0,
            job_ids: Vec::new(),
            rows: Vec::new(),
        },
    };

    if params.format == OutputFormat::Csv {
        let file_name = match match_count {
            Some(count) => format!("job_match_count_{count}.csv"),
            None => "job_match_count.csv".to_string(),
        };
        return csv_response(&rows, &file_name);
    }

    let notice = if summary.total_pairs == 0 {
        no_pairs_notice(0)
    } else if job_ids.is_empty() {
        match_count.map(|c| format!("No job IDs have exactly {c} matches."))
    } else {
        None
    };

    Ok(Json(DrilldownResponse {
        threshold,
        match_count,
        job_count: job_ids.len(),
        job_ids,
        rows,
        notice,
    })
    .into_response())
}

/// GET /api/v1/matrix/jobs
pub async fn handle_matrix_jobs(State(state): State<AppState>) -> Json<Vec<JobOption>> {
    let snapshot = &state.snapshot;
    Json(job_options(
        snapshot.matrix.row_ids().iter().map(String::as_str),
        &snapshot.jobs,
    ))
}

/// GET /api/v1/matrix/:job_id
pub async fn handle_matrix_row(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<MatrixRowResponse>, AppError> {
    let job_id = normalize_job_id(&job_id);
    let snapshot = &state.snapshot;
    let cells = matrix_row(&snapshot.matrix, &job_id)?;

    Ok(Json(MatrixRowResponse {
        label: snapshot.jobs.label(&job_id),
        job_id,
        cells,
    }))
}

/// GET /api/v1/matrix/export
pub async fn handle_matrix_export(State(state): State<AppState>) -> Result<CsvFile, AppError> {
    matrix_to_csv(&state.snapshot.matrix, MATRIX_FILE_NAME)
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn validate_percent(value: f64, name: &str) -> Result<f64, AppError> {
    if (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(AppError::Validation(format!(
            "{name} must be between 0 and 100, got {value}"
        )))
    }
}

fn no_pairs_notice(total_pairs: usize) -> Option<String> {
    (total_pairs == 0).then(|| "No matching job pairs at selected threshold.".to_string())
}

fn csv_response<T: Serialize + CsvColumns>(rows: &[T], file_name: &str) -> Result<Response, AppError> {
    Ok(rows_to_csv(rows, file_name)?.into_response())
}

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::data::loader::{parse_jobs, parse_matrix, parse_results, read_source, LoadError, ResultsTable};
use crate::data::models::{JobLookup, SimilarityMatrix, SimilarityRecord};

/// Load statistics surfaced on `/health`.
#[derive(Debug, Clone, Serialize)]
pub struct LoadStats {
    pub pair_rows: usize,
    pub skipped_pair_rows: usize,
    /// Pairs stored in both directions with different scores.
    pub asymmetric_pairs: usize,
    pub matrix_jobs: usize,
    pub metadata_jobs: usize,
    pub duplicate_metadata_rows: usize,
}

/// The three input tables, loaded once and never mutated.
/// Shared with every handler as `Arc<DataSnapshot>`.
#[derive(Debug)]
pub struct DataSnapshot {
    pub records: Vec<SimilarityRecord>,
    pub matrix: SimilarityMatrix,
    pub jobs: JobLookup,
    pub stats: LoadStats,
    pub loaded_at: DateTime<Utc>,
}

impl DataSnapshot {
    /// Reads and normalizes all three files. Blocking; call before the server starts.
    pub fn load(results_path: &Path, matrix_path: &Path, jobs_path: &Path) -> Result<Self, LoadError> {
        info!("Loading pair results from {}", results_path.display());
        let results = parse_results(&read_source(results_path)?, &table_name(results_path))?;

        info!("Loading similarity matrix from {}", matrix_path.display());
        let matrix = parse_matrix(&read_source(matrix_path)?, &table_name(matrix_path))?;

        info!("Loading job metadata from {}", jobs_path.display());
        let jobs = parse_jobs(&read_source(jobs_path)?, &table_name(jobs_path))?;

        let snapshot = Self::from_parts(results, matrix, jobs);
        info!(
            "Snapshot ready: {} pair rows, {} matrix jobs, {} metadata jobs",
            snapshot.stats.pair_rows, snapshot.stats.matrix_jobs, snapshot.stats.metadata_jobs
        );
        Ok(snapshot)
    }

    pub fn from_parts(results: ResultsTable, matrix: SimilarityMatrix, jobs: JobLookup) -> Self {
        let asymmetric_pairs = count_asymmetric_pairs(&results.records);
        if asymmetric_pairs > 0 {
            warn!(
                "{asymmetric_pairs} job pairs carry different scores in each direction; \
                 deduplication keeps the higher-ranked direction"
            );
        }

        let stats = LoadStats {
            pair_rows: results.records.len(),
            skipped_pair_rows: results.skipped_rows,
            asymmetric_pairs,
            matrix_jobs: matrix.len(),
            metadata_jobs: jobs.len(),
            duplicate_metadata_rows: jobs.duplicate_rows(),
        };

        Self {
            records: results.records,
            matrix,
            jobs,
            stats,
            loaded_at: Utc::now(),
        }
    }

    /// Sorted unique source job ids in the pair table.
    pub fn source_job_ids(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.job_id.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn table_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn count_asymmetric_pairs(records: &[SimilarityRecord]) -> usize {
    let mut first_seen: HashMap<(&str, &str), f64> = HashMap::with_capacity(records.len());
    for r in records {
        first_seen
            .entry((r.job_id.as_str(), r.compared_job_id.as_str()))
            .or_insert(r.similarity_pct);
    }

    first_seen
        .iter()
        .filter(|((a, b), _)| a < b)
        .filter(|((a, b), score)| {
            first_seen
                .get(&(*b, *a))
                .is_some_and(|reverse| (*reverse - **score).abs() > f64::EPSILON)
        })
        .count()
}

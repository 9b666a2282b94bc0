//! CSV loaders for the three input tables.
//!
//! Headers are matched on their normalized form, ids are normalized as they are read.
//! Nothing here touches the network or holds state; `DataSnapshot` calls these once at startup.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;
use tracing::{debug, warn};

use crate::data::models::{JobLookup, JobMetadata, SimilarityMatrix, SimilarityRecord};
use crate::data::normalize::{
    decode_text, non_blank, normalize_column, normalize_job_id, parse_percent,
};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Input file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{table}: required column '{column}' is missing")]
    SchemaMismatch { table: String, column: String },

    #[error("{table}: CSV error: {error}")]
    Csv {
        table: String,
        #[source]
        error: csv::Error,
    },

    #[error("{table}: row {row} has {found} cells, expected {expected}")]
    MatrixShape {
        table: String,
        row: usize,
        found: usize,
        expected: usize,
    },
}

/// Pair table rows plus the count of rows dropped for a missing similarity score.
#[derive(Debug, Clone, Default)]
pub struct ResultsTable {
    pub records: Vec<SimilarityRecord>,
    pub skipped_rows: usize,
}

/// Reads a file as text. A missing file is reported as `MissingFile`, not as an I/O error.
pub fn read_source(path: &Path) -> Result<String, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => LoadError::MissingFile(path.to_path_buf()),
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(decode_text(&bytes))
}

/// Parses the pairwise results table.
///
/// Required columns: `Job ID`, `Compared Job ID`, `Similarity %`.
/// Optional: `Text Similarity %`, `Competency Similarity %`, `Similarity Reason`.
pub fn parse_results(text: &str, table: &str) -> Result<ResultsTable, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = HeaderIndex::read(&mut rdr, table)?;

    let job_col = headers.require("job id")?;
    let compared_col = headers.require("compared job id")?;
    let similarity_col = headers.require("similarity %")?;
    let text_col = headers.optional("text similarity %");
    let competency_col = headers.optional("competency similarity %");
    let reason_col = headers.optional("similarity reason");

    let mut out = ResultsTable::default();
    for (i, rec) in rdr.records().enumerate() {
        let rec = rec.map_err(|error| csv_error(table, error))?;

        let Some(similarity_pct) = cell(&rec, Some(similarity_col)).and_then(parse_percent) else {
            debug!("{table}: skipping row {} with no similarity score", i + 2);
            out.skipped_rows += 1;
            continue;
        };

        out.records.push(SimilarityRecord {
            job_id: normalize_job_id(cell(&rec, Some(job_col)).unwrap_or("")),
            compared_job_id: normalize_job_id(cell(&rec, Some(compared_col)).unwrap_or("")),
            similarity_pct,
            text_similarity_pct: cell(&rec, text_col).and_then(parse_percent),
            competency_similarity_pct: cell(&rec, competency_col).and_then(parse_percent),
            similarity_reason: cell(&rec, reason_col).and_then(non_blank),
        });
    }

    if out.skipped_rows > 0 {
        warn!(
            "{table}: skipped {} rows without a numeric similarity score",
            out.skipped_rows
        );
    }
    Ok(out)
}

/// Parses the square matrix: first column is the row index, the header row holds column ids.
pub fn parse_matrix(text: &str, table: &str) -> Result<SimilarityMatrix, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let header = rdr
        .headers()
        .map_err(|error| csv_error(table, error))?
        .clone();

    let mut header_iter = header.iter();
    let index_name = header_iter.next().unwrap_or("").trim().to_string();
    let column_ids: Vec<String> = header_iter.map(normalize_job_id).collect();

    let mut row_ids = Vec::new();
    let mut cells = Vec::new();
    for (i, rec) in rdr.records().enumerate() {
        let rec = rec.map_err(|error| csv_error(table, error))?;
        if rec.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        if rec.len() != column_ids.len() + 1 {
            return Err(LoadError::MatrixShape {
                table: table.to_string(),
                row: i + 2,
                found: rec.len(),
                expected: column_ids.len() + 1,
            });
        }
        let mut values = rec.iter();
        row_ids.push(normalize_job_id(values.next().unwrap_or("")));
        cells.push(values.map(parse_percent).collect::<Vec<_>>());
    }

    if row_ids.len() != column_ids.len() {
        warn!(
            "{table}: matrix is not square ({} rows, {} columns)",
            row_ids.len(),
            column_ids.len()
        );
    }

    Ok(SimilarityMatrix::new(index_name, row_ids, column_ids, cells))
}

/// Parses the job metadata table (`Job ID, Job, Work Stream, Domain`).
pub fn parse_jobs(text: &str, table: &str) -> Result<JobLookup, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = HeaderIndex::read(&mut rdr, table)?;

    let id_col = headers.require("job id")?;
    let name_col = headers.require("job")?;
    let stream_col = headers.require("work stream")?;
    let domain_col = headers.require("domain")?;

    let mut rows = Vec::new();
    for rec in rdr.records() {
        let rec = rec.map_err(|error| csv_error(table, error))?;
        let job_id = normalize_job_id(cell(&rec, Some(id_col)).unwrap_or(""));
        if job_id.is_empty() {
            continue;
        }
        rows.push(JobMetadata {
            job_id,
            job_name: cell(&rec, Some(name_col)).unwrap_or("").trim().to_string(),
            work_stream: cell(&rec, Some(stream_col)).unwrap_or("").trim().to_string(),
            domain: cell(&rec, Some(domain_col)).unwrap_or("").trim().to_string(),
        });
    }

    let lookup = JobLookup::from_rows(rows);
    if lookup.duplicate_rows() > 0 {
        debug!(
            "{table}: dropped {} duplicate job id rows",
            lookup.duplicate_rows()
        );
    }
    Ok(lookup)
}

/// Normalized header name → column position. The first occurrence of a name wins.
struct HeaderIndex {
    table: String,
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    fn read<R: std::io::Read>(rdr: &mut csv::Reader<R>, table: &str) -> Result<Self, LoadError> {
        let header = rdr.headers().map_err(|error| csv_error(table, error))?;
        let mut positions = HashMap::new();
        for (pos, name) in header.iter().enumerate() {
            positions.entry(normalize_column(name)).or_insert(pos);
        }
        Ok(Self {
            table: table.to_string(),
            positions,
        })
    }

    fn require(&self, column: &str) -> Result<usize, LoadError> {
        self.optional(column)
            .ok_or_else(|| LoadError::SchemaMismatch {
                table: self.table.clone(),
                column: column.to_string(),
            })
    }

    fn optional(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }
}

fn cell(rec: &StringRecord, col: Option<usize>) -> Option<&str> {
    col.and_then(|c| rec.get(c))
}

fn csv_error(table: &str, error: csv::Error) -> LoadError {
    LoadError::Csv {
        table: table.to_string(),
        error,
    }
}

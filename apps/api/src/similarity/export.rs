//! CSV downloads for the matrix and any table view.

use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::data::models::SimilarityMatrix;
use crate::errors::AppError;

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// `?format=` on table endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

/// A finished download: bytes plus the file name offered to the browser.
#[derive(Debug, Clone)]
pub struct CsvFile {
    pub file_name: String,
    pub bytes: Bytes,
}

impl IntoResponse for CsvFile {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.file_name);
        (
            [
                (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.bytes,
        )
            .into_response()
    }
}

/// Header names of a row type, in serialization order.
///
/// serde only emits a header alongside the first row, so an empty table needs the names
/// spelled out. Must match the struct's `#[serde(rename)]`s.
pub trait CsvColumns {
    const COLUMNS: &'static [&'static str];
}

/// Serializes rows with their serde column names as the header.
/// An empty table still gets its header row.
pub fn rows_to_csv<T: Serialize + CsvColumns>(rows: &[T], file_name: &str) -> Result<CsvFile, AppError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    if rows.is_empty() {
        wtr.write_record(T::COLUMNS)
            .map_err(|e| AppError::Export(format!("failed to write header: {e}")))?;
    }
    for row in rows {
        wtr.serialize(row)
            .map_err(|e| AppError::Export(format!("failed to write row: {e}")))?;
    }
    finish(wtr, file_name)
}

/// The full matrix: index column first, then one column per job id.
pub fn matrix_to_csv(matrix: &SimilarityMatrix, file_name: &str) -> Result<CsvFile, AppError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    let header = std::iter::once(matrix.index_name()).chain(matrix.column_ids().iter().map(String::as_str));
    wtr.write_record(header)
        .map_err(|e| AppError::Export(format!("failed to write matrix header: {e}")))?;

    for (id, cells) in matrix.rows() {
        let record = std::iter::once(id.to_string()).chain(
            cells
                .iter()
                .map(|c| c.map(|v| v.to_string()).unwrap_or_default()),
        );
        wtr.write_record(record)
            .map_err(|e| AppError::Export(format!("failed to write matrix row {id}: {e}")))?;
    }

    finish(wtr, file_name)
}

fn finish(wtr: csv::Writer<Vec<u8>>, file_name: &str) -> Result<CsvFile, AppError> {
    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Export(format!("failed to flush CSV: {e}")))?;
    Ok(CsvFile {
        file_name: file_name.to_string(),
        bytes: Bytes::from(bytes),
    })
}

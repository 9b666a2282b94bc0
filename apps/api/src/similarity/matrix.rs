use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::data::models::SimilarityMatrix;
use crate::errors::AppError;

/// One cell of a matrix row, shown as a single "Similarity %" column indexed by job id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixCell {
    #[serde(rename = "Job ID")]
    pub job_id: String,
    #[serde(rename = "Similarity %")]
    pub similarity_pct: Option<f64>,
}

/// The row for `job_id`, transposed and sorted descending with missing cells last.
///
/// The matrix and the pair table are loaded independently and may disagree on which ids
/// exist, so an absent id is an `UnknownJobId` error rather than an empty row.
pub fn matrix_row(matrix: &SimilarityMatrix, job_id: &str) -> Result<Vec<MatrixCell>, AppError> {
    let row = matrix
        .row(job_id)
        .ok_or_else(|| AppError::UnknownJobId(job_id.to_string()))?;

    let mut cells: Vec<MatrixCell> = matrix
        .column_ids()
        .iter()
        .zip(row)
        .map(|(id, value)| MatrixCell {
            job_id: id.clone(),
            similarity_pct: *value,
        })
        .collect();

    cells.sort_by(|a, b| match (a.similarity_pct, b.similarity_pct) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> SimilarityMatrix {
        let ids: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        SimilarityMatrix::new(
            String::new(),
            ids.clone(),
            ids,
            vec![
                vec![Some(100.0), None, Some(64.0)],
                vec![None, Some(100.0), Some(81.0)],
                vec![Some(64.0), Some(81.0), Some(100.0)],
            ],
        )
    }

    #[test]
    fn test_row_sorted_desc_missing_last() {
        let cells = matrix_row(&matrix(), "A").unwrap();
        let order: Vec<&str> = cells.iter().map(|c| c.job_id.as_str()).collect();
        assert_eq!(order, vec!["A", "C", "B"]);
        assert_eq!(cells[2].similarity_pct, None);
    }

    #[test]
    fn test_unknown_job_is_guarded() {
        let err = matrix_row(&matrix(), "Z").unwrap_err();
        assert!(matches!(err, AppError::UnknownJobId(id) if id == "Z"));
    }
}

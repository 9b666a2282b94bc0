use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One directed row of the pairwise results table.
///
/// Serialized with the dashboard's column names so JSON and CSV share one vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityRecord {
    #[serde(rename = "Job ID")]
    pub job_id: String,
    #[serde(rename = "Compared Job ID")]
    pub compared_job_id: String,
    #[serde(rename = "Similarity %")]
    pub similarity_pct: f64,
    #[serde(rename = "Text Similarity %")]
    pub text_similarity_pct: Option<f64>,
    #[serde(rename = "Competency Similarity %")]
    pub competency_similarity_pct: Option<f64>,
    #[serde(rename = "Similarity Reason")]
    pub similarity_reason: Option<String>,
}

impl SimilarityRecord {
    pub fn is_self_pair(&self) -> bool {
        self.job_id == self.compared_job_id
    }

    pub fn involves(&self, job_id: &str) -> bool {
        self.job_id == job_id || self.compared_job_id == job_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMetadata {
    #[serde(rename = "Job ID")]
    pub job_id: String,
    #[serde(rename = "Job Name")]
    pub job_name: String,
    #[serde(rename = "Work Stream")]
    pub work_stream: String,
    #[serde(rename = "Domain")]
    pub domain: String,
}

/// Job metadata keyed by normalized job id. The first row for an id wins.
#[derive(Debug, Clone, Default)]
pub struct JobLookup {
    by_id: HashMap<String, JobMetadata>,
    duplicate_rows: usize,
}

impl JobLookup {
    pub fn from_rows(rows: impl IntoIterator<Item = JobMetadata>) -> Self {
        let mut lookup = JobLookup::default();
        for row in rows {
            if lookup.by_id.contains_key(&row.job_id) {
                lookup.duplicate_rows += 1;
                continue;
            }
            lookup.by_id.insert(row.job_id.clone(), row);
        }
        lookup
    }

    pub fn get(&self, job_id: &str) -> Option<&JobMetadata> {
        self.by_id.get(job_id)
    }

    pub fn name_of(&self, job_id: &str) -> Option<&str> {
        self.get(job_id).map(|m| m.job_name.as_str())
    }

    /// Picker label: `"{id} – {name}"`, name left blank when unknown.
    pub fn label(&self, job_id: &str) -> String {
        format!("{job_id} – {}", self.name_of(job_id).unwrap_or(""))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn duplicate_rows(&self) -> usize {
        self.duplicate_rows
    }
}

/// Square similarity matrix indexed and column-labelled by job id.
#[derive(Debug, Clone, Default)]
pub struct SimilarityMatrix {
    index_name: String,
    row_ids: Vec<String>,
    column_ids: Vec<String>,
    cells: Vec<Vec<Option<f64>>>,
    row_positions: HashMap<String, usize>,
}

impl SimilarityMatrix {
    /// Every row in `cells` must have exactly `column_ids.len()` entries; the loader checks this.
    pub fn new(
        index_name: String,
        row_ids: Vec<String>,
        column_ids: Vec<String>,
        cells: Vec<Vec<Option<f64>>>,
    ) -> Self {
        let mut row_positions = HashMap::with_capacity(row_ids.len());
        for (pos, id) in row_ids.iter().enumerate() {
            row_positions.entry(id.clone()).or_insert(pos);
        }
        Self {
            index_name,
            row_ids,
            column_ids,
            cells,
            row_positions,
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn row_ids(&self) -> &[String] {
        &self.row_ids
    }

    pub fn column_ids(&self) -> &[String] {
        &self.column_ids
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.row_ids
            .iter()
            .map(String::as_str)
            .zip(self.cells.iter().map(Vec::as_slice))
    }

    /// The cells of one row, or `None` when the id is not in the row index.
    pub fn row(&self, job_id: &str) -> Option<&[Option<f64>]> {
        self.row_positions
            .get(job_id)
            .and_then(|&pos| self.cells.get(pos))
            .map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.row_ids.len()
    }
}

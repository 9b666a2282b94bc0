//! Job-centric lookup and metadata enrichment.

use serde::{Deserialize, Serialize};

use crate::data::models::{JobLookup, SimilarityRecord};
use crate::similarity::export::CsvColumns;
use crate::similarity::pairs::filter_by_threshold;

/// A pair row left-joined with metadata for both sides, in display column order.
/// Enrichment fields are `None` when the job has no metadata row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedPair {
    #[serde(rename = "Job ID")]
    pub job_id: String,
    #[serde(rename = "Job Name")]
    pub job_name: Option<String>,
    #[serde(rename = "Work Stream")]
    pub work_stream: Option<String>,
    #[serde(rename = "Domain")]
    pub domain: Option<String>,
    #[serde(rename = "Compared Job ID")]
    pub compared_job_id: String,
    #[serde(rename = "Compared Job Name")]
    pub compared_job_name: Option<String>,
    #[serde(rename = "Compared Work Stream")]
    pub compared_work_stream: Option<String>,
    #[serde(rename = "Compared Domain")]
    pub compared_domain: Option<String>,
    #[serde(rename = "Similarity %")]
    pub similarity_pct: f64,
    #[serde(rename = "Text Similarity %")]
    pub text_similarity_pct: Option<f64>,
    #[serde(rename = "Competency Similarity %")]
    pub competency_similarity_pct: Option<f64>,
    #[serde(rename = "Similarity Reason")]
    pub similarity_reason: Option<String>,
}

impl CsvColumns for EnrichedPair {
    const COLUMNS: &'static [&'static str] = &[
        "Job ID",
        "Job Name",
        "Work Stream",
        "Domain",
        "Compared Job ID",
        "Compared Job Name",
        "Compared Work Stream",
        "Compared Domain",
        "Similarity %",
        "Text Similarity %",
        "Competency Similarity %",
        "Similarity Reason",
    ];
}

#[derive(Debug, Clone, Serialize)]
pub struct JobOption {
    pub job_id: String,
    pub label: String,
}

/// Left join on both `Job ID` and `Compared Job ID`. Never drops a row.
pub fn enrich(records: &[SimilarityRecord], jobs: &JobLookup) -> Vec<EnrichedPair> {
    records
        .iter()
        .map(|r| {
            let source = jobs.get(&r.job_id);
            let compared = jobs.get(&r.compared_job_id);
            EnrichedPair {
                job_id: r.job_id.clone(),
                job_name: source.map(|m| m.job_name.clone()),
                work_stream: source.map(|m| m.work_stream.clone()),
                domain: source.map(|m| m.domain.clone()),
                compared_job_id: r.compared_job_id.clone(),
                compared_job_name: compared.map(|m| m.job_name.clone()),
                compared_work_stream: compared.map(|m| m.work_stream.clone()),
                compared_domain: compared.map(|m| m.domain.clone()),
                similarity_pct: r.similarity_pct,
                text_similarity_pct: r.text_similarity_pct,
                competency_similarity_pct: r.competency_similarity_pct,
                similarity_reason: r.similarity_reason.clone(),
            }
        })
        .collect()
}

/// Records whose source is `job_id` with similarity at or above `min_similarity`,
/// similarity descending. `job_id` must already be normalized.
pub fn matches_for_job(
    records: &[SimilarityRecord],
    job_id: &str,
    min_similarity: f64,
) -> Vec<SimilarityRecord> {
    let for_job: Vec<SimilarityRecord> = records
        .iter()
        .filter(|r| r.job_id == job_id)
        .cloned()
        .collect();
    filter_by_threshold(&for_job, min_similarity)
}

pub fn job_options<'a>(ids: impl IntoIterator<Item = &'a str>, jobs: &JobLookup) -> Vec<JobOption> {
    ids.into_iter()
        .map(|id| JobOption {
            job_id: id.to_string(),
            label: jobs.label(id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::JobMetadata;

    fn record(a: &str, b: &str, score: f64) -> SimilarityRecord {
        SimilarityRecord {
            job_id: a.to_string(),
            compared_job_id: b.to_string(),
            similarity_pct: score,
            text_similarity_pct: Some(score - 5.0),
            competency_similarity_pct: Some(score + 5.0),
            similarity_reason: Some("overlap".to_string()),
        }
    }

    fn jobs() -> JobLookup {
        JobLookup::from_rows(vec![JobMetadata {
            job_id: "1".to_string(),
            job_name: "Data Architect".to_string(),
            work_stream: "Data".to_string(),
            domain: "Technology".to_string(),
        }])
    }

    #[test]
    fn test_matches_filtered_and_sorted() {
        let records = vec![
            record("1", "2", 55.0),
            record("1", "3", 80.0),
            record("1", "4", 20.0),
            record("2", "1", 55.0),
        ];
        let matches = matches_for_job(&records, "1", 50.0);
        let compared: Vec<&str> = matches.iter().map(|r| r.compared_job_id.as_str()).collect();
        assert_eq!(compared, vec!["3", "2"]);
    }

    #[test]
    fn test_columns_match_serialized_header() {
        let rows = enrich(&[record("1", "2", 60.0)], &jobs());
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.serialize(&rows[0]).unwrap();
        let bytes = wtr.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.lines().next().unwrap(), EnrichedPair::COLUMNS.join(","));
    }

    #[test]
    fn test_unknown_job_has_no_matches() {
        let records = vec![record("1", "2", 55.0)];
        assert!(matches_for_job(&records, "99", 0.0).is_empty());
    }

    #[test]
    fn test_enrich_is_non_lossy() {
        let records = vec![record("1", "2", 70.0), record("3", "4", 60.0)];
        let enriched = enrich(&records, &jobs());
        assert_eq!(enriched.len(), 2);

        assert_eq!(enriched[0].job_name.as_deref(), Some("Data Architect"));
        assert!(enriched[0].compared_job_name.is_none());

        // Neither side known: row kept with blank enrichment
        assert_eq!(enriched[1].job_id, "3");
        assert!(enriched[1].job_name.is_none());
        assert!(enriched[1].domain.is_none());
        assert_eq!(enriched[1].similarity_pct, 60.0);
    }

    #[test]
    fn test_job_options_labels() {
        let options = job_options(["1", "7"], &jobs());
        assert_eq!(options[0].label, "1 – Data Architect");
        assert_eq!(options[1].label, "7 – ");
    }
}

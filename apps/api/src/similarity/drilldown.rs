//! Drilldown: every pair touching the jobs that share a selected match count.

use serde::{Deserialize, Serialize};

use crate::data::models::SimilarityRecord;
use crate::similarity::export::CsvColumns;
use crate::similarity::pairs::{DistributionBucket, PairSummary};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrilldownRow {
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
    #[serde(rename = "Primary Job ID")]
    pub primary_job_id: String,
}

impl CsvColumns for DrilldownRow {
    const COLUMNS: &'static [&'static str] = &[
        "Job ID",
        "Compared Job ID",
        "Similarity %",
        "Text Similarity %",
        "Competency Similarity %",
        "Similarity Reason",
        "Primary Job ID",
    ];
}

impl DrilldownRow {
    fn new(record: &SimilarityRecord, primary_job_id: &str) -> Self {
        Self {
            job_id: record.job_id.clone(),
            compared_job_id: record.compared_job_id.clone(),
            similarity_pct: record.similarity_pct,
            text_similarity_pct: record.text_similarity_pct,
            competency_similarity_pct: record.competency_similarity_pct,
            similarity_reason: record.similarity_reason.clone(),
            primary_job_id: primary_job_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Drilldown {
    pub match_count: usize,
    pub job_ids: Vec<String>,
    pub rows: Vec<DrilldownRow>,
}

/// The smallest match count present, which is what the picker preselects.
pub fn default_match_count(distribution: &[DistributionBucket]) -> Option<usize> {
    distribution.first().map(|b| b.match_count)
}

/// Rows are the counted records where a selected job is either side, tagged with that
/// job, sorted by `(Primary Job ID, Job ID, Compared Job ID)`. A pair joining two selected
/// jobs appears once for each of them.
///
/// Under `DistinctPartners` the counted records are the deduplicated pairs. Under
/// `RawOccurrences` they are the filtered records before dedup, so a job listed with
/// count n has n cross-pair rows.
pub fn build_drilldown(summary: &PairSummary, match_count: usize) -> Drilldown {
    // match_counts is a BTreeMap, so ids come out sorted
    let job_ids: Vec<String> = summary
        .match_counts
        .iter()
        .filter(|(_, &count)| count == match_count)
        .map(|(id, _)| id.clone())
        .collect();

    let mut rows: Vec<DrilldownRow> = job_ids
        .iter()
        .flat_map(|id| {
            summary
                .counted
                .iter()
                .filter(move |r| r.involves(id))
                .map(move |r| DrilldownRow::new(r, id))
        })
        .collect();

    rows.sort_by(|a, b| {
        (&a.primary_job_id, &a.job_id, &a.compared_job_id).cmp(&(
            &b.primary_job_id,
            &b.job_id,
            &b.compared_job_id,
        ))
    });

    Drilldown {
        match_count,
        job_ids,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::pairs::{summarize, MatchCountPolicy};

    fn record(a: &str, b: &str, score: f64) -> SimilarityRecord {
        SimilarityRecord {
            job_id: a.to_string(),
            compared_job_id: b.to_string(),
            similarity_pct: score,
            text_similarity_pct: None,
            competency_similarity_pct: None,
            similarity_reason: None,
        }
    }

    fn summary() -> PairSummary {
        // A: {B, C}, B: {A}, C: {A}, D: {E}, E: {D}
        let records = vec![
            record("A", "B", 90.0),
            record("B", "A", 90.0),
            record("C", "A", 85.0),
            record("D", "E", 75.0),
            record("E", "D", 75.0),
            record("A", "F", 10.0),
        ];
        summarize(&records, 50.0, MatchCountPolicy::DistinctPartners)
    }

    #[test]
    fn test_default_match_count_is_smallest() {
        assert_eq!(default_match_count(&summary().distribution), Some(1));
        assert_eq!(default_match_count(&[]), None);
    }

    #[test]
    fn test_drilldown_rows_sorted_by_primary() {
        let drill = build_drilldown(&summary(), 1);
        assert_eq!(drill.job_ids, vec!["B", "C", "D", "E"]);

        let keys: Vec<(&str, &str, &str)> = drill
            .rows
            .iter()
            .map(|r| {
                (
                    r.primary_job_id.as_str(),
                    r.job_id.as_str(),
                    r.compared_job_id.as_str(),
                )
            })
            .collect();
        assert_eq!(
            keys,
            vec![
                ("B", "A", "B"),
                ("C", "C", "A"),
                ("D", "D", "E"),
                ("E", "D", "E"),
            ]
        );
    }

    #[test]
    fn test_drilldown_for_higher_count() {
        let drill = build_drilldown(&summary(), 2);
        assert_eq!(drill.job_ids, vec!["A"]);
        assert_eq!(drill.rows.len(), 2);
        assert!(drill.rows.iter().all(|r| r.primary_job_id == "A"));
    }

    #[test]
    fn test_raw_occurrences_rows_match_count() {
        let records = vec![record("A", "B", 90.0), record("B", "A", 90.0)];
        let summary = summarize(&records, 50.0, MatchCountPolicy::RawOccurrences);
        assert_eq!(summary.total_pairs, 1);

        let drill = build_drilldown(&summary, 2);
        assert_eq!(drill.job_ids, vec!["A", "B"]);
        let rows_for_a = drill.rows.iter().filter(|r| r.primary_job_id == "A").count();
        assert_eq!(rows_for_a, 2);
        assert_eq!(drill.rows.len(), 4);
    }

    #[test]
    fn test_drilldown_unknown_count_is_empty() {
        let drill = build_drilldown(&summary(), 7);
        assert!(drill.job_ids.is_empty());
        assert!(drill.rows.is_empty());
    }
}

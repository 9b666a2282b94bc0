//! Pair Deduplication & Distribution Summarizer.
//!
//! Pure functions over the pair table: threshold filter, undirected dedup, per-job match
//! counts and the distribution of those counts. No I/O, no state.
//!
//! Dedup policy: after a stable descending sort by similarity, the first record seen for
//! each unordered pair survives. When both directions carry the same score this is the
//! direction that appeared first in the source file.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::models::SimilarityRecord;

/// How a job's match count is derived from the pairs above the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchCountPolicy {
    /// Number of distinct partner jobs. A repeated partner counts once.
    #[default]
    DistinctPartners,
    /// Number of filtered records the job appears in, counted before dedup.
    /// Both stored directions of a pair count, as does a repeated partner.
    RawOccurrences,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown match count policy '{0}'")]
pub struct UnknownPolicy(pub String);

impl FromStr for MatchCountPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "distinct" | "distinct_partners" => Ok(Self::DistinctPartners),
            "occurrences" | "raw_occurrences" => Ok(Self::RawOccurrences),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

/// Unordered identity of a job pair: `{a, b} == {b, a}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(String, String);

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            PairKey(a.to_string(), b.to_string())
        } else {
            PairKey(b.to_string(), a.to_string())
        }
    }

    pub fn of(record: &SimilarityRecord) -> Self {
        Self::new(&record.job_id, &record.compared_job_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionBucket {
    #[serde(rename = "Match Count")]
    pub match_count: usize,
    #[serde(rename = "Number of Job IDs")]
    pub job_count: usize,
}

/// Everything the threshold view needs, computed in one pass.
#[derive(Debug, Clone, Serialize)]
pub struct PairSummary {
    pub threshold: f64,
    pub policy: MatchCountPolicy,
    /// Deduplicated pairs, similarity descending.
    pub pairs: Vec<SimilarityRecord>,
    /// The records `match_counts` was computed over: `pairs` under `DistinctPartners`,
    /// the filtered records before dedup under `RawOccurrences`.
    #[serde(skip)]
    pub counted: Vec<SimilarityRecord>,
    pub match_counts: BTreeMap<String, usize>,
    pub distribution: Vec<DistributionBucket>,
    pub total_pairs: usize,
    pub unique_job_ids: usize,
}

/// Records with `similarity_pct >= threshold`, sorted by similarity descending.
/// The sort is stable, so ties keep their input order.
pub fn filter_by_threshold(records: &[SimilarityRecord], threshold: f64) -> Vec<SimilarityRecord> {
    let mut filtered: Vec<SimilarityRecord> = records
        .iter()
        .filter(|r| r.similarity_pct >= threshold)
        .cloned()
        .collect();
    sort_by_similarity_desc(&mut filtered);
    filtered
}

pub fn sort_by_similarity_desc(records: &mut [SimilarityRecord]) {
    records.sort_by(|a, b| b.similarity_pct.total_cmp(&a.similarity_pct));
}

/// Keeps the first record for each unordered pair, preserving order.
pub fn dedup_pairs(records: Vec<SimilarityRecord>) -> Vec<SimilarityRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|r| seen.insert(PairKey::of(r)))
        .collect()
}

/// Job id → match count over the given records. Self-pairs never contribute.
pub fn match_counts(records: &[SimilarityRecord], policy: MatchCountPolicy) -> BTreeMap<String, usize> {
    let cross_pairs = records.iter().filter(|r| !r.is_self_pair());

    match policy {
        MatchCountPolicy::DistinctPartners => {
            let mut partners: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
            for r in cross_pairs {
                partners
                    .entry(r.job_id.as_str())
                    .or_default()
                    .insert(r.compared_job_id.as_str());
                partners
                    .entry(r.compared_job_id.as_str())
                    .or_default()
                    .insert(r.job_id.as_str());
            }
            partners
                .into_iter()
                .map(|(job, set)| (job.to_string(), set.len()))
                .collect()
        }
        MatchCountPolicy::RawOccurrences => {
            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            for r in cross_pairs {
                *counts.entry(r.job_id.clone()).or_default() += 1;
                *counts.entry(r.compared_job_id.clone()).or_default() += 1;
            }
            counts
        }
    }
}

/// Number of job ids per match count, ascending by match count.
pub fn distribution(counts: &BTreeMap<String, usize>) -> Vec<DistributionBucket> {
    let mut buckets: BTreeMap<usize, usize> = BTreeMap::new();
    for &count in counts.values() {
        *buckets.entry(count).or_default() += 1;
    }
    buckets
        .into_iter()
        .map(|(match_count, job_count)| DistributionBucket {
            match_count,
            job_count,
        })
        .collect()
}

/// Filter, dedup and count in one go. `DistinctPartners` counts over the deduplicated
/// pairs, `RawOccurrences` over the filtered records before dedup; either way the counted
/// records are kept on the summary for the drilldown.
pub fn summarize(records: &[SimilarityRecord], threshold: f64, policy: MatchCountPolicy) -> PairSummary {
    let filtered = filter_by_threshold(records, threshold);
    let pairs = dedup_pairs(filtered.clone());
    let counted = match policy {
        MatchCountPolicy::DistinctPartners => pairs.clone(),
        MatchCountPolicy::RawOccurrences => filtered,
    };
    let match_counts = match_counts(&counted, policy);
    let distribution = distribution(&match_counts);

    PairSummary {
        threshold,
        policy,
        total_pairs: pairs.len(),
        unique_job_ids: match_counts.len(),
        pairs,
        counted,
        match_counts,
        distribution,
    }
}

/// Natural-language job search, the external engine behind Mode 3.
///
/// The engine itself (embeddings, ranking) lives outside this service. This module owns the
/// seam: the `JobSearch` trait carried in `AppState`, an HTTP client for the engine, and the
/// metadata enrichment applied to whatever rows it returns.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::data::models::JobLookup;
use crate::data::normalize::normalize_job_id;

pub mod handlers;

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Column the engine must include for rows to be enriched.
pub const JOB_ID_COLUMN: &str = "Job ID";

/// One result row as returned by the engine: an arbitrary JSON object.
pub type SearchRow = Map<String, Value>;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search engine is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The search seam. Implement this to swap engines without touching the handler.
///
/// Carried in `AppState` as `Arc<dyn JobSearch>`.
#[async_trait]
pub trait JobSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchRow>, SearchError>;
}

/// Used when `SEARCH_ENGINE_URL` is unset; every query is answered with `NotConfigured`.
pub struct UnconfiguredSearch;

#[async_trait]
impl JobSearch for UnconfiguredSearch {
    async fn search(&self, _query: &str) -> Result<Vec<SearchRow>, SearchError> {
        Err(SearchError::NotConfigured)
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
}

/// The engine may answer with a bare array or wrap it in `{ "results": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Rows(Vec<SearchRow>),
    Wrapped { results: Vec<SearchRow> },
}

impl SearchResponse {
    fn into_rows(self) -> Vec<SearchRow> {
        match self {
            SearchResponse::Rows(rows) | SearchResponse::Wrapped { results: rows } => rows,
        }
    }
}

/// HTTP client for the external search engine.
/// Retries 429 and 5xx responses with exponential backoff.
#[derive(Clone)]
pub struct HttpJobSearch {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl HttpJobSearch {
    pub fn new(url: String, api_key: Option<String>) -> Result<Self, SearchError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            url,
            api_key,
        })
    }
}

#[async_trait]
impl JobSearch for HttpJobSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchRow>, SearchError> {
        let body = SearchRequest { query };
        let mut last_error: Option<SearchError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Search attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let mut request = self.client.post(&self.url).json(&body);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(SearchError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let message = response.text().await.unwrap_or_default();
                warn!("Search engine returned {}: {}", status, message);
                last_error = Some(SearchError::Api {
                    status: status.as_u16(),
                    message,
                });
                continue;
            }

            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(SearchError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let text = response.text().await?;
            let rows = serde_json::from_str::<SearchResponse>(&text)?.into_rows();
            debug!("Search returned {} rows for query of {} chars", rows.len(), query.len());
            return Ok(rows);
        }

        Err(last_error.unwrap_or(SearchError::Api {
            status: 0,
            message: format!("no response after {MAX_RETRIES} attempts"),
        }))
    }
}

/// Left-joins job metadata onto rows that carry a `Job ID`.
///
/// The id is normalized in place (engines often return it as a number) and `Job Name`,
/// `Work Stream` and `Domain` are added, `null` when the job is unknown. Rows without a
/// `Job ID` pass through untouched.
pub fn enrich_rows(rows: Vec<SearchRow>, jobs: &JobLookup) -> Vec<SearchRow> {
    rows.into_iter()
        .map(|mut row| {
            let job_id = match row.get(JOB_ID_COLUMN) {
                Some(Value::String(s)) => Some(normalize_job_id(s)),
                Some(Value::Number(n)) => Some(normalize_job_id(&n.to_string())),
                _ => None,
            };
            let Some(job_id) = job_id else {
                return row;
            };

            let meta = jobs.get(&job_id);
            let text = |v: Option<&String>| v.map_or(Value::Null, |s| Value::String(s.clone()));
            row.insert("Job Name".to_string(), text(meta.map(|m| &m.job_name)));
            row.insert("Work Stream".to_string(), text(meta.map(|m| &m.work_stream)));
            row.insert("Domain".to_string(), text(meta.map(|m| &m.domain)));
            row.insert(JOB_ID_COLUMN.to_string(), Value::String(job_id));
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::JobMetadata;
    use serde_json::json;

    fn jobs() -> JobLookup {
        JobLookup::from_rows(vec![JobMetadata {
            job_id: "1200".to_string(),
            job_name: "Data Architect".to_string(),
            work_stream: "Data".to_string(),
            domain: "Technology".to_string(),
        }])
    }

    fn row(value: Value) -> SearchRow {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_enrich_known_job() {
        let rows = vec![row(json!({"Job ID": "1,200", "Score": 0.91}))];
        let enriched = enrich_rows(rows, &jobs());
        assert_eq!(enriched[0]["Job ID"], json!("1200"));
        assert_eq!(enriched[0]["Job Name"], json!("Data Architect"));
        assert_eq!(enriched[0]["Domain"], json!("Technology"));
        assert_eq!(enriched[0]["Score"], json!(0.91));
    }

    #[test]
    fn test_enrich_numeric_id() {
        let enriched = enrich_rows(vec![row(json!({"Job ID": 1200}))], &jobs());
        assert_eq!(enriched[0]["Job Name"], json!("Data Architect"));
    }

    #[test]
    fn test_enrich_unknown_job_is_null() {
        let enriched = enrich_rows(vec![row(json!({"Job ID": "77"}))], &jobs());
        assert_eq!(enriched[0]["Job Name"], Value::Null);
        assert_eq!(enriched[0]["Work Stream"], Value::Null);
    }

    #[test]
    fn test_rows_without_job_id_untouched() {
        let original = row(json!({"title": "Architect"}));
        let enriched = enrich_rows(vec![original.clone()], &jobs());
        assert_eq!(enriched[0], original);
    }

    #[test]
    fn test_response_shapes() {
        let bare: SearchResponse = serde_json::from_str(r#"[{"Job ID": "1"}]"#).unwrap();
        assert_eq!(bare.into_rows().len(), 1);

        let wrapped: SearchResponse =
            serde_json::from_str(r#"{"results": [{"Job ID": "1"}, {"Job ID": "2"}]}"#).unwrap();
        assert_eq!(wrapped.into_rows().len(), 2);
    }

    #[tokio::test]
    async fn test_unconfigured_search_errors() {
        let err = UnconfiguredSearch.search("data architect").await.unwrap_err();
        assert!(matches!(err, SearchError::NotConfigured));
    }
}

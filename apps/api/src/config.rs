use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::similarity::pairs::MatchCountPolicy;

/// Application configuration loaded from environment variables.
/// Fails at startup if a variable is present but malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub results_path: PathBuf,
    pub matrix_path: PathBuf,
    pub jobs_path: PathBuf,
    pub search_engine_url: Option<String>,
    pub search_api_key: Option<String>,
    pub match_count_policy: MatchCountPolicy,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env_or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());
        // Unset and blank are treated the same.
        let optional_env = |key: &str| {
            var(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Config {
            results_path: env_or("RESULTS_PATH", "data/job_similarity_output.csv").into(),
            matrix_path: env_or("MATRIX_PATH", "data/job_similarity_matrix.csv").into(),
            jobs_path: env_or("JOBS_PATH", "data/jobs_dataset.csv").into(),
            search_engine_url: optional_env("SEARCH_ENGINE_URL"),
            search_api_key: optional_env("SEARCH_API_KEY"),
            match_count_policy: env_or("MATCH_COUNT_POLICY", "distinct")
                .parse::<MatchCountPolicy>()
                .context("MATCH_COUNT_POLICY must be 'distinct' or 'occurrences'")?,
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

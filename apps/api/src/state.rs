use std::sync::Arc;

use crate::config::Config;
use crate::data::snapshot::DataSnapshot;
use crate::search::JobSearch;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Tables loaded at startup. Read-only for the life of the process.
    pub snapshot: Arc<DataSnapshot>,
    pub config: Config,
    /// Pluggable NLP search. `HttpJobSearch` when SEARCH_ENGINE_URL is set, else `UnconfiguredSearch`.
    pub search: Arc<dyn JobSearch>,
}

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::Config;
use crate::generation::enrichment::{Enricher, HeuristicEnricher};
use crate::generation::versioning::VersionStore;
use crate::layout::PageLayoutConfig;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable enricher. Default: HeuristicEnricher.
    pub enricher: Arc<dyn Enricher>,
    /// Default page layout for previews and exports; requests may override it.
    pub page_config: PageLayoutConfig,
    /// In-memory version history, lost on restart.
    pub versions: Arc<RwLock<VersionStore>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        AppState {
            page_config: config.page_config(),
            enricher: Arc::new(HeuristicEnricher),
            versions: Arc::new(RwLock::new(VersionStore::with_limits(
                config.max_tracked_assignments,
                config.max_versions_per_assignment,
            ))),
            config,
        }
    }
}

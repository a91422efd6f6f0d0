//! Application state for the web layer.

use std::sync::Arc;

use crate::gateway::DataSource;
use crate::planner::SearchConfig;

/// Shared application state.
///
/// The data source is chosen once at start-up; handlers only see the trait.
#[derive(Clone)]
pub struct AppState {
    /// Sites, routes, events, reviews and users
    pub source: Arc<dyn DataSource>,

    /// Route planner configuration
    pub config: Arc<SearchConfig>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(source: Arc<dyn DataSource>, config: SearchConfig) -> Self {
        Self {
            source,
            config: Arc::new(config),
        }
    }
}

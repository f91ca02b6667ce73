use crate::storage::CharmStore;
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CharmStore>,
    /// Advertised to clients on counter responses when set.
    pub stats_cache_max_age: Option<Duration>,
}

impl AppState {
    pub fn new(store: Arc<dyn CharmStore>) -> Self {
        Self {
            store,
            stats_cache_max_age: None,
        }
    }

    #[must_use]
    pub fn with_stats_cache_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.stats_cache_max_age = max_age;
        self
    }
}

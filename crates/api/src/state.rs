use std::sync::Arc;

use dbod_core::monitoring::{CatalogSource, MonitoringSettings, SampleSource};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc`. The sources are trait
/// objects so tests can swap the database for in-memory data.
#[derive(Clone)]
pub struct AppState {
    /// Metric catalog backing store.
    pub catalog: Arc<dyn CatalogSource>,
    /// Interval sample store.
    pub samples: Arc<dyn SampleSource>,
    /// Window, bridging and exclusion settings.
    pub settings: Arc<MonitoringSettings>,
}

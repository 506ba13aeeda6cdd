/// Generic domain errors shared by every layer.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with key {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Failures of the monitoring pipeline (catalog lookup, sample fetch and
/// series synthesis).
///
/// Every failure is local to a single call; nothing here is retried
/// internally.
#[derive(Debug, thiserror::Error)]
pub enum MonitoringError {
    /// The metric catalog could not be read.
    #[error("Metric catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// Raw samples could not be fetched (including fetch timeouts).
    #[error("Sample source unavailable: {0}")]
    SampleSourceUnavailable(String),

    /// A sample value is not a finite number.
    #[error("Sample {index} has a malformed value: {value:?}")]
    MalformedSample { index: usize, value: String },

    /// Samples are not ascending, or an interval runs backwards.
    #[error("Sample {index} is out of order: {reason}")]
    OutOfOrderInput { index: usize, reason: String },
}

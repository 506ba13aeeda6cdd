use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dbod_core::error::{CoreError, MonitoringError};
use dbod_core::monitoring::ChartError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`MonitoringError`]. Implements [`IntoResponse`]
/// to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `dbod_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A monitoring pipeline error (bad samples, unreachable source).
    #[error(transparent)]
    Monitoring(#[from] MonitoringError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<ChartError> for AppError {
    fn from(err: ChartError) -> Self {
        match err {
            ChartError::Core(e) => AppError::Core(e),
            ChartError::Monitoring(e) => AppError::Monitoring(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, key } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} '{key}' not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
            },

            // --- Monitoring errors ---
            AppError::Monitoring(err) => classify_monitoring_error(err),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a monitoring error into an HTTP status, error code, and message.
///
/// - Malformed or out-of-order samples are data-integrity failures (500),
///   reported with their own codes so the charting layer can tell them apart.
/// - An unreachable catalog or sample source maps to 503.
fn classify_monitoring_error(err: &MonitoringError) -> (StatusCode, &'static str, String) {
    match err {
        MonitoringError::MalformedSample { .. } => {
            tracing::error!(error = %err, "Malformed metric sample");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "MALFORMED_SAMPLE",
                err.to_string(),
            )
        }
        MonitoringError::OutOfOrderInput { .. } => {
            tracing::error!(error = %err, "Out-of-order metric samples");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "OUT_OF_ORDER_INPUT",
                err.to_string(),
            )
        }
        MonitoringError::CatalogUnavailable(_) | MonitoringError::SampleSourceUnavailable(_) => {
            tracing::warn!(error = %err, "Monitoring source unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "SOURCE_UNAVAILABLE",
                "Monitoring data is temporarily unavailable".to_string(),
            )
        }
    }
}

//! Route definitions for monitoring endpoints.

use axum::routing::get;
use axum::Router;

use crate::handlers::monitoring;
use crate::state::AppState;

/// Routes mounted at `/monitoring`.
///
/// ```text
/// GET /{dialect}/metrics                                     -> list_metrics
/// GET /{dialect}/instances/{instance}/metrics/{code}/chart   -> get_metric_chart
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{dialect}/metrics", get(monitoring::list_metrics))
        .route(
            "/{dialect}/instances/{instance}/metrics/{code}/chart",
            get(monitoring::get_metric_chart),
        )
}

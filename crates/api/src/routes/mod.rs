pub mod health;
pub mod monitoring;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /monitoring/{dialect}/metrics                                   metric catalog
/// /monitoring/{dialect}/instances/{instance}/metrics/{code}/chart metric chart table
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/monitoring", monitoring::router())
}

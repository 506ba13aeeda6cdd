//! Handlers for the metric catalog and metric chart endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use dbod_core::error::CoreError;
use dbod_core::monitoring::{
    load_chart, parse_number, resolve, try_resolve, ChartTable, Dialect, MetricDefinition,
    MonitoredTarget, TargetClass,
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for the catalog endpoint.
#[derive(Debug, Deserialize)]
pub struct CatalogParams {
    /// `instance` or `host`; omitted means every class the dialect has.
    pub class: Option<String>,
}

/// Query parameters for the chart endpoint.
#[derive(Debug, Deserialize)]
pub struct ChartParams {
    /// Host the instance runs on; required for host-level metrics.
    pub host: Option<String>,
    /// Days of history (default from settings). Kept as text so a bad value
    /// is reported in the JSON error envelope.
    pub days: Option<String>,
    /// Restrict the metric lookup to one class when a code exists in both.
    pub class: Option<String>,
}

/// A metric definition together with its chart table (`null` when there is
/// no data).
#[derive(Debug, Serialize)]
pub struct MetricChart {
    pub metric: MetricDefinition,
    pub table: ChartTable,
}

fn parse_class(raw: Option<&str>) -> Result<Option<TargetClass>, CoreError> {
    raw.map(str::parse).transpose()
}

fn parse_days(raw: Option<&str>) -> Result<Option<u32>, CoreError> {
    raw.map(|days| parse_number("days", days)).transpose()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /monitoring/{dialect}/metrics
///
/// List the metric catalog of a dialect. An unreachable catalog yields an
/// empty list rather than an error.
pub async fn list_metrics(
    State(state): State<AppState>,
    Path(dialect): Path<String>,
    Query(params): Query<CatalogParams>,
) -> AppResult<Json<DataResponse<Vec<MetricDefinition>>>> {
    let dialect: Dialect = dialect.parse()?;
    let class = parse_class(params.class.as_deref())?;

    let metrics = resolve(
        state.catalog.as_ref(),
        dialect,
        class,
        &state.settings.exclusions,
    )
    .await;
    Ok(Json(DataResponse { data: metrics }))
}

/// GET /monitoring/{dialect}/instances/{instance}/metrics/{code}/chart
///
/// Synthesize the chart table of one metric for one instance (or its host).
/// Unlike the listing, an unreachable catalog is reported (503) rather than
/// turned into a 404 for the metric.
pub async fn get_metric_chart(
    State(state): State<AppState>,
    Path((dialect, instance, code)): Path<(String, String, String)>,
    Query(params): Query<ChartParams>,
) -> AppResult<Json<DataResponse<MetricChart>>> {
    let dialect: Dialect = dialect.parse()?;
    let class = parse_class(params.class.as_deref())?;
    let days = parse_days(params.days.as_deref())?;

    let metric = try_resolve(
        state.catalog.as_ref(),
        dialect,
        class,
        &state.settings.exclusions,
    )
    .await?
    .into_iter()
    .find(|m| m.code == code)
    .ok_or_else(|| CoreError::NotFound {
        entity: "Metric",
        key: format!("{dialect}/{code}"),
    })?;

    let target = MonitoredTarget::new(instance, params.host);
    let table = load_chart(
        state.samples.as_ref(),
        &target,
        &metric,
        &state.settings,
        days,
        Utc::now(),
    )
    .await?;

    Ok(Json(DataResponse {
        data: MetricChart { metric, table },
    }))
}

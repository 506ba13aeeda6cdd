//! Fetch-then-synthesize orchestration.
//!
//! Fetching samples is bounded by the configured timeout. A failed or timed
//! out fetch degrades to [`ChartTable::NoData`] with a logged warning; only
//! data-integrity failures of the synthesis itself reach the caller.

use async_trait::async_trait;

use crate::error::{CoreError, MonitoringError};
use crate::monitoring::catalog::MetricDefinition;
use crate::monitoring::chart::ChartTable;
use crate::monitoring::dialect::{Dialect, MonitoredTarget, TargetClass};
use crate::monitoring::series::{synthesize, RawSample, SeriesWindow};
use crate::monitoring::settings::MonitoringSettings;
use crate::types::Timestamp;

/// Parameters of one sample fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleQuery {
    /// Name the samples are stored under (see [`MonitoredTarget::target_key`]).
    pub target_key: String,
    pub dialect: Dialect,
    pub target_class: TargetClass,
    pub metric_code: String,
    /// Samples whose effective end is before this instant are not returned.
    pub window_start: Timestamp,
}

/// Source of raw samples, ordered by `valid_from` ascending.
#[async_trait]
pub trait SampleSource: Send + Sync {
    async fn fetch_samples(&self, query: &SampleQuery) -> Result<Vec<RawSample>, MonitoringError>;
}

/// Errors of [`load_chart`].
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    /// The request itself is invalid (bad window, missing host, ...).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The fetched samples could not be synthesized.
    #[error(transparent)]
    Monitoring(#[from] MonitoringError),
}

/// Build the chart of `metric` for `target` over the `days` ending at `now`.
///
/// `days = None` uses the configured window.
pub async fn load_chart(
    source: &dyn SampleSource,
    target: &MonitoredTarget,
    metric: &MetricDefinition,
    settings: &MonitoringSettings,
    days: Option<u32>,
    now: Timestamp,
) -> Result<ChartTable, ChartError> {
    let window = SeriesWindow {
        start: settings.window_start(now, days)?,
        now,
    };
    let query = SampleQuery {
        target_key: target.target_key(
            metric.dialect,
            metric.target_class,
            &settings.instance_prefix,
        )?,
        dialect: metric.dialect,
        target_class: metric.target_class,
        metric_code: metric.code.clone(),
        window_start: window.start,
    };

    let samples = match tokio::time::timeout(settings.fetch_timeout(), source.fetch_samples(&query))
        .await
    {
        Ok(Ok(samples)) => samples,
        Ok(Err(e)) => {
            tracing::warn!(
                target_key = %query.target_key,
                metric = %query.metric_code,
                error = %e,
                "Sample fetch failed, rendering no data"
            );
            return Ok(ChartTable::NoData);
        }
        Err(_) => {
            let e = MonitoringError::SampleSourceUnavailable(format!(
                "fetch timed out after {}s",
                settings.fetch_timeout_secs
            ));
            tracing::warn!(
                target_key = %query.target_key,
                metric = %query.metric_code,
                error = %e,
                "Sample fetch timed out, rendering no data"
            );
            return Ok(ChartTable::NoData);
        }
    };

    let table = synthesize(
        &query.target_key,
        metric,
        &samples,
        &window,
        &settings.bridge(metric.dialect),
    )?;
    Ok(table)
}

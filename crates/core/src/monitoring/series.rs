//! Step/delta series synthesis.
//!
//! Each raw sample holds its value constant over `[valid_from, valid_to)`
//! and is drawn as a flat step of two points. Consecutive samples yield a
//! delta on the start point of the later one. Where a backend is silent for
//! longer than the bridge threshold, a pair of empty markers is inserted so
//! the gap shows as a drop rather than as an unchanged value.
//!
//! Pure logic: the caller fetches samples and injects "now".

use chrono::Duration;

use crate::error::{CoreError, MonitoringError};
use crate::monitoring::catalog::MetricDefinition;
use crate::monitoring::chart::{ChartPoint, ChartTable, SeriesTable};
use crate::types::Timestamp;

/// Default silence (seconds) after which a gap is bridged.
pub const DEFAULT_BRIDGE_THRESHOLD_SECS: i64 = 420;

/// Default distance (seconds) between a bridge marker and the real data
/// point it sits next to.
pub const DEFAULT_BRIDGE_MARGIN_SECS: i64 = 360;

/// A raw sample as delivered by the sample source.
///
/// `valid_to = None` means the sample is still in effect. The value is kept
/// as text and parsed during synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSample {
    pub valid_from: Timestamp,
    pub valid_to: Option<Timestamp>,
    pub value: String,
}

impl RawSample {
    pub fn new(valid_from: Timestamp, valid_to: Option<Timestamp>, value: impl Into<String>) -> Self {
        Self {
            valid_from,
            valid_to,
            value: value.into(),
        }
    }

    /// `valid_to`, or `now` if the sample is still open.
    pub fn effective_end(&self, now: Timestamp) -> Timestamp {
        self.valid_to.unwrap_or(now)
    }
}

/// Gap-bridging configuration for one synthesis call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeSettings {
    pub enabled: bool,
    /// Gaps strictly longer than this are bridged.
    pub threshold: Duration,
    /// Offset of each marker from the real point bounding the gap.
    pub margin: Duration,
}

impl BridgeSettings {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Threshold and margin must be positive and the margin may not exceed
    /// the threshold, otherwise a marker could land outside the gap.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.threshold <= Duration::zero() {
            return Err(CoreError::Validation(
                "bridge threshold must be positive".to_string(),
            ));
        }
        if self.margin <= Duration::zero() {
            return Err(CoreError::Validation(
                "bridge margin must be positive".to_string(),
            ));
        }
        if self.margin > self.threshold {
            return Err(CoreError::Validation(format!(
                "bridge margin ({}s) must not exceed the threshold ({}s)",
                self.margin.num_seconds(),
                self.threshold.num_seconds()
            )));
        }
        Ok(())
    }
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: Duration::seconds(DEFAULT_BRIDGE_THRESHOLD_SECS),
            margin: Duration::seconds(DEFAULT_BRIDGE_MARGIN_SECS),
        }
    }
}

/// Time frame of one synthesis call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesWindow {
    /// Left edge of the chart.
    pub start: Timestamp,
    /// Snapshot used as the end of every open sample.
    pub now: Timestamp,
}

/// A validated sample: parsed value and resolved end.
#[derive(Debug, Clone, Copy)]
struct Interval {
    start: Timestamp,
    end: Timestamp,
    value: f64,
}

/// Build the chart table for `samples` of `metric` on `target`.
///
/// Returns [`ChartTable::NoData`] for an empty input. The input is validated
/// in full before any row is built, so a failure never yields a partial
/// table.
///
/// The anchor row at `window.start` carries the first sample's value even
/// when that sample begins later than the window.
pub fn synthesize(
    target: &str,
    metric: &MetricDefinition,
    samples: &[RawSample],
    window: &SeriesWindow,
    bridge: &BridgeSettings,
) -> Result<ChartTable, MonitoringError> {
    if samples.is_empty() {
        tracing::debug!(target_key = target, metric = %metric.code, "No samples in window");
        return Ok(ChartTable::NoData);
    }

    let intervals = prepare(samples, window)?;

    let mut rows = Vec::with_capacity(intervals.len() * 2 + 3);
    let mut bridges = 0usize;

    let first = intervals[0];
    rows.push(ChartPoint::start(window.start, first.value, 0.0));
    rows.push(ChartPoint::end(first.end, first.value));

    for pair in intervals.windows(2) {
        let (previous, current) = (pair[0], pair[1]);

        if bridge.enabled {
            if let Some(markers) = bridge_markers(previous.end, current.start, bridge) {
                rows.extend(markers);
                bridges += 1;
            }
        }

        rows.push(ChartPoint::start(
            current.start,
            current.value,
            current.value - previous.value,
        ));
        rows.push(ChartPoint::end(current.end, current.value));
    }

    let last = intervals[intervals.len() - 1];
    rows.push(ChartPoint::marker(last.end));

    tracing::debug!(
        target_key = target,
        dialect = %metric.dialect,
        metric = %metric.code,
        samples = intervals.len(),
        bridges,
        rows = rows.len(),
        "Synthesized metric series"
    );

    Ok(ChartTable::Table(SeriesTable::new(rows)))
}

/// Parse values, resolve open ends and check that the rows built from the
/// samples will be in time order.
fn prepare(samples: &[RawSample], window: &SeriesWindow) -> Result<Vec<Interval>, MonitoringError> {
    let mut intervals: Vec<Interval> = Vec::with_capacity(samples.len());

    for (index, sample) in samples.iter().enumerate() {
        let value = parse_value(index, &sample.value)?;
        let start = sample.valid_from;
        let end = sample.effective_end(window.now);

        if end < start {
            return Err(out_of_order(
                index,
                format!("ends at {end} before it starts at {start}"),
            ));
        }

        match intervals.last() {
            None if end < window.start => {
                return Err(out_of_order(
                    index,
                    format!("ends at {end}, before the window start {}", window.start),
                ));
            }
            Some(previous) if start < previous.start => {
                return Err(out_of_order(
                    index,
                    format!(
                        "starts at {start}, before the previous sample's start {}",
                        previous.start
                    ),
                ));
            }
            Some(previous) if start < previous.end => {
                return Err(out_of_order(
                    index,
                    format!(
                        "starts at {start}, overlapping the previous sample ending at {}",
                        previous.end
                    ),
                ));
            }
            _ => {}
        }

        intervals.push(Interval { start, end, value });
    }

    Ok(intervals)
}

fn parse_value(index: usize, raw: &str) -> Result<f64, MonitoringError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(MonitoringError::MalformedSample {
            index,
            value: raw.to_string(),
        }),
    }
}

fn out_of_order(index: usize, reason: String) -> MonitoringError {
    MonitoringError::OutOfOrderInput { index, reason }
}

/// Two empty markers, `margin` inside each edge of the gap, in time order.
fn bridge_markers(
    previous_end: Timestamp,
    current_start: Timestamp,
    bridge: &BridgeSettings,
) -> Option<[ChartPoint; 2]> {
    if current_start - previous_end <= bridge.threshold {
        return None;
    }
    let after_previous = previous_end + bridge.margin;
    let before_current = current_start - bridge.margin;
    let (first, second) = if after_previous <= before_current {
        (after_previous, before_current)
    } else {
        (before_current, after_previous)
    };
    Some([ChartPoint::marker(first), ChartPoint::marker(second)])
}

//! Metric monitoring domain logic.
//!
//! - [`dialect`]: supported backends, target classes and target naming.
//! - [`catalog`]: the metric catalog resolver.
//! - [`series`]: turns raw interval samples into a step/delta chart series.
//! - [`chart`]: the chart table value object and its DataTable serialization.
//! - [`settings`]: tuning knobs shared by the resolver and the synthesizer.
//! - [`service`]: fetch-then-synthesize orchestration over a [`SampleSource`].
//!
//! All logic here is pure apart from the reads performed through the
//! [`CatalogSource`] and [`SampleSource`] traits.

pub mod catalog;
pub mod chart;
pub mod dialect;
pub mod series;
pub mod service;
pub mod settings;

pub use catalog::{resolve, try_resolve, CatalogExclusions, CatalogSource, MetricDefinition};
pub use chart::{ChartColumn, ChartPoint, ChartTable, SeriesTable};
pub use dialect::{Dialect, MonitoredTarget, TargetClass};
pub use series::{synthesize, BridgeSettings, RawSample, SeriesWindow};
pub use service::{load_chart, ChartError, SampleQuery, SampleSource};
pub use settings::{parse_number, MonitoringSettings};

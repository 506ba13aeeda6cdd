//! Chart table value object and its DataTable JSON serialization.
//!
//! The table is built as a typed row sequence and serialized once. Absent
//! cells are written as explicit `null` so the charting layer draws a gap in
//! the line instead of a zero.

use chrono::{Datelike, Timelike};
use serde::ser::{SerializeMap, SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::types::Timestamp;

/// Descriptor of one table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartColumn {
    pub id: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// The fixed column set of every series table: date, cumulative, delta.
pub const SERIES_COLUMNS: [ChartColumn; 3] = [
    ChartColumn {
        id: "date",
        label: "Date",
        kind: "datetime",
    },
    ChartColumn {
        id: "cumulative",
        label: "Cumulative",
        kind: "number",
    },
    ChartColumn {
        id: "delta",
        label: "Delta",
        kind: "number",
    },
];

/// One row of a series table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub timestamp: Timestamp,
    pub cumulative: Option<f64>,
    pub delta: Option<f64>,
}

impl ChartPoint {
    /// Start of a real sample: its value and the change from the previous one.
    pub fn start(timestamp: Timestamp, value: f64, delta: f64) -> Self {
        Self {
            timestamp,
            cumulative: Some(value),
            delta: Some(delta),
        }
    }

    /// End of a real sample: value only.
    pub fn end(timestamp: Timestamp, value: f64) -> Self {
        Self {
            timestamp,
            cumulative: Some(value),
            delta: None,
        }
    }

    /// Synthetic marker with no cumulative value and a zero delta.
    pub fn marker(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            cumulative: None,
            delta: Some(0.0),
        }
    }
}

/// Columns plus rows of a series with data.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesTable {
    pub columns: Vec<ChartColumn>,
    pub rows: Vec<ChartPoint>,
}

impl SeriesTable {
    pub fn new(rows: Vec<ChartPoint>) -> Self {
        Self {
            columns: SERIES_COLUMNS.to_vec(),
            rows,
        }
    }
}

/// Result of a synthesis: a table, or the `NoData` sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartTable {
    NoData,
    Table(SeriesTable),
}

impl ChartTable {
    pub fn is_no_data(&self) -> bool {
        matches!(self, ChartTable::NoData)
    }

    pub fn rows(&self) -> &[ChartPoint] {
        match self {
            ChartTable::NoData => &[],
            ChartTable::Table(table) => &table.rows,
        }
    }
}

/// Format a timestamp as a DataTable date literal: `Date(y,m,d,h,mi,s,ms)`
/// with a zero-based month.
///
/// The components are UTC wall-clock time. The browser reads the literal in
/// its local zone, so charts must be formatted in UTC (a `DateFormat` with
/// `timeZone: 0`) or every point shifts by the viewer's offset.
pub fn datatable_date(ts: &Timestamp) -> String {
    format!(
        "Date({},{},{},{},{},{},{})",
        ts.year(),
        ts.month0(),
        ts.day(),
        ts.hour(),
        ts.minute(),
        ts.second(),
        ts.timestamp_subsec_millis()
    )
}

/// `{"v": value}` or `null`.
struct Cell<T>(Option<T>);

impl<T: Serialize> Serialize for Cell<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.0 {
            Some(value) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("v", value)?;
                map.end()
            }
            None => serializer.serialize_none(),
        }
    }
}

struct Cells<'a>(&'a ChartPoint);

impl Serialize for Cells<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let point = self.0;
        let mut seq = serializer.serialize_seq(Some(3))?;
        seq.serialize_element(&Cell(Some(datatable_date(&point.timestamp))))?;
        seq.serialize_element(&Cell(point.cumulative))?;
        seq.serialize_element(&Cell(point.delta))?;
        seq.end()
    }
}

impl Serialize for ChartPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("c", &Cells(self))?;
        map.end()
    }
}

impl Serialize for SeriesTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut table = serializer.serialize_struct("SeriesTable", 2)?;
        table.serialize_field("cols", &self.columns)?;
        table.serialize_field("rows", &self.rows)?;
        table.end()
    }
}

impl Serialize for ChartTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ChartTable::NoData => serializer.serialize_none(),
            ChartTable::Table(table) => table.serialize(serializer),
        }
    }
}

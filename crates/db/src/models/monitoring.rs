//! Row models for the `metric_definitions` and `metric_samples` tables.

use dbod_core::monitoring::{Dialect, MetricDefinition, RawSample, TargetClass};
use dbod_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

/// A catalog row as stored. `dialect` and `target_type` are raw text.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MetricDefinitionRow {
    pub dialect: String,
    pub target_type: String,
    pub code: String,
    pub display_name: String,
    pub unit: String,
}

impl MetricDefinitionRow {
    /// Convert into a domain definition.
    ///
    /// Returns `None` for rows whose dialect or type code is unknown.
    pub fn into_definition(self) -> Option<MetricDefinition> {
        let dialect: Dialect = self.dialect.parse().ok()?;
        let target_class = TargetClass::from_type_code(dialect, &self.target_type)?;
        Some(MetricDefinition {
            dialect,
            target_class,
            code: self.code,
            display_name: self.display_name,
            unit: self.unit,
        })
    }
}

/// One interval sample. The value column is text and is parsed downstream.
#[derive(Debug, Clone, FromRow)]
pub struct MetricSampleRow {
    pub valid_from: Timestamp,
    pub valid_to: Option<Timestamp>,
    pub value: String,
}

impl From<MetricSampleRow> for RawSample {
    fn from(row: MetricSampleRow) -> Self {
        RawSample::new(row.valid_from, row.valid_to, row.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(dialect: &str, target_type: &str) -> MetricDefinitionRow {
        MetricDefinitionRow {
            dialect: dialect.to_string(),
            target_type: target_type.to_string(),
            code: "CPU".to_string(),
            display_name: "CPU usage".to_string(),
            unit: "%".to_string(),
        }
    }

    #[test]
    fn converts_known_rows() {
        let def = row("postgresql", "NODE").into_definition().unwrap();
        assert_eq!(def.dialect, Dialect::PostgreSql);
        assert_eq!(def.target_class, TargetClass::Host);
        assert_eq!(def.code, "CPU");
    }

    #[test]
    fn skips_unknown_dialect_or_type() {
        assert!(row("db2", "NODE").into_definition().is_none());
        assert!(row("oracle", "NODE").into_definition().is_none());
        assert!(row("mysql", "PG").into_definition().is_none());
    }
}

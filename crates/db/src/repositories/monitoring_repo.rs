//! Repository for the metric catalog and the interval sample store.
//!
//! The schema is dialect-neutral: every backend's catalog and samples live
//! in the same two tables, keyed by dialect and catalog type code.

use async_trait::async_trait;
use dbod_core::error::MonitoringError;
use dbod_core::monitoring::{
    CatalogSource, Dialect, MetricDefinition, RawSample, SampleQuery, SampleSource, TargetClass,
};
use sqlx::PgPool;

use crate::models::monitoring::{MetricDefinitionRow, MetricSampleRow};

/// Column list for `metric_definitions` SELECT queries.
const DEFINITION_COLUMNS: &str = "dialect, target_type, code, display_name, unit";

/// Column list for `metric_samples` SELECT queries.
const SAMPLE_COLUMNS: &str = "valid_from, valid_to, value";

/// Provides catalog and sample queries over a connection pool.
#[derive(Clone)]
pub struct MonitoringRepo {
    pool: PgPool,
}

impl MonitoringRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List catalog rows of `dialect` with one of the given type codes.
    pub async fn list_definitions(
        pool: &PgPool,
        dialect: Dialect,
        type_codes: &[&str],
    ) -> Result<Vec<MetricDefinitionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {DEFINITION_COLUMNS} FROM metric_definitions \
             WHERE dialect = $1 AND target_type = ANY($2)"
        );
        let codes: Vec<String> = type_codes.iter().map(|c| c.to_string()).collect();
        sqlx::query_as::<_, MetricDefinitionRow>(&query)
            .bind(dialect.as_str())
            .bind(codes)
            .fetch_all(pool)
            .await
    }

    /// Samples of one metric on one target still in effect at or after
    /// `query.window_start`, ordered by `valid_from`.
    pub async fn list_samples(
        pool: &PgPool,
        query: &SampleQuery,
    ) -> Result<Vec<MetricSampleRow>, sqlx::Error> {
        let type_code = query
            .target_class
            .type_code(query.dialect)
            .unwrap_or_default();
        let sql = format!(
            "SELECT {SAMPLE_COLUMNS} FROM metric_samples \
             WHERE dialect = $1 AND target_type = $2 AND target_name = $3 \
               AND metric_code = $4 \
               AND (valid_to >= $5 OR valid_to IS NULL) \
             ORDER BY valid_from"
        );
        sqlx::query_as::<_, MetricSampleRow>(&sql)
            .bind(query.dialect.as_str())
            .bind(type_code)
            .bind(&query.target_key)
            .bind(&query.metric_code)
            .bind(query.window_start)
            .fetch_all(pool)
            .await
    }
}

#[async_trait]
impl CatalogSource for MonitoringRepo {
    async fn fetch_definitions(
        &self,
        dialect: Dialect,
        classes: &[TargetClass],
    ) -> Result<Vec<MetricDefinition>, MonitoringError> {
        let type_codes: Vec<&str> = classes
            .iter()
            .filter_map(|class| class.type_code(dialect))
            .collect();

        let rows = Self::list_definitions(&self.pool, dialect, &type_codes)
            .await
            .map_err(|e| MonitoringError::CatalogUnavailable(e.to_string()))?;

        let total = rows.len();
        let definitions: Vec<MetricDefinition> = rows
            .into_iter()
            .filter_map(MetricDefinitionRow::into_definition)
            .collect();
        if definitions.len() < total {
            tracing::warn!(
                %dialect,
                skipped = total - definitions.len(),
                "Skipped catalog rows with unknown dialect or type code"
            );
        }
        Ok(definitions)
    }
}

#[async_trait]
impl SampleSource for MonitoringRepo {
    async fn fetch_samples(&self, query: &SampleQuery) -> Result<Vec<RawSample>, MonitoringError> {
        let rows = Self::list_samples(&self.pool, query)
            .await
            .map_err(|e| MonitoringError::SampleSourceUnavailable(e.to_string()))?;
        Ok(rows.into_iter().map(RawSample::from).collect())
    }
}

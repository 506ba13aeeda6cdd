//! Metric catalog resolver.
//!
//! Resolves the metrics available for a dialect (and optionally a single
//! target class) from a [`CatalogSource`], applies the configured exclusion
//! list and orders the result the way each backend's catalog is browsed.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, MonitoringError};
use crate::monitoring::dialect::{Dialect, TargetClass};

/// A metric published by a dialect's catalog. Identity is `(dialect, code)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub dialect: Dialect,
    pub target_class: TargetClass,
    pub code: String,
    pub display_name: String,
    pub unit: String,
}

/// Backing store for metric definitions.
///
/// Implementations return every definition of `dialect` belonging to one of
/// `classes`, in any order.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_definitions(
        &self,
        dialect: Dialect,
        classes: &[TargetClass],
    ) -> Result<Vec<MetricDefinition>, MonitoringError>;
}

/// Metric codes hidden from the catalog, per dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogExclusions {
    codes: BTreeMap<Dialect, BTreeSet<String>>,
}

impl CatalogExclusions {
    /// An exclusion list that hides nothing.
    pub fn none() -> Self {
        Self {
            codes: BTreeMap::new(),
        }
    }

    pub fn with(mut self, dialect: Dialect, code: impl Into<String>) -> Self {
        self.codes.entry(dialect).or_default().insert(code.into());
        self
    }

    pub fn is_excluded(&self, dialect: Dialect, code: &str) -> bool {
        self.codes
            .get(&dialect)
            .is_some_and(|codes| codes.contains(code))
    }

    /// Excluded codes of `dialect`, sorted.
    pub fn codes(&self, dialect: Dialect) -> impl Iterator<Item = &str> {
        self.codes
            .get(&dialect)
            .into_iter()
            .flat_map(|codes| codes.iter().map(String::as_str))
    }

    /// Parse a comma-separated `dialect:CODE` list, e.g.
    /// `mysql:SESSIONS,oracle:2144`. An empty string excludes nothing.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let mut exclusions = Self::none();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (dialect, code) = entry.split_once(':').ok_or_else(|| {
                CoreError::Validation(format!(
                    "Catalog exclusion '{entry}' must have the form dialect:CODE"
                ))
            })?;
            let code = code.trim();
            if code.is_empty() {
                return Err(CoreError::Validation(format!(
                    "Catalog exclusion '{entry}' has an empty metric code"
                )));
            }
            exclusions = exclusions.with(dialect.parse()?, code);
        }
        Ok(exclusions)
    }
}

impl Default for CatalogExclusions {
    /// Session counts are duplicated at host level on MySQL and PostgreSQL,
    /// and Oracle metric 2144 (average synchronous single-block read
    /// latency) is degenerate.
    fn default() -> Self {
        Self::none()
            .with(Dialect::MySql, "SESSIONS")
            .with(Dialect::PostgreSql, "SESSIONS")
            .with(Dialect::Oracle, "2144")
    }
}

/// Resolve the ordered metric catalog of `dialect`.
///
/// `class = None` returns every class the dialect supports. A class the
/// dialect does not publish, or an unreachable catalog, yields an empty list.
pub async fn resolve(
    source: &dyn CatalogSource,
    dialect: Dialect,
    class: Option<TargetClass>,
    exclusions: &CatalogExclusions,
) -> Vec<MetricDefinition> {
    match try_resolve(source, dialect, class, exclusions).await {
        Ok(metrics) => metrics,
        Err(e) => {
            tracing::warn!(%dialect, error = %e, "Metric catalog resolution failed");
            Vec::new()
        }
    }
}

/// Same as [`resolve`], but an unreachable catalog is reported as
/// [`MonitoringError::CatalogUnavailable`] instead of an empty list.
pub async fn try_resolve(
    source: &dyn CatalogSource,
    dialect: Dialect,
    class: Option<TargetClass>,
    exclusions: &CatalogExclusions,
) -> Result<Vec<MetricDefinition>, MonitoringError> {
    let classes: Vec<TargetClass> = match class {
        Some(class) if dialect.supports(class) => vec![class],
        Some(class) => {
            tracing::debug!(%dialect, %class, "Dialect publishes no metrics for class");
            return Ok(Vec::new());
        }
        None => dialect.target_classes().to_vec(),
    };

    let definitions = source.fetch_definitions(dialect, &classes).await?;

    let mut metrics: Vec<MetricDefinition> = definitions
        .into_iter()
        .filter(|m| m.dialect == dialect && classes.contains(&m.target_class))
        .filter(|m| !exclusions.is_excluded(dialect, &m.code))
        .collect();
    sort_catalog(dialect, &mut metrics);

    tracing::debug!(%dialect, count = metrics.len(), "Resolved metric catalog");
    Ok(metrics)
}

/// Order definitions the way the dialect's catalog is browsed.
///
/// MySQL sorts by type code ascending, PostgreSQL by type code descending,
/// both then by display name. Oracle has a single class and sorts by display
/// name only.
pub fn sort_catalog(dialect: Dialect, metrics: &mut [MetricDefinition]) {
    let type_code = |m: &MetricDefinition| m.target_class.type_code(dialect).unwrap_or_default();
    metrics.sort_by(|a, b| {
        let by_class = match dialect {
            Dialect::MySql => type_code(a).cmp(&type_code(b)),
            Dialect::PostgreSql => type_code(b).cmp(&type_code(a)),
            Dialect::Oracle => Ordering::Equal,
        };
        by_class.then_with(|| a.display_name.cmp(&b.display_name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn def(dialect: Dialect, class: TargetClass, code: &str, name: &str) -> MetricDefinition {
        MetricDefinition {
            dialect,
            target_class: class,
            code: code.to_string(),
            display_name: name.to_string(),
            unit: "count".to_string(),
        }
    }

    struct FixedCatalog(Vec<MetricDefinition>);

    #[async_trait]
    impl CatalogSource for FixedCatalog {
        async fn fetch_definitions(
            &self,
            dialect: Dialect,
            classes: &[TargetClass],
        ) -> Result<Vec<MetricDefinition>, MonitoringError> {
            Ok(self
                .0
                .iter()
                .filter(|m| m.dialect == dialect && classes.contains(&m.target_class))
                .cloned()
                .collect())
        }
    }

    struct DownCatalog;

    #[async_trait]
    impl CatalogSource for DownCatalog {
        async fn fetch_definitions(
            &self,
            _dialect: Dialect,
            _classes: &[TargetClass],
        ) -> Result<Vec<MetricDefinition>, MonitoringError> {
            Err(MonitoringError::CatalogUnavailable("connection refused".into()))
        }
    }

    fn mixed_catalog() -> FixedCatalog {
        use Dialect::*;
        use TargetClass::*;
        FixedCatalog(vec![
            def(MySql, Host, "CPU", "CPU usage"),
            def(MySql, Instance, "QUERIES", "Queries"),
            def(MySql, Host, "SESSIONS", "Sessions"),
            def(MySql, Instance, "CONNS", "Connections"),
            def(PostgreSql, Host, "LOAD", "Load average"),
            def(PostgreSql, Instance, "TPS", "Transactions"),
            def(PostgreSql, Instance, "BLOAT", "Bloat"),
            def(Oracle, Instance, "2144", "Avg single-block read latency"),
            def(Oracle, Instance, "2003", "User transactions"),
            def(Oracle, Instance, "2000", "CPU usage per txn"),
        ])
    }

    fn codes(metrics: &[MetricDefinition]) -> Vec<&str> {
        metrics.iter().map(|m| m.code.as_str()).collect()
    }

    #[tokio::test]
    async fn mysql_sorts_by_type_code_then_name() {
        let metrics = resolve(
            &mixed_catalog(),
            Dialect::MySql,
            None,
            &CatalogExclusions::default(),
        )
        .await;
        // MYSQL < NODE, and SESSIONS is excluded.
        assert_eq!(codes(&metrics), vec!["CONNS", "QUERIES", "CPU"]);
    }

    #[tokio::test]
    async fn postgresql_sorts_type_code_descending() {
        let metrics = resolve(
            &mixed_catalog(),
            Dialect::PostgreSql,
            None,
            &CatalogExclusions::default(),
        )
        .await;
        // PG > NODE when descending.
        assert_eq!(codes(&metrics), vec!["BLOAT", "TPS", "LOAD"]);
    }

    #[tokio::test]
    async fn oracle_sorts_by_name_and_excludes_degenerate_latency() {
        let metrics = resolve(
            &mixed_catalog(),
            Dialect::Oracle,
            None,
            &CatalogExclusions::default(),
        )
        .await;
        assert_eq!(codes(&metrics), vec!["2000", "2003"]);
    }

    #[tokio::test]
    async fn single_class_filter() {
        let metrics = resolve(
            &mixed_catalog(),
            Dialect::MySql,
            Some(TargetClass::Host),
            &CatalogExclusions::none(),
        )
        .await;
        assert_eq!(codes(&metrics), vec!["CPU", "SESSIONS"]);
    }

    #[tokio::test]
    async fn unsupported_class_is_empty() {
        let metrics = resolve(
            &mixed_catalog(),
            Dialect::Oracle,
            Some(TargetClass::Host),
            &CatalogExclusions::default(),
        )
        .await;
        assert!(metrics.is_empty());
    }

    #[tokio::test]
    async fn unreachable_catalog_is_empty() {
        let metrics = resolve(&DownCatalog, Dialect::MySql, None, &CatalogExclusions::default()).await;
        assert!(metrics.is_empty());
    }

    #[test]
    fn parses_exclusion_list() {
        let exclusions = CatalogExclusions::parse("mysql:SESSIONS, pg:SESSIONS ,oracle:2144").unwrap();
        assert_eq!(exclusions, CatalogExclusions::default());
        assert!(CatalogExclusions::parse("").unwrap().codes(Dialect::MySql).next().is_none());
        assert_matches!(CatalogExclusions::parse("SESSIONS"), Err(CoreError::Validation(_)));
        assert_matches!(CatalogExclusions::parse("mysql:"), Err(CoreError::Validation(_)));
        assert_matches!(CatalogExclusions::parse("db2:X"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn lists_excluded_codes_per_dialect() {
        let exclusions = CatalogExclusions::default().with(Dialect::MySql, "CONNS");
        assert_eq!(exclusions.codes(Dialect::MySql).collect::<Vec<_>>(), vec!["CONNS", "SESSIONS"]);
        assert_eq!(exclusions.codes(Dialect::Oracle).collect::<Vec<_>>(), vec!["2144"]);
    }

    #[tokio::test]
    async fn strict_resolution_reports_unreachable_catalog() {
        let err = try_resolve(&DownCatalog, Dialect::MySql, None, &CatalogExclusions::default())
            .await
            .unwrap_err();
        assert_matches!(err, MonitoringError::CatalogUnavailable(_));
    }
}

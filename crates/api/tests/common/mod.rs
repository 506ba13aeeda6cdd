use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderValue, Request, Response};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

use dbod_api::config::ServerConfig;
use dbod_api::router::build_app_router;
use dbod_api::state::AppState;
use dbod_core::error::MonitoringError;
use dbod_core::monitoring::{
    CatalogSource, Dialect, MetricDefinition, MonitoringSettings, RawSample, SampleQuery,
    SampleSource, TargetClass,
};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: IpAddr::from([127, 0, 0, 1]),
        port: 0,
        cors_origins: vec![HeaderValue::from_static("http://localhost:5173")],
        request_timeout_secs: 30,
    }
}

/// In-memory catalog and sample store.
///
/// Samples are keyed by `(target_key, metric_code)`. `fail_catalog` and
/// `fail_samples` make the respective reads report the source as unavailable.
#[derive(Default)]
pub struct InMemoryStore {
    pub definitions: Vec<MetricDefinition>,
    pub samples: Vec<(String, String, RawSample)>,
    pub fail_catalog: bool,
    pub fail_samples: bool,
}

#[async_trait]
impl CatalogSource for InMemoryStore {
    async fn fetch_definitions(
        &self,
        dialect: Dialect,
        classes: &[TargetClass],
    ) -> Result<Vec<MetricDefinition>, MonitoringError> {
        if self.fail_catalog {
            return Err(MonitoringError::CatalogUnavailable(
                "connection refused".to_string(),
            ));
        }
        Ok(self
            .definitions
            .iter()
            .filter(|m| m.dialect == dialect && classes.contains(&m.target_class))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SampleSource for InMemoryStore {
    async fn fetch_samples(&self, query: &SampleQuery) -> Result<Vec<RawSample>, MonitoringError> {
        if self.fail_samples {
            return Err(MonitoringError::SampleSourceUnavailable(
                "connection reset".to_string(),
            ));
        }
        Ok(self
            .samples
            .iter()
            .filter(|(target, code, _)| *target == query.target_key && *code == query.metric_code)
            .map(|(_, _, sample)| sample.clone())
            .collect())
    }
}

pub fn definition(dialect: Dialect, class: TargetClass, code: &str, name: &str) -> MetricDefinition {
    MetricDefinition {
        dialect,
        target_class: class,
        code: code.to_string(),
        display_name: name.to_string(),
        unit: "count".to_string(),
    }
}

/// A small catalog covering all three dialects, including excluded codes.
pub fn seeded_store() -> InMemoryStore {
    use Dialect::*;
    use TargetClass::*;

    let now = Utc::now();
    let sample = |from_min: i64, to_min: Option<i64>, value: &str| {
        RawSample::new(
            now - Duration::minutes(from_min),
            to_min.map(|m| now - Duration::minutes(m)),
            value,
        )
    };

    InMemoryStore {
        definitions: vec![
            definition(MySql, Instance, "QUERIES", "Queries"),
            definition(MySql, Instance, "CONNS", "Connections"),
            definition(MySql, Host, "SESSIONS", "Sessions"),
            definition(MySql, Host, "CPU", "CPU usage"),
            definition(Oracle, Instance, "2144", "Avg single-block read latency"),
            definition(Oracle, Instance, "2003", "User transactions"),
            definition(PostgreSql, Instance, "TPS", "Transactions"),
        ],
        samples: vec![
            // Two contiguous samples, then a 50 minute gap and an open sample.
            ("dod_orders".into(), "QUERIES".into(), sample(120, Some(110), "100")),
            ("dod_orders".into(), "QUERIES".into(), sample(110, Some(100), "150")),
            ("dod_orders".into(), "QUERIES".into(), sample(50, None, "120")),
            ("db-host-01".into(), "CPU".into(), sample(30, None, "12.5")),
            ("ORDERS".into(), "2003".into(), sample(120, Some(100), "5")),
            ("ORDERS".into(), "2003".into(), sample(50, Some(40), "9")),
            ("dod_broken".into(), "QUERIES".into(), sample(30, None, "not-a-number")),
        ],
        fail_catalog: false,
        fail_samples: false,
    }
}

/// Build the full application router over the given store.
pub fn build_test_app(store: InMemoryStore) -> Router {
    let store = Arc::new(store);
    let state = AppState {
        catalog: store.clone(),
        samples: store,
        settings: Arc::new(MonitoringSettings::default()),
    };
    build_app_router(state, &test_config())
}

/// Send a GET request through the router.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

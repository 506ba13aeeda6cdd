//! Tuning knobs shared by the catalog resolver and the series synthesizer.

use std::collections::BTreeSet;
use std::time::Duration as StdDuration;

use chrono::Duration;
use validator::Validate;

use crate::error::CoreError;
use crate::monitoring::catalog::CatalogExclusions;
use crate::monitoring::dialect::Dialect;
use crate::monitoring::series::{
    BridgeSettings, DEFAULT_BRIDGE_MARGIN_SECS, DEFAULT_BRIDGE_THRESHOLD_SECS,
};
use crate::types::Timestamp;

/// Default chart window in days.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Longest selectable chart window in days.
pub const MAX_WINDOW_DAYS: u32 = 366;

/// Default upper bound on a single sample fetch.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Default prefix of MySQL/PostgreSQL instance target names.
pub const DEFAULT_INSTANCE_PREFIX: &str = "dod_";

/// Monitoring configuration.
#[derive(Debug, Clone, Validate)]
pub struct MonitoringSettings {
    /// Days of history shown when the caller does not pick a window.
    #[validate(range(min = 1, max = 366))]
    pub window_days: u32,
    #[validate(range(min = 1))]
    pub bridge_threshold_secs: i64,
    #[validate(range(min = 1))]
    pub bridge_margin_secs: i64,
    /// Dialects whose samples are contiguous by construction and are never
    /// bridged.
    pub bridge_disabled: BTreeSet<Dialect>,
    #[validate(range(min = 1, max = 300))]
    pub fetch_timeout_secs: u64,
    pub instance_prefix: String,
    pub exclusions: CatalogExclusions,
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            bridge_threshold_secs: DEFAULT_BRIDGE_THRESHOLD_SECS,
            bridge_margin_secs: DEFAULT_BRIDGE_MARGIN_SECS,
            bridge_disabled: BTreeSet::from([Dialect::Oracle]),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            instance_prefix: DEFAULT_INSTANCE_PREFIX.to_string(),
            exclusions: CatalogExclusions::default(),
        }
    }
}

impl MonitoringSettings {
    /// Load settings from environment variables with defaults.
    ///
    /// | Env Var                     | Default                                  |
    /// |-----------------------------|------------------------------------------|
    /// | `MONITORING_WINDOW_DAYS`    | `7`                                      |
    /// | `BRIDGE_THRESHOLD_SECS`     | `420`                                    |
    /// | `BRIDGE_MARGIN_SECS`        | `360`                                    |
    /// | `BRIDGE_DISABLED_DIALECTS`  | `oracle`                                 |
    /// | `SAMPLE_FETCH_TIMEOUT_SECS` | `10`                                     |
    /// | `INSTANCE_NAME_PREFIX`      | `dod_`                                   |
    /// | `CATALOG_EXCLUSIONS`        | `mysql:SESSIONS,postgresql:SESSIONS,oracle:2144` |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`MonitoringSettings::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let mut settings = Self::default();

        if let Some(raw) = lookup("MONITORING_WINDOW_DAYS") {
            settings.window_days = parse_number("MONITORING_WINDOW_DAYS", &raw)?;
        }
        if let Some(raw) = lookup("BRIDGE_THRESHOLD_SECS") {
            settings.bridge_threshold_secs = parse_number("BRIDGE_THRESHOLD_SECS", &raw)?;
        }
        if let Some(raw) = lookup("BRIDGE_MARGIN_SECS") {
            settings.bridge_margin_secs = parse_number("BRIDGE_MARGIN_SECS", &raw)?;
        }
        if let Some(raw) = lookup("BRIDGE_DISABLED_DIALECTS") {
            settings.bridge_disabled = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::parse::<Dialect>)
                .collect::<Result<BTreeSet<_>, _>>()?;
        }
        if let Some(raw) = lookup("SAMPLE_FETCH_TIMEOUT_SECS") {
            settings.fetch_timeout_secs = parse_number("SAMPLE_FETCH_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("INSTANCE_NAME_PREFIX") {
            settings.instance_prefix = raw.trim().to_string();
        }
        if let Some(raw) = lookup("CATALOG_EXCLUSIONS") {
            settings.exclusions = CatalogExclusions::parse(&raw)?;
        }

        settings.check()?;
        Ok(settings)
    }

    /// Validate field ranges and the threshold/margin relationship.
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        self.bridge(Dialect::MySql).validate()
    }

    pub fn bridge_enabled(&self, dialect: Dialect) -> bool {
        !self.bridge_disabled.contains(&dialect)
    }

    /// Bridge configuration for a synthesis call on `dialect`.
    pub fn bridge(&self, dialect: Dialect) -> BridgeSettings {
        BridgeSettings {
            enabled: self.bridge_enabled(dialect),
            threshold: Duration::seconds(self.bridge_threshold_secs),
            margin: Duration::seconds(self.bridge_margin_secs),
        }
    }

    pub fn fetch_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.fetch_timeout_secs)
    }

    /// Left edge of a chart ending at `now`, `days` back (or the configured
    /// default).
    pub fn window_start(&self, now: Timestamp, days: Option<u32>) -> Result<Timestamp, CoreError> {
        let days = days.unwrap_or(self.window_days);
        if !(1..=MAX_WINDOW_DAYS).contains(&days) {
            return Err(CoreError::Validation(format!(
                "days must be between 1 and {MAX_WINDOW_DAYS}, got {days}"
            )));
        }
        Ok(now - Duration::days(i64::from(days)))
    }
}

/// Parse a numeric setting or request parameter, naming `key` in the error.
pub fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, CoreError> {
    raw.trim()
        .parse()
        .map_err(|_| CoreError::Validation(format!("{key} must be a number, got '{raw}'")))
}

//! Monitored backend dialects and the classes of target they expose.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Catalog type code for host-level metrics (shared by MySQL and PostgreSQL).
pub const TYPE_CODE_NODE: &str = "NODE";

/// Catalog type code for MySQL instance metrics.
pub const TYPE_CODE_MYSQL: &str = "MYSQL";

/// Catalog type code for PostgreSQL instance metrics.
pub const TYPE_CODE_PG: &str = "PG";

/// Catalog type code for Oracle instance metrics.
pub const TYPE_CODE_ORACLE: &str = "ORACLE";

/// A supported monitoring backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    MySql,
    Oracle,
    PostgreSql,
}

impl Dialect {
    /// Every supported dialect.
    pub const ALL: [Dialect; 3] = [Dialect::MySql, Dialect::Oracle, Dialect::PostgreSql];

    /// Lowercase name used in URLs, configuration and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Oracle => "oracle",
            Dialect::PostgreSql => "postgresql",
        }
    }

    /// Target classes this dialect publishes metrics for, in catalog order.
    ///
    /// Oracle only exposes instance-level metrics.
    pub fn target_classes(self) -> &'static [TargetClass] {
        match self {
            Dialect::MySql | Dialect::PostgreSql => &[TargetClass::Instance, TargetClass::Host],
            Dialect::Oracle => &[TargetClass::Instance],
        }
    }

    pub fn supports(self, class: TargetClass) -> bool {
        self.target_classes().contains(&class)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(Dialect::MySql),
            "oracle" => Ok(Dialect::Oracle),
            "postgresql" | "postgres" | "pg" => Ok(Dialect::PostgreSql),
            other => Err(CoreError::Validation(format!(
                "Unknown dialect '{other}'. Must be one of: mysql, oracle, postgresql"
            ))),
        }
    }
}

/// Which entity a metric describes: the database instance or the host it
/// runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetClass {
    Instance,
    Host,
}

impl TargetClass {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetClass::Instance => "instance",
            TargetClass::Host => "host",
        }
    }

    /// Catalog type code of this class under `dialect`, or `None` if the
    /// dialect does not expose the class.
    pub fn type_code(self, dialect: Dialect) -> Option<&'static str> {
        match (dialect, self) {
            (Dialect::MySql, TargetClass::Instance) => Some(TYPE_CODE_MYSQL),
            (Dialect::PostgreSql, TargetClass::Instance) => Some(TYPE_CODE_PG),
            (Dialect::Oracle, TargetClass::Instance) => Some(TYPE_CODE_ORACLE),
            (Dialect::MySql | Dialect::PostgreSql, TargetClass::Host) => Some(TYPE_CODE_NODE),
            (Dialect::Oracle, TargetClass::Host) => None,
        }
    }

    /// Inverse of [`TargetClass::type_code`].
    pub fn from_type_code(dialect: Dialect, code: &str) -> Option<Self> {
        dialect
            .target_classes()
            .iter()
            .copied()
            .find(|class| class.type_code(dialect) == Some(code))
    }
}

impl fmt::Display for TargetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetClass {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instance" => Ok(TargetClass::Instance),
            "host" | "node" => Ok(TargetClass::Host),
            other => Err(CoreError::Validation(format!(
                "Unknown target class '{other}'. Must be one of: instance, host"
            ))),
        }
    }
}

/// A monitored database instance and, optionally, the host it runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredTarget {
    pub instance_name: String,
    pub host: Option<String>,
}

impl MonitoredTarget {
    pub fn new(instance_name: impl Into<String>, host: Option<String>) -> Self {
        Self {
            instance_name: instance_name.into(),
            host,
        }
    }

    /// Name under which the sample source stores data for this target.
    ///
    /// MySQL and PostgreSQL instances are stored as `<prefix><name>`, hosts
    /// under their host name and Oracle clusters under the upper-cased
    /// instance name.
    pub fn target_key(
        &self,
        dialect: Dialect,
        class: TargetClass,
        instance_prefix: &str,
    ) -> Result<String, CoreError> {
        if !dialect.supports(class) {
            return Err(CoreError::Validation(format!(
                "{dialect} does not publish {class} metrics"
            )));
        }
        match (dialect, class) {
            (Dialect::Oracle, _) => Ok(self.instance_name.to_uppercase()),
            (_, TargetClass::Instance) => Ok(format!("{instance_prefix}{}", self.instance_name)),
            (_, TargetClass::Host) => match self.host.as_deref().map(str::trim) {
                Some(host) if !host.is_empty() => Ok(host.to_string()),
                _ => Err(CoreError::Validation(format!(
                    "Host metrics requested for '{}' but no host was given",
                    self.instance_name
                ))),
            },
        }
    }
}

//! HTTP server configuration.

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderValue;
use dbod_core::error::CoreError;
use dbod_core::monitoring::parse_number;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where the server listens and which browser origins may call it.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Origins allowed by CORS, already validated as header values.
    pub cors_origins: Vec<HeaderValue>,
    /// Upper bound on a whole request, including the sample fetch.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            cors_origins: vec![HeaderValue::from_static(DEFAULT_CORS_ORIGIN)],
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("HOST") {
            config.host = raw.trim().parse().map_err(|_| {
                CoreError::Validation(format!("HOST must be an IP address, got '{raw}'"))
            })?;
        }
        if let Some(raw) = lookup("PORT") {
            config.port = parse_number("PORT", &raw)?;
        }
        if let Some(raw) = lookup("CORS_ORIGINS") {
            config.cors_origins = parse_origins(&raw)?;
        }
        if let Some(raw) = lookup("REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = parse_number("REQUEST_TIMEOUT_SECS", &raw)?;
            if config.request_timeout_secs == 0 {
                return Err(CoreError::Validation(
                    "REQUEST_TIMEOUT_SECS must be positive".to_string(),
                ));
            }
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Comma-separated `http(s)://` origins. Blank entries are skipped.
fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, CoreError> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            if !(origin.starts_with("http://") || origin.starts_with("https://")) {
                return Err(CoreError::Validation(format!(
                    "CORS origin '{origin}' must start with http:// or https://"
                )));
            }
            HeaderValue::from_str(origin).map_err(|_| {
                CoreError::Validation(format!("CORS origin '{origin}' is not a valid header value"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:3000");
        assert_eq!(config.cors_origins, vec![HeaderValue::from_static(DEFAULT_CORS_ORIGIN)]);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn overrides_from_environment() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("CORS_ORIGINS", "https://dbod.example.org, ,http://localhost:3000"),
            ("REQUEST_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(
            config.cors_origins,
            vec![
                HeaderValue::from_static("https://dbod.example.org"),
                HeaderValue::from_static("http://localhost:3000"),
            ]
        );
        assert_eq!(config.request_timeout_secs, 5);
    }

    #[test]
    fn invalid_values_are_validation_errors() {
        for vars in [
            [("PORT", "70000")],
            [("PORT", "http")],
            [("HOST", "not a host")],
            [("CORS_ORIGINS", "localhost:5173")],
            [("REQUEST_TIMEOUT_SECS", "0")],
        ] {
            assert_matches!(
                ServerConfig::from_lookup(lookup(&vars)),
                Err(CoreError::Validation(_)),
                "{vars:?}"
            );
        }
    }
}

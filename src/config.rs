//! Server configuration.
//!
//! Loaded once at startup from environment variables, falling back to
//! defaults for anything unset.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default SQLite database file.
const DEFAULT_DATABASE_PATH: &str = "pr-reviewer.db";

/// Default listen host.
const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port.
const DEFAULT_PORT: u16 = 8080;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Host or IP to bind.
    pub host: String,

    /// Port to bind.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Read `DATABASE_PATH`, `HOSTNAME` and `PORT` from the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| {
                AppError::invalid_input_field(
                    format!("PORT must be a port number, got {:?}", raw),
                    "PORT",
                )
            })?,
            None => defaults.port,
        };

        Ok(Self {
            database_path: get("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            host: get("HOSTNAME").unwrap_or(defaults.host),
            port,
        })
    }

    /// Socket address to bind, resolving the host if it is not a literal IP.
    pub async fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        let mut addrs = tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|e| {
                AppError::invalid_input_field(
                    format!("cannot resolve {}: {}", self.host, e),
                    "HOSTNAME",
                )
            })?;

        addrs.next().ok_or_else(|| {
            AppError::invalid_input_field(format!("no address for {}", self.host), "HOSTNAME")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("DATABASE_PATH", "/data/reviews.db"),
            ("HOSTNAME", "127.0.0.1"),
            ("PORT", " 9090 "),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/data/reviews.db"));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9090);
    }

    #[test]
    fn test_empty_values_fall_back() {
        let config =
            ServerConfig::from_lookup(lookup(&[("HOSTNAME", ""), ("PORT", "  ")])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_invalid_port() {
        let err = ServerConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { field: Some(f), .. } if f == "PORT"));
    }

    #[tokio::test]
    async fn test_bind_addr_literal_ip() {
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: 3000,
            ..ServerConfig::default()
        };
        let addr = config.bind_addr().await.unwrap();
        assert_eq!(addr, SocketAddr::from(([127, 0, 0, 1], 3000)));
    }
}

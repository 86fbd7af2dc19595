//! Runtime configuration
//!
//! Loaded from environment variables:
//!
//! | Variable                  | Default                 |
//! |---------------------------|-------------------------|
//! | `SPARROW_CONFIG_ENDPOINT` | `http://127.0.0.1:8080` |
//! | `SPARROW_CONFIG_PATH`     | `/`                     |
//! | `SPARROW_LOGGER_ENDPOINT` | unset (local only)      |
//! | `SPARROW_SERVICE_NAME`    | `sparrow`               |
//! | `SPARROW_LOG_LEVEL`       | `info`                  |
//! | `SPARROW_LOG_FORMAT`      | `pretty`                |
//! | `SPARROW_RELAY_CAPACITY`  | `1024`                  |

use crate::RuntimeError;
use sparrow_config_grpc::{DEFAULT_ENDPOINT, DEFAULT_PATH};
use sparrow_core::Level;
use sparrow_logger_grpc::DEFAULT_RELAY_CAPACITY;

pub const ENV_CONFIG_ENDPOINT: &str = "SPARROW_CONFIG_ENDPOINT";
pub const ENV_CONFIG_PATH: &str = "SPARROW_CONFIG_PATH";
pub const ENV_LOGGER_ENDPOINT: &str = "SPARROW_LOGGER_ENDPOINT";
pub const ENV_SERVICE_NAME: &str = "SPARROW_SERVICE_NAME";
pub const ENV_LOG_LEVEL: &str = "SPARROW_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "SPARROW_LOG_FORMAT";
pub const ENV_RELAY_CAPACITY: &str = "SPARROW_RELAY_CAPACITY";

/// Service name used when none is configured
pub const DEFAULT_SERVICE_NAME: &str = "sparrow";

/// Format of the process's own diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub config_endpoint: String,
    pub config_path: String,
    /// Remote logging service; `None` keeps logs local
    pub logger_endpoint: Option<String>,
    pub service_name: String,
    pub log_level: Level,
    pub log_format: LogFormat,
    pub relay_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_endpoint: DEFAULT_ENDPOINT.to_string(),
            config_path: DEFAULT_PATH.to_string(),
            logger_endpoint: None,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            log_level: Level::Info,
            log_format: LogFormat::Pretty,
            relay_capacity: DEFAULT_RELAY_CAPACITY,
        }
    }
}

impl Config {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, RuntimeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key lookup; unset and empty values take the default
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RuntimeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let log_format = match get(ENV_LOG_FORMAT) {
            None => defaults.log_format,
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                other => {
                    return Err(RuntimeError::Config(format!(
                        "{ENV_LOG_FORMAT}: expected json or pretty, got {other:?}"
                    )));
                }
            },
        };

        let relay_capacity = match get(ENV_RELAY_CAPACITY) {
            None => defaults.relay_capacity,
            Some(v) => match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(RuntimeError::Config(format!(
                        "{ENV_RELAY_CAPACITY}: expected a positive integer, got {v:?}"
                    )));
                }
            },
        };

        Ok(Self {
            config_endpoint: get(ENV_CONFIG_ENDPOINT).unwrap_or(defaults.config_endpoint),
            config_path: get(ENV_CONFIG_PATH).unwrap_or(defaults.config_path),
            logger_endpoint: get(ENV_LOGGER_ENDPOINT),
            service_name: get(ENV_SERVICE_NAME).unwrap_or(defaults.service_name),
            // Unknown names fall back to info
            log_level: get(ENV_LOG_LEVEL).map_or(defaults.log_level, |v| Level::from_name(&v)),
            log_format,
            relay_capacity,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, RuntimeError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.config_path, "/");
        assert_eq!(config.logger_endpoint, None);
        assert_eq!(config.relay_capacity, 1024);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            (ENV_CONFIG_ENDPOINT, "http://config:9000"),
            (ENV_CONFIG_PATH, "/app/db"),
            (ENV_LOGGER_ENDPOINT, "http://logs:9001"),
            (ENV_SERVICE_NAME, "billing"),
            (ENV_LOG_LEVEL, "DEBUG"),
            (ENV_LOG_FORMAT, "json"),
            (ENV_RELAY_CAPACITY, "64"),
        ])
        .unwrap();

        assert_eq!(config.config_endpoint, "http://config:9000");
        assert_eq!(config.config_path, "/app/db");
        assert_eq!(config.logger_endpoint.as_deref(), Some("http://logs:9001"));
        assert_eq!(config.service_name, "billing");
        assert_eq!(config.log_level, Level::Debug);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.relay_capacity, 64);
    }

    #[test]
    fn test_empty_values_use_defaults() {
        let config = load(&[(ENV_CONFIG_PATH, ""), (ENV_LOGGER_ENDPOINT, "  ")]).unwrap();
        assert_eq!(config.config_path, "/");
        assert_eq!(config.logger_endpoint, None);
    }

    #[test]
    fn test_unknown_level_is_info() {
        assert_eq!(load(&[(ENV_LOG_LEVEL, "chatty")]).unwrap().log_level, Level::Info);
    }

    #[test]
    fn test_invalid_format() {
        let err = load(&[(ENV_LOG_FORMAT, "xml")]).unwrap_err();
        assert!(matches!(err, RuntimeError::Config(_)));
        assert!(err.to_string().contains(ENV_LOG_FORMAT));
    }

    #[test]
    fn test_invalid_capacity() {
        for bad in ["0", "-5", "lots"] {
            let err = load(&[(ENV_RELAY_CAPACITY, bad)]).unwrap_err();
            assert!(matches!(err, RuntimeError::Config(_)), "{bad}");
        }
    }
}

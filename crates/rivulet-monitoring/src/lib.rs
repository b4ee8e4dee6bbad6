//! Logging configuration and setup for Rivulet.

use serde::{Deserialize, Serialize};
use std::env;

pub mod logging;
pub use logging::{init_logging, init_test_tracing, LogExt};

/// Output format of the log layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line output
    #[default]
    Pretty,
    /// One JSON object per event, for log aggregation
    Json,
}

/// Configuration for initializing logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Service name attached to the startup event
    pub service_name: String,

    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub log_filter: String,

    /// Output format
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            service_name: "rivulet".to_string(),
            log_filter: "info,rivulet_core=debug".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl MonitoringConfig {
    /// Defaults with `LOG_FILTER` and `LOG_FORMAT` overrides from the environment
    pub fn from_env(service_name: impl Into<String>) -> Self {
        Self::from_lookup(service_name, |key| env::var(key).ok())
    }

    /// Same as [`MonitoringConfig::from_env`] with a custom variable lookup
    pub fn from_lookup<F>(service_name: impl Into<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            service_name: service_name.into(),
            ..Self::default()
        };

        if let Some(filter) = lookup("LOG_FILTER") {
            config.log_filter = filter;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            config.log_format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            };
        }

        config
    }
}

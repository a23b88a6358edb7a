use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::device::DeviceProperties;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub correlation: CorrelationConfig,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(alias = "console", default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorrelationConfig {
    /// Unset means a delayed write waits for its notice indefinitely.
    #[serde(default)]
    pub waiter_timeout_ms: Option<u64>,
    #[serde(default = "default_early_finish_ttl_ms")]
    pub early_finish_ttl_ms: u64,
    #[serde(default = "default_early_finish_capacity")]
    pub early_finish_capacity: usize,
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            waiter_timeout_ms: None,
            early_finish_ttl_ms: default_early_finish_ttl_ms(),
            early_finish_capacity: default_early_finish_capacity(),
            sweep_interval_ms: default_sweep_interval_ms(),
        }
    }
}

impl CorrelationConfig {
    pub fn waiter_timeout(&self) -> Option<Duration> {
        self.waiter_timeout_ms.map(Duration::from_millis)
    }

    pub fn early_finish_ttl(&self) -> Duration {
        Duration::from_millis(self.early_finish_ttl_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

/// A device whose state table is initialised at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    pub id: String,
    #[serde(default)]
    pub properties: DeviceProperties,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_yaml::from_str(content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("GATEWAY_DATABASE_URL") {
            self.database.url = value;
        }
        if let Ok(value) = std::env::var("GATEWAY_LOG_LEVEL") {
            self.logging.level = value;
        }
    }
}

fn default_port() -> u16 {
    8484
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_early_finish_ttl_ms() -> u64 {
    300_000
}

fn default_early_finish_capacity() -> usize {
    10_000
}

fn default_sweep_interval_ms() -> u64 {
    30_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{PropertyKind, PropertyValue};

    const MINIMAL: &str = r#"
database:
  url: "sqlite::memory:"
"#;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::from_yaml(MINIMAL).expect("valid config");

        assert_eq!(config.gateway.port, 8484);
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.correlation.waiter_timeout(), None);
        assert_eq!(config.correlation.early_finish_ttl(), Duration::from_secs(300));
        assert_eq!(config.correlation.early_finish_capacity, 10_000);
        assert!(config.devices.is_empty());
    }

    #[test]
    fn devices_and_correlation_are_parsed() {
        let config = Config::from_yaml(
            r#"
database:
  url: "sqlite://gateway.db"
correlation:
  waiter_timeout_ms: 5000
  early_finish_capacity: 32
devices:
  - id: smart-switch-01
    properties:
      on:
        type: boolean
        value: false
      level:
        type: number
        value: 40
"#,
        )
        .expect("valid config");

        assert_eq!(
            config.correlation.waiter_timeout(),
            Some(Duration::from_secs(5))
        );
        assert_eq!(config.correlation.early_finish_capacity, 32);
        let device = &config.devices[0];
        assert_eq!(device.id, "smart-switch-01");
        assert_eq!(device.properties["on"].kind, PropertyKind::Boolean);
        assert_eq!(device.properties["level"].value, PropertyValue::Number(40.0));
    }

    #[test]
    fn validate_rejects_zero_capacity() {
        let err = Config::from_yaml(
            r#"
database:
  url: "sqlite::memory:"
correlation:
  early_finish_capacity: 0
"#,
        )
        .expect_err("capacity must be positive");
        assert!(matches!(err, ConfigError::InvalidConfig(_)));
    }

    #[test]
    fn validate_rejects_unknown_log_format() {
        let err = Config::from_yaml(
            r#"
database:
  url: "sqlite::memory:"
logging:
  format: xml
"#,
        )
        .expect_err("format must be known");
        assert!(matches!(err, ConfigError::InvalidConfig(_)));
    }

    #[test]
    fn missing_database_section_is_a_parse_error() {
        let err = Config::from_yaml("gateway:\n  port: 9000\n").expect_err("database required");
        assert!(matches!(err, ConfigError::Yaml(_)));
    }
}

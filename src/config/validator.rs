use thiserror::Error;

use super::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "database.url cannot be empty".to_string(),
            ));
        }

        if self.gateway.port == 0 {
            return Err(ConfigError::InvalidConfig(
                "gateway.port must be between 1 and 65535".to_string(),
            ));
        }

        if self.correlation.early_finish_capacity == 0 {
            return Err(ConfigError::InvalidConfig(
                "correlation.early_finish_capacity must be at least 1".to_string(),
            ));
        }

        if self.correlation.sweep_interval_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "correlation.sweep_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.correlation.waiter_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidConfig(
                "correlation.waiter_timeout_ms must be greater than 0 when set".to_string(),
            ));
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidConfig(format!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            )));
        }

        for device in &self.devices {
            if device.id.trim().is_empty() {
                return Err(ConfigError::InvalidConfig(
                    "devices[].id cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

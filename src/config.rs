pub use self::parser::{
    Config, CorrelationConfig, DatabaseConfig, DeviceConfig, GatewayConfig, LoggingConfig,
};
pub use self::validator::ConfigError;

mod parser;
mod validator;

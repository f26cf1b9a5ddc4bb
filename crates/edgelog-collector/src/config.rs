use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CollectorConfig {
    /// Bind address for the gRPC listener
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port for the gRPC listener
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// How long in-flight sessions may drain after shutdown before being
    /// forcibly terminated, in seconds
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,

    /// Max wait time for cleanup closers in seconds
    #[serde(default = "default_closer_timeout_secs")]
    pub closer_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_drain_timeout_secs() -> u64 {
    20
}

fn default_closer_timeout_secs() -> u64 {
    10
}

impl CollectorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("EDGELOG"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure tests run serially and don't interfere with each other
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let _lock = TEST_LOCK.lock().unwrap();

        std::env::remove_var("EDGELOG_HOST");
        std::env::remove_var("EDGELOG_PORT");
        std::env::remove_var("EDGELOG_LOG_LEVEL");

        let config = CollectorConfig::from_env().unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.drain_timeout_secs, 20);
        assert_eq!(config.closer_timeout_secs, 10);
    }

    #[test]
    fn test_custom_config() {
        let _lock = TEST_LOCK.lock().unwrap();

        std::env::set_var("EDGELOG_HOST", "127.0.0.1");
        std::env::set_var("EDGELOG_PORT", "9443");
        std::env::set_var("EDGELOG_LOG_LEVEL", "debug");

        let config = CollectorConfig::from_env().unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9443);
        assert_eq!(config.log_level, "debug");

        // Clean up
        std::env::remove_var("EDGELOG_HOST");
        std::env::remove_var("EDGELOG_PORT");
        std::env::remove_var("EDGELOG_LOG_LEVEL");
    }
}

//! Configuration loading and validation
//!
//! Precedence is CLI arguments > config file > environment variables >
//! built-in defaults; the CLI layer applies its own overrides after
//! calling into this module.

mod types;

pub use types::{ClientConfig, Config, LogConfig};

use anyhow::{bail, Context};
use std::path::Path;
use std::time::Duration;

use crate::Result;

/// Manages configuration loading and validation
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from file, falling back to defaults when the
    /// file does not exist
    pub fn load_from_file(path: &Path) -> Result<Config> {
        if path.exists() {
            tracing::info!("Loading configuration from: {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

            config
                .validate()
                .context("Configuration validation failed")?;

            tracing::info!("Configuration loaded and validated successfully");
            Ok(config)
        } else {
            tracing::warn!(
                "Configuration file not found at {}, using defaults",
                path.display()
            );
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from environment variables
    pub fn load_from_env() -> Result<Config> {
        let mut config = Config::default();

        if let Ok(port) = std::env::var("TCPLINK_DEFAULT_PORT") {
            config.client.default_port = port
                .parse::<u16>()
                .with_context(|| format!("Invalid TCPLINK_DEFAULT_PORT: {}", port))?;
        }

        if let Ok(timeout) = std::env::var("TCPLINK_CONNECT_TIMEOUT") {
            config.client.connect_timeout = humantime::parse_duration(&timeout)
                .with_context(|| format!("Invalid TCPLINK_CONNECT_TIMEOUT: {}", timeout))?;
        }

        if let Ok(timeout) = std::env::var("TCPLINK_READ_TIMEOUT") {
            config.client.read_timeout = humantime::parse_duration(&timeout)
                .with_context(|| format!("Invalid TCPLINK_READ_TIMEOUT: {}", timeout))?;
        }

        if let Ok(timeout) = std::env::var("TCPLINK_WRITE_TIMEOUT") {
            config.client.write_timeout = humantime::parse_duration(&timeout)
                .with_context(|| format!("Invalid TCPLINK_WRITE_TIMEOUT: {}", timeout))?;
        }

        if let Ok(len) = std::env::var("TCPLINK_MAX_READ_LEN") {
            config.client.max_read_len = len
                .parse::<usize>()
                .with_context(|| format!("Invalid TCPLINK_MAX_READ_LEN: {}", len))?;
        }

        if let Ok(level) = std::env::var("TCPLINK_LOG_LEVEL") {
            config.log.level = level;
        }

        config.validate()?;
        Ok(config)
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.client.connect_timeout == Duration::ZERO {
            bail!("connect_timeout must be greater than zero");
        }
        if self.client.read_timeout == Duration::ZERO {
            bail!("read_timeout must be greater than zero");
        }
        if self.client.write_timeout == Duration::ZERO {
            bail!("write_timeout must be greater than zero");
        }
        if self.client.max_read_len == 0 {
            bail!("max_read_len must be greater than zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_constants() {
        let config = Config::default();
        assert_eq!(config.client.default_port, 9100);
        assert_eq!(config.client.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.client.read_timeout, Duration::from_secs(10));
        assert_eq!(config.client.max_read_len, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_timeout_fails_validation() {
        let mut config = Config::default();
        config.client.read_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_read_len_fails_validation() {
        let mut config = Config::default();
        config.client.max_read_len = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [client]
            default_port = 4000
            connect_timeout = "3s"
            "#,
        )
        .unwrap();
        assert_eq!(config.client.default_port, 4000);
        assert_eq!(config.client.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.client.max_read_len, 1024);
    }
}

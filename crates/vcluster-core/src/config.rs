//! Client configuration: transport settings and logging defaults.
//!
//! Values come from an optional YAML file and can be overridden by
//! `VCLUSTER_*` environment variables.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Node management service port.
pub const DEFAULT_HTTPS_PORT: u16 = 8443;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Port appended to hosts that do not carry one
    pub https_port: u16,

    /// `https` in production; `http` is accepted for local test nodes
    pub scheme: String,

    /// Client-side deadline for a single host request
    pub request_timeout_secs: u64,

    /// Opt-in for nodes still on their self-signed certificates
    pub accept_invalid_certs: bool,

    pub log: LogConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            https_port: DEFAULT_HTTPS_PORT,
            scheme: "https".to_string(),
            request_timeout_secs: 300,
            accept_invalid_certs: false,
            log: LogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is unset, e.g. `info` or `vcluster_core=debug`
    pub level: String,
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

impl ClientConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: ClientConfig = serde_yaml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then `VCLUSTER_CONFIG` (a YAML file) if set, then the
    /// individual environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base = match std::env::var("VCLUSTER_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        base.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply `VCLUSTER_*` overrides read through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("VCLUSTER_HTTPS_PORT") {
            self.https_port = parse_env("VCLUSTER_HTTPS_PORT", &value)?;
        }
        if let Some(value) = lookup("VCLUSTER_SCHEME") {
            self.scheme = value;
        }
        if let Some(value) = lookup("VCLUSTER_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_env("VCLUSTER_REQUEST_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = lookup("VCLUSTER_ACCEPT_INVALID_CERTS") {
            self.accept_invalid_certs = parse_env("VCLUSTER_ACCEPT_INVALID_CERTS", &value)?;
        }
        if let Some(value) = lookup("VCLUSTER_LOG_LEVEL") {
            self.log.level = value;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheme != "https" && self.scheme != "http" {
            return Err(ConfigError::Invalid(format!(
                "scheme must be http or https, got '{}'",
                self.scheme
            )));
        }
        if self.https_port == 0 {
            return Err(ConfigError::Invalid("https_port must be non-zero".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_env<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::InvalidEnv {
        name: name.to_string(),
        value: value.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.https_port, 8443);
        assert_eq!(config.request_timeout(), Duration::from_secs(300));
        assert!(!config.accept_invalid_certs);
    }

    #[test]
    fn test_yaml_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "https_port: 9443\nlog:\n  level: debug").unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.https_port, 9443);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.scheme, "https");
        assert!(config.log.ansi);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("VCLUSTER_SCHEME", "http"),
            ("VCLUSTER_REQUEST_TIMEOUT_SECS", "5"),
            ("VCLUSTER_ACCEPT_INVALID_CERTS", "true"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::default()
            .with_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.scheme, "http");
        assert_eq!(config.request_timeout_secs, 5);
        assert!(config.accept_invalid_certs);
    }

    #[test]
    fn test_bad_env_value_is_rejected() {
        let result = ClientConfig::default().with_overrides(|name| {
            (name == "VCLUSTER_HTTPS_PORT").then(|| "not-a-port".to_string())
        });
        match result {
            Err(ConfigError::InvalidEnv { name, .. }) => assert_eq!(name, "VCLUSTER_HTTPS_PORT"),
            other => panic!("expected InvalidEnv, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_scheme_is_rejected() {
        let config = ClientConfig {
            scheme: "ftp".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}

//! Layered configuration for the server binary.
//!
//! Precedence, lowest to highest: built-in defaults, the YAML file passed
//! with `--config`, then `WEFT__`-prefixed environment variables
//! (`WEFT__SERVER__SHUTDOWN_TIMEOUT=5s` maps to `server.shutdown_timeout`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    /// Optional path to a service manifest; when unset the built-in
    /// demo manifest is used.
    pub manifest: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServerConfig {
    /// How long `shutdown` waits for services to close before aborting them.
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// Default tracing directive when `RUST_LOG` is not set, e.g. `info`
    /// or `weft_fabric=debug,info`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration with defaults, optional YAML file, and env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed("WEFT__").split("__"));
        let config: AppConfig = figment
            .extract()
            .with_context(|| "failed to load configuration")?;
        Ok(config)
    }

    /// Render the effective configuration as YAML for `--print-config`.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).with_context(|| "failed to serialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.server.shutdown_timeout, Duration::from_secs(10));
        assert_eq!(config.logging.level, "info");
        assert!(config.manifest.is_none());
    }

    #[test]
    fn test_yaml_file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("weft.yaml");
        std::fs::write(
            &path,
            "server:\n  shutdown_timeout: 3s\nlogging:\n  level: debug\n",
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.server.shutdown_timeout, Duration::from_secs(3));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("weft.yaml");
        std::fs::write(&path, "server:\n  listen_port: 8080\n").unwrap();

        assert!(AppConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_to_yaml_renders_durations() {
        let config = AppConfig::default();
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("shutdown_timeout"));
        assert!(yaml.contains("10s"));
    }
}

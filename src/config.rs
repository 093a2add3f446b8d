// config.rs — Layered configuration for the CLI and dev backend.
//
// Priority (highest to lowest):
//   1. CLI / env, passed as `Some(value)` from clap
//   2. TOML file at $CAREBOARD_CONFIG, falling back to ./careboard.toml
//   3. Built-in defaults

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::error;

use crate::server;

const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the task backend.
    pub api_url: String,
    /// Port `careboard serve` binds.
    pub port: u16,
    /// Email the CLI acts as when no `--user` is given.
    pub user: Option<String>,
    /// Log filter, e.g. "info" or "careboard=debug".
    pub log: String,
    /// Log output format: "pretty" or "json".
    pub log_format: String,
    /// Directory for daily-rolling log files. None = stderr only.
    pub log_dir: Option<PathBuf>,
}

/// Shape of careboard.toml. All keys optional; unknown keys ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TomlConfig {
    api_url: Option<String>,
    port: Option<u16>,
    user: Option<String>,
    log: Option<String>,
    log_format: Option<String>,
    log_dir: Option<PathBuf>,
}

fn config_path() -> PathBuf {
    std::env::var("CAREBOARD_CONFIG")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("careboard.toml"))
}

fn load_toml(path: &Path) -> Option<TomlConfig> {
    let contents = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config file, using defaults");
            None
        }
    }
}

impl AppConfig {
    /// Build config from CLI/env args plus the optional TOML file.
    pub fn new(
        api_url: Option<String>,
        port: Option<u16>,
        user: Option<String>,
        log: Option<String>,
    ) -> Self {
        let toml = load_toml(&config_path()).unwrap_or_default();
        let log_format = std::env::var("CAREBOARD_LOG_FORMAT")
            .ok()
            .filter(|s| !s.is_empty());
        let log_dir = std::env::var("CAREBOARD_LOG_DIR")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        Self::merge(api_url, port, user, log, log_format, log_dir, toml)
    }

    fn merge(
        api_url: Option<String>,
        port: Option<u16>,
        user: Option<String>,
        log: Option<String>,
        log_format: Option<String>,
        log_dir: Option<PathBuf>,
        toml: TomlConfig,
    ) -> Self {
        Self {
            api_url: api_url
                .or(toml.api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            port: port.or(toml.port).unwrap_or(server::DEFAULT_PORT),
            user: user.or(toml.user),
            log: log.or(toml.log).unwrap_or_else(|| "info".to_string()),
            log_format: log_format
                .or(toml.log_format)
                .unwrap_or_else(|| "pretty".to_string()),
            log_dir: log_dir.or(toml.log_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_when_nothing_is_set() {
        let cfg = AppConfig::merge(None, None, None, None, None, None, TomlConfig::default());
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.port, server::DEFAULT_PORT);
        assert_eq!(cfg.user, None);
        assert_eq!(cfg.log, "info");
        assert_eq!(cfg.log_format, "pretty");
        assert!(cfg.log_dir.is_none());
    }

    #[test]
    fn test_cli_beats_toml_beats_defaults() {
        let toml = TomlConfig {
            api_url: Some("http://toml:5000".to_string()),
            port: Some(6000),
            user: Some("toml@example.com".to_string()),
            log: None,
            log_format: Some("json".to_string()),
            log_dir: None,
        };
        let cfg = AppConfig::merge(
            Some("http://cli:5000".to_string()),
            None,
            None,
            None,
            None,
            None,
            toml,
        );
        assert_eq!(cfg.api_url, "http://cli:5000");
        assert_eq!(cfg.port, 6000);
        assert_eq!(cfg.user.as_deref(), Some("toml@example.com"));
        assert_eq!(cfg.log, "info");
        assert_eq!(cfg.log_format, "json");
    }

    #[test]
    fn test_toml_file_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("careboard.toml");
        std::fs::write(
            &path,
            "api_url = \"http://box:5000\"\nport = 7000\nlog = \"debug\"\n",
        )
        .unwrap();

        let toml = load_toml(&path).unwrap();
        assert_eq!(toml.api_url.as_deref(), Some("http://box:5000"));
        assert_eq!(toml.port, Some(7000));
        assert_eq!(toml.log.as_deref(), Some("debug"));
    }

    #[test]
    fn test_malformed_toml_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("careboard.toml");
        std::fs::write(&path, "port = \"not a number").unwrap();
        assert!(load_toml(&path).is_none());
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        assert!(load_toml(Path::new("/nonexistent/careboard.toml")).is_none());
    }
}

// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{Layer, Registry};

use pigeon_config::ConfigManager;
use pigeon_config::configuration::Configuration;

pub const KEY_LOG_LEVEL: &str = "pigeon.log.level";
pub const KEY_LOG_DIR: &str = "pigeon.log.dir";
pub const KEY_LOG_FILE_ENABLE: &str = "pigeon.log.file.enable";

#[derive(Error, Debug)]
pub enum TracingError {
    #[error("invalid log level: {0}")]
    InvalidLevel(String),
    #[error("log directory error: {0}")]
    LogDir(#[from] std::io::Error),
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TracingConfiguration {
    #[serde(default = "default_log_level")]
    log_level: String,

    #[serde(default = "default_display_thread_names")]
    display_thread_names: bool,

    #[serde(default = "default_display_thread_ids")]
    display_thread_ids: bool,

    #[serde(default = "default_filter")]
    filter: String,

    #[serde(default)]
    file_enabled: bool,

    #[serde(default = "default_log_dir")]
    log_dir: String,
}

// default implementation for TracingConfiguration
impl Default for TracingConfiguration {
    fn default() -> Self {
        TracingConfiguration {
            log_level: default_log_level(),
            display_thread_names: default_display_thread_names(),
            display_thread_ids: default_display_thread_ids(),
            filter: default_filter(),
            file_enabled: false,
            log_dir: default_log_dir(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_display_thread_names() -> bool {
    true
}

fn default_display_thread_ids() -> bool {
    false
}

fn default_filter() -> String {
    String::new()
}

fn default_log_dir() -> String {
    "/data/applogs/pigeon".to_string()
}

fn parse_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

// function to convert string tracing level to tracing::Level
fn resolve_level(level: &str) -> Level {
    parse_level(level).unwrap_or(Level::INFO)
}

/// Keeps the background file writer alive. Dropping it flushes pending lines.
pub struct TracingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

impl TracingConfiguration {
    /// Build the configuration from the process configuration store.
    pub fn from_config(config: &ConfigManager) -> Self {
        let defaults = TracingConfiguration::default();
        TracingConfiguration {
            log_level: config.get_string_value_or(KEY_LOG_LEVEL, &defaults.log_level),
            file_enabled: config.get_bool_value(KEY_LOG_FILE_ENABLE, defaults.file_enabled),
            log_dir: config.get_string_value_or(KEY_LOG_DIR, &defaults.log_dir),
            ..defaults
        }
    }

    pub fn with_log_level(self, log_level: String) -> Self {
        TracingConfiguration { log_level, ..self }
    }

    pub fn with_display_thread_names(self, display_thread_names: bool) -> Self {
        TracingConfiguration {
            display_thread_names,
            ..self
        }
    }

    pub fn with_display_thread_ids(self, display_thread_ids: bool) -> Self {
        TracingConfiguration {
            display_thread_ids,
            ..self
        }
    }

    pub fn with_filter(self, filter: String) -> Self {
        TracingConfiguration { filter, ..self }
    }

    pub fn with_log_file(self, log_dir: String) -> Self {
        TracingConfiguration {
            file_enabled: true,
            log_dir,
            ..self
        }
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn display_thread_names(&self) -> bool {
        self.display_thread_names
    }

    pub fn display_thread_ids(&self) -> bool {
        self.display_thread_ids
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn file_enabled(&self) -> bool {
        self.file_enabled
    }

    pub fn log_dir(&self) -> &str {
        &self.log_dir
    }

    /// File name of the rolling log for `app`.
    pub fn log_file_prefix(app: &str) -> String {
        format!("pigeon.{}.log", app)
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::builder()
            .with_default_directive(resolve_level(&self.log_level).into())
            .parse_lossy(&self.filter)
    }

    /// Set up a subscriber that logs to stdout and, when enabled, to a daily
    /// rolling file `pigeon.<app>.log` under `log_dir`.
    pub fn setup_tracing_subscriber(&self, app: &str) -> Result<TracingGuard, TracingError> {
        self.validate()?;

        let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_thread_names(self.display_thread_names)
                .with_thread_ids(self.display_thread_ids)
                .boxed(),
        );

        let mut file_guard = None;
        if self.file_enabled {
            let dir = PathBuf::from(&self.log_dir);
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::daily(&dir, Self::log_file_prefix(app));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_thread_names(self.display_thread_names)
                    .with_thread_ids(self.display_thread_ids)
                    .boxed(),
            );
            file_guard = Some(guard);
        }

        tracing_subscriber::registry()
            .with(layers)
            .with(self.env_filter())
            .try_init()
            .map_err(|e| TracingError::AlreadyInstalled(e.to_string()))?;

        Ok(TracingGuard {
            _file_guard: file_guard,
        })
    }
}

impl Configuration for TracingConfiguration {
    type Error = TracingError;

    fn validate(&self) -> Result<(), Self::Error> {
        match parse_level(&self.log_level) {
            Some(_) => Ok(()),
            None => Err(TracingError::InvalidLevel(self.log_level.clone())),
        }
    }
}

// tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tracing_configuration() {
        let config = TracingConfiguration::default();
        assert_eq!(config.log_level, default_log_level());
        assert_eq!(config.display_thread_names, default_display_thread_names());
        assert_eq!(config.display_thread_ids, default_display_thread_ids());
        assert_eq!(config.filter, default_filter());
        assert!(!config.file_enabled);
        assert_eq!(config.log_dir, "/data/applogs/pigeon");
    }

    #[test]
    fn test_resolve_level() {
        assert_eq!(resolve_level("trace"), Level::TRACE);
        assert_eq!(resolve_level("debug"), Level::DEBUG);
        assert_eq!(resolve_level("info"), Level::INFO);
        assert_eq!(resolve_level("warn"), Level::WARN);
        assert_eq!(resolve_level("error"), Level::ERROR);
        assert_eq!(resolve_level("invalid"), Level::INFO);
    }

    #[test]
    fn test_validate() {
        assert!(TracingConfiguration::default().validate().is_ok());
        let bad = TracingConfiguration::default().with_log_level("loud".to_string());
        assert!(matches!(bad.validate(), Err(TracingError::InvalidLevel(_))));
    }

    #[test]
    fn test_from_config() {
        let config = ConfigManager::new("demo", "127.0.0.1").with_values([
            (KEY_LOG_LEVEL, "debug"),
            (KEY_LOG_DIR, "/tmp/pigeon-logs"),
            (KEY_LOG_FILE_ENABLE, "true"),
        ]);
        let tracing = TracingConfiguration::from_config(&config);
        assert_eq!(tracing.log_level(), "debug");
        assert_eq!(tracing.log_dir(), "/tmp/pigeon-logs");
        assert!(tracing.file_enabled());
        assert!(tracing.display_thread_names());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let tracing: TracingConfiguration =
            serde_yaml::from_str("log_level: warn\nfilter: \"pigeon_registry=debug\"\n").unwrap();
        assert_eq!(tracing.log_level(), "warn");
        assert_eq!(tracing.filter(), "pigeon_registry=debug");
        assert_eq!(tracing.log_dir(), "/data/applogs/pigeon");
    }

    #[test]
    fn test_log_file_prefix() {
        assert_eq!(
            TracingConfiguration::log_file_prefix("shop-web"),
            "pigeon.shop-web.log"
        );
    }
}

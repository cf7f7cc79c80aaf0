//! Layered settings.
//!
//! 1. Compiled defaults ([`ParleySettings::default()`])
//! 2. A JSON file (`--config` or `~/.parley/settings.json`), deep-merged over
//!    the defaults
//! 3. `PARLEY_*` environment overrides (highest priority)
//!
//! Invalid environment values are ignored and the file/default value kept.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parley_server::ServerConfig;
use parley_telemetry::{LogFormat, TelemetryConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Level;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SettingsError>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParleySettings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub auth_header: String,
    pub login_url: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        let defaults = ServerConfig::default();
        Self {
            host: defaults.host,
            port: defaults.port,
            auth_header: defaults.auth_header,
            login_url: defaults.login_url,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: PathBuf,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: parley_dir().join("parley.db"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
    /// Per-module levels, e.g. `{"parley_store": "debug"}`.
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            modules: BTreeMap::new(),
        }
    }
}

impl ParleySettings {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.server.host.clone(),
            port: self.server.port,
            auth_header: self.server.auth_header.clone(),
            login_url: self.server.login_url.clone(),
        }
    }

    /// Unparseable levels fall back to INFO (global) or are dropped (modules).
    pub fn telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig {
            log_level: self.logging.level.parse().unwrap_or(Level::INFO),
            module_levels: self
                .logging
                .modules
                .iter()
                .filter_map(|(module, level)| Some((module.clone(), level.parse().ok()?)))
                .collect(),
            format: self.logging.format,
        }
    }
}

/// `~/.parley`, or `/tmp/.parley` without a home directory.
pub fn parley_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
        .join(".parley")
}

pub fn settings_path() -> PathBuf {
    parley_dir().join("settings.json")
}

/// Load settings from `path` (or the default location) with process env
/// overrides.
pub fn load_settings(path: Option<&Path>) -> Result<ParleySettings> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(settings_path);
    load_settings_from_path(&path, |key| std::env::var(key).ok())
}

/// Load settings from a specific path, reading overrides through `env`.
///
/// A missing file yields the defaults; invalid JSON is an error.
pub fn load_settings_from_path(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ParleySettings> {
    let defaults = serde_json::to_value(ParleySettings::default())?;

    let merged = if path.exists() {
        tracing::debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        tracing::debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: ParleySettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings, env);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// Objects merge per key, anything else is replaced by `source`, and nulls in
/// `source` are skipped.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = match target_map.remove(&key) {
                    Some(target_val) => deep_merge(target_val, source_val),
                    None => source_val,
                };
                target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

pub fn apply_env_overrides(settings: &mut ParleySettings, env: impl Fn(&str) -> Option<String>) {
    let read = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(v) = read("PARLEY_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read("PARLEY_PORT").and_then(|v| v.parse::<u16>().ok()) {
        settings.server.port = v;
    }
    if let Some(v) = read("PARLEY_AUTH_HEADER") {
        settings.server.auth_header = v;
    }
    if let Some(v) = read("PARLEY_LOGIN_URL") {
        settings.server.login_url = v;
    }
    if let Some(v) = read("PARLEY_DB") {
        settings.database.path = PathBuf::from(v);
    }
    if let Some(v) = read("PARLEY_LOG_LEVEL").filter(|v| v.parse::<Level>().is_ok()) {
        settings.logging.level = v;
    }
    if let Some(v) = read("PARLEY_LOG_FORMAT").and_then(|v| v.parse::<LogFormat>().ok()) {
        settings.logging.format = v;
    }
}

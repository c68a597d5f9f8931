//! TOML-based configuration for the slicer.
//!
//! Supports a config file (slicer.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [slicer]
//! dialect = "postgres"
//! debug = false
//! default_limit = 1000
//!
//! [connections.default]
//! driver = "sqlite"
//! path = "${DATA_DIR}/traffic.sqlite"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::connection::Driver;
use crate::sql::Dialect;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("no settings file at {0}")]
    FileNotFound(PathBuf),

    #[error("cannot read settings: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("malformed settings: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("environment variable {0} is not set")]
    MissingEnvVar(String),

    #[error("no connection named '{0}'")]
    ConnectionNotFound(String),

    #[error("driver '{0}' is not supported")]
    UnsupportedDriver(String),

    #[error("'{0}' is not a known dialect")]
    UnknownDialect(String),

    #[error("cannot open connection: {0}")]
    OpenFailed(String),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

static ENV_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(?:\{([^}]*)\}|([A-Za-z0-9_]+))").unwrap());

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Compilation defaults.
    pub slicer: SlicerSettings,

    /// Named database connections, in file order.
    pub connections: IndexMap<String, ConnectionSettings>,
}

/// Compilation defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SlicerSettings {
    /// Dialect name used when none is given on the command line.
    pub dialect: Option<String>,

    /// Log compiled SQL at `info` level.
    pub debug: bool,

    /// Limit applied to requests without an explicit one.
    pub default_limit: Option<u64>,
}

impl SlicerSettings {
    /// The configured dialect, or the default one.
    pub fn dialect(&self) -> SettingsResult<Dialect> {
        match &self.dialect {
            None => Ok(Dialect::default()),
            Some(name) => {
                Dialect::from_name(name).ok_or_else(|| SettingsError::UnknownDialect(name.clone()))
            }
        }
    }
}

/// Connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionSettings {
    /// Database driver (sqlite).
    pub driver: String,

    /// Database path (supports ${ENV_VAR} expansion).
    pub path: String,
}

impl ConnectionSettings {
    /// Get the driver type.
    pub fn driver_type(&self) -> SettingsResult<Driver> {
        self.driver.parse()
    }

    /// Get the path with environment variables expanded.
    pub fn resolved_path(&self) -> SettingsResult<String> {
        expand_env_vars(&self.path)
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SettingsResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SLICER_CONFIG`
    /// 2. `./slicer.toml`
    /// 3. `~/.config/slicer/config.toml`
    pub fn load() -> SettingsResult<Self> {
        if let Ok(path) = env::var("SLICER_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("slicer.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("slicer").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Get a connection by name.
    pub fn get_connection(&self, name: &str) -> SettingsResult<&ConnectionSettings> {
        self.connections
            .get(name)
            .ok_or_else(|| SettingsError::ConnectionNotFound(name.to_string()))
    }

    /// The connection named "default", else the first one declared.
    pub fn default_connection(&self) -> Option<(&str, &ConnectionSettings)> {
        if let Some(conn) = self.connections.get("default") {
            return Some(("default", conn));
        }
        self.connections.iter().next().map(|(k, v)| (k.as_str(), v))
    }
}

/// Substitute `${VAR}` and `$VAR` references. A `$` not followed by a
/// name is kept as-is.
pub fn expand_env_vars(s: &str) -> SettingsResult<String> {
    let mut expanded = String::with_capacity(s.len());
    let mut last = 0;
    for caps in ENV_REFERENCE.captures_iter(s) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1).or_else(|| caps.get(2))) else {
            continue;
        };
        let value = env::var(name.as_str())
            .map_err(|_| SettingsError::MissingEnvVar(name.as_str().to_string()))?;
        expanded.push_str(&s[last..whole.start()]);
        expanded.push_str(&value);
        last = whole.end();
    }
    expanded.push_str(&s[last..]);
    Ok(expanded)
}

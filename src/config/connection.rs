//! Opening execution backends from configuration.

use std::fmt;
use std::str::FromStr;

use super::settings::{ConnectionSettings, SettingsError};
use crate::database::{Database, SqliteDatabase};

/// Supported execution backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    /// SQLite file, or `:memory:`.
    Sqlite,
}

impl FromStr for Driver {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            other => Err(SettingsError::UnsupportedDriver(other.to_string())),
        }
    }
}

impl Driver {
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Open the database a connection entry points at.
pub fn open(settings: &ConnectionSettings) -> Result<Box<dyn Database>, SettingsError> {
    let path = settings.resolved_path()?;
    let database = match settings.driver_type()? {
        Driver::Sqlite if path == ":memory:" => SqliteDatabase::open_in_memory(),
        Driver::Sqlite => SqliteDatabase::open(&path),
    }
    .map_err(|e| SettingsError::OpenFailed(format!("'{path}': {e}")))?;
    Ok(Box::new(database))
}

//! Configuration module for the slicer.
//!
//! Handles settings files, environment variables, and opening connections.

mod connection;
mod settings;

pub use connection::{open, Driver};
pub use settings::{
    expand_env_vars, ConnectionSettings, Settings, SettingsError, SettingsResult, SlicerSettings,
};

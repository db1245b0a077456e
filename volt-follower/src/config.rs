//! Configuration loading for the voltage follower

use crate::error::{FollowerError, Result};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Clone, Debug, Deserialize)]
pub struct FollowerConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub control: ControlConfig,
}

/// Network connection settings
#[derive(Clone, Debug, Deserialize)]
pub struct ConnectionConfig {
    /// Chassis SCPI address (default: 192.168.10.78:5025)
    #[serde(default = "default_address")]
    pub address: String,

    /// Connect timeout in milliseconds (default: 5000)
    #[serde(default = "default_connect_timeout")]
    pub timeout_ms: u64,

    /// Reply timeout for ordinary exchanges in milliseconds (default: 2500)
    #[serde(default = "default_io_timeout")]
    pub io_timeout_ms: u64,
}

/// Control loop parameters
#[derive(Clone, Debug, Deserialize)]
pub struct ControlConfig {
    /// Loop period in milliseconds (default: 500)
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,

    /// Minimum action-poll timeout in milliseconds (default: 10)
    #[serde(default = "default_min_poll_ms")]
    pub min_poll_ms: u64,

    /// Physical output range ceiling in volts (default: 40.0 for DCP405)
    #[serde(default = "default_full_scale")]
    pub full_scale: f64,

    /// Initial output current limit in amperes (default: 0.1)
    #[serde(default = "default_current_limit")]
    pub current_limit: f64,

    /// Lower bound for the configurable current limit (default: 0.05)
    #[serde(default = "default_limit_min")]
    pub limit_min: f64,

    /// Upper bound for the configurable current limit (default: 5.0)
    #[serde(default = "default_limit_max")]
    pub limit_max: f64,

    /// Emit a status line every N loop iterations (default: 10)
    #[serde(default = "default_status_every")]
    pub status_every: u64,

    /// Slot holding the measurement (input) module (default: 1)
    #[serde(default = "default_source_channel")]
    pub source_channel: u8,

    /// Slot holding the output module (default: 2)
    #[serde(default = "default_output_channel")]
    pub output_channel: u8,

    /// Dialog resource path on the chassis
    #[serde(default = "default_dialog_resource")]
    pub dialog_resource: String,

    /// Module model both channels must report
    #[serde(default = "default_required_model")]
    pub required_model: String,
}

// Default value functions
fn default_address() -> String {
    "192.168.10.78:5025".to_string()
}
fn default_connect_timeout() -> u64 {
    5000
}
fn default_io_timeout() -> u64 {
    2500
}
fn default_period_ms() -> u64 {
    500
}
fn default_min_poll_ms() -> u64 {
    10
}
fn default_full_scale() -> f64 {
    40.0
}
fn default_current_limit() -> f64 {
    0.1
}
fn default_limit_min() -> f64 {
    0.05
}
fn default_limit_max() -> f64 {
    5.0
}
fn default_status_every() -> u64 {
    10
}
fn default_source_channel() -> u8 {
    1
}
fn default_output_channel() -> u8 {
    2
}
fn default_dialog_resource() -> String {
    "/Scripts/voltage_follower.res".to_string()
}
fn default_required_model() -> String {
    "DCP405".to_string()
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            timeout_ms: default_connect_timeout(),
            io_timeout_ms: default_io_timeout(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
            min_poll_ms: default_min_poll_ms(),
            full_scale: default_full_scale(),
            current_limit: default_current_limit(),
            limit_min: default_limit_min(),
            limit_max: default_limit_max(),
            status_every: default_status_every(),
            source_channel: default_source_channel(),
            output_channel: default_output_channel(),
            dialog_resource: default_dialog_resource(),
            required_model: default_required_model(),
        }
    }
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            control: ControlConfig::default(),
        }
    }
}

impl FollowerConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FollowerError::Config(format!("Failed to read config file: {e}")))?;
        let config: FollowerConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

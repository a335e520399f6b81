//! Configuration for the call bridge
//!
//! Supports loading configuration from:
//! - YAML/TOML files under config/
//! - Environment variables (FRONTDESK_ prefix, "__" separator)

pub mod settings;

pub use settings::{
    load_settings, BridgeConfig, ModelBackendSettings, ObservabilityConfig, ServerConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for frontdesk_core::Error {
    fn from(err: ConfigError) -> Self {
        frontdesk_core::Error::Config(err.to_string())
    }
}

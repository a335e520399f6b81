//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Realtime model backend configuration
    #[serde(default)]
    pub model: ModelBackendSettings,

    /// Call bridge configuration
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.model.url.starts_with("ws://") && !self.model.url.starts_with("wss://") {
            return Err(ConfigError::InvalidValue {
                field: "model.url".to_string(),
                message: format!("expected a ws:// or wss:// endpoint, got '{}'", self.model.url),
            });
        }

        if self.model.api_key.is_empty() {
            tracing::warn!("model.api_key is empty; backend connections will be refused");
        }

        if self.bridge.idle_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "bridge.idle_timeout_seconds".to_string(),
                message: "idle timeout must be at least 1 second".to_string(),
            });
        }

        if self.bridge.channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "bridge.channel_capacity".to_string(),
                message: "channel capacity must be positive".to_string(),
            });
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Telephony media-stream WebSocket path
    #[serde(default = "default_ws_path")]
    pub ws_path: String,

    /// Maximum concurrent calls
    #[serde(default = "default_max_calls")]
    pub max_calls: usize,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_ws_path() -> String {
    "/media-stream".to_string()
}
fn default_max_calls() -> usize {
    100
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            ws_path: default_ws_path(),
            max_calls: default_max_calls(),
            cors_enabled: default_true(),
            cors_origins: Vec::new(),
        }
    }
}

/// Realtime model backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBackendSettings {
    /// wss:// endpoint including the model query parameter
    #[serde(default = "default_model_url")]
    pub url: String,

    /// API key (set via FRONTDESK__MODEL__API_KEY)
    #[serde(default)]
    pub api_key: String,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

fn default_model_url() -> String {
    "wss://api.openai.com/v1/realtime?model=gpt-4o-realtime-preview".to_string()
}
fn default_connect_timeout() -> u64 {
    10
}

impl Default for ModelBackendSettings {
    fn default() -> Self {
        Self {
            url: default_model_url(),
            api_key: String::new(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

/// Call bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Seconds without relay traffic before the session is torn down
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,

    /// Capacity of the in-process relay channels
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_idle_timeout() -> u64 {
    300
}
fn default_channel_capacity() -> usize {
    64
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            idle_timeout_seconds: default_idle_timeout(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (FRONTDESK_ prefix)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("FRONTDESK")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

//! Configuration for the TV remote gateway.

use std::env;
use std::path::Path;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config as ConfigLoader, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

/// Main configuration structure for the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub device: DeviceConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// The TV this gateway controls.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// IP address or hostname of the TV.
    pub host: String,
    #[serde(default = "default_device_port")]
    pub port: u16,
    /// Pre-shared token from an earlier pairing. Never sent on the first attempt.
    #[serde(default)]
    pub token: Option<String>,
    /// Name shown in the TV's "allow this device" prompt.
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,
}

impl DeviceConfig {
    /// `host:port` of the TV.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    /// The pre-shared token, if a non-empty one is configured.
    pub fn seeded_token(&self) -> Option<String> {
        self.token.clone().filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_device_port() -> u16 {
    8002
}
fn default_app_name() -> String {
    "tv-remote-gateway".to_string()
}
fn default_reconnect_delay() -> u64 {
    10
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Legacy environment variables (`TV_IP`, `TV_PORT`, `TV_TOKEN`, `PORT`)
    /// 2. Environment variables (TVREMOTE__SECTION__KEY format)
    /// 3. config.toml file (if present)
    /// 4. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(File::with_name("config").required(false), |key| env::var(key).ok())
    }

    /// Load configuration from an explicit file, with the same environment overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::build(File::from(path), |key| env::var(key).ok())
    }

    fn build<S, F>(file: S, legacy_var: F) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
        F: Fn(&str) -> Option<String>,
    {
        let builder = ConfigLoader::builder()
            .set_default("api.host", default_host())?
            .set_default("api.port", default_port() as i64)?
            .set_default("device.port", default_device_port() as i64)?
            .set_default("device.app_name", default_app_name())?
            .set_default("device.reconnect_delay_secs", default_reconnect_delay() as i64)?
            .add_source(file)
            .add_source(
                Environment::with_prefix("TVREMOTE")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::legacy_overrides(builder, legacy_var)?.build()?.try_deserialize()
    }

    /// Flat variables accepted by earlier deployments.
    fn legacy_overrides<F>(
        builder: ConfigBuilder<DefaultState>,
        legacy_var: F,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        builder
            .set_override_option("device.host", legacy_var("TV_IP"))?
            .set_override_option("device.port", legacy_var("TV_PORT"))?
            .set_override_option("device.token", legacy_var("TV_TOKEN"))?
            .set_override_option("api.port", legacy_var("PORT"))
    }
}

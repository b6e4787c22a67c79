//! Configuration management for the AQI dashboard
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::AqiError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the AQI dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AqiConfig {
    /// Weather API configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Model manifest configuration
    #[serde(default)]
    pub models: ModelsConfig,
    /// Prediction policy settings
    #[serde(default)]
    pub prediction: PredictionConfig,
    /// HTTP dashboard service settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL for the Open-Meteo API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// IANA time zone the daily values are aligned to
    #[serde(default = "default_weather_timezone")]
    pub timezone: String,
    /// Request timeout in seconds; unset keeps the HTTP client's default
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    /// Number of forecast days to request; unset keeps the API default
    #[serde(default)]
    pub forecast_days: Option<u8>,
}

/// Model manifest settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// CSV manifest with `City` and `Model_File` columns
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,
    /// Keep loaded models in memory between predictions
    #[serde(default = "default_cache_models")]
    pub cache_models: bool,
}

/// Prediction policy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Previous-day AQI assumed when the lag input is not enabled.
    ///
    /// This is a policy value, not something derived from data.
    #[serde(default = "default_aqi_lag")]
    pub default_aqi_lag: f64,
}

/// HTTP service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Maximum accepted request body in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Idle time in seconds before a session is dropped
    #[serde(default = "default_session_ttl_seconds")]
    pub session_ttl_seconds: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_weather_timezone() -> String {
    "Asia/Kolkata".to_string()
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("random_forest_model_scores.csv")
}

fn default_cache_models() -> bool {
    true
}

fn default_aqi_lag() -> f64 {
    crate::features::DEFAULT_AQI_LAG
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

fn default_session_ttl_seconds() -> u64 {
    crate::session::DEFAULT_SESSION_TTL.as_secs()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            timezone: default_weather_timezone(),
            timeout_seconds: None,
            forecast_days: None,
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            manifest_path: default_manifest_path(),
            cache_models: default_cache_models(),
        }
    }
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            default_aqi_lag: default_aqi_lag(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            max_body_bytes: default_max_body_bytes(),
            session_ttl_seconds: default_session_ttl_seconds(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AqiConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. AQI_WEATHER__BASE_URL
        builder = builder.add_source(
            Environment::with_prefix("AQI")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AqiConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("aqi-dashboard").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timezone.is_empty() {
            self.weather.timezone = default_weather_timezone();
        }
        if self.models.manifest_path.as_os_str().is_empty() {
            self.models.manifest_path = default_manifest_path();
        }
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.server.max_body_bytes == 0 {
            self.server.max_body_bytes = default_max_body_bytes();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if let Some(timeout) = self.weather.timeout_seconds {
            if timeout == 0 || timeout > 300 {
                return Err(
                    AqiError::config("Weather API timeout must be between 1 and 300 seconds").into(),
                );
            }
        }

        if let Some(days) = self.weather.forecast_days {
            if !(1..=16).contains(&days) {
                return Err(AqiError::config("Forecast days must be between 1 and 16").into());
            }
        }

        if self.server.port == 0 {
            return Err(AqiError::config("Server port cannot be 0").into());
        }

        if self.server.session_ttl_seconds == 0 {
            return Err(AqiError::config("Session TTL must be at least 1 second").into());
        }

        if !self.prediction.default_aqi_lag.is_finite() || self.prediction.default_aqi_lag < 0.0 {
            return Err(AqiError::config("Default AQI lag must be a non-negative number").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(AqiError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(AqiError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.weather.base_url.starts_with("http://") && !self.weather.base_url.starts_with("https://") {
            return Err(AqiError::config("Weather API base URL must be a valid HTTP or HTTPS URL").into());
        }

        if self.weather.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(AqiError::config(format!(
                "Unknown time zone '{}'",
                self.weather.timezone
            ))
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AqiConfig::default();
        assert_eq!(config.weather.base_url, "https://api.open-meteo.com/v1");
        assert_eq!(config.weather.timezone, "Asia/Kolkata");
        assert!(config.weather.timeout_seconds.is_none());
        assert_eq!(config.models.manifest_path, PathBuf::from("random_forest_model_scores.csv"));
        assert_eq!(config.prediction.default_aqi_lag, 90.0);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.session_ttl_seconds, 1800);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = AqiConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_zero_session_ttl() {
        let mut config = AqiConfig::default();
        config.server.session_ttl_seconds = 0;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Session TTL"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = AqiConfig::default();
        config.weather.timeout_seconds = Some(500);
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout must be between"));
    }

    #[test]
    fn test_config_validation_timezone() {
        let mut config = AqiConfig::default();
        config.weather.timezone = "Mars/Olympus_Mons".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Unknown time zone"));
    }

    #[test]
    fn test_config_validation_base_url() {
        let mut config = AqiConfig::default();
        config.weather.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_defaults_fills_empty_values() {
        let mut config = AqiConfig::default();
        config.weather.base_url.clear();
        config.logging.format.clear();
        config.apply_defaults();
        assert_eq!(config.weather.base_url, "https://api.open-meteo.com/v1");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[weather]\ntimeout_seconds = 10\n\n[prediction]\ndefault_aqi_lag = 120.0\n\n[server]\nport = 9090"
        )
        .unwrap();

        let config = AqiConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.weather.timeout_seconds, Some(10));
        assert_eq!(config.prediction.default_aqi_lag, 120.0);
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.weather.timezone, "Asia/Kolkata");
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = AqiConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("aqi-dashboard"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}

//! Error types and handling for the AQI dashboard

use thiserror::Error;

/// Main error type for the AQI dashboard
#[derive(Error, Debug)]
pub enum AqiError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// No usable model for a city: manifest entry missing or artifact absent
    #[error("Model not found for {city}: {}", .path.as_deref().unwrap_or("<no manifest entry>"))]
    ModelUnavailable { city: String, path: Option<String> },

    /// Weather API communication or decoding errors
    #[error("Weather fetch failed: {message}")]
    WeatherFetch { message: String },

    /// Model load or inference errors
    #[error("Prediction failed: {message}")]
    Inference { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl AqiError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new model unavailable error
    pub fn model_unavailable<S: Into<String>>(city: S, path: Option<String>) -> Self {
        Self::ModelUnavailable {
            city: city.into(),
            path,
        }
    }

    /// Create a new weather fetch error
    pub fn weather<S: Into<String>>(message: S) -> Self {
        Self::WeatherFetch {
            message: message.into(),
        }
    }

    /// Create a new inference error
    pub fn inference<S: Into<String>>(message: S) -> Self {
        Self::Inference {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AqiError::Config { .. } => {
                "Configuration error. Please check your config file and model manifest.".to_string()
            }
            AqiError::Validation { message } => format!("Invalid input: {message}"),
            AqiError::ModelUnavailable { .. } => format!("❌ {self}"),
            AqiError::WeatherFetch { message } => format!("❌ Failed to fetch weather: {message}"),
            AqiError::Inference { message } => format!("⚠️ Prediction failed: {message}"),
            AqiError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for AqiError {
    fn from(err: reqwest::Error) -> Self {
        AqiError::weather(err.to_string())
    }
}

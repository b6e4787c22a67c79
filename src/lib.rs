//! AQI Dashboard - city air quality prediction from daily weather
//!
//! This library provides the core functionality for fetching Open-Meteo
//! weather, assembling model feature rows, running per-city regression models
//! and comparing predicted AQI across cities.

pub mod api;
pub mod category;
pub mod compare;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod features;
pub mod inference;
pub mod models;
pub mod session;
pub mod telemetry;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use category::AqiCategory;
pub use compare::{ComparisonOutcome, ComparisonRow};
pub use config::AqiConfig;
pub use dashboard::{CityStatus, Dashboard};
pub use error::AqiError;
pub use features::{FeatureAssembler, FeatureInputs, FeatureRow, FeatureSchema};
pub use inference::{ModelCatalog, Prediction, Predictor};
pub use models::{City, CityRegistry, WeatherForecast, WeatherSample};
pub use session::{PredictForm, Session, SessionStore};
pub use weather::{OpenMeteoClient, WeatherProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, AqiError>;

//! Data models for the AQI dashboard
//!
//! This module contains the core domain models organized by concern:
//! - City: Registry of supported cities and their coordinates
//! - Weather: Daily weather samples and multi-day forecasts

pub mod city;
pub mod weather;

// Re-export all public types for convenient access
pub use city::{City, CityRegistry};
pub use weather::{DailyWeather, WeatherForecast, WeatherSample};

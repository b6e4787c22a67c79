//! Weather retrieval for the predictor and forecast views

use async_trait::async_trait;

use crate::models::{City, WeatherForecast, WeatherSample};
use crate::{AqiError, Result};

pub mod open_meteo;

pub use open_meteo::OpenMeteoClient;

/// Source of daily weather for a city
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Daily forecast for the city, first entry is today
    async fn daily_forecast(&self, city: &City) -> Result<WeatherForecast>;

    /// Today's values only
    async fn today(&self, city: &City) -> Result<WeatherSample> {
        let forecast = self.daily_forecast(city).await?;
        forecast
            .first_day()
            .map(|day| day.sample)
            .ok_or_else(|| AqiError::weather(format!("No daily weather returned for {}", city.name)))
    }
}

//! Open-Meteo daily forecast client
//!
//! Issues a single GET per call; there is no retry, caching or rate limiting.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::WeatherProvider;
use crate::config::WeatherConfig;
use crate::models::{City, DailyWeather, WeatherForecast, WeatherSample};
use crate::{AqiError, Result};

/// Daily variables requested from the API
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum,windspeed_10m_max";

/// Open-Meteo HTTP client
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    config: WeatherConfig,
}

impl OpenMeteoClient {
    /// Create a new client. Without a configured timeout the reqwest default applies.
    pub fn new(config: WeatherConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!("aqi-dashboard/", env!("CARGO_PKG_VERSION")));
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let client = builder
            .build()
            .map_err(|e| AqiError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn forecast_url(&self, city: &City) -> String {
        let mut url = format!(
            "{}/forecast?latitude={}&longitude={}&daily={}&timezone={}",
            self.config.base_url.trim_end_matches('/'),
            city.latitude,
            city.longitude,
            DAILY_FIELDS,
            urlencoding::encode(&self.config.timezone)
        );
        if let Some(days) = self.config.forecast_days {
            url.push_str(&format!("&forecast_days={days}"));
        }
        url
    }

    async fn fetch(&self, city: &City) -> Result<ForecastResponse> {
        let url = self.forecast_url(city);
        debug!(url = %url, "Fetching daily forecast");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let reason = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|e| e.reason)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            warn!(%status, "Open-Meteo request failed: {}", reason);
            return Err(AqiError::weather(reason));
        }

        serde_json::from_str(&body).map_err(|e| AqiError::weather(format!("Invalid response from Open-Meteo: {e}")))
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    #[instrument(skip(self, city), fields(city = %city.name))]
    async fn daily_forecast(&self, city: &City) -> Result<WeatherForecast> {
        let start_time = Instant::now();
        let forecast = self.fetch(city).await?.into_forecast(city, &self.config.timezone)?;

        info!(
            "Retrieved {} forecast days in {:.3}s",
            forecast.days.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(forecast)
    }

    // Only the first day is read; later days may be incomplete.
    #[instrument(skip(self, city), fields(city = %city.name))]
    async fn today(&self, city: &City) -> Result<WeatherSample> {
        let start_time = Instant::now();
        let sample = self.fetch(city).await?.into_today()?;

        info!("Retrieved today's weather in {:.3}s", start_time.elapsed().as_secs_f64());
        Ok(sample)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    reason: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: DailyData,
}

/// Index-aligned daily arrays; entries may be null
#[derive(Debug, Deserialize)]
struct DailyData {
    time: Vec<String>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    precipitation_sum: Vec<Option<f64>>,
    windspeed_10m_max: Vec<Option<f64>>,
}

impl ForecastResponse {
    fn into_today(self) -> Result<WeatherSample> {
        let daily = self.daily;
        let time = daily
            .time
            .first()
            .ok_or_else(|| AqiError::weather("Response contains no daily values"))?;
        let value = |name: &str, values: &[Option<f64>]| {
            values
                .first()
                .copied()
                .flatten()
                .ok_or_else(|| AqiError::weather(format!("Missing {name} for {time}")))
        };
        Ok(WeatherSample {
            temperature_max: value("temperature_2m_max", &daily.temperature_2m_max)?,
            temperature_min: value("temperature_2m_min", &daily.temperature_2m_min)?,
            precipitation_sum: value("precipitation_sum", &daily.precipitation_sum)?,
            wind_speed_max: value("windspeed_10m_max", &daily.windspeed_10m_max)?,
        })
    }

    fn into_forecast(self, city: &City, timezone: &str) -> Result<WeatherForecast> {
        let daily = self.daily;
        let n = daily.time.len();
        if n == 0 {
            return Err(AqiError::weather("Response contains no daily values"));
        }
        for (name, len) in [
            ("temperature_2m_max", daily.temperature_2m_max.len()),
            ("temperature_2m_min", daily.temperature_2m_min.len()),
            ("precipitation_sum", daily.precipitation_sum.len()),
            ("windspeed_10m_max", daily.windspeed_10m_max.len()),
        ] {
            if len != n {
                return Err(AqiError::weather(format!(
                    "Daily field {name} has {len} values for {n} days"
                )));
            }
        }

        let mut days = Vec::with_capacity(n);
        for (i, time) in daily.time.iter().enumerate() {
            let date = NaiveDate::parse_from_str(time, "%Y-%m-%d")
                .map_err(|e| AqiError::weather(format!("Invalid date '{time}': {e}")))?;
            let value = |name: &str, values: &[Option<f64>]| {
                values[i].ok_or_else(|| AqiError::weather(format!("Missing {name} for {time}")))
            };
            days.push(DailyWeather {
                date,
                sample: WeatherSample {
                    temperature_max: value("temperature_2m_max", &daily.temperature_2m_max)?,
                    temperature_min: value("temperature_2m_min", &daily.temperature_2m_min)?,
                    precipitation_sum: value("precipitation_sum", &daily.precipitation_sum)?,
                    wind_speed_max: value("windspeed_10m_max", &daily.windspeed_10m_max)?,
                },
            });
        }

        Ok(WeatherForecast {
            city: city.name.clone(),
            timezone: timezone.to_string(),
            days,
        })
    }
}

//! Daily weather sample and forecast models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The four daily weather values the AQI models consume
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct WeatherSample {
    /// Daily maximum temperature in Celsius
    pub temperature_max: f64,
    /// Daily minimum temperature in Celsius
    pub temperature_min: f64,
    /// Daily precipitation sum in mm
    pub precipitation_sum: f64,
    /// Daily maximum wind speed at 10 m in km/h
    pub wind_speed_max: f64,
}

impl WeatherSample {
    /// Format temperature range with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C / {:.1}°C", self.temperature_max, self.temperature_min)
    }
}

/// One dated row of a forecast
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailyWeather {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub sample: WeatherSample,
}

/// Multi-day forecast for a city
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherForecast {
    /// City this forecast was requested for
    pub city: String,
    /// Time zone the daily buckets are aligned to
    pub timezone: String,
    /// Days in ascending date order
    pub days: Vec<DailyWeather>,
}

impl WeatherForecast {
    /// First forecast day, used as "today's" weather
    #[must_use]
    pub fn first_day(&self) -> Option<&DailyWeather> {
        self.days.first()
    }

    /// Render the forecast as a fixed-width text table
    #[must_use]
    pub fn format_table(&self) -> String {
        let mut out = format!(
            "{:<12} {:>14} {:>14} {:>19} {:>18}\n",
            "Date", "Temp Max (°C)", "Temp Min (°C)", "Precipitation (mm)", "Wind Speed (km/h)"
        );
        for day in &self.days {
            out.push_str(&format!(
                "{:<12} {:>14.1} {:>14.1} {:>19.1} {:>18.1}\n",
                day.date.format("%Y-%m-%d"),
                day.sample.temperature_max,
                day.sample.temperature_min,
                day.sample.precipitation_sum,
                day.sample.wind_speed_max
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WeatherSample {
        WeatherSample {
            temperature_max: 34.0,
            temperature_min: 26.0,
            precipitation_sum: 0.0,
            wind_speed_max: 14.0,
        }
    }

    #[test]
    fn test_format_temperature() {
        assert_eq!(sample().format_temperature(), "34.0°C / 26.0°C");
    }

    #[test]
    fn test_forecast_table() {
        let forecast = WeatherForecast {
            city: "Delhi".into(),
            timezone: "Asia/Kolkata".into(),
            days: vec![
                DailyWeather {
                    date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                    sample: sample(),
                },
                DailyWeather {
                    date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
                    sample: WeatherSample {
                        precipitation_sum: 2.5,
                        ..sample()
                    },
                },
            ],
        };

        assert_eq!(forecast.first_day().unwrap().sample, sample());
        let table = forecast.format_table();
        assert_eq!(table.lines().count(), 3);
        assert!(table.lines().nth(1).unwrap().starts_with("2024-05-01"));
        assert!(table.contains("2.5"));
    }

    #[test]
    fn test_daily_weather_serializes_flat() {
        let day = DailyWeather {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            sample: sample(),
        };
        let json = serde_json::to_value(&day).unwrap();
        assert_eq!(json["date"], "2024-05-01");
        assert_eq!(json["temperature_max"], 34.0);
    }
}

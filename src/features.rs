//! Feature assembly for the per-city AQI models
//!
//! Every model was trained on a fixed, named column layout. Two layouts exist:
//! the standard four weather columns, and an extended layout that adds mean
//! relative humidity and the previous day's AQI. Rows are always re-selected
//! by column name in the schema order before they reach a model.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{City, WeatherSample};
use crate::{AqiError, Result};

pub const TEMPERATURE_MAX: &str = "temperature_2m_max";
pub const TEMPERATURE_MIN: &str = "temperature_2m_min";
pub const PRECIPITATION_SUM: &str = "precipitation_sum";
/// Wind column name used by the standard models
pub const WINDSPEED_MAX: &str = "windspeed_10m_max";
/// Wind column name used by the extended model
pub const WIND_SPEED_MAX: &str = "wind_speed_10m_max";
pub const HUMIDITY_MEAN: &str = "relative_humidity_2m_mean";
pub const AQI_LAG: &str = "AQI_lag1";

const STANDARD_COLUMNS: [&str; 4] = [TEMPERATURE_MAX, TEMPERATURE_MIN, PRECIPITATION_SUM, WINDSPEED_MAX];

const EXTENDED_COLUMNS: [&str; 6] = [
    TEMPERATURE_MAX,
    TEMPERATURE_MIN,
    WIND_SPEED_MAX,
    PRECIPITATION_SUM,
    HUMIDITY_MEAN,
    AQI_LAG,
];

/// Form defaults shown when no fetched weather is used
pub const DEFAULT_TEMPERATURE_MAX: f64 = 34.0;
pub const DEFAULT_TEMPERATURE_MIN: f64 = 26.0;
pub const DEFAULT_PRECIPITATION: f64 = 0.0;
pub const DEFAULT_WIND_SPEED: f64 = 14.0;
pub const DEFAULT_HUMIDITY: f64 = 70.0;
/// Previous-day AQI assumed when the lag input is switched off
pub const DEFAULT_AQI_LAG: f64 = 90.0;

/// Column layout a city's model expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSchema {
    /// Four weather columns
    Standard,
    /// Weather columns plus humidity and previous-day AQI
    Extended,
}

impl FeatureSchema {
    /// Column names in the exact order the model was trained on
    #[must_use]
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            FeatureSchema::Standard => &STANDARD_COLUMNS,
            FeatureSchema::Extended => &EXTENDED_COLUMNS,
        }
    }

    /// Whether the schema needs humidity and a lagged AQI value
    #[must_use]
    pub fn requires_extras(self) -> bool {
        matches!(self, FeatureSchema::Extended)
    }
}

impl fmt::Display for FeatureSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureSchema::Standard => write!(f, "standard"),
            FeatureSchema::Extended => write!(f, "extended"),
        }
    }
}

/// Raw predictor inputs as entered in the form
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureInputs {
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub precipitation_sum: f64,
    pub wind_speed_max: f64,
    /// Mean relative humidity in percent; required by the extended schema
    #[serde(default)]
    pub humidity: Option<f64>,
    /// Previous-day AQI; `None` falls back to the configured default
    #[serde(default)]
    pub aqi_lag: Option<f64>,
}

impl Default for FeatureInputs {
    fn default() -> Self {
        Self {
            temperature_max: DEFAULT_TEMPERATURE_MAX,
            temperature_min: DEFAULT_TEMPERATURE_MIN,
            precipitation_sum: DEFAULT_PRECIPITATION,
            wind_speed_max: DEFAULT_WIND_SPEED,
            humidity: Some(DEFAULT_HUMIDITY),
            aqi_lag: None,
        }
    }
}

impl FeatureInputs {
    /// Inputs pre-populated from a fetched weather sample
    #[must_use]
    pub fn from_sample(sample: &WeatherSample) -> Self {
        Self {
            temperature_max: sample.temperature_max,
            temperature_min: sample.temperature_min,
            precipitation_sum: sample.precipitation_sum,
            wind_speed_max: sample.wind_speed_max,
            ..Self::default()
        }
    }

    /// Fixed inputs used by comparison mode
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            aqi_lag: Some(DEFAULT_AQI_LAG),
            ..Self::default()
        }
    }
}

/// A single row of named feature values in a fixed column order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    columns: Vec<(String, f64)>,
}

impl FeatureRow {
    /// Build a row from name/value pairs. Column names must be unique.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut columns: Vec<(String, f64)> = Vec::new();
        for (name, value) in pairs {
            let name = name.into();
            if columns.iter().any(|(existing, _)| *existing == name) {
                return Err(AqiError::validation(format!("Duplicate feature column '{name}'")));
            }
            columns.push((name, value));
        }
        Ok(Self { columns })
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.columns.iter().map(|(_, value)| *value).collect()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| *value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Re-select columns by name in the given order.
    ///
    /// Every requested column must be present; columns not requested are dropped.
    pub fn select(&self, names: &[&str]) -> Result<FeatureRow> {
        let columns = names
            .iter()
            .map(|name| {
                self.get(name)
                    .map(|value| ((*name).to_string(), value))
                    .ok_or_else(|| AqiError::inference(format!("Missing feature column '{name}'")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(FeatureRow { columns })
    }
}

/// Turns form inputs into the feature row a city's model expects
#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    default_aqi_lag: f64,
}

impl Default for FeatureAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_AQI_LAG)
    }
}

impl FeatureAssembler {
    #[must_use]
    pub fn new(default_aqi_lag: f64) -> Self {
        Self { default_aqi_lag }
    }

    #[must_use]
    pub fn default_aqi_lag(&self) -> f64 {
        self.default_aqi_lag
    }

    /// Build the feature row for `city` from the given inputs
    pub fn assemble(&self, city: &City, inputs: &FeatureInputs) -> Result<FeatureRow> {
        let row = match city.schema {
            FeatureSchema::Standard => FeatureRow::from_pairs([
                (TEMPERATURE_MAX, inputs.temperature_max),
                (TEMPERATURE_MIN, inputs.temperature_min),
                (PRECIPITATION_SUM, inputs.precipitation_sum),
                (WINDSPEED_MAX, inputs.wind_speed_max),
            ])?,
            FeatureSchema::Extended => {
                let humidity = inputs.humidity.ok_or_else(|| {
                    AqiError::validation(format!("Relative humidity is required for {}", city.name))
                })?;
                let aqi_lag = inputs.aqi_lag.unwrap_or(self.default_aqi_lag);
                FeatureRow::from_pairs([
                    (TEMPERATURE_MAX, inputs.temperature_max),
                    (TEMPERATURE_MIN, inputs.temperature_min),
                    (WIND_SPEED_MAX, inputs.wind_speed_max),
                    (PRECIPITATION_SUM, inputs.precipitation_sum),
                    (HUMIDITY_MEAN, humidity),
                    (AQI_LAG, aqi_lag),
                ])?
            }
        };

        debug!(city = %city.name, schema = %city.schema, "Assembled feature row");
        row.select(city.schema.columns())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn city(schema: FeatureSchema) -> City {
        City::new("Test", 0.0, 0.0).with_schema(schema)
    }

    fn inputs() -> FeatureInputs {
        FeatureInputs {
            temperature_max: 34.0,
            temperature_min: 26.0,
            precipitation_sum: 0.0,
            wind_speed_max: 14.0,
            humidity: None,
            aqi_lag: None,
        }
    }

    #[test]
    fn test_standard_row_has_four_fixed_columns() {
        let row = FeatureAssembler::default()
            .assemble(&city(FeatureSchema::Standard), &inputs())
            .unwrap();

        assert_eq!(
            row.names(),
            vec!["temperature_2m_max", "temperature_2m_min", "precipitation_sum", "windspeed_10m_max"]
        );
        assert_eq!(row.values(), vec![34.0, 26.0, 0.0, 14.0]);
    }

    #[test]
    fn test_extended_row_has_six_fixed_columns() {
        let inputs = FeatureInputs {
            humidity: Some(65.0),
            aqi_lag: Some(120.0),
            ..inputs()
        };
        let row = FeatureAssembler::default()
            .assemble(&city(FeatureSchema::Extended), &inputs)
            .unwrap();

        assert_eq!(
            row.names(),
            vec![
                "temperature_2m_max",
                "temperature_2m_min",
                "wind_speed_10m_max",
                "precipitation_sum",
                "relative_humidity_2m_mean",
                "AQI_lag1"
            ]
        );
        assert_eq!(row.values(), vec![34.0, 26.0, 14.0, 0.0, 65.0, 120.0]);
    }

    #[test]
    fn test_extended_row_uses_lag_default() {
        let inputs = FeatureInputs {
            humidity: Some(70.0),
            ..inputs()
        };
        let row = FeatureAssembler::new(75.5)
            .assemble(&city(FeatureSchema::Extended), &inputs)
            .unwrap();
        assert_eq!(row.get(AQI_LAG), Some(75.5));
    }

    #[test]
    fn test_extended_row_requires_humidity() {
        let err = FeatureAssembler::default()
            .assemble(&city(FeatureSchema::Extended), &inputs())
            .unwrap_err();
        assert!(matches!(err, AqiError::Validation { .. }));
    }

    #[test]
    fn test_select_reorders_by_name() {
        let row = FeatureRow::from_pairs([
            (WINDSPEED_MAX, 14.0),
            (PRECIPITATION_SUM, 0.0),
            (TEMPERATURE_MIN, 26.0),
            (TEMPERATURE_MAX, 34.0),
        ])
        .unwrap();

        let selected = row.select(FeatureSchema::Standard.columns()).unwrap();
        assert_eq!(selected.names(), FeatureSchema::Standard.columns().to_vec());
        assert_eq!(selected.values(), vec![34.0, 26.0, 0.0, 14.0]);
    }

    #[test]
    fn test_select_missing_column_fails() {
        let row = FeatureRow::from_pairs([(TEMPERATURE_MAX, 34.0)]).unwrap();
        let err = row.select(FeatureSchema::Standard.columns()).unwrap_err();
        assert!(matches!(err, AqiError::Inference { .. }));
        assert!(err.to_string().contains(TEMPERATURE_MIN));
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let result = FeatureRow::from_pairs([(TEMPERATURE_MAX, 1.0), (TEMPERATURE_MAX, 2.0)]);
        assert!(result.is_err());
    }

    #[rstest]
    #[case(FeatureSchema::Standard, 4)]
    #[case(FeatureSchema::Extended, 6)]
    fn test_schema_column_counts(#[case] schema: FeatureSchema, #[case] expected: usize) {
        let inputs = FeatureInputs::placeholder();
        let row = FeatureAssembler::default().assemble(&city(schema), &inputs).unwrap();
        assert_eq!(row.len(), expected);
        assert_eq!(row.names(), schema.columns().to_vec());
    }

    #[test]
    fn test_inputs_from_sample_keep_form_extras() {
        let sample = WeatherSample {
            temperature_max: 31.2,
            temperature_min: 24.8,
            precipitation_sum: 3.1,
            wind_speed_max: 9.7,
        };
        let inputs = FeatureInputs::from_sample(&sample);
        assert_eq!(inputs.temperature_max, 31.2);
        assert_eq!(inputs.wind_speed_max, 9.7);
        assert_eq!(inputs.humidity, Some(DEFAULT_HUMIDITY));
        assert_eq!(inputs.aqi_lag, None);
    }
}

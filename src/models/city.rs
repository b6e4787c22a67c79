//! City registry with coordinates and feature schema per city

use serde::{Deserialize, Serialize};

use crate::features::FeatureSchema;
use crate::{AqiError, Result};

/// A city the dashboard can predict AQI for
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct City {
    /// City name, also the key into the model manifest
    pub name: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Column layout the city's model was trained on
    pub schema: FeatureSchema,
}

impl City {
    /// Create a city using the standard feature schema
    #[must_use]
    pub fn new(name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.to_string(),
            latitude,
            longitude,
            schema: FeatureSchema::Standard,
        }
    }

    /// Switch the city to a different feature schema
    #[must_use]
    pub fn with_schema(mut self, schema: FeatureSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Immutable, ordered set of supported cities.
///
/// Built once at startup and shared by reference.
#[derive(Debug, Clone)]
pub struct CityRegistry {
    cities: Vec<City>,
}

impl CityRegistry {
    /// Create a registry from an explicit city list. Names must be unique.
    pub fn new(cities: Vec<City>) -> Result<Self> {
        for (i, city) in cities.iter().enumerate() {
            if cities[..i].iter().any(|c| c.name == city.name) {
                return Err(AqiError::config(format!("Duplicate city '{}'", city.name)));
            }
        }
        Ok(Self { cities })
    }

    /// The six Indian cities the bundled models were trained for
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            cities: vec![
                City::new("Chennai", 13.0827, 80.2707).with_schema(FeatureSchema::Extended),
                City::new("Delhi", 28.6139, 77.2090),
                City::new("Mumbai", 19.0760, 72.8777),
                City::new("Bengaluru", 12.9716, 77.5946),
                City::new("Kolkata", 22.5726, 88.3639),
                City::new("Kochi", 9.9312, 76.2673),
            ],
        }
    }

    /// Look up a city by exact name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&City> {
        self.cities.iter().find(|city| city.name == name)
    }

    /// Look up a city, failing with a validation error for unknown names
    pub fn require(&self, name: &str) -> Result<&City> {
        self.get(name).ok_or_else(|| {
            AqiError::validation(format!(
                "Unknown city '{name}'. Must be one of: {}",
                self.names().join(", ")
            ))
        })
    }

    /// City names in registry order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.cities.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &City> {
        self.cities.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

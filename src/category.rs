//! AQI severity bands

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered AQI severity band. Upper bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AqiCategory {
    Good,
    Moderate,
    Poor,
    Unhealthy,
    VeryUnhealthy,
}

impl AqiCategory {
    /// Classify an AQI value. Values above 300 (and NaN) are `VeryUnhealthy`.
    #[must_use]
    pub fn from_aqi(aqi: f64) -> Self {
        if aqi <= 50.0 {
            AqiCategory::Good
        } else if aqi <= 100.0 {
            AqiCategory::Moderate
        } else if aqi <= 200.0 {
            AqiCategory::Poor
        } else if aqi <= 300.0 {
            AqiCategory::Unhealthy
        } else {
            AqiCategory::VeryUnhealthy
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::Poor => "Poor",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
        }
    }

    /// Colored marker shown next to the label
    #[must_use]
    pub fn marker(self) -> &'static str {
        match self {
            AqiCategory::Good => "🟢",
            AqiCategory::Moderate => "🟡",
            AqiCategory::Poor => "🟠",
            AqiCategory::Unhealthy => "🔴",
            AqiCategory::VeryUnhealthy => "🟣",
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

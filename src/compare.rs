//! Side-by-side AQI comparison on fixed placeholder inputs
//!
//! Each city is predicted independently; a failure becomes that city's row
//! and never stops the remaining cities.

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::category::AqiCategory;
use crate::features::{FeatureAssembler, FeatureInputs};
use crate::inference::Predictor;
use crate::models::CityRegistry;
use crate::{AqiError, Result};

/// Cities compared when the caller selects none
pub const DEFAULT_COMPARISON_CITIES: [&str; 2] = ["Delhi", "Mumbai"];

/// Result for one compared city
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub city: String,
    #[serde(flatten)]
    pub outcome: ComparisonOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ComparisonOutcome {
    Predicted {
        /// Rounded to two decimals
        predicted_aqi: f64,
        category: AqiCategory,
    },
    Failed {
        error: String,
    },
}

impl ComparisonRow {
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, ComparisonOutcome::Failed { .. })
    }
}

/// Predict every requested city on the placeholder inputs
#[instrument(skip(registry, assembler, predictor))]
pub fn compare_cities(
    registry: &CityRegistry,
    assembler: &FeatureAssembler,
    predictor: &Predictor,
    cities: &[String],
) -> Vec<ComparisonRow> {
    let inputs = FeatureInputs::placeholder();
    let rows: Vec<ComparisonRow> = cities
        .iter()
        .map(|name| {
            let outcome = match predict_one(registry, assembler, predictor, name, &inputs) {
                Ok((aqi, category)) => ComparisonOutcome::Predicted {
                    predicted_aqi: (aqi * 100.0).round() / 100.0,
                    category,
                },
                Err(e) => {
                    warn!(city = %name, "Comparison failed: {}", e);
                    ComparisonOutcome::Failed {
                        error: comparison_error(&e),
                    }
                }
            };
            ComparisonRow {
                city: name.clone(),
                outcome,
            }
        })
        .collect();

    info!(
        "Compared {} cities ({} failed)",
        rows.len(),
        rows.iter().filter(|r| r.is_error()).count()
    );
    rows
}

fn predict_one(
    registry: &CityRegistry,
    assembler: &FeatureAssembler,
    predictor: &Predictor,
    name: &str,
    inputs: &FeatureInputs,
) -> Result<(f64, AqiCategory)> {
    let city = registry.require(name)?;
    // Checked first so an unusable city never gets as far as assembly.
    predictor.catalog().resolve(&city.name)?;
    let row = assembler.assemble(city, inputs)?;
    let prediction = predictor.predict(city, &row)?;
    Ok((prediction.aqi, prediction.category))
}

fn comparison_error(err: &AqiError) -> String {
    match err {
        AqiError::ModelUnavailable { .. } => "Model not found".to_string(),
        AqiError::Inference { message } | AqiError::Validation { message } => message.clone(),
        other => other.to_string(),
    }
}

/// Render comparison rows as a text table
#[must_use]
pub fn format_table(rows: &[ComparisonRow]) -> String {
    let mut out = format!("{:<12} {:>14} {:<16} {}\n", "City", "Predicted AQI", "Category", "Error");
    for row in rows {
        match &row.outcome {
            ComparisonOutcome::Predicted {
                predicted_aqi,
                category,
            } => out.push_str(&format!("{:<12} {:>14.2} {:<16}\n", row.city, predicted_aqi, category.label())),
            ComparisonOutcome::Failed { error } => {
                out.push_str(&format!("{:<12} {:>14} {:<16} {}\n", row.city, "-", "-", error));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::ModelCatalog;
    use crate::inference::predictor::tests::{RecordingLoader, catalog_in};
    use std::sync::Arc;

    fn names(cities: &[&str]) -> Vec<String> {
        cities.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_failure_does_not_block_other_cities() {
        let dir = tempfile::tempdir().unwrap();
        // Delhi has no artifact on disk, Mumbai does
        let mut entries = vec![("Delhi".to_string(), dir.path().join("missing.json"))];
        let mumbai = dir.path().join("mumbai.json");
        std::fs::write(&mumbai, "{}").unwrap();
        entries.push(("Mumbai".to_string(), mumbai));
        let predictor = Predictor::with_loader(
            ModelCatalog::from_entries(entries),
            Arc::new(RecordingLoader::default()),
            true,
        );

        let rows = compare_cities(
            &CityRegistry::builtin(),
            &FeatureAssembler::default(),
            &predictor,
            &names(&["Delhi", "Mumbai"]),
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].city, "Delhi");
        assert_eq!(
            rows[0].outcome,
            ComparisonOutcome::Failed {
                error: "Model not found".into()
            }
        );
        assert_eq!(rows[1].city, "Mumbai");
        assert_eq!(
            rows[1].outcome,
            ComparisonOutcome::Predicted {
                predicted_aqi: 168.0,
                category: AqiCategory::Poor
            }
        );
    }

    #[test]
    fn test_load_failure_and_unknown_city_are_rows() {
        let dir = tempfile::tempdir().unwrap();
        let loader = RecordingLoader {
            broken: vec!["kolkata".into()],
            ..Default::default()
        };
        let predictor = Predictor::with_loader(
            catalog_in(dir.path(), &["Kolkata", "Chennai"]),
            Arc::new(loader),
            true,
        );

        let rows = compare_cities(
            &CityRegistry::builtin(),
            &FeatureAssembler::default(),
            &predictor,
            &names(&["Kolkata", "Gotham", "Chennai"]),
        );

        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_error());
        assert!(rows[1].is_error());
        assert!(!rows[2].is_error());
        assert!(matches!(&rows[0].outcome, ComparisonOutcome::Failed { error } if error.contains("corrupt")));
    }

    #[test]
    fn test_row_serialization() {
        let ok = ComparisonRow {
            city: "Delhi".into(),
            outcome: ComparisonOutcome::Predicted {
                predicted_aqi: 142.37,
                category: AqiCategory::Poor,
            },
        };
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["city"], "Delhi");
        assert_eq!(json["predicted_aqi"], 142.37);
        assert_eq!(json["category"], "Poor");

        let failed = ComparisonRow {
            city: "Kochi".into(),
            outcome: ComparisonOutcome::Failed {
                error: "Model not found".into(),
            },
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["error"], "Model not found");
        assert!(json.get("predicted_aqi").is_none());
    }

    #[test]
    fn test_format_table() {
        let rows = vec![
            ComparisonRow {
                city: "Delhi".into(),
                outcome: ComparisonOutcome::Predicted {
                    predicted_aqi: 142.37,
                    category: AqiCategory::Poor,
                },
            },
            ComparisonRow {
                city: "Kochi".into(),
                outcome: ComparisonOutcome::Failed {
                    error: "Model not found".into(),
                },
            },
        ];
        let table = format_table(&rows);
        assert!(table.contains("142.37"));
        assert!(table.lines().nth(2).unwrap().ends_with("Model not found"));
    }
}

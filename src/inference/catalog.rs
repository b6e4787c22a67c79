//! Model manifest: which artifact serves which city

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{AqiError, Result};

/// One manifest row. Extra columns (scores etc.) are ignored.
#[derive(Debug, Deserialize)]
struct ManifestRecord {
    #[serde(rename = "City")]
    city: String,
    #[serde(rename = "Model_File")]
    model_file: String,
}

/// Immutable mapping from city name to model artifact path
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    entries: HashMap<String, PathBuf>,
}

impl ModelCatalog {
    /// Build a catalog from explicit entries
    pub fn from_entries<I, S, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, P)>,
        S: Into<String>,
        P: Into<PathBuf>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(city, path)| (city.into(), path.into()))
                .collect(),
        }
    }

    /// Load the CSV manifest.
    ///
    /// Relative `Model_File` paths are resolved against the manifest's
    /// directory. Artifacts are not checked here: a missing file only makes
    /// that one city unusable.
    pub fn load(manifest_path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(manifest_path).map_err(|e| {
            AqiError::config(format!(
                "Failed to open model manifest {}: {e}",
                manifest_path.display()
            ))
        })?;
        let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new(""));

        let mut entries = HashMap::new();
        for record in reader.deserialize::<ManifestRecord>() {
            let record = record.map_err(|e| {
                AqiError::config(format!(
                    "Invalid model manifest {}: {e}",
                    manifest_path.display()
                ))
            })?;
            let city = record.city.trim().to_string();
            let path = base_dir.join(record.model_file.trim());
            if let Some(previous) = entries.insert(city.clone(), path) {
                warn!(
                    "Duplicate manifest entry for {}, replacing {}",
                    city,
                    previous.display()
                );
            }
        }

        info!(
            "Loaded model manifest {} with {} entries",
            manifest_path.display(),
            entries.len()
        );
        Ok(Self { entries })
    }

    /// Manifest path for a city, whether or not the file exists
    #[must_use]
    pub fn entry(&self, city: &str) -> Option<&Path> {
        self.entries.get(city).map(PathBuf::as_path)
    }

    /// Path of a usable artifact, or `ModelUnavailable`
    pub fn resolve(&self, city: &str) -> Result<&Path> {
        match self.entry(city) {
            Some(path) if path.is_file() => Ok(path),
            Some(path) => {
                debug!("Model file for {} missing at {}", city, path.display());
                Err(AqiError::model_unavailable(city, Some(path.display().to_string())))
            }
            None => Err(AqiError::model_unavailable(city, None)),
        }
    }

    #[must_use]
    pub fn is_available(&self, city: &str) -> bool {
        self.resolve(city).is_ok()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

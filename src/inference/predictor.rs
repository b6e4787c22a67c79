//! AQI predictor: manifest lookup, model loading and single-row inference

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{debug, info, instrument};

use super::{FeatureFrame, JsonModelLoader, ModelCatalog, ModelLoader, Regressor};
use crate::category::AqiCategory;
use crate::features::FeatureRow;
use crate::models::City;
use crate::{AqiError, Result};

/// Predicted AQI for one city
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub city: String,
    pub aqi: f64,
    pub category: AqiCategory,
}

impl Prediction {
    /// One-line summary, e.g. `Predicted AQI for Delhi: 142.37 (🟠 Poor)`
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Predicted AQI for {}: {:.2} ({} {})",
            self.city,
            self.aqi,
            self.category.marker(),
            self.category
        )
    }
}

/// Runs city models on assembled feature rows
pub struct Predictor {
    catalog: ModelCatalog,
    loader: Arc<dyn ModelLoader>,
    cache: Option<Mutex<HashMap<String, Arc<dyn Regressor>>>>,
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("catalog", &self.catalog)
            .field("cache_enabled", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

impl Predictor {
    /// Predictor reading JSON artifacts, caching loaded models per city
    #[must_use]
    pub fn new(catalog: ModelCatalog) -> Self {
        Self::with_loader(catalog, Arc::new(JsonModelLoader), true)
    }

    #[must_use]
    pub fn with_loader(catalog: ModelCatalog, loader: Arc<dyn ModelLoader>, cache_models: bool) -> Self {
        Self {
            catalog,
            loader,
            cache: cache_models.then(|| Mutex::new(HashMap::new())),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Predict the AQI for `city`.
    ///
    /// Model availability is checked before anything is loaded. The row is
    /// re-selected in the city's schema order right before inference.
    #[instrument(skip(self, city, row), fields(city = %city.name))]
    pub fn predict(&self, city: &City, row: &FeatureRow) -> Result<Prediction> {
        let path = self.catalog.resolve(&city.name)?;
        let model = self.model_for(&city.name, path)?;

        let row = row.select(city.schema.columns())?;
        let frame = FeatureFrame::from_row(&row);
        let aqi = model
            .predict(&frame)?
            .first()
            .copied()
            .ok_or_else(|| AqiError::inference("Model returned no prediction"))?;

        let category = AqiCategory::from_aqi(aqi);
        info!(aqi, category = %category, "Predicted AQI");
        Ok(Prediction {
            city: city.name.clone(),
            aqi,
            category,
        })
    }

    fn model_for(&self, city: &str, path: &Path) -> Result<Arc<dyn Regressor>> {
        let Some(cache) = &self.cache else {
            return self.loader.load(path);
        };

        let mut models = cache
            .lock()
            .map_err(|_| AqiError::inference("Model cache lock poisoned"))?;
        if let Some(model) = models.get(city) {
            debug!("Using cached model for {}", city);
            return Ok(Arc::clone(model));
        }

        let model = self.loader.load(path)?;
        models.insert(city.to_string(), Arc::clone(&model));
        Ok(model)
    }
}

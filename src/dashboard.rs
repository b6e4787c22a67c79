//! Dashboard service tying cities, weather and models together
//!
//! Every user-facing operation (predict, forecast, compare) goes through
//! [`Dashboard`], which is shared read-only by the CLI and the HTTP service.

use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use crate::compare::{ComparisonRow, DEFAULT_COMPARISON_CITIES, compare_cities};
use crate::config::AqiConfig;
use crate::features::{FeatureAssembler, FeatureInputs, FeatureSchema};
use crate::inference::{JsonModelLoader, ModelCatalog, Prediction, Predictor};
use crate::models::{City, CityRegistry, WeatherForecast, WeatherSample};
use crate::session::{PredictForm, Session};
use crate::weather::{OpenMeteoClient, WeatherProvider};
use crate::Result;

/// A selectable city and whether a model can serve it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityStatus {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub schema: FeatureSchema,
    pub model_available: bool,
}

pub struct Dashboard {
    registry: CityRegistry,
    predictor: Predictor,
    assembler: FeatureAssembler,
    weather: Arc<dyn WeatherProvider>,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("registry", &self.registry)
            .field("predictor", &self.predictor)
            .field("assembler", &self.assembler)
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    #[must_use]
    pub fn new(
        registry: CityRegistry,
        predictor: Predictor,
        assembler: FeatureAssembler,
        weather: Arc<dyn WeatherProvider>,
    ) -> Self {
        Self {
            registry,
            predictor,
            assembler,
            weather,
        }
    }

    /// Build the dashboard from configuration: built-in cities, the model
    /// manifest and an Open-Meteo client.
    pub fn from_config(config: &AqiConfig) -> Result<Self> {
        let catalog = ModelCatalog::load(&config.models.manifest_path)?;
        let predictor = Predictor::with_loader(catalog, Arc::new(JsonModelLoader), config.models.cache_models);
        let weather = OpenMeteoClient::new(config.weather.clone())?;

        Ok(Self::new(
            CityRegistry::builtin(),
            predictor,
            FeatureAssembler::new(config.prediction.default_aqi_lag),
            Arc::new(weather),
        ))
    }

    #[must_use]
    pub fn registry(&self) -> &CityRegistry {
        &self.registry
    }

    #[must_use]
    pub fn default_aqi_lag(&self) -> f64 {
        self.assembler.default_aqi_lag()
    }

    /// All selectable cities with model availability
    #[must_use]
    pub fn cities(&self) -> Vec<CityStatus> {
        self.registry
            .iter()
            .map(|city| CityStatus {
                name: city.name.clone(),
                latitude: city.latitude,
                longitude: city.longitude,
                schema: city.schema,
                model_available: self.predictor.catalog().is_available(&city.name),
            })
            .collect()
    }

    /// A known city that also has a model in the catalog
    fn usable_city(&self, name: &str) -> Result<&City> {
        let city = self.registry.require(name)?;
        self.predictor.catalog().resolve(&city.name)?;
        Ok(city)
    }

    /// Fetch today's weather for a city without touching any session.
    ///
    /// Cities without a usable model are rejected before any request is made.
    pub async fn todays_weather(&self, city: &str) -> Result<WeatherSample> {
        let city = self.usable_city(city)?;
        self.weather.today(city).await
    }

    /// Fetch today's weather into `session`; on failure the session keeps
    /// whatever it had before.
    pub async fn fetch_weather(&self, session: &mut Session, city: &str) -> Result<WeatherSample> {
        let city = self.usable_city(city)?;
        session.fetch_weather(self.weather.as_ref(), city).await
    }

    /// Form values for `city`.
    ///
    /// Fails early when the city has no usable model, so the form is never
    /// offered for it.
    pub fn form(&self, session: &Session, city: &str, use_weather: bool) -> Result<PredictForm> {
        self.usable_city(city)?;
        Ok(session.form_defaults(use_weather, self.default_aqi_lag()))
    }

    /// Predict the AQI for `city` from user inputs
    #[instrument(skip(self, inputs))]
    pub fn predict(&self, city: &str, inputs: &FeatureInputs) -> Result<Prediction> {
        let city = self.usable_city(city)?;
        let row = self.assembler.assemble(city, inputs)?;
        self.predictor.predict(city, &row)
    }

    /// Multi-day weather table for `city`
    #[instrument(skip(self))]
    pub async fn forecast(&self, city: &str) -> Result<WeatherForecast> {
        let city = self.registry.require(city)?;
        self.weather.daily_forecast(city).await
    }

    /// Compare cities on placeholder inputs. An empty selection compares the
    /// default cities.
    #[must_use]
    pub fn compare(&self, cities: &[String]) -> Vec<ComparisonRow> {
        let selection: Vec<String> = if cities.is_empty() {
            DEFAULT_COMPARISON_CITIES.iter().map(|c| c.to_string()).collect()
        } else {
            cities.to_vec()
        };
        compare_cities(&self.registry, &self.assembler, &self.predictor, &selection)
    }
}

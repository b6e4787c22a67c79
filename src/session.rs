//! Per-user interactive session state
//!
//! A session remembers the last successfully fetched weather so the predict
//! form can be pre-populated. Sessions never share state with each other.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::RngExt;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::features::{
    DEFAULT_AQI_LAG, DEFAULT_HUMIDITY, DEFAULT_PRECIPITATION, DEFAULT_TEMPERATURE_MAX, DEFAULT_TEMPERATURE_MIN,
    DEFAULT_WIND_SPEED, FeatureInputs,
};
use crate::models::{City, WeatherSample};
use crate::weather::WeatherProvider;
use crate::Result;

/// Weather sample remembered by a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedWeather {
    /// City the sample was fetched for
    pub city: String,
    pub sample: WeatherSample,
}

/// Pre-populated values for the predict form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictForm {
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub precipitation_sum: f64,
    pub wind_speed_max: f64,
    pub humidity: f64,
    /// Whether the previous-day AQI field is editable
    pub include_lag: bool,
    pub aqi_lag: f64,
}

impl PredictForm {
    /// Convert submitted form values into feature inputs.
    ///
    /// The lag value only counts when `include_lag` is set.
    #[must_use]
    pub fn to_inputs(&self) -> FeatureInputs {
        FeatureInputs {
            temperature_max: self.temperature_max,
            temperature_min: self.temperature_min,
            precipitation_sum: self.precipitation_sum,
            wind_speed_max: self.wind_speed_max,
            humidity: Some(self.humidity),
            aqi_lag: self.include_lag.then_some(self.aqi_lag),
        }
    }
}

/// State for one interactive user
#[derive(Debug, Default, Clone)]
pub struct Session {
    weather: Option<CachedWeather>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn weather(&self) -> Option<&CachedWeather> {
        self.weather.as_ref()
    }

    /// Remember a fetched sample, replacing any previous one
    pub fn store_weather(&mut self, city: &City, sample: WeatherSample) {
        self.weather = Some(CachedWeather {
            city: city.name.clone(),
            sample,
        });
    }

    /// Fetch today's weather for `city`.
    ///
    /// On failure the previously stored sample is left untouched.
    pub async fn fetch_weather(&mut self, provider: &dyn WeatherProvider, city: &City) -> Result<WeatherSample> {
        match provider.today(city).await {
            Ok(sample) => {
                debug!(city = %city.name, "Stored fetched weather in session");
                self.store_weather(city, sample);
                Ok(sample)
            }
            Err(e) => {
                warn!(city = %city.name, "Weather fetch failed, keeping previous values: {}", e);
                Err(e)
            }
        }
    }

    /// Form values for the predictor view.
    ///
    /// With `use_weather` the last fetched sample (whatever city it was
    /// fetched for) fills the four weather fields; otherwise fixed defaults.
    #[must_use]
    pub fn form_defaults(&self, use_weather: bool, default_aqi_lag: f64) -> PredictForm {
        let fetched = self.weather.as_ref().filter(|_| use_weather).map(|w| w.sample);
        let base = fetched.map_or_else(FeatureInputs::default, |sample| FeatureInputs::from_sample(&sample));

        PredictForm {
            temperature_max: base.temperature_max,
            temperature_min: base.temperature_min,
            precipitation_sum: base.precipitation_sum,
            wind_speed_max: base.wind_speed_max,
            humidity: base.humidity.unwrap_or(DEFAULT_HUMIDITY),
            include_lag: false,
            aqi_lag: default_aqi_lag,
        }
    }
}

impl Default for PredictForm {
    fn default() -> Self {
        Self {
            temperature_max: DEFAULT_TEMPERATURE_MAX,
            temperature_min: DEFAULT_TEMPERATURE_MIN,
            precipitation_sum: DEFAULT_PRECIPITATION,
            wind_speed_max: DEFAULT_WIND_SPEED,
            humidity: DEFAULT_HUMIDITY,
            include_lag: false,
            aqi_lag: DEFAULT_AQI_LAG,
        }
    }
}

/// Random session identifier
pub type SessionId = String;

/// Idle time after which a session is dropped
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug)]
struct SessionEntry {
    session: Session,
    last_access: Instant,
}

/// Sessions of the HTTP service, keyed by id.
///
/// Sessions idle for longer than the TTL are evicted whenever the store is
/// accessed; any access to a session refreshes it.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create an empty session and return its id
    pub async fn create(&self) -> SessionId {
        let mut sessions = self.sessions.write().await;
        self.evict_expired(&mut sessions);
        loop {
            let id = format!("{:016x}", rand::rng().random_range(0..u64::MAX));
            if !sessions.contains_key(&id) {
                sessions.insert(
                    id.clone(),
                    SessionEntry {
                        session: Session::new(),
                        last_access: Instant::now(),
                    },
                );
                debug!(session = %id, "Created session");
                return id;
            }
        }
    }

    /// Snapshot of a live session
    pub async fn get(&self, id: &str) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        self.evict_expired(&mut sessions);
        sessions.get_mut(id).map(|entry| {
            entry.last_access = Instant::now();
            entry.session.clone()
        })
    }

    /// Store a fetched sample in a session; false if the session is gone
    pub async fn store_weather(&self, id: &str, city: &City, sample: WeatherSample) -> bool {
        let mut sessions = self.sessions.write().await;
        self.evict_expired(&mut sessions);
        match sessions.get_mut(id) {
            Some(entry) => {
                entry.last_access = Instant::now();
                entry.session.store_weather(city, sample);
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        self.evict_expired(&mut sessions);
        sessions.len()
    }

    fn evict_expired(&self, sessions: &mut HashMap<SessionId, SessionEntry>) {
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_access.elapsed() <= self.ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!("Evicted {} idle sessions", evicted);
        }
    }
}

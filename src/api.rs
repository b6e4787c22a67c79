//! JSON API of the dashboard service

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error};

use crate::compare::ComparisonRow;
use crate::dashboard::{CityStatus, Dashboard};
use crate::inference::Prediction;
use crate::models::{City, WeatherForecast, WeatherSample};
use crate::session::{PredictForm, SessionStore};
use crate::{AqiError, VERSION};

/// Shared state of all handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub sessions: SessionStore,
}

impl AppState {
    #[must_use]
    pub fn new(dashboard: Dashboard) -> Self {
        Self::with_sessions(dashboard, SessionStore::new())
    }

    #[must_use]
    pub fn with_sessions(dashboard: Dashboard, sessions: SessionStore) -> Self {
        Self {
            dashboard: Arc::new(dashboard),
            sessions,
        }
    }
}

/// Handler error rendered as `{ "error": message }`
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Aqi(AqiError),
}

impl From<AqiError> for ApiError {
    fn from(err: AqiError) -> Self {
        ApiError::Aqi(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Aqi(err) => {
                let status = match &err {
                    AqiError::Validation { .. } | AqiError::Inference { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    AqiError::ModelUnavailable { .. } => StatusCode::CONFLICT,
                    AqiError::WeatherFetch { .. } => StatusCode::BAD_GATEWAY,
                    AqiError::Config { .. } | AqiError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    error!("Request failed: {}", err);
                }
                (status, err.user_message())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: String,
}

#[derive(Deserialize)]
pub struct CityRequest {
    pub city: String,
}

#[derive(Deserialize)]
pub struct FormQuery {
    pub city: String,
    #[serde(default)]
    pub use_weather: bool,
}

#[derive(Deserialize)]
pub struct PredictRequest {
    pub city: String,
    #[serde(flatten)]
    pub form: PredictForm,
}

#[derive(Deserialize, Default)]
pub struct CompareRequest {
    #[serde(default)]
    pub cities: Vec<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/cities", get(list_cities))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", delete(delete_session))
        .route("/sessions/{id}/weather", post(fetch_weather))
        .route("/sessions/{id}/form", get(get_form))
        .route("/sessions/{id}/predict", post(predict))
        .route("/forecast/{city}", get(get_forecast))
        .route("/compare", post(compare))
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: VERSION,
    })
}

async fn list_cities(State(state): State<AppState>) -> Json<Vec<CityStatus>> {
    Json(state.dashboard.cities())
}

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionCreated>) {
    let session_id = state.sessions.create().await;
    (StatusCode::CREATED, Json(SessionCreated { session_id }))
}

async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(unknown_session(&id))
    }
}

async fn fetch_weather(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CityRequest>,
) -> ApiResult<WeatherSample> {
    ensure_session(&state, &id).await?;
    let city = known_city(&state, &request.city)?;

    // The session lock is not held while the request is in flight.
    let sample = state.dashboard.todays_weather(&city.name).await?;
    if !state.sessions.store_weather(&id, city, sample).await {
        return Err(unknown_session(&id));
    }
    debug!(session = %id, city = %city.name, "Weather stored");
    Ok(Json(sample))
}

async fn get_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<FormQuery>,
) -> ApiResult<PredictForm> {
    let session = state.sessions.get(&id).await.ok_or_else(|| unknown_session(&id))?;
    let city = known_city(&state, &query.city)?;
    let form = state.dashboard.form(&session, &city.name, query.use_weather)?;
    Ok(Json(form))
}

async fn predict(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PredictRequest>,
) -> ApiResult<Prediction> {
    ensure_session(&state, &id).await?;
    let city = known_city(&state, &request.city)?;
    let prediction = state.dashboard.predict(&city.name, &request.form.to_inputs())?;
    Ok(Json(prediction))
}

async fn get_forecast(State(state): State<AppState>, Path(city): Path<String>) -> ApiResult<WeatherForecast> {
    let city = known_city(&state, &city)?;
    Ok(Json(state.dashboard.forecast(&city.name).await?))
}

async fn compare(State(state): State<AppState>, Json(request): Json<CompareRequest>) -> Json<Vec<ComparisonRow>> {
    Json(state.dashboard.compare(&request.cities))
}

async fn ensure_session(state: &AppState, id: &str) -> Result<(), ApiError> {
    match state.sessions.get(id).await {
        Some(_) => Ok(()),
        None => Err(unknown_session(id)),
    }
}

fn known_city<'a>(state: &'a AppState, name: &str) -> Result<&'a City, ApiError> {
    state
        .dashboard
        .registry()
        .get(name)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown city '{name}'")))
}

fn unknown_session(id: &str) -> ApiError {
    ApiError::NotFound(format!("Unknown session '{id}'"))
}

//! End-to-end tests for the AQI dashboard library and CLI

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use aqi_dashboard::config::WeatherConfig;
use aqi_dashboard::{
    AqiCategory, AqiError, CityRegistry, ComparisonOutcome, Dashboard, FeatureAssembler, ModelCatalog,
    OpenMeteoClient, Predictor, Session,
};
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

/// Models for Delhi (forest) and Chennai (linear on the lag); Mumbai's
/// manifest entry points at a file that does not exist.
fn model_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();

    let forest = serde_json::json!({
        "kind": "random_forest",
        "feature_names": ["temperature_2m_max", "temperature_2m_min", "precipitation_sum", "windspeed_10m_max"],
        "trees": [
            {"nodes": [
                {"feature": 0, "threshold": 35.0, "left": 1, "right": 2},
                {"value": 80.0},
                {"value": 200.0}
            ]},
            {"nodes": [{"value": 100.0}]}
        ]
    });
    std::fs::write(dir.path().join("delhi_forest.json"), forest.to_string()).unwrap();

    let linear = serde_json::json!({
        "kind": "linear",
        "feature_names": [
            "temperature_2m_max", "temperature_2m_min", "wind_speed_10m_max",
            "precipitation_sum", "relative_humidity_2m_mean", "AQI_lag1"
        ],
        "intercept": 0.0,
        "coefficients": [0.0, 0.0, 0.0, 0.0, 0.0, 1.0]
    });
    std::fs::write(dir.path().join("chennai_linear.json"), linear.to_string()).unwrap();

    std::fs::write(
        dir.path().join("random_forest_model_scores.csv"),
        "City,Model_File,R2\nDelhi,delhi_forest.json,0.81\nChennai,chennai_linear.json,0.77\nMumbai,mumbai_missing.json,0.74\n",
    )
    .unwrap();
    dir
}

fn manifest(dir: &Path) -> PathBuf {
    dir.join("random_forest_model_scores.csv")
}

fn weather_body() -> serde_json::Value {
    serde_json::json!({
        "daily": {
            "time": ["2024-05-01", "2024-05-02"],
            "temperature_2m_max": [41.2, 33.0],
            "temperature_2m_min": [28.3, 25.0],
            "precipitation_sum": [0.0, 3.5],
            "windspeed_10m_max": [14.8, 9.0]
        }
    })
}

fn dashboard(dir: &Path, weather_url: String) -> Dashboard {
    let catalog = ModelCatalog::load(&manifest(dir)).unwrap();
    let weather = OpenMeteoClient::new(WeatherConfig {
        base_url: weather_url,
        ..Default::default()
    })
    .unwrap();
    Dashboard::new(
        CityRegistry::builtin(),
        Predictor::new(catalog),
        FeatureAssembler::default(),
        Arc::new(weather),
    )
}

#[tokio::test]
async fn test_predict_with_fetched_weather() {
    let dir = model_dir();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body()))
        .mount(&server)
        .await;
    let dashboard = dashboard(dir.path(), server.uri());

    // Defaults: 34°C goes left in the first tree
    let mut session = Session::new();
    let form = dashboard.form(&session, "Delhi", true).unwrap();
    let prediction = dashboard.predict("Delhi", &form.to_inputs()).unwrap();
    assert_eq!(prediction.aqi, 90.0);
    assert_eq!(prediction.category, AqiCategory::Moderate);

    // Today's 41.2°C goes right
    dashboard.fetch_weather(&mut session, "Delhi").await.unwrap();
    let form = dashboard.form(&session, "Delhi", true).unwrap();
    assert_eq!(form.temperature_max, 41.2);
    let prediction = dashboard.predict("Delhi", &form.to_inputs()).unwrap();
    assert_eq!(prediction.aqi, 150.0);
    assert_eq!(prediction.category, AqiCategory::Poor);
}

#[tokio::test]
async fn test_failed_fetch_keeps_session_weather() {
    let dir = model_dir();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let dashboard = dashboard(dir.path(), server.uri());

    let mut session = Session::new();
    dashboard.fetch_weather(&mut session, "Delhi").await.unwrap();
    let err = dashboard.fetch_weather(&mut session, "Chennai").await.unwrap_err();

    assert!(matches!(err, AqiError::WeatherFetch { .. }));
    let cached = session.weather().unwrap();
    assert_eq!(cached.city, "Delhi");
    assert_eq!(cached.sample.temperature_max, 41.2);
}

#[tokio::test]
async fn test_extended_city_uses_lag_toggle() {
    let dir = model_dir();
    let dashboard = dashboard(dir.path(), "http://127.0.0.1:9".into());
    let session = Session::new();

    let mut form = dashboard.form(&session, "Chennai", false).unwrap();
    form.aqi_lag = 250.0;
    let prediction = dashboard.predict("Chennai", &form.to_inputs()).unwrap();
    assert_eq!(prediction.aqi, 90.0);

    form.include_lag = true;
    let prediction = dashboard.predict("Chennai", &form.to_inputs()).unwrap();
    assert_eq!(prediction.aqi, 250.0);
    assert_eq!(prediction.category, AqiCategory::Unhealthy);
}

#[tokio::test]
async fn test_forecast_table() {
    let dir = model_dir();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body()))
        .mount(&server)
        .await;
    let dashboard = dashboard(dir.path(), server.uri());

    let forecast = dashboard.forecast("Kolkata").await.unwrap();
    assert_eq!(forecast.days.len(), 2);
    let table = forecast.format_table();
    assert!(table.contains("2024-05-02"));
    assert!(table.contains("Precipitation (mm)"));
}

#[test]
fn test_compare_mixed_availability() {
    let dir = model_dir();
    let dashboard = dashboard(dir.path(), "http://127.0.0.1:9".into());

    let rows = dashboard.compare(&[]);
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[0].outcome,
        ComparisonOutcome::Predicted {
            predicted_aqi: 90.0,
            category: AqiCategory::Moderate
        }
    );
    assert_eq!(
        rows[1].outcome,
        ComparisonOutcome::Failed {
            error: "Model not found".into()
        }
    );
}

// =============================================================================
// CLI
// =============================================================================

fn cli(dir: &Path, args: &[&str]) -> std::process::Output {
    let config = dir.join("config.toml");
    std::fs::write(
        &config,
        format!(
            "[models]\nmanifest_path = {:?}\n\n[weather]\nbase_url = \"http://127.0.0.1:9\"\n",
            manifest(dir).display().to_string()
        ),
    )
    .unwrap();

    Command::new(env!("CARGO_BIN_EXE_aqi-dashboard"))
        .arg("--config")
        .arg(&config)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_aqi-dashboard"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("aqi-dashboard"));
    assert!(stdout.contains("compare"));
}

#[test]
fn test_cli_cities() {
    let dir = model_dir();
    let output = cli(dir.path(), &["cities"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Delhi"));
    assert!(stdout.lines().any(|l| l.starts_with("Kochi") && l.contains("no model")));
}

#[test]
fn test_cli_predict_with_lag() {
    let dir = model_dir();
    let output = cli(dir.path(), &["predict", "--city", "Chennai", "--aqi-lag", "250"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Predicted AQI for Chennai: 250.00"));
    assert!(stdout.contains("Unhealthy"));
}

#[test]
fn test_cli_predict_unavailable_model_fails() {
    let dir = model_dir();
    let output = cli(dir.path(), &["predict", "--city", "Mumbai"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Model not found for Mumbai"));
}

#[test]
fn test_cli_compare() {
    let dir = model_dir();
    let output = cli(dir.path(), &["compare", "Delhi", "Mumbai", "Chennai"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("90.00"));
    assert!(stdout.contains("Model not found"));
    assert_eq!(stdout.lines().count(), 4);
}

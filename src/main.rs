//! AQI Dashboard CLI

#![allow(clippy::print_stdout)]

use std::path::PathBuf;

use aqi_dashboard::compare::format_table;
use aqi_dashboard::{AqiConfig, AqiError, Dashboard, Session, telemetry, web};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

/// AQI prediction dashboard
#[derive(Parser)]
#[command(name = "aqi-dashboard")]
#[command(author, version, about = "Predict city AQI from daily weather", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true, env = "AQI_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List cities and model availability
    Cities,

    /// Predict today's AQI for a city
    Predict {
        #[arg(long)]
        city: String,

        /// Pre-fill the weather inputs from Open-Meteo
        #[arg(long)]
        fetch_weather: bool,

        /// Maximum temperature (°C)
        #[arg(long)]
        temp_max: Option<f64>,

        /// Minimum temperature (°C)
        #[arg(long)]
        temp_min: Option<f64>,

        /// Precipitation (mm)
        #[arg(long)]
        precipitation: Option<f64>,

        /// Max wind speed (km/h)
        #[arg(long)]
        wind_speed: Option<f64>,

        /// Mean humidity (%), used by extended-schema cities
        #[arg(long)]
        humidity: Option<f64>,

        /// Previous day's AQI; enables the lag input
        #[arg(long)]
        aqi_lag: Option<f64>,
    },

    /// Show the daily weather forecast for a city
    Forecast {
        #[arg(long)]
        city: String,
    },

    /// Compare predicted AQI across cities (default: Delhi, Mumbai)
    Compare { cities: Vec<String> },

    /// Run the HTTP dashboard service
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AqiConfig::load_from_path(cli.config.clone()).context("Failed to load configuration")?;
    telemetry::init_logging(&config.logging, cli.verbose)?;
    debug!(?config, "Configuration loaded");

    let dashboard = Dashboard::from_config(&config).map_err(user_error)?;

    match cli.command {
        Commands::Cities => {
            for city in dashboard.cities() {
                let status = if city.model_available { "model available" } else { "no model" };
                println!(
                    "{:<12} {:>8.4}, {:>8.4}  [{}] {}",
                    city.name, city.latitude, city.longitude, city.schema, status
                );
            }
        }
        Commands::Predict {
            city,
            fetch_weather,
            temp_max,
            temp_min,
            precipitation,
            wind_speed,
            humidity,
            aqi_lag,
        } => {
            let mut session = Session::new();
            if fetch_weather {
                match dashboard.fetch_weather(&mut session, &city).await {
                    Ok(sample) => println!("Today's weather for {city}: {}", sample.format_temperature()),
                    Err(e) => eprintln!("{}", e.user_message()),
                }
            }

            let mut form = dashboard.form(&session, &city, fetch_weather).map_err(user_error)?;
            form.temperature_max = temp_max.unwrap_or(form.temperature_max);
            form.temperature_min = temp_min.unwrap_or(form.temperature_min);
            form.precipitation_sum = precipitation.unwrap_or(form.precipitation_sum);
            form.wind_speed_max = wind_speed.unwrap_or(form.wind_speed_max);
            form.humidity = humidity.unwrap_or(form.humidity);
            if let Some(lag) = aqi_lag {
                form.include_lag = true;
                form.aqi_lag = lag;
            }

            let prediction = dashboard.predict(&city, &form.to_inputs()).map_err(user_error)?;
            println!("{}", prediction.summary());
        }
        Commands::Forecast { city } => {
            let forecast = dashboard.forecast(&city).await.map_err(user_error)?;
            println!("Weather forecast for {city}");
            print!("{}", forecast.format_table());
        }
        Commands::Compare { cities } => {
            print!("{}", format_table(&dashboard.compare(&cities)));
        }
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            web::run(&config.server, dashboard).await.map_err(user_error)?;
        }
    }

    Ok(())
}

fn user_error(err: AqiError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}

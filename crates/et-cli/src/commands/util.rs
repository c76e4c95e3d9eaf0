//! Shared utilities for CLI commands.

use std::sync::Arc;

use anyhow::{Context, Result};
use et_core::{ConditionsProvider, EnvironmentalData, SystemClock, Tracker};
use et_db::Database;

use crate::Config;

/// Opens the configured database, creating its parent directory if needed.
pub fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

/// The conditions provider selected by the config.
pub fn weather_provider(config: &Config) -> Result<Arc<dyn ConditionsProvider>> {
    et_weather::provider_for(config.weather_api_key.as_deref(), config.weather_timeout())
        .context("failed to configure weather provider")
}

/// Builds a tracker holding every stored athlete and workout.
pub fn restore_tracker(
    db: &Database,
    provider: Option<Arc<dyn ConditionsProvider>>,
) -> Result<Tracker> {
    let tracker = Tracker::new(provider, Arc::new(SystemClock));
    let athletes = db.load_athletes().context("failed to load athletes")?;
    let workouts = db.workouts().context("failed to load workouts")?;
    tracker.restore(athletes, workouts);
    Ok(tracker)
}

/// Loads the saved model into `tracker` if one exists.
///
/// Returns whether a trained model is in use afterwards. An unreadable model
/// leaves the tracker on rule-based predictions.
pub fn load_saved_model(tracker: &Tracker, config: &Config) -> bool {
    if config.model_path.exists() {
        if let Err(err) = tracker.load_model(&config.model_path) {
            tracing::debug!(error = %err, "continuing with rule-based predictions");
        }
    }
    tracker.is_model_trained()
}

/// One-line description of workout conditions.
pub fn describe_conditions(environment: &EnvironmentalData) -> String {
    let mut line = format!(
        "{:.1}°F, {:.0}% humidity",
        environment.temperature_fahrenheit, environment.humidity_percent
    );
    if let Some(wind) = environment.wind_speed_mph {
        line.push_str(&format!(", wind {wind:.1} mph"));
    }
    if let Some(location) = &environment.location {
        line.push_str(&format!(" ({location})"));
    }
    line
}

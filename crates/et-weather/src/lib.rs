//! Current-conditions lookup for workouts.
//!
//! Provides two [`ConditionsProvider`]s:
//! - [`OpenWeatherProvider`]: the OpenWeatherMap current-weather endpoint
//! - [`SyntheticConditions`]: plausible random conditions, used when no API key
//!   is configured and whenever a live lookup fails

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use et_core::{ConditionsProvider, EnvironmentalData, Units};
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;

/// Default request timeout for lookups.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const OPENWEATHER_API_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const MPS_TO_MPH: f64 = 2.236_936;

/// Weather lookup errors.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// The provided API key was invalid.
    #[error("invalid API key: {reason}")]
    InvalidApiKey { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The service answered with an error status.
    #[error("weather service error: status {status}: {message}")]
    Api { status: u16, message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Random but plausible conditions.
///
/// Base temperature is 70°F (68°F for locations mentioning "indoor" or "gym")
/// shifted by a uniform draw from −5 to +10; humidity is uniform in 30–70% and
/// wind uniform in 0–10 mph.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticConditions;

impl SyntheticConditions {
    pub fn generate(location: &str) -> EnvironmentalData {
        Self::generate_with(&mut rand::rng(), location)
    }

    pub fn generate_with<R: Rng>(rng: &mut R, location: &str) -> EnvironmentalData {
        let lower = location.to_lowercase();
        let base = if lower.contains("indoor") || lower.contains("gym") {
            68.0
        } else {
            70.0
        };

        EnvironmentalData::new(
            base + rng.random_range(-5.0..10.0),
            rng.random_range(30.0..70.0),
        )
        .with_location(location)
        .with_wind_speed(rng.random_range(0.0..10.0))
    }
}

impl ConditionsProvider for SyntheticConditions {
    fn current_conditions(&self, location: &str, _units: Units) -> Option<EnvironmentalData> {
        Some(Self::generate(location))
    }
}

/// OpenWeatherMap client.
///
/// Lookups are blocking and bounded by the configured timeout. As a
/// [`ConditionsProvider`] it never fails: errors are logged and replaced by
/// [`SyntheticConditions`].
pub struct OpenWeatherProvider {
    http: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
}

impl fmt::Debug for OpenWeatherProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenWeatherProvider")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenWeatherProvider {
    /// Creates a client with the given API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or whitespace-only, or if
    /// the HTTP client fails to build.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, WeatherError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(WeatherError::InvalidApiKey {
                reason: "API key cannot be empty",
            });
        }

        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(WeatherError::ClientBuild)?;

        Ok(Self {
            http,
            api_key,
            base_url: OPENWEATHER_API_URL.to_string(),
        })
    }

    /// Points the client at a different endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetches current conditions, reporting any failure.
    pub fn fetch(&self, location: &str, units: Units) -> Result<EnvironmentalData, WeatherError> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", location),
                ("appid", self.api_key.as_str()),
                ("units", units.as_str()),
            ])
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(WeatherError::Api {
                status: status.as_u16(),
                message: parse_api_message(&body).unwrap_or(body),
            });
        }
        parse_conditions(&body, location, units)
    }
}

impl ConditionsProvider for OpenWeatherProvider {
    fn current_conditions(&self, location: &str, units: Units) -> Option<EnvironmentalData> {
        match self.fetch(location, units) {
            Ok(conditions) => {
                tracing::debug!(
                    location,
                    temperature_f = conditions.temperature_fahrenheit,
                    humidity = conditions.humidity_percent,
                    "fetched current conditions"
                );
                Some(conditions)
            }
            Err(err) => {
                tracing::warn!(location, error = %err, "weather lookup failed, using synthetic conditions");
                Some(SyntheticConditions::generate(location))
            }
        }
    }
}

/// Picks the live provider when an API key is configured, synthetic data
/// otherwise.
pub fn provider_for(
    api_key: Option<&str>,
    timeout: Duration,
) -> Result<Arc<dyn ConditionsProvider>, WeatherError> {
    match api_key {
        Some(key) => Ok(Arc::new(OpenWeatherProvider::new(key, timeout)?)),
        None => Ok(Arc::new(SyntheticConditions)),
    }
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    main: MainReadings,
    #[serde(default)]
    wind: Option<Wind>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct Wind {
    #[serde(default)]
    speed: f64,
}

/// Parses an OpenWeatherMap current-weather response into °F / mph.
pub fn parse_conditions(
    body: &str,
    location: &str,
    units: Units,
) -> Result<EnvironmentalData, WeatherError> {
    let payload: CurrentWeather =
        serde_json::from_str(body).map_err(|err| WeatherError::InvalidResponse(err.to_string()))?;

    let wind = payload.wind.map_or(0.0, |w| w.speed);
    let (temperature_f, wind_mph) = match units {
        Units::Imperial => (payload.main.temp, wind),
        Units::Metric => (payload.main.temp * 9.0 / 5.0 + 32.0, wind * MPS_TO_MPH),
    };

    Ok(EnvironmentalData::new(temperature_f, payload.main.humidity)
        .with_location(location)
        .with_wind_speed(wind_mph))
}

fn parse_api_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorPayload {
        message: String,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .map(|payload| payload.message)
}

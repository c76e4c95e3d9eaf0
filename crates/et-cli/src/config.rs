//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Path to the saved prediction model.
    pub model_path: PathBuf,
    /// OpenWeatherMap API key; synthetic conditions are used without one.
    #[serde(default)]
    pub weather_api_key: Option<String>,
    /// Timeout for weather lookups, in seconds.
    pub weather_timeout_secs: u64,
    /// Workouts required before `et train` will fit a model.
    pub min_training_workouts: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("model_path", &self.model_path)
            .field(
                "weather_api_key",
                &self.weather_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("weather_timeout_secs", &self.weather_timeout_secs)
            .field("min_training_workouts", &self.min_training_workouts)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("et.db"),
            model_path: data_dir.join("model.json"),
            weather_api_key: None,
            weather_timeout_secs: 5,
            min_training_workouts: 10,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources override earlier ones: defaults, then
    /// `<config_dir>/et/config.toml`, then `config_path`, then `ET_*`
    /// environment variables.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("ET_"));

        figment.extract()
    }

    pub const fn weather_timeout(&self) -> Duration {
        Duration::from_secs(self.weather_timeout_secs)
    }
}

/// Returns the platform-specific config directory for et.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("et"))
}

/// Returns the platform-specific data directory for et.
///
/// On Linux: `~/.local/share/et`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("et"))
}

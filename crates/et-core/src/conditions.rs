//! Environmental-conditions lookup interface.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::workout::EnvironmentalData;

/// Unit system requested from a conditions provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Units {
    #[default]
    Imperial,
    Metric,
}

impl Units {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Imperial => "imperial",
            Self::Metric => "metric",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Looks up current conditions for a location.
///
/// Implementations must not fail or hang: lookup errors and timeouts are
/// absorbed inside the provider, which either returns substitute data or
/// `None`. Returned data is always in °F and mph regardless of `units`.
pub trait ConditionsProvider: Send + Sync + fmt::Debug {
    fn current_conditions(&self, location: &str, units: Units) -> Option<EnvironmentalData>;
}

/// How the environment for a workout should be determined.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConditionsSource {
    /// Conditions supplied by the caller.
    Explicit(EnvironmentalData),
    /// Look conditions up for a location.
    Location(String),
    /// Nothing known; use moderate defaults.
    #[default]
    Unspecified,
}

impl ConditionsSource {
    /// Builds a source from optional caller inputs; explicit data wins.
    pub fn from_parts(environment: Option<EnvironmentalData>, location: Option<&str>) -> Self {
        match (environment, location) {
            (Some(env), _) => Self::Explicit(env),
            (None, Some(loc)) => Self::Location(loc.to_string()),
            (None, None) => Self::Unspecified,
        }
    }

    /// Resolves to concrete conditions: explicit data, then the provider,
    /// then 70°F / 50% at the given (or "unknown") location.
    pub fn resolve(self, provider: Option<&dyn ConditionsProvider>) -> EnvironmentalData {
        match self {
            Self::Explicit(env) => env,
            Self::Location(location) => provider
                .and_then(|p| p.current_conditions(&location, Units::Imperial))
                .unwrap_or_else(|| EnvironmentalData::moderate(Some(&location))),
            Self::Unspecified => EnvironmentalData::moderate(None),
        }
    }
}

//! Hydration recommendations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

/// Recovery drink, ordered by sodium concentration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrinkType {
    Water,
    ElectrolyteLow,
    ElectrolyteMedium,
    ElectrolyteHigh,
}

impl DrinkType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::ElectrolyteLow => "electrolyte_low",
            Self::ElectrolyteMedium => "electrolyte_medium",
            Self::ElectrolyteHigh => "electrolyte_high",
        }
    }

    /// Drink bucket for an estimated sodium loss in milligrams.
    ///
    /// Bucket edges are exclusive: exactly 1500 mg is still medium.
    #[must_use]
    pub fn from_sodium_loss_mg(sodium_mg: f64) -> Self {
        if sodium_mg > 1500.0 {
            Self::ElectrolyteHigh
        } else if sodium_mg > 800.0 {
            Self::ElectrolyteMedium
        } else if sodium_mg > 400.0 {
            Self::ElectrolyteLow
        } else {
            Self::Water
        }
    }

    /// Drink bucket for a continuous intensity score predicted by a model.
    #[must_use]
    pub fn from_intensity_score(score: f64) -> Self {
        if score >= 2.5 {
            Self::ElectrolyteHigh
        } else if score >= 1.5 {
            Self::ElectrolyteMedium
        } else if score >= 0.5 {
            Self::ElectrolyteLow
        } else {
            Self::Water
        }
    }

    /// Ordinal used as the drink-intensity training target.
    #[must_use]
    pub const fn intensity_score(&self) -> f64 {
        match self {
            Self::Water => 0.0,
            Self::ElectrolyteLow => 1.0,
            Self::ElectrolyteMedium => 2.0,
            Self::ElectrolyteHigh => 3.0,
        }
    }

    /// Name used in human-readable output.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::ElectrolyteLow => "low-sodium electrolyte drink",
            Self::ElectrolyteMedium => "medium-sodium electrolyte drink",
            Self::ElectrolyteHigh => "high-sodium electrolyte drink",
        }
    }
}

impl fmt::Display for DrinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DrinkType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "water" => Ok(Self::Water),
            "electrolyte_low" => Ok(Self::ElectrolyteLow),
            "electrolyte_medium" => Ok(Self::ElectrolyteMedium),
            "electrolyte_high" => Ok(Self::ElectrolyteHigh),
            _ => Err(ValidationError::invalid_variant("drink type", s)),
        }
    }
}

/// How soon the athlete should act on a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Urgency {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    #[must_use]
    pub const fn is_pressing(&self) -> bool {
        matches!(self, Self::High | Self::Urgent)
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A personalised post-workout hydration recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydrationRecommendation {
    pub volume_liters: f64,
    pub drink_type: DrinkType,
    /// Minutes after the workout within which to drink.
    pub timing_minutes: u32,
    pub reasoning: String,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub future_suggestions: Option<Vec<String>>,
}

impl fmt::Display for HydrationRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Recommended: {:.2} L of {} within {} minutes post-workout.",
            self.volume_liters,
            self.drink_type.display_name(),
            self.timing_minutes
        )?;
        write!(f, "Reason: {}", self.reasoning)?;
        if let Some(suggestions) = self.future_suggestions.as_deref().filter(|s| !s.is_empty()) {
            write!(f, "\n\nFuture suggestions:")?;
            for suggestion in suggestions {
                write!(f, "\n- {suggestion}")?;
            }
        }
        Ok(())
    }
}

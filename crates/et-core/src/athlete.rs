//! Athlete identity and physiological profile.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AthleteId, ValidationError, require_positive};
use crate::workout::Workout;

/// Sweat rate assumed when the athlete has no personalised measurement (L/h).
pub const DEFAULT_SWEAT_RATE_L_PER_HOUR: f64 = 1.0;

/// Sweat sodium concentration assumed without a personalised measurement (mg/L).
pub const DEFAULT_SODIUM_LOSS_MG_PER_LITER: f64 = 800.0;

/// Resting heart rate assumed without a personalised measurement (bpm).
pub const DEFAULT_BASELINE_HEART_RATE_BPM: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "Other")]
    Other,
}

impl Gender {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "m" | "male" => Ok(Self::Male),
            "f" | "female" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            _ => Err(ValidationError::invalid_variant("gender", s)),
        }
    }
}

/// Training level of the athlete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Recreational,
    Competitive,
    Elite,
}

impl ActivityLevel {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recreational => "recreational",
            Self::Competitive => "competitive",
            Self::Elite => "elite",
        }
    }

    /// Ordinal encoding used as a model feature.
    #[must_use]
    pub const fn ordinal(&self) -> f64 {
        match self {
            Self::Recreational => 0.0,
            Self::Competitive => 1.0,
            Self::Elite => 2.0,
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActivityLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recreational" => Ok(Self::Recreational),
            "competitive" => Ok(Self::Competitive),
            "elite" => Ok(Self::Elite),
            _ => Err(ValidationError::invalid_variant("activity level", s)),
        }
    }
}

/// Individual physiological profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteProfile {
    pub age: u32,
    pub gender: Gender,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub activity_level: ActivityLevel,
    /// Measured sweat rate, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sweat_rate_liter_per_hour: Option<f64>,
    /// Measured sweat sodium concentration, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium_loss_rate_mg_per_liter: Option<f64>,
    /// Resting heart rate, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_heart_rate_bpm: Option<u32>,
}

impl AthleteProfile {
    /// Creates a profile with no personalised measurements.
    #[must_use]
    pub const fn new(
        age: u32,
        gender: Gender,
        weight_kg: f64,
        height_cm: f64,
        activity_level: ActivityLevel,
    ) -> Self {
        Self {
            age,
            gender,
            weight_kg,
            height_cm,
            activity_level,
            sweat_rate_liter_per_hour: None,
            sodium_loss_rate_mg_per_liter: None,
            baseline_heart_rate_bpm: None,
        }
    }

    #[must_use]
    pub const fn with_baseline_heart_rate(mut self, bpm: u32) -> Self {
        self.baseline_heart_rate_bpm = Some(bpm);
        self
    }

    #[must_use]
    pub const fn with_sweat_rate(mut self, liters_per_hour: f64) -> Self {
        self.sweat_rate_liter_per_hour = Some(liters_per_hour);
        self
    }

    #[must_use]
    pub const fn with_sodium_loss_rate(mut self, mg_per_liter: f64) -> Self {
        self.sodium_loss_rate_mg_per_liter = Some(mg_per_liter);
        self
    }

    /// Rejects out-of-range fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.age == 0 {
            return Err(ValidationError::OutOfRange {
                field: "age",
                value: 0.0,
                expected: "greater than 0",
            });
        }
        require_positive("weight_kg", self.weight_kg)?;
        require_positive("height_cm", self.height_cm)?;
        if let Some(rate) = self.sweat_rate_liter_per_hour {
            require_positive("sweat_rate_liter_per_hour", rate)?;
        }
        if let Some(rate) = self.sodium_loss_rate_mg_per_liter {
            require_positive("sodium_loss_rate_mg_per_liter", rate)?;
        }
        if let Some(bpm) = self.baseline_heart_rate_bpm {
            require_positive("baseline_heart_rate_bpm", f64::from(bpm))?;
        }
        Ok(())
    }

    /// Personalised sweat rate, or the population default.
    #[must_use]
    pub fn sweat_rate_or_default(&self) -> f64 {
        self.sweat_rate_liter_per_hour
            .unwrap_or(DEFAULT_SWEAT_RATE_L_PER_HOUR)
    }

    /// Personalised sodium concentration, or the population default.
    #[must_use]
    pub fn sodium_loss_rate_or_default(&self) -> f64 {
        self.sodium_loss_rate_mg_per_liter
            .unwrap_or(DEFAULT_SODIUM_LOSS_MG_PER_LITER)
    }

    /// Personalised resting heart rate, or the population default.
    #[must_use]
    pub fn baseline_heart_rate_or_default(&self) -> u32 {
        self.baseline_heart_rate_bpm
            .unwrap_or(DEFAULT_BASELINE_HEART_RATE_BPM)
    }
}

/// A registered athlete and their completed workouts.
///
/// The workout history is append-only and kept in the order workouts were
/// recorded.
#[derive(Debug, Clone)]
pub struct Athlete {
    pub id: AthleteId,
    pub profile: AthleteProfile,
    pub created_at: DateTime<Utc>,
    history: Vec<Workout>,
}

impl Athlete {
    #[must_use]
    pub const fn new(id: AthleteId, profile: AthleteProfile, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            profile,
            created_at,
            history: Vec::new(),
        }
    }

    /// Completed workouts, oldest first.
    #[must_use]
    pub fn history(&self) -> &[Workout] {
        &self.history
    }

    /// Appends a completed workout to the history.
    pub fn record_workout(&mut self, workout: Workout) {
        self.history.push(workout);
    }

    /// The `n` most recently recorded workouts.
    #[must_use]
    pub fn recent_workouts(&self, n: usize) -> &[Workout] {
        let start = self.history.len().saturating_sub(n);
        &self.history[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> AthleteProfile {
        AthleteProfile::new(25, Gender::Male, 70.0, 175.0, ActivityLevel::Competitive)
    }

    #[test]
    fn gender_parses_short_and_long_forms() {
        assert_eq!("M".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!("female".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!("Other".parse::<Gender>().unwrap(), Gender::Other);
        assert!("x".parse::<Gender>().is_err());
    }

    #[test]
    fn gender_serializes_as_letter() {
        assert_eq!(serde_json::to_string(&Gender::Male).unwrap(), "\"M\"");
        assert_eq!(serde_json::to_string(&Gender::Other).unwrap(), "\"Other\"");
    }

    #[test]
    fn activity_level_roundtrips_through_str() {
        for level in [
            ActivityLevel::Recreational,
            ActivityLevel::Competitive,
            ActivityLevel::Elite,
        ] {
            assert_eq!(level.as_str().parse::<ActivityLevel>().unwrap(), level);
        }
    }

    #[test]
    fn validate_accepts_reasonable_profile() {
        assert!(profile().with_baseline_heart_rate(60).validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_fields() {
        let mut p = profile();
        p.age = 0;
        assert!(p.validate().is_err());

        let mut p = profile();
        p.weight_kg = -3.0;
        assert!(matches!(
            p.validate(),
            Err(ValidationError::OutOfRange {
                field: "weight_kg",
                ..
            })
        ));

        assert!(profile().with_baseline_heart_rate(0).validate().is_err());
        assert!(profile().with_sweat_rate(f64::NAN).validate().is_err());
    }

    #[test]
    #[expect(
        clippy::float_cmp,
        reason = "defaults are exact constants"
    )]
    fn defaults_apply_when_unmeasured() {
        let p = profile();
        assert_eq!(p.sweat_rate_or_default(), 1.0);
        assert_eq!(p.sodium_loss_rate_or_default(), 800.0);
        assert_eq!(p.baseline_heart_rate_or_default(), 60);

        let p = p.with_sweat_rate(1.4).with_baseline_heart_rate(52);
        assert_eq!(p.sweat_rate_or_default(), 1.4);
        assert_eq!(p.baseline_heart_rate_or_default(), 52);
    }
}

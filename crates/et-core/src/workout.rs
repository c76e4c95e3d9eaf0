//! Workout metrics, environmental conditions and completed workout records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::recommendation::HydrationRecommendation;
use crate::types::{
    AthleteId, ValidationError, WorkoutId, require_non_negative, require_positive,
};

/// Track and field workout categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    #[default]
    Running,
    Sprinting,
    Distance,
    Interval,
    Endurance,
    SpeedWork,
    CrossTraining,
}

impl WorkoutType {
    /// Every variant, in feature-encoding order.
    pub const ALL: [Self; 7] = [
        Self::Running,
        Self::Sprinting,
        Self::Distance,
        Self::Interval,
        Self::Endurance,
        Self::SpeedWork,
        Self::CrossTraining,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Sprinting => "sprinting",
            Self::Distance => "distance",
            Self::Interval => "interval",
            Self::Endurance => "endurance",
            Self::SpeedWork => "speed_work",
            Self::CrossTraining => "cross_training",
        }
    }

    /// Position of this variant in [`Self::ALL`].
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::Running => 0,
            Self::Sprinting => 1,
            Self::Distance => 2,
            Self::Interval => 3,
            Self::Endurance => 4,
            Self::SpeedWork => 5,
            Self::CrossTraining => 6,
        }
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkoutType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::invalid_variant("workout type", s))
    }
}

/// Perceived intensity of a workout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntensityLevel {
    Low,
    #[default]
    Moderate,
    High,
    Extreme,
}

impl IntensityLevel {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Extreme => "extreme",
        }
    }

    /// Ordinal encoding used as a model feature.
    #[must_use]
    pub const fn ordinal(&self) -> f64 {
        match self {
            Self::Low => 0.0,
            Self::Moderate => 1.0,
            Self::High => 2.0,
            Self::Extreme => 3.0,
        }
    }

    /// Multiplier applied to the base sweat rate.
    #[must_use]
    pub const fn sweat_factor(&self) -> f64 {
        match self {
            Self::Low => 0.7,
            Self::Moderate => 1.0,
            Self::High => 1.5,
            Self::Extreme => 2.0,
        }
    }

    /// High and extreme workouts raise sweat sodium concentration.
    #[must_use]
    pub const fn is_strenuous(&self) -> bool {
        matches!(self, Self::High | Self::Extreme)
    }
}

impl fmt::Display for IntensityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IntensityLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "moderate" => Ok(Self::Moderate),
            "high" => Ok(Self::High),
            "extreme" => Ok(Self::Extreme),
            _ => Err(ValidationError::invalid_variant("intensity level", s)),
        }
    }
}

/// Biometric and performance measurements for a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutMetrics {
    pub duration_minutes: f64,
    pub average_heart_rate_bpm: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_heart_rate_bpm: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_workout_weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_workout_weight_kg: Option<f64>,
    #[serde(default)]
    pub fluid_intake_liters: f64,
    #[serde(default)]
    pub workout_type: WorkoutType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub intensity_level: IntensityLevel,
}

impl WorkoutMetrics {
    /// Creates metrics with only the required fields set; everything else takes
    /// its default.
    #[must_use]
    pub fn new(duration_minutes: f64, average_heart_rate_bpm: u32) -> Self {
        Self {
            duration_minutes,
            average_heart_rate_bpm,
            max_heart_rate_bpm: None,
            pre_workout_weight_kg: None,
            post_workout_weight_kg: None,
            fluid_intake_liters: 0.0,
            workout_type: WorkoutType::default(),
            distance_km: None,
            intensity_level: IntensityLevel::default(),
        }
    }

    /// Rejects out-of-range fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("duration_minutes", self.duration_minutes)?;
        require_positive(
            "average_heart_rate_bpm",
            f64::from(self.average_heart_rate_bpm),
        )?;
        if let Some(max) = self.max_heart_rate_bpm {
            require_positive("max_heart_rate_bpm", f64::from(max))?;
        }
        if let Some(pre) = self.pre_workout_weight_kg {
            require_positive("pre_workout_weight_kg", pre)?;
        }
        if let Some(post) = self.post_workout_weight_kg {
            require_positive("post_workout_weight_kg", post)?;
        }
        require_non_negative("fluid_intake_liters", self.fluid_intake_liters)?;
        if let Some(distance) = self.distance_km {
            require_non_negative("distance_km", distance)?;
        }
        Ok(())
    }

    /// Body-mass change over the workout, or 0 when either weigh-in is missing.
    #[must_use]
    pub fn weight_loss_kg(&self) -> f64 {
        match (self.pre_workout_weight_kg, self.post_workout_weight_kg) {
            (Some(pre), Some(post)) => pre - post,
            _ => 0.0,
        }
    }

    /// Weight loss (1 kg ≈ 1 L) minus fluid consumed. Negative means a net gain.
    #[must_use]
    pub fn net_fluid_loss_liters(&self) -> f64 {
        self.weight_loss_kg() - self.fluid_intake_liters
    }

    /// Whether both weigh-ins were recorded.
    #[must_use]
    pub const fn has_weigh_ins(&self) -> bool {
        self.pre_workout_weight_kg.is_some() && self.post_workout_weight_kg.is_some()
    }
}

/// Ambient conditions during a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalData {
    pub temperature_fahrenheit: f64,
    pub humidity_percent: f64,
    /// Free-form label such as "indoor" or a city name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed_mph: Option<f64>,
}

impl EnvironmentalData {
    #[must_use]
    pub const fn new(temperature_fahrenheit: f64, humidity_percent: f64) -> Self {
        Self {
            temperature_fahrenheit,
            humidity_percent,
            location: None,
            wind_speed_mph: None,
        }
    }

    /// Moderate conditions used when nothing better is known.
    #[must_use]
    pub fn moderate(location: Option<&str>) -> Self {
        Self {
            temperature_fahrenheit: 70.0,
            humidity_percent: 50.0,
            location: Some(location.unwrap_or("unknown").to_string()),
            wind_speed_mph: None,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub const fn with_wind_speed(mut self, mph: f64) -> Self {
        self.wind_speed_mph = Some(mph);
        self
    }

    /// Rejects out-of-range fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.temperature_fahrenheit.is_finite() {
            return Err(ValidationError::OutOfRange {
                field: "temperature_fahrenheit",
                value: self.temperature_fahrenheit,
                expected: "a finite number",
            });
        }
        if !(0.0..=100.0).contains(&self.humidity_percent) {
            return Err(ValidationError::OutOfRange {
                field: "humidity_percent",
                value: self.humidity_percent,
                expected: "between 0 and 100",
            });
        }
        if let Some(wind) = self.wind_speed_mph {
            require_non_negative("wind_speed_mph", wind)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn temperature_celsius(&self) -> f64 {
        (self.temperature_fahrenheit - 32.0) * 5.0 / 9.0
    }
}

/// A completed workout, as recorded in the workout log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: WorkoutId,
    pub athlete_id: AthleteId,
    pub metrics: WorkoutMetrics,
    pub environment: EnvironmentalData,
    pub timestamp: DateTime<Utc>,
    /// The recommendation issued for this workout, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<HydrationRecommendation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weighed(pre: f64, post: f64, intake: f64) -> WorkoutMetrics {
        WorkoutMetrics {
            pre_workout_weight_kg: Some(pre),
            post_workout_weight_kg: Some(post),
            fluid_intake_liters: intake,
            ..WorkoutMetrics::new(45.0, 150)
        }
    }

    #[test]
    fn weight_loss_requires_both_weigh_ins() {
        let mut metrics = WorkoutMetrics::new(30.0, 140);
        metrics.pre_workout_weight_kg = Some(70.0);
        assert!(metrics.weight_loss_kg().abs() < f64::EPSILON);
        assert!(!metrics.has_weigh_ins());
    }

    #[test]
    fn net_fluid_loss_subtracts_intake() {
        let metrics = weighed(70.0, 68.8, 0.5);
        assert!((metrics.weight_loss_kg() - 1.2).abs() < 1e-9);
        assert!((metrics.net_fluid_loss_liters() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn net_fluid_loss_can_be_negative() {
        let metrics = weighed(70.0, 69.9, 1.0);
        assert!(metrics.net_fluid_loss_liters() < 0.0);
    }

    #[test]
    fn workout_type_parses_every_variant() {
        for (i, t) in WorkoutType::ALL.iter().enumerate() {
            assert_eq!(t.index(), i);
            assert_eq!(t.as_str().parse::<WorkoutType>().unwrap(), *t);
        }
        assert!("swimming".parse::<WorkoutType>().is_err());
    }

    #[test]
    fn metrics_deserialize_with_defaults() {
        let json = r#"{"duration_minutes": 30.0, "average_heart_rate_bpm": 140}"#;
        let metrics: WorkoutMetrics = serde_json::from_str(json).unwrap();
        assert_eq!(metrics, WorkoutMetrics::new(30.0, 140));
        assert_eq!(metrics.intensity_level, IntensityLevel::Moderate);
        assert_eq!(metrics.workout_type, WorkoutType::Running);
    }

    #[test]
    fn metrics_validation() {
        assert!(weighed(70.0, 68.8, 0.5).validate().is_ok());
        assert!(WorkoutMetrics::new(0.0, 140).validate().is_err());
        assert!(WorkoutMetrics::new(30.0, 0).validate().is_err());
        assert!(weighed(70.0, 68.8, -0.5).validate().is_err());
    }

    #[test]
    fn environment_validation() {
        assert!(EnvironmentalData::new(85.0, 60.0).validate().is_ok());
        assert!(EnvironmentalData::new(85.0, 101.0).validate().is_err());
        assert!(EnvironmentalData::new(f64::INFINITY, 50.0).validate().is_err());
        assert!(
            EnvironmentalData::new(70.0, 50.0)
                .with_wind_speed(-1.0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn moderate_defaults_to_unknown_location() {
        let env = EnvironmentalData::moderate(None);
        assert_eq!(env.location.as_deref(), Some("unknown"));
        assert!((env.temperature_fahrenheit - 70.0).abs() < f64::EPSILON);
        assert!((env.humidity_percent - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn celsius_conversion() {
        assert!((EnvironmentalData::new(212.0, 50.0).temperature_celsius() - 100.0).abs() < 1e-9);
    }
}

//! Feature extraction for the hydration models.
//!
//! [`extract_features`] maps an athlete, the workout metrics and the ambient
//! conditions to a fixed-length vector. The layout is part of the persisted
//! model format: reordering or resizing it invalidates saved models.

use crate::athlete::{Athlete, Gender};
use crate::workout::{EnvironmentalData, WorkoutMetrics, WorkoutType};

/// Number of features produced by [`extract_features`].
pub const FEATURE_COUNT: usize = 30;

/// How many recent workouts feed the historical net-loss feature.
pub const HISTORY_WINDOW: usize = 5;

/// A single model input row.
pub type FeatureVector = [f64; FEATURE_COUNT];

/// Feature names in vector order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "is_male",
    "weight_kg",
    "height_m",
    "activity_level",
    "sweat_rate_l_per_hour",
    "sodium_loss_mg_per_liter",
    "baseline_heart_rate_bpm",
    "duration_minutes",
    "average_heart_rate_bpm",
    "max_heart_rate_bpm",
    "weight_loss_kg",
    "net_fluid_loss_liters",
    "fluid_intake_liters",
    "intensity_level",
    "type_running",
    "type_sprinting",
    "type_distance",
    "type_interval",
    "type_endurance",
    "type_speed_work",
    "type_cross_training",
    "distance_km",
    "temperature_f",
    "humidity_percent",
    "wind_speed_mph",
    "heat_index",
    "heart_rate_intensity",
    "estimated_sweat_rate",
    "recent_net_fluid_loss",
];

/// Builds the model input row for one workout.
pub fn extract_features(
    athlete: &Athlete,
    metrics: &WorkoutMetrics,
    environment: &EnvironmentalData,
) -> FeatureVector {
    let profile = &athlete.profile;
    let baseline_hr = f64::from(profile.baseline_heart_rate_or_default());
    let average_hr = f64::from(metrics.average_heart_rate_bpm);

    let mut features = [0.0; FEATURE_COUNT];
    let mut slot = 0;
    let mut push = |value: f64| {
        features[slot] = value;
        slot += 1;
    };

    push(f64::from(profile.age));
    push(if profile.gender == Gender::Male { 1.0 } else { 0.0 });
    push(profile.weight_kg);
    push(profile.height_cm / 100.0);
    push(profile.activity_level.ordinal());

    push(profile.sweat_rate_or_default());
    push(profile.sodium_loss_rate_or_default());
    push(baseline_hr);

    push(metrics.duration_minutes);
    push(average_hr);
    push(f64::from(
        metrics
            .max_heart_rate_bpm
            .unwrap_or(metrics.average_heart_rate_bpm),
    ));
    push(metrics.weight_loss_kg());
    push(metrics.net_fluid_loss_liters());
    push(metrics.fluid_intake_liters);
    push(metrics.intensity_level.ordinal());

    for workout_type in WorkoutType::ALL {
        push(if workout_type == metrics.workout_type { 1.0 } else { 0.0 });
    }

    push(metrics.distance_km.unwrap_or(0.0));

    push(environment.temperature_fahrenheit);
    push(environment.humidity_percent);
    push(environment.wind_speed_mph.unwrap_or(0.0));
    push(heat_index(environment));

    push((average_hr - baseline_hr) / baseline_hr);
    push(estimated_sweat_rate(athlete, metrics, environment));
    push(recent_net_fluid_loss(athlete));

    debug_assert_eq!(slot, FEATURE_COUNT);
    features
}

/// Simplified heat index in °C.
pub fn heat_index(environment: &EnvironmentalData) -> f64 {
    let temp_c = environment.temperature_celsius();
    temp_c + 0.5 * (temp_c + 61.0) * ((environment.humidity_percent - 68.0) / 100.0)
}

/// Sweat rate in L/h scaled continuously by temperature, humidity and intensity.
pub fn estimated_sweat_rate(
    athlete: &Athlete,
    metrics: &WorkoutMetrics,
    environment: &EnvironmentalData,
) -> f64 {
    let temp_factor = 1.0 + (environment.temperature_fahrenheit - 70.0) / 100.0;
    let humidity_factor = 1.0 + (environment.humidity_percent - 50.0) / 200.0;
    athlete.profile.sweat_rate_or_default()
        * temp_factor
        * humidity_factor
        * metrics.intensity_level.sweat_factor()
}

#[expect(
    clippy::cast_precision_loss,
    reason = "window is at most HISTORY_WINDOW entries"
)]
fn recent_net_fluid_loss(athlete: &Athlete) -> f64 {
    let recent = athlete.recent_workouts(HISTORY_WINDOW);
    if recent.is_empty() {
        return 0.0;
    }
    let total: f64 = recent
        .iter()
        .map(|w| w.metrics.net_fluid_loss_liters())
        .sum();
    total / recent.len() as f64
}

//! Physiology heuristics shared by the trained and rule-based predictors.
//!
//! Everything here is deterministic: sodium-loss estimation, urgency, the
//! human-readable reasoning and the suggestions for future workouts, plus the
//! complete rule-based recommendation used while no model is trained.

use crate::athlete::Athlete;
use crate::recommendation::{DrinkType, HydrationRecommendation, Urgency};
use crate::workout::{EnvironmentalData, WorkoutMetrics};

/// Fraction of the net fluid loss to drink back.
pub const REPLACEMENT_RATIO: f64 = 1.5;

/// Smallest volume the rule-based predictor recommends (L).
pub const MIN_RULE_VOLUME_L: f64 = 0.2;

/// Largest volume the rule-based predictor recommends (L).
pub const MAX_RULE_VOLUME_L: f64 = 3.0;

/// Sweat sodium concentration before heat and intensity adjustments (mg/L).
const BASE_SODIUM_MG_PER_LITER: f64 = 800.0;

const STANDARD_TIMING_MINUTES: u32 = 30;
const PRESSING_TIMING_MINUTES: u32 = 15;

const SUGGEST_PRE_HYDRATE: &str = "Consider pre-hydration before workouts in hot conditions (>85°F)";
const SUGGEST_CARRY_FLUIDS: &str =
    "For high-intensity workouts, consider carrying hydration during exercise";
const SUGGEST_MONITOR: &str = "High fluid loss detected - monitor hydration throughout workout";
const SUGGEST_CONTINUE: &str = "Continue current hydration routine";

/// Estimated sodium lost in sweat, in milligrams.
///
/// Sweat volume comes from the weigh-ins when they show a loss (1 kg ≈ 1 L);
/// otherwise it is estimated from duration at 1 L/h, raised for heat above
/// 80°F and for high or extreme intensity.
pub fn estimate_sodium_loss_mg(metrics: &WorkoutMetrics, environment: &EnvironmentalData) -> f64 {
    let strenuous = metrics.intensity_level.is_strenuous();
    let weight_loss = metrics.weight_loss_kg();

    let sweat_volume = if weight_loss > 0.0 {
        weight_loss
    } else {
        let mut sweat_rate = 1.0;
        if environment.temperature_fahrenheit > 80.0 {
            sweat_rate *= 1.5;
        }
        if strenuous {
            sweat_rate *= 1.3;
        }
        metrics.duration_minutes / 60.0 * sweat_rate
    };

    let mut concentration = BASE_SODIUM_MG_PER_LITER;
    if environment.temperature_fahrenheit > 85.0 {
        concentration *= 1.2;
    }
    if strenuous {
        concentration *= 1.3;
    }
    sweat_volume * concentration
}

/// Volume target used when training the volume model.
pub fn volume_target(metrics: &WorkoutMetrics) -> f64 {
    (metrics.net_fluid_loss_liters() * REPLACEMENT_RATIO).max(0.0)
}

/// Urgency for a recommended volume; the first matching rule wins.
pub fn determine_urgency(
    metrics: &WorkoutMetrics,
    environment: &EnvironmentalData,
    volume_liters: f64,
) -> Urgency {
    if volume_liters > 1.0 || environment.temperature_fahrenheit > 90.0 {
        Urgency::Urgent
    } else if volume_liters > 0.6 || metrics.average_heart_rate_bpm > 180 {
        Urgency::High
    } else if volume_liters < 0.2 {
        Urgency::Low
    } else {
        Urgency::Normal
    }
}

/// Drink window for a model-backed recommendation.
pub const fn timing_for(urgency: Urgency) -> u32 {
    if urgency.is_pressing() {
        PRESSING_TIMING_MINUTES
    } else {
        STANDARD_TIMING_MINUTES
    }
}

/// Temperature with at least one decimal place, e.g. `85.0°F` or `88.25°F`.
fn fahrenheit(temperature: f64) -> String {
    format!("{temperature:?}°F")
}

/// Explains a model-backed recommendation.
pub fn model_reasoning(
    metrics: &WorkoutMetrics,
    environment: &EnvironmentalData,
    drink_type: DrinkType,
) -> String {
    let mut reasons = Vec::new();

    let weight_loss = metrics.weight_loss_kg();
    if weight_loss > 0.5 {
        reasons.push(format!("Significant weight loss ({weight_loss:.2} kg)"));
    }
    if environment.temperature_fahrenheit > 85.0 {
        reasons.push(format!(
            "High temperature ({})",
            fahrenheit(environment.temperature_fahrenheit)
        ));
    }
    if metrics.average_heart_rate_bpm > 175 {
        reasons.push(format!(
            "High intensity (avg HR: {} bpm)",
            metrics.average_heart_rate_bpm
        ));
    }
    if drink_type != DrinkType::Water {
        reasons.push("Electrolyte replacement needed due to sodium loss".to_string());
    }

    if reasons.is_empty() {
        reasons.push("Balanced hydration needs detected".to_string());
    }
    format!("{}.", reasons.join(" "))
}

/// Advice for the athlete's next workouts.
pub fn future_suggestions(metrics: &WorkoutMetrics, environment: &EnvironmentalData) -> Vec<String> {
    let mut suggestions = Vec::new();

    if environment.temperature_fahrenheit > 85.0 && metrics.fluid_intake_liters < 0.5 {
        suggestions.push(SUGGEST_PRE_HYDRATE.to_string());
    }
    if metrics.average_heart_rate_bpm > 175 && metrics.fluid_intake_liters == 0.0 {
        suggestions.push(SUGGEST_CARRY_FLUIDS.to_string());
    }
    if metrics.weight_loss_kg() > 1.0 {
        suggestions.push(SUGGEST_MONITOR.to_string());
    }

    if suggestions.is_empty() {
        suggestions.push(SUGGEST_CONTINUE.to_string());
    }
    suggestions
}

/// Net fluid loss as the rule-based predictor sees it.
///
/// Uses the weigh-ins when both are present and show a loss; otherwise
/// estimates sweat from duration with step multipliers for temperature,
/// intensity and heart-rate elevation over the athlete's resting rate.
pub fn rule_net_loss_liters(
    athlete: &Athlete,
    metrics: &WorkoutMetrics,
    environment: &EnvironmentalData,
) -> f64 {
    let weight_loss = metrics.weight_loss_kg();
    if metrics.has_weigh_ins() && weight_loss > 0.0 {
        return weight_loss - metrics.fluid_intake_liters;
    }

    let temp = environment.temperature_fahrenheit;
    let temp_factor = if temp > 85.0 {
        1.8
    } else if temp > 80.0 {
        1.5
    } else if temp > 75.0 {
        1.2
    } else {
        1.0
    };

    // Only a measured resting rate says anything about elevation.
    let hr_factor = athlete
        .profile
        .baseline_heart_rate_bpm
        .map_or(1.0, |baseline| {
            let elevation = i64::from(metrics.average_heart_rate_bpm) - i64::from(baseline);
            if elevation > 50 {
                1.3
            } else if elevation > 30 {
                1.15
            } else {
                1.0
            }
        });

    let sweat_rate = athlete.profile.sweat_rate_or_default()
        * temp_factor
        * metrics.intensity_level.sweat_factor()
        * hr_factor;
    let sweat_volume = metrics.duration_minutes / 60.0 * sweat_rate;
    sweat_volume - metrics.fluid_intake_liters
}

fn rule_reasoning(
    metrics: &WorkoutMetrics,
    environment: &EnvironmentalData,
    drink_type: DrinkType,
) -> String {
    let mut reasoning = match drink_type {
        DrinkType::ElectrolyteHigh => "High sodium loss detected due to heat and intensity.",
        DrinkType::ElectrolyteMedium => "Moderate sodium loss due to workout conditions.",
        DrinkType::ElectrolyteLow => {
            "Low sodium loss, light electrolyte supplementation recommended."
        }
        DrinkType::Water => "Balanced hydration, minimal sodium loss.",
    }
    .to_string();

    if environment.temperature_fahrenheit > 80.0 {
        reasoning.push_str(&format!(
            " High temperature ({}) increases hydration needs.",
            fahrenheit(environment.temperature_fahrenheit)
        ));
    }
    if metrics.average_heart_rate_bpm > 170 {
        reasoning.push_str(&format!(
            " High intensity workout (avg HR: {} bpm) requires electrolyte replacement.",
            metrics.average_heart_rate_bpm
        ));
    }
    reasoning
}

/// Rounds to two decimal places.
pub fn round_volume(volume_liters: f64) -> f64 {
    (volume_liters * 100.0).round() / 100.0
}

/// The complete recommendation used while no model is trained.
///
/// Always recommends between [`MIN_RULE_VOLUME_L`] and [`MAX_RULE_VOLUME_L`]
/// and always uses the standard 30-minute window.
pub fn rule_based_recommendation(
    athlete: &Athlete,
    metrics: &WorkoutMetrics,
    environment: &EnvironmentalData,
) -> HydrationRecommendation {
    let net_loss = rule_net_loss_liters(athlete, metrics, environment);
    let volume = (net_loss * REPLACEMENT_RATIO).clamp(MIN_RULE_VOLUME_L, MAX_RULE_VOLUME_L);

    let drink_type = DrinkType::from_sodium_loss_mg(estimate_sodium_loss_mg(metrics, environment));

    HydrationRecommendation {
        volume_liters: round_volume(volume),
        drink_type,
        timing_minutes: STANDARD_TIMING_MINUTES,
        reasoning: rule_reasoning(metrics, environment, drink_type),
        urgency: determine_urgency(metrics, environment, volume),
        future_suggestions: Some(future_suggestions(metrics, environment)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::athlete::{ActivityLevel, AthleteProfile, Gender};
    use crate::types::AthleteId;
    use crate::workout::{IntensityLevel, WorkoutType};

    fn athlete() -> Athlete {
        Athlete::new(
            AthleteId::new("athlete_001").unwrap(),
            AthleteProfile::new(25, Gender::Male, 70.0, 175.0, ActivityLevel::Competitive)
                .with_baseline_heart_rate(60),
            Utc::now(),
        )
    }

    fn ten_k_metrics() -> WorkoutMetrics {
        WorkoutMetrics {
            max_heart_rate_bpm: Some(185),
            pre_workout_weight_kg: Some(70.0),
            post_workout_weight_kg: Some(68.8),
            fluid_intake_liters: 1.5,
            workout_type: WorkoutType::Distance,
            distance_km: Some(10.0),
            intensity_level: IntensityLevel::High,
            ..WorkoutMetrics::new(45.0, 175)
        }
    }

    fn hot() -> EnvironmentalData {
        EnvironmentalData::new(85.0, 60.0).with_location("outdoor")
    }

    #[test]
    fn reference_ten_k_scenario() {
        let rec = rule_based_recommendation(&athlete(), &ten_k_metrics(), &hot());

        assert!((rec.volume_liters - 0.2).abs() < 1e-12);
        assert_eq!(rec.drink_type, DrinkType::ElectrolyteMedium);
        assert_eq!(rec.urgency, Urgency::Normal);
        assert_eq!(rec.timing_minutes, 30);
        assert_eq!(
            rec.reasoning,
            "Moderate sodium loss due to workout conditions. \
             High temperature (85.0°F) increases hydration needs. \
             High intensity workout (avg HR: 175 bpm) requires electrolyte replacement."
        );
        assert_eq!(
            rec.future_suggestions,
            Some(vec![SUGGEST_MONITOR.to_string()])
        );
    }

    #[test]
    fn reference_sodium_estimate() {
        // 1.2 L × 800 × 1.3 (high intensity); 85°F is not above 85.
        let sodium = estimate_sodium_loss_mg(&ten_k_metrics(), &hot());
        assert!((sodium - 1248.0).abs() < 1e-6);

        // One degree hotter adds the ×1.2 heat multiplier.
        let hotter = EnvironmentalData::new(86.0, 60.0);
        let sodium = estimate_sodium_loss_mg(&ten_k_metrics(), &hotter);
        assert!((sodium - 1497.6).abs() < 1e-6);
        assert_eq!(DrinkType::from_sodium_loss_mg(sodium), DrinkType::ElectrolyteMedium);
    }

    #[test]
    fn sodium_estimate_without_weigh_ins_uses_duration() {
        let metrics = WorkoutMetrics {
            intensity_level: IntensityLevel::Extreme,
            ..WorkoutMetrics::new(60.0, 170)
        };
        // 1 h × 1.5 (heat) × 1.3 (intensity) × 800 × 1.2 × 1.3
        let sodium = estimate_sodium_loss_mg(&metrics, &EnvironmentalData::new(90.0, 50.0));
        assert!((sodium - 1.5 * 1.3 * 800.0 * 1.2 * 1.3).abs() < 1e-6);
        assert_eq!(DrinkType::from_sodium_loss_mg(sodium), DrinkType::ElectrolyteHigh);
    }

    #[test]
    fn volume_floors_when_athlete_gained_weight() {
        let metrics = WorkoutMetrics {
            pre_workout_weight_kg: Some(70.0),
            post_workout_weight_kg: Some(70.4),
            fluid_intake_liters: 2.0,
            ..WorkoutMetrics::new(20.0, 120)
        };
        let rec = rule_based_recommendation(&athlete(), &metrics, &EnvironmentalData::new(60.0, 40.0));
        assert!((rec.volume_liters - MIN_RULE_VOLUME_L).abs() < 1e-12);
    }

    #[test]
    fn volume_is_always_within_bounds() {
        let env_grid = [
            EnvironmentalData::new(50.0, 20.0),
            EnvironmentalData::new(78.0, 50.0),
            EnvironmentalData::new(83.0, 70.0),
            EnvironmentalData::new(100.0, 90.0),
        ];
        for duration in [5.0, 30.0, 90.0, 240.0] {
            for hr in [90, 140, 170, 195] {
                for intake in [0.0, 0.5, 3.0] {
                    for env in &env_grid {
                        let metrics = WorkoutMetrics {
                            fluid_intake_liters: intake,
                            pre_workout_weight_kg: Some(70.0),
                            post_workout_weight_kg: Some(70.0),
                            intensity_level: IntensityLevel::Extreme,
                            ..WorkoutMetrics::new(duration, hr)
                        };
                        let rec = rule_based_recommendation(&athlete(), &metrics, env);
                        assert!(
                            (MIN_RULE_VOLUME_L..=MAX_RULE_VOLUME_L).contains(&rec.volume_liters),
                            "volume {} out of bounds",
                            rec.volume_liters
                        );
                        assert_eq!(rec.timing_minutes, 30);
                    }
                }
            }
        }
    }

    #[test]
    fn estimated_sweat_uses_step_multipliers() {
        let metrics = WorkoutMetrics {
            intensity_level: IntensityLevel::High,
            ..WorkoutMetrics::new(60.0, 150)
        };
        // 1 h × 1.0 × 1.5 (>80°F) × 1.5 (high) × 1.3 (90 bpm over resting)
        let net = rule_net_loss_liters(&athlete(), &metrics, &EnvironmentalData::new(82.0, 50.0));
        assert!((net - 1.5 * 1.5 * 1.3).abs() < 1e-9);
    }

    #[test]
    fn heart_rate_factor_needs_measured_baseline() {
        let mut unmeasured = athlete();
        unmeasured.profile.baseline_heart_rate_bpm = None;
        let metrics = WorkoutMetrics::new(60.0, 150);
        let net = rule_net_loss_liters(&unmeasured, &metrics, &EnvironmentalData::new(70.0, 50.0));
        assert!((net - 1.0).abs() < 1e-9);
    }

    #[test]
    fn urgency_rules_apply_in_order() {
        let calm = WorkoutMetrics::new(30.0, 120);
        let mild = EnvironmentalData::new(70.0, 50.0);
        assert_eq!(determine_urgency(&calm, &mild, 1.2), Urgency::Urgent);
        assert_eq!(
            determine_urgency(&calm, &EnvironmentalData::new(91.0, 50.0), 0.1),
            Urgency::Urgent
        );
        assert_eq!(determine_urgency(&calm, &mild, 0.7), Urgency::High);
        assert_eq!(
            determine_urgency(&WorkoutMetrics::new(30.0, 181), &mild, 0.1),
            Urgency::High
        );
        assert_eq!(determine_urgency(&calm, &mild, 0.19), Urgency::Low);
        assert_eq!(determine_urgency(&calm, &mild, 0.2), Urgency::Normal);
    }

    #[test]
    fn timing_tightens_for_pressing_urgency() {
        assert_eq!(timing_for(Urgency::Urgent), 15);
        assert_eq!(timing_for(Urgency::High), 15);
        assert_eq!(timing_for(Urgency::Normal), 30);
        assert_eq!(timing_for(Urgency::Low), 30);
    }

    #[test]
    fn model_reasoning_lists_conditions() {
        let reasoning = model_reasoning(&ten_k_metrics(), &EnvironmentalData::new(88.0, 60.0), DrinkType::ElectrolyteHigh);
        assert_eq!(
            reasoning,
            "Significant weight loss (1.20 kg) High temperature (88.0°F) \
             Electrolyte replacement needed due to sodium loss."
        );
        let reasoning = model_reasoning(&WorkoutMetrics::new(30.0, 120), &EnvironmentalData::new(70.0, 50.0), DrinkType::Water);
        assert_eq!(reasoning, "Balanced hydration needs detected.");
        assert_eq!(fahrenheit(88.25), "88.25°F");
    }

    #[test]
    fn suggestions_cover_each_trigger() {
        let metrics = WorkoutMetrics {
            pre_workout_weight_kg: Some(70.0),
            post_workout_weight_kg: Some(68.5),
            ..WorkoutMetrics::new(60.0, 182)
        };
        let suggestions = future_suggestions(&metrics, &EnvironmentalData::new(95.0, 50.0));
        assert_eq!(
            suggestions,
            vec![SUGGEST_PRE_HYDRATE, SUGGEST_CARRY_FLUIDS, SUGGEST_MONITOR]
        );

        let suggestions =
            future_suggestions(&WorkoutMetrics::new(30.0, 120), &EnvironmentalData::new(70.0, 50.0));
        assert_eq!(suggestions, vec![SUGGEST_CONTINUE]);
    }

    #[test]
    fn volume_target_floors_at_zero() {
        let gain = WorkoutMetrics {
            pre_workout_weight_kg: Some(70.0),
            post_workout_weight_kg: Some(70.0),
            fluid_intake_liters: 1.0,
            ..WorkoutMetrics::new(30.0, 120)
        };
        assert!(volume_target(&gain).abs() < f64::EPSILON);
        assert!((volume_target(&ten_k_metrics())).abs() < f64::EPSILON);
    }
}

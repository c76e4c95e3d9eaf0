//! Recommend command for one-shot post-workout recommendations.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use et_core::{
    AthleteId, EnvironmentalData, HydrationRecommendation, WorkoutId, WorkoutMetrics,
};
use serde::Serialize;

use crate::Config;
use crate::cli::RecommendArgs;
use crate::commands::util::{
    describe_conditions, load_saved_model, open_database, restore_tracker, weather_provider,
};

#[derive(Debug, Serialize)]
struct RecommendOutput<'a> {
    workout_id: &'a WorkoutId,
    athlete_id: &'a AthleteId,
    timestamp: DateTime<Utc>,
    model: &'static str,
    environment: &'a EnvironmentalData,
    recommendation: &'a HydrationRecommendation,
}

fn metrics_from(args: &RecommendArgs) -> WorkoutMetrics {
    WorkoutMetrics {
        max_heart_rate_bpm: args.max_hr,
        pre_workout_weight_kg: args.pre_weight,
        post_workout_weight_kg: args.post_weight,
        fluid_intake_liters: args.intake,
        workout_type: args.workout_type,
        distance_km: args.distance,
        intensity_level: args.intensity,
        ..WorkoutMetrics::new(args.duration, args.avg_hr)
    }
}

fn environment_from(args: &RecommendArgs) -> Option<EnvironmentalData> {
    let (Some(temperature), Some(humidity)) = (args.temperature, args.humidity) else {
        return None;
    };
    let mut environment = EnvironmentalData::new(temperature, humidity);
    environment.location.clone_from(&args.location);
    environment.wind_speed_mph = args.wind;
    Some(environment)
}

pub fn run<W: Write>(writer: &mut W, args: &RecommendArgs, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let tracker = restore_tracker(&db, Some(weather_provider(config)?))?;
    let trained = load_saved_model(&tracker, config);

    let (workout, recommendation) = tracker
        .recommend(
            &args.athlete,
            metrics_from(args),
            environment_from(args),
            args.location.as_deref(),
        )
        .context("failed to produce recommendation")?;
    db.insert_workout(&workout)
        .context("failed to record workout")?;

    if args.json {
        let output = RecommendOutput {
            workout_id: &workout.id,
            athlete_id: &workout.athlete_id,
            timestamp: workout.timestamp,
            model: if trained { "trained" } else { "rules" },
            environment: &workout.environment,
            recommendation: &recommendation,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
        return Ok(());
    }

    writeln!(writer, "Athlete: {}", workout.athlete_id)?;
    writeln!(writer, "Conditions: {}", describe_conditions(&workout.environment))?;
    writeln!(writer, "Urgency: {}", recommendation.urgency)?;
    writeln!(writer)?;
    writeln!(writer, "{recommendation}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use et_core::{
        ActivityLevel, Athlete, AthleteProfile, Gender, IntensityLevel, WorkoutType,
    };
    use insta::assert_snapshot;

    fn setup() -> (tempfile::TempDir, Config) {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: temp.path().join("et.db"),
            model_path: temp.path().join("model.json"),
            ..Config::default()
        };
        let db = et_db::Database::open(&config.database_path).unwrap();
        db.upsert_athlete(&Athlete::new(
            AthleteId::new("athlete_001").unwrap(),
            AthleteProfile::new(25, Gender::Male, 70.0, 175.0, ActivityLevel::Competitive)
                .with_baseline_heart_rate(60),
            Utc::now(),
        ))
        .unwrap();
        (temp, config)
    }

    fn ten_k_args() -> RecommendArgs {
        RecommendArgs {
            athlete: AthleteId::new("athlete_001").unwrap(),
            duration: 45.0,
            avg_hr: 175,
            max_hr: Some(185),
            pre_weight: Some(70.0),
            post_weight: Some(68.8),
            intake: 1.5,
            workout_type: WorkoutType::Distance,
            distance: Some(10.0),
            intensity: IntensityLevel::High,
            temperature: Some(85.0),
            humidity: Some(60.0),
            wind: None,
            location: Some("outdoor".to_string()),
            json: false,
        }
    }

    #[test]
    fn recommend_prints_reference_scenario() {
        let (_temp, config) = setup();
        let mut output = Vec::new();
        run(&mut output, &ten_k_args(), &config).unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Athlete: athlete_001
        Conditions: 85.0°F, 60% humidity (outdoor)
        Urgency: normal

        Recommended: 0.20 L of medium-sodium electrolyte drink within 30 minutes post-workout.
        Reason: Moderate sodium loss due to workout conditions. High temperature (85.0°F) increases hydration needs. High intensity workout (avg HR: 175 bpm) requires electrolyte replacement.

        Future suggestions:
        - High fluid loss detected - monitor hydration throughout workout
        ");

        let db = et_db::Database::open(&config.database_path).unwrap();
        let workouts = db.workouts().unwrap();
        assert_eq!(workouts.len(), 1);
        assert!(workouts[0].recommendation.is_some());
    }

    #[test]
    fn recommend_json_output() {
        let (_temp, config) = setup();
        let args = RecommendArgs {
            json: true,
            ..ten_k_args()
        };
        let mut output = Vec::new();
        run(&mut output, &args, &config).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["athlete_id"], "athlete_001");
        assert_eq!(value["model"], "rules");
        assert_eq!(value["recommendation"]["drink_type"], "electrolyte_medium");
        assert_eq!(value["recommendation"]["urgency"], "normal");
        assert_eq!(value["recommendation"]["timing_minutes"], 30);
        assert_eq!(value["environment"]["location"], "outdoor");
    }

    #[test]
    fn location_only_uses_synthetic_conditions() {
        let (_temp, config) = setup();
        let args = RecommendArgs {
            temperature: None,
            humidity: None,
            location: Some("indoor".to_string()),
            json: true,
            ..ten_k_args()
        };
        let mut output = Vec::new();
        run(&mut output, &args, &config).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        let temperature = value["environment"]["temperature_fahrenheit"].as_f64().unwrap();
        assert!((63.0..78.0).contains(&temperature));
        assert_eq!(value["environment"]["location"], "indoor");
    }

    #[test]
    fn unknown_athlete_is_an_error() {
        let (_temp, config) = setup();
        let args = RecommendArgs {
            athlete: AthleteId::new("ghost").unwrap(),
            ..ten_k_args()
        };
        let err = run(&mut Vec::new(), &args, &config).unwrap_err();
        assert!(format!("{err:#}").contains("athlete not found: ghost"));
    }
}

//! Demo command: an in-memory walkthrough of recommendations and a live
//! session. Touches neither the database nor the saved model.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, TimeZone, Utc};
use et_core::{
    ActivityLevel, AthleteId, AthleteProfile, EnvironmentalData, Gender, IntensityLevel,
    ManualClock, Tracker, WorkoutMetrics, WorkoutType,
};

use crate::commands::util::describe_conditions;

pub fn run<W: Write>(writer: &mut W) -> Result<()> {
    let start = Utc
        .with_ymd_and_hms(2025, 6, 1, 7, 0, 0)
        .single()
        .context("invalid demo start time")?;
    let clock = Arc::new(ManualClock::new(start));
    let tracker = Tracker::new(None, clock.clone());

    let runner = AthleteId::new("athlete_001")?;
    tracker.register_athlete(
        runner.clone(),
        AthleteProfile::new(25, Gender::Male, 70.0, 175.0, ActivityLevel::Competitive)
            .with_baseline_heart_rate(60),
    )?;
    let sprinter = AthleteId::new("athlete_002")?;
    tracker.register_athlete(
        sprinter.clone(),
        AthleteProfile::new(22, Gender::Female, 60.0, 165.0, ActivityLevel::Competitive)
            .with_baseline_heart_rate(65),
    )?;

    writeln!(writer, "=== Example 1: 10K in the heat ===")?;
    let hot = EnvironmentalData::new(85.0, 60.0).with_location("outdoor");
    writeln!(writer, "Conditions: {}", describe_conditions(&hot))?;
    let ten_k = WorkoutMetrics {
        max_heart_rate_bpm: Some(185),
        pre_workout_weight_kg: Some(70.0),
        post_workout_weight_kg: Some(68.8),
        fluid_intake_liters: 1.5,
        workout_type: WorkoutType::Distance,
        distance_km: Some(10.0),
        intensity_level: IntensityLevel::High,
        ..WorkoutMetrics::new(45.0, 175)
    };
    let (_, recommendation) = tracker.recommend(&runner, ten_k, Some(hot), None)?;
    writeln!(writer, "{recommendation}")?;
    writeln!(writer)?;

    writeln!(writer, "=== Example 2: easy indoor run ===")?;
    let mild = EnvironmentalData::new(70.0, 40.0).with_location("indoor");
    writeln!(writer, "Conditions: {}", describe_conditions(&mild))?;
    let easy = WorkoutMetrics {
        pre_workout_weight_kg: Some(60.0),
        post_workout_weight_kg: Some(59.95),
        fluid_intake_liters: 0.3,
        ..WorkoutMetrics::new(45.0, 140)
    };
    let (_, recommendation) = tracker.recommend(&sprinter, easy, Some(mild), None)?;
    writeln!(writer, "{recommendation}")?;
    writeln!(writer)?;

    writeln!(writer, "=== Live session ===")?;
    let session = tracker.start_session(
        &runner,
        WorkoutMetrics::new(1.0, 120),
        Some(EnvironmentalData::new(88.0, 55.0).with_location("track")),
        None,
    )?;
    writeln!(writer, "Session {session} started")?;

    let checkpoints = [
        (Duration::minutes(20), 20.0, 150),
        (Duration::minutes(5), 25.0, 160),
        (Duration::minutes(11), 36.0, 168),
    ];
    for (step, minutes, heart_rate) in checkpoints {
        clock.advance(step);
        let update = tracker.update_session(&session, WorkoutMetrics::new(minutes, heart_rate))?;
        match update {
            Some(rec) => writeln!(
                writer,
                "[{minutes:.0} min] drink {:.2} L of {} ({})",
                rec.volume_liters,
                rec.drink_type.display_name(),
                rec.urgency
            )?,
            None => writeln!(writer, "[{minutes:.0} min] no new recommendation (cooldown)")?,
        }
    }

    clock.advance(Duration::minutes(9));
    let (workout, recommendation) = tracker.end_session(
        &session,
        WorkoutMetrics {
            pre_workout_weight_kg: Some(70.0),
            post_workout_weight_kg: Some(69.1),
            fluid_intake_liters: 0.4,
            intensity_level: IntensityLevel::High,
            ..WorkoutMetrics::new(45.0, 170)
        },
    )?;
    writeln!(
        writer,
        "Session ended after {:.0} minutes",
        workout.metrics.duration_minutes
    )?;
    writeln!(writer, "{recommendation}")?;
    writeln!(writer)?;
    writeln!(
        writer,
        "Recorded {} workouts across {} athletes",
        tracker.workout_count(),
        tracker.athletes().len()
    )?;
    Ok(())
}

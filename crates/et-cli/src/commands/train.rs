//! Train command for fitting the prediction models on recorded workouts.

use std::io::Write;

use anyhow::{Context, Result};
use et_core::TrainingReport;

use crate::Config;
use crate::commands::util::{open_database, restore_tracker};

pub fn run<W: Write>(
    writer: &mut W,
    min_workouts: Option<usize>,
    config: &Config,
) -> Result<TrainingReport> {
    let db = open_database(config)?;
    let tracker = restore_tracker(&db, None)?;
    let min_workouts = min_workouts.unwrap_or(config.min_training_workouts);

    let report = tracker
        .train_model(min_workouts)
        .context("training failed")?;
    tracker
        .save_model(&config.model_path)
        .context("failed to save model")?;

    writeln!(writer, "Trained on {} workouts", report.samples_trained)?;
    writeln!(writer, "Volume MAE: {:.3} L", report.volume_mae)?;
    writeln!(writer, "Drink-type MAE: {:.3}", report.drink_type_mae)?;
    writeln!(writer, "Model saved to {}", config.model_path.display())?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, TimeZone, Utc};
    use et_core::{
        ActivityLevel, Athlete, AthleteId, AthleteProfile, EnvironmentalData, Gender,
        HydrationPredictor, Workout, WorkoutId, WorkoutMetrics,
    };

    fn setup(workouts: u32) -> (tempfile::TempDir, Config) {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: temp.path().join("et.db"),
            model_path: temp.path().join("models").join("model.json"),
            ..Config::default()
        };

        let db = et_db::Database::open(&config.database_path).unwrap();
        let athlete_id = AthleteId::new("athlete_001").unwrap();
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 7, 0, 0).unwrap();
        db.upsert_athlete(&Athlete::new(
            athlete_id.clone(),
            AthleteProfile::new(25, Gender::Male, 70.0, 175.0, ActivityLevel::Competitive),
            start,
        ))
        .unwrap();

        for i in 0..workouts {
            db.insert_workout(&Workout {
                id: WorkoutId::new(format!("w{i:02}")).unwrap(),
                athlete_id: athlete_id.clone(),
                metrics: WorkoutMetrics {
                    pre_workout_weight_kg: Some(70.0),
                    post_workout_weight_kg: Some(69.6 - f64::from(i % 4) * 0.3),
                    fluid_intake_liters: 0.25,
                    ..WorkoutMetrics::new(40.0 + f64::from(i) * 2.0, 140 + i)
                },
                environment: EnvironmentalData::new(65.0 + f64::from(i % 5) * 5.0, 50.0),
                timestamp: start + Duration::days(i64::from(i)),
                recommendation: None,
            })
            .unwrap();
        }
        (temp, config)
    }

    #[test]
    fn train_saves_model() {
        let (_temp, config) = setup(12);
        let mut output = Vec::new();
        let report = run(&mut output, None, &config).unwrap();

        assert_eq!(report.samples_trained, 12);
        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("Trained on 12 workouts\n"));
        assert!(output.contains("Model saved to"));

        let predictor = HydrationPredictor::from_path(&config.model_path).unwrap();
        assert!(predictor.is_trained());
    }

    #[test]
    fn train_requires_minimum_workouts() {
        let (_temp, config) = setup(3);
        let err = run(&mut Vec::new(), None, &config).unwrap_err();
        assert!(format!("{err:#}").contains("need at least 10 workouts, have 3"));
        assert!(!config.model_path.exists());

        let report = run(&mut Vec::new(), Some(3), &config).unwrap();
        assert_eq!(report.samples_trained, 3);
        assert!(config.model_path.exists());
    }
}

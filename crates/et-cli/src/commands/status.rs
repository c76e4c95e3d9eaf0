//! Status command for showing stored data and model state.

use std::io::Write;

use anyhow::{Context, Result};
use et_core::HydrationPredictor;

use crate::Config;
use crate::commands::util::open_database;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let summary = db.summary().context("failed to read database summary")?;

    writeln!(writer, "ElectroTrack status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;
    writeln!(writer, "Athletes: {}", summary.athletes)?;
    writeln!(writer, "Workouts: {}", summary.workouts)?;
    if let Some(last) = summary.last_workout_at {
        writeln!(writer, "Last workout: {}", last.format("%Y-%m-%d %H:%M UTC"))?;
    }

    let model = if config.model_path.exists() {
        match HydrationPredictor::from_path(&config.model_path) {
            Ok(predictor) if predictor.is_trained() => "trained",
            Ok(_) => "untrained (rule-based recommendations)",
            Err(err) => {
                tracing::warn!(error = %err, "saved model is unreadable");
                "unreadable (rule-based recommendations)"
            }
        }
    } else {
        "none (rule-based recommendations)"
    };
    writeln!(writer, "Model: {model}")?;
    writeln!(
        writer,
        "Minimum workouts for training: {}",
        config.min_training_workouts
    )?;

    Ok(())
}

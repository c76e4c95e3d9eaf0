//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use et_core::{ActivityLevel, AthleteId, Gender, IntensityLevel, WorkoutType};

/// Personalized post-workout hydration recommendations.
///
/// Records athletes and workouts, recommends how much and what to drink, and
/// learns from the recorded workouts once enough have accumulated.
#[derive(Debug, Parser)]
#[command(name = "et", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Register an athlete or update their profile.
    Register(RegisterArgs),

    /// Recommend rehydration for a completed workout and record it.
    Recommend(RecommendArgs),

    /// Train the prediction models on all recorded workouts.
    Train {
        /// Minimum number of recorded workouts required (defaults to config).
        #[arg(long)]
        min_workouts: Option<usize>,
    },

    /// Show database and model status.
    Status,

    /// Walk through sample athletes and a live session without touching storage.
    Demo,
}

/// Arguments for `et register`.
#[derive(Debug, Clone, Args)]
pub struct RegisterArgs {
    /// Athlete ID (e.g. `athlete_001`).
    #[arg(long)]
    pub id: AthleteId,

    /// Age in years.
    #[arg(long)]
    pub age: u32,

    /// Gender: M, F or Other.
    #[arg(long)]
    pub gender: Gender,

    /// Body weight in kilograms.
    #[arg(long)]
    pub weight_kg: f64,

    /// Height in centimeters.
    #[arg(long)]
    pub height_cm: f64,

    /// Activity level: recreational, competitive or elite.
    #[arg(long)]
    pub activity_level: ActivityLevel,

    /// Measured sweat rate in liters per hour.
    #[arg(long)]
    pub sweat_rate: Option<f64>,

    /// Measured sweat sodium concentration in mg per liter.
    #[arg(long)]
    pub sodium_loss: Option<f64>,

    /// Resting heart rate in bpm.
    #[arg(long)]
    pub baseline_hr: Option<u32>,
}

/// Arguments for `et recommend`.
#[derive(Debug, Clone, Args)]
pub struct RecommendArgs {
    /// Athlete ID.
    #[arg(long)]
    pub athlete: AthleteId,

    /// Workout duration in minutes.
    #[arg(long)]
    pub duration: f64,

    /// Average heart rate in bpm.
    #[arg(long)]
    pub avg_hr: u32,

    /// Maximum heart rate in bpm.
    #[arg(long)]
    pub max_hr: Option<u32>,

    /// Body weight before the workout (kg).
    #[arg(long)]
    pub pre_weight: Option<f64>,

    /// Body weight after the workout (kg).
    #[arg(long)]
    pub post_weight: Option<f64>,

    /// Fluid consumed during the workout (L).
    #[arg(long, default_value_t = 0.0)]
    pub intake: f64,

    /// Workout type (e.g. running, distance, interval).
    #[arg(long, default_value = "running")]
    pub workout_type: WorkoutType,

    /// Distance covered in kilometers.
    #[arg(long)]
    pub distance: Option<f64>,

    /// Intensity: low, moderate, high or extreme.
    #[arg(long, default_value = "moderate")]
    pub intensity: IntensityLevel,

    /// Temperature in °F; skips the weather lookup.
    #[arg(long, requires = "humidity")]
    pub temperature: Option<f64>,

    /// Relative humidity in percent.
    #[arg(long, requires = "temperature")]
    pub humidity: Option<f64>,

    /// Wind speed in mph.
    #[arg(long)]
    pub wind: Option<f64>,

    /// Location for the weather lookup, or a label such as "indoor".
    #[arg(long)]
    pub location: Option<String>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

//! Core hydration-prediction engine.
//!
//! This crate contains the domain model and logic for:
//! - Feature extraction: turning athlete, workout and conditions into a fixed vector
//! - Prediction: random-forest models with a rule-based fallback
//! - Sessions: live workouts with rate-limited in-workout recommendations
//! - Tracking: athlete registry, workout log and model lifecycle

pub mod advice;
pub mod athlete;
pub mod clock;
pub mod conditions;
pub mod features;
pub mod forest;
pub mod predictor;
pub mod recommendation;
mod scaler;
pub mod session;
pub mod tracker;
pub mod types;
pub mod workout;

pub use athlete::{ActivityLevel, Athlete, AthleteProfile, Gender};
pub use clock::{Clock, ManualClock, SystemClock};
pub use conditions::{ConditionsProvider, ConditionsSource, Units};
pub use forest::ForestConfig;
pub use predictor::{HydrationPredictor, PredictorError, TrainingReport};
pub use recommendation::{DrinkType, HydrationRecommendation, Urgency};
pub use session::{SessionError, SessionProcessor, SessionStatus, WorkoutSession};
pub use tracker::{Tracker, TrackerError};
pub use types::{AthleteId, SessionId, ValidationError, WorkoutId};
pub use workout::{EnvironmentalData, IntensityLevel, Workout, WorkoutMetrics, WorkoutType};

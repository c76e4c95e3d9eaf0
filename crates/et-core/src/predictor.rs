//! Hydration predictor: trainable models with a rule-based fallback.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::advice;
use crate::athlete::Athlete;
use crate::features::{FEATURE_COUNT, extract_features};
use crate::forest::{ForestConfig, RandomForest};
use crate::recommendation::{DrinkType, HydrationRecommendation};
use crate::scaler::StandardScaler;
use crate::types::AthleteId;
use crate::workout::{EnvironmentalData, Workout, WorkoutMetrics};

/// Version of the persisted model bundle layout.
const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PredictorError {
    /// Not enough workouts to train on.
    #[error("insufficient training data: need at least {required} workouts, have {available}")]
    InsufficientData { required: usize, available: usize },
    /// A saved model could not be read or understood.
    #[error("failed to load model from {}: {reason}", path.display())]
    ModelLoad { path: PathBuf, reason: String },
    /// The model could not be written.
    #[error("failed to save model to {}", path.display())]
    ModelSave {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode model: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Fit quality reported after training.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Mean absolute error of the volume model on its own training set.
    pub volume_mae: f64,
    /// Mean absolute error of the drink-intensity model on its own training set.
    pub drink_type_mae: f64,
    pub samples_trained: usize,
}

/// Fitted state of a trained predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    scaler: StandardScaler,
    volume: RandomForest,
    drink_intensity: RandomForest,
}

impl TrainedModel {
    fn predict_raw(&self, features: &[f64]) -> (f64, f64) {
        let scaled = self.scaler.transform(features);
        (
            self.volume.predict(&scaled),
            self.drink_intensity.predict(&scaled),
        )
    }
}

/// Whether the predictor has learned from data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Model {
    #[default]
    Untrained,
    Trained(TrainedModel),
}

#[derive(Serialize, Deserialize)]
struct ModelBundle {
    format_version: u32,
    feature_count: usize,
    model: Model,
}

/// Predicts hydration needs for a workout.
///
/// Until [`train`](Self::train) succeeds (or a trained model is
/// [`load`](Self::load)ed), predictions come from deterministic physiology
/// rules. Once trained, a pair of random forests predicts the replacement
/// volume and a drink-intensity score.
#[derive(Debug, Clone, Default)]
pub struct HydrationPredictor {
    model: Model,
    forest_config: ForestConfig,
}

impl HydrationPredictor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses custom forest hyperparameters for future training.
    #[must_use]
    pub fn with_forest_config(mut self, config: ForestConfig) -> Self {
        self.forest_config = config;
        self
    }

    /// Creates a predictor from a saved model file.
    pub fn from_path(path: &Path) -> Result<Self, PredictorError> {
        let mut predictor = Self::new();
        predictor.load(path)?;
        Ok(predictor)
    }

    pub const fn is_trained(&self) -> bool {
        matches!(self.model, Model::Trained(_))
    }

    pub const fn model(&self) -> &Model {
        &self.model
    }

    /// Trains both models on completed workouts.
    ///
    /// Workouts whose athlete is not in `athletes` are skipped. Fails without
    /// touching the current model when no usable workout remains.
    pub fn train<'a, I>(
        &mut self,
        athletes: I,
        workouts: &[Workout],
    ) -> Result<TrainingReport, PredictorError>
    where
        I: IntoIterator<Item = &'a Athlete>,
    {
        if workouts.is_empty() {
            return Err(PredictorError::InsufficientData {
                required: 1,
                available: 0,
            });
        }

        let by_id: HashMap<&AthleteId, &Athlete> =
            athletes.into_iter().map(|a| (&a.id, a)).collect();

        let mut rows: Vec<Vec<f64>> = Vec::with_capacity(workouts.len());
        let mut volume_targets = Vec::with_capacity(workouts.len());
        let mut drink_targets = Vec::with_capacity(workouts.len());

        for workout in workouts {
            let Some(athlete) = by_id.get(&workout.athlete_id) else {
                tracing::trace!(
                    workout_id = %workout.id,
                    athlete_id = %workout.athlete_id,
                    "skipping workout for unknown athlete"
                );
                continue;
            };

            rows.push(extract_features(athlete, &workout.metrics, &workout.environment).to_vec());
            volume_targets.push(advice::volume_target(&workout.metrics));
            let sodium = advice::estimate_sodium_loss_mg(&workout.metrics, &workout.environment);
            drink_targets.push(DrinkType::from_sodium_loss_mg(sodium).intensity_score());
        }

        let skipped = workouts.len() - rows.len();
        let insufficient = || PredictorError::InsufficientData {
            required: 1,
            available: 0,
        };
        let scaler = StandardScaler::fit(&rows).ok_or_else(insufficient)?;
        let scaled: Vec<Vec<f64>> = rows.iter().map(|r| scaler.transform(r)).collect();

        let volume = RandomForest::fit(&scaled, &volume_targets, self.forest_config)
            .ok_or_else(insufficient)?;
        let drink_intensity = RandomForest::fit(&scaled, &drink_targets, self.forest_config)
            .ok_or_else(insufficient)?;

        let report = TrainingReport {
            volume_mae: mean_absolute_error(&volume, &scaled, &volume_targets),
            drink_type_mae: mean_absolute_error(&drink_intensity, &scaled, &drink_targets),
            samples_trained: scaled.len(),
        };

        self.model = Model::Trained(TrainedModel {
            scaler,
            volume,
            drink_intensity,
        });

        tracing::info!(
            samples = report.samples_trained,
            skipped,
            volume_mae = report.volume_mae,
            drink_type_mae = report.drink_type_mae,
            "trained hydration models"
        );
        Ok(report)
    }

    /// Recommends rehydration for a workout.
    pub fn predict(
        &self,
        athlete: &Athlete,
        metrics: &WorkoutMetrics,
        environment: &EnvironmentalData,
    ) -> HydrationRecommendation {
        match &self.model {
            Model::Untrained => advice::rule_based_recommendation(athlete, metrics, environment),
            Model::Trained(model) => {
                let features = extract_features(athlete, metrics, environment);
                let (volume, intensity) = model.predict_raw(&features);
                let volume = volume.max(0.0);
                let drink_type = DrinkType::from_intensity_score(intensity);
                let urgency = advice::determine_urgency(metrics, environment, volume);

                HydrationRecommendation {
                    volume_liters: advice::round_volume(volume),
                    drink_type,
                    timing_minutes: advice::timing_for(urgency),
                    reasoning: advice::model_reasoning(metrics, environment, drink_type),
                    urgency,
                    future_suggestions: Some(advice::future_suggestions(metrics, environment)),
                }
            }
        }
    }

    /// Writes the model state to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), PredictorError> {
        let bundle = ModelBundle {
            format_version: MODEL_FORMAT_VERSION,
            feature_count: FEATURE_COUNT,
            model: self.model.clone(),
        };
        let json = serde_json::to_vec(&bundle)?;

        let save_err = |source| PredictorError::ModelSave {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(save_err)?;
        }
        fs::write(path, json).map_err(save_err)?;

        tracing::debug!(path = %path.display(), trained = self.is_trained(), "saved model");
        Ok(())
    }

    /// Replaces the model state with the one saved at `path`.
    ///
    /// On failure the current state is left untouched.
    pub fn load(&mut self, path: &Path) -> Result<(), PredictorError> {
        let load_err = |reason: String| PredictorError::ModelLoad {
            path: path.to_path_buf(),
            reason,
        };

        let bytes = fs::read(path).map_err(|e| load_err(e.to_string()))?;
        let bundle: ModelBundle =
            serde_json::from_slice(&bytes).map_err(|e| load_err(e.to_string()))?;

        if bundle.format_version != MODEL_FORMAT_VERSION {
            return Err(load_err(format!(
                "unsupported format version {}",
                bundle.format_version
            )));
        }
        if bundle.feature_count != FEATURE_COUNT {
            return Err(load_err(format!(
                "model expects {} features, extractor produces {FEATURE_COUNT}",
                bundle.feature_count
            )));
        }
        if let Model::Trained(model) = &bundle.model {
            if model.scaler.width() != FEATURE_COUNT {
                return Err(load_err(format!(
                    "scaler was fitted on {} features",
                    model.scaler.width()
                )));
            }
            model
                .volume
                .validate(FEATURE_COUNT)
                .map_err(|e| load_err(format!("volume model: {e}")))?;
            model
                .drink_intensity
                .validate(FEATURE_COUNT)
                .map_err(|e| load_err(format!("drink model: {e}")))?;
        }

        self.model = bundle.model;
        tracing::debug!(path = %path.display(), trained = self.is_trained(), "loaded model");
        Ok(())
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "training sets are far below 2^52 rows"
)]
fn mean_absolute_error(forest: &RandomForest, rows: &[Vec<f64>], targets: &[f64]) -> f64 {
    let total: f64 = rows
        .iter()
        .zip(targets)
        .map(|(row, target)| (forest.predict(row) - target).abs())
        .sum();
    total / rows.len() as f64
}

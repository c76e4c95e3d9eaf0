//! The entry point tying athletes, workouts, the predictor and sessions
//! together.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use thiserror::Error;

use crate::athlete::{Athlete, AthleteProfile};
use crate::clock::Clock;
use crate::conditions::{ConditionsProvider, ConditionsSource};
use crate::forest::ForestConfig;
use crate::predictor::{HydrationPredictor, PredictorError, TrainingReport};
use crate::recommendation::HydrationRecommendation;
use crate::session::{SessionError, SessionProcessor, SessionStatus};
use crate::types::{AthleteId, SessionId, ValidationError, WorkoutId};
use crate::workout::{EnvironmentalData, Workout, WorkoutMetrics};

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("athlete not found: {0}")]
    AthleteNotFound(AthleteId),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Predictor(#[from] PredictorError),
}

#[derive(Debug, Default)]
struct Registry {
    athletes: HashMap<AthleteId, Arc<Athlete>>,
    workouts: Vec<Workout>,
}

impl Registry {
    fn record(&mut self, workout: Workout) {
        if let Some(athlete) = self.athletes.get_mut(&workout.athlete_id) {
            Arc::make_mut(athlete).record_workout(workout.clone());
        }
        self.workouts.push(workout);
    }
}

/// Tracks athletes and their workouts and serves hydration recommendations.
///
/// All methods take `&self`; the tracker can be shared across threads.
#[derive(Debug)]
pub struct Tracker {
    registry: Mutex<Registry>,
    predictor: Arc<RwLock<HydrationPredictor>>,
    sessions: SessionProcessor,
    provider: Option<Arc<dyn ConditionsProvider>>,
    clock: Arc<dyn Clock>,
    forest_config: ForestConfig,
}

impl Tracker {
    pub fn new(provider: Option<Arc<dyn ConditionsProvider>>, clock: Arc<dyn Clock>) -> Self {
        Self::with_predictor(HydrationPredictor::new(), provider, clock)
    }

    /// Creates a tracker around an existing (possibly trained) predictor.
    pub fn with_predictor(
        predictor: HydrationPredictor,
        provider: Option<Arc<dyn ConditionsProvider>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let predictor = Arc::new(RwLock::new(predictor));
        let sessions = SessionProcessor::new(predictor.clone(), provider.clone(), clock.clone());
        Self {
            registry: Mutex::new(Registry::default()),
            predictor,
            sessions,
            provider,
            clock,
            forest_config: ForestConfig::default(),
        }
    }

    /// Uses custom forest hyperparameters for [`train_model`](Self::train_model).
    #[must_use]
    pub fn with_forest_config(mut self, config: ForestConfig) -> Self {
        self.forest_config = config;
        self
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn athlete_snapshot(&self, id: &AthleteId) -> Result<Arc<Athlete>, TrackerError> {
        self.registry()
            .athletes
            .get(id)
            .cloned()
            .ok_or_else(|| TrackerError::AthleteNotFound(id.clone()))
    }

    /// Registers an athlete, or replaces the profile of an existing one.
    ///
    /// Re-registering keeps the athlete's creation time and workout history.
    pub fn register_athlete(
        &self,
        id: AthleteId,
        profile: AthleteProfile,
    ) -> Result<Arc<Athlete>, TrackerError> {
        profile.validate()?;

        let mut registry = self.registry();
        let athlete = match registry.athletes.get_mut(&id) {
            Some(existing) => {
                Arc::make_mut(existing).profile = profile;
                tracing::debug!(athlete_id = %id, "athlete profile updated");
                existing.clone()
            }
            None => {
                let athlete = Arc::new(Athlete::new(id.clone(), profile, self.clock.now()));
                registry.athletes.insert(id.clone(), athlete.clone());
                tracing::debug!(athlete_id = %id, "athlete registered");
                athlete
            }
        };
        Ok(athlete)
    }

    pub fn athlete(&self, id: &AthleteId) -> Option<Arc<Athlete>> {
        self.registry().athletes.get(id).cloned()
    }

    /// All registered athletes ordered by id.
    pub fn athletes(&self) -> Vec<Arc<Athlete>> {
        let mut athletes: Vec<_> = self.registry().athletes.values().cloned().collect();
        athletes.sort_by(|a, b| a.id.cmp(&b.id));
        athletes
    }

    /// Every recorded workout, in recording order.
    pub fn workouts(&self) -> Vec<Workout> {
        self.registry().workouts.clone()
    }

    pub fn workout_count(&self) -> usize {
        self.registry().workouts.len()
    }

    pub fn is_model_trained(&self) -> bool {
        self.predictor
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_trained()
    }

    fn validate_inputs(
        metrics: &WorkoutMetrics,
        environment: Option<&EnvironmentalData>,
    ) -> Result<(), ValidationError> {
        metrics.validate()?;
        environment.map_or(Ok(()), EnvironmentalData::validate)
    }

    /// Recommends post-workout rehydration and records the workout.
    ///
    /// Conditions come from `environment` if given, otherwise from the
    /// provider for `location`, otherwise moderate defaults.
    pub fn recommend(
        &self,
        athlete_id: &AthleteId,
        metrics: WorkoutMetrics,
        environment: Option<EnvironmentalData>,
        location: Option<&str>,
    ) -> Result<(Workout, HydrationRecommendation), TrackerError> {
        Self::validate_inputs(&metrics, environment.as_ref())?;
        let athlete = self.athlete_snapshot(athlete_id)?;

        let environment = ConditionsSource::from_parts(environment, location)
            .resolve(self.provider.as_deref());

        let recommendation = self
            .predictor
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .predict(&athlete, &metrics, &environment);

        let workout = Workout {
            id: WorkoutId::generate(),
            athlete_id: athlete_id.clone(),
            metrics,
            environment,
            timestamp: self.clock.now(),
            recommendation: Some(recommendation.clone()),
        };
        self.registry().record(workout.clone());

        tracing::debug!(
            athlete_id = %athlete_id,
            workout_id = %workout.id,
            volume_l = recommendation.volume_liters,
            drink = %recommendation.drink_type,
            urgency = %recommendation.urgency,
            "recommendation issued"
        );
        Ok((workout, recommendation))
    }

    /// Opens a live session for a registered athlete.
    pub fn start_session(
        &self,
        athlete_id: &AthleteId,
        metrics: WorkoutMetrics,
        environment: Option<EnvironmentalData>,
        location: Option<&str>,
    ) -> Result<SessionId, TrackerError> {
        Self::validate_inputs(&metrics, environment.as_ref())?;
        let athlete = self.athlete_snapshot(athlete_id)?;
        let source = ConditionsSource::from_parts(environment, location);
        Ok(self.sessions.start(athlete, metrics, source))
    }

    /// Feeds new metrics into a session; returns a recommendation when the
    /// cooldown allows one. Unknown sessions yield `Ok(None)`.
    pub fn update_session(
        &self,
        id: &SessionId,
        metrics: WorkoutMetrics,
    ) -> Result<Option<HydrationRecommendation>, TrackerError> {
        metrics.validate()?;
        Ok(self.sessions.update(id, metrics))
    }

    /// Closes a session and records the completed workout.
    pub fn end_session(
        &self,
        id: &SessionId,
        metrics: WorkoutMetrics,
    ) -> Result<(Workout, HydrationRecommendation), TrackerError> {
        metrics.validate()?;
        let (workout, recommendation) = self.sessions.end(id, metrics)?;
        self.registry().record(workout.clone());
        Ok((workout, recommendation))
    }

    pub fn session_status(&self, id: &SessionId) -> Option<SessionStatus> {
        self.sessions.status(id)
    }

    pub fn active_sessions(&self) -> Vec<SessionId> {
        self.sessions.active_sessions()
    }

    /// Trains a fresh predictor on every recorded workout and swaps it in.
    ///
    /// Fails with [`PredictorError::InsufficientData`] when fewer than
    /// `min_workouts` workouts are recorded; the current model stays in place
    /// on any failure.
    pub fn train_model(&self, min_workouts: usize) -> Result<TrainingReport, TrackerError> {
        let (athletes, workouts) = {
            let registry = self.registry();
            let athletes: Vec<Arc<Athlete>> = registry.athletes.values().cloned().collect();
            (athletes, registry.workouts.clone())
        };

        if workouts.len() < min_workouts {
            return Err(PredictorError::InsufficientData {
                required: min_workouts,
                available: workouts.len(),
            }
            .into());
        }

        let mut fresh = HydrationPredictor::new().with_forest_config(self.forest_config);
        let report = fresh.train(athletes.iter().map(Arc::as_ref), &workouts)?;

        *self.predictor.write().unwrap_or_else(PoisonError::into_inner) = fresh;
        Ok(report)
    }

    pub fn save_model(&self, path: &Path) -> Result<(), TrackerError> {
        self.predictor
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .save(path)?;
        Ok(())
    }

    /// Loads a saved model; the current model is kept if loading fails.
    pub fn load_model(&self, path: &Path) -> Result<(), TrackerError> {
        let loaded = HydrationPredictor::from_path(path)
            .map(|p| p.with_forest_config(self.forest_config))
            .inspect_err(|e| tracing::warn!(error = %e, "keeping current model"))?;
        *self.predictor.write().unwrap_or_else(PoisonError::into_inner) = loaded;
        Ok(())
    }

    /// Replaces all athletes and workouts, e.g. with state read from storage.
    ///
    /// Athletes are expected to carry their own workout histories.
    pub fn restore(&self, athletes: Vec<Athlete>, workouts: Vec<Workout>) {
        let mut registry = self.registry();
        registry.athletes = athletes
            .into_iter()
            .map(|a| (a.id.clone(), Arc::new(a)))
            .collect();
        registry.workouts = workouts;
        tracing::debug!(
            athletes = registry.athletes.len(),
            workouts = registry.workouts.len(),
            "tracker state restored"
        );
    }
}

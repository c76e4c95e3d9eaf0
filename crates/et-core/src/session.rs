//! Live workout sessions with rate-limited in-workout recommendations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::athlete::Athlete;
use crate::clock::Clock;
use crate::conditions::{ConditionsProvider, ConditionsSource};
use crate::predictor::HydrationPredictor;
use crate::recommendation::HydrationRecommendation;
use crate::types::{AthleteId, SessionId};
use crate::workout::{EnvironmentalData, Workout, WorkoutMetrics};

/// Minimum gap between two in-workout recommendations.
pub const RECOMMENDATION_COOLDOWN_SECS: i64 = 900;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(SessionId),
}

/// An in-progress workout.
#[derive(Debug, Clone)]
pub struct WorkoutSession {
    id: SessionId,
    athlete: Arc<Athlete>,
    metrics: WorkoutMetrics,
    environment: EnvironmentalData,
    started_at: DateTime<Utc>,
    last_recommended_at: Option<DateTime<Utc>>,
    recommendations: Vec<HydrationRecommendation>,
}

impl WorkoutSession {
    /// Whether an in-workout recommendation may be issued at `now`.
    ///
    /// The first request always passes; later ones pass only once strictly
    /// more than the cooldown has elapsed since the last issuance.
    pub fn should_recommend(&self, now: DateTime<Utc>) -> bool {
        self.last_recommended_at.is_none_or(|last| {
            now - last > Duration::seconds(RECOMMENDATION_COOLDOWN_SECS)
        })
    }

    fn record(&mut self, recommendation: HydrationRecommendation, at: DateTime<Utc>) {
        self.last_recommended_at = Some(at);
        self.recommendations.push(recommendation);
    }

    pub const fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn athlete(&self) -> &Athlete {
        &self.athlete
    }

    pub const fn metrics(&self) -> &WorkoutMetrics {
        &self.metrics
    }

    pub const fn environment(&self) -> &EnvironmentalData {
        &self.environment
    }

    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn recommendations(&self) -> &[HydrationRecommendation] {
        &self.recommendations
    }
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub session_id: SessionId,
    pub athlete_id: AthleteId,
    pub started_at: DateTime<Utc>,
    pub elapsed_seconds: i64,
    pub metrics: WorkoutMetrics,
    pub environment: EnvironmentalData,
    pub recommendations_issued: usize,
}

/// Owns the registry of open sessions.
///
/// Every operation holds the registry lock for its whole read-modify-write
/// span, so the cooldown check and the issuance timestamp update are atomic.
/// The conditions provider is consulted before the lock is taken.
#[derive(Debug)]
pub struct SessionProcessor {
    predictor: Arc<RwLock<HydrationPredictor>>,
    provider: Option<Arc<dyn ConditionsProvider>>,
    clock: Arc<dyn Clock>,
    sessions: Mutex<HashMap<SessionId, WorkoutSession>>,
}

impl SessionProcessor {
    pub fn new(
        predictor: Arc<RwLock<HydrationPredictor>>,
        provider: Option<Arc<dyn ConditionsProvider>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            predictor,
            provider,
            clock,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, WorkoutSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn predict(&self, session: &WorkoutSession) -> HydrationRecommendation {
        self.predictor
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .predict(&session.athlete, &session.metrics, &session.environment)
    }

    /// Opens a session and returns its id.
    pub fn start(
        &self,
        athlete: Arc<Athlete>,
        metrics: WorkoutMetrics,
        conditions: ConditionsSource,
    ) -> SessionId {
        let environment = conditions.resolve(self.provider.as_deref());
        let id = SessionId::generate();
        let started_at = self.clock.now();

        tracing::debug!(
            session_id = %id,
            athlete_id = %athlete.id,
            temperature_f = environment.temperature_fahrenheit,
            "session started"
        );

        let session = WorkoutSession {
            id: id.clone(),
            athlete,
            metrics,
            environment,
            started_at,
            last_recommended_at: None,
            recommendations: Vec::new(),
        };
        self.sessions().insert(id.clone(), session);
        id
    }

    /// Replaces the session's metrics and issues a recommendation if the
    /// cooldown allows.
    ///
    /// Returns `None` for unknown sessions and while the cooldown is running.
    pub fn update(
        &self,
        id: &SessionId,
        metrics: WorkoutMetrics,
    ) -> Option<HydrationRecommendation> {
        let mut sessions = self.sessions();
        let session = sessions.get_mut(id)?;
        session.metrics = metrics;

        let now = self.clock.now();
        if !session.should_recommend(now) {
            tracing::trace!(session_id = %id, "recommendation suppressed by cooldown");
            return None;
        }

        let recommendation = self.predict(session);
        session.record(recommendation.clone(), now);
        tracing::debug!(
            session_id = %id,
            issued = session.recommendations.len(),
            volume_l = recommendation.volume_liters,
            "in-workout recommendation issued"
        );
        Some(recommendation)
    }

    /// Closes the session and returns the completed workout with its final
    /// recommendation.
    ///
    /// The workout reuses the session id and is stamped with the session's
    /// start time.
    pub fn end(
        &self,
        id: &SessionId,
        metrics: WorkoutMetrics,
    ) -> Result<(Workout, HydrationRecommendation), SessionError> {
        let mut sessions = self.sessions();
        let mut session = sessions
            .remove(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;
        session.metrics = metrics;

        let recommendation = self.predict(&session);
        session.record(recommendation.clone(), self.clock.now());
        drop(sessions);

        tracing::info!(
            session_id = %id,
            athlete_id = %session.athlete.id,
            issued = session.recommendations.len(),
            volume_l = recommendation.volume_liters,
            drink = %recommendation.drink_type,
            "session ended"
        );

        let workout = Workout {
            id: session.id.into(),
            athlete_id: session.athlete.id.clone(),
            metrics: session.metrics,
            environment: session.environment,
            timestamp: session.started_at,
            recommendation: Some(recommendation.clone()),
        };
        Ok((workout, recommendation))
    }

    pub fn status(&self, id: &SessionId) -> Option<SessionStatus> {
        let sessions = self.sessions();
        let session = sessions.get(id)?;
        Some(SessionStatus {
            session_id: session.id.clone(),
            athlete_id: session.athlete.id.clone(),
            started_at: session.started_at,
            elapsed_seconds: (self.clock.now() - session.started_at).num_seconds(),
            metrics: session.metrics.clone(),
            environment: session.environment.clone(),
            recommendations_issued: session.recommendations.len(),
        })
    }

    /// Ids of all open sessions.
    pub fn active_sessions(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions().keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::athlete::{ActivityLevel, AthleteProfile, Gender};
    use crate::clock::ManualClock;
    use crate::conditions::Units;
    use crate::workout::IntensityLevel;

    #[derive(Debug)]
    struct HotProvider;

    impl ConditionsProvider for HotProvider {
        fn current_conditions(&self, location: &str, _units: Units) -> Option<EnvironmentalData> {
            Some(EnvironmentalData::new(92.0, 65.0).with_location(location))
        }
    }

    fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 6, 0, 0).unwrap()
    }

    fn athlete() -> Arc<Athlete> {
        Arc::new(Athlete::new(
            AthleteId::new("athlete_002").unwrap(),
            AthleteProfile::new(32, Gender::Female, 58.0, 165.0, ActivityLevel::Recreational),
            start_time(),
        ))
    }

    fn metrics(minutes: f64) -> WorkoutMetrics {
        WorkoutMetrics {
            intensity_level: IntensityLevel::High,
            ..WorkoutMetrics::new(minutes, 150)
        }
    }

    fn processor(clock: Arc<ManualClock>) -> SessionProcessor {
        SessionProcessor::new(
            Arc::new(RwLock::new(HydrationPredictor::new())),
            Some(Arc::new(HotProvider)),
            clock,
        )
    }

    #[test]
    fn cooldown_gates_in_workout_recommendations() {
        let clock = Arc::new(ManualClock::new(start_time()));
        let sessions = processor(clock.clone());
        let id = sessions.start(athlete(), metrics(0.0), ConditionsSource::Unspecified);

        assert!(sessions.update(&id, metrics(5.0)).is_some());

        clock.advance(Duration::seconds(1));
        assert!(sessions.update(&id, metrics(5.0)).is_none());

        clock.advance(Duration::seconds(899));
        assert!(sessions.update(&id, metrics(20.0)).is_none());

        clock.advance(Duration::seconds(1));
        assert!(sessions.update(&id, metrics(20.0)).is_some());

        let status = sessions.status(&id).unwrap();
        assert_eq!(status.recommendations_issued, 2);
    }

    #[test]
    fn concurrent_updates_emit_once() {
        let clock = Arc::new(ManualClock::new(start_time()));
        let sessions = processor(clock);
        let id = sessions.start(athlete(), metrics(0.0), ConditionsSource::Unspecified);

        let emitted = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..32)
                .map(|i| {
                    let sessions = &sessions;
                    let id = &id;
                    scope.spawn(move || sessions.update(id, metrics(5.0 + f64::from(i))))
                })
                .collect();
            handles
                .into_iter()
                .filter_map(|h| h.join().unwrap())
                .count()
        });

        assert_eq!(emitted, 1);
        assert_eq!(sessions.status(&id).unwrap().recommendations_issued, 1);
    }

    #[test]
    fn update_after_901_seconds_emits() {
        let clock = Arc::new(ManualClock::new(start_time()));
        let sessions = processor(clock.clone());
        let id = sessions.start(athlete(), metrics(0.0), ConditionsSource::Unspecified);

        assert!(sessions.update(&id, metrics(5.0)).is_some());
        clock.advance(Duration::seconds(901));
        assert!(sessions.update(&id, metrics(20.0)).is_some());
    }

    #[test]
    fn end_always_emits_and_removes_session() {
        let clock = Arc::new(ManualClock::new(start_time()));
        let sessions = processor(clock.clone());
        let id = sessions.start(athlete(), metrics(0.0), ConditionsSource::Unspecified);

        assert!(sessions.update(&id, metrics(5.0)).is_some());
        clock.advance(Duration::seconds(1));

        let (workout, recommendation) = sessions.end(&id, metrics(30.0)).unwrap();
        assert_eq!(workout.id.as_str(), id.as_str());
        assert_eq!(workout.timestamp, start_time());
        assert_eq!(workout.recommendation.as_ref(), Some(&recommendation));
        assert!((workout.metrics.duration_minutes - 30.0).abs() < f64::EPSILON);

        assert!(sessions.status(&id).is_none());
        assert!(sessions.update(&id, metrics(31.0)).is_none());
        assert!(matches!(
            sessions.end(&id, metrics(31.0)),
            Err(SessionError::NotFound(_))
        ));
    }

    #[test]
    fn unknown_session_is_ignored() {
        let clock = Arc::new(ManualClock::new(start_time()));
        let sessions = processor(clock);
        let unknown = SessionId::new("nope").unwrap();
        assert!(sessions.update(&unknown, metrics(1.0)).is_none());
        assert!(sessions.status(&unknown).is_none());
    }

    #[test]
    fn start_resolves_conditions_by_location() {
        let clock = Arc::new(ManualClock::new(start_time()));
        let sessions = processor(clock);
        let id = sessions.start(
            athlete(),
            metrics(0.0),
            ConditionsSource::Location("Phoenix,AZ".into()),
        );
        let status = sessions.status(&id).unwrap();
        assert!((status.environment.temperature_fahrenheit - 92.0).abs() < f64::EPSILON);
        assert_eq!(status.environment.location.as_deref(), Some("Phoenix,AZ"));
    }

    #[test]
    fn status_reports_elapsed_time() {
        let clock = Arc::new(ManualClock::new(start_time()));
        let sessions = processor(clock.clone());
        let id = sessions.start(athlete(), metrics(0.0), ConditionsSource::Unspecified);
        clock.advance(Duration::minutes(12));

        let status = sessions.status(&id).unwrap();
        assert_eq!(status.elapsed_seconds, 720);
        assert_eq!(status.recommendations_issued, 0);
        assert_eq!(status.athlete_id.as_str(), "athlete_002");
        assert_eq!(sessions.active_sessions(), vec![id]);
    }

    #[test]
    fn sessions_are_independent() {
        let clock = Arc::new(ManualClock::new(start_time()));
        let sessions = processor(clock);
        let first = sessions.start(athlete(), metrics(0.0), ConditionsSource::Unspecified);
        let second = sessions.start(athlete(), metrics(0.0), ConditionsSource::Unspecified);
        assert_ne!(first, second);

        assert!(sessions.update(&first, metrics(5.0)).is_some());
        assert!(sessions.update(&second, metrics(5.0)).is_some());
        assert!(sessions.update(&first, metrics(6.0)).is_none());
    }
}

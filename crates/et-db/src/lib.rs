//! Storage layer for athletes and workouts.
//!
//! Provides persistence using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! Wrap it in a `Mutex` to share it between threads.
//!
//! # Schema
//!
//! Timestamps are stored as TEXT in RFC 3339 format with millisecond precision
//! (e.g., `2025-07-01T06:00:00.000Z`), so lexicographic order matches
//! chronological order.
//!
//! Profiles, metrics, conditions and recommendations are stored as JSON
//! payloads. Adding optional fields is backwards compatible; renaming or
//! removing fields requires a migration.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use et_core::{Athlete, AthleteId, AthleteProfile, Workout, WorkoutId};
use rusqlite::{Connection, OptionalExtension, Params, params};
use thiserror::Error;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to encode or decode a JSON payload column.
    #[error("invalid {column} payload for {record_id}")]
    Json {
        record_id: String,
        column: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for {record_id}: {timestamp}")]
    TimestampParse {
        record_id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored row does not describe a valid record.
    #[error("invalid record {record_id}: {message}")]
    InvalidRecord { record_id: String, message: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Row counts reported by `et status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub athletes: usize,
    pub workouts: usize,
    pub last_workout_at: Option<DateTime<Utc>>,
}

struct WorkoutRow {
    id: String,
    athlete_id: String,
    timestamp: String,
    metrics: String,
    environment: String,
    recommendation: Option<String>,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS athletes (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                profile TEXT NOT NULL
            );

            -- metrics / environment / recommendation: JSON payloads
            CREATE TABLE IF NOT EXISTS workouts (
                id TEXT PRIMARY KEY,
                athlete_id TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                metrics TEXT NOT NULL,
                environment TEXT NOT NULL,
                recommendation TEXT,
                FOREIGN KEY (athlete_id) REFERENCES athletes(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_workouts_timestamp ON workouts(timestamp);
            CREATE INDEX IF NOT EXISTS idx_workouts_athlete ON workouts(athlete_id);
            ",
        )?;
        Ok(())
    }

    /// Inserts an athlete or replaces the profile of an existing one.
    ///
    /// The stored creation time of an existing athlete is kept.
    pub fn upsert_athlete(&self, athlete: &Athlete) -> Result<(), DbError> {
        let profile = to_json(&athlete.profile, athlete.id.as_str(), "profile")?;
        let now = format_timestamp(Utc::now());
        self.conn.execute(
            "
            INSERT INTO athletes (id, created_at, updated_at, profile)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                profile = excluded.profile,
                updated_at = excluded.updated_at
            ",
            params![
                athlete.id.as_str(),
                format_timestamp(athlete.created_at),
                now,
                profile
            ],
        )?;
        Ok(())
    }

    /// Inserts a workout, ignoring duplicates by ID.
    ///
    /// Returns whether a row was written.
    pub fn insert_workout(&self, workout: &Workout) -> Result<bool, DbError> {
        let id = workout.id.as_str();
        let recommendation = workout
            .recommendation
            .as_ref()
            .map(|r| to_json(r, id, "recommendation"))
            .transpose()?;

        let inserted = self.conn.execute(
            "
            INSERT OR IGNORE INTO workouts
            (id, athlete_id, timestamp, metrics, environment, recommendation)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                id,
                workout.athlete_id.as_str(),
                format_timestamp(workout.timestamp),
                to_json(&workout.metrics, id, "metrics")?,
                to_json(&workout.environment, id, "environment")?,
                recommendation,
            ],
        )?;
        Ok(inserted > 0)
    }

    /// Lists all workouts ordered by timestamp then ID.
    pub fn workouts(&self) -> Result<Vec<Workout>, DbError> {
        self.query_workouts(
            "
            SELECT id, athlete_id, timestamp, metrics, environment, recommendation
            FROM workouts
            ORDER BY timestamp ASC, id ASC
            ",
            [],
        )
    }

    fn query_workouts<P: Params>(&self, sql: &str, params: P) -> Result<Vec<Workout>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok(WorkoutRow {
                id: row.get(0)?,
                athlete_id: row.get(1)?,
                timestamp: row.get(2)?,
                metrics: row.get(3)?,
                environment: row.get(4)?,
                recommendation: row.get(5)?,
            })
        })?;

        let mut workouts = Vec::new();
        for row in rows {
            workouts.push(row?.into_workout()?);
        }
        Ok(workouts)
    }

    /// Loads every athlete with their workout history, ordered by ID.
    pub fn load_athletes(&self) -> Result<Vec<Athlete>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, created_at, profile FROM athletes ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut athletes = Vec::new();
        for row in rows {
            let (id, created_at, profile) = row?;
            athletes.push(athlete_from_row(&id, &created_at, &profile)?);
        }

        for workout in self.workouts()? {
            if let Some(athlete) = athletes.iter_mut().find(|a| a.id == workout.athlete_id) {
                athlete.record_workout(workout);
            }
        }
        Ok(athletes)
    }

    /// Loads one athlete with their workout history.
    pub fn get_athlete(&self, id: &AthleteId) -> Result<Option<Athlete>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT created_at, profile FROM athletes WHERE id = ?1",
                params![id.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        let Some((created_at, profile)) = row else {
            return Ok(None);
        };

        let mut athlete = athlete_from_row(id.as_str(), &created_at, &profile)?;
        let history = self.query_workouts(
            "
            SELECT id, athlete_id, timestamp, metrics, environment, recommendation
            FROM workouts
            WHERE athlete_id = ?1
            ORDER BY timestamp ASC, id ASC
            ",
            params![id.as_str()],
        )?;
        for workout in history {
            athlete.record_workout(workout);
        }
        Ok(Some(athlete))
    }

    pub fn summary(&self) -> Result<Summary, DbError> {
        let athletes: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM athletes", [], |row| row.get(0))?;
        let (workouts, last): (i64, Option<String>) = self.conn.query_row(
            "SELECT COUNT(*), MAX(timestamp) FROM workouts",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(Summary {
            athletes: usize::try_from(athletes).unwrap_or_default(),
            workouts: usize::try_from(workouts).unwrap_or_default(),
            last_workout_at: last
                .map(|ts| parse_timestamp(&ts, "workouts"))
                .transpose()?,
        })
    }
}

impl WorkoutRow {
    fn into_workout(self) -> Result<Workout, DbError> {
        let id = WorkoutId::new(self.id.as_str()).map_err(|e| invalid(&self.id, &e))?;
        let athlete_id =
            AthleteId::new(self.athlete_id.as_str()).map_err(|e| invalid(&self.id, &e))?;
        let recommendation = self
            .recommendation
            .as_deref()
            .map(|r| from_json(r, &self.id, "recommendation"))
            .transpose()?;

        Ok(Workout {
            athlete_id,
            metrics: from_json(&self.metrics, &self.id, "metrics")?,
            environment: from_json(&self.environment, &self.id, "environment")?,
            timestamp: parse_timestamp(&self.timestamp, &self.id)?,
            recommendation,
            id,
        })
    }
}

fn athlete_from_row(id: &str, created_at: &str, profile: &str) -> Result<Athlete, DbError> {
    let athlete_id = AthleteId::new(id).map_err(|e| invalid(id, &e))?;
    let profile: AthleteProfile = from_json(profile, id, "profile")?;
    Ok(Athlete::new(
        athlete_id,
        profile,
        parse_timestamp(created_at, id)?,
    ))
}

fn invalid(record_id: &str, error: &impl std::fmt::Display) -> DbError {
    DbError::InvalidRecord {
        record_id: record_id.to_string(),
        message: error.to_string(),
    }
}

fn to_json<T: serde::Serialize>(
    value: &T,
    record_id: &str,
    column: &'static str,
) -> Result<String, DbError> {
    serde_json::to_string(value).map_err(|source| DbError::Json {
        record_id: record_id.to_string(),
        column,
        source,
    })
}

fn from_json<T: serde::de::DeserializeOwned>(
    json: &str,
    record_id: &str,
    column: &'static str,
) -> Result<T, DbError> {
    serde_json::from_str(json).map_err(|source| DbError::Json {
        record_id: record_id.to_string(),
        column,
        source,
    })
}

fn parse_timestamp(timestamp: &str, record_id: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            record_id: record_id.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

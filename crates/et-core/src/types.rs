//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for inputs entering the prediction engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A numeric field was outside its accepted range.
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },

    /// A categorical field had an unrecognised value.
    #[error("invalid {field}: {value}")]
    InvalidVariant { field: &'static str, value: String },
}

impl ValidationError {
    pub(crate) fn invalid_variant(field: &'static str, value: &str) -> Self {
        Self::InvalidVariant {
            field,
            value: value.to_string(),
        }
    }
}

/// Checks that `value` is finite and strictly positive.
pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            expected: "greater than 0",
        })
    }
}

/// Checks that `value` is finite and not negative.
pub(crate) fn require_non_negative(
    field: &'static str,
    value: f64,
) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            expected: "0 or greater",
        })
    }
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Creates a fresh random ID.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated athlete identifier.
    ///
    /// Athlete IDs are chosen by the caller at registration and never change.
    AthleteId, "athlete ID"
);

define_string_id!(
    /// A validated workout identifier.
    WorkoutId, "workout ID"
);

define_string_id!(
    /// A validated workout session identifier.
    ///
    /// Session IDs are generated when a session starts and double as the ID of
    /// the workout recorded when it ends.
    SessionId, "session ID"
);

impl From<SessionId> for WorkoutId {
    fn from(id: SessionId) -> Self {
        Self(id.0)
    }
}

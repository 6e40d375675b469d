use crate::types::WorkoutId;
use thiserror::Error;

/// Rejected form or constructor input. Nothing is created or stored when this
/// is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidInputError {
    #[error("{field} is not a number: {raw:?}")]
    NotANumber { field: &'static str, raw: String },
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },
    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must be a whole number (got {value})")]
    NotWhole { field: &'static str, value: f64 },
    #[error("{field} is out of range (got {value})")]
    OutOfRange { field: &'static str, value: f64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not get your position: {reason}")]
pub struct GeolocationError {
    pub reason: String,
}

impl GeolocationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("workout id {0} is already in the collection")]
    DuplicateId(WorkoutId),
    #[error("serializing workouts")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),
    #[error(transparent)]
    GeolocationUnavailable(#[from] GeolocationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{event} is not accepted in phase '{phase}'")]
    NotAccepted {
        event: &'static str,
        phase: &'static str,
    },
}

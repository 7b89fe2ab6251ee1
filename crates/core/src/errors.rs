use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error on `{field}`: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Requested window is not offerable: {0}")]
    SlotUnavailable(String),

    #[error("Requested window conflicts with an existing booking: {0}")]
    SlotConflict(String),

    #[error("Mentor availability profile is inactive")]
    ProfileInactive,

    #[error("Stale booking version: supplied {supplied}, current {current}")]
    StaleBooking { supplied: i64, current: i64 },

    #[error("Invalid booking transition: {0}")]
    InvalidTransition(String),

    #[error("Actor is not permitted to perform this operation: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),
}

impl EngineError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field,
            message: message.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

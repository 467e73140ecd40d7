//! Error types shared by the repositories, the identity exchange and the
//! transcription flow.

use thiserror::Error;

use crate::models::RecordingStatus;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("recording {0} not found")]
    RecordingNotFound(String),

    #[error("user {0} not found")]
    UserNotFound(String),

    #[error("recording {recording_id} cannot move from {from} to {to}")]
    InvalidTransition {
        recording_id: String,
        from: RecordingStatus,
        to: RecordingStatus,
    },

    #[error("recording {0} has ended and accepts no more chunks")]
    RecordingEnded(String),

    /// A stored value could not be mapped back into an application record
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Uniqueness or foreign-key failure
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailure(String),

    #[error("recording {recording_id} is assigned to {expected}, not {actual}")]
    ProviderMismatch {
        recording_id: String,
        expected: String,
        actual: String,
    },

    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("database schema version mismatch: expected {expected}, found {found}")]
    SchemaVersion { expected: String, found: String },

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() || db_err.is_foreign_key_violation() {
                return Error::IntegrityViolation(db_err.message().to_string());
            }
        }
        Error::Database(err)
    }
}

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

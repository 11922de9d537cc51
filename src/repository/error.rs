// ==========================================
// IPO Validation - Repository Errors
// ==========================================
// Run metadata (SQLite) and result artifact storage
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== database =====
    #[error("record not found: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("database connection failed: {0}")]
    DatabaseConnectionError(String),

    #[error("failed to acquire database lock: {0}")]
    LockError(String),

    #[error("database transaction failed: {0}")]
    DatabaseTransactionError(String),

    #[error("database query failed: {0}")]
    DatabaseQueryError(String),

    #[error("unique constraint violated: {0}")]
    UniqueConstraintViolation(String),

    // ===== lifecycle =====
    #[error("invalid status transition: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ===== stored values =====
    #[error("bad stored value (field={field}): {message}")]
    FieldValueError { field: String, message: String },

    // ===== result artifacts =====
    #[error("result artifact I/O failed: {0}")]
    ArtifactIo(String),

    #[error("result artifact format error: {0}")]
    ArtifactFormat(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

impl From<std::io::Error> for RepositoryError {
    fn from(err: std::io::Error) -> Self {
        RepositoryError::ArtifactIo(err.to_string())
    }
}

impl From<csv::Error> for RepositoryError {
    fn from(err: csv::Error) -> Self {
        RepositoryError::ArtifactFormat(err.to_string())
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

//! The module contains the errors the engine can throw.
//!
//! Storage errors are split into two classes for the retry policy:
//! transient contention errors (lock waits, pool exhaustion) are worth
//! retrying, everything else (constraint violations, missing rows) is
//! permanent and surfaces immediately.
use sea_orm::{DbErr, RuntimeErr};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid frequency: {0}")]
    InvalidFrequency(String),
    #[error("Recurrence error: {0}")]
    Recurrence(String),
    #[error("Materialization timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Whether this error is a retryable storage-contention failure.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Database(err) => db_err_is_transient(err),
            _ => false,
        }
    }
}

fn db_err_is_transient(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) => true,
        DbErr::Conn(RuntimeErr::SqlxError(_)) | DbErr::Exec(_) | DbErr::Query(_) => {
            let msg = err.to_string();
            msg.contains("database is locked")
                || msg.contains("database table is locked")
                || msg.contains("lock wait")
                || msg.contains("deadlock")
        }
        _ => false,
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidFrequency(a), Self::InvalidFrequency(b)) => a == b,
            (Self::Recurrence(a), Self::Recurrence(b)) => a == b,
            (Self::Timeout(a), Self::Timeout(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_database_is_transient() {
        let err = EngineError::Database(DbErr::Exec(RuntimeErr::Internal(
            "database is locked".to_string(),
        )));
        assert!(err.is_transient());
    }

    #[test]
    fn constraint_violation_is_permanent() {
        let err = EngineError::Database(DbErr::Exec(RuntimeErr::Internal(
            "FOREIGN KEY constraint failed".to_string(),
        )));
        assert!(!err.is_transient());
    }

    #[test]
    fn domain_errors_are_permanent() {
        assert!(!EngineError::KeyNotFound("wallet".to_string()).is_transient());
        assert!(!EngineError::InvalidFrequency("hourly".to_string()).is_transient());
    }
}

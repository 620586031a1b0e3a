//! Bounded retry for transient storage contention.
//!
//! The policy wraps one whole persistence attempt (the atomic unit of a
//! materialization). Only errors classified as transient are retried;
//! everything else surfaces on the first attempt.

use std::time::Duration;

use crate::ResultEngine;

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Run `op` until it succeeds, fails permanently, or exhausts the
    /// attempt budget.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> ResultEngine<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ResultEngine<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    tracing::warn!(
                        "transient storage error on attempt {attempt}/{}: {err}, retrying in {:?}",
                        self.max_attempts,
                        self.backoff
                    );
                    tokio::time::sleep(self.backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use sea_orm::{DbErr, RuntimeErr};

    use crate::EngineError;

    use super::*;

    fn transient() -> EngineError {
        EngineError::Database(DbErr::Exec(RuntimeErr::Internal(
            "database is locked".to_string(),
        )))
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_then_success_commit_once() {
        let committed: Mutex<Vec<u32>> = Mutex::new(Vec::new());
        let attempts = Mutex::new(0u32);

        let policy = RetryPolicy::default();
        let result = policy
            .run(|| async {
                let attempt = {
                    let mut guard = attempts.lock().unwrap();
                    *guard += 1;
                    *guard
                };
                if attempt <= 2 {
                    return Err(transient());
                }
                committed.lock().unwrap().push(attempt);
                Ok(attempt)
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(*attempts.lock().unwrap(), 3);
        // Failures happen before commit, so a retry never double-applies.
        assert_eq!(committed.lock().unwrap().as_slice(), &[3]);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_errors_are_not_retried() {
        let attempts = Mutex::new(0u32);

        let policy = RetryPolicy::default();
        let result: ResultEngine<()> = policy
            .run(|| async {
                *attempts.lock().unwrap() += 1;
                Err(EngineError::KeyNotFound("wallet".to_string()))
            })
            .await;

        assert_eq!(
            result.unwrap_err(),
            EngineError::KeyNotFound("wallet".to_string())
        );
        assert_eq!(*attempts.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_attempts_surface_last_error() {
        let attempts = Mutex::new(0u32);

        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        let result: ResultEngine<()> = policy
            .run(|| async {
                *attempts.lock().unwrap() += 1;
                Err(transient())
            })
            .await;

        assert!(result.unwrap_err().is_transient());
        assert_eq!(*attempts.lock().unwrap(), 3);
    }
}

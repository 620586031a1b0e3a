//! One scheduler tick: select everything due, materialize each item.
//!
//! Item failures never abort the tick; each one is logged with its
//! definition id and counted. Items are independent, so processing order
//! carries no correctness weight and they may fan out over a bounded
//! worker pool.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

use super::{Engine, MaterializationOutcome};

/// Outcome counts of one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    pub applied: usize,
    pub skipped_not_due: usize,
    pub skipped_inactive: usize,
    pub failed: usize,
}

impl TickSummary {
    pub fn processed(&self) -> usize {
        self.applied + self.skipped_not_due + self.skipped_inactive + self.failed
    }

    fn record(&mut self, definition_id: Uuid, result: ResultEngine<MaterializationOutcome>) {
        match result {
            Ok(MaterializationOutcome::Applied { .. }) => self.applied += 1,
            Ok(MaterializationOutcome::SkippedNotDue) => self.skipped_not_due += 1,
            Ok(MaterializationOutcome::SkippedInactive) => self.skipped_inactive += 1,
            Err(err) => {
                self.failed += 1;
                tracing::error!("materialization of definition {definition_id} failed: {err}");
            }
        }
    }
}

impl Engine {
    /// Process everything due at `as_of`.
    ///
    /// `as_of` is captured once by the caller so that items selected at
    /// the start of a long tick are still judged against the same
    /// instant.
    pub async fn run_tick(&self, as_of: DateTime<Utc>) -> TickSummary {
        let ids = match self.select_due(as_of).await {
            Ok(ids) => ids,
            Err(err) => {
                tracing::error!("due-item selection failed: {err}");
                return TickSummary::default();
            }
        };

        let mut summary = TickSummary::default();
        if self.config.workers <= 1 {
            for id in ids {
                let result = self.materialize_with_timeout(id, as_of).await;
                summary.record(id, result);
            }
        } else {
            let semaphore = Arc::new(Semaphore::new(self.config.workers));
            let mut tasks = JoinSet::new();
            for id in ids {
                let engine = self.clone();
                let semaphore = semaphore.clone();
                tasks.spawn(async move {
                    // The semaphore is never closed while tasks run.
                    let _permit = semaphore.acquire_owned().await.ok();
                    (id, engine.materialize_with_timeout(id, as_of).await)
                });
            }
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((id, result)) => summary.record(id, result),
                    Err(err) => {
                        summary.failed += 1;
                        tracing::error!("materialization task failed to join: {err}");
                    }
                }
            }
        }

        tracing::info!(
            "tick complete: applied={} skipped_not_due={} skipped_inactive={} failed={}",
            summary.applied,
            summary.skipped_not_due,
            summary.skipped_inactive,
            summary.failed
        );
        summary
    }

    /// A hung item (for example a lock that never resolves) is cut off
    /// and counted as failed instead of stalling the loop.
    async fn materialize_with_timeout(
        &self,
        definition_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> ResultEngine<MaterializationOutcome> {
        match self.config.item_timeout {
            Some(limit) => tokio::time::timeout(limit, self.materialize_one(definition_id, as_of))
                .await
                .unwrap_or(Err(EngineError::Timeout(limit))),
            None => self.materialize_one(definition_id, as_of).await,
        }
    }
}

//! The scheduler loop.
//!
//! An explicit object owning its timer and lifecycle: the host process
//! instantiates one [`Scheduler`], starts it, and stops it on shutdown.
//! Ticks run inline in the loop task, so two ticks can never overlap;
//! firings missed while a tick is still running are skipped rather than
//! queued. Shutdown lets the in-flight tick finish before the task exits.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::{Engine, TickSummary};

/// A unit of periodic work driven by the [`Scheduler`].
pub trait Job: Send + Sync + 'static {
    /// Execute one tick. `as_of` is captured once per tick by the loop.
    fn run(&self, as_of: DateTime<Utc>) -> impl Future<Output = TickSummary> + Send;
}

/// The engine's materialization work as a schedulable job.
#[derive(Clone, Debug)]
pub struct MaterializationJob {
    engine: Engine,
}

impl MaterializationJob {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }
}

impl Job for MaterializationJob {
    fn run(&self, as_of: DateTime<Utc>) -> impl Future<Output = TickSummary> + Send {
        self.engine.run_tick(as_of)
    }
}

#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Time between ticks. The first tick fires one interval after start.
    pub tick_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(300),
        }
    }
}

/// Periodic driver for a [`Job`].
#[derive(Debug)]
pub struct Scheduler<J: Job> {
    job: Arc<J>,
    config: SchedulerConfig,
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl<J: Job> Scheduler<J> {
    pub fn new(job: J, config: SchedulerConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            job: Arc::new(job),
            config,
            shutdown,
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Spawn the loop task. Calling `start` on a running scheduler is a
    /// no-op.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }

        let job = self.job.clone();
        let period = self.config.tick_interval;
        let mut shutdown = self.shutdown.subscribe();

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut timer = tokio::time::interval_at(start, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::info!("scheduler started, tick interval {period:?}");

            loop {
                // Biased so a pending shutdown always wins over a due
                // timer: no new tick may start once stop was requested.
                tokio::select! {
                    biased;
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    _ = timer.tick() => {
                        let as_of = Utc::now();
                        let summary = job.run(as_of).await;
                        tracing::debug!(
                            "tick as_of {as_of} processed {} definitions",
                            summary.processed()
                        );
                    }
                }
            }
            tracing::info!("scheduler stopped");
        });
        self.handle = Some(handle);
    }

    /// Stop scheduling new ticks and wait for the in-flight tick to
    /// finish.
    pub async fn stop(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take()
            && let Err(err) = handle.await
        {
            tracing::error!("scheduler task failed to join: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct JobLog {
        started: usize,
        finished: usize,
        as_ofs: Vec<DateTime<Utc>>,
    }

    struct RecordingJob {
        log: Arc<Mutex<JobLog>>,
        duration: Duration,
    }

    impl Job for RecordingJob {
        fn run(&self, as_of: DateTime<Utc>) -> impl Future<Output = TickSummary> + Send {
            let log = self.log.clone();
            let duration = self.duration;
            async move {
                {
                    let mut log = log.lock().unwrap();
                    log.started += 1;
                    log.as_ofs.push(as_of);
                }
                tokio::time::sleep(duration).await;
                log.lock().unwrap().finished += 1;
                TickSummary::default()
            }
        }
    }

    fn scheduler_with(
        duration: Duration,
        tick_interval: Duration,
    ) -> (Scheduler<RecordingJob>, Arc<Mutex<JobLog>>) {
        let log = Arc::new(Mutex::new(JobLog::default()));
        let job = RecordingJob {
            log: log.clone(),
            duration,
        };
        (Scheduler::new(job, SchedulerConfig { tick_interval }), log)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_per_interval() {
        let (mut scheduler, log) = scheduler_with(Duration::ZERO, Duration::from_secs(60));
        scheduler.start();
        assert!(scheduler.is_running());

        tokio::time::sleep(Duration::from_secs(185)).await;
        scheduler.stop().await;
        assert!(!scheduler.is_running());

        // Ticks at t=60, 120, 180.
        assert_eq!(log.lock().unwrap().started, 3);
        assert_eq!(log.lock().unwrap().finished, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn no_ticks_after_stop() {
        let (mut scheduler, log) = scheduler_with(Duration::ZERO, Duration::from_secs(60));
        scheduler.start();

        tokio::time::sleep(Duration::from_secs(65)).await;
        scheduler.stop().await;
        assert_eq!(log.lock().unwrap().started, 1);

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(log.lock().unwrap().started, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_tick_skips_missed_firings_and_drains_on_stop() {
        // Each tick takes 150s against a 60s interval: firings at 120 and
        // 180 land while the first tick is still running and are skipped.
        let (mut scheduler, log) = scheduler_with(Duration::from_secs(150), Duration::from_secs(60));
        scheduler.start();

        tokio::time::sleep(Duration::from_secs(250)).await;
        {
            let log = log.lock().unwrap();
            assert_eq!(log.started, 2);
            assert_eq!(log.finished, 1);
        }

        // Graceful stop waits for the in-flight tick.
        scheduler.stop().await;
        let log = log.lock().unwrap();
        assert_eq!(log.started, 2);
        assert_eq!(log.finished, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_is_a_noop() {
        let (mut scheduler, log) = scheduler_with(Duration::ZERO, Duration::from_secs(60));
        scheduler.start();
        scheduler.start();

        tokio::time::sleep(Duration::from_secs(65)).await;
        scheduler.stop().await;
        assert_eq!(log.lock().unwrap().started, 1);
    }
}

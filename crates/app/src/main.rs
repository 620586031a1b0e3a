use std::time::Duration;

use engine::{EngineConfig, MaterializationJob, RetryPolicy, Scheduler, SchedulerConfig};
use migration::MigratorTrait;
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "scadenze={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let Some(scheduler_settings) = settings.scheduler else {
        tracing::warn!("no scheduler settings found, nothing to run");
        return Ok(());
    };

    // Startup is the only fatal path: without a reachable, migrated store
    // the engine cannot run at all.
    let db = parse_database(&scheduler_settings.database).await?;

    let engine = engine::Engine::builder()
        .database(db)
        .config(engine_config(&scheduler_settings))
        .build()
        .await?;

    let tick_interval = scheduler_settings
        .tick_interval_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| SchedulerConfig::default().tick_interval);
    let mut scheduler = Scheduler::new(
        MaterializationJob::new(engine),
        SchedulerConfig { tick_interval },
    );
    scheduler.start();

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received, draining in-flight tick");
    scheduler.stop().await;

    Ok(())
}

fn engine_config(settings: &settings::Scheduler) -> EngineConfig {
    let defaults = EngineConfig::default();
    let retry = RetryPolicy::new(
        settings
            .retry_attempts
            .unwrap_or(defaults.retry.max_attempts),
        settings
            .retry_backoff_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry.backoff),
    );
    let item_timeout = match settings.item_timeout_secs {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => defaults.item_timeout,
    };

    EngineConfig {
        retry,
        workers: settings.workers.unwrap_or(defaults.workers).max(1),
        item_timeout,
    }
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
    };

    let database = sea_orm::Database::connect(url).await?;
    migration::Migrator::up(&database, None).await?;
    Ok(database)
}

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub scheduler: Option<Scheduler>,
}

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Scheduler {
    pub database: Database,
    /// Seconds between ticks.
    pub tick_interval_secs: Option<u64>,
    /// Attempts for transient persistence failures.
    pub retry_attempts: Option<u32>,
    /// Fixed backoff between attempts, in milliseconds.
    pub retry_backoff_ms: Option<u64>,
    /// Definitions materialized concurrently within one tick.
    pub workers: Option<usize>,
    /// Soft per-definition timeout, in seconds. 0 disables it.
    pub item_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/scadenze").required(false))
            .add_source(Environment::with_prefix("SCADENZE").separator("__"))
            .build()?
            .try_deserialize()
    }
}

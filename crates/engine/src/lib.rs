//! Recurring-transaction materialization engine.
//!
//! The engine turns due [`RecurringDefinition`]s into concrete, immutable
//! [`Transaction`] rows. A [`Scheduler`] drives it on a fixed cadence:
//! every tick selects the definitions whose next execution time has
//! passed, materializes each one under an exclusive per-definition hold,
//! then advances its next execution time (or deactivates it for one-shot
//! definitions).

pub use definitions::{Frequency, RecurringDefinition};
pub use error::EngineError;
pub use ops::{Engine, EngineBuilder, EngineConfig, MaterializationOutcome, TickSummary};
pub use recurrence::next_occurrence;
pub use retry::RetryPolicy;
pub use scheduler::{Job, MaterializationJob, Scheduler, SchedulerConfig};
pub use transactions::{Transaction, TransactionKind};
pub use wallets::Wallet;

mod definitions;
mod error;
mod ops;
mod recurrence;
mod retry;
mod scheduler;
mod transactions;
mod wallets;

type ResultEngine<T> = Result<T, EngineError>;

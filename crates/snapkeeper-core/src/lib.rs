pub mod config;
pub mod engine;
pub mod error;
pub mod period;
pub mod processor;
pub mod progress;
pub mod provider;
pub mod retention;
pub mod tags;
pub mod throttle;

pub use config::AppConfig;
pub use engine::{RunResult, SnapshotEngine};
pub use error::Error;
pub use period::{classify, Period, PeriodMatcher};
pub use progress::{RunReporter, SilentReporter};
pub use retention::{select_for_deletion, RetentionPolicy};

//! Data models shared by the adapters, the engine and the report layer

pub mod config;
pub mod record;
pub mod run;
pub mod sample;

// Re-export main model types
pub use config::Config;
pub use record::LogRecord;
pub use run::{RunConfig, Workload};
pub use sample::{FailureKind, Sample};

//! Logging subsystem.

pub mod manager;
pub mod types;


pub use manager::{build_filter, init};
pub use types::{FileLoggingConfig, LogRotation, LoggerConfig, StdoutConfig};
